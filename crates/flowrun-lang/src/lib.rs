pub mod builtins;
pub mod catalog;
pub mod compiler;
pub mod error;
pub mod flowchart;
pub mod runner;
pub mod runtime;
pub mod syntax;

pub use catalog::{Catalog, CatalogError};
pub use compiler::{CompiledBlock, Program, Successor, compile, compile_source};
pub use error::{BuildError, ErrorKind, ExecutionError};
pub use flowchart::{Block, BlockId, BlockKind, Flowchart, FlowchartError};
pub use runner::{DRAIN_BATCH, RunOptions, RunState, Runner, StopReason};
pub use runtime::console::{BufferConsole, Console};
pub use runtime::environment::Environment;
pub use runtime::value::{Value, ValueType};
pub use syntax::ast::Node;
pub use syntax::token::{Token, TokenKind};

// ─── One-shot evaluation ─────────────────────────────────────────────────────

/// Compile `source` as a block of `kind` and evaluate it once against `env`.
/// Compile failures come back as `Value::Error`, like evaluation failures.
pub fn evaluate_source(
    kind: &BlockKind,
    source: &str,
    env: &mut Environment,
    console: &mut dyn Console,
) -> Value {
    match compile_source(kind, source) {
        Ok(node) => node.evaluate(env, console),
        Err(e) => Value::Error(e),
    }
}
