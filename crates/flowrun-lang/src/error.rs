use std::collections::BTreeMap;
use std::fmt;

use crate::flowchart::BlockId;

/// Error categories. Each maps to a catalog key under `error.name.*`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    SyntaxError,
    CompError,
    TypeError,
    ValueError,
    MathError,
    VarError,
    CallError,
    /// A pending read was cancelled by a stop request.
    Interrupted,
}

impl ErrorKind {
    pub fn key(&self) -> &'static str {
        match self {
            Self::SyntaxError => "error.name.syntax_error",
            Self::CompError   => "error.name.comp_error",
            Self::TypeError   => "error.name.type_error",
            Self::ValueError  => "error.name.value_error",
            Self::MathError   => "error.name.math_error",
            Self::VarError    => "error.name.var_error",
            Self::CallError   => "error.name.call_error",
            Self::Interrupted => "error.name.interrupted",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

// ─────────────────────────────────────────────────────────────────────────────

/// A structured error. `name` and `msg` are catalog keys; `fmt_args` fills the
/// `{placeholders}` of the message template when the error is displayed.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{name}: {msg}")]
pub struct ExecutionError {
    pub name: ErrorKind,
    pub msg: &'static str,
    pub fmt_args: BTreeMap<&'static str, String>,
}

impl ExecutionError {
    pub fn new(name: ErrorKind, msg: &'static str) -> Self {
        Self { name, msg, fmt_args: BTreeMap::new() }
    }

    /// Attach a formatting argument.
    pub fn with(mut self, key: &'static str, value: impl ToString) -> Self {
        self.fmt_args.insert(key, value.to_string());
        self
    }

    pub fn arg(&self, key: &str) -> Option<&str> {
        self.fmt_args.get(key).map(String::as_str)
    }

    pub fn is_interrupted(&self) -> bool {
        self.name == ErrorKind::Interrupted
    }

    // ─── Constructors for each category ──────────────────────────────────────

    pub fn syntax(msg: &'static str) -> Self { Self::new(ErrorKind::SyntaxError, msg) }
    pub fn comp(msg: &'static str) -> Self   { Self::new(ErrorKind::CompError, msg) }
    pub fn type_err(msg: &'static str) -> Self { Self::new(ErrorKind::TypeError, msg) }
    pub fn value(msg: &'static str) -> Self  { Self::new(ErrorKind::ValueError, msg) }
    pub fn math(msg: &'static str) -> Self   { Self::new(ErrorKind::MathError, msg) }
    pub fn var(msg: &'static str) -> Self    { Self::new(ErrorKind::VarError, msg) }
    pub fn call(msg: &'static str) -> Self   { Self::new(ErrorKind::CallError, msg) }

    pub fn interrupted() -> Self {
        Self::new(ErrorKind::Interrupted, "error.msg.execution_stopped")
    }
}

// ─────────────────────────────────────────────────────────────────────────────

/// A failure found while building the program map, tied to the block it
/// belongs to when there is one.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("block {block:?}: {error}")]
pub struct BuildError {
    pub block: Option<BlockId>,
    #[source]
    pub error: ExecutionError,
}

impl BuildError {
    pub fn new(block: Option<BlockId>, error: ExecutionError) -> Self {
        Self { block, error }
    }
}
