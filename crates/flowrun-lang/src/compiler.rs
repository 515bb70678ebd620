//! Turns blocks into evaluable trees, and a whole flowchart into the
//! block-id → (tree, successor) map the runner executes.

use std::collections::{HashMap, HashSet, VecDeque};

use tracing::debug;

use crate::error::{BuildError, ExecutionError};
use crate::flowchart::{Block, BlockId, BlockKind, Flowchart};
use crate::syntax::ast::Node;
use crate::syntax::lexer::Lexer;
use crate::syntax::parser::Parser;

// ─── Single blocks ───────────────────────────────────────────────────────────

/// Compile one block's content according to its kind. Pure; safe to call
/// while the user is still editing.
pub fn compile(block: &Block) -> Result<Node, ExecutionError> {
    compile_source(&block.kind, &block.content)
}

pub fn compile_source(kind: &BlockKind, source: &str) -> Result<Node, ExecutionError> {
    if kind.is_terminal() {
        return Err(ExecutionError::comp("error.msg.failed_compile").with("block_kind", kind.label()));
    }
    let parser = Parser::new(Lexer::new(source).tokenize()?);
    match kind {
        BlockKind::Io { is_input: true, .. }  => parser.parse_input_block(),
        BlockKind::Io { is_input: false, .. } => parser.parse_output_block(),
        BlockKind::Cond { .. }                => parser.parse_cond_block(),
        BlockKind::Init { .. }                => parser.parse_init_block(),
        BlockKind::Calc { .. }                => parser.parse_calc_block(),
        BlockKind::Start { .. } | BlockKind::End => unreachable!("terminal blocks rejected above"),
    }
}

// ─── Program ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Successor {
    Linear(BlockId),
    Branch { on_true: BlockId, on_false: BlockId },
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompiledBlock {
    pub node: Node,
    pub successor: Successor,
}

/// Every block reachable from START, compiled. END blocks have no entry;
/// reaching an id without an entry ends the run.
#[derive(Debug, Clone)]
pub struct Program {
    entry: BlockId,
    blocks: HashMap<BlockId, CompiledBlock>,
}

impl Program {
    /// Walk the chart breadth-first from START and compile each block found.
    /// Every failure is collected; the program is only returned when there
    /// are none.
    pub fn build(chart: &Flowchart) -> Result<Self, Vec<BuildError>> {
        let mut errors = Vec::new();

        let start = chart.start().ok_or_else(|| {
            vec![BuildError::new(None, incomplete(chart.start_id()))]
        })?;
        let entry = match &start.kind {
            BlockKind::Start { next } => follow(chart, start.id, *next),
            _ => Err(BuildError::new(Some(start.id), incomplete(start.id))),
        }
        .map_err(|e| vec![e])?;

        let mut blocks = HashMap::new();
        let mut seen = HashSet::from([entry]);
        let mut queue = VecDeque::from([entry]);

        while let Some(id) = queue.pop_front() {
            let Some(block) = chart.get(id) else { continue };
            if matches!(block.kind, BlockKind::End) {
                continue;
            }

            let successor = match block.kind {
                BlockKind::Cond { on_true, on_false } => {
                    match (follow(chart, id, on_true), follow(chart, id, on_false)) {
                        (Ok(t), Ok(f)) => Some(Successor::Branch { on_true: t, on_false: f }),
                        (t, f) => {
                            errors.extend(t.err());
                            errors.extend(f.err());
                            None
                        }
                    }
                }
                BlockKind::Start { next }
                | BlockKind::Io { next, .. }
                | BlockKind::Init { next }
                | BlockKind::Calc { next } => match follow(chart, id, next) {
                    Ok(n) => Some(Successor::Linear(n)),
                    Err(e) => {
                        errors.push(e);
                        None
                    }
                },
                BlockKind::End => None,
            };

            let node = match compile(block) {
                Ok(node) => Some(node),
                Err(e) => {
                    errors.push(BuildError::new(Some(id), e));
                    None
                }
            };

            if let Some(successor) = successor {
                let targets = match successor {
                    Successor::Linear(n) => vec![n],
                    Successor::Branch { on_true, on_false } => vec![on_true, on_false],
                };
                for t in targets {
                    if seen.insert(t) {
                        queue.push_back(t);
                    }
                }
                if let Some(node) = node {
                    blocks.insert(id, CompiledBlock { node, successor });
                }
            }
        }

        if !errors.is_empty() {
            debug!(errors = errors.len(), "build failed");
            return Err(errors);
        }
        debug!(blocks = blocks.len(), %entry, "build finished");
        Ok(Self { entry, blocks })
    }

    /// First block to execute: the one START points at.
    pub fn entry(&self) -> BlockId {
        self.entry
    }

    pub fn get(&self, id: BlockId) -> Option<&CompiledBlock> {
        self.blocks.get(&id)
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

fn incomplete(block: BlockId) -> ExecutionError {
    ExecutionError::comp("error.msg.incomplete_tree").with("block", block)
}

/// A link must be set and point at an existing block.
fn follow(chart: &Flowchart, from: BlockId, link: Option<BlockId>) -> Result<BlockId, BuildError> {
    match link {
        Some(to) if chart.get(to).is_some() => Ok(to),
        _ => Err(BuildError::new(Some(from), incomplete(from))),
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
