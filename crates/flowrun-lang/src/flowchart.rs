//! Flowchart graph as edited by the user: an arena of blocks linked by id.
//! Back-edges are allowed; they are how loops are expressed.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockId(pub u64);

impl BlockId {
    /// Never given to a block; the runner uses it for "no current block".
    pub const RESERVED: BlockId = BlockId(u64::MAX);
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Block kind with its outgoing links. `None` means "not connected yet".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BlockKind {
    Start {
        #[serde(default)]
        next: Option<BlockId>,
    },
    End,
    Io {
        is_input: bool,
        #[serde(default)]
        next: Option<BlockId>,
    },
    Cond {
        #[serde(default)]
        on_true: Option<BlockId>,
        #[serde(default)]
        on_false: Option<BlockId>,
    },
    Init {
        #[serde(default)]
        next: Option<BlockId>,
    },
    Calc {
        #[serde(default)]
        next: Option<BlockId>,
    },
}

impl BlockKind {
    pub fn input() -> Self  { Self::Io { is_input: true, next: None } }
    pub fn output() -> Self { Self::Io { is_input: false, next: None } }
    pub fn cond() -> Self   { Self::Cond { on_true: None, on_false: None } }
    pub fn init() -> Self   { Self::Init { next: None } }
    pub fn calc() -> Self   { Self::Calc { next: None } }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Start { .. }                 => "START",
            Self::End                          => "END",
            Self::Io { is_input: true, .. }    => "INPUT",
            Self::Io { is_input: false, .. }   => "OUTPUT",
            Self::Cond { .. }                  => "DECISION",
            Self::Init { .. }                  => "INIT",
            Self::Calc { .. }                  => "CALC",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Start { .. } | Self::End)
    }

    fn next_mut(&mut self) -> Option<&mut Option<BlockId>> {
        match self {
            Self::Start { next } | Self::Io { next, .. } | Self::Init { next } | Self::Calc { next } => Some(next),
            Self::End | Self::Cond { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub id: BlockId,
    #[serde(default)]
    pub content: String,
    #[serde(flatten)]
    pub kind: BlockKind,
}

#[derive(Debug, thiserror::Error)]
pub enum FlowchartError {
    #[error("invalid flowchart JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("block id {0} is reserved")]
    ReservedId(BlockId),
    #[error("block id {0} is used more than once")]
    DuplicateId(BlockId),
    #[error("start block {0} is missing or not a START block")]
    BadStart(BlockId),
    #[error("no block with id {0}")]
    UnknownBlock(BlockId),
    #[error("block {0} has no single outgoing link")]
    NotLinear(BlockId),
    #[error("block {0} is not a decision block")]
    NotDecision(BlockId),
}

// ─── Flowchart ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Flowchart {
    start: BlockId,
    blocks: Vec<Block>,
}

impl Default for Flowchart {
    fn default() -> Self {
        Self::new()
    }
}

impl Flowchart {
    /// A chart holding only its START block.
    pub fn new() -> Self {
        let start = BlockId(0);
        Self {
            start,
            blocks: vec![Block { id: start, content: String::new(), kind: BlockKind::Start { next: None } }],
        }
    }

    pub fn from_json(json: &str) -> Result<Self, FlowchartError> {
        let chart: Flowchart = serde_json::from_str(json)?;
        chart.validate()?;
        Ok(chart)
    }

    pub fn to_json(&self) -> Result<String, FlowchartError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    fn validate(&self) -> Result<(), FlowchartError> {
        let mut seen = std::collections::HashSet::new();
        for block in &self.blocks {
            if block.id == BlockId::RESERVED {
                return Err(FlowchartError::ReservedId(block.id));
            }
            if !seen.insert(block.id) {
                return Err(FlowchartError::DuplicateId(block.id));
            }
        }
        match self.get(self.start) {
            Some(Block { kind: BlockKind::Start { .. }, .. }) => Ok(()),
            _ => Err(FlowchartError::BadStart(self.start)),
        }
    }

    pub fn start(&self) -> Option<&Block> {
        self.get(self.start)
    }

    pub fn start_id(&self) -> BlockId {
        self.start
    }

    pub fn get(&self, id: BlockId) -> Option<&Block> {
        self.blocks.iter().find(|b| b.id == id)
    }

    pub fn get_mut(&mut self, id: BlockId) -> Option<&mut Block> {
        self.blocks.iter_mut().find(|b| b.id == id)
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn blocks_mut(&mut self) -> &mut [Block] {
        &mut self.blocks
    }

    pub fn add(&mut self, kind: BlockKind, content: impl Into<String>) -> BlockId {
        let id = self.next_id();
        self.blocks.push(Block { id, content: content.into(), kind });
        id
    }

    /// One past the highest id, or the lowest unused id when that would
    /// land on [`BlockId::RESERVED`].
    fn next_id(&self) -> BlockId {
        let after_max = self.blocks.iter().map(|b| b.id.0).max().map_or(0, |m| m.saturating_add(1));
        if after_max < BlockId::RESERVED.0 {
            return BlockId(after_max);
        }
        let used: std::collections::HashSet<u64> = self.blocks.iter().map(|b| b.id.0).collect();
        BlockId((0..).find(|n| !used.contains(n)).unwrap_or(0))
    }

    /// Point a linear block's `next` link at `to`.
    pub fn connect(&mut self, from: BlockId, to: BlockId) -> Result<(), FlowchartError> {
        self.ensure_exists(to)?;
        let block = self.get_mut(from).ok_or(FlowchartError::UnknownBlock(from))?;
        let next = block.kind.next_mut().ok_or(FlowchartError::NotLinear(from))?;
        *next = Some(to);
        Ok(())
    }

    pub fn connect_branch(
        &mut self,
        cond: BlockId,
        on_true: BlockId,
        on_false: BlockId,
    ) -> Result<(), FlowchartError> {
        self.ensure_exists(on_true)?;
        self.ensure_exists(on_false)?;
        let block = self.get_mut(cond).ok_or(FlowchartError::UnknownBlock(cond))?;
        match &mut block.kind {
            BlockKind::Cond { on_true: t, on_false: f } => {
                *t = Some(on_true);
                *f = Some(on_false);
                Ok(())
            }
            _ => Err(FlowchartError::NotDecision(cond)),
        }
    }

    fn ensure_exists(&self, id: BlockId) -> Result<(), FlowchartError> {
        self.get(id).map(|_| ()).ok_or(FlowchartError::UnknownBlock(id))
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
