//! Structured control flow bookkeeping
//!
//! Each frame keeps an end-stack of markers, one per open `block`, `loop` or
//! `if`, plus an implicit block for the function body itself. `else` and
//! `end` always resolve against the innermost marker. Whether instructions
//! are currently executed or skipped is a [`FlowState`].

use crate::parser::instruction::BlockType;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerKind {
    /// Branches target the end of the block
    Block,
    /// Branches target the beginning of the loop
    Loop,
    If,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Marker {
    pub kind: MarkerKind,
    pub block_type: BlockType,
    /// Operand stack height when the construct was entered
    pub stack_height: usize,
    /// Offset of the first instruction inside the construct
    pub start: usize,
}

impl Marker {
    /// Number of values a branch to this marker carries
    pub fn branch_arity(&self) -> usize {
        match self.kind {
            MarkerKind::Loop => 0,
            MarkerKind::Block | MarkerKind::If => self.block_type.arity(),
        }
    }
}

/// Per-frame execution state. `depth` is the end-stack length at which the
/// pending construct was opened; skipping stops when that marker resolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FlowState {
    #[default]
    Normal,
    /// The `if` condition was false: skip to its `else` or `end`
    SkippingInactiveIf { depth: usize },
    /// The `then` arm finished: skip the `else` arm to its `end`
    SkippingTakenIfElse { depth: usize },
    /// A branch left the construct: skip to its `end`
    SkippingToEnd { depth: usize },
}

impl FlowState {
    pub fn is_skipping(&self) -> bool {
        !matches!(self, FlowState::Normal)
    }

    pub fn depth(&self) -> Option<usize> {
        match self {
            FlowState::Normal => None,
            FlowState::SkippingInactiveIf { depth }
            | FlowState::SkippingTakenIfElse { depth }
            | FlowState::SkippingToEnd { depth } => Some(*depth),
        }
    }
}

/// What the interpreter loop does after an instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Call(u32),
    Return,
}
