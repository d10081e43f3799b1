use crate::instructions::{InstId, Instruction};
use crate::values::ValueId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BlockId(pub u32);

impl std::fmt::Display for BlockId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "block{}", self.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BasicBlock {
    pub id: BlockId,
    pub instructions: Vec<Instruction>,
    pub terminator: Terminator,
}

impl BasicBlock {
    pub fn new(id: BlockId) -> Self {
        Self {
            id,
            instructions: Vec::new(),
            terminator: Terminator::invalid(),
        }
    }

    pub fn add_instruction(&mut self, inst: Instruction) {
        self.instructions.push(inst);
    }

    pub fn set_terminator(&mut self, term: Terminator) {
        self.terminator = term;
    }

    pub fn is_terminated(&self) -> bool {
        !matches!(self.terminator.kind, TerminatorKind::Invalid)
    }

    pub fn successors(&self) -> Vec<BlockId> {
        self.terminator.successors()
    }
}

/// Block-ending control transfer. Carries its own [`InstId`] so terminator
/// operands are addressable use sites in the value-flow graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Terminator {
    pub id: InstId,
    pub kind: TerminatorKind,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TerminatorKind {
    Jump(BlockId),
    Branch {
        condition: ValueId,
        then_block: BlockId,
        else_block: BlockId,
    },
    Return(Option<ValueId>),
    Invalid,
}

impl Terminator {
    pub fn new(id: InstId, kind: TerminatorKind) -> Self {
        Self { id, kind }
    }

    pub fn invalid() -> Self {
        Self {
            id: InstId::INVALID,
            kind: TerminatorKind::Invalid,
        }
    }

    pub fn successors(&self) -> Vec<BlockId> {
        match &self.kind {
            TerminatorKind::Jump(target) => vec![*target],
            TerminatorKind::Branch {
                then_block,
                else_block,
                ..
            } => vec![*then_block, *else_block],
            TerminatorKind::Return(_) | TerminatorKind::Invalid => Vec::new(),
        }
    }

    /// Operand values the terminator uses.
    pub fn operands(&self) -> Vec<ValueId> {
        match &self.kind {
            TerminatorKind::Branch { condition, .. } => vec![*condition],
            TerminatorKind::Return(Some(value)) => vec![*value],
            TerminatorKind::Jump(_) | TerminatorKind::Return(None) | TerminatorKind::Invalid => {
                Vec::new()
            }
        }
    }

    pub fn is_return(&self) -> bool {
        matches!(self.kind, TerminatorKind::Return(_))
    }
}
