use crate::values::{ObjectId, ValueId};
use serde::{Deserialize, Serialize};

/// Identifies an instruction (or a block terminator). Unique across a whole
/// module; allocation order follows program order, which the value-flow
/// builder relies on for deterministic edge ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct InstId(pub u32);

impl InstId {
    /// Sentinel carried by the placeholder terminator of a block under
    /// construction. Never reachable from a finished function.
    pub const INVALID: InstId = InstId(u32::MAX);
}

impl std::fmt::Display for InstId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "i{}", self.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Instruction {
    pub id: InstId,
    pub kind: InstKind,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum InstKind {
    /// `result = operand`
    Assign { result: ValueId, operand: ValueId },
    /// `result = &object`
    AddrOf { result: ValueId, object: ObjectId },
    /// `result = *pointer`
    Load { result: ValueId, pointer: ValueId },
    /// `*pointer = value`
    Store { pointer: ValueId, value: ValueId },
    /// `result = callee(args...)`
    Call {
        result: Option<ValueId>,
        callee: String,
        args: Vec<ValueId>,
    },
}

impl Instruction {
    pub fn new(id: InstId, kind: InstKind) -> Self {
        Self { id, kind }
    }

    /// The value this instruction defines, if any. SSA form: a finished
    /// function defines each value at most once.
    pub fn result(&self) -> Option<ValueId> {
        match &self.kind {
            InstKind::Assign { result, .. }
            | InstKind::AddrOf { result, .. }
            | InstKind::Load { result, .. } => Some(*result),
            InstKind::Call { result, .. } => *result,
            InstKind::Store { .. } => None,
        }
    }

    /// Operand values this instruction uses, in a fixed order.
    pub fn operands(&self) -> Vec<ValueId> {
        match &self.kind {
            InstKind::Assign { operand, .. } => vec![*operand],
            InstKind::AddrOf { .. } => Vec::new(),
            InstKind::Load { pointer, .. } => vec![*pointer],
            InstKind::Store { pointer, value } => vec![*pointer, *value],
            InstKind::Call { args, .. } => args.clone(),
        }
    }

    pub fn is_store(&self) -> bool {
        matches!(self.kind, InstKind::Store { .. })
    }

    pub fn is_load(&self) -> bool {
        matches!(self.kind, InstKind::Load { .. })
    }
}
