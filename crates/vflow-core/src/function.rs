use crate::block::{BasicBlock, BlockId};
use crate::instructions::{InstId, Instruction};
use crate::values::{MemoryObject, ObjectId, TypeTag, ValueId};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A function parameter: a value with no defining instruction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Parameter {
    pub value: ValueId,
    pub ty: TypeTag,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Function {
    pub name: String,
    pub params: Vec<Parameter>,
    pub entry_block: BlockId,
    pub blocks: IndexMap<BlockId, BasicBlock>,
    pub objects: IndexMap<ObjectId, MemoryObject>,
    /// Declared type of every value this function introduces (params and
    /// instruction results). Dangling operands are absent by definition.
    pub value_types: IndexMap<ValueId, TypeTag>,
    /// Defining instruction per value; first definition wins when the input
    /// is not actually in SSA form (validation reports the duplicate).
    pub value_defs: IndexMap<ValueId, InstId>,
}

impl Function {
    pub fn new(name: impl Into<String>) -> Self {
        let entry_block = BlockId(0);
        let mut blocks = IndexMap::new();
        blocks.insert(entry_block, BasicBlock::new(entry_block));

        Self {
            name: name.into(),
            params: Vec::new(),
            entry_block,
            blocks,
            objects: IndexMap::new(),
            value_types: IndexMap::new(),
            value_defs: IndexMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn entry_block(&self) -> BlockId {
        self.entry_block
    }

    pub fn get_block(&self, id: BlockId) -> Option<&BasicBlock> {
        self.blocks.get(&id)
    }

    pub fn get_block_mut(&mut self, id: BlockId) -> Option<&mut BasicBlock> {
        self.blocks.get_mut(&id)
    }

    pub fn type_of(&self, value: ValueId) -> Option<TypeTag> {
        self.value_types.get(&value).copied()
    }

    pub fn def_of(&self, value: ValueId) -> Option<InstId> {
        self.value_defs.get(&value).copied()
    }

    pub fn is_param(&self, value: ValueId) -> bool {
        self.params.iter().any(|p| p.value == value)
    }

    /// Instructions in program order, block by block.
    pub fn instructions(&self) -> impl Iterator<Item = (BlockId, &Instruction)> {
        self.blocks
            .iter()
            .flat_map(|(&id, block)| block.instructions.iter().map(move |inst| (id, inst)))
    }
}
