/*! Programmatic IR construction.
 *
 * Front ends and tests assemble a [`Module`] through these builders. Ids for values, instructions
 * and objects are allocated module-wide so program order is recoverable from ids alone.
 */

use crate::block::{BasicBlock, BlockId, Terminator, TerminatorKind};
use crate::function::{Function, Parameter};
use crate::instructions::{InstId, InstKind, Instruction};
use crate::module::Module;
use crate::values::{MemoryObject, ObjectId, TypeTag, ValueId};
use crate::{IrError, Result};

#[derive(Debug, Default)]
struct IdAllocator {
    next_value: u32,
    next_inst: u32,
    next_object: u32,
}

impl IdAllocator {
    fn value(&mut self) -> ValueId {
        let id = ValueId(self.next_value);
        self.next_value += 1;
        id
    }

    fn inst(&mut self) -> InstId {
        let id = InstId(self.next_inst);
        self.next_inst += 1;
        id
    }

    fn object(&mut self) -> ObjectId {
        let id = ObjectId(self.next_object);
        self.next_object += 1;
        id
    }
}

#[derive(Debug, Default)]
pub struct ModuleBuilder {
    module: Module,
    ids: IdAllocator,
}

impl ModuleBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn function(&mut self, name: &str) -> FunctionBuilder<'_> {
        FunctionBuilder::new(self, name)
    }

    pub fn finish(self) -> Module {
        self.module
    }
}

pub struct FunctionBuilder<'a> {
    owner: &'a mut ModuleBuilder,
    function: Function,
    current_block: BlockId,
    next_block_id: u32,
}

impl<'a> FunctionBuilder<'a> {
    fn new(owner: &'a mut ModuleBuilder, name: &str) -> Self {
        let function = Function::new(name);
        let current_block = function.entry_block;
        Self {
            owner,
            function,
            current_block,
            next_block_id: 1,
        }
    }

    pub fn param(&mut self, ty: TypeTag) -> ValueId {
        let value = self.owner.ids.value();
        self.function.value_types.insert(value, ty);
        self.function.params.push(Parameter { value, ty });
        value
    }

    pub fn object(&mut self, name: &str) -> ObjectId {
        let id = self.owner.ids.object();
        self.function.objects.insert(id, MemoryObject::new(id, name));
        id
    }

    /// Allocates a value id without a definition. Front ends use this for
    /// operands seen before (or instead of) their definition; the value-flow
    /// builder decides later whether such a reference is dangling.
    pub fn alloc_value(&mut self, ty: TypeTag) -> ValueId {
        let value = self.owner.ids.value();
        self.function.value_types.insert(value, ty);
        value
    }

    pub fn set_value_type(&mut self, value: ValueId, ty: TypeTag) {
        self.function.value_types.insert(value, ty);
    }

    pub fn value_type(&self, value: ValueId) -> Option<TypeTag> {
        self.function.type_of(value)
    }

    pub fn create_block(&mut self) -> BlockId {
        let id = BlockId(self.next_block_id);
        self.next_block_id += 1;
        self.function.blocks.insert(id, BasicBlock::new(id));
        id
    }

    pub fn switch_to_block(&mut self, block: BlockId) -> Result<()> {
        if !self.function.blocks.contains_key(&block) {
            return Err(IrError::BuilderError(format!(
                "{} does not exist in function `{}`",
                block, self.function.name
            )));
        }
        self.current_block = block;
        Ok(())
    }

    pub fn current_block(&self) -> BlockId {
        self.current_block
    }

    /// Appends a raw instruction with a fresh id. The typed helpers below
    /// cover the common case of a fresh SSA result; front ends lowering an
    /// external format use this directly.
    pub fn push(&mut self, kind: InstKind) -> InstId {
        let id = self.owner.ids.inst();
        let inst = Instruction::new(id, kind);
        if let Some(result) = inst.result() {
            self.function.value_defs.entry(result).or_insert(id);
        }
        self.function
            .blocks
            .get_mut(&self.current_block)
            .expect("current block exists")
            .add_instruction(inst);
        id
    }

    pub fn assign(&mut self, operand: ValueId) -> ValueId {
        let ty = self.function.type_of(operand).unwrap_or(TypeTag::Scalar);
        let result = self.alloc_value(ty);
        self.push(InstKind::Assign { result, operand });
        result
    }

    pub fn addr_of(&mut self, object: ObjectId) -> ValueId {
        let result = self.alloc_value(TypeTag::Pointer);
        self.push(InstKind::AddrOf { result, object });
        result
    }

    pub fn load(&mut self, pointer: ValueId, ty: TypeTag) -> ValueId {
        let result = self.alloc_value(ty);
        self.push(InstKind::Load { result, pointer });
        result
    }

    pub fn store(&mut self, pointer: ValueId, value: ValueId) {
        self.push(InstKind::Store { pointer, value });
    }

    pub fn call(
        &mut self,
        callee: &str,
        args: Vec<ValueId>,
        result_ty: Option<TypeTag>,
    ) -> Option<ValueId> {
        let result = result_ty.map(|ty| self.alloc_value(ty));
        self.push(InstKind::Call {
            result,
            callee: callee.to_string(),
            args,
        });
        result
    }

    fn terminate(&mut self, kind: TerminatorKind) {
        let id = self.owner.ids.inst();
        self.function
            .blocks
            .get_mut(&self.current_block)
            .expect("current block exists")
            .set_terminator(Terminator::new(id, kind));
    }

    pub fn jump(&mut self, target: BlockId) {
        self.terminate(TerminatorKind::Jump(target));
    }

    pub fn branch(&mut self, condition: ValueId, then_block: BlockId, else_block: BlockId) {
        self.terminate(TerminatorKind::Branch {
            condition,
            then_block,
            else_block,
        });
    }

    pub fn ret(&mut self, value: Option<ValueId>) {
        self.terminate(TerminatorKind::Return(value));
    }

    pub fn finish(self) {
        self.owner.module.add_function(self.function);
    }
}
