/*! Unified interface for sparse value-flow analysis.
 *
 * Single import for everything you need: parsing text IR, running the points-to fixpoint,
 * building the value-flow graph, and dumping it in the stable text format.
 */

pub use vflow_core as core;
pub use vflow_emit as emit;
pub use vflow_parser as parser;

pub use vflow_core::{
    analysis::{
        AndersenPointsTo, ControlFlowGraph, PointsToOracle, ValueFlowGraph, VfgBuild, VfgBuilder,
    },
    block::{BasicBlock, BlockId, Terminator},
    builder::ModuleBuilder,
    function::Function,
    instructions::Instruction,
    module::Module,
    values::{TypeTag, ValueId},
};

pub use vflow_emit::{Emitter, VfgEmitter};

pub use vflow_parser::{parse, parse_module, parse_vfg};
