/*! Core IR types and builders for sparse value-flow analysis.
 *
 * Tracking how values propagate requires a representation where definitions, uses and memory
 * operations are explicit. This crate provides the SSA-form IR a front end hands us, plus the
 * analyses that turn it into a sparse value-flow graph.
 */

pub mod analysis;
pub mod block;
pub mod builder;
pub mod function;
pub mod instructions;
pub mod module;
pub mod persist;
pub mod values;

pub use block::{BasicBlock, BlockId, Terminator, TerminatorKind};
pub use builder::{FunctionBuilder, ModuleBuilder};
pub use function::{Function, Parameter};
pub use instructions::{InstId, InstKind, Instruction};
pub use module::Module;
pub use values::{MemoryObject, ObjectId, TypeTag, ValueId};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum IrError {
    #[error("malformed function `{function}`: {reason}")]
    MalformedFunction { function: String, reason: String },
    #[error("points-to query on non-pointer value {0}")]
    NonPointerQuery(ValueId),
    #[error("builder error: {0}")]
    BuilderError(String),
    #[error("invalid graph: {0}")]
    InvalidGraph(String),
    #[error("unknown node {0}")]
    UnknownNode(analysis::vfg::NodeId),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, IrError>;
