use crate::emitter::{EmitResult, Emitter};
use std::io::Write;
use vflow_core::analysis::ValueFlowGraph;

/// Writes a graph in the line-oriented dump format:
///
/// ```text
/// NODE <id> <valueId> <instructionId> <def|use>
/// EDGE <srcNodeId> <dstNodeId> <direct|indirect>
/// ```
///
/// The graph holds its nodes and edges sorted, so emission is a single pass
/// and identical graphs serialize byte-identically.
pub struct VfgEmitter;

impl VfgEmitter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for VfgEmitter {
    fn default() -> Self {
        Self::new()
    }
}

impl Emitter for VfgEmitter {
    type Item = ValueFlowGraph;

    fn emit<W: Write>(&self, graph: &ValueFlowGraph, writer: &mut W) -> EmitResult {
        for node in graph.nodes() {
            writeln!(
                writer,
                "NODE {} {} {} {}",
                node.id.0, node.value.0, node.inst.0, node.kind
            )?;
        }
        for edge in graph.edges() {
            writeln!(writer, "EDGE {} {} {}", edge.src.0, edge.dst.0, edge.kind)?;
        }
        Ok(())
    }
}
