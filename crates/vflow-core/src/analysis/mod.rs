/*! Analyses over the IR.
 *
 * Value flow has two layers: the direct SSA def-use layer, and the indirect layer where a store
 * reaches a load through memory. These passes provide CFG reachability, the points-to oracle that
 * mediates the indirect layer, and the sparse value-flow graph builder on top of both.
 */

pub mod cfg;
pub mod points_to;
pub mod vfg;

pub use cfg::ControlFlowGraph;
pub use points_to::{AbstractLocation, AndersenPointsTo, PointsToOracle};
pub use vfg::{
    EdgeKind, NodeId, NodeKind, SkippedFunction, ValueFlowGraph, VfgBuild, VfgBuilder, VfgEdge,
    VfgNode,
};
