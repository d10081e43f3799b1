/*! Turn value-flow graphs into a stable text format.
 *
 * Analysis results are only useful if two runs over the same input can be diffed. The emitter
 * here guarantees byte-identical output for identical graphs: nodes before edges, nodes ascending
 * by id, edges by (source, destination).
 */

pub mod emitter;
pub mod vfg_emitter;

pub use emitter::{EmitResult, Emitter};
pub use vfg_emitter::VfgEmitter;
