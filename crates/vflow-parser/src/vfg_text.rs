use thiserror::Error;
use vflow_core::analysis::{EdgeKind, NodeId, NodeKind, ValueFlowGraph, VfgEdge, VfgNode};
use vflow_core::instructions::InstId;
use vflow_core::values::ValueId;
use vflow_core::IrError;

#[derive(Error, Debug)]
pub enum VfgTextError {
    #[error("line {line}: unrecognized graph line `{content}`")]
    BadLine { line: usize, content: String },
    #[error(transparent)]
    Graph(#[from] IrError),
}

/// Reads a serialized graph dump back into a [`ValueFlowGraph`].
///
/// Counterpart to the emitter in `vflow-emit`; structural invariants
/// (unique ids, unique value/instruction pairs, resolvable edge endpoints)
/// are re-checked on the way in.
pub fn parse_vfg(input: &str) -> Result<ValueFlowGraph, VfgTextError> {
    let mut nodes = Vec::new();
    let mut edges = Vec::new();

    for (index, raw) in input.lines().enumerate() {
        let line = index + 1;
        let content = raw.trim();
        if content.is_empty() {
            continue;
        }

        let bad = || VfgTextError::BadLine {
            line,
            content: content.to_string(),
        };
        let number = |field: &str| field.parse::<u32>().map_err(|_| bad());

        let fields: Vec<&str> = content.split_whitespace().collect();
        match fields.as_slice() {
            ["NODE", id, value, inst, kind] => {
                let kind = match *kind {
                    "def" => NodeKind::Def,
                    "use" => NodeKind::Use,
                    _ => return Err(bad()),
                };
                nodes.push(VfgNode {
                    id: NodeId(number(id)?),
                    value: ValueId(number(value)?),
                    inst: InstId(number(inst)?),
                    kind,
                });
            }
            ["EDGE", src, dst, kind] => {
                let kind = match *kind {
                    "direct" => EdgeKind::Direct,
                    "indirect" => EdgeKind::Indirect,
                    _ => return Err(bad()),
                };
                edges.push(VfgEdge {
                    src: NodeId(number(src)?),
                    dst: NodeId(number(dst)?),
                    kind,
                });
            }
            _ => return Err(bad()),
        }
    }

    Ok(ValueFlowGraph::from_parts(nodes, edges)?)
}
