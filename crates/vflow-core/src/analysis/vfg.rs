use crate::analysis::cfg::ControlFlowGraph;
use crate::analysis::points_to::{AbstractLocation, PointsToOracle};
use crate::function::Function;
use crate::instructions::{InstId, InstKind};
use crate::module::Module;
use crate::values::ValueId;
use crate::{IrError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u32);

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "n{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum NodeKind {
    Def,
    Use,
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NodeKind::Def => write!(f, "def"),
            NodeKind::Use => write!(f, "use"),
        }
    }
}

/// One definition or use site of a value. Unique per `(value, instruction)`
/// pair across the whole graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VfgNode {
    pub id: NodeId,
    pub value: ValueId,
    pub inst: InstId,
    pub kind: NodeKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EdgeKind {
    /// SSA def reaches use; always sound.
    Direct,
    /// Store reaches load through a shared abstract location; as precise as
    /// the points-to oracle, and deliberately control-flow-insensitive.
    Indirect,
}

impl std::fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EdgeKind::Direct => write!(f, "direct"),
            EdgeKind::Indirect => write!(f, "indirect"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VfgEdge {
    pub src: NodeId,
    pub dst: NodeId,
    pub kind: EdgeKind,
}

/// Sparse value-flow graph: dense node arena plus an edge list of integer
/// ids, both held sorted. Immutable once built; cyclic flow needs no special
/// handling because nothing here owns anything by reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueFlowGraph {
    nodes: Vec<VfgNode>,
    edges: Vec<VfgEdge>,
}

impl ValueFlowGraph {
    /// Assembles a graph from raw parts, enforcing the structural invariants:
    /// unique node ids, unique `(value, instruction)` pairs, and edges whose
    /// endpoints exist. Nodes and edges are sorted on the way in.
    pub fn from_parts(mut nodes: Vec<VfgNode>, edges: Vec<VfgEdge>) -> Result<Self> {
        nodes.sort_by_key(|node| node.id);

        let mut ids = HashSet::new();
        let mut pairs = HashSet::new();
        for node in &nodes {
            if !ids.insert(node.id) {
                return Err(IrError::InvalidGraph(format!("duplicate node id {}", node.id)));
            }
            if !pairs.insert((node.value, node.inst)) {
                return Err(IrError::InvalidGraph(format!(
                    "second node for value {} at instruction {}",
                    node.value, node.inst
                )));
            }
        }

        let mut sorted = BTreeSet::new();
        for edge in edges {
            if !ids.contains(&edge.src) || !ids.contains(&edge.dst) {
                return Err(IrError::InvalidGraph(format!(
                    "edge {} -> {} references a missing node",
                    edge.src, edge.dst
                )));
            }
            sorted.insert(edge);
        }

        Ok(Self {
            nodes,
            edges: sorted.into_iter().collect(),
        })
    }

    pub fn nodes(&self) -> &[VfgNode] {
        &self.nodes
    }

    pub fn edges(&self) -> &[VfgEdge] {
        &self.edges
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn node(&self, id: NodeId) -> Option<&VfgNode> {
        self.nodes
            .binary_search_by_key(&id, |node| node.id)
            .ok()
            .map(|idx| &self.nodes[idx])
    }

    /// Subgraph reachable from `starts`, following edges forward and
    /// backward. Node ids are preserved so a slice stays diffable against the
    /// graph it came from. Unknown starting ids are rejected.
    pub fn slice(&self, starts: &[NodeId]) -> Result<ValueFlowGraph> {
        for &start in starts {
            if self.node(start).is_none() {
                return Err(IrError::UnknownNode(start));
            }
        }

        let mut forward: HashMap<NodeId, Vec<NodeId>> = HashMap::new();
        let mut backward: HashMap<NodeId, Vec<NodeId>> = HashMap::new();
        for edge in &self.edges {
            forward.entry(edge.src).or_default().push(edge.dst);
            backward.entry(edge.dst).or_default().push(edge.src);
        }

        let closure = |adjacency: &HashMap<NodeId, Vec<NodeId>>| {
            let mut visited: HashSet<NodeId> = HashSet::new();
            let mut queue: VecDeque<NodeId> = starts.iter().copied().collect();
            while let Some(current) = queue.pop_front() {
                if visited.insert(current) {
                    for &next in adjacency.get(&current).map(|v| v.as_slice()).unwrap_or(&[]) {
                        queue.push_back(next);
                    }
                }
            }
            visited
        };

        let mut keep = closure(&forward);
        keep.extend(closure(&backward));

        let nodes = self
            .nodes
            .iter()
            .filter(|node| keep.contains(&node.id))
            .copied()
            .collect();
        let edges = self
            .edges
            .iter()
            .filter(|edge| keep.contains(&edge.src) && keep.contains(&edge.dst))
            .copied()
            .collect();

        ValueFlowGraph::from_parts(nodes, edges)
    }
}

/// A function the builder refused to translate, with the reason it was
/// skipped. Surfaced in [`VfgBuild`] so partial results are never silent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedFunction {
    pub name: String,
    pub reason: String,
}

/// Result of a whole-module build: the graph over every well-formed function
/// plus the functions that were skipped as malformed.
#[derive(Debug, Clone)]
pub struct VfgBuild {
    pub graph: ValueFlowGraph,
    pub skipped: Vec<SkippedFunction>,
}

impl VfgBuild {
    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty()
    }
}

pub struct VfgBuilder;

impl VfgBuilder {
    /// Builds the sparse value-flow graph for `module`.
    ///
    /// Malformed functions (dangling operands, duplicate SSA definitions,
    /// non-pointer address operands) are skipped individually; every other
    /// function still contributes to the graph. Indirect edges are resolved
    /// after all functions' stores are registered, since the oracle's answer
    /// spans the whole module.
    pub fn build(module: &Module, oracle: &dyn PointsToOracle) -> Result<VfgBuild> {
        let mut skipped = Vec::new();
        let mut kept = Vec::new();
        for function in module.functions.values() {
            match validate_function(function) {
                Ok(()) => kept.push(function),
                Err(IrError::MalformedFunction { function, reason }) => {
                    tracing::debug!(%function, %reason, "skipping malformed function");
                    skipped.push(SkippedFunction {
                        name: function,
                        reason,
                    });
                }
                Err(other) => return Err(other),
            }
        }

        let mut nodes = Vec::new();
        let mut def_nodes: HashMap<ValueId, NodeId> = HashMap::new();
        let mut use_nodes: HashMap<(ValueId, InstId), NodeId> = HashMap::new();

        for function in &kept {
            for (_, inst) in function.instructions() {
                if let Some(result) = inst.result() {
                    let id = NodeId(nodes.len() as u32);
                    nodes.push(VfgNode {
                        id,
                        value: result,
                        inst: inst.id,
                        kind: NodeKind::Def,
                    });
                    def_nodes.insert(result, id);
                }
            }
        }

        for function in &kept {
            for block in function.blocks.values() {
                let mut sites: Vec<(InstId, Vec<ValueId>)> = block
                    .instructions
                    .iter()
                    .map(|inst| (inst.id, inst.operands()))
                    .collect();
                sites.push((block.terminator.id, block.terminator.operands()));

                for (inst_id, operands) in sites {
                    for operand in operands {
                        use_nodes.entry((operand, inst_id)).or_insert_with(|| {
                            let id = NodeId(nodes.len() as u32);
                            nodes.push(VfgNode {
                                id,
                                value: operand,
                                inst: inst_id,
                                kind: NodeKind::Use,
                            });
                            id
                        });
                    }
                }
            }
        }

        let mut edges = BTreeSet::new();
        for (&(value, _), &use_id) in &use_nodes {
            if let Some(&def_id) = def_nodes.get(&value) {
                edges.insert(VfgEdge {
                    src: def_id,
                    dst: use_id,
                    kind: EdgeKind::Direct,
                });
            }
        }

        // Writers are registered in program order, which by construction is
        // increasing instruction-id order. A stored value with no def node
        // (a parameter) has no site to anchor a writer and registers nothing.
        let mut writers: BTreeMap<AbstractLocation, Vec<NodeId>> = BTreeMap::new();
        for function in &kept {
            for (_, inst) in function.instructions() {
                if let InstKind::Store { pointer, value } = &inst.kind {
                    let locations = oracle.resolve(*pointer)?;
                    if let Some(&writer) = def_nodes.get(value) {
                        for &location in locations {
                            writers.entry(location).or_default().push(writer);
                        }
                    }
                }
            }
        }

        for function in &kept {
            for (_, inst) in function.instructions() {
                if let InstKind::Load { pointer, .. } = &inst.kind {
                    let locations = oracle.resolve(*pointer)?;
                    let use_id = use_nodes[&(*pointer, inst.id)];
                    for location in locations {
                        for &writer in writers.get(location).map(|v| v.as_slice()).unwrap_or(&[]) {
                            edges.insert(VfgEdge {
                                src: writer,
                                dst: use_id,
                                kind: EdgeKind::Indirect,
                            });
                        }
                    }
                }
            }
        }

        Ok(VfgBuild {
            graph: ValueFlowGraph {
                nodes,
                edges: edges.into_iter().collect(),
            },
            skipped,
        })
    }
}

fn malformed(function: &Function, reason: String) -> IrError {
    IrError::MalformedFunction {
        function: function.name.clone(),
        reason,
    }
}

/// Checks the invariants the builder depends on. Dangling-operand detection
/// is scoped to reachable blocks; SSA single-definition is a whole-function
/// property and is checked everywhere.
fn validate_function(function: &Function) -> Result<()> {
    let mut defined: HashSet<ValueId> = function.params.iter().map(|p| p.value).collect();

    for (_, inst) in function.instructions() {
        if let Some(result) = inst.result() {
            if !defined.insert(result) {
                return Err(malformed(
                    function,
                    format!("duplicate definition of {result}"),
                ));
            }
        }
    }

    let cfg = ControlFlowGraph::from_function(function);
    let reachable = cfg.reachable_blocks();

    let mut reachable_defs: HashSet<ValueId> =
        function.params.iter().map(|p| p.value).collect();
    for (block_id, inst) in function.instructions() {
        if reachable.contains(&block_id) {
            if let Some(result) = inst.result() {
                reachable_defs.insert(result);
            }
        }
    }

    for (&block_id, block) in &function.blocks {
        if !reachable.contains(&block_id) {
            continue;
        }
        for inst in &block.instructions {
            for operand in inst.operands() {
                if !reachable_defs.contains(&operand) {
                    return Err(malformed(
                        function,
                        format!("instruction {} references undefined value {}", inst.id, operand),
                    ));
                }
            }
            match &inst.kind {
                InstKind::Store { pointer, .. } | InstKind::Load { pointer, .. } => {
                    if function.type_of(*pointer) != Some(crate::values::TypeTag::Pointer) {
                        return Err(malformed(
                            function,
                            format!("address operand {} is not pointer-typed", pointer),
                        ));
                    }
                }
                _ => {}
            }
        }
        for operand in block.terminator.operands() {
            if !reachable_defs.contains(&operand) {
                return Err(malformed(
                    function,
                    format!(
                        "terminator {} references undefined value {}",
                        block.terminator.id, operand
                    ),
                ));
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::ModuleBuilder;
    use crate::values::TypeTag;
    use std::collections::HashMap;

    struct MockOracle {
        sets: HashMap<ValueId, BTreeSet<AbstractLocation>>,
        empty: BTreeSet<AbstractLocation>,
    }

    impl MockOracle {
        fn new(entries: Vec<(ValueId, Vec<u32>)>) -> Self {
            let sets = entries
                .into_iter()
                .map(|(value, locs)| {
                    (value, locs.into_iter().map(AbstractLocation).collect())
                })
                .collect();
            Self {
                sets,
                empty: BTreeSet::new(),
            }
        }
    }

    impl PointsToOracle for MockOracle {
        fn resolve(&self, value: ValueId) -> Result<&BTreeSet<AbstractLocation>> {
            Ok(self.sets.get(&value).unwrap_or(&self.empty))
        }
    }

    /// `p = &x; *p = c; y = *p` with the oracle resolving `p` to `{x}`.
    fn store_load_module() -> (Module, ValueId, ValueId) {
        let mut builder = ModuleBuilder::new();
        let mut f = builder.function("f");
        let v0 = f.param(TypeTag::Scalar);
        let x = f.object("x");
        let p = f.addr_of(x);
        let c = f.assign(v0);
        f.store(p, c);
        let y = f.load(p, TypeTag::Scalar);
        f.ret(Some(y));
        f.finish();
        (builder.finish(), p, c)
    }

    #[test]
    fn store_to_load_produces_one_indirect_edge() {
        let (module, p, c) = store_load_module();
        let oracle = crate::analysis::AndersenPointsTo::analyze(&module);
        let build = VfgBuilder::build(&module, &oracle).unwrap();
        assert!(build.is_complete());

        let graph = &build.graph;
        let indirect: Vec<_> = graph
            .edges()
            .iter()
            .filter(|e| e.kind == EdgeKind::Indirect)
            .collect();
        assert_eq!(indirect.len(), 1);

        let src = graph.node(indirect[0].src).unwrap();
        let dst = graph.node(indirect[0].dst).unwrap();
        assert_eq!(src.kind, NodeKind::Def);
        assert_eq!(src.value, c);
        assert_eq!(dst.kind, NodeKind::Use);
        assert_eq!(dst.value, p);
    }

    #[test]
    fn one_def_node_per_value() {
        let (module, _, _) = store_load_module();
        let oracle = crate::analysis::AndersenPointsTo::analyze(&module);
        let build = VfgBuilder::build(&module, &oracle).unwrap();

        let mut def_counts: HashMap<ValueId, usize> = HashMap::new();
        for node in build.graph.nodes() {
            if node.kind == NodeKind::Def {
                *def_counts.entry(node.value).or_default() += 1;
            }
        }
        assert!(def_counts.values().all(|&count| count == 1));
    }

    #[test]
    fn direct_edges_connect_def_to_use_of_same_value() {
        let (module, _, _) = store_load_module();
        let oracle = crate::analysis::AndersenPointsTo::analyze(&module);
        let build = VfgBuilder::build(&module, &oracle).unwrap();
        let graph = &build.graph;

        for edge in graph.edges().iter().filter(|e| e.kind == EdgeKind::Direct) {
            let src = graph.node(edge.src).unwrap();
            let dst = graph.node(edge.dst).unwrap();
            assert_eq!(src.kind, NodeKind::Def);
            assert_eq!(dst.kind, NodeKind::Use);
            assert_eq!(src.value, dst.value);
        }
    }

    #[test]
    fn malformed_function_is_skipped_and_named() {
        let mut builder = ModuleBuilder::new();

        let mut f = builder.function("f");
        let dangling = f.alloc_value(TypeTag::Scalar);
        let copy = f.assign(dangling);
        f.ret(Some(copy));
        f.finish();

        let mut g = builder.function("g");
        let v = g.param(TypeTag::Scalar);
        let w = g.assign(v);
        g.ret(Some(w));
        g.finish();

        let module = builder.finish();
        let oracle = crate::analysis::AndersenPointsTo::analyze(&module);
        let build = VfgBuilder::build(&module, &oracle).unwrap();

        assert_eq!(build.skipped.len(), 1);
        assert_eq!(build.skipped[0].name, "f");
        assert!(build.skipped[0].reason.contains("undefined value"));

        // g still contributed its def and use sites.
        assert!(build.graph.nodes().iter().any(|n| n.value == w));
    }

    #[test]
    fn duplicate_definition_is_malformed() {
        let mut builder = ModuleBuilder::new();
        let mut f = builder.function("f");
        let v = f.param(TypeTag::Scalar);
        let r = f.assign(v);
        f.push(InstKind::Assign {
            result: r,
            operand: v,
        });
        f.ret(None);
        f.finish();

        let module = builder.finish();
        let oracle = crate::analysis::AndersenPointsTo::analyze(&module);
        let build = VfgBuilder::build(&module, &oracle).unwrap();
        assert_eq!(build.skipped.len(), 1);
        assert!(build.skipped[0].reason.contains("duplicate definition"));
    }

    #[test]
    fn growing_oracle_answers_never_lose_indirect_edges() {
        let mut builder = ModuleBuilder::new();
        let mut f = builder.function("f");
        let v0 = f.param(TypeTag::Scalar);
        let x = f.object("x");
        let y = f.object("y");
        let p = f.addr_of(x);
        let q = f.addr_of(y);
        let c = f.assign(v0);
        let d = f.assign(v0);
        f.store(p, c);
        f.store(q, d);
        let u = f.load(p, TypeTag::Scalar);
        f.ret(Some(u));
        f.finish();
        let module = builder.finish();

        let count_indirect = |oracle: &MockOracle| {
            let build = VfgBuilder::build(&module, oracle).unwrap();
            build
                .graph
                .edges()
                .iter()
                .filter(|e| e.kind == EdgeKind::Indirect)
                .count()
        };

        let narrow = MockOracle::new(vec![(p, vec![0]), (q, vec![1])]);
        let wide = MockOracle::new(vec![(p, vec![0, 1]), (q, vec![1])]);
        assert!(count_indirect(&wide) >= count_indirect(&narrow));
    }

    #[test]
    fn building_twice_yields_identical_graphs() {
        let (module, _, _) = store_load_module();
        let oracle = crate::analysis::AndersenPointsTo::analyze(&module);
        let first = VfgBuilder::build(&module, &oracle).unwrap();
        let second = VfgBuilder::build(&module, &oracle).unwrap();
        assert_eq!(first.graph, second.graph);
    }

    #[test]
    fn slice_keeps_forward_and_backward_closure() {
        let (module, _, c) = store_load_module();
        let oracle = crate::analysis::AndersenPointsTo::analyze(&module);
        let graph = VfgBuilder::build(&module, &oracle).unwrap().graph;

        let c_def = graph
            .nodes()
            .iter()
            .find(|n| n.value == c && n.kind == NodeKind::Def)
            .unwrap()
            .id;

        let slice = graph.slice(&[c_def]).unwrap();
        assert!(slice.node_count() <= graph.node_count());
        assert!(slice.node(c_def).is_some());
        // Every edge of the slice exists in the full graph.
        for edge in slice.edges() {
            assert!(graph.edges().contains(edge));
        }
    }

    #[test]
    fn slice_of_unknown_node_is_rejected() {
        let (module, _, _) = store_load_module();
        let oracle = crate::analysis::AndersenPointsTo::analyze(&module);
        let graph = VfgBuilder::build(&module, &oracle).unwrap().graph;
        assert!(matches!(
            graph.slice(&[NodeId(9999)]),
            Err(IrError::UnknownNode(_))
        ));
    }
}
