use crate::instructions::InstKind;
use crate::module::Module;
use crate::values::{ObjectId, ValueId};
use crate::{IrError, Result};
use indexmap::IndexMap;
use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};

/// An abstract memory object a pointer may reference. Minted by the oracle,
/// one per declared [`MemoryObject`](crate::MemoryObject), shared between all
/// values that may point to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AbstractLocation(pub u32);

impl std::fmt::Display for AbstractLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "loc{}", self.0)
    }
}

/// Answers "which abstract locations can this pointer reference".
///
/// Implementations must be monotone: a module extended with more program text
/// may only grow an answer set, never shrink it. Querying a value that is not
/// pointer-typed is a caller bug and must fail, not approximate.
pub trait PointsToOracle {
    fn resolve(&self, value: ValueId) -> Result<&BTreeSet<AbstractLocation>>;
}

/// Andersen-style inclusion-based points-to analysis: flow- and
/// context-insensitive, whole-module, sound for the IR's pointer operations.
///
/// `p = &x` seeds `x`'s location into `p`'s set; `p = q` makes `p`'s set a
/// superset of `q`'s. Propagation runs an explicit worklist over the copy
/// edges until no set changes.
#[derive(Debug)]
pub struct AndersenPointsTo {
    sets: HashMap<ValueId, BTreeSet<AbstractLocation>>,
    pointers: HashSet<ValueId>,
    locations: IndexMap<ObjectId, AbstractLocation>,
    empty: BTreeSet<AbstractLocation>,
}

impl AndersenPointsTo {
    pub fn analyze(module: &Module) -> Self {
        let mut locations = IndexMap::new();
        let mut pointers = HashSet::new();

        for function in module.functions.values() {
            for &object in function.objects.keys() {
                let next = AbstractLocation(locations.len() as u32);
                locations.entry(object).or_insert(next);
            }
            for (&value, ty) in &function.value_types {
                if ty.is_pointer() {
                    pointers.insert(value);
                }
            }
        }

        let mut sets: HashMap<ValueId, BTreeSet<AbstractLocation>> = HashMap::new();
        let mut copy_edges: HashMap<ValueId, Vec<ValueId>> = HashMap::new();
        let mut worklist = VecDeque::new();

        for function in module.functions.values() {
            for (_, inst) in function.instructions() {
                match &inst.kind {
                    InstKind::AddrOf { result, object } => {
                        let loc = locations[object];
                        if sets.entry(*result).or_default().insert(loc) {
                            worklist.push_back(*result);
                        }
                    }
                    InstKind::Assign { result, operand } => {
                        copy_edges.entry(*operand).or_default().push(*result);
                    }
                    _ => {}
                }
            }
        }

        let mut rounds = 0usize;
        while let Some(value) = worklist.pop_front() {
            rounds += 1;
            let Some(src_set) = sets.get(&value).cloned() else {
                continue;
            };
            for &dst in copy_edges.get(&value).map(|v| v.as_slice()).unwrap_or(&[]) {
                let dst_set = sets.entry(dst).or_default();
                let before = dst_set.len();
                dst_set.extend(src_set.iter().copied());
                if dst_set.len() > before {
                    worklist.push_back(dst);
                }
            }
        }
        tracing::debug!(rounds, "points-to fixpoint converged");

        Self {
            sets,
            pointers,
            locations,
            empty: BTreeSet::new(),
        }
    }

    pub fn location_of(&self, object: ObjectId) -> Option<AbstractLocation> {
        self.locations.get(&object).copied()
    }
}

impl PointsToOracle for AndersenPointsTo {
    fn resolve(&self, value: ValueId) -> Result<&BTreeSet<AbstractLocation>> {
        if !self.pointers.contains(&value) {
            return Err(IrError::NonPointerQuery(value));
        }
        Ok(self.sets.get(&value).unwrap_or(&self.empty))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::ModuleBuilder;
    use crate::values::TypeTag;

    #[test]
    fn addr_of_seeds_and_assign_propagates() {
        let mut builder = ModuleBuilder::new();
        let mut f = builder.function("f");
        let x = f.object("x");
        let p = f.addr_of(x);
        let q = f.assign(p);
        let r = f.assign(q);
        f.ret(None);
        f.finish();
        let module = builder.finish();

        let oracle = AndersenPointsTo::analyze(&module);
        let loc = oracle.location_of(x).unwrap();

        assert_eq!(oracle.resolve(p).unwrap().len(), 1);
        assert!(oracle.resolve(q).unwrap().contains(&loc));
        assert!(oracle.resolve(r).unwrap().contains(&loc));
    }

    #[test]
    fn non_pointer_query_is_rejected() {
        let mut builder = ModuleBuilder::new();
        let mut f = builder.function("f");
        let s = f.param(TypeTag::Scalar);
        f.ret(Some(s));
        f.finish();
        let module = builder.finish();

        let oracle = AndersenPointsTo::analyze(&module);
        assert!(matches!(
            oracle.resolve(s),
            Err(IrError::NonPointerQuery(_))
        ));
    }

    #[test]
    fn pointer_with_no_seed_resolves_empty() {
        let mut builder = ModuleBuilder::new();
        let mut f = builder.function("f");
        let p = f.param(TypeTag::Pointer);
        f.ret(Some(p));
        f.finish();
        let module = builder.finish();

        let oracle = AndersenPointsTo::analyze(&module);
        assert!(oracle.resolve(p).unwrap().is_empty());
    }

    #[test]
    fn answer_sets_grow_monotonically_with_program_text() {
        // Same prefix twice; the second module adds an assignment chain.
        let build_prefix = |builder: &mut ModuleBuilder, extended: bool| {
            let mut f = builder.function("f");
            let x = f.object("x");
            let y = f.object("y");
            let p = f.addr_of(x);
            let q = f.addr_of(y);
            if extended {
                let merged = f.assign(p);
                let merged2 = f.assign(q);
                f.store(merged, merged2);
            }
            f.ret(None);
            f.finish();
            (p, q)
        };

        let mut small = ModuleBuilder::new();
        let (p_small, _) = build_prefix(&mut small, false);
        let small_module = small.finish();

        let mut large = ModuleBuilder::new();
        let (p_large, _) = build_prefix(&mut large, true);
        let large_module = large.finish();

        let small_oracle = AndersenPointsTo::analyze(&small_module);
        let large_oracle = AndersenPointsTo::analyze(&large_module);

        let small_set = small_oracle.resolve(p_small).unwrap();
        let large_set = large_oracle.resolve(p_large).unwrap();
        assert!(large_set.len() >= small_set.len());
    }
}
