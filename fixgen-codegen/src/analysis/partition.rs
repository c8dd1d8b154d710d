//! Assignment of nodes to emitted units.
//!
//! Unit 0 is the default fixture; unit `j` is the `j`-th configured
//! sub-fixture. Units form a tree: a sub-fixture's parent is the unit that
//! contains its call. Every non-fresh node is placed in the lowest common
//! ancestor of the units that need it, and threaded down to the others as
//! a parameter.

use std::collections::BTreeSet;

use fixgen_graph::{Graph, NodeId};
use serde::Serialize;

use super::{HoistPlan, HoistReason, Traversal};
use crate::{CodegenOptions, CompileError};

/// Index of the default unit.
pub const DEFAULT_UNIT: usize = 0;

/// Plan for one emitted function.
#[derive(Debug, Clone, Serialize)]
pub struct UnitPlan {
    pub name: String,
    pub root: NodeId,
    /// Unit containing this unit's call. `None` only for the default unit.
    pub parent: Option<usize>,
    pub depth: usize,
    /// Nodes received from the caller, in post-order.
    pub params: Vec<NodeId>,
    /// Non-fresh nodes whose expression lives in this unit, in post-order.
    /// Includes calls to child units.
    pub locals: Vec<NodeId>,
    pub children: Vec<usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Partition {
    pub units: Vec<UnitPlan>,
    placement: Vec<Option<usize>>,
    emitted_in: Vec<BTreeSet<usize>>,
}

impl Partition {
    /// Place every reachable node, force-hoisting the ones that cross a unit
    /// boundary.
    pub fn compute(
        graph: &Graph,
        traversal: &Traversal,
        hoisting: &mut HoistPlan,
        options: &CodegenOptions,
    ) -> Result<Self, CompileError> {
        let len = traversal.arena_len();
        let mut units = Vec::with_capacity(options.sub_fixtures.len() + 1);
        units.push(UnitPlan {
            name: options.top_level_fixture_name.clone(),
            root: traversal.root,
            parent: None,
            depth: 0,
            params: Vec::new(),
            locals: Vec::new(),
            children: Vec::new(),
        });
        for (name, &root) in &options.sub_fixtures {
            units.push(UnitPlan {
                name: name.clone(),
                root,
                parent: None,
                depth: 0,
                params: Vec::new(),
                locals: Vec::new(),
                children: Vec::new(),
            });
        }

        let mut partition = Self {
            units,
            placement: vec![None; len],
            emitted_in: vec![BTreeSet::new(); len],
        };

        for &id in traversal.order.iter().rev() {
            let demanders: BTreeSet<usize> = if id == traversal.root {
                BTreeSet::from([DEFAULT_UNIT])
            } else {
                traversal
                    .referrers(id)
                    .iter()
                    .flat_map(|parent| partition.emitted_in[parent.index()].iter().copied())
                    .collect()
            };
            if demanders.is_empty() {
                return Err(CompileError::invariant(format!(
                    "node {} is reachable but no unit emits a referrer",
                    id
                )));
            }

            let node = graph
                .node(id)
                .map_err(|e| CompileError::invariant(e.to_string()))?;
            if node.kind.is_fresh() {
                partition.emitted_in[id.index()] = demanders;
                continue;
            }

            let home = partition.common_ancestor(&demanders)?;
            if partition.placement[id.index()].replace(home).is_some() {
                return Err(CompileError::invariant(format!(
                    "node {} assigned to two units",
                    id
                )));
            }
            partition.units[home].locals.push(id);

            match partition.unit_of_root(id) {
                Some(unit) if unit != DEFAULT_UNIT => {
                    let depth = partition.units[home].depth + 1;
                    let plan = &mut partition.units[unit];
                    plan.parent = Some(home);
                    plan.depth = depth;
                    partition.units[home].children.push(unit);
                    partition.emitted_in[id.index()] = BTreeSet::from([unit]);
                    tracing::trace!(unit = %partition.units[unit].name, caller = home, "sub-fixture call placed");
                }
                _ => partition.emitted_in[id.index()] = BTreeSet::from([home]),
            }

            if demanders.len() > 1 || !demanders.contains(&home) {
                for &demander in &demanders {
                    let mut unit = demander;
                    while unit != home {
                        partition.units[unit].params.push(id);
                        unit = partition.units[unit].parent.ok_or_else(|| {
                            CompileError::invariant(format!(
                                "unit '{}' has no caller",
                                partition.units[unit].name
                            ))
                        })?;
                    }
                }
                hoisting.force(id, HoistReason::CrossUnit);
                tracing::trace!(node = %id, home, "threaded across units");
            }
        }

        for unit in partition.units.iter_mut().skip(1) {
            if unit.parent.is_none() {
                return Err(CompileError::invariant(format!(
                    "sub-fixture '{}' is never called",
                    unit.name
                )));
            }
        }
        for unit in &mut partition.units {
            unit.params.sort_by_key(|id| traversal.position(*id));
            unit.params.dedup();
            unit.locals.sort_by_key(|id| traversal.position(*id));
            unit.locals.dedup();
            unit.children.sort_unstable();
        }
        partition.check_regions(traversal)?;

        tracing::debug!(
            units = partition.units.len(),
            params = partition.units.iter().map(|u| u.params.len()).sum::<usize>(),
            "partitioned"
        );
        Ok(partition)
    }

    fn common_ancestor(&self, units: &BTreeSet<usize>) -> Result<usize, CompileError> {
        let mut iter = units.iter().copied();
        let mut acc = iter.next().unwrap_or(DEFAULT_UNIT);
        for mut other in iter {
            while acc != other {
                let (a, b) = (&self.units[acc], &self.units[other]);
                if a.depth >= b.depth {
                    acc = self.caller(acc)?;
                } else {
                    other = self.caller(other)?;
                }
            }
        }
        Ok(acc)
    }

    /// A placed node's home must be the common ancestor of every unit whose
    /// region contains it. Sub-fixture roots sit on region boundaries and are
    /// placed by their call instead.
    fn check_regions(&self, traversal: &Traversal) -> Result<(), CompileError> {
        let mut containing = vec![BTreeSet::new(); self.placement.len()];
        for (unit, region) in traversal.regions.iter().enumerate() {
            for &id in &region.nodes {
                containing[id.index()].insert(unit);
            }
        }
        for &id in &traversal.order {
            let Some(home) = self.home(id) else {
                continue;
            };
            if self.unit_of_root(id).is_some() {
                continue;
            }
            let expected = self.common_ancestor(&containing[id.index()])?;
            if expected != home {
                return Err(CompileError::invariant(format!(
                    "node {} placed in '{}' but its regions meet in '{}'",
                    id, self.units[home].name, self.units[expected].name
                )));
            }
        }
        Ok(())
    }

    fn caller(&self, unit: usize) -> Result<usize, CompileError> {
        self.units[unit].parent.ok_or_else(|| {
            CompileError::invariant(format!(
                "unit '{}' is used before its call is placed",
                self.units[unit].name
            ))
        })
    }

    /// Sub-fixture unit whose terminal expression is `id`, if any.
    ///
    /// When the graph root is also a sub-fixture root this is the
    /// sub-fixture, and the default unit only calls it.
    pub fn unit_of_root(&self, id: NodeId) -> Option<usize> {
        self.units.iter().skip(1).position(|u| u.root == id).map(|i| i + 1)
    }

    /// Unit holding the expression of a non-fresh node.
    pub fn home(&self, id: NodeId) -> Option<usize> {
        self.placement.get(id.index()).copied().flatten()
    }

    /// Units that emit the expression of `id`: its home, its own unit for a
    /// sub-fixture root, every demanding unit for a fresh node.
    pub fn emitted_in(&self, id: NodeId) -> impl Iterator<Item = usize> + '_ {
        self.emitted_in
            .get(id.index())
            .into_iter()
            .flat_map(|set| set.iter().copied())
    }

    pub fn is_emitted_in(&self, id: NodeId, unit: usize) -> bool {
        self.emitted_in
            .get(id.index())
            .is_some_and(|set| set.contains(&unit))
    }

    /// Units in definition order: callees before callers, default last.
    pub fn emission_order(&self) -> Vec<usize> {
        let mut order = Vec::with_capacity(self.units.len());
        let mut stack = vec![(DEFAULT_UNIT, 0usize)];
        while let Some((unit, next)) = stack.last_mut() {
            if let Some(&child) = self.units[*unit].children.get(*next) {
                *next += 1;
                stack.push((child, 0));
            } else {
                order.push(*unit);
                stack.pop();
            }
        }
        order
    }
}
