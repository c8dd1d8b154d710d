//! Decides which nodes become named variables.

use std::collections::HashSet;

use fixgen_graph::{Graph, GraphError, NodeId};
use indexmap::IndexMap;
use serde::Serialize;

use super::{Complexity, Traversal, node_score};
use crate::CodegenOptions;

/// Why a node was hoisted to a variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HoistReason {
    /// Emitted more than once, so it needs a name to keep its identity.
    Shared,
    /// Pulled out of a parent expression that was over budget.
    Complex,
    /// Built in one unit and passed to another.
    CrossUnit,
}

impl HoistReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            HoistReason::Shared => "shared",
            HoistReason::Complex => "complex",
            HoistReason::CrossUnit => "cross_unit",
        }
    }
}

/// Hoisting decisions for every reachable node.
#[derive(Debug, Clone, Serialize)]
pub struct HoistPlan {
    hoisted: IndexMap<NodeId, HoistReason>,
    reference_counts: Vec<u32>,
    effective: Vec<u32>,
}

impl HoistPlan {
    /// Apply the sharing rule, then the complexity budget if one is set.
    pub fn compute(
        graph: &Graph,
        traversal: &Traversal,
        complexity: &Complexity,
        options: &CodegenOptions,
    ) -> Result<Self, GraphError> {
        let len = traversal.arena_len();
        let sub_roots: HashSet<NodeId> = options.sub_fixtures.values().copied().collect();

        // Parents come before children in reverse post-order, so every
        // emission count is final by the time it is propagated.
        let mut reference_counts = vec![0u32; len];
        reference_counts[traversal.root.index()] = 1;
        for &id in traversal.order.iter().rev() {
            let emissions = if graph.node(id)?.kind.is_fresh() {
                reference_counts[id.index()]
            } else {
                1
            };
            for &child in traversal.references(id) {
                let count = &mut reference_counts[child.index()];
                *count = count.saturating_add(emissions);
            }
        }

        let mut hoisted = IndexMap::new();
        for &id in &traversal.order {
            if id != traversal.root
                && !graph.node(id)?.kind.is_fresh()
                && reference_counts[id.index()] > 1
            {
                hoisted.insert(id, HoistReason::Shared);
            }
        }

        let mut plan = Self {
            hoisted,
            reference_counts,
            effective: vec![0; len],
        };

        let threshold = options.max_expression_complexity;
        for &id in &traversal.order {
            let node = graph.node(id)?;
            let mut score = plan.inline_score(node, &sub_roots);
            if let Some(max) = threshold.filter(|max| score > *max) {
                for child in plan.split_candidates(graph, traversal, complexity, id, &sub_roots)? {
                    if score <= max {
                        break;
                    }
                    plan.hoisted.insert(child, HoistReason::Complex);
                    score = plan.inline_score(node, &sub_roots);
                }
            }
            plan.effective[id.index()] = score;
        }

        tracing::debug!(
            shared = plan.count(HoistReason::Shared),
            complex = plan.count(HoistReason::Complex),
            "hoisting decided"
        );
        Ok(plan)
    }

    /// Score of a node's expression as currently planned.
    fn inline_score(&self, node: &fixgen_graph::Node, sub_roots: &HashSet<NodeId>) -> u32 {
        node_score(node, &|child| {
            if self.is_hoisted(child) || sub_roots.contains(&child) {
                1
            } else {
                self.effective_score(child)
            }
        })
    }

    /// Direct children that could be pulled out of `id`, biggest first.
    fn split_candidates(
        &self,
        graph: &Graph,
        traversal: &Traversal,
        complexity: &Complexity,
        id: NodeId,
        sub_roots: &HashSet<NodeId>,
    ) -> Result<Vec<NodeId>, GraphError> {
        let mut seen = HashSet::new();
        let mut candidates = Vec::new();
        for &child in traversal.references(id) {
            if !seen.insert(child)
                || self.is_hoisted(child)
                || sub_roots.contains(&child)
                || graph.node(child)?.kind.is_fresh()
                || self.effective_score(child) <= 1
            {
                continue;
            }
            candidates.push(child);
        }
        candidates.sort_by(|a, b| {
            self.effective_score(*b)
                .cmp(&self.effective_score(*a))
                .then(complexity.score(*b).cmp(&complexity.score(*a)))
                .then(traversal.position(*a).cmp(&traversal.position(*b)))
        });
        Ok(candidates)
    }

    /// Hoist a node regardless of the usual rules. Keeps an earlier reason.
    pub fn force(&mut self, id: NodeId, reason: HoistReason) {
        self.hoisted.entry(id).or_insert(reason);
    }

    pub fn is_hoisted(&self, id: NodeId) -> bool {
        self.hoisted.contains_key(&id)
    }

    pub fn reason(&self, id: NodeId) -> Option<HoistReason> {
        self.hoisted.get(&id).copied()
    }

    /// Number of expression sites that reference `id`.
    pub fn reference_count(&self, id: NodeId) -> u32 {
        self.reference_counts.get(id.index()).copied().unwrap_or(0)
    }

    /// Score of the expression emitted for `id` after hoisting.
    pub fn effective_score(&self, id: NodeId) -> u32 {
        self.effective.get(id.index()).copied().unwrap_or(0)
    }

    pub fn count(&self, reason: HoistReason) -> usize {
        self.hoisted.values().filter(|r| **r == reason).count()
    }

    /// Hoisted nodes in decision order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, HoistReason)> + '_ {
        self.hoisted.iter().map(|(id, reason)| (*id, *reason))
    }

    pub fn len(&self) -> usize {
        self.hoisted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hoisted.is_empty()
    }
}
