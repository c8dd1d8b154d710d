//! Lint trait for graph validation.

use std::collections::HashSet;

use fixgen_graph::{Graph, NodeId};
use serde::Serialize;

use crate::{CodegenOptions, pipeline::Diagnostic};

/// Everything a lint may inspect.
pub struct LintContext<'a> {
    pub graph: &'a Graph,
    pub root: NodeId,
    pub options: &'a CodegenOptions,
    /// Nodes reachable from `root`, including it.
    pub reachable: HashSet<NodeId>,
}

impl LintContext<'_> {
    /// Reachable nodes in id order, so diagnostics come out deterministic.
    pub fn reachable_sorted(&self) -> Vec<NodeId> {
        let mut ids: Vec<NodeId> = self.reachable.iter().copied().collect();
        ids.sort_unstable();
        ids
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LintInfo {
    pub name: &'static str,
    pub description: &'static str,
}

/// A check that runs before any graph analysis.
pub trait Lint: Send + Sync {
    /// The name of this lint, e.g. `tag-without-value`.
    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    /// Inspect the graph and options and add any diagnostics.
    fn check(&self, ctx: &LintContext<'_>, diagnostics: &mut Vec<Diagnostic>);

    fn info(&self) -> LintInfo {
        LintInfo {
            name: self.name(),
            description: self.description(),
        }
    }
}
