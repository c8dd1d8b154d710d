//! Single memoized walk of the graph.

use std::collections::HashSet;

use fixgen_graph::{Graph, GraphError, Node, NodeId, Value};
use serde::Serialize;

use crate::{CodegenOptions, naming::to_snake_case};

/// Per-node facts recorded by the walk.
#[derive(Debug, Clone, Serialize)]
pub struct NodeInfo {
    /// Post-order index: every node comes after all of its descendants.
    pub position: usize,
    /// Distinct nodes referencing this one, in post-order.
    pub referrers: Vec<NodeId>,
    /// Children in field order, with multiplicity.
    pub references: Vec<NodeId>,
    /// Suggested variable name, from the path of the first reference.
    pub name_hint: String,
}

/// Nodes reachable from a unit root without entering another sub-fixture.
#[derive(Debug, Clone, Serialize)]
pub struct Region {
    pub name: String,
    pub root: NodeId,
    /// In post-order. Empty for the default unit when it simply calls a
    /// sub-fixture.
    pub nodes: Vec<NodeId>,
}

/// Result of walking the graph from the fixture root.
#[derive(Debug, Clone, Serialize)]
pub struct Traversal {
    pub root: NodeId,
    /// Reachable nodes in post-order.
    pub order: Vec<NodeId>,
    /// Default unit first, then sub-fixtures in configuration order.
    pub regions: Vec<Region>,
    info: Vec<Option<NodeInfo>>,
}

impl Traversal {
    /// Walk the graph from `root`, visiting each node once.
    pub fn walk(
        graph: &Graph,
        root: NodeId,
        options: &CodegenOptions,
    ) -> Result<Self, GraphError> {
        let root_node = graph.node(root)?;
        let mut visited = vec![false; graph.len()];
        let mut hints: Vec<Option<String>> = vec![None; graph.len()];
        let mut order = Vec::new();

        visited[root.index()] = true;
        hints[root.index()] = Some(to_snake_case(&root_node.target.name));
        let mut stack = vec![(root, child_paths(root_node), 0usize)];

        while let Some((id, children, next)) = stack.last_mut() {
            if let Some((child, path)) = children.get(*next).cloned() {
                *next += 1;
                let slot = child.index();
                if !visited[slot] {
                    visited[slot] = true;
                    hints[slot] = Some(path);
                    let node = graph.node(child)?;
                    stack.push((child, child_paths(node), 0));
                }
            } else {
                let id = *id;
                stack.pop();
                order.push(id);
            }
        }

        let mut info: Vec<Option<NodeInfo>> = vec![None; graph.len()];
        for (position, &id) in order.iter().enumerate() {
            info[id.index()] = Some(NodeInfo {
                position,
                referrers: Vec::new(),
                references: graph.node(id)?.references(),
                name_hint: hints[id.index()].take().unwrap_or_default(),
            });
        }
        for &id in &order {
            let distinct: HashSet<NodeId> = info[id.index()]
                .as_ref()
                .map(|i| i.references.iter().copied().collect())
                .unwrap_or_default();
            for child in distinct {
                if let Some(child_info) = info[child.index()].as_mut() {
                    child_info.referrers.push(id);
                }
            }
        }

        let mut traversal = Self {
            root,
            order,
            regions: Vec::new(),
            info,
        };
        traversal.regions = traversal.compute_regions(options);
        Ok(traversal)
    }

    fn compute_regions(&self, options: &CodegenOptions) -> Vec<Region> {
        let boundaries: HashSet<NodeId> = options.sub_fixtures.values().copied().collect();
        let mut regions = Vec::with_capacity(options.sub_fixtures.len() + 1);

        let default_nodes = if boundaries.contains(&self.root) {
            Vec::new()
        } else {
            self.region_from(self.root, &boundaries)
        };
        regions.push(Region {
            name: options.top_level_fixture_name.clone(),
            root: self.root,
            nodes: default_nodes,
        });

        for (name, &root) in &options.sub_fixtures {
            let nodes = if self.is_reachable(root) {
                self.region_from(root, &boundaries)
            } else {
                Vec::new()
            };
            regions.push(Region {
                name: name.clone(),
                root,
                nodes,
            });
        }
        regions
    }

    fn region_from(&self, start: NodeId, boundaries: &HashSet<NodeId>) -> Vec<NodeId> {
        let mut seen = HashSet::from([start]);
        let mut stack = vec![start];
        while let Some(id) = stack.pop() {
            for &child in self.references(id) {
                if !boundaries.contains(&child) && seen.insert(child) {
                    stack.push(child);
                }
            }
        }
        let mut nodes: Vec<NodeId> = seen.into_iter().collect();
        nodes.sort_by_key(|id| self.position(*id));
        nodes
    }

    /// Get the walk facts for a node, `None` if it is unreachable.
    pub fn info(&self, id: NodeId) -> Option<&NodeInfo> {
        self.info.get(id.index()).and_then(Option::as_ref)
    }

    pub fn is_reachable(&self, id: NodeId) -> bool {
        self.info(id).is_some()
    }

    /// Post-order index of a node.
    pub fn position(&self, id: NodeId) -> Option<usize> {
        self.info(id).map(|i| i.position)
    }

    /// Number of distinct nodes that reference `id`.
    pub fn parent_count(&self, id: NodeId) -> usize {
        self.info(id).map_or(0, |i| i.referrers.len())
    }

    pub fn referrers(&self, id: NodeId) -> &[NodeId] {
        self.info(id).map_or(&[], |i| i.referrers.as_slice())
    }

    pub fn references(&self, id: NodeId) -> &[NodeId] {
        self.info(id).map_or(&[], |i| i.references.as_slice())
    }

    pub fn name_hint(&self, id: NodeId) -> &str {
        self.info(id).map_or("", |i| i.name_hint.as_str())
    }

    /// Size of the graph arena the walk was run on.
    pub fn arena_len(&self) -> usize {
        self.info.len()
    }
}

/// Children of a node paired with the path that reaches them, used for
/// name hints: `encoder`, `layers_0`, `embedders_tokens`.
fn child_paths(node: &Node) -> Vec<(NodeId, String)> {
    let mut out = Vec::new();
    for (name, value) in node.args() {
        let mut stack = vec![(value, name.to_string())];
        while let Some((value, path)) = stack.pop() {
            match value {
                Value::Node(id) => out.push((*id, path)),
                Value::List(items) | Value::Tuple(items) => {
                    for (i, item) in items.iter().enumerate().rev() {
                        stack.push((item, format!("{}_{}", path, i)));
                    }
                }
                Value::Dict(entries) => {
                    for (i, (key, item)) in entries.iter().enumerate().rev() {
                        let suffix = match key {
                            Value::Str(s) => s.clone(),
                            Value::Int(n) => n.to_string(),
                            _ => i.to_string(),
                        };
                        stack.push((item, format!("{}_{}", path, suffix)));
                        stack.push((key, format!("{}_key_{}", path, i)));
                    }
                }
                _ => {}
            }
        }
    }
    out
}
