//! Append-only node arena.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::{GraphError, Node, NodeId};

/// An arena of nodes forming a DAG.
///
/// # Example
///
/// ```
/// use fixgen_graph::{Graph, Node};
///
/// let mut graph = Graph::new();
/// let leaf = graph.add(Node::config("models.Leaf").with_arg("x", 1)).unwrap();
/// let root = graph
///     .add(Node::config("models.Root").with_arg("a", leaf).with_arg("b", leaf))
///     .unwrap();
///
/// assert_eq!(graph.descendants(root).unwrap().len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Graph {
    nodes: Vec<Node>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node and return its id.
    ///
    /// # Errors
    ///
    /// Fails if the node references an id that is not in the graph yet.
    pub fn add(&mut self, node: Node) -> Result<NodeId, GraphError> {
        let next = u32::try_from(self.nodes.len()).map_err(|_| GraphError::Capacity)?;
        for (field, value) in node.args() {
            if let Some(target) = value.node_refs().into_iter().find(|id| id.0 >= next) {
                return Err(GraphError::DanglingReference {
                    field: field.to_string(),
                    target,
                });
            }
        }
        self.nodes.push(node);
        Ok(NodeId(next))
    }

    /// Get a node by id.
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    /// Get a node by id, failing with [`GraphError::UnknownNode`].
    pub fn node(&self, id: NodeId) -> Result<&Node, GraphError> {
        self.get(id).ok_or(GraphError::UnknownNode {
            id,
            len: self.nodes.len(),
        })
    }

    pub fn contains(&self, id: NodeId) -> bool {
        id.index() < self.nodes.len()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Iterate over all nodes in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, node)| (NodeId(i as u32), node))
    }

    /// All nodes reachable from `root`, including `root` itself.
    pub fn descendants(&self, root: NodeId) -> Result<HashSet<NodeId>, GraphError> {
        self.node(root)?;
        let mut seen = HashSet::from([root]);
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            for child in self.node(id)?.references() {
                if seen.insert(child) {
                    stack.push(child);
                }
            }
        }
        Ok(seen)
    }
}
