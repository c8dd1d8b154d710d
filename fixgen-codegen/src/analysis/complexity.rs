//! Expression size scoring.
//!
//! A node scores one for itself plus the score of every valued field. A
//! field contributes its value's score plus one per tag. Scalars and
//! symbols score one, containers one plus their elements (dict keys
//! included). A node reference contributes whatever the caller decides: the
//! child's own score for the base table, or one when the child is emitted as
//! a variable.

use fixgen_graph::{Graph, GraphError, Node, NodeId, Value};
use serde::Serialize;

use super::Traversal;

/// Score of one value, with `contribution` deciding what a node reference
/// is worth.
pub fn value_score(value: &Value, contribution: &impl Fn(NodeId) -> u32) -> u32 {
    let mut total: u32 = 0;
    let mut stack = vec![value];
    while let Some(value) = stack.pop() {
        match value {
            Value::Node(id) => total = total.saturating_add(contribution(*id)),
            Value::List(items) | Value::Tuple(items) => {
                total = total.saturating_add(1);
                stack.extend(items);
            }
            Value::Dict(entries) => {
                total = total.saturating_add(1);
                for (key, item) in entries {
                    stack.push(key);
                    stack.push(item);
                }
            }
            _ => total = total.saturating_add(1),
        }
    }
    total
}

/// Score of a node's constructing expression.
pub fn node_score(node: &Node, contribution: &impl Fn(NodeId) -> u32) -> u32 {
    node.fields
        .values()
        .filter_map(|field| {
            field.value.as_ref().map(|value| {
                value_score(value, contribution).saturating_add(field.tags.len() as u32)
            })
        })
        .fold(1u32, u32::saturating_add)
}

/// Fully inlined score of every reachable node.
#[derive(Debug, Clone, Serialize)]
pub struct Complexity {
    base: Vec<u32>,
}

impl Complexity {
    pub fn compute(graph: &Graph, traversal: &Traversal) -> Result<Self, GraphError> {
        let mut base = vec![0u32; traversal.arena_len()];
        for &id in &traversal.order {
            let node = graph.node(id)?;
            let score = node_score(node, &|child| base[child.index()]);
            base[id.index()] = score;
        }
        Ok(Self { base })
    }

    /// Score of `id` with every descendant inlined. Zero for unreachable
    /// nodes.
    pub fn score(&self, id: NodeId) -> u32 {
        self.base.get(id.index()).copied().unwrap_or(0)
    }

    pub fn max(&self) -> u32 {
        self.base.iter().copied().max().unwrap_or(0)
    }
}
