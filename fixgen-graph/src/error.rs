use thiserror::Error;

use crate::NodeId;

/// Errors raised while building or querying a [`Graph`](crate::Graph).
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GraphError {
    #[error("node {id} does not exist in a graph of {len} node(s)")]
    UnknownNode { id: NodeId, len: usize },

    #[error("field '{field}' of new node references {target}, which has not been added yet")]
    DanglingReference { field: String, target: NodeId },

    #[error("graph is full")]
    Capacity,
}
