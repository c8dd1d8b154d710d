//! Stable node identity.

use serde::{Deserialize, Serialize};

/// Index of a node inside a [`Graph`](crate::Graph).
///
/// Identity is positional: two references to the same `NodeId` are the same
/// object, which is what the compiler relies on to detect aliasing.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct NodeId(pub u32);

impl NodeId {
    /// Position of this node in its graph's arena.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}
