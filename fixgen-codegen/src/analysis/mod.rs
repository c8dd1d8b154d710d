//! Analyses computed over the input graph.
//!
//! Each analysis is produced by one pipeline phase and consumed by the
//! later ones:
//!
//! ```text
//! Traversal → Complexity → HoistPlan → Partition → Program
//! ```

mod complexity;
mod hoisting;
mod partition;
mod traversal;

pub use complexity::{Complexity, node_score, value_score};
pub use hoisting::{HoistPlan, HoistReason};
pub use partition::{Partition, UnitPlan};
pub use traversal::{NodeInfo, Region, Traversal};
