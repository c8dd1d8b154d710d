//! Built-in pipeline phases.
//!
//! - [`ValidatePhase`] - runs lints over the graph and options
//! - [`WalkPhase`] - computes the [`Traversal`](crate::analysis::Traversal)
//! - [`ScorePhase`] - computes the [`Complexity`](crate::analysis::Complexity) table
//! - [`HoistPhase`] - computes the [`HoistPlan`](crate::analysis::HoistPlan)
//! - [`PartitionPhase`] - computes the [`Partition`](crate::analysis::Partition)
//! - [`EmitPhase`] - lowers to a [`Program`](crate::program::Program) and renders it

mod emit;
mod hoist;
mod partition;
mod score;
pub mod validate;
mod walk;

pub use emit::EmitPhase;
pub use hoist::HoistPhase;
pub use partition::PartitionPhase;
pub use score::ScorePhase;
pub use validate::{Lint, LintContext, LintInfo, ValidatePhase};
pub use walk::WalkPhase;
