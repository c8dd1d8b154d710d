//! Builder graph model for the fixgen fixture compiler.
//!
//! This crate provides the data model that the compiler consumes: an arena of
//! deferred construction steps ([`Node`]s) whose arguments reference each
//! other by [`NodeId`]. The same node may be referenced from several fields,
//! which is how object aliasing is expressed.
//!
//! # Architecture
//!
//! ```text
//! fixture.toml → fixgen-manifest (parsing) → fixgen-graph (Graph) → fixgen-codegen
//! ```
//!
//! The graph is append-only: a node can only reference nodes that were added
//! before it, so every [`Graph`] is acyclic by construction.

mod eq;
mod error;
mod graph;
mod id;
mod node;
mod types;
mod value;

pub use eq::{Mismatch, dag_eq};
pub use error::GraphError;
pub use graph::Graph;
pub use id::NodeId;
pub use node::{Field, Node};
pub use types::{NodeKind, Symbol};
pub use value::Value;
