//! Compilation pipeline.
//!
//! A [`Pipeline`] runs the compiler as a straight line of phases over a
//! shared [`CompilationContext`]:
//!
//! - Explicit phase boundaries (validate → walk → score → hoist → partition → emit)
//! - Plugin hooks before and after each phase
//! - Unified diagnostics collection
//!
//! # Example
//!
//! ```
//! use fixgen_codegen::{CodegenOptions, pipeline::Pipeline};
//! use fixgen_graph::{Graph, Node};
//!
//! let mut graph = Graph::new();
//! let root = graph.add(Node::config("models.Leaf").with_arg("x", 1)).unwrap();
//! let ctx = Pipeline::new().run(&graph, root, CodegenOptions::default())?;
//!
//! for diag in ctx.warnings() {
//!     eprintln!("{}", diag);
//! }
//! assert_eq!(ctx.program()?.units.len(), 1);
//! # Ok::<(), eyre::Report>(())
//! ```

mod context;
mod diagnostic;
mod phase;
pub mod phases;
mod plugin;
mod runner;
mod snapshot;

pub use context::CompilationContext;
pub use diagnostic::{Diagnostic, Severity};
pub use phase::{Phase, PhaseInfo};
pub use plugin::Plugin;
pub use runner::Pipeline;
pub use snapshot::{PhaseSnapshot, SnapshotPlugin};
