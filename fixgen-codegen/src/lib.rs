//! Compiler from builder graphs to `auto_config` fixture source code.
//!
//! This crate turns a [`Graph`](fixgen_graph::Graph) of deferred
//! construction steps into a Python module whose functions rebuild the same
//! graph, aliasing included.
//!
//! # Module Organization
//!
//! - [`pipeline`] - Phase orchestration, diagnostics and plugins
//! - [`analysis`] - Walk, complexity scores, hoisting and unit partitioning
//! - [`program`] - Lowered units and expressions
//! - [`generation`] - Python rendering (CodeBuilder, ImportCollector, PythonRenderer)
//! - [`naming`] - Identifier sanitization and unique names
//! - [`testing`] - Replay interpreter and fixture graphs (feature-gated)
//!
//! # Example
//!
//! ```
//! use fixgen_codegen::{CodegenOptions, compile};
//! use fixgen_graph::{Graph, Node};
//!
//! let mut graph = Graph::new();
//! let leaf = graph.add(Node::config("models.layers.Leaf").with_arg("x", 1)).unwrap();
//! let root = graph
//!     .add(Node::config("models.layers.Root").with_arg("a", leaf).with_arg("b", leaf))
//!     .unwrap();
//!
//! let source = compile(&graph, root, CodegenOptions::default()).unwrap();
//! assert_eq!(
//!     source,
//!     "from fiddle.experimental import auto_config\n\
//!      from models import layers\n\
//!      \n\
//!      \n\
//!      @auto_config.auto_config\n\
//!      def config_fixture():\n    \
//!      a = layers.Leaf(x=1)\n    \
//!      return layers.Root(a=a, b=a)\n"
//! );
//! ```

pub mod analysis;
mod error;
pub mod generation;
pub mod naming;
pub mod options;
pub mod pipeline;
pub mod program;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use error::CompileError;
use fixgen_graph::{Graph, NodeId};
pub use options::CodegenOptions;

/// Compile `graph` from `root` to Python source.
///
/// # Errors
///
/// Fails without producing any text when validation rejects the input or a
/// value has no source form. The report wraps a [`CompileError`] for those
/// cases.
pub fn compile(graph: &Graph, root: NodeId, options: CodegenOptions) -> eyre::Result<String> {
    pipeline::Pipeline::new()
        .run(graph, root, options)?
        .take_output()
}
