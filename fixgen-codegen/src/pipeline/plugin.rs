//! Pipeline plugin trait.

use eyre::Result;

use super::CompilationContext;

/// A hook around every phase of the pipeline.
///
/// # Example
///
/// ```
/// use std::sync::Mutex;
///
/// use fixgen_codegen::{
///     CodegenOptions,
///     pipeline::{CompilationContext, Pipeline, Plugin},
/// };
/// use fixgen_graph::{Graph, Node};
///
/// #[derive(Default)]
/// struct PhaseLog(Mutex<Vec<String>>);
///
/// impl Plugin for PhaseLog {
///     fn name(&self) -> &'static str {
///         "phase-log"
///     }
///
///     fn on_after_phase(&self, phase: &str, _ctx: &mut CompilationContext<'_>) -> eyre::Result<()> {
///         self.0.lock().unwrap().push(phase.to_string());
///         Ok(())
///     }
/// }
///
/// let mut graph = Graph::new();
/// let root = graph.add(Node::config("models.Leaf").with_arg("x", 1)).unwrap();
/// Pipeline::new()
///     .plugin(PhaseLog::default())
///     .run(&graph, root, CodegenOptions::default())
///     .unwrap();
/// ```
pub trait Plugin: Send + Sync {
    /// The name of this plugin (for debugging and logging).
    fn name(&self) -> &'static str;

    /// Called before a phase runs.
    ///
    /// # Errors
    ///
    /// Return an error to abort the pipeline.
    #[allow(unused_variables)]
    fn on_before_phase(&self, phase: &str, ctx: &mut CompilationContext<'_>) -> Result<()> {
        Ok(())
    }

    /// Called after a phase completes successfully.
    ///
    /// # Errors
    ///
    /// Return an error to abort the pipeline.
    #[allow(unused_variables)]
    fn on_after_phase(&self, phase: &str, ctx: &mut CompilationContext<'_>) -> Result<()> {
        Ok(())
    }
}
