//! Pipeline orchestrator.

use eyre::Result;
use fixgen_graph::{Graph, NodeId};

use super::{
    CompilationContext, Phase, Plugin,
    phase::PhaseInfo,
    phases::{EmitPhase, HoistPhase, PartitionPhase, ScorePhase, ValidatePhase, WalkPhase},
};
use crate::CodegenOptions;

/// The compilation pipeline orchestrator.
///
/// Runs the built-in phases (validate, walk, score, hoist, partition, emit)
/// followed by any user phases, calling plugin hooks before and after each
/// one.
///
/// # Example
///
/// ```
/// use fixgen_codegen::{CodegenOptions, pipeline::Pipeline};
/// use fixgen_graph::{Graph, Node};
///
/// let mut graph = Graph::new();
/// let leaf = graph.add(Node::config("models.Leaf").with_arg("x", 1)).unwrap();
/// let root = graph
///     .add(Node::config("models.Root").with_arg("a", leaf).with_arg("b", leaf))
///     .unwrap();
///
/// let mut ctx = Pipeline::new()
///     .run(&graph, root, CodegenOptions::default())
///     .unwrap();
/// let source = ctx.take_output().unwrap();
///
/// assert!(source.contains("a = models.Leaf(x=1)"));
/// assert!(source.contains("return models.Root(a=a, b=a)"));
/// ```
pub struct Pipeline {
    phases: Vec<Box<dyn Phase>>,
    plugins: Vec<Box<dyn Plugin>>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self {
            phases: Vec::new(),
            plugins: Vec::new(),
        }
    }

    /// Add a phase to run after the built-in phases.
    pub fn phase(mut self, phase: impl Phase + 'static) -> Self {
        self.phases.push(Box::new(phase));
        self
    }

    /// Add a plugin to receive phase lifecycle hooks.
    pub fn plugin(mut self, plugin: impl Plugin + 'static) -> Self {
        self.plugins.push(Box::new(plugin));
        self
    }

    fn builtin_phases() -> Vec<Box<dyn Phase>> {
        vec![
            Box::new(ValidatePhase::new()),
            Box::new(WalkPhase),
            Box::new(ScorePhase),
            Box::new(HoistPhase),
            Box::new(PartitionPhase),
            Box::new(EmitPhase),
        ]
    }

    /// Compile `graph` from `root`.
    ///
    /// # Errors
    ///
    /// Returns the first fatal phase error. Typed failures can be recovered
    /// with `report.downcast_ref::<CompileError>()`.
    pub fn run<'g>(
        &self,
        graph: &'g Graph,
        root: NodeId,
        options: CodegenOptions,
    ) -> Result<CompilationContext<'g>> {
        let mut ctx = CompilationContext::new(graph, root, options);

        let builtin_phases = Self::builtin_phases();
        for phase in builtin_phases.iter().chain(self.phases.iter()) {
            self.run_phase(phase.as_ref(), &mut ctx)?;
        }

        Ok(ctx)
    }

    /// Run a single phase with plugin hooks.
    pub fn run_phase(&self, phase: &dyn Phase, ctx: &mut CompilationContext<'_>) -> Result<()> {
        let phase_name = phase.name();
        let _span = tracing::debug_span!("phase", name = phase_name).entered();

        for plugin in &self.plugins {
            tracing::trace!(plugin = plugin.name(), "before hook");
            plugin.on_before_phase(phase_name, ctx)?;
        }

        tracing::debug!("phase started");
        if let Err(err) = phase.run(ctx) {
            tracing::debug!(error = %err, "phase failed");
            return Err(err);
        }
        tracing::debug!(diagnostics = ctx.diagnostics.len(), "phase finished");

        for plugin in &self.plugins {
            tracing::trace!(plugin = plugin.name(), "after hook");
            plugin.on_after_phase(phase_name, ctx)?;
        }

        Ok(())
    }

    /// Every phase this pipeline runs, in order.
    pub fn phase_info(&self) -> Vec<PhaseInfo> {
        Self::builtin_phases()
            .iter()
            .chain(self.phases.iter())
            .map(|p| p.info())
            .collect()
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}
