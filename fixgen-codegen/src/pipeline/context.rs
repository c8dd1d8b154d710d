//! Compilation context passed through pipeline phases.

use eyre::{Result, eyre};
use fixgen_graph::{Graph, NodeId};

use super::diagnostic::{Diagnostic, Severity};
use crate::{
    CodegenOptions,
    analysis::{Complexity, HoistPlan, Partition, Traversal},
    program::Program,
};

/// Context passed through all pipeline phases.
///
/// This struct carries the state of compilation through each phase,
/// accumulating results and diagnostics along the way. The graph is
/// borrowed; nothing in the context points back into it except node ids.
#[derive(Debug)]
pub struct CompilationContext<'g> {
    /// The graph being compiled.
    pub graph: &'g Graph,
    /// Node returned by the default unit.
    pub root: NodeId,
    pub options: CodegenOptions,
    /// Walk results (populated by WalkPhase).
    pub traversal: Option<Traversal>,
    /// Inlined expression sizes (populated by ScorePhase).
    pub complexity: Option<Complexity>,
    /// Variable decisions (populated by HoistPhase, extended by PartitionPhase).
    pub hoisting: Option<HoistPlan>,
    /// Unit assignment (populated by PartitionPhase).
    pub partition: Option<Partition>,
    /// Lowered program (populated by EmitPhase).
    pub program: Option<Program>,
    /// Rendered module source (populated by EmitPhase).
    pub output: Option<String>,
    /// Diagnostics collected during compilation.
    pub diagnostics: Vec<Diagnostic>,
}

impl<'g> CompilationContext<'g> {
    pub fn new(graph: &'g Graph, root: NodeId, options: CodegenOptions) -> Self {
        Self {
            graph,
            root,
            options,
            traversal: None,
            complexity: None,
            hoisting: None,
            partition: None,
            program: None,
            output: None,
            diagnostics: Vec::new(),
        }
    }

    /// Check if any error diagnostics have been recorded.
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(|d| d.severity.is_error())
    }

    /// Check if any warning diagnostics have been recorded.
    pub fn has_warnings(&self) -> bool {
        self.diagnostics.iter().any(|d| d.severity.is_warning())
    }

    /// Count the number of error diagnostics.
    pub fn error_count(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity.is_error())
            .count()
    }

    /// Count the number of warning diagnostics.
    pub fn warning_count(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity.is_warning())
            .count()
    }

    pub fn add_error(&mut self, phase: &str, message: impl Into<String>) {
        self.diagnostics.push(Diagnostic::error(phase, message));
    }

    pub fn add_warning(&mut self, phase: &str, message: impl Into<String>) {
        self.diagnostics.push(Diagnostic::warning(phase, message));
    }

    pub fn add_info(&mut self, phase: &str, message: impl Into<String>) {
        self.diagnostics.push(Diagnostic::info(phase, message));
    }

    /// Get all error diagnostics.
    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| matches!(d.severity, Severity::Error))
    }

    /// Get all warning diagnostics.
    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| matches!(d.severity, Severity::Warning))
    }

    pub fn traversal(&self) -> Result<&Traversal> {
        self.traversal
            .as_ref()
            .ok_or_else(|| eyre!("traversal not set - did WalkPhase run?"))
    }

    pub fn complexity(&self) -> Result<&Complexity> {
        self.complexity
            .as_ref()
            .ok_or_else(|| eyre!("complexity not set - did ScorePhase run?"))
    }

    pub fn hoisting(&self) -> Result<&HoistPlan> {
        self.hoisting
            .as_ref()
            .ok_or_else(|| eyre!("hoist plan not set - did HoistPhase run?"))
    }

    pub fn partition(&self) -> Result<&Partition> {
        self.partition
            .as_ref()
            .ok_or_else(|| eyre!("partition not set - did PartitionPhase run?"))
    }

    pub fn program(&self) -> Result<&Program> {
        self.program
            .as_ref()
            .ok_or_else(|| eyre!("program not set - did EmitPhase run?"))
    }

    /// Take the rendered source out of the context.
    pub fn take_output(&mut self) -> Result<String> {
        self.output
            .take()
            .ok_or_else(|| eyre!("output not set - did EmitPhase run?"))
    }
}
