//! Pipeline phase trait.

use eyre::Result;
use serde::Serialize;

use super::CompilationContext;

/// Name and description of a phase, for `fixgen explain`.
#[derive(Debug, Clone, Serialize)]
pub struct PhaseInfo {
    pub name: &'static str,
    pub description: &'static str,
}

/// A phase in the compilation pipeline.
///
/// Phases run in order and each one fills in one slot of the
/// [`CompilationContext`]:
///
/// - `ValidatePhase` - runs lints, aborts on errors
/// - `WalkPhase` - post-order walk, parent counts and unit regions
/// - `ScorePhase` - inlined expression sizes
/// - `HoistPhase` - sharing and complexity driven variables
/// - `PartitionPhase` - assigns nodes to units and threads parameters
/// - `EmitPhase` - lowers to a program and renders Python source
///
/// A phase that fails aborts the pipeline; later phases never see a
/// partially built context.
pub trait Phase: Send + Sync {
    /// The name of this phase (used in diagnostics and plugin hooks).
    fn name(&self) -> &'static str;

    /// A human-readable description of what this phase does.
    fn description(&self) -> &'static str;

    /// Run this phase on the compilation context.
    ///
    /// # Errors
    ///
    /// Returns an error if the phase fails fatally. Non-fatal issues should
    /// be recorded as diagnostics instead.
    fn run(&self, ctx: &mut CompilationContext<'_>) -> Result<()>;

    fn info(&self) -> PhaseInfo {
        PhaseInfo {
            name: self.name(),
            description: self.description(),
        }
    }
}
