//! Pipeline snapshot plugin for visualization and debugging.
//!
//! Captures the compilation state after each phase so the intermediate
//! analyses can be inspected with `fixgen bake --visualize`.

use std::{
    fs,
    path::{Path, PathBuf},
    sync::{PoisonError, RwLock},
};

use eyre::Result;
use serde::Serialize;

use super::{CompilationContext, Diagnostic, Plugin};
use crate::{
    analysis::{Complexity, HoistPlan, Partition, Traversal},
    program::Program,
};

/// The pipeline state right after one phase.
#[derive(Debug, Clone, Serialize)]
pub struct PhaseSnapshot {
    pub phase: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub traversal: Option<Traversal>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub complexity: Option<Complexity>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub hoisting: Option<HoistPlan>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub partition: Option<Partition>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub program: Option<Program>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,

    pub diagnostics: Vec<Diagnostic>,
}

impl PhaseSnapshot {
    fn capture(phase: &str, ctx: &CompilationContext<'_>) -> Self {
        Self {
            phase: phase.to_string(),
            traversal: ctx.traversal.clone(),
            complexity: ctx.complexity.clone(),
            hoisting: ctx.hoisting.clone(),
            partition: ctx.partition.clone(),
            program: ctx.program.clone(),
            output: ctx.output.clone(),
            diagnostics: ctx.diagnostics.clone(),
        }
    }

    fn write(&self, dir: &Path, index: usize) -> Result<PathBuf> {
        fs::create_dir_all(dir)?;
        let path = dir.join(format!("{:02}-{}.json", index, self.phase));
        let json = serde_json::to_string_pretty(self)?;
        fs::write(&path, json)?;
        Ok(path)
    }
}

/// A plugin that captures pipeline state after each phase.
///
/// With an output directory, every snapshot is written as soon as its phase
/// finishes, so the files survive a failure in a later phase.
pub struct SnapshotPlugin {
    snapshots: RwLock<Vec<PhaseSnapshot>>,
    output_dir: Option<PathBuf>,
}

impl SnapshotPlugin {
    pub fn new() -> Self {
        Self {
            snapshots: RwLock::new(Vec::new()),
            output_dir: None,
        }
    }

    /// Create a snapshot plugin that writes `NN-<phase>.json` files to `output_dir`.
    pub fn with_output_dir(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            snapshots: RwLock::new(Vec::new()),
            output_dir: Some(output_dir.into()),
        }
    }

    pub fn snapshots(&self) -> Vec<PhaseSnapshot> {
        self.snapshots
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Write all collected snapshots to `dir`.
    pub fn write_to_dir(&self, dir: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
        let snapshots = self.snapshots.read().unwrap_or_else(PoisonError::into_inner);
        snapshots
            .iter()
            .enumerate()
            .map(|(i, snapshot)| snapshot.write(dir.as_ref(), i))
            .collect()
    }
}

impl Default for SnapshotPlugin {
    fn default() -> Self {
        Self::new()
    }
}

impl Plugin for SnapshotPlugin {
    fn name(&self) -> &'static str {
        "snapshot"
    }

    fn on_after_phase(&self, phase: &str, ctx: &mut CompilationContext<'_>) -> Result<()> {
        let snapshot = PhaseSnapshot::capture(phase, ctx);
        let mut snapshots = self.snapshots.write().unwrap_or_else(PoisonError::into_inner);

        if let Some(dir) = &self.output_dir {
            let path = snapshot.write(dir, snapshots.len())?;
            tracing::debug!(path = %path.display(), "wrote phase snapshot");
        }
        snapshots.push(snapshot);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CodegenOptions, pipeline::Pipeline, testing::fixtures};

    #[test]
    fn test_snapshot_plugin_creation() {
        let plugin = SnapshotPlugin::new();
        assert!(plugin.snapshots().is_empty());
    }

    #[test]
    fn test_snapshots_written_per_phase() {
        let dir = tempfile::tempdir().unwrap();
        let (graph, root) = fixtures::diamond();

        Pipeline::new()
            .plugin(SnapshotPlugin::with_output_dir(dir.path()))
            .run(&graph, root, CodegenOptions::default())
            .unwrap();

        let walk = fs::read_to_string(dir.path().join("01-walk.json")).unwrap();
        assert!(walk.contains("\"traversal\""));
        assert!(!walk.contains("\"program\""));
        let emit = fs::read_to_string(dir.path().join("05-emit.json")).unwrap();
        assert!(emit.contains("\"output\""));
    }

    #[test]
    fn test_snapshots_kept_in_memory() {
        let (graph, root) = fixtures::linear_chain(2);
        let plugin = std::sync::Arc::new(SnapshotPlugin::new());

        struct Shared(std::sync::Arc<SnapshotPlugin>);
        impl Plugin for Shared {
            fn name(&self) -> &'static str {
                "shared-snapshot"
            }
            fn on_after_phase(&self, phase: &str, ctx: &mut CompilationContext<'_>) -> Result<()> {
                self.0.on_after_phase(phase, ctx)
            }
        }

        Pipeline::new()
            .plugin(Shared(plugin.clone()))
            .run(&graph, root, CodegenOptions::default())
            .unwrap();

        let phases: Vec<String> = plugin.snapshots().into_iter().map(|s| s.phase).collect();
        assert_eq!(phases, vec!["validate", "walk", "score", "hoist", "partition", "emit"]);
    }
}
