//! Report data structures for commands.
//!
//! This module provides data structures that separate data collection from rendering.
//! Commands build reports, then render them to an Output target.

mod bake;
mod check;
mod explain;
mod output;

pub use bake::{BakeReport, GenerationResult, UnitSummary, WrittenResult};
pub use check::CheckReport;
pub use explain::{AnalysisResult, ExplainReport, FixtureInfo, LintInfo, PhaseInfo};
#[cfg(test)]
pub use output::BufferOutput;
pub use output::{Output, Report, TerminalOutput};
