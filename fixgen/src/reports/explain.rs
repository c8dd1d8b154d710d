//! Explain command report data structures.

use std::path::PathBuf;

use super::{
    UnitSummary,
    output::{Output, Report},
};

/// Report data from pipeline explanation.
#[derive(Debug)]
pub struct ExplainReport {
    /// Path to the manifest file.
    pub config_path: PathBuf,
    pub fixture: FixtureInfo,
    /// Pipeline phases.
    pub phases: Vec<PhaseInfo>,
    /// Validation lints.
    pub lints: Vec<LintInfo>,
    /// Analysis results from running the pipeline.
    pub analysis: AnalysisResult,
}

/// Information taken from the `[fixture]` table.
#[derive(Debug)]
pub struct FixtureInfo {
    pub name: String,
    /// Manifest key of the root node.
    pub root: String,
    pub node_count: usize,
    pub max_expression_complexity: Option<u32>,
}

/// Information about a pipeline phase.
#[derive(Debug)]
pub struct PhaseInfo {
    /// Phase name.
    pub name: String,
    /// Phase description.
    pub description: String,
}

/// Information about a validation lint.
#[derive(Debug)]
pub struct LintInfo {
    /// Lint name.
    pub name: String,
    /// Lint description.
    pub description: String,
}

/// Analysis results from running the pipeline.
#[derive(Debug)]
pub struct AnalysisResult {
    pub reachable_count: usize,
    /// Largest subtree score in the graph.
    pub max_score: u32,
    pub shared_hoists: usize,
    pub complex_hoists: usize,
    pub cross_unit_hoists: usize,
    pub variable_count: usize,
    pub units: Vec<UnitSummary>,
}

impl Report for ExplainReport {
    fn render(&self, out: &mut dyn Output) {
        out.title("Fixgen Pipeline Explanation");
        out.newline();

        out.key_value("Input", &self.config_path.display().to_string());
        out.key_value_indented("Fixture", &self.fixture.name);
        out.key_value_indented("Root", &self.fixture.root);
        out.key_value_indented("Nodes", &self.fixture.node_count.to_string());
        out.key_value_indented(
            "Complexity budget",
            &self
                .fixture
                .max_expression_complexity
                .map_or_else(|| "none".to_string(), |max| max.to_string()),
        );
        out.newline();

        out.section("Pipeline Phases");
        for (i, phase) in self.phases.iter().enumerate() {
            out.numbered_item(i + 1, &format!("{} - {}", phase.name, phase.description));
        }
        out.newline();

        out.section("Validation Lints");
        for lint in &self.lints {
            out.list_item(&format!("{}: {}", lint.name, lint.description));
        }
        out.newline();

        let analysis = &self.analysis;
        out.section("Analysis Results");
        out.key_value_indented(
            "Reachable nodes",
            &format!("{} of {}", analysis.reachable_count, self.fixture.node_count),
        );
        out.key_value_indented("Largest score", &analysis.max_score.to_string());
        out.key_value_indented(
            "Hoisted",
            &format!(
                "{} shared, {} complex, {} cross-unit",
                analysis.shared_hoists, analysis.complex_hoists, analysis.cross_unit_hoists
            ),
        );
        out.key_value_indented("Variables", &analysis.variable_count.to_string());
        out.newline();

        out.section("Units");
        for unit in &analysis.units {
            out.list_item(&format!(
                "{} - {} variables, {} expressions",
                unit.signature(),
                unit.variables,
                unit.expressions
            ));
        }
    }
}
