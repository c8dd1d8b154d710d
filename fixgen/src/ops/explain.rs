//! Explain operation - pipeline explanation.

use std::path::Path;

use eyre::{Context, Result};
use fixgen_codegen::{
    analysis::HoistReason,
    pipeline::{Pipeline, phases::ValidatePhase},
};
use fixgen_manifest::Fixture;

use super::bake::unit_summaries;
use crate::reports::{AnalysisResult, ExplainReport, FixtureInfo, LintInfo, PhaseInfo};

/// Execute the explain operation.
///
/// Runs the pipeline and returns information about what it does.
pub fn explain(fixture: &Fixture, config_path: &Path) -> Result<ExplainReport> {
    let pipeline = Pipeline::new();
    let validate_phase = ValidatePhase::new();

    let phases: Vec<PhaseInfo> = pipeline
        .phase_info()
        .into_iter()
        .map(|p| PhaseInfo {
            name: p.name.to_string(),
            description: p.description.to_string(),
        })
        .collect();

    let lints: Vec<LintInfo> = validate_phase
        .lint_info()
        .into_iter()
        .map(|l| LintInfo {
            name: l.name.to_string(),
            description: l.description.to_string(),
        })
        .collect();

    let ctx = pipeline
        .run(&fixture.graph, fixture.root, fixture.options.clone())
        .wrap_err("Compilation failed")?;
    let traversal = ctx.traversal()?;
    let complexity = ctx.complexity()?;
    let hoisting = ctx.hoisting()?;
    let program = ctx.program()?;

    let root_key = fixture.key_of(fixture.root).unwrap_or_default().to_string();

    Ok(ExplainReport {
        config_path: config_path.to_path_buf(),
        fixture: FixtureInfo {
            name: fixture.options.top_level_fixture_name.clone(),
            root: root_key,
            node_count: fixture.graph.len(),
            max_expression_complexity: fixture.options.max_expression_complexity,
        },
        phases,
        lints,
        analysis: AnalysisResult {
            reachable_count: traversal.order.len(),
            max_score: complexity.max(),
            shared_hoists: hoisting.count(HoistReason::Shared),
            complex_hoists: hoisting.count(HoistReason::Complex),
            cross_unit_hoists: hoisting.count(HoistReason::CrossUnit),
            variable_count: program.variable_count(),
            units: unit_summaries(program),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explain_reports_hoists_and_units() {
        let fixture = fixgen_manifest::parse_fixture(
            r#"
            [fixture]
            root = "model"

            [nodes.model]
            target = "models.Root"
            args = { a = { ref = "leaf" }, b = { ref = "leaf" }, scale = 1 }

            [nodes.leaf]
            target = "models.Leaf"
            args = { x = 1 }

            [nodes.orphan]
            target = "models.Unused"
            "#,
            "fixture.toml",
        )
        .unwrap();

        let report = explain(&fixture, Path::new("fixture.toml")).unwrap();
        assert_eq!(report.fixture.root, "model");
        assert_eq!(report.fixture.node_count, 3);
        assert_eq!(report.analysis.reachable_count, 2);
        assert_eq!(report.analysis.shared_hoists, 1);
        assert_eq!(report.analysis.variable_count, 1);
        assert_eq!(report.analysis.units.len(), 1);
        assert_eq!(report.phases.first().map(|p| p.name.as_str()), Some("validate"));
        assert!(report.lints.iter().any(|l| l.name == "tag-without-value"));
    }
}
