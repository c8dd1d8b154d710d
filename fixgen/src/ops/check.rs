//! Check operation - fixture validation.

use std::path::Path;

use fixgen_codegen::pipeline::{Severity, phases::ValidatePhase};
use fixgen_manifest::Fixture;

use super::describe;
use crate::reports::CheckReport;

/// Execute the check operation.
///
/// Runs every validation lint and returns all diagnostics, without
/// compiling.
pub fn check(fixture: &Fixture, config_path: &Path) -> CheckReport {
    let diagnostics =
        ValidatePhase::new().diagnostics(&fixture.graph, fixture.root, &fixture.options);

    let mut errors = Vec::new();
    let mut warnings = Vec::new();
    let mut infos = Vec::new();

    for diag in &diagnostics {
        let msg = describe(diag, fixture);
        match diag.severity {
            Severity::Error => errors.push(msg),
            Severity::Warning => warnings.push(msg),
            Severity::Info => infos.push(msg),
        }
    }

    CheckReport {
        config_path: config_path.to_path_buf(),
        node_count: fixture.graph.len(),
        sub_fixture_count: fixture.options.sub_fixtures.len(),
        errors,
        warnings,
        infos,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_collects_all_errors() {
        let fixture = fixgen_manifest::parse_fixture(
            r#"
            [fixture]
            root = "dense"
            max_expression_complexity = 0

            [nodes.dense]
            target = "models.layers.Dense"

            [nodes.dense.tags]
            dtype = ["models.tags.ActivationDType"]
            "#,
            "fixture.toml",
        )
        .unwrap();

        let report = check(&fixture, Path::new("fixture.toml"));
        assert!(!report.is_valid());
        assert_eq!(report.errors.len(), 2);
        assert!(report.errors.iter().any(|e| e.contains("nodes.dense.dtype")));
    }

    #[test]
    fn test_check_rejects_zero_indent() {
        let fixture = fixgen_manifest::parse_fixture(
            r#"
            [fixture]
            root = "dense"
            indent = 0

            [nodes.dense]
            target = "models.layers.Dense"
            "#,
            "fixture.toml",
        )
        .unwrap();

        let report = check(&fixture, Path::new("fixture.toml"));
        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].contains("indent is 0"));
        assert!(report.errors[0].ends_with("--> indent"));
    }

    #[test]
    fn test_check_valid_fixture() {
        let fixture = fixgen_manifest::parse_fixture(
            r#"
            [fixture]
            root = "dense"

            [nodes.dense]
            target = "models.layers.Dense"
            args = { features = 16 }
            "#,
            "fixture.toml",
        )
        .unwrap();

        let report = check(&fixture, Path::new("fixture.toml"));
        assert!(report.is_valid());
        assert_eq!(report.node_count, 1);
    }
}
