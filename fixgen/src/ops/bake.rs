//! Bake operation - fixture compilation.

use std::path::{Path, PathBuf};

use eyre::{Context, Result};
use fixgen_codegen::{
    pipeline::{Pipeline, SnapshotPlugin},
    program::Program,
};
use fixgen_manifest::Fixture;

use super::describe;
use crate::reports::{BakeReport, GenerationResult, UnitSummary, WrittenResult};

/// Options for the bake operation.
pub struct BakeOptions<'a> {
    /// Output file; `None` prints the module.
    pub output: Option<&'a Path>,
    /// Whether to preview without writing files.
    pub dry_run: bool,
    /// Whether to output debug snapshots.
    pub visualize: bool,
    /// Overrides `max_expression_complexity` from the manifest.
    pub max_complexity: Option<u32>,
    /// Overrides the top-level fixture name from the manifest.
    pub name: Option<&'a str>,
}

impl BakeOptions<'_> {
    /// Directory snapshots go to: next to the output file, or the current directory.
    fn debug_dir(&self) -> PathBuf {
        let base = self
            .output
            .and_then(Path::parent)
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        base.join(".fixgen/debug")
    }
}

/// Execute the bake operation.
///
/// Compiles the fixture and writes the module unless this is a dry run.
pub fn bake(fixture: &Fixture, opts: BakeOptions) -> Result<BakeReport> {
    let mut options = fixture.options.clone();
    if let Some(max) = opts.max_complexity {
        options.max_expression_complexity = Some(max);
    }
    if let Some(name) = opts.name {
        options.top_level_fixture_name = name.to_string();
    }

    let debug_dir = opts.debug_dir();
    let mut pipeline = Pipeline::new();
    if opts.visualize {
        pipeline = pipeline.plugin(SnapshotPlugin::with_output_dir(&debug_dir));
    }
    let mut ctx = pipeline
        .run(&fixture.graph, fixture.root, options)
        .wrap_err("Compilation failed")?;

    let warnings: Vec<String> = ctx.warnings().map(|d| describe(d, fixture)).collect();
    let program = ctx.program()?;
    let units = unit_summaries(program);
    let variable_count = program.variable_count();
    let fixture_name = program.default_unit().name.clone();
    let source = ctx.take_output()?;

    let result = match opts.output {
        Some(path) if !opts.dry_run => {
            std::fs::write(path, &source)
                .wrap_err_with(|| format!("Failed to write {}", path.display()))?;
            tracing::debug!(path = %path.display(), bytes = source.len(), "wrote fixture module");
            GenerationResult::Written(WrittenResult {
                path: path.to_path_buf(),
                debug_dir: opts.visualize.then_some(debug_dir),
            })
        }
        _ => GenerationResult::Preview(source),
    };

    Ok(BakeReport {
        fixture_name,
        warnings,
        units,
        variable_count,
        result,
    })
}

/// Units in definition order, callees first.
pub(crate) fn unit_summaries(program: &Program) -> Vec<UnitSummary> {
    program
        .emitted_units()
        .map(|unit| UnitSummary {
            name: unit.name.clone(),
            params: unit.params.iter().map(|p| p.name.clone()).collect(),
            variables: unit.decls.len(),
            expressions: unit.exprs.len(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const ENCODER: &str = r#"
        [fixture]
        root = "model"

        [fixture.sub_fixtures]
        encoder_fixture = "encoder"

        [nodes.model]
        target = "models.EncoderDecoder"
        args = { encoder = { ref = "encoder" }, embed = { ref = "embed" } }

        [nodes.encoder]
        target = "models.Encoder"
        args = { embed = { ref = "embed" }, layers = 2 }

        [nodes.embed]
        target = "models.Embed"
        args = { features = 8 }
    "#;

    fn fixture() -> Fixture {
        fixgen_manifest::parse_fixture(ENCODER, "fixture.toml").unwrap()
    }

    fn options(output: Option<&Path>) -> BakeOptions<'_> {
        BakeOptions {
            output,
            dry_run: false,
            visualize: false,
            max_complexity: None,
            name: None,
        }
    }

    #[test]
    fn test_bake_writes_module() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fixtures.py");

        let report = bake(&fixture(), options(Some(&path))).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("def encoder_fixture(embed):"));
        assert!(written.contains("def config_fixture():"));
        assert!(matches!(report.result, GenerationResult::Written(_)));
        let names: Vec<&str> = report.units.iter().map(|u| u.name.as_str()).collect();
        assert_eq!(names, vec!["encoder_fixture", "config_fixture"]);
        assert_eq!(report.units[0].params, vec!["embed".to_string()]);
    }

    #[test]
    fn test_bake_without_output_previews() {
        let report = bake(&fixture(), options(None)).unwrap();
        match report.result {
            GenerationResult::Preview(source) => {
                assert!(source.starts_with("from fiddle.experimental import auto_config\n"))
            }
            other => panic!("expected preview, got {other:?}"),
        }
    }

    #[test]
    fn test_dry_run_leaves_output_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fixtures.py");
        let mut opts = options(Some(&path));
        opts.dry_run = true;

        bake(&fixture(), opts).unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn test_flags_override_manifest() {
        let mut opts = options(None);
        opts.name = Some("small_model");
        opts.max_complexity = Some(1);

        let report = bake(&fixture(), opts).unwrap();
        assert_eq!(report.fixture_name, "small_model");
        let GenerationResult::Preview(source) = report.result else {
            panic!("expected preview");
        };
        assert!(source.contains("def small_model():"));
    }

    #[test]
    fn test_visualize_writes_snapshots_next_to_output() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fixtures.py");
        let mut opts = options(Some(&path));
        opts.visualize = true;

        let report = bake(&fixture(), opts).unwrap();
        let GenerationResult::Written(written) = report.result else {
            panic!("expected written result");
        };
        let debug_dir = dir.path().join(".fixgen/debug");
        assert_eq!(written.debug_dir.as_deref(), Some(debug_dir.as_path()));
        assert!(debug_dir.join("00-validate.json").exists());
        assert!(debug_dir.join("05-emit.json").exists());
    }

    #[test]
    fn test_bake_rejects_invalid_fixture() {
        let mut opts = options(None);
        opts.max_complexity = Some(0);
        assert!(bake(&fixture(), opts).is_err());
    }
}
