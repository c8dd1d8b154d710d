//! Bake command report data structures.

use std::path::PathBuf;

use super::output::{Output, Report};

/// Report data from compilation.
#[derive(Debug)]
pub struct BakeReport {
    /// Name of the top-level fixture function.
    pub fixture_name: String,

    /// Warning messages from the pipeline.
    pub warnings: Vec<String>,

    /// Emitted functions in definition order.
    pub units: Vec<UnitSummary>,

    /// Hoisted variables across all units.
    pub variable_count: usize,

    pub result: GenerationResult,
}

/// One emitted function.
#[derive(Debug)]
pub struct UnitSummary {
    pub name: String,
    pub params: Vec<String>,
    pub variables: usize,
    pub expressions: usize,
}

impl UnitSummary {
    /// `name(a, b)`
    pub fn signature(&self) -> String {
        format!("{}({})", self.name, self.params.join(", "))
    }
}

/// Result of compilation.
#[derive(Debug)]
pub enum GenerationResult {
    /// The module was written to disk.
    Written(WrittenResult),
    /// The module source, for stdout.
    Preview(String),
}

/// Result when the module was written to disk.
#[derive(Debug)]
pub struct WrittenResult {
    pub path: PathBuf,
    /// Path to debug snapshots, if visualization was enabled.
    pub debug_dir: Option<PathBuf>,
}

impl Report for BakeReport {
    fn render(&self, out: &mut dyn Output) {
        for warning in &self.warnings {
            out.warning(warning);
        }

        match &self.result {
            GenerationResult::Written(written) => self.render_written(out, written),
            GenerationResult::Preview(source) => {
                // The source already ends with a newline.
                out.preformatted(source.trim_end_matches('\n'));
                out.note(&self.summary());
            }
        }
    }
}

impl BakeReport {
    fn summary(&self) -> String {
        format!(
            "{} unit{}, {} variable{}",
            self.units.len(),
            plural(self.units.len()),
            self.variable_count,
            plural(self.variable_count)
        )
    }

    fn render_written(&self, out: &mut dyn Output, written: &WrittenResult) {
        if let Some(debug_dir) = &written.debug_dir {
            out.key_value(
                "Pipeline snapshots written to",
                &debug_dir.display().to_string(),
            );
            out.newline();
        }

        out.section(&format!("Fixtures ({})", self.units.len()));
        for unit in &self.units {
            out.list_item(&format!(
                "{} - {} variable{}",
                unit.signature(),
                unit.variables,
                plural(unit.variables)
            ));
        }
        out.newline();

        out.key_value("Generated", &written.path.display().to_string());
        out.key_value_indented("Top level", &self.fixture_name);
        out.key_value_indented("Summary", &self.summary());
    }
}

fn plural(n: usize) -> &'static str {
    if n == 1 { "" } else { "s" }
}
