//! Check command report data structures.

use std::path::PathBuf;

use super::output::{Output, Report};

/// Report data from fixture validation.
#[derive(Debug)]
pub struct CheckReport {
    /// Path to the config file.
    pub config_path: PathBuf,
    pub node_count: usize,
    pub sub_fixture_count: usize,
    /// Error messages.
    pub errors: Vec<String>,
    /// Warning messages.
    pub warnings: Vec<String>,
    /// Info messages.
    pub infos: Vec<String>,
}

impl CheckReport {
    /// Whether the check passed (no errors).
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

impl Report for CheckReport {
    fn render(&self, out: &mut dyn Output) {
        for error in &self.errors {
            out.error(error);
        }

        for warning in &self.warnings {
            out.warning(warning);
        }

        for info in &self.infos {
            out.preformatted(&format!("info: {}", info));
        }

        if !self.warnings.is_empty() || !self.errors.is_empty() {
            out.newline();
        }

        if self.is_valid() {
            out.preformatted(&format!("✓ {} is valid", self.config_path.display()));
            out.key_value_indented("Nodes", &self.node_count.to_string());
            out.key_value_indented("Sub-fixtures", &self.sub_fixture_count.to_string());
        } else {
            out.note(&format!(
                "{} error{} in {}",
                self.errors.len(),
                if self.errors.len() == 1 { "" } else { "s" },
                self.config_path.display()
            ));
        }
    }
}
