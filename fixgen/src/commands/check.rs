use std::path::PathBuf;

use clap::Args;
use eyre::Result;
use fixgen_manifest::FixtureToml;

use super::UnwrapOrExit;
use crate::{
    ops,
    reports::{Report, TerminalOutput},
};

#[derive(Args)]
pub struct CheckCommand {
    /// Path to fixture.toml (defaults to ./fixture.toml)
    #[arg(short, long, default_value = "fixture.toml")]
    pub config: PathBuf,
}

impl CheckCommand {
    /// Run the check command
    pub fn run(&self) -> Result<()> {
        let fixture_toml = FixtureToml::open(&self.config).unwrap_or_exit();

        let report = ops::check(fixture_toml.fixture(), &self.config);
        report.render(&mut TerminalOutput::new());

        if !report.is_valid() {
            std::process::exit(1);
        }
        Ok(())
    }
}
