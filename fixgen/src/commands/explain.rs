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
pub struct ExplainCommand {
    /// Path to fixture.toml (defaults to ./fixture.toml)
    #[arg(short, long, default_value = "fixture.toml")]
    pub config: PathBuf,
}

impl ExplainCommand {
    pub fn run(&self) -> Result<()> {
        let fixture_toml = FixtureToml::open(&self.config).unwrap_or_exit();

        let report = ops::explain(fixture_toml.fixture(), &self.config)?;
        report.render(&mut TerminalOutput::new());
        Ok(())
    }
}
