use std::path::PathBuf;

use clap::Args;
use eyre::Result;
use fixgen_manifest::FixtureToml;

use super::UnwrapOrExit;
use crate::{
    ops::{self, BakeOptions},
    reports::{Report, TerminalOutput},
};

#[derive(Args)]
pub struct BakeCommand {
    /// Path to fixture.toml (defaults to ./fixture.toml)
    #[arg(short, long, default_value = "fixture.toml")]
    pub config: PathBuf,

    /// Output file (prints to stdout when omitted)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Print the generated module instead of writing it
    #[arg(long)]
    pub dry_run: bool,

    /// Largest expression size before subexpressions are hoisted
    /// (overrides fixture.toml)
    #[arg(long, value_name = "N")]
    pub max_complexity: Option<u32>,

    /// Name of the top-level fixture function (overrides fixture.toml)
    #[arg(long)]
    pub name: Option<String>,

    /// Write a JSON snapshot after every compiler phase to .fixgen/debug/
    #[arg(long)]
    pub visualize: bool,
}

impl BakeCommand {
    /// Run the bake command
    pub fn run(&self) -> Result<()> {
        let fixture_toml = FixtureToml::open(&self.config).unwrap_or_exit();

        let report = ops::bake(
            fixture_toml.fixture(),
            BakeOptions {
                output: self.output.as_deref(),
                dry_run: self.dry_run,
                visualize: self.visualize,
                max_complexity: self.max_complexity,
                name: self.name.as_deref(),
            },
        )?;

        report.render(&mut TerminalOutput::new());
        Ok(())
    }
}
