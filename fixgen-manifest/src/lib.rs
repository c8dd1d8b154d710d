// Miette's derive macro generates code that triggers these warnings
#![allow(unused_assignments)]

//! fixture.toml parsing for the fixgen fixture compiler.
//!
//! A manifest lists the nodes of a graph as `[nodes.<key>]` tables plus a
//! `[fixture]` table with the compiler options. [`parse_fixture`] turns it
//! into a [`Fixture`] whose graph and options go straight to
//! [`fixgen_codegen::compile`].

mod build;
mod error;
mod manifest;
mod value;

use std::path::Path;

pub use build::{Fixture, build_fixture};
pub use error::{Error, Result, SourceContext};
pub use manifest::{FixtureSection, FixtureToml, Manifest, NodeSpec, parse_manifest};
pub use value::SPECIAL_KEYS;

/// Parse and build a fixture.toml file from the given path
pub fn parse_file(path: impl AsRef<Path>) -> Result<Fixture> {
    Ok(FixtureToml::open(path)?.into_fixture())
}

/// Parse and build a fixture from a string with a filename for error reporting
pub fn parse_fixture(content: &str, filename: &str) -> Result<Fixture> {
    let manifest = parse_manifest(content, filename)?;
    build_fixture(&manifest, &SourceContext::new(content, filename))
}
