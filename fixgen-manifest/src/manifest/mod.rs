//! Manifest types and parsing for fixture.toml files.

mod file;
mod parse;

pub use file::FixtureToml;
use indexmap::IndexMap;
pub use parse::parse_manifest;
use serde::Deserialize;
use toml::Spanned;

/// Root manifest for fixture.toml
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    pub fixture: FixtureSection,

    /// Node tables keyed by their manifest name, in file order.
    #[serde(default)]
    pub nodes: IndexMap<String, NodeSpec>,
}

/// The `[fixture]` table.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FixtureSection {
    /// Name of the top-level fixture function.
    pub name: Option<String>,

    /// Key of the node the fixture returns.
    pub root: Spanned<String>,

    pub max_expression_complexity: Option<u32>,

    pub indent: Option<usize>,

    /// Function name to node key.
    #[serde(default)]
    pub sub_fixtures: IndexMap<String, Spanned<String>>,
}

/// One `[nodes.<key>]` table.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NodeSpec {
    /// `config`, `partial` or `arg_factory`; defaults to `config`.
    pub kind: Option<Spanned<String>>,

    /// Dotted path of the callable, e.g. `models.layers.Dense`.
    pub target: Spanned<String>,

    #[serde(default)]
    pub args: IndexMap<String, Spanned<toml::Value>>,

    /// Field name to tag symbols. A tagged field without an arg is kept
    /// as a tag-only field.
    #[serde(default)]
    pub tags: IndexMap<String, Vec<String>>,
}
