//! Core operations.
//!
//! This module contains the business logic for fixgen commands,
//! separated from CLI argument parsing and output rendering.

pub mod bake;
pub mod check;
pub mod explain;

pub use bake::{BakeOptions, bake};
pub use check::check;
use fixgen_codegen::pipeline::Diagnostic;
use fixgen_graph::NodeId;
use fixgen_manifest::Fixture;
pub use explain::explain;

/// Render a diagnostic with node ids replaced by their manifest keys.
pub(crate) fn describe(diag: &Diagnostic, fixture: &Fixture) -> String {
    match &diag.location {
        Some(loc) => format!("{}\n  --> {}", diag.message, node_location(loc, fixture)),
        None => diag.message.clone(),
    }
}

/// `#3.dtype` becomes `nodes.dense.dtype`; other locations pass through.
fn node_location(loc: &str, fixture: &Fixture) -> String {
    let Some(rest) = loc.strip_prefix('#') else {
        return loc.to_string();
    };
    let digits = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
    let key = rest[..digits]
        .parse()
        .ok()
        .and_then(|id| fixture.key_of(NodeId(id)));
    match key {
        Some(key) => format!("nodes.{}{}", key, &rest[digits..]),
        None => loc.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> Fixture {
        fixgen_manifest::parse_fixture(
            r#"
            [fixture]
            root = "dense"

            [nodes.dense]
            target = "models.layers.Dense"
            "#,
            "fixture.toml",
        )
        .unwrap()
    }

    #[test]
    fn test_node_location_uses_manifest_key() {
        let fixture = fixture();
        assert_eq!(node_location("#0.dtype", &fixture), "nodes.dense.dtype");
        assert_eq!(node_location("#0", &fixture), "nodes.dense");
    }

    #[test]
    fn test_node_location_passes_through() {
        let fixture = fixture();
        assert_eq!(node_location("#7.dtype", &fixture), "#7.dtype");
        assert_eq!(
            node_location("sub_fixtures.encoder", &fixture),
            "sub_fixtures.encoder"
        );
    }
}
