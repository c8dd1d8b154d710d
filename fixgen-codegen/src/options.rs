//! Compiler configuration.

use fixgen_graph::NodeId;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Smallest accepted `max_expression_complexity`.
pub const MIN_EXPRESSION_COMPLEXITY: u32 = 1;

/// Name of the default unit when none is configured.
pub const DEFAULT_FIXTURE_NAME: &str = "config_fixture";

/// Spaces per indentation level in generated code.
pub const DEFAULT_INDENT: usize = 4;

/// Smallest accepted `indent`.
pub const MIN_INDENT: usize = 1;

/// Options controlling the shape of the generated fixture.
///
/// # Example
///
/// ```
/// use fixgen_codegen::CodegenOptions;
/// use fixgen_graph::NodeId;
///
/// let options = CodegenOptions::default()
///     .with_sub_fixture("fake_encoder", NodeId(4))
///     .with_max_expression_complexity(3);
///
/// assert_eq!(options.top_level_fixture_name, "config_fixture");
/// assert_eq!(options.sub_fixtures.len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodegenOptions {
    /// Function name of the unit that returns the whole graph.
    pub top_level_fixture_name: String,
    /// Function name to subgraph root, in emission order.
    pub sub_fixtures: IndexMap<String, NodeId>,
    /// Upper bound on the size of any single emitted expression.
    ///
    /// `None` means only sharing drives hoisting.
    pub max_expression_complexity: Option<u32>,
    /// Spaces per indentation level.
    pub indent: usize,
}

impl Default for CodegenOptions {
    fn default() -> Self {
        Self {
            top_level_fixture_name: DEFAULT_FIXTURE_NAME.to_string(),
            sub_fixtures: IndexMap::new(),
            max_expression_complexity: None,
            indent: DEFAULT_INDENT,
        }
    }
}

impl CodegenOptions {
    pub fn with_top_level_fixture_name(mut self, name: impl Into<String>) -> Self {
        self.top_level_fixture_name = name.into();
        self
    }

    pub fn with_sub_fixture(mut self, name: impl Into<String>, root: NodeId) -> Self {
        self.sub_fixtures.insert(name.into(), root);
        self
    }

    pub fn with_max_expression_complexity(mut self, max: u32) -> Self {
        self.max_expression_complexity = Some(max);
        self
    }

    pub fn with_indent(mut self, indent: usize) -> Self {
        self.indent = indent;
        self
    }

    /// Name of the sub-fixture rooted at `id`, if any.
    pub fn sub_fixture_at(&self, id: NodeId) -> Option<&str> {
        self.sub_fixtures
            .iter()
            .find(|(_, root)| **root == id)
            .map(|(name, _)| name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_defaults() {
        let options: CodegenOptions = serde_json::from_str("{}").unwrap();
        assert_eq!(options, CodegenOptions::default());
    }

    #[test]
    fn test_deserialize_sub_fixtures_keep_order() {
        let options: CodegenOptions = serde_json::from_str(
            r#"{"sub_fixtures": {"b": 3, "a": 1}, "max_expression_complexity": 2}"#,
        )
        .unwrap();
        let names: Vec<&str> = options.sub_fixtures.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["b", "a"]);
        assert_eq!(options.max_expression_complexity, Some(2));
        assert_eq!(options.sub_fixture_at(NodeId(1)), Some("a"));
    }
}
