//! Lint for unit function names.

use std::collections::HashMap;

use super::super::{Lint, LintContext};
use crate::{naming::sanitize_identifier, pipeline::Diagnostic};

/// Lint that checks the function names the units will be emitted under.
///
/// Names that change under sanitization are only a warning; names that
/// collide are an error.
pub struct SubFixtureNameLint;

impl Lint for SubFixtureNameLint {
    fn name(&self) -> &'static str {
        "sub-fixture-name"
    }

    fn description(&self) -> &'static str {
        "Fixture names must be valid and unique Python function names"
    }

    fn check(&self, ctx: &LintContext<'_>, diagnostics: &mut Vec<Diagnostic>) {
        let top_level = ctx.options.top_level_fixture_name.as_str();
        let mut emitted: HashMap<String, &str> = HashMap::new();

        let names = std::iter::once(top_level)
            .chain(ctx.options.sub_fixtures.keys().map(String::as_str));
        for (i, name) in names.enumerate() {
            let location = if i == 0 {
                "top_level_fixture_name".to_string()
            } else {
                format!("sub_fixtures.{}", name)
            };

            if name.is_empty() {
                diagnostics.push(
                    Diagnostic::error("validate", "fixture name must not be empty").at(location),
                );
                continue;
            }
            if i > 0 && name == top_level {
                diagnostics.push(
                    Diagnostic::error(
                        "validate",
                        format!("'{}' already exists in the top level fixture", name),
                    )
                    .at(location),
                );
                continue;
            }

            let function = sanitize_identifier(name);
            if function != name {
                diagnostics.push(
                    Diagnostic::warning(
                        "validate",
                        format!("fixture '{}' is emitted as function '{}'", name, function),
                    )
                    .at(location.clone()),
                );
            }
            if let Some(other) = emitted.get(&function) {
                diagnostics.push(
                    Diagnostic::error(
                        "validate",
                        format!(
                            "fixtures '{}' and '{}' both map to function '{}'",
                            other, name, function
                        ),
                    )
                    .at(location),
                );
            } else {
                emitted.insert(function, name);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CodegenOptions, testing::fixtures};

    fn check(options: CodegenOptions) -> Vec<Diagnostic> {
        let (graph, root) = fixtures::diamond();
        let ctx = LintContext {
            graph: &graph,
            root,
            options: &options,
            reachable: graph.descendants(root).unwrap(),
        };
        let mut diagnostics = Vec::new();
        SubFixtureNameLint.check(&ctx, &mut diagnostics);
        diagnostics
    }

    #[test]
    fn test_conflicts_with_top_level() {
        let diagnostics =
            check(CodegenOptions::default().with_sub_fixture("config_fixture", fixgen_graph::NodeId(0)));

        assert_eq!(diagnostics.len(), 1);
        assert_eq!(
            diagnostics[0].message,
            "'config_fixture' already exists in the top level fixture"
        );
    }

    #[test]
    fn test_sanitized_name_warns() {
        let diagnostics =
            check(CodegenOptions::default().with_sub_fixture("fake-encoder", fixgen_graph::NodeId(0)));

        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].severity.is_warning());
        assert!(diagnostics[0].message.contains("'fake_encoder'"));
    }

    #[test]
    fn test_sanitized_collision_is_error() {
        let diagnostics = check(
            CodegenOptions::default()
                .with_sub_fixture("a_b", fixgen_graph::NodeId(0))
                .with_sub_fixture("a-b", fixgen_graph::NodeId(1)),
        );

        assert!(diagnostics.iter().any(|d| d.severity.is_error()));
    }

    #[test]
    fn test_empty_name() {
        let diagnostics = check(CodegenOptions::default().with_top_level_fixture_name(""));
        assert_eq!(diagnostics[0].message, "fixture name must not be empty");
    }
}
