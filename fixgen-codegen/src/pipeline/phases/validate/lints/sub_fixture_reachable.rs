//! Lint for sub-fixtures outside the compiled graph.

use super::super::{Lint, LintContext};
use crate::pipeline::Diagnostic;

pub struct SubFixtureReachableLint;

impl Lint for SubFixtureReachableLint {
    fn name(&self) -> &'static str {
        "sub-fixture-reachable"
    }

    fn description(&self) -> &'static str {
        "Sub-fixture roots must be reachable from the graph root"
    }

    fn check(&self, ctx: &LintContext<'_>, diagnostics: &mut Vec<Diagnostic>) {
        for (name, root) in &ctx.options.sub_fixtures {
            if !ctx.reachable.contains(root) {
                diagnostics.push(
                    Diagnostic::error(
                        "validate",
                        format!(
                            "sub-fixture '{}' points at {}, which is not reachable from the root {}",
                            name, root, ctx.root
                        ),
                    )
                    .at(format!("sub_fixtures.{}", name)),
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use fixgen_graph::{Graph, Node};

    use super::*;
    use crate::CodegenOptions;

    #[test]
    fn test_unreachable_sub_fixture() {
        let mut graph = Graph::new();
        let orphan = graph.add(Node::config("m.Orphan")).unwrap();
        let root = graph.add(Node::config("m.Root")).unwrap();
        let options = CodegenOptions::default().with_sub_fixture("orphan", orphan);
        let ctx = LintContext {
            graph: &graph,
            root,
            options: &options,
            reachable: graph.descendants(root).unwrap(),
        };

        let mut diagnostics = Vec::new();
        SubFixtureReachableLint.check(&ctx, &mut diagnostics);

        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].location.as_deref(), Some("sub_fixtures.orphan"));
    }
}
