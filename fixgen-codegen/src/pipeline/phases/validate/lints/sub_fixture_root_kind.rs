//! Lint for sub-fixture roots that cannot be emitted as a unit.

use super::super::{Lint, LintContext};
use crate::pipeline::Diagnostic;

/// A per-call-fresh node has no identity to return from a function, so it
/// cannot root a sub-fixture.
pub struct SubFixtureRootKindLint;

impl Lint for SubFixtureRootKindLint {
    fn name(&self) -> &'static str {
        "sub-fixture-root-kind"
    }

    fn description(&self) -> &'static str {
        "Sub-fixture roots must not be per-call-fresh nodes"
    }

    fn check(&self, ctx: &LintContext<'_>, diagnostics: &mut Vec<Diagnostic>) {
        for (name, root) in &ctx.options.sub_fixtures {
            let Some(node) = ctx.graph.get(*root) else {
                continue;
            };
            if node.kind.is_fresh() {
                diagnostics.push(
                    Diagnostic::error(
                        "validate",
                        format!(
                            "sub-fixture '{}' is rooted at {} ({}): per-call-fresh nodes are not supported as sub-fixture roots",
                            name, root, node.target
                        ),
                    )
                    .at(format!("sub_fixtures.{}", name)),
                );
            }
        }
    }
}
