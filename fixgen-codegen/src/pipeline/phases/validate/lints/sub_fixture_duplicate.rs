//! Lint for two sub-fixtures sharing a root.

use std::collections::HashMap;

use super::super::{Lint, LintContext};
use crate::pipeline::Diagnostic;

pub struct SubFixtureDuplicateLint;

impl Lint for SubFixtureDuplicateLint {
    fn name(&self) -> &'static str {
        "sub-fixture-duplicate"
    }

    fn description(&self) -> &'static str {
        "Each node roots at most one sub-fixture"
    }

    fn check(&self, ctx: &LintContext<'_>, diagnostics: &mut Vec<Diagnostic>) {
        let mut first: HashMap<_, &str> = HashMap::new();
        for (name, root) in &ctx.options.sub_fixtures {
            match first.get(root) {
                Some(existing) => diagnostics.push(
                    Diagnostic::error(
                        "validate",
                        format!(
                            "sub-fixtures '{}' and '{}' are both rooted at {}",
                            existing, name, root
                        ),
                    )
                    .at(format!("sub_fixtures.{}", name)),
                ),
                None => {
                    first.insert(*root, name.as_str());
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CodegenOptions, testing::fixtures};

    #[test]
    fn test_duplicate_root() {
        let fixture = fixtures::fake_encoder_decoder();
        let options = CodegenOptions::default()
            .with_sub_fixture("encoder", fixture.encoder)
            .with_sub_fixture("encoder_again", fixture.encoder);
        let ctx = LintContext {
            graph: &fixture.graph,
            root: fixture.root,
            options: &options,
            reachable: fixture.graph.descendants(fixture.root).unwrap(),
        };

        let mut diagnostics = Vec::new();
        SubFixtureDuplicateLint.check(&ctx, &mut diagnostics);

        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].message.contains("'encoder' and 'encoder_again'"));
    }
}
