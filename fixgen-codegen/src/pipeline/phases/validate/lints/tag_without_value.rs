//! Lint for tagged fields that carry no value.

use super::super::{Lint, LintContext};
use crate::pipeline::Diagnostic;

/// Lint that rejects fields with tags but no value.
///
/// Generated code has no placeholder for "a value supplied later", so such a
/// field cannot be emitted.
pub struct TagWithoutValueLint;

impl Lint for TagWithoutValueLint {
    fn name(&self) -> &'static str {
        "tag-without-value"
    }

    fn description(&self) -> &'static str {
        "Tagged fields must have a value"
    }

    fn check(&self, ctx: &LintContext<'_>, diagnostics: &mut Vec<Diagnostic>) {
        for id in ctx.reachable_sorted() {
            let Some(node) = ctx.graph.get(id) else {
                continue;
            };
            for (name, field) in &node.fields {
                if !field.is_dangling_tag() {
                    continue;
                }
                let tags: Vec<String> = field.tags.iter().map(|t| t.to_string()).collect();
                diagnostics.push(
                    Diagnostic::error(
                        "validate",
                        format!(
                            "field '{}' of {} ({}) has tags [{}] but no value; \
                             try assigning a value to the field first or removing field tags from your config",
                            name,
                            id,
                            node.target,
                            tags.join(", ")
                        ),
                    )
                    .at(format!("{}.{}", id, name)),
                );
            }
        }
    }
}
