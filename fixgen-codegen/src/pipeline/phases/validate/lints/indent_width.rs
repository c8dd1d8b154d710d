//! Lint for the indentation width of generated code.

use super::super::{Lint, LintContext};
use crate::{options::MIN_INDENT, pipeline::Diagnostic};

pub struct IndentWidthLint;

impl Lint for IndentWidthLint {
    fn name(&self) -> &'static str {
        "indent-width"
    }

    fn description(&self) -> &'static str {
        "indent must be at least 1 space"
    }

    fn check(&self, ctx: &LintContext<'_>, diagnostics: &mut Vec<Diagnostic>) {
        if ctx.options.indent < MIN_INDENT {
            diagnostics.push(
                Diagnostic::error(
                    "validate",
                    format!(
                        "indent is {}, function bodies need at least {} space",
                        ctx.options.indent, MIN_INDENT
                    ),
                )
                .at("indent"),
            );
        }
    }
}
