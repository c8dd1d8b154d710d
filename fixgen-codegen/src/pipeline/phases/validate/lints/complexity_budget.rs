//! Lint for the expression complexity budget.

use super::super::{Lint, LintContext};
use crate::{options::MIN_EXPRESSION_COMPLEXITY, pipeline::Diagnostic};

pub struct ComplexityBudgetLint;

impl Lint for ComplexityBudgetLint {
    fn name(&self) -> &'static str {
        "complexity-budget"
    }

    fn description(&self) -> &'static str {
        "max_expression_complexity must be at least 1"
    }

    fn check(&self, ctx: &LintContext<'_>, diagnostics: &mut Vec<Diagnostic>) {
        if let Some(max) = ctx.options.max_expression_complexity {
            if max < MIN_EXPRESSION_COMPLEXITY {
                diagnostics.push(
                    Diagnostic::error(
                        "validate",
                        format!(
                            "max_expression_complexity is {}, the minimum is {}",
                            max, MIN_EXPRESSION_COMPLEXITY
                        ),
                    )
                    .at("max_expression_complexity"),
                );
            }
        }
    }
}
