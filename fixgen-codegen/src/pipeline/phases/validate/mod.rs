//! Validate phase - runs lints on the graph and options.

mod lint;
pub mod lints;

use eyre::Result;
use fixgen_graph::{Graph, NodeId};
pub use lint::{Lint, LintContext, LintInfo};
pub use lints::{
    ComplexityBudgetLint, IndentWidthLint, SubFixtureDuplicateLint, SubFixtureNameLint,
    SubFixtureReachableLint, SubFixtureRootKindLint, TagWithoutValueLint,
};

use crate::{
    CodegenOptions, CompileError,
    pipeline::{CompilationContext, Diagnostic, Phase},
};

/// Phase that validates the input using configurable lints.
pub struct ValidatePhase {
    lints: Vec<Box<dyn Lint>>,
}

impl ValidatePhase {
    /// Create a new validate phase with default lints.
    pub fn new() -> Self {
        Self {
            lints: vec![
                Box::new(TagWithoutValueLint),
                Box::new(SubFixtureReachableLint),
                Box::new(SubFixtureRootKindLint),
                Box::new(SubFixtureDuplicateLint),
                Box::new(SubFixtureNameLint),
                Box::new(ComplexityBudgetLint),
                Box::new(IndentWidthLint),
            ],
        }
    }

    /// Create a validate phase with no lints.
    pub fn empty() -> Self {
        Self { lints: Vec::new() }
    }

    /// Add a custom lint to the validation phase.
    pub fn with_lint(mut self, lint: impl Lint + 'static) -> Self {
        self.lints.push(Box::new(lint));
        self
    }

    /// Get the names of all lints that will be run.
    pub fn lint_names(&self) -> Vec<&'static str> {
        self.lints.iter().map(|l| l.name()).collect()
    }

    /// Get information about all lints that will be run.
    pub fn lint_info(&self) -> Vec<LintInfo> {
        self.lints.iter().map(|l| l.info()).collect()
    }

    /// Run every lint without failing, for callers that only report.
    pub fn diagnostics(
        &self,
        graph: &Graph,
        root: NodeId,
        options: &CodegenOptions,
    ) -> Vec<Diagnostic> {
        let Ok(reachable) = graph.descendants(root) else {
            return vec![
                Diagnostic::error(
                    "validate",
                    format!(
                        "root node {} is not in the graph ({} nodes)",
                        root,
                        graph.len()
                    ),
                )
                .at(root.to_string()),
            ];
        };
        let ctx = LintContext {
            graph,
            root,
            options,
            reachable,
        };

        let mut diagnostics = Vec::new();
        for lint in &self.lints {
            let start = diagnostics.len();
            lint.check(&ctx, &mut diagnostics);
            for diagnostic in &mut diagnostics[start..] {
                diagnostic.lint.get_or_insert_with(|| lint.name().to_string());
            }
        }
        diagnostics
    }
}

impl Default for ValidatePhase {
    fn default() -> Self {
        Self::new()
    }
}

impl Phase for ValidatePhase {
    fn name(&self) -> &'static str {
        "validate"
    }

    fn description(&self) -> &'static str {
        "Reject tags without values and inconsistent sub-fixture options"
    }

    fn run(&self, ctx: &mut CompilationContext<'_>) -> Result<()> {
        let diagnostics = self.diagnostics(ctx.graph, ctx.root, &ctx.options);
        ctx.diagnostics.extend(diagnostics);

        // Warnings are allowed through.
        if ctx.has_errors() {
            let summary = ctx
                .errors()
                .map(|d| d.message.as_str())
                .collect::<Vec<_>>()
                .join("; ");
            return Err(CompileError::Validation {
                count: ctx.error_count(),
                summary,
            }
            .into());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixtures;

    struct AlwaysErrorLint;

    impl Lint for AlwaysErrorLint {
        fn name(&self) -> &'static str {
            "always-error"
        }

        fn description(&self) -> &'static str {
            "Always produces an error"
        }

        fn check(&self, _ctx: &LintContext<'_>, diagnostics: &mut Vec<Diagnostic>) {
            diagnostics.push(Diagnostic::error("validate", "forced error"));
        }
    }

    #[test]
    fn test_with_errors() {
        let (graph, root) = fixtures::diamond();
        let mut ctx = CompilationContext::new(&graph, root, CodegenOptions::default());

        let phase = ValidatePhase::empty().with_lint(AlwaysErrorLint);
        let err = phase.run(&mut ctx).unwrap_err();

        assert!(ctx.has_errors());
        assert_eq!(ctx.diagnostics[0].lint.as_deref(), Some("always-error"));
        assert_eq!(
            err.to_string(),
            "validation failed with 1 error(s): forced error"
        );
    }

    #[test]
    fn test_warnings_allowed() {
        let (graph, root) = fixtures::diamond();
        let leaf = graph.node(root).unwrap().references()[0];
        let options = CodegenOptions::default().with_sub_fixture("shared-leaf", leaf);
        let mut ctx = CompilationContext::new(&graph, root, options);

        let result = ValidatePhase::new().run(&mut ctx);

        assert!(result.is_ok());
        assert!(ctx.has_warnings());
        assert!(!ctx.has_errors());
    }

    #[test]
    fn test_missing_root() {
        let (graph, _) = fixtures::diamond();
        let diagnostics =
            ValidatePhase::new().diagnostics(&graph, NodeId(99), &CodegenOptions::default());

        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].message.contains("not in the graph"));
    }

    #[test]
    fn test_default_lints() {
        assert_eq!(
            ValidatePhase::new().lint_names(),
            vec![
                "tag-without-value",
                "sub-fixture-reachable",
                "sub-fixture-root-kind",
                "sub-fixture-duplicate",
                "sub-fixture-name",
                "complexity-budget",
                "indent-width",
            ]
        );
    }
}
