//! Walk phase - memoized post-order traversal.

use eyre::Result;

use crate::{
    analysis::Traversal,
    pipeline::{CompilationContext, Phase},
};

pub struct WalkPhase;

impl Phase for WalkPhase {
    fn name(&self) -> &'static str {
        "walk"
    }

    fn description(&self) -> &'static str {
        "Visit every reachable node once and count its parents"
    }

    fn run(&self, ctx: &mut CompilationContext<'_>) -> Result<()> {
        let traversal = Traversal::walk(ctx.graph, ctx.root, &ctx.options)?;
        tracing::debug!(
            nodes = traversal.order.len(),
            regions = traversal.regions.len(),
            "graph walked"
        );
        ctx.traversal = Some(traversal);
        Ok(())
    }
}
