//! Score phase - inlined expression sizes.

use eyre::Result;

use crate::{
    analysis::Complexity,
    pipeline::{CompilationContext, Phase},
};

pub struct ScorePhase;

impl Phase for ScorePhase {
    fn name(&self) -> &'static str {
        "score"
    }

    fn description(&self) -> &'static str {
        "Compute the fully inlined expression size of every node"
    }

    fn run(&self, ctx: &mut CompilationContext<'_>) -> Result<()> {
        let complexity = Complexity::compute(ctx.graph, ctx.traversal()?)?;
        ctx.complexity = Some(complexity);
        Ok(())
    }
}
