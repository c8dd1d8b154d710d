//! Hoist phase - picks the nodes that become variables.

use eyre::Result;

use crate::{
    analysis::HoistPlan,
    pipeline::{CompilationContext, Phase},
};

pub struct HoistPhase;

impl Phase for HoistPhase {
    fn name(&self) -> &'static str {
        "hoist"
    }

    fn description(&self) -> &'static str {
        "Hoist shared nodes and split expressions over the complexity budget"
    }

    fn run(&self, ctx: &mut CompilationContext<'_>) -> Result<()> {
        let plan = HoistPlan::compute(
            ctx.graph,
            ctx.traversal()?,
            ctx.complexity()?,
            &ctx.options,
        )?;
        ctx.hoisting = Some(plan);
        Ok(())
    }
}
