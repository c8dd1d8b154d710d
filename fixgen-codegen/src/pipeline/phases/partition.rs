//! Partition phase - assigns nodes to units.

use eyre::{Result, eyre};

use crate::{
    analysis::Partition,
    pipeline::{CompilationContext, Phase},
};

pub struct PartitionPhase;

impl Phase for PartitionPhase {
    fn name(&self) -> &'static str {
        "partition"
    }

    fn description(&self) -> &'static str {
        "Place nodes in sub-fixture units and thread shared ones as parameters"
    }

    fn run(&self, ctx: &mut CompilationContext<'_>) -> Result<()> {
        let traversal = ctx
            .traversal
            .as_ref()
            .ok_or_else(|| eyre!("traversal not set - did WalkPhase run?"))?;
        let hoisting = ctx
            .hoisting
            .as_mut()
            .ok_or_else(|| eyre!("hoist plan not set - did HoistPhase run?"))?;

        let partition = Partition::compute(ctx.graph, traversal, hoisting, &ctx.options)?;
        for unit in &partition.units {
            tracing::debug!(
                unit = %unit.name,
                parent = ?unit.parent,
                params = unit.params.len(),
                locals = unit.locals.len(),
                "unit planned"
            );
        }
        ctx.partition = Some(partition);
        Ok(())
    }
}
