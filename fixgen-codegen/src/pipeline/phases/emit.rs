//! Emit phase - lowers and renders the fixture module.

use eyre::Result;

use crate::{
    generation::PythonRenderer,
    pipeline::{CompilationContext, Phase},
    program::lower,
};

pub struct EmitPhase;

impl Phase for EmitPhase {
    fn name(&self) -> &'static str {
        "emit"
    }

    fn description(&self) -> &'static str {
        "Lower units to expressions and render Python source"
    }

    fn run(&self, ctx: &mut CompilationContext<'_>) -> Result<()> {
        let program = lower(
            ctx.graph,
            ctx.traversal()?,
            ctx.hoisting()?,
            ctx.partition()?,
        )?;
        let source = PythonRenderer::new(ctx.options.indent).render(&program);
        tracing::debug!(
            units = program.units.len(),
            variables = program.variable_count(),
            bytes = source.len(),
            "module emitted"
        );
        ctx.program = Some(program);
        ctx.output = Some(source);
        Ok(())
    }
}
