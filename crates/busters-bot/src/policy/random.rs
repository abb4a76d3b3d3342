use super::{DecisionError, Policy, PolicyContext, random_legal, stop_if_legal};
use busters_core::model::direction::Direction;
use rand::RngCore;

/// Stands still every turn.
#[derive(Debug, Default, Clone, Copy)]
pub struct StopPolicy;

impl Policy for StopPolicy {
    fn choose_action(
        &mut self,
        ctx: &PolicyContext<'_>,
        _rng: &mut dyn RngCore,
    ) -> Result<Direction, DecisionError> {
        stop_if_legal(&ctx.view)
    }

    fn name(&self) -> &'static str {
        "stop"
    }
}

/// Memoryless baseline: uniform over the legal directional moves.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomPolicy;

impl Policy for RandomPolicy {
    fn choose_action(
        &mut self,
        ctx: &PolicyContext<'_>,
        rng: &mut dyn RngCore,
    ) -> Result<Direction, DecisionError> {
        random_legal(&ctx.view, rng)
    }

    fn name(&self) -> &'static str {
        "random"
    }
}
