use super::{DecisionError, Policy, PolicyContext, random_legal};
use busters_core::distance::{DistanceOracle, ManhattanDistance};
use busters_core::model::direction::Direction;
use busters_core::model::position::Position;
use rand::RngCore;

/// Charges the most likely position of the closest living adversary.
#[derive(Debug, Default, Clone, Copy)]
pub struct GreedyPolicy;

impl GreedyPolicy {
    /// Most likely position per living adversary with a non-degenerate belief.
    pub fn likely_positions(ctx: &PolicyContext<'_>) -> Vec<Position> {
        ctx.beliefs
            .iter()
            .enumerate()
            .filter(|(index, _)| ctx.view.is_ghost_alive(*index))
            .filter_map(|(_, belief)| belief.argmax())
            .collect()
    }

    /// Closest candidate; the earliest adversary wins ties.
    pub fn target(ctx: &PolicyContext<'_>) -> Option<Position> {
        let origin = ctx.view.pacman_position;
        let oracle: &dyn DistanceOracle = ctx.distancer.unwrap_or(&ManhattanDistance);
        let mut best: Option<(Position, u32)> = None;
        for candidate in Self::likely_positions(ctx) {
            let distance = oracle.distance(origin, candidate);
            match best {
                Some((_, best_distance)) if distance >= best_distance => {}
                _ => best = Some((candidate, distance)),
            }
        }
        best.map(|(pos, _)| pos)
    }
}

impl Policy for GreedyPolicy {
    fn choose_action(
        &mut self,
        ctx: &PolicyContext<'_>,
        rng: &mut dyn RngCore,
    ) -> Result<Direction, DecisionError> {
        let view = &ctx.view;
        let origin = view.pacman_position;

        if let Some(target) = Self::target(ctx) {
            let preferred = [
                (origin.x < target.x, Direction::East),
                (origin.x > target.x, Direction::West),
                (origin.y < target.y, Direction::North),
                (origin.y > target.y, Direction::South),
            ];
            for (wanted, direction) in preferred {
                if wanted && view.is_legal(direction) {
                    return Ok(direction);
                }
            }
        }

        if view.is_legal(Direction::Stop) {
            Ok(Direction::Stop)
        } else {
            random_legal(view, rng)
        }
    }

    fn name(&self) -> &'static str {
        "greedy"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::test_support::{room, view};
    use busters_core::belief::BeliefDistribution;
    use busters_core::distance::Distancer;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn point_belief(layout: &busters_core::model::layout::Layout, at: Position) -> BeliefDistribution {
        let mut belief = BeliefDistribution::zeroed(layout.legal_positions());
        belief.set(at, 1.0);
        belief
    }

    #[test]
    fn heads_east_first_toward_target() {
        let layout = room();
        let legal = layout.legal_actions(layout.pacman_start());
        let distances = [None, None];
        let beliefs = [
            point_belief(&layout, Position::new(5, 5)),
            BeliefDistribution::zeroed(layout.legal_positions()),
        ];
        let ctx = PolicyContext::new(view(&layout, Direction::Stop, &legal, &distances))
            .with_beliefs(&beliefs);
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(
            GreedyPolicy.choose_action(&ctx, &mut rng),
            Ok(Direction::East)
        );
    }

    #[test]
    fn picks_closest_living_adversary() {
        let layout = room();
        let distancer = Distancer::new(&layout);
        let legal = layout.legal_actions(layout.pacman_start());
        let distances = [None, None];
        let beliefs = [
            point_belief(&layout, Position::new(5, 5)),
            point_belief(&layout, Position::new(3, 2)),
        ];
        let ctx = PolicyContext::new(view(&layout, Direction::Stop, &legal, &distances))
            .with_beliefs(&beliefs)
            .with_distancer(&distancer);
        assert_eq!(GreedyPolicy::target(&ctx), Some(Position::new(3, 2)));
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(
            GreedyPolicy.choose_action(&ctx, &mut rng),
            Ok(Direction::South)
        );
    }

    #[test]
    fn ignores_captured_adversaries() {
        let layout = room();
        let legal = layout.legal_actions(layout.pacman_start());
        let distances = [None, None];
        let beliefs = [
            point_belief(&layout, Position::new(3, 4)),
            point_belief(&layout, Position::new(1, 3)),
        ];
        let mut ctx = PolicyContext::new(view(&layout, Direction::Stop, &legal, &distances))
            .with_beliefs(&beliefs);
        ctx.view.living_ghosts = &[false, true];
        assert_eq!(GreedyPolicy::likely_positions(&ctx), vec![Position::new(1, 3)]);
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(
            GreedyPolicy.choose_action(&ctx, &mut rng),
            Ok(Direction::West)
        );
    }

    #[test]
    fn stops_without_any_informative_belief() {
        let layout = room();
        let legal = layout.legal_actions(layout.pacman_start());
        let distances = [None, None];
        let ctx = PolicyContext::new(view(&layout, Direction::Stop, &legal, &distances));
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(
            GreedyPolicy.choose_action(&ctx, &mut rng),
            Ok(Direction::Stop)
        );
    }
}
