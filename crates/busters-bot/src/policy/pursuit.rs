//! One-turn-memory pursuit heuristic driven by per-adversary distances.
//!
//! The agent compares the closest observed adversary distance before and after its
//! last move. Losing ground triggers an evasive re-draw that avoids the current facing;
//! holding or gaining ground keeps the facing direction. The comparison runs over the
//! minimum across *all* observed adversaries, not the one being chased, so a different
//! adversary drifting closer also counts as progress.

use super::{DecisionError, Policy, PolicyContext, draw, random_legal};
use busters_core::model::direction::Direction;
use busters_core::model::view::GameView;
use rand::RngCore;
use tracing::{Level, event};

/// Smallest distance among observed adversaries; `None` when nothing is observed.
pub fn min_observed(distances: &[Option<u32>]) -> Option<u32> {
    distances.iter().flatten().copied().min()
}

/// Previous turn's per-adversary distances, replaced wholesale after every decision.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MovementHistory {
    previous: Vec<Option<u32>>,
}

impl MovementHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.previous.is_empty()
    }

    pub fn previous(&self) -> &[Option<u32>] {
        &self.previous
    }

    pub fn record(&mut self, distances: &[Option<u32>]) {
        self.previous = distances.to_vec();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PursuitBranch {
    /// No usable comparison: blind uniform draw.
    NoHistory,
    /// The closest adversary got farther away: re-draw, avoiding the facing direction.
    Evade,
    /// Distance held or improved: keep heading the same way.
    Persist,
}

#[derive(Debug, Clone, Default)]
pub struct PursuitPolicy {
    history: MovementHistory,
    last_branch: Option<PursuitBranch>,
}

impl PursuitPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from an existing memory, e.g. when resuming a scripted scenario.
    pub fn with_history(history: MovementHistory) -> Self {
        Self {
            history,
            last_branch: None,
        }
    }

    pub fn history(&self) -> &MovementHistory {
        &self.history
    }

    pub fn last_branch(&self) -> Option<PursuitBranch> {
        self.last_branch
    }

    pub fn classify(&self, current: &[Option<u32>]) -> PursuitBranch {
        if self.history.is_empty() {
            return PursuitBranch::NoHistory;
        }
        match (min_observed(self.history.previous()), min_observed(current)) {
            (Some(previous), Some(now)) if previous < now => PursuitBranch::Evade,
            (Some(_), Some(_)) => PursuitBranch::Persist,
            _ => PursuitBranch::NoHistory,
        }
    }

    fn evade(view: &GameView<'_>, rng: &mut dyn RngCore) -> Result<Direction, DecisionError> {
        let facing = view.pacman_direction;
        let legal = view.legal_cardinals();
        let fresh: Vec<Direction> = legal
            .iter()
            .copied()
            .filter(|direction| *direction != facing)
            .collect();
        match draw(&fresh, rng) {
            Some(direction) => Ok(direction),
            // Only the facing direction is open.
            None if view.is_legal(Direction::Stop) => Ok(Direction::Stop),
            None => random_legal(view, rng),
        }
    }

    fn persist(view: &GameView<'_>, rng: &mut dyn RngCore) -> Result<Direction, DecisionError> {
        let facing = view.pacman_direction;
        if facing.is_cardinal() && view.is_legal(facing) {
            return Ok(facing);
        }
        random_legal(view, rng)
    }
}

impl Policy for PursuitPolicy {
    fn choose_action(
        &mut self,
        ctx: &PolicyContext<'_>,
        rng: &mut dyn RngCore,
    ) -> Result<Direction, DecisionError> {
        let view = &ctx.view;
        let current = view.ghost_distances;
        let branch = self.classify(current);

        let action = match branch {
            PursuitBranch::NoHistory => random_legal(view, rng),
            PursuitBranch::Evade => Self::evade(view, rng),
            PursuitBranch::Persist => Self::persist(view, rng),
        }?;

        event!(
            target: "busters_bot::pursuit",
            Level::DEBUG,
            branch = ?branch,
            facing = %view.pacman_direction,
            previous_min = ?min_observed(self.history.previous()),
            current_min = ?min_observed(current),
            action = %action
        );

        self.history.record(current);
        self.last_branch = Some(branch);
        Ok(action)
    }

    fn name(&self) -> &'static str {
        "pursuit"
    }
}
