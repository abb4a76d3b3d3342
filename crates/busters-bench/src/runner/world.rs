//! Simulated hunt: one pursuer, randomly wandering adversaries, sonar readings.

use busters_core::distance::{DistanceOracle, Distancer};
use busters_core::model::direction::Direction;
use busters_core::model::layout::Layout;
use busters_core::model::position::Position;
use busters_core::model::view::GameView;
use busters_core::observation::EmissionModel;
use rand::RngCore;
use rand::seq::SliceRandom;

pub const TIME_PENALTY: i64 = 1;
pub const CAPTURE_REWARD: i64 = 200;

pub struct World<'a> {
    layout: &'a Layout,
    distancer: &'a Distancer,
    emission: &'a dyn EmissionModel,
    pacman: Position,
    facing: Direction,
    ghosts: Vec<Position>,
    living: Vec<bool>,
    score: i64,
    captures: usize,
}

/// Everything the agent may see this turn, owned so a `GameView` can borrow it.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub legal_actions: Vec<Direction>,
    pub living_ghosts: Vec<bool>,
    pub noisy_distances: Vec<Option<u32>>,
    pub ghost_distances: Vec<Option<u32>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorldError {
    IllegalAction { action: Direction, at: Position },
}

impl std::fmt::Display for WorldError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WorldError::IllegalAction { action, at } => {
                write!(f, "illegal action {action} from {at}")
            }
        }
    }
}

impl std::error::Error for WorldError {}

impl<'a> World<'a> {
    pub fn new(
        layout: &'a Layout,
        distancer: &'a Distancer,
        emission: &'a dyn EmissionModel,
    ) -> Self {
        let ghosts = layout.ghost_starts().to_vec();
        let living = vec![true; ghosts.len()];
        Self {
            layout,
            distancer,
            emission,
            pacman: layout.pacman_start(),
            facing: Direction::Stop,
            ghosts,
            living,
            score: 0,
            captures: 0,
        }
    }

    pub fn pacman(&self) -> Position {
        self.pacman
    }

    pub fn facing(&self) -> Direction {
        self.facing
    }

    pub fn ghosts(&self) -> &[Position] {
        &self.ghosts
    }

    pub fn living(&self) -> &[bool] {
        &self.living
    }

    pub fn score(&self) -> i64 {
        self.score
    }

    pub fn captures(&self) -> usize {
        self.captures
    }

    pub fn all_captured(&self) -> bool {
        self.living.iter().all(|alive| !alive)
    }

    /// Samples fresh sonar readings; captured adversaries read `None`.
    pub fn observe(&self, rng: &mut dyn RngCore) -> Observation {
        let mut noisy_distances = Vec::with_capacity(self.ghosts.len());
        let mut ghost_distances = Vec::with_capacity(self.ghosts.len());
        for (ghost, alive) in self.ghosts.iter().zip(&self.living) {
            if *alive {
                let reading = self.emission.sample(self.pacman.manhattan(*ghost), rng);
                noisy_distances.push(Some(reading));
                ghost_distances.push(Some(self.distancer.distance(self.pacman, *ghost)));
            } else {
                noisy_distances.push(None);
                ghost_distances.push(None);
            }
        }

        Observation {
            legal_actions: self.layout.legal_actions(self.pacman),
            living_ghosts: self.living.clone(),
            noisy_distances,
            ghost_distances,
        }
    }

    pub fn view<'v>(&'v self, observation: &'v Observation) -> GameView<'v> {
        GameView {
            layout: self.layout,
            pacman_position: self.pacman,
            pacman_direction: self.facing,
            legal_actions: &observation.legal_actions,
            living_ghosts: &observation.living_ghosts,
            noisy_distances: &observation.noisy_distances,
            ghost_distances: &observation.ghost_distances,
        }
    }

    /// Moves the pursuer, charging the time penalty. Returns captures made on arrival.
    pub fn apply_pacman(&mut self, action: Direction) -> Result<usize, WorldError> {
        if !self.layout.legal_actions(self.pacman).contains(&action) {
            return Err(WorldError::IllegalAction {
                action,
                at: self.pacman,
            });
        }
        self.pacman = self.pacman.step(action);
        if action.is_cardinal() {
            self.facing = action;
        }
        self.score -= TIME_PENALTY;
        Ok(self.resolve_captures())
    }

    /// Each living adversary takes a uniformly random legal action.
    pub fn move_ghosts(&mut self, rng: &mut dyn RngCore) -> usize {
        for (ghost, alive) in self.ghosts.iter_mut().zip(&self.living) {
            if !*alive {
                continue;
            }
            let options = self.layout.legal_actions(*ghost);
            if let Some(action) = options.choose(rng) {
                *ghost = ghost.step(*action);
            }
        }
        self.resolve_captures()
    }

    fn resolve_captures(&mut self) -> usize {
        let mut captured = 0;
        for (ghost, alive) in self.ghosts.iter().zip(self.living.iter_mut()) {
            if *alive && *ghost == self.pacman {
                *alive = false;
                captured += 1;
            }
        }
        self.captures += captured;
        self.score += CAPTURE_REWARD * captured as i64;
        captured
    }
}
