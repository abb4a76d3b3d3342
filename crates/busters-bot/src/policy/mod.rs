mod greedy;
mod pursuit;
mod random;

pub use greedy::GreedyPolicy;
pub use pursuit::{MovementHistory, PursuitBranch, PursuitPolicy, min_observed};
pub use random::{RandomPolicy, StopPolicy};

use busters_core::belief::BeliefDistribution;
use busters_core::distance::DistanceOracle;
use busters_core::model::direction::Direction;
use busters_core::model::view::GameView;
use core::fmt;
use core::str::FromStr;
use rand::RngCore;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

/// Context provided to policies for decision-making
#[derive(Clone, Copy)]
pub struct PolicyContext<'a> {
    pub view: GameView<'a>,
    /// Latest belief per adversary, indexed like `view.living_ghosts`.
    pub beliefs: &'a [BeliefDistribution],
    pub distancer: Option<&'a dyn DistanceOracle>,
}

impl<'a> PolicyContext<'a> {
    pub fn new(view: GameView<'a>) -> Self {
        Self {
            view,
            beliefs: &[],
            distancer: None,
        }
    }

    pub fn with_beliefs(mut self, beliefs: &'a [BeliefDistribution]) -> Self {
        self.beliefs = beliefs;
        self
    }

    pub fn with_distancer(mut self, distancer: &'a dyn DistanceOracle) -> Self {
        self.distancer = Some(distancer);
        self
    }
}

/// Unified interface for per-turn action selection.
///
/// Every random draw goes through the supplied generator so a seeded agent is reproducible.
pub trait Policy: Send {
    fn choose_action(
        &mut self,
        ctx: &PolicyContext<'_>,
        rng: &mut dyn RngCore,
    ) -> Result<Direction, DecisionError>;

    fn name(&self) -> &'static str;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecisionError {
    /// The environment offered no legal action at all.
    NoLegalActions,
}

impl fmt::Display for DecisionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecisionError::NoLegalActions => f.write_str("no legal actions available"),
        }
    }
}

impl std::error::Error for DecisionError {}

/// Uniform draw from `candidates`.
pub(crate) fn draw(candidates: &[Direction], rng: &mut dyn RngCore) -> Option<Direction> {
    candidates.choose(rng).copied()
}

/// Uniform legal cardinal move, `Stop` when no cardinal move is legal.
pub(crate) fn random_legal(
    view: &GameView<'_>,
    rng: &mut dyn RngCore,
) -> Result<Direction, DecisionError> {
    match draw(&view.legal_cardinals(), rng) {
        Some(direction) => Ok(direction),
        None => stop_if_legal(view),
    }
}

pub(crate) fn stop_if_legal(view: &GameView<'_>) -> Result<Direction, DecisionError> {
    if view.is_legal(Direction::Stop) {
        Ok(Direction::Stop)
    } else {
        Err(DecisionError::NoLegalActions)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyKind {
    Stop,
    Random,
    #[default]
    Pursuit,
    Greedy,
}

impl PolicyKind {
    pub fn spawn(self) -> Box<dyn Policy> {
        match self {
            PolicyKind::Stop => Box::new(StopPolicy),
            PolicyKind::Random => Box::new(RandomPolicy),
            PolicyKind::Pursuit => Box::new(PursuitPolicy::new()),
            PolicyKind::Greedy => Box::new(GreedyPolicy),
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            PolicyKind::Stop => "stop",
            PolicyKind::Random => "random",
            PolicyKind::Pursuit => "pursuit",
            PolicyKind::Greedy => "greedy",
        }
    }
}

impl fmt::Display for PolicyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsePolicyError(String);

impl fmt::Display for ParsePolicyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown policy '{}'", self.0)
    }
}

impl std::error::Error for ParsePolicyError {}

impl FromStr for PolicyKind {
    type Err = ParsePolicyError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "stop" | "default" => Ok(PolicyKind::Stop),
            "random" | "baseline" => Ok(PolicyKind::Random),
            "pursuit" | "heuristic" => Ok(PolicyKind::Pursuit),
            "greedy" | "belief" => Ok(PolicyKind::Greedy),
            _ => Err(ParsePolicyError(raw.to_string())),
        }
    }
}
