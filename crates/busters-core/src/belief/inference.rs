use super::BeliefDistribution;
use crate::model::position::Position;
use crate::model::view::GameView;
use crate::observation::{EmissionModel, ObservationModel};
use core::fmt;
use std::sync::Arc;

/// Capability set every per-adversary tracker exposes to the agent loop.
///
/// Each turn the agent calls `elapse_time` (predict) before `observe_state`
/// (correct); on the very first turn the predict step is skipped.
pub trait InferenceModule: Send + fmt::Debug {
    /// Zero-based index of the tracked adversary.
    fn ghost_index(&self) -> usize;

    /// Captures the legal positions of the layout and seeds the prior.
    fn initialize(&mut self, view: &GameView<'_>);

    /// Folds one noisy reading, taken from `observer`, into the belief.
    fn observe(&mut self, reading: Option<u32>, observer: Position);

    /// Advances the belief through the adversary motion model.
    fn elapse_time(&mut self, view: &GameView<'_>);

    fn belief_distribution(&self) -> &BeliefDistribution;

    /// Pulls this adversary's reading out of `view` and observes it.
    fn observe_state(&mut self, view: &GameView<'_>) {
        let index = self.ghost_index();
        if index >= view.noisy_distances.len() {
            return;
        }
        self.observe(view.noisy_distance(index), view.pacman_position);
    }
}

/// Keeps every position consistent with the latest reading, all at equal weight.
#[derive(Debug, Clone)]
pub struct FeasibilityInference {
    ghost_index: usize,
    legal_positions: Vec<Position>,
    model: ObservationModel,
    beliefs: BeliefDistribution,
}

impl FeasibilityInference {
    pub fn new(ghost_index: usize, emission: Arc<dyn EmissionModel>) -> Self {
        Self {
            ghost_index,
            legal_positions: Vec::new(),
            model: ObservationModel::new(emission),
            beliefs: BeliefDistribution::default(),
        }
    }

    pub fn legal_positions(&self) -> &[Position] {
        &self.legal_positions
    }

    /// Replaces the tracked support, e.g. when positions come from outside a layout.
    pub fn set_legal_positions(&mut self, positions: Vec<Position>) {
        self.legal_positions = positions;
    }

    pub fn initialize_uniformly(&mut self) {
        self.beliefs = BeliefDistribution::uniform(&self.legal_positions);
    }
}

impl InferenceModule for FeasibilityInference {
    fn ghost_index(&self) -> usize {
        self.ghost_index
    }

    fn initialize(&mut self, view: &GameView<'_>) {
        self.legal_positions = view.layout.legal_positions().to_vec();
        self.initialize_uniformly();
    }

    fn observe(&mut self, reading: Option<u32>, observer: Position) {
        let mut feasible = BeliefDistribution::zeroed(&self.legal_positions);
        for pos in &self.legal_positions {
            if self.model.is_feasible(reading, *pos, observer) {
                feasible.set(*pos, 1.0);
            }
        }
        feasible.normalize();
        self.beliefs = feasible;
    }

    fn elapse_time(&mut self, _view: &GameView<'_>) {}

    fn belief_distribution(&self) -> &BeliefDistribution {
        &self.beliefs
    }
}
