use crate::model::position::Position;
use std::collections::BTreeMap;

/// Non-negative weights over candidate positions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BeliefDistribution {
    weights: BTreeMap<Position, f64>,
}

impl BeliefDistribution {
    /// Equal weight on every supplied position, normalized.
    pub fn uniform(positions: &[Position]) -> Self {
        let mut dist = Self {
            weights: positions.iter().map(|pos| (*pos, 1.0)).collect(),
        };
        dist.normalize();
        dist
    }

    /// Same support as `positions`, every weight zero.
    pub fn zeroed(positions: &[Position]) -> Self {
        Self {
            weights: positions.iter().map(|pos| (*pos, 0.0)).collect(),
        }
    }

    /// Returns zero for positions outside the support.
    pub fn get(&self, pos: Position) -> f64 {
        self.weights.get(&pos).copied().unwrap_or(0.0)
    }

    /// Negative weights are clamped to zero.
    pub fn set(&mut self, pos: Position, weight: f64) {
        self.weights.insert(pos, weight.max(0.0));
    }

    pub fn total(&self) -> f64 {
        self.weights.values().sum()
    }

    pub fn is_degenerate(&self) -> bool {
        self.total() == 0.0
    }

    /// Scales weights to sum to one. An all-zero distribution is left untouched.
    pub fn normalize(&mut self) {
        let total = self.total();
        if total == 0.0 {
            return;
        }
        for weight in self.weights.values_mut() {
            *weight /= total;
        }
    }

    /// Heaviest position; ties resolve to the smallest position.
    pub fn argmax(&self) -> Option<Position> {
        let mut best: Option<(Position, f64)> = None;
        for (pos, weight) in &self.weights {
            if *weight <= 0.0 {
                continue;
            }
            match best {
                Some((_, best_weight)) if *weight <= best_weight => {}
                _ => best = Some((*pos, *weight)),
            }
        }
        best.map(|(pos, _)| pos)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Position, f64)> + '_ {
        self.weights.iter().map(|(pos, weight)| (*pos, *weight))
    }

    /// Positions carrying positive weight.
    pub fn support(&self) -> Vec<Position> {
        self.iter()
            .filter(|(_, weight)| *weight > 0.0)
            .map(|(pos, _)| pos)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    /// Shannon entropy in nats.
    pub fn entropy(&self) -> f64 {
        self.weights
            .values()
            .filter(|weight| **weight > 0.0)
            .map(|weight| -weight * weight.ln())
            .sum()
    }
}
