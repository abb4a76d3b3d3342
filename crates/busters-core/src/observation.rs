//! Sonar emission models and the feasibility test built on them.

use crate::model::position::Position;
use core::fmt;
use core::str::FromStr;
use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Largest absolute sonar error.
pub const SONAR_MAX: i64 = 7;
/// Sum of the integer weights `2^(SONAR_MAX - |e|)` over every error `e`.
const SONAR_DENOMINATOR: u32 = 382;

/// Likelihood of a noisy distance reading given the true distance.
pub trait EmissionModel: Send + Sync + fmt::Debug {
    fn probability(&self, noisy: u32, true_distance: u32) -> f64;

    /// Draws a noisy reading for `true_distance`.
    fn sample(&self, true_distance: u32, rng: &mut dyn RngCore) -> u32;
}

/// Classic sonar: errors in `-7..=7`, weight halving with every step away from zero.
#[derive(Debug, Default, Clone, Copy)]
pub struct SonarNoise;

impl SonarNoise {
    fn weight(error: i64) -> u32 {
        1u32 << (SONAR_MAX - error.abs())
    }

    pub fn noise_values() -> impl Iterator<Item = i64> {
        -SONAR_MAX..=SONAR_MAX
    }

    pub fn noise_probability(error: i64) -> f64 {
        if error.abs() > SONAR_MAX {
            return 0.0;
        }
        f64::from(Self::weight(error)) / f64::from(SONAR_DENOMINATOR)
    }
}

impl EmissionModel for SonarNoise {
    fn probability(&self, noisy: u32, true_distance: u32) -> f64 {
        let noisy = i64::from(noisy);
        let target = i64::from(true_distance);
        Self::noise_values()
            .filter(|error| (noisy - error).max(1) == target)
            .map(Self::noise_probability)
            .sum()
    }

    fn sample(&self, true_distance: u32, rng: &mut dyn RngCore) -> u32 {
        let mut roll = rng.gen_range(0..SONAR_DENOMINATOR);
        let mut error = SONAR_MAX;
        for candidate in Self::noise_values() {
            let weight = Self::weight(candidate);
            if roll < weight {
                error = candidate;
                break;
            }
            roll -= weight;
        }
        (i64::from(true_distance) + error).max(0) as u32
    }
}

/// Noiseless sonar: the reading is the true distance.
#[derive(Debug, Default, Clone, Copy)]
pub struct ExactSonar;

impl EmissionModel for ExactSonar {
    fn probability(&self, noisy: u32, true_distance: u32) -> f64 {
        if noisy == true_distance { 1.0 } else { 0.0 }
    }

    fn sample(&self, true_distance: u32, _rng: &mut dyn RngCore) -> u32 {
        true_distance
    }
}

/// Treats any positive emission likelihood as full admissibility.
#[derive(Debug, Clone)]
pub struct ObservationModel {
    emission: Arc<dyn EmissionModel>,
}

impl ObservationModel {
    pub fn new(emission: Arc<dyn EmissionModel>) -> Self {
        Self { emission }
    }

    /// A missing reading admits no position.
    pub fn is_feasible(&self, reading: Option<u32>, candidate: Position, observer: Position) -> bool {
        let Some(noisy) = reading else {
            return false;
        };
        self.emission
            .probability(noisy, candidate.manhattan(observer))
            > 0.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmissionKind {
    #[default]
    Sonar,
    Exact,
}

impl EmissionKind {
    pub fn build(self) -> Arc<dyn EmissionModel> {
        match self {
            EmissionKind::Sonar => Arc::new(SonarNoise),
            EmissionKind::Exact => Arc::new(ExactSonar),
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            EmissionKind::Sonar => "sonar",
            EmissionKind::Exact => "exact",
        }
    }
}

impl fmt::Display for EmissionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseEmissionError(String);

impl fmt::Display for ParseEmissionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown emission model '{}'", self.0)
    }
}

impl std::error::Error for ParseEmissionError {}

impl FromStr for EmissionKind {
    type Err = ParseEmissionError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "sonar" | "noisy" => Ok(EmissionKind::Sonar),
            "exact" | "noiseless" => Ok(EmissionKind::Exact),
            _ => Err(ParseEmissionError(raw.to_string())),
        }
    }
}
