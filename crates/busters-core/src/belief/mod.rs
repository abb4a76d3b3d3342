//! Belief tracking over hidden adversary positions.
//!
//! - `distribution`: the normalized weight map (`BeliefDistribution`).
//! - `inference`: the `InferenceModule` capability set and the feasibility tracker.
//! - `registry`: identifier-to-factory lookup resolved once at agent startup.

mod distribution;
mod inference;
mod registry;

pub use distribution::BeliefDistribution;
pub use inference::{FeasibilityInference, InferenceModule};
pub use registry::{InferenceError, InferenceFactory, InferenceRegistry};
