use super::{FeasibilityInference, InferenceModule};
use crate::observation::EmissionModel;
use core::fmt;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Builds the tracker for one adversary.
pub type InferenceFactory = fn(usize, Arc<dyn EmissionModel>) -> Box<dyn InferenceModule>;

/// Identifier-to-factory table, resolved once when an agent is constructed.
#[derive(Clone)]
pub struct InferenceRegistry {
    factories: BTreeMap<String, InferenceFactory>,
}

impl InferenceRegistry {
    pub fn empty() -> Self {
        Self {
            factories: BTreeMap::new(),
        }
    }

    /// Registry holding the built-in modules.
    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();
        registry.register("KeyboardInference", feasibility_factory);
        registry.register("feasibility", feasibility_factory);
        registry
    }

    /// Later registrations under the same name replace earlier ones.
    pub fn register(&mut self, name: impl Into<String>, factory: InferenceFactory) {
        self.factories.insert(name.into(), factory);
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    pub fn resolve(&self, name: &str) -> Result<InferenceFactory, InferenceError> {
        self.factories
            .get(name)
            .copied()
            .ok_or_else(|| InferenceError::UnknownModule {
                name: name.to_string(),
                known: self.factories.keys().cloned().collect(),
            })
    }

    pub fn build(
        &self,
        name: &str,
        ghost_index: usize,
        emission: Arc<dyn EmissionModel>,
    ) -> Result<Box<dyn InferenceModule>, InferenceError> {
        let factory = self.resolve(name)?;
        Ok(factory(ghost_index, emission))
    }
}

impl Default for InferenceRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl fmt::Debug for InferenceRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InferenceRegistry")
            .field("modules", &self.factories.keys().collect::<Vec<_>>())
            .finish()
    }
}

fn feasibility_factory(
    ghost_index: usize,
    emission: Arc<dyn EmissionModel>,
) -> Box<dyn InferenceModule> {
    Box::new(FeasibilityInference::new(ghost_index, emission))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InferenceError {
    UnknownModule { name: String, known: Vec<String> },
}

impl fmt::Display for InferenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InferenceError::UnknownModule { name, known } => write!(
                f,
                "unknown inference module '{name}' (known: {})",
                known.join(", ")
            ),
        }
    }
}

impl std::error::Error for InferenceError {}
