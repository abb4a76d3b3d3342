//! Agent loop: keeps one belief tracker per adversary current and delegates the move.

use crate::policy::{DecisionError, Policy, PolicyContext};
use busters_core::belief::{BeliefDistribution, InferenceError, InferenceModule, InferenceRegistry};
use busters_core::distance::Distancer;
use busters_core::model::direction::Direction;
use busters_core::model::view::GameView;
use busters_core::observation::EmissionKind;
use core::fmt;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{Level, event};

/// Construction-time knobs for [`BustersAgent`].
#[derive(Debug, Clone, PartialEq)]
pub struct AgentOptions {
    /// Registry identifier of the inference module used for every adversary.
    pub inference: String,
    pub observe_enable: bool,
    pub elapse_time_enable: bool,
    pub emission: EmissionKind,
    /// `None` seeds from entropy.
    pub seed: Option<u64>,
}

impl Default for AgentOptions {
    fn default() -> Self {
        Self {
            inference: "KeyboardInference".to_string(),
            observe_enable: true,
            elapse_time_enable: true,
            emission: EmissionKind::Sonar,
            seed: None,
        }
    }
}

impl AgentOptions {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

pub struct BustersAgent {
    policy: Box<dyn Policy>,
    modules: Vec<Box<dyn InferenceModule>>,
    beliefs: Vec<BeliefDistribution>,
    observe_enable: bool,
    elapse_time_enable: bool,
    first_move: bool,
    registered: bool,
    distancer: Option<Distancer>,
    rng: StdRng,
    turns: u64,
}

impl BustersAgent {
    /// Resolves the inference module once; an unknown identifier is fatal here.
    pub fn new(
        policy: Box<dyn Policy>,
        num_ghosts: usize,
        options: &AgentOptions,
        registry: &InferenceRegistry,
    ) -> Result<Self, AgentError> {
        let factory = registry.resolve(&options.inference)?;
        let emission = options.emission.build();
        let modules = (0..num_ghosts)
            .map(|index| factory(index, emission.clone()))
            .collect();
        let rng = match options.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Ok(Self {
            policy,
            modules,
            beliefs: Vec::new(),
            observe_enable: options.observe_enable,
            elapse_time_enable: options.elapse_time_enable,
            first_move: true,
            registered: false,
            distancer: None,
            rng,
            turns: 0,
        })
    }

    /// Seeds every tracker and precomputes maze distances for the layout.
    pub fn register_initial_state(&mut self, view: &GameView<'_>) {
        for module in &mut self.modules {
            module.initialize(view);
        }
        self.snapshot_beliefs();
        self.distancer = Some(Distancer::new(view.layout));
        self.first_move = true;
        self.registered = true;
        self.turns = 0;
    }

    /// Updates beliefs (predict, then correct), then asks the policy for a move.
    pub fn get_action(&mut self, view: &GameView<'_>) -> Result<Direction, AgentError> {
        if !self.registered {
            return Err(AgentError::NotRegistered);
        }

        for module in &mut self.modules {
            if !self.first_move && self.elapse_time_enable {
                module.elapse_time(view);
            }
            if self.observe_enable {
                module.observe_state(view);
            }
        }
        self.first_move = false;
        self.snapshot_beliefs();

        let mut ctx = PolicyContext::new(*view).with_beliefs(&self.beliefs);
        if let Some(distancer) = self.distancer.as_ref() {
            ctx = ctx.with_distancer(distancer);
        }
        let action = self.policy.choose_action(&ctx, &mut self.rng)?;
        self.turns += 1;

        if tracing::enabled!(Level::DEBUG) {
            let entropies: Vec<String> = self
                .beliefs
                .iter()
                .map(|belief| format!("{:.3}", belief.entropy()))
                .collect();
            event!(
                target: "busters_bot::agent",
                Level::DEBUG,
                turn = self.turns,
                policy = self.policy.name(),
                position = %view.pacman_position,
                action = %action,
                belief_entropy = %entropies.join(",")
            );
        }

        Ok(action)
    }

    pub fn beliefs(&self) -> &[BeliefDistribution] {
        &self.beliefs
    }

    pub fn policy_name(&self) -> &'static str {
        self.policy.name()
    }

    pub fn distancer(&self) -> Option<&Distancer> {
        self.distancer.as_ref()
    }

    pub fn turns(&self) -> u64 {
        self.turns
    }

    fn snapshot_beliefs(&mut self) {
        self.beliefs = self
            .modules
            .iter()
            .map(|module| module.belief_distribution().clone())
            .collect();
    }
}

impl fmt::Debug for BustersAgent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BustersAgent")
            .field("policy", &self.policy.name())
            .field("modules", &self.modules.len())
            .field("observe_enable", &self.observe_enable)
            .field("elapse_time_enable", &self.elapse_time_enable)
            .field("turns", &self.turns)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgentError {
    Inference(InferenceError),
    Decision(DecisionError),
    /// `get_action` was called before `register_initial_state`.
    NotRegistered,
}

impl fmt::Display for AgentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AgentError::Inference(err) => write!(f, "inference setup failed: {err}"),
            AgentError::Decision(err) => write!(f, "decision failed: {err}"),
            AgentError::NotRegistered => f.write_str("agent has not seen its initial state"),
        }
    }
}

impl std::error::Error for AgentError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AgentError::Inference(err) => Some(err),
            AgentError::Decision(err) => Some(err),
            AgentError::NotRegistered => None,
        }
    }
}

impl From<InferenceError> for AgentError {
    fn from(err: InferenceError) -> Self {
        AgentError::Inference(err)
    }
}

impl From<DecisionError> for AgentError {
    fn from(err: DecisionError) -> Self {
        AgentError::Decision(err)
    }
}
