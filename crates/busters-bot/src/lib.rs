pub mod agent;
pub mod policy;

pub use agent::{AgentError, AgentOptions, BustersAgent};
pub use policy::{
    DecisionError, GreedyPolicy, MovementHistory, Policy, PolicyContext, PolicyKind,
    PursuitBranch, PursuitPolicy, RandomPolicy, StopPolicy,
};
