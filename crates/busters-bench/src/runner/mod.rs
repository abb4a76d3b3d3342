mod world;

pub use world::{CAPTURE_REWARD, Observation, TIME_PENALTY, World, WorldError};

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use busters_bot::agent::{AgentError, AgentOptions, BustersAgent};
use busters_core::belief::InferenceRegistry;
use busters_core::distance::Distancer;
use busters_core::model::layout::Layout;
use busters_core::observation::EmissionModel;
use rand::{RngCore, SeedableRng, rngs::StdRng};
use serde::Serialize;
use thiserror::Error;
use tracing::{Level, event};

use crate::analytics::{AnalyticsCollector, AnalyticsError, EpisodeOutcome};
use crate::config::{AgentConfig, BenchmarkConfig, LayoutLoadError, ResolvedOutputs};
use crate::logging::telemetry_dir;

/// Mixed into the episode seed so agent draws do not mirror the world's.
const AGENT_SEED_SALT: u64 = 0x9E37_79B9_7F4A_7C15;

/// Plays every configured agent through the same seeded episodes.
pub struct EpisodeRunner {
    config: BenchmarkConfig,
    outputs: ResolvedOutputs,
    layout: Layout,
    distancer: Distancer,
    emission: Arc<dyn EmissionModel>,
    registry: InferenceRegistry,
    logging_enabled: bool,
}

/// Summary details returned after a run.
#[derive(Debug)]
pub struct RunSummary {
    pub episodes: usize,
    pub agents: usize,
    pub rows_written: usize,
    pub jsonl_path: PathBuf,
    pub summary_path: PathBuf,
    pub telemetry_path: Option<PathBuf>,
}

impl EpisodeRunner {
    /// Build a runner from a validated configuration.
    pub fn new(config: BenchmarkConfig, outputs: ResolvedOutputs) -> Result<Self, RunnerError> {
        let layout = config.layout.load()?;
        if layout.num_ghosts() == 0 {
            return Err(RunnerError::NoGhosts);
        }
        let distancer = Distancer::new(&layout);
        let emission = config.emission.build();

        Ok(Self {
            logging_enabled: config.logging.enable_structured,
            config,
            outputs,
            layout,
            distancer,
            emission,
            registry: InferenceRegistry::with_defaults(),
        })
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Execute every episode for every agent, streaming JSONL rows to disk.
    pub fn run(&self) -> Result<RunSummary, RunnerError> {
        ensure_parent(self.outputs.jsonl.parent())?;
        ensure_parent(self.outputs.summary_md.parent())?;

        let mut writer = BufWriter::new(File::create(&self.outputs.jsonl)?);
        let mut rng = StdRng::seed_from_u64(self.config.episodes.seed.unwrap_or(0));
        let mut rows_written = 0usize;
        let mut analytics = AnalyticsCollector::new(&self.config);

        for episode_index in 0..self.config.episodes.count {
            let episode_seed = rng.next_u64();

            for agent in &self.config.agents {
                let result = self.play_episode(episode_index, episode_seed, agent)?;
                analytics.record_episode(&result.outcome)?;
                write_episode_row(
                    &mut writer,
                    &self.config.run_id,
                    episode_seed,
                    agent,
                    self.layout.num_ghosts(),
                    &result,
                )?;
                rows_written += 1;
            }
        }

        writer.flush()?;

        let summary = analytics.finalize();
        summary.write_markdown(&self.outputs.summary_md)?;

        let telemetry_path = if self.logging_enabled {
            Some(telemetry_dir(&self.outputs).join("telemetry.jsonl"))
        } else {
            None
        };

        Ok(RunSummary {
            episodes: self.config.episodes.count,
            agents: self.config.agents.len(),
            rows_written,
            jsonl_path: self.outputs.jsonl.clone(),
            summary_path: self.outputs.summary_md.clone(),
            telemetry_path,
        })
    }

    /// One agent, one episode. The world draws from `episode_seed` alone, so every
    /// agent faces the same opening and sonar stream until their trajectories diverge.
    pub fn play_episode(
        &self,
        episode_index: usize,
        episode_seed: u64,
        agent: &AgentConfig,
    ) -> Result<EpisodeResult, RunnerError> {
        let options = AgentOptions {
            inference: agent.inference.clone(),
            observe_enable: agent.observe,
            elapse_time_enable: agent.elapse_time,
            emission: self.config.emission,
            seed: Some(episode_seed ^ AGENT_SEED_SALT),
        };
        let mut pacman = BustersAgent::new(
            agent.policy.spawn(),
            self.layout.num_ghosts(),
            &options,
            &self.registry,
        )
        .map_err(|source| RunnerError::Agent {
            name: agent.name.clone(),
            source,
        })?;

        let mut world = World::new(&self.layout, &self.distancer, self.emission.as_ref());
        let mut world_rng = StdRng::seed_from_u64(episode_seed);

        let opening = world.observe(&mut world_rng);
        pacman.register_initial_state(&world.view(&opening));

        let mut metrics = DecisionMetrics::default();
        let mut turns = 0usize;
        while turns < self.config.episodes.max_turns && !world.all_captured() {
            let observation = world.observe(&mut world_rng);
            let start = Instant::now();
            let action = pacman
                .get_action(&world.view(&observation))
                .map_err(|source| RunnerError::Agent {
                    name: agent.name.clone(),
                    source,
                })?;
            metrics.record(start.elapsed());

            world
                .apply_pacman(action)
                .map_err(|source| RunnerError::World {
                    name: agent.name.clone(),
                    turn: turns,
                    source,
                })?;
            turns += 1;

            if !world.all_captured() {
                world.move_ghosts(&mut world_rng);
            }
        }

        let won = world.all_captured();
        if self.logging_enabled && tracing::enabled!(Level::INFO) {
            event!(
                target: "busters_bench::episode",
                Level::INFO,
                run_id = %self.config.run_id,
                episode_index = episode_index as u32,
                agent = %agent.name,
                policy = pacman.policy_name(),
                turns = turns as u32,
                captures = world.captures() as u32,
                score = world.score(),
                won
            );
        }

        Ok(EpisodeResult {
            outcome: EpisodeOutcome {
                episode_index,
                agent: agent.name.clone(),
                turns,
                score: world.score(),
                captures: world.captures(),
                won,
                total_ms: metrics.total_ms(),
                decisions: metrics.decisions,
            },
            average_ms_per_decision: metrics.average_ms(),
        })
    }
}

fn ensure_parent(path: Option<&Path>) -> Result<(), RunnerError> {
    if let Some(dir) = path.filter(|dir| !dir.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }
    Ok(())
}

fn write_episode_row(
    writer: &mut BufWriter<File>,
    run_id: &str,
    episode_seed: u64,
    agent: &AgentConfig,
    ghosts: usize,
    result: &EpisodeResult,
) -> Result<(), RunnerError> {
    let outcome = &result.outcome;
    let row = EpisodeLogRow {
        run_id: run_id.to_string(),
        episode_id: format!("E{:05}", outcome.episode_index),
        episode_index: outcome.episode_index,
        episode_seed,
        agent: agent.name.clone(),
        policy: agent.policy.label(),
        inference: agent.inference.clone(),
        turns: outcome.turns,
        captures: outcome.captures,
        ghosts,
        won: outcome.won,
        score: outcome.score,
        speed_ms_turn: result.average_ms_per_decision,
        decisions: outcome.decisions,
    };

    serde_json::to_writer(&mut *writer, &row)?;
    writer.write_all(b"\n")?;
    Ok(())
}

#[derive(Debug, Clone)]
pub struct EpisodeResult {
    pub outcome: EpisodeOutcome,
    pub average_ms_per_decision: f64,
}

#[derive(Default)]
struct DecisionMetrics {
    total: Duration,
    decisions: u64,
}

impl DecisionMetrics {
    fn record(&mut self, duration: Duration) {
        self.total += duration;
        self.decisions += 1;
    }

    fn total_ms(&self) -> f64 {
        self.total.as_secs_f64() * 1000.0
    }

    fn average_ms(&self) -> f64 {
        if self.decisions == 0 {
            0.0
        } else {
            self.total_ms() / self.decisions as f64
        }
    }
}

#[derive(Serialize)]
struct EpisodeLogRow {
    run_id: String,
    episode_id: String,
    episode_index: usize,
    episode_seed: u64,
    agent: String,
    policy: &'static str,
    inference: String,
    turns: usize,
    captures: usize,
    ghosts: usize,
    won: bool,
    score: i64,
    speed_ms_turn: f64,
    decisions: u64,
}

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
    #[error("failed to serialize log row: {source}")]
    Serialize {
        #[from]
        source: serde_json::Error,
    },
    #[error("failed to load layout: {0}")]
    Layout(#[from] LayoutLoadError),
    #[error("layout contains no ghosts to hunt")]
    NoGhosts,
    #[error("agent '{name}' failed: {source}")]
    Agent {
        name: String,
        #[source]
        source: AgentError,
    },
    #[error("agent '{name}' broke the rules on turn {turn}: {source}")]
    World {
        name: String,
        turn: usize,
        #[source]
        source: WorldError,
    },
    #[error("analytics error: {0}")]
    Analytics(#[from] AnalyticsError),
}
