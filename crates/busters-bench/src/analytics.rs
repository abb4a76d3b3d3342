use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::Serialize;
use statrs::distribution::{ContinuousCDF, Normal};
use statrs::statistics::Statistics;
use thiserror::Error;

use crate::config::BenchmarkConfig;

#[derive(Debug, Error)]
pub enum AnalyticsError {
    #[error("agent '{0}' defined in results but missing from configuration")]
    UnknownAgent(String),
    #[error("{context}: {source}")]
    Io {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },
}

/// Outcome of one agent playing one episode.
#[derive(Debug, Clone, PartialEq)]
pub struct EpisodeOutcome {
    pub episode_index: usize,
    pub agent: String,
    pub turns: usize,
    pub score: i64,
    pub captures: usize,
    pub won: bool,
    pub total_ms: f64,
    pub decisions: u64,
}

pub struct AnalyticsCollector {
    baseline: Option<String>,
    agents: HashMap<String, AgentAccumulator>,
    agent_order: Vec<String>,
    /// Baseline score per episode index.
    baseline_scores: HashMap<usize, f64>,
    /// Buffered (agent, episode, score) for agents seen before their baseline episode.
    pending: Vec<(String, usize, f64)>,
}

impl AnalyticsCollector {
    pub fn new(config: &BenchmarkConfig) -> Self {
        let mut agents = HashMap::new();
        let mut order = Vec::new();
        for agent in &config.agents {
            agents.insert(
                agent.name.clone(),
                AgentAccumulator::new(agent.name.clone(), agent.policy.label()),
            );
            order.push(agent.name.clone());
        }

        Self {
            baseline: config.metrics.baseline.clone(),
            agents,
            agent_order: order,
            baseline_scores: HashMap::new(),
            pending: Vec::new(),
        }
    }

    pub fn record_episode(&mut self, outcome: &EpisodeOutcome) -> Result<(), AnalyticsError> {
        let acc = self
            .agents
            .get_mut(&outcome.agent)
            .ok_or_else(|| AnalyticsError::UnknownAgent(outcome.agent.clone()))?;
        acc.record(outcome);

        let score = outcome.score as f64;
        if self.baseline.as_deref() == Some(outcome.agent.as_str()) {
            self.baseline_scores.insert(outcome.episode_index, score);
        } else if self.baseline.is_some() {
            self.pending
                .push((outcome.agent.clone(), outcome.episode_index, score));
        }
        Ok(())
    }

    pub fn finalize(mut self) -> AnalyticsSummary {
        let mut diffs: HashMap<String, Vec<f64>> = HashMap::new();
        for (agent, episode, score) in self.pending.drain(..) {
            if let Some(base) = self.baseline_scores.get(&episode) {
                diffs.entry(agent).or_default().push(score - base);
            }
        }

        let baseline_mean = self
            .baseline
            .as_ref()
            .and_then(|name| self.agents.get(name))
            .map(|acc| mean_or_zero(&acc.scores));

        let mut reports = Vec::new();
        for name in &self.agent_order {
            let Some(acc) = self.agents.remove(name) else {
                continue;
            };
            let is_baseline = self.baseline.as_deref() == Some(name.as_str());
            let comparison = match (&self.baseline, diffs.remove(name)) {
                (Some(_), _) if is_baseline => Some(ComparisonReport {
                    p_value: 1.0,
                    sample_size: acc.scores.len(),
                }),
                (Some(_), Some(paired)) => Some(paired_comparison(&paired)),
                (Some(_), None) => Some(ComparisonReport {
                    p_value: 1.0,
                    sample_size: 0,
                }),
                (None, _) => None,
            };
            let mut report = acc.into_report();
            if let Some(base) = baseline_mean {
                report.delta_vs_baseline = Some(report.mean_score - base);
            }
            report.comparison = comparison;
            reports.push(report);
        }

        AnalyticsSummary {
            baseline: self.baseline,
            agents: reports,
        }
    }
}

struct AgentAccumulator {
    name: String,
    policy: &'static str,
    turns: Vec<f64>,
    scores: Vec<f64>,
    captures: usize,
    wins: usize,
    total_ms: f64,
    decisions: u64,
}

impl AgentAccumulator {
    fn new(name: String, policy: &'static str) -> Self {
        Self {
            name,
            policy,
            turns: Vec::new(),
            scores: Vec::new(),
            captures: 0,
            wins: 0,
            total_ms: 0.0,
            decisions: 0,
        }
    }

    fn record(&mut self, outcome: &EpisodeOutcome) {
        self.turns.push(outcome.turns as f64);
        self.scores.push(outcome.score as f64);
        self.captures += outcome.captures;
        if outcome.won {
            self.wins += 1;
        }
        self.total_ms += outcome.total_ms;
        self.decisions += outcome.decisions;
    }

    fn into_report(self) -> AgentReport {
        let episodes = self.scores.len();
        let win_rate = if episodes == 0 {
            0.0
        } else {
            self.wins as f64 / episodes as f64
        };
        let average_ms_per_decision = if self.decisions == 0 {
            0.0
        } else {
            self.total_ms / self.decisions as f64
        };

        AgentReport {
            name: self.name,
            policy: self.policy,
            episodes,
            wins: self.wins,
            win_rate,
            captures: self.captures,
            mean_turns: mean_or_zero(&self.turns),
            std_turns: std_or_zero(&self.turns),
            mean_score: mean_or_zero(&self.scores),
            std_score: std_or_zero(&self.scores),
            average_ms_per_decision,
            delta_vs_baseline: None,
            comparison: None,
        }
    }
}

fn mean_or_zero(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().mean()
    }
}

fn std_or_zero(values: &[f64]) -> f64 {
    if values.len() < 2 {
        0.0
    } else {
        values.iter().std_dev()
    }
}

/// Two-sided paired z-test on per-episode score differences.
fn paired_comparison(diffs: &[f64]) -> ComparisonReport {
    let n = diffs.len();
    let std = std_or_zero(diffs);
    if n < 2 || std <= f64::EPSILON {
        let mean = mean_or_zero(diffs);
        let p_value = if n >= 2 && mean.abs() > f64::EPSILON {
            0.0
        } else {
            1.0
        };
        return ComparisonReport {
            p_value,
            sample_size: n,
        };
    }

    let z = mean_or_zero(diffs) / (std / (n as f64).sqrt());
    let p_value = Normal::new(0.0, 1.0)
        .map(|normal| 2.0 * (1.0 - normal.cdf(z.abs())))
        .unwrap_or(1.0);
    ComparisonReport {
        p_value: p_value.clamp(0.0, 1.0),
        sample_size: n,
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalyticsSummary {
    pub baseline: Option<String>,
    pub agents: Vec<AgentReport>,
}

impl AnalyticsSummary {
    pub fn agent(&self, name: &str) -> Option<&AgentReport> {
        self.agents.iter().find(|report| report.name == name)
    }

    pub fn write_markdown(&self, path: impl AsRef<Path>) -> Result<(), AnalyticsError> {
        let mut rows = String::new();
        rows.push_str("# Hunt Summary\n\n");
        if let Some(baseline) = &self.baseline {
            rows.push_str(&format!("Baseline: `{baseline}`\n\n"));
        }
        rows.push_str("| Agent | Policy | Episodes | Win % | Captures | Turns (mean ± std) | Score (mean ± std) | Δ vs baseline | Avg ms/decision | p-value |\n");
        rows.push_str("|-------|--------|----------|-------|----------|--------------------|--------------------|---------------|-----------------|---------|\n");

        for agent in &self.agents {
            let delta = agent
                .delta_vs_baseline
                .map(|d| format!("{d:+.2}"))
                .unwrap_or_else(|| "-".to_string());
            let p_value = agent
                .comparison
                .as_ref()
                .map(|c| format!("{:.3}", c.p_value))
                .unwrap_or_else(|| "-".to_string());

            rows.push_str(&format!(
                "| {name} | {policy} | {episodes} | {win:.1}% | {captures} | {mt:.1} ± {st:.1} | {ms:.1} ± {ss:.1} | {delta} | {latency:.3} | {p_value} |\n",
                name = agent.name,
                policy = agent.policy,
                episodes = agent.episodes,
                win = agent.win_rate * 100.0,
                captures = agent.captures,
                mt = agent.mean_turns,
                st = agent.std_turns,
                ms = agent.mean_score,
                ss = agent.std_score,
                latency = agent.average_ms_per_decision,
            ));
        }

        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| AnalyticsError::Io {
                    context: "creating summary directory",
                    source: e,
                })?;
            }
        }
        fs::write(path.as_ref(), rows).map_err(|e| AnalyticsError::Io {
            context: "writing summary markdown",
            source: e,
        })?;
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AgentReport {
    pub name: String,
    pub policy: &'static str,
    pub episodes: usize,
    pub wins: usize,
    pub win_rate: f64,
    pub captures: usize,
    pub mean_turns: f64,
    pub std_turns: f64,
    pub mean_score: f64,
    pub std_score: f64,
    pub average_ms_per_decision: f64,
    pub delta_vs_baseline: Option<f64>,
    pub comparison: Option<ComparisonReport>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ComparisonReport {
    pub p_value: f64,
    pub sample_size: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{
        AgentConfig, EpisodeConfig, LayoutConfig, LoggingConfig, MetricsConfig, OutputsConfig,
    };
    use busters_bot::policy::PolicyKind;
    use busters_core::observation::EmissionKind;
    use tempfile::tempdir;

    fn agent(name: &str, policy: PolicyKind) -> AgentConfig {
        AgentConfig {
            name: name.to_string(),
            policy,
            inference: "KeyboardInference".to_string(),
            observe: true,
            elapse_time: true,
        }
    }

    fn config(baseline: Option<&str>) -> BenchmarkConfig {
        BenchmarkConfig {
            run_id: "unit".to_string(),
            layout: LayoutConfig {
                path: None,
                inline: Some("%%%\n%P%\n%%%\n".to_string()),
            },
            episodes: EpisodeConfig {
                seed: Some(1),
                count: 3,
                max_turns: 10,
            },
            emission: EmissionKind::Sonar,
            agents: vec![
                agent("random", PolicyKind::Random),
                agent("pursuit", PolicyKind::Pursuit),
            ],
            outputs: OutputsConfig {
                jsonl: "out/{run_id}.jsonl".to_string(),
                summary_md: "out/{run_id}.md".to_string(),
            },
            metrics: MetricsConfig {
                baseline: baseline.map(str::to_string),
            },
            logging: LoggingConfig::default(),
        }
    }

    fn outcome(agent: &str, episode_index: usize, score: i64, won: bool) -> EpisodeOutcome {
        EpisodeOutcome {
            episode_index,
            agent: agent.to_string(),
            turns: 10,
            score,
            captures: usize::from(won),
            won,
            total_ms: 2.0,
            decisions: 10,
        }
    }

    #[test]
    fn summary_reports_mean_and_std() {
        let mut collector = AnalyticsCollector::new(&config(None));
        collector.record_episode(&outcome("pursuit", 0, 190, true)).expect("record");
        collector.record_episode(&outcome("pursuit", 1, 170, true)).expect("record");
        collector.record_episode(&outcome("pursuit", 2, -10, false)).expect("record");

        let summary = collector.finalize();
        let pursuit = summary.agent("pursuit").expect("pursuit report");
        assert_eq!(pursuit.episodes, 3);
        assert_eq!(pursuit.wins, 2);
        assert!((pursuit.mean_score - 116.666_666).abs() < 1e-3);
        assert!(pursuit.std_score > 0.0);
        assert!((pursuit.average_ms_per_decision - 0.2).abs() < 1e-9);
        assert!(pursuit.comparison.is_none());

        let random = summary.agent("random").expect("random report");
        assert_eq!(random.episodes, 0);
        assert_eq!(random.std_score, 0.0);
    }

    #[test]
    fn single_episode_has_zero_spread() {
        let mut collector = AnalyticsCollector::new(&config(None));
        collector.record_episode(&outcome("random", 0, -10, false)).expect("record");
        let summary = collector.finalize();
        assert_eq!(summary.agent("random").map(|r| r.std_turns), Some(0.0));
    }

    #[test]
    fn paired_diffs_against_baseline() {
        let mut collector = AnalyticsCollector::new(&config(Some("random")));
        let pursuit_scores = [190, 185, 170];
        let random_scores = [-10, 160, -10];
        for episode in 0..3 {
            collector
                .record_episode(&outcome("pursuit", episode, pursuit_scores[episode], true))
                .expect("record");
            collector
                .record_episode(&outcome("random", episode, random_scores[episode], false))
                .expect("record");
        }

        let summary = collector.finalize();
        let pursuit = summary.agent("pursuit").expect("pursuit");
        let comparison = pursuit.comparison.as_ref().expect("comparison");
        assert_eq!(comparison.sample_size, 3);
        assert!(comparison.p_value < 1.0);
        assert!(pursuit.delta_vs_baseline.unwrap_or_default() > 0.0);

        let random = summary.agent("random").expect("random");
        assert_eq!(random.delta_vs_baseline, Some(0.0));
        assert_eq!(random.comparison.as_ref().map(|c| c.p_value), Some(1.0));
    }

    #[test]
    fn unknown_agent_is_rejected() {
        let mut collector = AnalyticsCollector::new(&config(None));
        let err = collector
            .record_episode(&outcome("ghost", 0, 0, false))
            .expect_err("unknown agent");
        assert!(matches!(err, AnalyticsError::UnknownAgent(name) if name == "ghost"));
    }

    #[test]
    fn markdown_table_lists_every_agent() {
        let mut collector = AnalyticsCollector::new(&config(Some("random")));
        collector.record_episode(&outcome("random", 0, -10, false)).expect("record");
        collector.record_episode(&outcome("pursuit", 0, 180, true)).expect("record");
        let summary = collector.finalize();

        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("summary.md");
        summary.write_markdown(&path).expect("write markdown");
        let text = std::fs::read_to_string(&path).expect("read back");
        assert!(text.starts_with("# Hunt Summary"));
        assert!(text.contains("| random | random |"));
        assert!(text.contains("| pursuit | pursuit |"));
        assert!(text.contains("Baseline: `random`"));
    }
}
