use busters_bot::policy::PolicyKind;
use busters_core::belief::InferenceRegistry;
use busters_core::model::layout::{Layout, LayoutError};
use busters_core::observation::EmissionKind;
use serde::Deserialize;
use std::collections::HashSet;
use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::Level;

const DEFAULT_MAX_TURNS: usize = 500;
const DEFAULT_INFERENCE: &str = "KeyboardInference";
const RUN_ID_ALLOWED: &str = "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789._-";

/// Root benchmark configuration loaded from YAML.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct BenchmarkConfig {
    pub run_id: String,
    pub layout: LayoutConfig,
    pub episodes: EpisodeConfig,
    #[serde(default)]
    pub emission: EmissionKind,
    pub agents: Vec<AgentConfig>,
    pub outputs: OutputsConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl BenchmarkConfig {
    /// Load configuration from a YAML file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let path_buf = path.to_path_buf();
        let file = File::open(path).map_err(|source| ConfigError::Read {
            source,
            path: path_buf.clone(),
        })?;
        let reader = BufReader::new(file);
        let mut cfg: BenchmarkConfig =
            serde_yaml::from_reader(reader).map_err(|source| ConfigError::Parse {
                source,
                path: path_buf.clone(),
            })?;
        cfg.validate().map_err(|source| ConfigError::Invalid {
            path: path_buf,
            source,
        })?;
        Ok(cfg)
    }

    /// Validate the configuration without performing I/O.
    pub fn validate(&mut self) -> Result<(), ValidationError> {
        validate_run_id(&self.run_id)?;
        self.layout.validate()?;
        self.episodes.validate()?;
        self.outputs.validate(&self.run_id)?;
        validate_agents(&self.agents, &InferenceRegistry::with_defaults())?;
        self.metrics.validate(&self.agents)?;
        self.logging.normalize();
        Ok(())
    }

    /// Resolve output templates (e.g., `{run_id}` placeholders) into concrete paths.
    pub fn resolved_outputs(&self) -> ResolvedOutputs {
        ResolvedOutputs {
            jsonl: resolve_template(&self.run_id, &self.outputs.jsonl),
            summary_md: resolve_template(&self.run_id, &self.outputs.summary_md),
        }
    }
}

/// Where the maze comes from. Exactly one of the two sources must be set.
#[derive(Debug, Clone, Deserialize, PartialEq, Default)]
pub struct LayoutConfig {
    #[serde(default)]
    pub path: Option<PathBuf>,
    #[serde(default)]
    pub inline: Option<String>,
}

impl LayoutConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        match (&self.path, &self.inline) {
            (Some(_), Some(_)) => Err(ValidationError::InvalidField {
                field: "layout".to_string(),
                message: "set either layout.path or layout.inline, not both".to_string(),
            }),
            (None, None) => Err(ValidationError::InvalidField {
                field: "layout".to_string(),
                message: "layout.path or layout.inline is required".to_string(),
            }),
            (None, Some(text)) => Layout::parse(text).map(|_| ()).map_err(|err| {
                ValidationError::InvalidField {
                    field: "layout.inline".to_string(),
                    message: err.to_string(),
                }
            }),
            (Some(_), None) => Ok(()),
        }
    }

    /// Reads and parses the configured layout.
    pub fn load(&self) -> Result<Layout, LayoutLoadError> {
        if let Some(text) = self.inline.as_deref() {
            return Layout::parse(text).map_err(|source| LayoutLoadError::Parse {
                origin: "<inline>".to_string(),
                source,
            });
        }

        let path = self.path.as_ref().ok_or(LayoutLoadError::Missing)?;
        let text = fs::read_to_string(path).map_err(|source| LayoutLoadError::Read {
            path: path.clone(),
            source,
        })?;
        Layout::parse(&text).map_err(|source| LayoutLoadError::Parse {
            origin: path.display().to_string(),
            source,
        })
    }
}

/// Episode scheduling block.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct EpisodeConfig {
    pub seed: Option<u64>,
    pub count: usize,
    #[serde(default = "default_max_turns")]
    pub max_turns: usize,
}

impl EpisodeConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.count == 0 {
            return Err(ValidationError::InvalidField {
                field: "episodes.count".to_string(),
                message: "number of episodes must be greater than zero".to_string(),
            });
        }

        if self.max_turns == 0 {
            return Err(ValidationError::InvalidField {
                field: "episodes.max_turns".to_string(),
                message: "max_turns must be at least 1".to_string(),
            });
        }

        Ok(())
    }
}

fn default_max_turns() -> usize {
    DEFAULT_MAX_TURNS
}

/// Definition of a benchmark participant.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct AgentConfig {
    pub name: String,
    pub policy: PolicyKind,
    #[serde(default = "default_inference")]
    pub inference: String,
    #[serde(default = "default_enabled")]
    pub observe: bool,
    #[serde(default = "default_enabled")]
    pub elapse_time: bool,
}

fn default_inference() -> String {
    DEFAULT_INFERENCE.to_string()
}

fn default_enabled() -> bool {
    true
}

/// Output artifact configuration.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct OutputsConfig {
    pub jsonl: String,
    pub summary_md: String,
}

impl OutputsConfig {
    fn validate(&self, run_id: &str) -> Result<(), ValidationError> {
        for (label, value) in [
            ("outputs.jsonl", &self.jsonl),
            ("outputs.summary_md", &self.summary_md),
        ] {
            if value.trim().is_empty() {
                return Err(ValidationError::InvalidField {
                    field: label.to_string(),
                    message: "path must not be empty".to_string(),
                });
            }

            let resolved = resolve_template(run_id, value);
            if resolved.components().count() == 0 {
                return Err(ValidationError::InvalidField {
                    field: label.to_string(),
                    message: "resolved path is invalid".to_string(),
                });
            }
        }
        Ok(())
    }
}

/// Optional baseline used for paired score comparisons.
#[derive(Debug, Clone, Deserialize, PartialEq, Default)]
pub struct MetricsConfig {
    #[serde(default)]
    pub baseline: Option<String>,
}

impl MetricsConfig {
    fn validate(&self, agents: &[AgentConfig]) -> Result<(), ValidationError> {
        if let Some(baseline) = self.baseline.as_ref() {
            if !agents.iter().any(|a| &a.name == baseline) {
                return Err(ValidationError::InvalidField {
                    field: "metrics.baseline".to_string(),
                    message: format!("baseline agent '{baseline}' is not defined in agents list"),
                });
            }
        }
        Ok(())
    }
}

/// Logging configuration defaults to disabled structured logs.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct LoggingConfig {
    #[serde(default)]
    pub enable_structured: bool,
    #[serde(default = "default_tracing_level")]
    pub tracing_level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enable_structured: false,
            tracing_level: default_tracing_level(),
        }
    }
}

impl LoggingConfig {
    fn normalize(&mut self) {
        if self.tracing_level.trim().is_empty() {
            self.tracing_level = default_tracing_level();
        }
    }

    pub fn level(&self) -> Option<Level> {
        match self.tracing_level.to_ascii_lowercase().as_str() {
            "trace" => Some(Level::TRACE),
            "debug" => Some(Level::DEBUG),
            "info" => Some(Level::INFO),
            "warn" | "warning" => Some(Level::WARN),
            "error" => Some(Level::ERROR),
            _ => None,
        }
    }
}

fn default_tracing_level() -> String {
    "info".to_string()
}

fn validate_run_id(run_id: &str) -> Result<(), ValidationError> {
    if run_id.trim().is_empty() {
        return Err(ValidationError::InvalidField {
            field: "run_id".to_string(),
            message: "run_id must not be empty".to_string(),
        });
    }

    if !run_id.chars().all(|c| RUN_ID_ALLOWED.contains(c)) {
        return Err(ValidationError::InvalidField {
            field: "run_id".to_string(),
            message: "run_id may only contain alphanumeric characters, '.', '_' or '-'".to_string(),
        });
    }

    Ok(())
}

fn validate_agents(
    agents: &[AgentConfig],
    registry: &InferenceRegistry,
) -> Result<(), ValidationError> {
    if agents.is_empty() {
        return Err(ValidationError::InvalidField {
            field: "agents".to_string(),
            message: "at least one agent must be specified".to_string(),
        });
    }

    let mut seen = HashSet::new();
    for agent in agents {
        if agent.name.trim().is_empty() {
            return Err(ValidationError::InvalidField {
                field: "agents.name".to_string(),
                message: "agent name must not be empty".to_string(),
            });
        }

        if !agent.name.chars().all(|c| RUN_ID_ALLOWED.contains(c)) {
            return Err(ValidationError::InvalidField {
                field: format!("agents[{}].name", agent.name),
                message: "agent name contains invalid characters".to_string(),
            });
        }

        if !seen.insert(agent.name.clone()) {
            return Err(ValidationError::InvalidField {
                field: "agents".to_string(),
                message: format!("agent name '{}' defined more than once", agent.name),
            });
        }

        if !registry.contains(&agent.inference) {
            return Err(ValidationError::InvalidField {
                field: format!("agents[{}].inference", agent.name),
                message: format!(
                    "unknown inference module '{}' (known: {})",
                    agent.inference,
                    registry.names().collect::<Vec<_>>().join(", ")
                ),
            });
        }
    }

    Ok(())
}

fn resolve_template(run_id: &str, template: &str) -> PathBuf {
    let replaced = template.replace("{run_id}", run_id);
    PathBuf::from(replaced)
}

/// Fully resolved output paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedOutputs {
    pub jsonl: PathBuf,
    pub summary_md: PathBuf,
}

/// Errors surfaced when loading configuration files.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path:?}: {source}")]
    Read {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },
    #[error("failed to parse config {path:?}: {source}")]
    Parse {
        #[source]
        source: serde_yaml::Error,
        path: PathBuf,
    },
    #[error("invalid configuration in {path:?}: {source}")]
    Invalid {
        path: PathBuf,
        source: ValidationError,
    },
}

/// Validation failures captured with contextual metadata.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("{field}: {message}")]
    InvalidField { field: String, message: String },
}

#[derive(Debug, Error)]
pub enum LayoutLoadError {
    #[error("no layout source configured")]
    Missing,
    #[error("failed to read layout {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse layout {origin}: {source}")]
    Parse {
        origin: String,
        #[source]
        source: LayoutError,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASIC_YAML: &str = r#"
run_id: "hunt_smoke"
layout:
  inline: |
    %%%%%%%
    %P   G%
    %%%%%%%
episodes:
  seed: 123
  count: 4
agents:
  - name: "pursuit"
    policy: "pursuit"
  - name: "random"
    policy: "random"
    observe: false
outputs:
  jsonl: "bench/out/{run_id}/episodes.jsonl"
  summary_md: "bench/out/{run_id}/summary.md"
metrics:
  baseline: "random"
logging:
  enable_structured: true
  tracing_level: "debug"
"#;

    #[test]
    fn loads_and_validates_basic_config() {
        let mut cfg: BenchmarkConfig = serde_yaml::from_str(BASIC_YAML).expect("parse yaml");
        cfg.validate().expect("validate");

        assert_eq!(cfg.episodes.max_turns, DEFAULT_MAX_TURNS);
        assert_eq!(cfg.emission, EmissionKind::Sonar);
        assert_eq!(cfg.agents[0].inference, DEFAULT_INFERENCE);
        assert!(cfg.agents[0].observe && cfg.agents[0].elapse_time);
        assert!(!cfg.agents[1].observe);
        assert!(cfg.logging.enable_structured);
        assert_eq!(cfg.logging.level(), Some(Level::DEBUG));

        let layout = cfg.layout.load().expect("inline layout");
        assert_eq!(layout.num_ghosts(), 1);

        let outputs = cfg.resolved_outputs();
        assert_eq!(
            outputs.jsonl,
            PathBuf::from("bench/out/hunt_smoke/episodes.jsonl")
        );
    }

    #[test]
    fn rejects_unknown_inference_module() {
        let yaml = BASIC_YAML.replace(
            "    policy: \"pursuit\"\n",
            "    policy: \"pursuit\"\n    inference: \"ExactInference\"\n",
        );
        let mut cfg: BenchmarkConfig = serde_yaml::from_str(&yaml).expect("parse");
        let err = cfg.validate().expect_err("unknown module");
        assert!(matches!(
            err,
            ValidationError::InvalidField { field, .. } if field == "agents[pursuit].inference"
        ));
    }

    #[test]
    fn rejects_unknown_policy_at_parse_time() {
        let yaml = BASIC_YAML.replace("policy: \"random\"", "policy: \"keyboard\"");
        assert!(serde_yaml::from_str::<BenchmarkConfig>(&yaml).is_err());
    }

    #[test]
    fn rejects_duplicate_agents() {
        let yaml = BASIC_YAML.replace("name: \"random\"", "name: \"pursuit\"");
        let mut cfg: BenchmarkConfig = serde_yaml::from_str(&yaml).expect("parse");
        let err = cfg.validate().expect_err("duplicate agents should fail");
        assert!(matches!(
            err,
            ValidationError::InvalidField { field, .. } if field == "agents"
        ));
    }

    #[test]
    fn rejects_missing_baseline_agent() {
        let yaml = BASIC_YAML.replace("baseline: \"random\"", "baseline: \"greedy\"");
        let mut cfg: BenchmarkConfig = serde_yaml::from_str(&yaml).expect("parse");
        let err = cfg.validate().expect_err("baseline not defined");
        assert!(matches!(
            err,
            ValidationError::InvalidField { field, .. } if field == "metrics.baseline"
        ));
    }

    #[test]
    fn rejects_invalid_run_id() {
        let yaml = BASIC_YAML.replace("hunt_smoke", "hunt smoke");
        let mut cfg: BenchmarkConfig = serde_yaml::from_str(&yaml).expect("parse");
        let err = cfg.validate().expect_err("invalid run id");
        assert!(matches!(
            err,
            ValidationError::InvalidField { field, .. } if field == "run_id"
        ));
    }

    #[test]
    fn rejects_zero_episodes() {
        let yaml = BASIC_YAML.replace("count: 4", "count: 0");
        let mut cfg: BenchmarkConfig = serde_yaml::from_str(&yaml).expect("parse");
        let err = cfg.validate().expect_err("zero episodes");
        assert!(matches!(
            err,
            ValidationError::InvalidField { field, .. } if field == "episodes.count"
        ));
    }

    #[test]
    fn layout_requires_exactly_one_source() {
        let yaml = BASIC_YAML.replace(
            "layout:\n",
            "layout:\n  path: \"layouts/smallHunt.lay\"\n",
        );
        let mut cfg: BenchmarkConfig = serde_yaml::from_str(&yaml).expect("parse");
        let err = cfg.validate().expect_err("two sources");
        assert!(matches!(
            err,
            ValidationError::InvalidField { field, .. } if field == "layout"
        ));
    }

    #[test]
    fn inline_layout_errors_surface_during_validation() {
        let yaml = BASIC_YAML.replace("%P   G%", "%X   G%");
        let mut cfg: BenchmarkConfig = serde_yaml::from_str(&yaml).expect("parse");
        let err = cfg.validate().expect_err("bad glyph");
        assert!(matches!(
            err,
            ValidationError::InvalidField { field, .. } if field == "layout.inline"
        ));
    }
}
