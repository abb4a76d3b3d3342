use std::path::PathBuf;

use clap::Parser;

use busters_bench::config::{BenchmarkConfig, ResolvedOutputs};
use busters_bench::logging::init_logging;
use busters_bench::runner::EpisodeRunner;
use busters_core::AppInfo;

/// Episode benchmarking harness for ghost-hunting agents.
#[derive(Debug, Parser)]
#[command(
    name = "busters-bench",
    author,
    version,
    about = "Deterministic ghost-hunt episode harness"
)]
struct Cli {
    /// Path to the YAML configuration file.
    #[arg(short, long, value_name = "FILE", default_value = "bench/bench.yaml")]
    config: PathBuf,

    /// Override the run identifier (substitutes {run_id} templates).
    #[arg(long, value_name = "RUN_ID")]
    run_id: Option<String>,

    /// Override the number of episodes per agent.
    #[arg(long, value_name = "EPISODES")]
    episodes: Option<usize>,

    /// Override the master RNG seed.
    #[arg(long, value_name = "SEED")]
    seed: Option<u64>,

    /// Override the turn limit per episode.
    #[arg(long, value_name = "TURNS")]
    max_turns: Option<usize>,

    /// Exit after validating the configuration (no episodes are played).
    #[arg(long)]
    validate_only: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = BenchmarkConfig::from_path(&cli.config)?;

    if let Some(run_id) = cli.run_id {
        config.run_id = run_id;
    }

    if let Some(episodes) = cli.episodes {
        config.episodes.count = episodes;
    }

    if let Some(seed) = cli.seed {
        config.episodes.seed = Some(seed);
    }

    if let Some(max_turns) = cli.max_turns {
        config.episodes.max_turns = max_turns;
    }

    config.validate()?;

    let outputs: ResolvedOutputs = config.resolved_outputs();
    let agent_count = config.agents.len();
    let run_id = config.run_id.clone();
    let episodes = config.episodes.count;
    let max_turns = config.episodes.max_turns;

    println!(
        "{} {} ({})",
        AppInfo::name(),
        AppInfo::version(),
        AppInfo::codename()
    );
    println!(
        "Loaded configuration '{run_id}' with {agent_count} agent{} ({episodes} episodes, {max_turns} max turns)",
        if agent_count == 1 { "" } else { "s" }
    );

    let _logging_guard = init_logging(&config.logging, &outputs)?;
    let runner = EpisodeRunner::new(config, outputs)?;
    println!(
        "Layout: {}x{} with {} ghost{}",
        runner.layout().width(),
        runner.layout().height(),
        runner.layout().num_ghosts(),
        if runner.layout().num_ghosts() == 1 { "" } else { "s" }
    );

    if cli.validate_only {
        println!("Validation-only mode: episode execution skipped.");
        return Ok(());
    }

    let summary = runner.run()?;
    println!(
        "Run complete for '{run_id}': {} episodes × {} agents → {} rows at {}",
        summary.episodes,
        summary.agents,
        summary.rows_written,
        summary.jsonl_path.display()
    );
    println!("Summary table: {}", summary.summary_path.display());
    if let Some(telemetry_path) = summary.telemetry_path.as_ref() {
        println!("Telemetry log: {}", telemetry_path.display());
    }

    Ok(())
}
