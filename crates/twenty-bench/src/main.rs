use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;

use twenty_bench::config::{BenchmarkConfig, ResolvedOutputs};
use twenty_bench::logging::init_logging;
use twenty_bench::runner::SimulationRunner;

/// Batch simulation harness for the twenty-questions guessers.
#[derive(Debug, Parser)]
#[command(
    name = "twenty-bench",
    author,
    version,
    about = "Deterministic twenty-questions simulation harness"
)]
struct Cli {
    /// Path to the YAML configuration file.
    #[arg(short, long, value_name = "FILE", default_value = "bench/bench.yaml")]
    config: PathBuf,

    /// Override the run identifier (substitutes {run_id} templates).
    #[arg(long, value_name = "RUN_ID")]
    run_id: Option<String>,

    /// Override the number of trials to simulate.
    #[arg(long, value_name = "COUNT")]
    trials: Option<usize>,

    /// Override the RNG seed for target selection and answer noise.
    #[arg(long, value_name = "SEED")]
    seed: Option<u64>,

    /// Override the per-session turn budget.
    #[arg(long, value_name = "TURNS")]
    budget: Option<u32>,

    /// Exit after validating the configuration (no trials are run).
    #[arg(long)]
    validate_only: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = BenchmarkConfig::from_path(&cli.config)?;

    if let Some(run_id) = cli.run_id {
        config.run_id = run_id;
    }

    if let Some(trials) = cli.trials {
        config.trials.count = trials;
    }

    if let Some(seed) = cli.seed {
        config.trials.seed = Some(seed);
    }

    if let Some(budget) = cli.budget {
        config.trials.question_budget = budget;
    }

    config.validate()?;

    let outputs: ResolvedOutputs = config.resolved_outputs();
    let agent_count = config.agents.len();
    let run_id = config.run_id.clone();
    let trials = config.trials.count;
    let budget = config.trials.question_budget;

    println!(
        "Loaded configuration '{run_id}' with {agent_count} agent{} ({trials} trials, {budget}-turn budget)",
        if agent_count == 1 { "" } else { "s" }
    );

    let _logging_guard = init_logging(&config.logging, &outputs)?;
    let kb_path = config.knowledge_base.clone();
    let runner = SimulationRunner::new(config, outputs)
        .with_context(|| format!("preparing simulation over {}", kb_path.display()))?;
    println!(
        "Knowledge base: {} entities, {} attributes",
        runner.knowledge().len(),
        runner.knowledge().attribute_count()
    );

    if cli.validate_only {
        println!("Validation-only mode: simulation skipped.");
        return Ok(());
    }

    let summary = runner.run()?;
    println!(
        "Simulation complete for '{run_id}': {} trials × {} agents → {} rows at {}",
        summary.trials_played,
        summary.agents,
        summary.rows_written,
        summary.jsonl_path.display()
    );
    println!("Summary table: {}", summary.summary_path.display());
    if let Some(plot_path) = summary.plot_path.as_ref() {
        println!("Success-rate plot: {}", plot_path.display());
    }
    if let Some(telemetry_path) = summary.telemetry_path.as_ref() {
        println!("Telemetry log: {}", telemetry_path.display());
    }

    Ok(())
}
