use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use tracing_subscriber::EnvFilter;
use twenty_app::console::Console;
use twenty_bot::{DEFAULT_QUESTION_BUDGET, EngineParams, PolicyKind, Session, SessionReport};
use twenty_core::model::knowledge::KnowledgeBase;

const BUNDLED_KB: &str = include_str!("../data/animals.json");

#[derive(Debug, Parser)]
#[command(
    name = "twentyq",
    author,
    version,
    about = "Think of an animal, and I will try to guess it."
)]
struct Cli {
    /// JSON knowledge base to play with. Defaults to the bundled animal catalog.
    #[arg(long, value_name = "FILE")]
    kb: Option<PathBuf>,

    /// Turns (questions plus guesses) before the game is called off.
    #[arg(
        long,
        value_name = "TURNS",
        default_value_t = DEFAULT_QUESTION_BUDGET,
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    budget: u32,

    /// Guesser to play against: bayesian or random.
    #[arg(long, value_name = "KIND", default_value = "bayesian", value_parser = parse_policy)]
    policy: PolicyKind,

    /// Seed for the random guesser.
    #[arg(long, value_name = "SEED", default_value_t = 0)]
    seed: u64,

    /// Write a JSON transcript of the game to FILE.
    #[arg(long, value_name = "FILE")]
    report: Option<PathBuf>,
}

fn parse_policy(value: &str) -> Result<PolicyKind, String> {
    PolicyKind::from_str(value)
        .ok_or_else(|| format!("unknown policy '{value}' (expected bayesian or random)"))
}

#[derive(Serialize)]
struct ConsoleReport<'a> {
    knowledge_base: &'a str,
    #[serde(flatten)]
    session: SessionReport,
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let (kb, source) = load_knowledge(cli.kb.as_deref())?;
    let policy = cli
        .policy
        .spawn(Arc::new(kb), EngineParams::from_env(), cli.seed);
    let mut session = Session::with_budget(policy, cli.budget);

    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut console = Console::new(stdin.lock(), stdout.lock());
    console
        .play(&mut session)
        .context("console session failed")?;

    if let Some(path) = cli.report.as_deref() {
        write_report(path, &source, session.report())?;
    }
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    // Only fails when a subscriber is already installed.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn load_knowledge(path: Option<&Path>) -> Result<(KnowledgeBase, String)> {
    match path {
        Some(path) => {
            let kb = KnowledgeBase::from_path(path)
                .with_context(|| format!("loading knowledge base {}", path.display()))?;
            Ok((kb, path.display().to_string()))
        }
        None => {
            let kb = KnowledgeBase::from_json_str(BUNDLED_KB)
                .context("parsing the bundled animal catalog")?;
            Ok((kb, "bundled".to_string()))
        }
    }
}

fn write_report(path: &Path, source: &str, session: SessionReport) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("creating report file {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    let report = ConsoleReport {
        knowledge_base: source,
        session,
    };
    serde_json::to_writer_pretty(&mut writer, &report)
        .with_context(|| format!("writing report to {}", path.display()))?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}
