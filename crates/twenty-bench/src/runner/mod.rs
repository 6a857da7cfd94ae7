mod agents;

pub use agents::AgentError;

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use rand::{Rng, RngCore, SeedableRng, rngs::StdRng};
use serde::Serialize;
use thiserror::Error;
use tracing::{Level, event, warn};
use twenty_bot::{PolicyKind, Session, SessionError, SessionState, Turn};
use twenty_core::game::oracle::SimulatedPlayer;
use twenty_core::model::knowledge::{KnowledgeBase, KnowledgeError};

use crate::analytics::{AnalyticsCollector, AnalyticsError};
use crate::config::{BenchmarkConfig, ResolvedOutputs};
use crate::logging::telemetry_dir;
use agents::AgentBlueprint;

/// Primary entry point for batch simulations.
pub struct SimulationRunner {
    config: BenchmarkConfig,
    outputs: ResolvedOutputs,
    kb: Arc<KnowledgeBase>,
    agents: Vec<AgentBlueprint>,
    logging_enabled: bool,
}

/// Summary details returned after a run.
pub struct RunSummary {
    pub trials_played: usize,
    pub agents: usize,
    pub rows_written: usize,
    pub jsonl_path: PathBuf,
    pub summary_path: PathBuf,
    pub plot_path: Option<PathBuf>,
    pub telemetry_path: Option<PathBuf>,
}

impl SimulationRunner {
    /// Build a runner from a validated configuration, loading the knowledge
    /// base it names.
    pub fn new(config: BenchmarkConfig, outputs: ResolvedOutputs) -> Result<Self, RunnerError> {
        let kb = KnowledgeBase::from_path(&config.knowledge_base)?;
        Self::with_knowledge(config, outputs, Arc::new(kb))
    }

    /// Build a runner over an already loaded knowledge base; the
    /// `knowledge_base` path in `config` is ignored.
    pub fn with_knowledge(
        config: BenchmarkConfig,
        outputs: ResolvedOutputs,
        kb: Arc<KnowledgeBase>,
    ) -> Result<Self, RunnerError> {
        if kb.is_empty() {
            return Err(RunnerError::EmptyKnowledgeBase);
        }
        let agents = AgentBlueprint::from_configs(&config.agents)?;

        Ok(Self {
            logging_enabled: config.logging.enable_structured,
            config,
            outputs,
            kb,
            agents,
        })
    }

    pub fn knowledge(&self) -> &KnowledgeBase {
        &self.kb
    }

    /// Execute every trial, streaming JSONL rows to disk.
    ///
    /// Each trial draws one hidden target and one seed from the run RNG.
    /// Every agent plays that same target with answer noise seeded from the
    /// trial seed, so results are reproducible and paired across agents.
    pub fn run(&self) -> Result<RunSummary, RunnerError> {
        ensure_parent(self.outputs.jsonl.parent())?;
        ensure_parent(self.outputs.summary_md.parent())?;
        if !self.outputs.plots_dir.as_os_str().is_empty() {
            fs::create_dir_all(&self.outputs.plots_dir)?;
        }

        let mut writer = BufWriter::new(File::create(&self.outputs.jsonl)?);
        let mut rng = StdRng::seed_from_u64(self.config.trials.seed.unwrap_or(0));
        let mut rows_written = 0usize;
        let mut analytics = AnalyticsCollector::new(&self.config)?;

        for trial_index in 0..self.config.trials.count {
            let target = self.kb.entity_name(rng.gen_range(0..self.kb.len()));
            let trial_seed = rng.next_u64();

            let mut outcomes = Vec::with_capacity(self.agents.len());
            for agent in &self.agents {
                outcomes.push(self.play_trial(trial_index, target, trial_seed, agent)?);
            }

            analytics.record_trial(trial_index, &outcomes)?;
            rows_written += write_trial_rows(
                &mut writer,
                &self.config,
                trial_index,
                trial_seed,
                &outcomes,
            )?;
        }

        writer.flush()?;

        let summary = analytics.finalize();
        summary.write_markdown(&self.outputs.summary_md)?;
        let plot_path = match summary.render_plot(&self.outputs.plots_dir) {
            Ok(path) => Some(path),
            Err(err) => {
                warn!(error = %err, "success-rate plot skipped");
                None
            }
        };

        let telemetry_path = self
            .logging_enabled
            .then(|| telemetry_dir(&self.outputs).join("telemetry.jsonl"));

        Ok(RunSummary {
            trials_played: self.config.trials.count,
            agents: self.agents.len(),
            rows_written,
            jsonl_path: self.outputs.jsonl.clone(),
            summary_path: self.outputs.summary_md.clone(),
            plot_path,
            telemetry_path,
        })
    }

    fn play_trial(
        &self,
        trial_index: usize,
        target: &str,
        trial_seed: u64,
        agent: &AgentBlueprint,
    ) -> Result<TrialOutcome, RunnerError> {
        let player = SimulatedPlayer::new(&self.kb, target, self.config.trials.noise)
            .ok_or_else(|| RunnerError::UnknownTarget(target.to_string()))?;
        let mut answer_rng = StdRng::seed_from_u64(trial_seed);
        let policy = agent.spawn_policy(self.kb.clone(), trial_seed);
        let mut session = Session::with_budget(policy, self.config.trials.question_budget);

        let start = Instant::now();
        let outcome = loop {
            match session.next_turn()? {
                Turn::Ask(attribute) => {
                    let answer = player.answer(&attribute, &mut answer_rng);
                    session.answer(answer)?;
                }
                Turn::Guess { entity, .. } => {
                    session.judge_guess(player.confirms(&entity))?;
                }
                Turn::Finished(state) => break state,
            }
        };
        let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;

        if self.logging_enabled && tracing::enabled!(Level::INFO) {
            event!(
                target: "twenty_bench::trial",
                Level::INFO,
                run_id = %self.config.run_id,
                trial_index = trial_index as u32,
                agent = %agent.name,
                entity = target,
                outcome = outcome.as_str(),
                questions = session.questions_asked(),
                guesses = session.guesses_made(),
                elapsed_ms
            );
        }

        Ok(TrialOutcome {
            agent_name: agent.name.clone(),
            kind: agent.kind,
            target: target.to_string(),
            outcome,
            questions: session.questions_asked(),
            guesses: session.guesses_made(),
            elapsed_ms,
        })
    }
}

fn ensure_parent(path: Option<&Path>) -> Result<(), RunnerError> {
    if let Some(dir) = path.filter(|dir| !dir.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }
    Ok(())
}

fn write_trial_rows(
    writer: &mut BufWriter<File>,
    config: &BenchmarkConfig,
    trial_index: usize,
    trial_seed: u64,
    outcomes: &[TrialOutcome],
) -> Result<usize, RunnerError> {
    let trial_id = format!("T{trial_index:05}");

    let mut rows_written = 0usize;
    for outcome in outcomes {
        let row = TrialLogRow {
            run_id: &config.run_id,
            trial_id: &trial_id,
            trial_index,
            trial_seed,
            target: &outcome.target,
            agent: &outcome.agent_name,
            kind: outcome.kind,
            outcome: outcome.outcome,
            solved: outcome.solved(),
            questions: outcome.questions,
            guesses: outcome.guesses,
            turns: outcome.turns(),
            budget: config.trials.question_budget,
            elapsed_ms: outcome.elapsed_ms,
        };

        serde_json::to_writer(&mut *writer, &row)?;
        writer.write_all(b"\n")?;
        rows_written += 1;
    }

    Ok(rows_written)
}

/// Result of one agent playing one trial.
#[derive(Debug, Clone)]
pub struct TrialOutcome {
    pub agent_name: String,
    pub kind: PolicyKind,
    pub target: String,
    pub outcome: SessionState,
    pub questions: u32,
    pub guesses: u32,
    pub elapsed_ms: f64,
}

impl TrialOutcome {
    pub fn solved(&self) -> bool {
        self.outcome == SessionState::Solved
    }

    pub fn turns(&self) -> u32 {
        self.questions + self.guesses
    }
}

#[derive(Serialize)]
struct TrialLogRow<'a> {
    run_id: &'a str,
    trial_id: &'a str,
    trial_index: usize,
    trial_seed: u64,
    target: &'a str,
    agent: &'a str,
    kind: PolicyKind,
    outcome: SessionState,
    solved: bool,
    questions: u32,
    guesses: u32,
    turns: u32,
    budget: u32,
    elapsed_ms: f64,
}

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("{0}")]
    Agent(#[from] AgentError),
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
    #[error(transparent)]
    Knowledge(#[from] KnowledgeError),
    #[error("knowledge base has no entities to draw targets from")]
    EmptyKnowledgeBase,
    #[error("target '{0}' is not in the knowledge base")]
    UnknownTarget(String),
    #[error("session driver misbehaved: {0}")]
    Session(#[from] SessionError),
    #[error("analytics error: {0}")]
    Analytics(#[from] AnalyticsError),
}
