use std::collections::{BTreeMap, HashMap};
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use plotters::prelude::*;
use serde::Serialize;
use statrs::distribution::{ContinuousCDF, Normal};
use thiserror::Error;
use twenty_bot::{PolicyKind, SessionState};

use crate::config::{AgentConfig, BenchmarkConfig};
use crate::runner::TrialOutcome;

const CONFIDENCE_Z: f64 = 1.96; // 95% CI

#[derive(Debug, Error)]
pub enum AnalyticsError {
    #[error("baseline agent '{0}' not present in simulation results")]
    MissingBaseline(String),
    #[error("agent '{0}' defined in results but missing from configuration")]
    UnknownAgent(String),
    #[error("baseline '{0}' missing for trial {1}")]
    MissingBaselineTrial(String, String),
    #[error("{context}: {source}")]
    Io {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to render plot: {0}")]
    Plot(String),
}

pub struct AnalyticsCollector {
    baseline: String,
    budget: u32,
    agents: HashMap<String, AgentAccumulator>,
    comparisons: HashMap<String, ComparisonAccumulator>,
    agent_order: Vec<String>,
}

impl AnalyticsCollector {
    pub fn new(config: &BenchmarkConfig) -> Result<Self, AnalyticsError> {
        let baseline = config
            .metrics
            .baseline
            .clone()
            .ok_or_else(|| AnalyticsError::MissingBaseline("<unset>".into()))?;

        let mut agents = HashMap::new();
        let mut order = Vec::new();
        for agent in &config.agents {
            agents.insert(agent.name.clone(), AgentAccumulator::new(agent));
            order.push(agent.name.clone());
        }

        if !agents.contains_key(&baseline) {
            return Err(AnalyticsError::MissingBaseline(baseline));
        }

        Ok(Self {
            baseline,
            budget: config.trials.question_budget,
            agents,
            comparisons: HashMap::new(),
            agent_order: order,
        })
    }

    /// Fold every agent's result for one trial into the running totals.
    pub fn record_trial(
        &mut self,
        trial_index: usize,
        outcomes: &[TrialOutcome],
    ) -> Result<(), AnalyticsError> {
        let baseline_turns = outcomes
            .iter()
            .find(|outcome| outcome.agent_name == self.baseline)
            .map(|outcome| f64::from(outcome.turns()))
            .ok_or_else(|| {
                AnalyticsError::MissingBaselineTrial(
                    self.baseline.clone(),
                    format!("T{trial_index:05}"),
                )
            })?;

        for outcome in outcomes {
            let acc = self
                .agents
                .get_mut(&outcome.agent_name)
                .ok_or_else(|| AnalyticsError::UnknownAgent(outcome.agent_name.clone()))?;
            acc.record_trial(outcome);

            if outcome.agent_name != self.baseline {
                self.comparisons
                    .entry(outcome.agent_name.clone())
                    .or_insert_with(ComparisonAccumulator::new)
                    .record(f64::from(outcome.turns()) - baseline_turns);
            }
        }

        Ok(())
    }

    pub fn finalize(mut self) -> AnalyticsSummary {
        let mut reports = Vec::new();
        for name in &self.agent_order {
            if let Some(acc) = self.agents.remove(name) {
                reports.push(acc.into_report());
            }
        }

        let mut comparisons = Vec::new();
        for report in &reports {
            let (p_value, sample_size) = if report.name == self.baseline {
                (1.0, report.trials)
            } else if let Some(comp) = self.comparisons.remove(&report.name) {
                comp.wilcoxon_signed_rank()
            } else {
                (1.0, 0)
            };
            comparisons.push(ComparisonReport {
                agent: report.name.clone(),
                p_value,
                sample_size,
            });
        }

        AnalyticsSummary {
            baseline: self.baseline,
            question_budget: self.budget,
            agents: reports,
            comparisons,
        }
        .enrich()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TargetTally {
    pub solved: usize,
    pub missed: usize,
}

struct AgentAccumulator {
    name: String,
    kind: PolicyKind,
    params: serde_yaml::Value,
    trials: usize,
    solved: usize,
    exhausted: usize,
    abandoned: usize,
    total_questions: u64,
    total_guesses: u64,
    total_ms: f64,
    per_trial_success: Vec<f64>,
    per_trial_turns: Vec<f64>,
    solved_turns: Vec<f64>,
    per_target: BTreeMap<String, TargetTally>,
}

impl AgentAccumulator {
    fn new(config: &AgentConfig) -> Self {
        Self {
            name: config.name.clone(),
            kind: config.kind,
            params: config.params.clone(),
            trials: 0,
            solved: 0,
            exhausted: 0,
            abandoned: 0,
            total_questions: 0,
            total_guesses: 0,
            total_ms: 0.0,
            per_trial_success: Vec::new(),
            per_trial_turns: Vec::new(),
            solved_turns: Vec::new(),
            per_target: BTreeMap::new(),
        }
    }

    fn record_trial(&mut self, outcome: &TrialOutcome) {
        self.trials += 1;
        self.total_questions += u64::from(outcome.questions);
        self.total_guesses += u64::from(outcome.guesses);
        self.total_ms += outcome.elapsed_ms;
        self.per_trial_turns.push(f64::from(outcome.turns()));

        let tally = self.per_target.entry(outcome.target.clone()).or_default();
        match outcome.outcome {
            SessionState::Solved => {
                self.solved += 1;
                self.solved_turns.push(f64::from(outcome.turns()));
                tally.solved += 1;
            }
            SessionState::Exhausted => {
                self.exhausted += 1;
                tally.missed += 1;
            }
            _ => {
                self.abandoned += 1;
                tally.missed += 1;
            }
        }
        self.per_trial_success
            .push(if outcome.solved() { 1.0 } else { 0.0 });
    }

    fn into_report(self) -> AgentReport {
        let per_trial = |total: f64| {
            if self.trials == 0 {
                0.0
            } else {
                total / self.trials as f64
            }
        };

        let success_rate = per_trial(self.solved as f64);
        let avg_questions = per_trial(self.total_questions as f64);
        let avg_guesses = per_trial(self.total_guesses as f64);
        let avg_ms = per_trial(self.total_ms);
        let avg_turns_solved = mean(&self.solved_turns);

        let mixed_targets = self
            .per_target
            .iter()
            .filter(|(_, tally)| tally.solved > 0 && tally.missed > 0)
            .map(|(target, tally)| MixedTarget {
                target: target.clone(),
                solved: tally.solved,
                missed: tally.missed,
                success_rate: tally.solved as f64 / (tally.solved + tally.missed) as f64,
            })
            .collect();

        AgentReport {
            success_ci95: confidence_interval(&self.per_trial_success),
            turns_ci95: confidence_interval(&self.per_trial_turns),
            name: self.name,
            kind: self.kind,
            params: self.params,
            trials: self.trials,
            solved: self.solved,
            exhausted: self.exhausted,
            abandoned: self.abandoned,
            success_rate,
            avg_questions,
            avg_guesses,
            avg_turns_solved,
            avg_ms_per_trial: avg_ms,
            per_target: self.per_target,
            mixed_targets,
            delta_vs_baseline: 0.0, // Filled once the baseline report is known
        }
    }
}

#[derive(Clone)]
struct ComparisonAccumulator {
    diffs: Vec<f64>,
}

impl ComparisonAccumulator {
    fn new() -> Self {
        Self { diffs: Vec::new() }
    }

    fn record(&mut self, diff: f64) {
        self.diffs.push(diff);
    }

    /// Two-sided Wilcoxon signed-rank test (normal approximation with tie
    /// and continuity correction). Returns `(p_value, non-zero pairs)`.
    fn wilcoxon_signed_rank(self) -> (f64, usize) {
        let diffs: Vec<f64> = self
            .diffs
            .into_iter()
            .filter(|d| d.abs() > f64::EPSILON)
            .collect();
        let n = diffs.len();
        if n == 0 {
            return (1.0, 0);
        }

        let mut paired: Vec<(f64, f64)> =
            diffs.into_iter().map(|d| (d.abs(), d.signum())).collect();
        paired.sort_by(|a, b| a.0.total_cmp(&b.0));

        // Average ranks across ties
        let mut ranks = Vec::with_capacity(n);
        let mut tie_sizes = Vec::new();
        let mut i = 0;
        while i < paired.len() {
            let mut j = i;
            while j + 1 < paired.len() && (paired[j + 1].0 - paired[i].0).abs() < 1e-12 {
                j += 1;
            }
            let rank = (i + j + 2) as f64 / 2.0;
            for pair in &paired[i..=j] {
                ranks.push((rank, pair.1));
            }
            if j > i {
                tie_sizes.push(j - i + 1);
            }
            i = j + 1;
        }

        let w_plus: f64 = ranks
            .iter()
            .filter(|(_, sign)| *sign > 0.0)
            .map(|(rank, _)| *rank)
            .sum();
        let w_minus: f64 = ranks
            .iter()
            .filter(|(_, sign)| *sign < 0.0)
            .map(|(rank, _)| *rank)
            .sum();

        let w = w_plus.min(w_minus);
        let n_f = n as f64;
        let mean_w = n_f * (n_f + 1.0) / 4.0;

        let tie_adjustment: f64 = tie_sizes
            .into_iter()
            .map(|count| {
                let c = count as f64;
                (c.powi(3) - c) / 48.0
            })
            .sum();
        let variance_w = n_f * (n_f + 1.0) * (2.0 * n_f + 1.0) / 24.0 - tie_adjustment;
        if variance_w <= 0.0 {
            return (1.0, n);
        }

        let Ok(normal) = Normal::new(0.0, 1.0) else {
            return (1.0, n);
        };
        let z = (((w - mean_w).abs() - 0.5) / variance_w.sqrt()).max(0.0);
        let p = 2.0 * (1.0 - normal.cdf(z));
        (p.clamp(0.0, 1.0), n)
    }
}

#[derive(Debug, Serialize)]
pub struct AnalyticsSummary {
    pub baseline: String,
    pub question_budget: u32,
    pub agents: Vec<AgentReport>,
    pub comparisons: Vec<ComparisonReport>,
}

impl AnalyticsSummary {
    pub fn enrich(mut self) -> Self {
        let baseline_rate = self
            .agents
            .iter()
            .find(|agent| agent.name == self.baseline)
            .map(|agent| agent.success_rate)
            .unwrap_or(0.0);

        for agent in &mut self.agents {
            agent.delta_vs_baseline = agent.success_rate - baseline_rate;
        }

        self
    }

    pub fn agent(&self, name: &str) -> Option<&AgentReport> {
        self.agents.iter().find(|agent| agent.name == name)
    }

    pub fn p_value(&self, agent: &str) -> f64 {
        self.comparisons
            .iter()
            .find(|c| c.agent == agent)
            .map(|c| c.p_value)
            .unwrap_or(1.0)
    }

    pub fn to_markdown(&self) -> String {
        let mut out = String::new();
        out.push_str("# Simulation Summary\n\n");
        let _ = writeln!(
            out,
            "Baseline: `{}`, question budget: {} turns\n",
            self.baseline, self.question_budget
        );
        out.push_str("| Agent | Kind | Trials | Success % | Δ vs baseline | 95% CI | Avg questions | Avg guesses | Avg turns (solved) | Exhausted | Abandoned | p-value (turns) |\n");
        out.push_str("|-------|------|--------|-----------|---------------|--------|---------------|-------------|--------------------|-----------|-----------|-----------------|\n");

        for agent in &self.agents {
            let _ = writeln!(
                out,
                "| {name} | {kind} | {trials} | {rate:.1}% | {delta:+.1} | [{ci_low:.1}, {ci_high:.1}] | {questions:.2} | {guesses:.2} | {turns:.2} | {exhausted} | {abandoned} | {pval:.3} |",
                name = agent.name,
                kind = agent.kind.as_str(),
                trials = agent.trials,
                rate = agent.success_rate * 100.0,
                delta = agent.delta_vs_baseline * 100.0,
                ci_low = agent.success_ci95.0 * 100.0,
                ci_high = agent.success_ci95.1 * 100.0,
                questions = agent.avg_questions,
                guesses = agent.avg_guesses,
                turns = agent.avg_turns_solved,
                exhausted = agent.exhausted,
                abandoned = agent.abandoned,
                pval = self.p_value(&agent.name),
            );
        }

        for agent in &self.agents {
            if agent.mixed_targets.is_empty() {
                continue;
            }
            let _ = writeln!(out, "\n## {}: targets both solved and missed\n", agent.name);
            out.push_str("| Target | Solved | Missed | Success % |\n");
            out.push_str("|--------|--------|--------|-----------|\n");
            for mixed in &agent.mixed_targets {
                let _ = writeln!(
                    out,
                    "| {} | {} | {} | {:.1}% |",
                    mixed.target,
                    mixed.solved,
                    mixed.missed,
                    mixed.success_rate * 100.0
                );
            }
        }

        out
    }

    pub fn write_markdown(&self, path: impl AsRef<Path>) -> Result<(), AnalyticsError> {
        fs::write(path.as_ref(), self.to_markdown()).map_err(|e| AnalyticsError::Io {
            context: "writing summary markdown",
            source: e,
        })
    }

    /// Bar chart of success rate per agent (`success_rate.png`).
    pub fn render_plot(&self, dir: impl AsRef<Path>) -> Result<PathBuf, AnalyticsError> {
        let dir = dir.as_ref();
        if !dir.as_os_str().is_empty() {
            fs::create_dir_all(dir).map_err(|e| AnalyticsError::Io {
                context: "creating plots directory",
                source: e,
            })?;
        }

        let output_path = dir.join("success_rate.png");
        let baseline = self.baseline.clone();
        let agents_snapshot = self.agents.clone();
        let baseline_rate = self
            .agent(&self.baseline)
            .map(|agent| agent.success_rate)
            .unwrap_or(0.0);

        let prev_hook = std::panic::take_hook();
        std::panic::set_hook(Box::new(|_| {}));

        let plot_attempt = std::panic::catch_unwind(move || {
            let root = BitMapBackend::new(&output_path, (800, 480)).into_drawing_area();
            root.fill(&WHITE)
                .map_err(|e| AnalyticsError::Plot(e.to_string()))?;

            let mut agents = agents_snapshot;
            agents.sort_by(|a, b| a.success_rate.total_cmp(&b.success_rate));

            let mut chart = ChartBuilder::on(&root)
                .margin(20)
                .caption("Success rate by agent", ("sans-serif", 22))
                .set_label_area_size(LabelAreaPosition::Left, 50)
                .set_label_area_size(LabelAreaPosition::Bottom, 60)
                .build_cartesian_2d(0..agents.len(), 0.0f64..1.05f64)
                .map_err(|e| AnalyticsError::Plot(e.to_string()))?;

            chart
                .configure_mesh()
                .disable_mesh()
                .y_desc("Solved trials (fraction)")
                .x_desc("Agent")
                .x_label_formatter(&|idx| {
                    agents
                        .get(*idx)
                        .map(|agent| agent.name.clone())
                        .unwrap_or_default()
                })
                .draw()
                .map_err(|e| AnalyticsError::Plot(e.to_string()))?;

            chart
                .draw_series(agents.iter().enumerate().map(|(idx, agent)| {
                    let color = if agent.name == baseline {
                        &BLUE
                    } else if agent.success_rate >= baseline_rate {
                        &GREEN
                    } else {
                        &RED
                    };
                    Rectangle::new([(idx, 0.0), (idx + 1, agent.success_rate)], color.filled())
                }))
                .map_err(|e| AnalyticsError::Plot(e.to_string()))?;

            drop(chart);

            root.present()
                .map_err(|e| AnalyticsError::Plot(e.to_string()))?;

            drop(root);

            Ok(output_path)
        });

        std::panic::set_hook(prev_hook);

        match plot_attempt {
            Ok(result) => result,
            Err(_) => Err(AnalyticsError::Plot(
                "plotters panicked while rendering (missing font support?)".into(),
            )),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AgentReport {
    pub name: String,
    pub kind: PolicyKind,
    pub params: serde_yaml::Value,
    pub trials: usize,
    pub solved: usize,
    pub exhausted: usize,
    pub abandoned: usize,
    pub success_rate: f64,
    pub success_ci95: (f64, f64),
    pub avg_questions: f64,
    pub avg_guesses: f64,
    pub avg_turns_solved: f64,
    pub turns_ci95: (f64, f64),
    pub avg_ms_per_trial: f64,
    pub per_target: BTreeMap<String, TargetTally>,
    pub mixed_targets: Vec<MixedTarget>,
    #[serde(skip)]
    pub delta_vs_baseline: f64,
}

/// A target the agent solved in some trials and missed in others.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MixedTarget {
    pub target: String,
    pub solved: usize,
    pub missed: usize,
    pub success_rate: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ComparisonReport {
    pub agent: String,
    pub p_value: f64,
    pub sample_size: usize,
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

fn confidence_interval(points: &[f64]) -> (f64, f64) {
    if points.is_empty() {
        return (0.0, 0.0);
    }
    let mean = mean(points);
    if points.len() == 1 {
        return (mean, mean);
    }
    let variance = points
        .iter()
        .map(|value| (value - mean).powi(2))
        .sum::<f64>()
        / (points.len() as f64 - 1.0);
    let std_error = (variance / points.len() as f64).sqrt();
    let margin = CONFIDENCE_Z * std_error;
    (mean - margin, mean + margin)
}
