use super::Policy;
use crate::engine::{EngineParams, InferenceEngine};
use std::sync::Arc;
use tracing::{Level, event};
use twenty_core::model::answer::Answer;
use twenty_core::model::directive::Directive;
use twenty_core::model::knowledge::KnowledgeBase;

/// Adapter that exposes the [`InferenceEngine`] through the `Policy` trait
pub struct BayesianPolicy {
    engine: InferenceEngine,
    turn: u32,
}

impl BayesianPolicy {
    pub fn new(kb: Arc<KnowledgeBase>) -> Self {
        Self::with_params(kb, EngineParams::default())
    }

    pub fn with_params(kb: Arc<KnowledgeBase>, params: EngineParams) -> Self {
        Self {
            engine: InferenceEngine::with_params(kb, params),
            turn: 0,
        }
    }

    pub fn engine(&self) -> &InferenceEngine {
        &self.engine
    }
}

impl Policy for BayesianPolicy {
    fn name(&self) -> &'static str {
        "bayesian"
    }

    fn next_step(&mut self) -> Directive {
        self.turn += 1;
        let directive = self.engine.next_step();
        log_directive(self.turn, &directive, &self.engine);
        directive
    }

    fn apply_answer(&mut self, attribute: &str, answer: Answer) {
        self.engine.apply_answer(attribute, answer);
    }

    fn has_remaining_guesses(&self) -> bool {
        self.engine.has_remaining_guesses()
    }

    fn belief_of(&self, entity: &str) -> Option<f64> {
        self.engine.belief_of(entity)
    }
}

fn log_directive(turn: u32, directive: &Directive, engine: &InferenceEngine) {
    if !tracing::enabled!(Level::DEBUG) {
        return;
    }
    let leader = engine
        .belief()
        .leader()
        .map(|(idx, p)| format!("{}={p:.3}", engine.knowledge().entity_name(idx)))
        .unwrap_or_default();
    event!(
        target: "twenty_bot::policy",
        Level::DEBUG,
        turn,
        directive = %directive,
        leader = %leader,
        shortlist = engine.shortlist().len()
    );
}
