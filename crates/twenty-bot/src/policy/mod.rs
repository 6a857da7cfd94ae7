mod bayesian;
mod random;

pub use bayesian::BayesianPolicy;
pub use random::RandomPolicy;

use crate::engine::EngineParams;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use twenty_core::model::answer::Answer;
use twenty_core::model::directive::Directive;
use twenty_core::model::knowledge::KnowledgeBase;

/// Unified interface for guessers driven by a session.
pub trait Policy: Send {
    /// Short label used in logs and reports.
    fn name(&self) -> &'static str;

    /// Next question, guess, or `Exhausted`.
    fn next_step(&mut self) -> Directive;

    /// Fold the player's answer to an attribute question into the policy.
    fn apply_answer(&mut self, attribute: &str, answer: Answer);

    /// Whether another concrete guess can follow a rejected one.
    fn has_remaining_guesses(&self) -> bool;

    /// Optional: probability the policy assigns to `entity`.
    fn belief_of(&self, _entity: &str) -> Option<f64> {
        None
    }
}

/// Guesser selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyKind {
    Bayesian,
    Random,
}

impl PolicyKind {
    pub fn from_str(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "bayesian" | "bayes" | "default" => Some(PolicyKind::Bayesian),
            "random" | "baseline" => Some(PolicyKind::Random),
            _ => None,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            PolicyKind::Bayesian => "bayesian",
            PolicyKind::Random => "random",
        }
    }

    /// Build a fresh policy for one session. `seed` only matters for
    /// randomised policies.
    pub fn spawn(self, kb: Arc<KnowledgeBase>, params: EngineParams, seed: u64) -> Box<dyn Policy> {
        match self {
            PolicyKind::Bayesian => Box::new(BayesianPolicy::with_params(kb, params)),
            PolicyKind::Random => Box::new(RandomPolicy::with_seed(kb, seed)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_aliases() {
        assert_eq!(PolicyKind::from_str("Bayes"), Some(PolicyKind::Bayesian));
        assert_eq!(PolicyKind::from_str("baseline"), Some(PolicyKind::Random));
        assert_eq!(PolicyKind::from_str("oracle"), None);
    }

    #[test]
    fn spawned_policies_report_their_kind() {
        let kb = Arc::new(KnowledgeBase::from_json_str(r#"{ "cat": { "hasFur": true } }"#).unwrap());
        for kind in [PolicyKind::Bayesian, PolicyKind::Random] {
            let policy = kind.spawn(kb.clone(), EngineParams::default(), 7);
            assert_eq!(policy.name(), kind.as_str());
        }
    }
}
