//! Automatic answerer standing in for a human player during simulation.

use crate::model::answer::Answer;
use crate::model::knowledge::KnowledgeBase;
use crate::model::truth::Truth;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Answer noise injected by the simulated player.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NoiseConfig {
    /// Probability of answering "maybe" to a question with a recorded value.
    #[serde(default = "default_maybe_rate")]
    pub maybe_rate: f64,
    /// Probability of giving the wrong yes/no answer.
    #[serde(default)]
    pub error_rate: f64,
}

impl NoiseConfig {
    pub const NONE: NoiseConfig = NoiseConfig {
        maybe_rate: 0.0,
        error_rate: 0.0,
    };

    pub fn is_valid(&self) -> bool {
        let in_range = |p: f64| p.is_finite() && (0.0..=1.0).contains(&p);
        in_range(self.maybe_rate)
            && in_range(self.error_rate)
            && self.maybe_rate + self.error_rate <= 1.0
    }
}

impl Default for NoiseConfig {
    fn default() -> Self {
        Self {
            maybe_rate: default_maybe_rate(),
            error_rate: 0.0,
        }
    }
}

fn default_maybe_rate() -> f64 {
    0.05
}

/// Answers questions about a hidden target by looking up its recorded values.
#[derive(Debug, Clone)]
pub struct SimulatedPlayer<'a> {
    kb: &'a KnowledgeBase,
    target: usize,
    noise: NoiseConfig,
}

impl<'a> SimulatedPlayer<'a> {
    /// Returns `None` when `target` is not in the knowledge base.
    pub fn new(kb: &'a KnowledgeBase, target: &str, noise: NoiseConfig) -> Option<Self> {
        let target = kb.entity_index(target)?;
        Some(Self { kb, target, noise })
    }

    pub fn target(&self) -> &'a str {
        self.kb.entity_name(self.target)
    }

    pub fn noise(&self) -> NoiseConfig {
        self.noise
    }

    /// Unrecorded values are always answered with "maybe". Recorded values
    /// get "maybe" with `maybe_rate`, the wrong answer with `error_rate` and
    /// the truthful answer otherwise.
    pub fn answer<R: Rng>(&self, attribute: &str, rng: &mut R) -> Answer {
        let truth = self
            .kb
            .attribute_index(attribute)
            .map(|col| self.kb.truth(self.target, col))
            .unwrap_or(Truth::Unknown);
        if !truth.is_known() {
            return Answer::Maybe;
        }

        let truthful = Answer::from_truth(truth);
        let roll: f64 = rng.r#gen();
        if roll < self.noise.maybe_rate {
            Answer::Maybe
        } else if roll < self.noise.maybe_rate + self.noise.error_rate {
            truthful.inverted()
        } else {
            truthful
        }
    }

    /// Verdict on a concrete guess.
    pub fn confirms(&self, entity: &str) -> bool {
        entity == self.target()
    }
}
