//! Answer likelihoods and the Bayesian belief update.

use super::BeliefState;
use crate::model::answer::Answer;
use crate::model::knowledge::KnowledgeBase;
use crate::model::truth::Truth;
use std::env;
use std::ops::RangeInclusive;

/// Tunable likelihoods for a yes/no answer given the recorded value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LikelihoodConfig {
    /// P(answer | recorded value agrees with the answer).
    pub match_weight: f64,
    /// P(answer | recorded value contradicts the answer).
    pub mismatch_weight: f64,
    /// Likelihood used for unrecorded values and for `Maybe` answers.
    pub uninformative_weight: f64,
}

impl Default for LikelihoodConfig {
    fn default() -> Self {
        Self {
            match_weight: 0.85,
            mismatch_weight: 0.10,
            uninformative_weight: 0.5,
        }
    }
}

impl LikelihoodConfig {
    /// Accepted range for `match_weight`.
    pub const MATCH_RANGE: RangeInclusive<f64> = 0.5..=0.99;
    /// Accepted range for `mismatch_weight`.
    pub const MISMATCH_RANGE: RangeInclusive<f64> = 0.01..=0.5;

    pub fn from_env() -> Self {
        Self::from_reader(|key| env::var(key).ok())
    }

    pub fn from_reader<F>(mut read: F) -> Self
    where
        F: FnMut(&str) -> Option<String>,
    {
        let base = Self::default();
        let match_weight = parse_f64(read("TWQ_LIKELIHOOD_MATCH"), base.match_weight);
        let mismatch_weight = parse_f64(read("TWQ_LIKELIHOOD_MISMATCH"), base.mismatch_weight);

        Self {
            match_weight: clamp_to(match_weight, &Self::MATCH_RANGE),
            mismatch_weight: clamp_to(mismatch_weight, &Self::MISMATCH_RANGE),
            uninformative_weight: base.uninformative_weight,
        }
    }
}

fn clamp_to(value: f64, range: &RangeInclusive<f64>) -> f64 {
    value.clamp(*range.start(), *range.end())
}

fn parse_f64(raw: Option<String>, fallback: f64) -> f64 {
    raw.and_then(|value| value.trim().parse::<f64>().ok())
        .filter(|value| value.is_finite())
        .unwrap_or(fallback)
}

/// Noisy-answer model used to fold answers into a [`BeliefState`].
#[derive(Debug, Clone)]
pub struct LikelihoodModel {
    config: LikelihoodConfig,
}

impl Default for LikelihoodModel {
    fn default() -> Self {
        Self::new(LikelihoodConfig::default())
    }
}

impl LikelihoodModel {
    pub fn new(config: LikelihoodConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> LikelihoodConfig {
        self.config
    }

    /// P(answer | recorded value). `Maybe` and unrecorded values are
    /// uninformative so they never change relative beliefs.
    pub fn likelihood(&self, answer: Answer, truth: Truth) -> f64 {
        match (answer, truth) {
            (Answer::Maybe, _) | (_, Truth::Unknown) => self.config.uninformative_weight,
            (Answer::Yes, Truth::True) | (Answer::No, Truth::False) => self.config.match_weight,
            (Answer::Yes, Truth::False) | (Answer::No, Truth::True) => self.config.mismatch_weight,
        }
    }

    /// Bayesian update over every entity in `kb` for an answer about
    /// `attribute` (an index into `kb.attributes()`).
    pub fn update(
        &self,
        belief: &mut BeliefState,
        kb: &KnowledgeBase,
        attribute: usize,
        answer: Answer,
    ) -> bool {
        let updated =
            belief.reweight(|entity| self.likelihood(answer, kb.truth(entity, attribute)));
        if !updated {
            tracing::warn!(
                attribute = kb.attribute_name(attribute),
                %answer,
                "belief mass vanished; keeping prior"
            );
        }
        updated
    }
}
