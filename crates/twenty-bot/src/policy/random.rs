use super::Policy;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;
use twenty_core::model::answer::Answer;
use twenty_core::model::directive::Directive;
use twenty_core::model::knowledge::KnowledgeBase;

/// Baseline guesser: never asks, guesses uniformly at random without
/// repeating itself.
pub struct RandomPolicy {
    kb: Arc<KnowledgeBase>,
    remaining: Vec<usize>,
    rng: StdRng,
}

impl RandomPolicy {
    pub fn with_seed(kb: Arc<KnowledgeBase>, seed: u64) -> Self {
        Self::with_rng(kb, StdRng::seed_from_u64(seed))
    }

    pub fn with_rng(kb: Arc<KnowledgeBase>, rng: StdRng) -> Self {
        let remaining = (0..kb.len()).collect();
        Self { kb, remaining, rng }
    }
}

impl Policy for RandomPolicy {
    fn name(&self) -> &'static str {
        "random"
    }

    fn next_step(&mut self) -> Directive {
        if self.remaining.is_empty() {
            return Directive::Exhausted;
        }
        let pick = self.rng.gen_range(0..self.remaining.len());
        let entity = self.remaining.swap_remove(pick);
        Directive::GuessEntity(self.kb.entity_name(entity).to_string())
    }

    fn apply_answer(&mut self, _attribute: &str, _answer: Answer) {}

    fn has_remaining_guesses(&self) -> bool {
        !self.remaining.is_empty()
    }
}
