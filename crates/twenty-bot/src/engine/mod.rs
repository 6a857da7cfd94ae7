//! Bayesian inference engine: decides what to ask or guess next and folds
//! answers back into the belief over the catalog.
//!
//! - `params`: tunables (`EngineParams`).
//! - `shortlist`: per-turn candidate selection from the belief.
//! - `gain`: expected information gain of an attribute over the shortlist.

mod gain;
mod params;
mod shortlist;

pub use params::EngineParams;

use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, warn};
use twenty_core::belief::{BeliefState, LikelihoodModel};
use twenty_core::model::answer::Answer;
use twenty_core::model::directive::Directive;
use twenty_core::model::knowledge::KnowledgeBase;

/// Per-session guesser state over a shared, read-only knowledge base.
#[derive(Debug, Clone)]
pub struct InferenceEngine {
    kb: Arc<KnowledgeBase>,
    params: EngineParams,
    likelihood: LikelihoodModel,
    belief: BeliefState,
    asked: BTreeSet<usize>,
    shortlist: Vec<usize>,
    cursor: usize,
}

impl InferenceEngine {
    pub fn new(kb: Arc<KnowledgeBase>) -> Self {
        Self::with_params(kb, EngineParams::default())
    }

    pub fn with_params(kb: Arc<KnowledgeBase>, params: EngineParams) -> Self {
        let belief = BeliefState::uniform(kb.len());
        Self {
            kb,
            likelihood: LikelihoodModel::new(params.likelihood),
            params,
            belief,
            asked: BTreeSet::new(),
            shortlist: Vec::new(),
            cursor: 0,
        }
    }

    pub fn knowledge(&self) -> &KnowledgeBase {
        &self.kb
    }

    pub fn params(&self) -> &EngineParams {
        &self.params
    }

    pub fn belief(&self) -> &BeliefState {
        &self.belief
    }

    /// Current probability that `entity` is the target, `None` for names
    /// outside the knowledge base.
    pub fn belief_of(&self, entity: &str) -> Option<f64> {
        self.kb
            .entity_index(entity)
            .map(|idx| self.belief.prob(idx))
    }

    pub fn was_asked(&self, attribute: &str) -> bool {
        self.kb
            .attribute_index(attribute)
            .is_some_and(|idx| self.asked.contains(&idx))
    }

    pub fn asked_attributes(&self) -> impl Iterator<Item = &str> + '_ {
        self.asked.iter().map(|&idx| self.kb.attribute_name(idx))
    }

    /// Shortlist computed by the most recent [`next_step`](Self::next_step).
    pub fn shortlist(&self) -> Vec<&str> {
        self.shortlist
            .iter()
            .map(|&idx| self.kb.entity_name(idx))
            .collect()
    }

    /// Decide the next move: ask the most informative unasked attribute, or
    /// walk the shortlist with concrete guesses once nothing discriminates.
    pub fn next_step(&mut self) -> Directive {
        self.shortlist = shortlist::build(&self.belief, &self.params);

        if self.shortlist.len() > 1
            && let Some(best) =
                gain::best_attribute(&self.kb, &self.belief, &self.shortlist, &self.asked)
            && best.gain > self.params.gain_threshold
        {
            self.asked.insert(best.attribute);
            let attribute = self.kb.attribute_name(best.attribute);
            debug!(
                attribute,
                gain = best.gain,
                shortlist = self.shortlist.len(),
                "asking attribute"
            );
            return Directive::AskAttribute(attribute.to_string());
        }

        self.next_guess()
    }

    fn next_guess(&mut self) -> Directive {
        let Some(&entity) = self.shortlist.get(self.cursor) else {
            debug!(
                shortlist = self.shortlist.len(),
                cursor = self.cursor,
                "shortlist exhausted"
            );
            return Directive::Exhausted;
        };
        self.cursor += 1;
        let name = self.kb.entity_name(entity);
        debug!(
            entity = name,
            belief = self.belief.prob(entity),
            cursor = self.cursor,
            shortlist = self.shortlist.len(),
            "guessing entity"
        );
        Directive::GuessEntity(name.to_string())
    }

    /// Bayesian update of every entity's belief from an answer.
    ///
    /// Marks the attribute as asked and rewinds the guess cursor. An
    /// attribute the knowledge base has never seen is a no-op: beliefs, the
    /// asked set and the cursor stay as they are and `false` is returned.
    pub fn apply_answer(&mut self, attribute: &str, answer: Answer) -> bool {
        let Some(col) = self.kb.attribute_index(attribute) else {
            warn!(attribute, %answer, "answer for unknown attribute ignored");
            return false;
        };

        self.likelihood
            .update(&mut self.belief, &self.kb, col, answer);
        self.asked.insert(col);
        self.cursor = 0;
        debug!(attribute, %answer, "answer applied");
        true
    }

    /// Whether the guess cursor still points inside the latest shortlist.
    pub fn has_remaining_guesses(&self) -> bool {
        self.cursor < self.shortlist.len()
    }
}
