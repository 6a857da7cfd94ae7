//! One game of twenty questions, from the first question to a verdict.
//!
//! The session owns its policy (and through it the belief state) and tracks
//! the game's lifecycle explicitly. Drivers pull a [`Turn`], show it to the
//! player, then report back with [`Session::answer`] or
//! [`Session::judge_guess`].

use crate::policy::Policy;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};
use twenty_core::model::answer::Answer;
use twenty_core::model::directive::Directive;

/// Turns (questions plus guesses) allowed before the session wraps up.
pub const DEFAULT_QUESTION_BUDGET: u32 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Asking,
    Guessing,
    Solved,
    Exhausted,
    Abandoned,
}

impl SessionState {
    pub const fn is_terminal(self) -> bool {
        matches!(
            self,
            SessionState::Solved | SessionState::Exhausted | SessionState::Abandoned
        )
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            SessionState::Asking => "asking",
            SessionState::Guessing => "guessing",
            SessionState::Solved => "solved",
            SessionState::Exhausted => "exhausted",
            SessionState::Abandoned => "abandoned",
        }
    }
}

/// What the driver should present next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Turn {
    Ask(String),
    /// `last` is set when the turn budget is spent and this is the final
    /// chance.
    Guess { entity: String, last: bool },
    Finished(SessionState),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TranscriptEntry {
    Question { attribute: String, answer: Answer },
    Guess { entity: String, correct: bool },
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("a reply to the previous turn is still pending")]
    AwaitingReply,
    #[error("no question is waiting for an answer")]
    NoPendingQuestion,
    #[error("no guess is waiting for a verdict")]
    NoPendingGuess,
}

pub struct Session {
    policy: Box<dyn Policy>,
    state: SessionState,
    budget: u32,
    questions: u32,
    guesses: u32,
    pending: Option<Directive>,
    last_chance: bool,
    transcript: Vec<TranscriptEntry>,
}

impl Session {
    pub fn new(policy: Box<dyn Policy>) -> Self {
        Self::with_budget(policy, DEFAULT_QUESTION_BUDGET)
    }

    pub fn with_budget(policy: Box<dyn Policy>, budget: u32) -> Self {
        Self {
            policy,
            state: SessionState::Asking,
            budget,
            questions: 0,
            guesses: 0,
            pending: None,
            last_chance: false,
            transcript: Vec::new(),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn budget(&self) -> u32 {
        self.budget
    }

    pub fn questions_asked(&self) -> u32 {
        self.questions
    }

    pub fn guesses_made(&self) -> u32 {
        self.guesses
    }

    /// Completed turns: answered questions plus judged guesses.
    pub fn turns(&self) -> u32 {
        self.questions + self.guesses
    }

    pub fn transcript(&self) -> &[TranscriptEntry] {
        &self.transcript
    }

    pub fn policy(&self) -> &dyn Policy {
        self.policy.as_ref()
    }

    /// Pull the next turn from the policy.
    ///
    /// Once the budget is spent the policy gets one more call: a guess is
    /// offered as the last one, anything else abandons the session.
    pub fn next_turn(&mut self) -> Result<Turn, SessionError> {
        if self.state.is_terminal() {
            return Ok(Turn::Finished(self.state));
        }
        if self.pending.is_some() {
            return Err(SessionError::AwaitingReply);
        }

        let out_of_turns = self.turns() >= self.budget;
        let directive = self.policy.next_step();
        let turn = match &directive {
            Directive::AskAttribute(_) if out_of_turns => {
                return Ok(Turn::Finished(self.finish(SessionState::Abandoned)));
            }
            Directive::AskAttribute(attribute) => {
                self.state = SessionState::Asking;
                Turn::Ask(attribute.clone())
            }
            Directive::GuessEntity(entity) => {
                self.state = SessionState::Guessing;
                self.last_chance = out_of_turns;
                Turn::Guess {
                    entity: entity.clone(),
                    last: out_of_turns,
                }
            }
            Directive::Exhausted => {
                return Ok(Turn::Finished(self.finish(SessionState::Exhausted)));
            }
        };

        debug!(
            policy = self.policy.name(),
            turn = self.turns() + 1,
            %directive,
            "session turn"
        );
        self.pending = Some(directive);
        Ok(turn)
    }

    /// Reply to the pending attribute question.
    pub fn answer(&mut self, answer: Answer) -> Result<(), SessionError> {
        match self.pending.take() {
            Some(Directive::AskAttribute(attribute)) => {
                self.policy.apply_answer(&attribute, answer);
                self.questions += 1;
                self.transcript
                    .push(TranscriptEntry::Question { attribute, answer });
                Ok(())
            }
            other => {
                self.pending = other;
                Err(SessionError::NoPendingQuestion)
            }
        }
    }

    /// Verdict on the pending guess. Returns the state the session moved to.
    pub fn judge_guess(&mut self, correct: bool) -> Result<SessionState, SessionError> {
        let entity = match self.pending.take() {
            Some(Directive::GuessEntity(entity)) => entity,
            other => {
                self.pending = other;
                return Err(SessionError::NoPendingGuess);
            }
        };

        self.guesses += 1;
        self.transcript.push(TranscriptEntry::Guess { entity, correct });

        let next = if correct {
            self.finish(SessionState::Solved)
        } else if self.last_chance {
            self.finish(SessionState::Abandoned)
        } else if !self.policy.has_remaining_guesses() {
            self.finish(SessionState::Exhausted)
        } else {
            SessionState::Guessing
        };
        Ok(next)
    }

    /// The player walked away. No-op once the session has ended.
    pub fn abandon(&mut self) -> SessionState {
        if self.state.is_terminal() {
            return self.state;
        }
        self.finish(SessionState::Abandoned)
    }

    fn finish(&mut self, state: SessionState) -> SessionState {
        self.state = state;
        self.pending = None;
        info!(
            policy = self.policy.name(),
            outcome = state.as_str(),
            questions = self.questions,
            guesses = self.guesses,
            "session finished"
        );
        state
    }

    pub fn report(&self) -> SessionReport {
        SessionReport {
            policy: self.policy.name().to_string(),
            outcome: self.state,
            questions: self.questions,
            guesses: self.guesses,
            budget: self.budget,
            transcript: self.transcript.clone(),
        }
    }
}

/// Serializable summary of a finished (or abandoned) session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionReport {
    pub policy: String,
    pub outcome: SessionState,
    pub questions: u32,
    pub guesses: u32,
    pub budget: u32,
    pub transcript: Vec<TranscriptEntry>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::{BayesianPolicy, RandomPolicy};
    use std::sync::Arc;
    use twenty_core::model::knowledge::KnowledgeBase;

    fn farm() -> Arc<KnowledgeBase> {
        Arc::new(
            KnowledgeBase::from_json_str(
                r#"{
                    "dog":   { "hasFur": true,  "isDomestic": true,  "isPredator": true },
                    "cow":   { "hasFur": true,  "isDomestic": true,  "isPredator": false },
                    "shark": { "hasFur": false, "isDomestic": false, "isPredator": true }
                }"#,
            )
            .unwrap(),
        )
    }

    #[test]
    fn solves_the_cow() {
        let mut session = Session::new(Box::new(BayesianPolicy::new(farm())));
        let answers = [("hasFur", Answer::Yes), ("isDomestic", Answer::Yes), ("isPredator", Answer::No)];

        loop {
            match session.next_turn().unwrap() {
                Turn::Ask(attribute) => {
                    let answer = answers
                        .iter()
                        .find(|(name, _)| *name == attribute)
                        .map(|(_, answer)| *answer)
                        .unwrap();
                    session.answer(answer).unwrap();
                }
                Turn::Guess { entity, .. } => {
                    assert_eq!(entity, "cow");
                    assert_eq!(session.judge_guess(true).unwrap(), SessionState::Solved);
                }
                Turn::Finished(state) => {
                    assert_eq!(state, SessionState::Solved);
                    break;
                }
            }
        }

        assert_eq!(session.questions_asked(), 3);
        assert_eq!(session.guesses_made(), 1);
        assert_eq!(session.report().outcome, SessionState::Solved);
    }

    #[test]
    fn rejects_out_of_order_replies() {
        let mut session = Session::new(Box::new(BayesianPolicy::new(farm())));
        assert_eq!(session.answer(Answer::Yes), Err(SessionError::NoPendingQuestion));

        assert!(matches!(session.next_turn().unwrap(), Turn::Ask(_)));
        assert_eq!(session.next_turn(), Err(SessionError::AwaitingReply));
        assert_eq!(session.judge_guess(true), Err(SessionError::NoPendingGuess));
        session.answer(Answer::Maybe).unwrap();
        assert_eq!(session.transcript().len(), 1);
    }

    #[test]
    fn rejected_guesses_run_into_exhaustion() {
        let mut session = Session::new(Box::new(RandomPolicy::with_seed(farm(), 5)));
        let mut guesses = 0;
        loop {
            match session.next_turn().unwrap() {
                Turn::Guess { .. } => {
                    guesses += 1;
                    session.judge_guess(false).unwrap();
                }
                Turn::Finished(state) => {
                    assert_eq!(state, SessionState::Exhausted);
                    break;
                }
                Turn::Ask(_) => unreachable!("random policy never asks"),
            }
        }
        assert_eq!(guesses, 3);
        assert!(session.state().is_terminal());
    }

    #[test]
    fn spent_budget_abandons_on_a_question() {
        let mut session = Session::with_budget(Box::new(BayesianPolicy::new(farm())), 1);
        assert!(matches!(session.next_turn().unwrap(), Turn::Ask(_)));
        session.answer(Answer::Maybe).unwrap();
        assert_eq!(
            session.next_turn().unwrap(),
            Turn::Finished(SessionState::Abandoned)
        );
        assert_eq!(session.answer(Answer::Yes), Err(SessionError::NoPendingQuestion));
    }

    #[test]
    fn spent_budget_allows_one_last_guess() {
        let mut session = Session::with_budget(Box::new(RandomPolicy::with_seed(farm(), 1)), 1);
        assert!(matches!(session.next_turn().unwrap(), Turn::Guess { last: false, .. }));
        assert_eq!(session.judge_guess(false).unwrap(), SessionState::Guessing);
        assert!(matches!(session.next_turn().unwrap(), Turn::Guess { last: true, .. }));
        assert_eq!(session.judge_guess(false).unwrap(), SessionState::Abandoned);
        assert_eq!(
            session.next_turn().unwrap(),
            Turn::Finished(SessionState::Abandoned)
        );
    }

    #[test]
    fn abandon_ends_the_session_once() {
        let mut session = Session::new(Box::new(BayesianPolicy::new(farm())));
        session.next_turn().unwrap();
        assert_eq!(session.abandon(), SessionState::Abandoned);
        assert_eq!(session.next_turn(), Ok(Turn::Finished(SessionState::Abandoned)));
        assert_eq!(session.answer(Answer::Yes), Err(SessionError::NoPendingQuestion));

        let mut solved = Session::new(Box::new(RandomPolicy::with_seed(farm(), 2)));
        solved.next_turn().unwrap();
        solved.judge_guess(true).unwrap();
        assert_eq!(solved.abandon(), SessionState::Solved);
    }

    #[test]
    fn report_serializes_transcript() {
        let mut session = Session::new(Box::new(BayesianPolicy::new(farm())));
        session.next_turn().unwrap();
        session.answer(Answer::Yes).unwrap();
        let json = serde_json::to_string(&session.report()).unwrap();
        assert!(json.contains(r#""kind":"question""#));
        assert!(json.contains(r#""attribute":"hasFur""#));
        assert!(json.contains(r#""outcome":"asking""#));
    }
}
