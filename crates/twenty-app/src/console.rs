//! Line-based question/answer loop over any reader and writer.

use std::io::{self, BufRead, Write};

use tracing::debug;
use twenty_bot::{Session, SessionState, Turn};
use twenty_core::AppInfo;
use twenty_core::model::answer::Answer;

pub const ATTRIBUTE_REPROMPT: &str = "Please answer 'y', 'n', or 'm' (maybe).";
pub const GUESS_REPROMPT: &str = "Please answer 'y' or 'n'.";

/// How a console game came to an end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleOutcome {
    Finished(SessionState),
    /// Input ran out before the game was decided.
    InputClosed,
}

pub struct Console<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Console<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    pub fn into_output(self) -> W {
        self.output
    }

    /// Play `session` to the end, prompting on the writer and reading replies
    /// line by line.
    pub fn play(&mut self, session: &mut Session) -> io::Result<ConsoleOutcome> {
        writeln!(self.output, "{}", AppInfo::tagline())?;

        loop {
            let turn = session.next_turn().map_err(io::Error::other)?;
            match turn {
                Turn::Ask(attribute) => {
                    writeln!(self.output, "Question #{}", session.turns() + 1)?;
                    let Some(answer) = self.ask_attribute(&attribute)? else {
                        return self.input_closed(session);
                    };
                    debug!(%attribute, %answer, "player answered");
                    session.answer(answer).map_err(io::Error::other)?;
                }
                Turn::Guess { entity, last } => {
                    writeln!(self.output, "Question #{}", session.turns() + 1)?;
                    let prompt = if last {
                        format!("My last guess: Is it a {entity}? (y/n)")
                    } else {
                        format!("Is it a {entity}? (y/n)")
                    };
                    let Some(correct) = self.confirm(&prompt)? else {
                        return self.input_closed(session);
                    };
                    session.judge_guess(correct).map_err(io::Error::other)?;
                }
                Turn::Finished(state) => {
                    self.announce(state, session)?;
                    return Ok(ConsoleOutcome::Finished(state));
                }
            }
        }
    }

    fn ask_attribute(&mut self, attribute: &str) -> io::Result<Option<Answer>> {
        loop {
            writeln!(self.output, "{attribute}? (y/n/m)")?;
            let Some(line) = self.read_line()? else {
                return Ok(None);
            };
            match Answer::from_str(&line) {
                Some(answer) => return Ok(Some(answer)),
                None => writeln!(self.output, "{ATTRIBUTE_REPROMPT}")?,
            }
        }
    }

    fn confirm(&mut self, prompt: &str) -> io::Result<Option<bool>> {
        loop {
            writeln!(self.output, "{prompt}")?;
            let Some(line) = self.read_line()? else {
                return Ok(None);
            };
            match Answer::from_str(&line) {
                Some(Answer::Yes) => return Ok(Some(true)),
                Some(Answer::No) => return Ok(Some(false)),
                _ => writeln!(self.output, "{GUESS_REPROMPT}")?,
            }
        }
    }

    fn read_line(&mut self) -> io::Result<Option<String>> {
        self.output.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line))
    }

    fn input_closed(&mut self, session: &mut Session) -> io::Result<ConsoleOutcome> {
        session.abandon();
        writeln!(self.output, "No more answers; stopping here.")?;
        Ok(ConsoleOutcome::InputClosed)
    }

    fn announce(&mut self, state: SessionState, session: &Session) -> io::Result<()> {
        match state {
            SessionState::Solved => writeln!(
                self.output,
                "Yay! I guessed it right after {}.",
                count_turns(session.turns())
            ),
            SessionState::Exhausted => writeln!(
                self.output,
                "I couldn't guess your animal from my knowledge base."
            ),
            SessionState::Abandoned => writeln!(
                self.output,
                "I couldn't guess your animal in {}.",
                count_turns(session.budget())
            ),
            SessionState::Asking | SessionState::Guessing => Ok(()),
        }
    }
}

fn count_turns(turns: u32) -> String {
    match turns {
        1 => "1 turn".to_string(),
        n => format!("{n} turns"),
    }
}
