use super::truth::Truth;
use core::fmt;
use serde::{Deserialize, Serialize};

/// Reply given to an attribute question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Answer {
    Yes,
    No,
    Maybe,
}

impl Answer {
    pub const ALL: [Answer; 3] = [Answer::Yes, Answer::No, Answer::Maybe];

    /// Parses console input. Accepts the first letter or the full word; `s`
    /// ("sometimes") is an alias for maybe.
    pub fn from_str(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "y" | "yes" => Some(Answer::Yes),
            "n" | "no" => Some(Answer::No),
            "m" | "maybe" | "s" | "sometimes" => Some(Answer::Maybe),
            _ => None,
        }
    }

    /// The truthful answer for a recorded value. Unrecorded values can only be
    /// answered with `Maybe`.
    pub const fn from_truth(truth: Truth) -> Self {
        match truth {
            Truth::True => Answer::Yes,
            Truth::False => Answer::No,
            Truth::Unknown => Answer::Maybe,
        }
    }

    /// Swaps yes and no; maybe stays maybe.
    pub const fn inverted(self) -> Self {
        match self {
            Answer::Yes => Answer::No,
            Answer::No => Answer::Yes,
            Answer::Maybe => Answer::Maybe,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Answer::Yes => "yes",
            Answer::No => "no",
            Answer::Maybe => "maybe",
        }
    }
}

impl fmt::Display for Answer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_short_and_long_forms() {
        assert_eq!(Answer::from_str("y"), Some(Answer::Yes));
        assert_eq!(Answer::from_str(" NO "), Some(Answer::No));
        assert_eq!(Answer::from_str("m"), Some(Answer::Maybe));
        assert_eq!(Answer::from_str("s"), Some(Answer::Maybe));
        assert_eq!(Answer::from_str("perhaps"), None);
        assert_eq!(Answer::from_str(""), None);
    }

    #[test]
    fn truthful_answers_follow_recorded_value() {
        assert_eq!(Answer::from_truth(Truth::True), Answer::Yes);
        assert_eq!(Answer::from_truth(Truth::False), Answer::No);
        assert_eq!(Answer::from_truth(Truth::Unknown), Answer::Maybe);
    }

    #[test]
    fn inversion_keeps_maybe() {
        assert_eq!(Answer::Yes.inverted(), Answer::No);
        assert_eq!(Answer::Maybe.inverted(), Answer::Maybe);
    }
}
