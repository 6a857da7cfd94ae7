use core::fmt;
use serde::{Deserialize, Serialize};

/// What a guesser wants to do next.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "name", rename_all = "snake_case")]
pub enum Directive {
    /// Ask the player whether the named attribute holds.
    AskAttribute(String),
    /// Offer the named entity as a concrete guess.
    GuessEntity(String),
    /// Nothing left to ask or guess.
    Exhausted,
}

impl Directive {
    pub fn attribute(&self) -> Option<&str> {
        match self {
            Directive::AskAttribute(name) => Some(name),
            _ => None,
        }
    }

    pub fn entity(&self) -> Option<&str> {
        match self {
            Directive::GuessEntity(name) => Some(name),
            _ => None,
        }
    }

    pub const fn is_exhausted(&self) -> bool {
        matches!(self, Directive::Exhausted)
    }
}

impl fmt::Display for Directive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Directive::AskAttribute(name) => write!(f, "ask {name}"),
            Directive::GuessEntity(name) => write!(f, "guess {name}"),
            Directive::Exhausted => f.write_str("exhausted"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Directive;

    #[test]
    fn accessors_match_variant() {
        let ask = Directive::AskAttribute("hasFur".into());
        assert_eq!(ask.attribute(), Some("hasFur"));
        assert_eq!(ask.entity(), None);

        let guess = Directive::GuessEntity("cow".into());
        assert_eq!(guess.entity(), Some("cow"));
        assert!(!guess.is_exhausted());
        assert!(Directive::Exhausted.is_exhausted());
    }

    #[test]
    fn serializes_as_tagged_variant() {
        let json = serde_json::to_string(&Directive::GuessEntity("cow".into())).unwrap();
        assert_eq!(json, r#"{"kind":"guess_entity","name":"cow"}"#);
        let json = serde_json::to_string(&Directive::Exhausted).unwrap();
        assert_eq!(json, r#"{"kind":"exhausted"}"#);
    }
}
