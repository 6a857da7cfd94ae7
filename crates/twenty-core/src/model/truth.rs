use core::fmt;
use serde::{Deserialize, Serialize};

/// Recorded value of one attribute for one entity.
///
/// `Unknown` means the attribute was never recorded for the entity, which is
/// not the same thing as `False`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Truth {
    True,
    False,
    #[default]
    Unknown,
}

impl Truth {
    pub const ALL: [Truth; 3] = [Truth::True, Truth::False, Truth::Unknown];

    pub const fn from_option(value: Option<bool>) -> Self {
        match value {
            Some(true) => Truth::True,
            Some(false) => Truth::False,
            None => Truth::Unknown,
        }
    }

    pub const fn as_option(self) -> Option<bool> {
        match self {
            Truth::True => Some(true),
            Truth::False => Some(false),
            Truth::Unknown => None,
        }
    }

    pub const fn is_known(self) -> bool {
        !matches!(self, Truth::Unknown)
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Truth::True => "true",
            Truth::False => "false",
            Truth::Unknown => "unknown",
        }
    }
}

impl From<Option<bool>> for Truth {
    fn from(value: Option<bool>) -> Self {
        Truth::from_option(value)
    }
}

impl From<bool> for Truth {
    fn from(value: bool) -> Self {
        Truth::from_option(Some(value))
    }
}

impl fmt::Display for Truth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
