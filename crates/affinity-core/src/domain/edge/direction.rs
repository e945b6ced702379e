//! Edge direction
//!
//! `None` marks an undirected relation. `Out`/`In` mark a directed relation,
//! which is always stored as a complementary pair of records.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Direction tag of an edge record
///
/// Serializes as `null`, `"out"` or `"in"`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "Option<String>", try_from = "Option<String>")]
pub enum Direction {
    /// Undirected relation
    #[default]
    None,
    /// Source points at target
    Out,
    /// Target points at source
    In,
}

impl Direction {
    /// The direction stored on the complementary record
    pub fn inverse(self) -> Self {
        match self {
            Self::None => Self::None,
            Self::Out => Self::In,
            Self::In => Self::Out,
        }
    }

    /// Key component used by the backends
    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Out => "out",
            Self::In => "in",
        }
    }

    /// Parse a direction label. Empty, `none` and `null` all mean undirected.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "none" | "null" => Some(Self::None),
            "out" => Some(Self::Out),
            "in" => Some(Self::In),
            _ => None,
        }
    }

    /// Parse an optional label, reporting a validation error for unknown values
    pub fn parse_field(field: &str, value: Option<&str>) -> Result<Self> {
        match value {
            None => Ok(Self::None),
            Some(s) => Self::parse(s).ok_or_else(|| {
                Error::invalid_field(field, format!("unknown direction '{}', expected out, in or none", s))
            }),
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Direction {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse_field("direction", Some(s))
    }
}

impl From<Direction> for Option<String> {
    fn from(direction: Direction) -> Self {
        match direction {
            Direction::None => None,
            other => Some(other.as_str().to_string()),
        }
    }
}

impl TryFrom<Option<String>> for Direction {
    type Error = String;

    fn try_from(value: Option<String>) -> std::result::Result<Self, Self::Error> {
        match value {
            None => Ok(Self::None),
            Some(s) => Self::parse(&s).ok_or_else(|| format!("unknown direction '{}'", s)),
        }
    }
}
