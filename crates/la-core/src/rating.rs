//! Content-maturity ratings for avatars.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Content rating of an avatar image, from least to most mature.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, utoipa::ToSchema,
)]
pub enum Rating {
    /// Suitable for all audiences.
    #[default]
    G,
    /// Possibly offensive, usually for audiences 13 and above.
    PG,
    /// Intended for adult audiences above 17.
    R,
    /// Even more mature than R.
    X,
}

impl Rating {
    /// All ratings in ascending order of maturity.
    pub const ALL: [Rating; 4] = [Rating::G, Rating::PG, Rating::R, Rating::X];

    /// Position on the maturity scale. Higher is more mature.
    pub fn rank(self) -> u8 {
        match self {
            Rating::G => 0,
            Rating::PG => 1,
            Rating::R => 2,
            Rating::X => 3,
        }
    }

    /// Whether an avatar with this rating may be shown on a site whose
    /// maximum allowed rating is `max`.
    pub fn allowed_under(self, max: Rating) -> bool {
        self.rank() <= max.rank()
    }

    /// Parse a submitted rating, falling back to [`Rating::G`] when the value
    /// is missing or not one of the four known ratings.
    pub fn parse_or_default(value: Option<&str>) -> Rating {
        value.and_then(|v| v.parse().ok()).unwrap_or_default()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Rating::G => "G",
            Rating::PG => "PG",
            Rating::R => "R",
            Rating::X => "X",
        }
    }

    /// Human-readable description shown next to the rating choice.
    pub fn description(self) -> &'static str {
        match self {
            Rating::G => "Suitable for all audiences",
            Rating::PG => "Possibly offensive, usually for audiences 13 and above",
            Rating::R => "Intended for adult audiences above 17",
            Rating::X => "Even more mature than above",
        }
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string is not one of `G`, `PG`, `R`, `X`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown rating: {0}")]
pub struct UnknownRating(pub String);

impl FromStr for Rating {
    type Err = UnknownRating;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim() {
            "G" => Ok(Rating::G),
            "PG" => Ok(Rating::PG),
            "R" => Ok(Rating::R),
            "X" => Ok(Rating::X),
            other => Err(UnknownRating(other.to_string())),
        }
    }
}
