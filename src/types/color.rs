// ABOUTME: Deployment slot colors for blue/green rollouts.
// ABOUTME: The lowercase name doubles as the compose project of the slot.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// One of the two symmetric deployment slots.
///
/// Blue is the slot a first-ever deployment lands in. Both slots run the same
/// compose file; only the project name differs, which keeps their container
/// sets apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    Blue,
    Green,
}

impl Color {
    /// Both slots, in resolution order.
    pub const ALL: [Color; 2] = [Color::Blue, Color::Green];

    /// The opposite slot.
    pub fn other(self) -> Color {
        match self {
            Color::Blue => Color::Green,
            Color::Green => Color::Blue,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Color::Blue => "blue",
            Color::Green => "green",
        }
    }

    /// Compose project name for this slot.
    pub fn project(self) -> &'static str {
        self.as_str()
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("unknown color '{0}' (expected blue or green)")]
pub struct ParseColorError(String);

impl FromStr for Color {
    type Err = ParseColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "blue" | "a" => Ok(Color::Blue),
            "green" | "b" => Ok(Color::Green),
            _ => Err(ParseColorError(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn other_is_an_involution() {
        for color in Color::ALL {
            assert_ne!(color, color.other());
            assert_eq!(color, color.other().other());
        }
    }

    #[test]
    fn parses_names_and_slot_letters() {
        assert_eq!("blue".parse::<Color>().unwrap(), Color::Blue);
        assert_eq!("GREEN".parse::<Color>().unwrap(), Color::Green);
        assert_eq!("a".parse::<Color>().unwrap(), Color::Blue);
        assert_eq!("B".parse::<Color>().unwrap(), Color::Green);
        assert!("red".parse::<Color>().is_err());
    }

    #[test]
    fn project_matches_display() {
        assert_eq!(Color::Green.project(), "green");
        assert_eq!(Color::Blue.to_string(), "blue");
    }
}
