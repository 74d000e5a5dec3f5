//! Team colors.
//!
//! A flag is identified by the color of the team that owns it, so
//! `TeamColor` also serves as the flag identifier carried by units.

use std::fmt;
use std::str::FromStr;

use crate::CoreError;

#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum TeamColor {
    Red,
    Green,
    Blue,
    Purple,
}

impl TeamColor {
    pub const ALL: [TeamColor; 4] = [
        TeamColor::Red,
        TeamColor::Green,
        TeamColor::Blue,
        TeamColor::Purple,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TeamColor::Red    => "red",
            TeamColor::Green  => "green",
            TeamColor::Blue   => "blue",
            TeamColor::Purple => "purple",
        }
    }
}

impl fmt::Display for TeamColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TeamColor {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "red"    => Ok(TeamColor::Red),
            "green"  => Ok(TeamColor::Green),
            "blue"   => Ok(TeamColor::Blue),
            "purple" => Ok(TeamColor::Purple),
            _        => Err(CoreError::UnknownColor(s.to_string())),
        }
    }
}
