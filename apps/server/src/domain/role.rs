use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Connection roles. Two symmetric players plus a read-only "tv" display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Player1,
    Player2,
    Tv,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Player1 => "player1",
            Role::Player2 => "player2",
            Role::Tv => "tv",
        }
    }

    /// True for the two gameplay roles; the viewer never sends input.
    pub fn is_player(&self) -> bool {
        matches!(self, Role::Player1 | Role::Player2)
    }

    /// The other player role. Meaningless for the viewer, so it is `None`.
    pub fn partner(&self) -> Option<Role> {
        match self {
            Role::Player1 => Some(Role::Player2),
            Role::Player2 => Some(Role::Player1),
            Role::Tv => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseRoleError;

impl FromStr for Role {
    type Err = ParseRoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "player1" => Ok(Role::Player1),
            "player2" => Ok(Role::Player2),
            "tv" => Ok(Role::Tv),
            _ => Err(ParseRoleError),
        }
    }
}
