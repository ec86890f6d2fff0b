use serde::{Deserialize, Serialize};

/// Orchestrator-level game progression phases.
///
/// `WAITING_FOR_START → INTERIM_SCREEN ⇄ IN_PROGRESS → ENDED` (terminal).
/// Serialized in SCREAMING_SNAKE_CASE because that is what clients match on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    #[serde(rename = "WAITING_FOR_START")]
    WaitingForStart,
    #[serde(rename = "INTERIM_SCREEN")]
    InterimScreen,
    #[serde(rename = "IN_PROGRESS")]
    InProgress,
    #[serde(rename = "ENDED")]
    Ended,
}

impl GamePhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            GamePhase::WaitingForStart => "WAITING_FOR_START",
            GamePhase::InterimScreen => "INTERIM_SCREEN",
            GamePhase::InProgress => "IN_PROGRESS",
            GamePhase::Ended => "ENDED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, GamePhase::Ended)
    }
}
