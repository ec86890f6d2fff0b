use serde::{Deserialize, Serialize};

use crate::domain::phase::GamePhase;

/// `currentStageIndex` value while no stage is active (lobby).
pub const STAGE_LOBBY: u32 = 0;

/// `currentStageIndex` sentinel once the game has ended. Distinguished from
/// any real stage index; clients treat `>= STAGE_ENDED` as "game over".
pub const STAGE_ENDED: u32 = 1000;

/// The single source of truth broadcast in full to every connected client on
/// every mutation.
///
/// - `current_stage_index` / `game_state` drive the orchestrator.
/// - `questionnaire_json` and `game_history_json` are owned by the
///   orchestrator exclusively.
/// - `stage_payload_json` is opaque here: only the active stage reads or
///   writes it, and it is re-initialized on every stage entry.
/// - `message` and the per-role text fields are presentation mirrors,
///   never read back for logic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncedState {
    pub current_stage_index: u32,
    pub game_state: GamePhase,
    pub message: String,
    pub tv_text: String,
    pub player1_text: String,
    pub player2_text: String,
    pub game_started: bool,
    pub player_count: u32,
    pub questionnaire_json: String,
    pub stage_payload_json: String,
    pub game_history_json: String,
    pub ready_for_next_count: u32,
}

impl SyncedState {
    /// Fresh lobby state for a newly created room.
    pub fn waiting(questionnaire_json: String) -> Self {
        Self {
            current_stage_index: STAGE_LOBBY,
            game_state: GamePhase::WaitingForStart,
            message: "Waiting for players...".to_string(),
            tv_text: String::new(),
            player1_text: String::new(),
            player2_text: String::new(),
            game_started: false,
            player_count: 0,
            questionnaire_json,
            stage_payload_json: String::new(),
            game_history_json: "[]".to_string(),
            ready_for_next_count: 0,
        }
    }

    pub fn has_ended(&self) -> bool {
        self.current_stage_index >= STAGE_ENDED
    }
}
