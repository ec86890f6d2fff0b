//! Scripted stub stages for orchestrator tests.

use serde_json::{json, Value};

use crate::domain::role::Role;
use crate::domain::room_core::RoomCore;
use crate::domain::stage::{Stage, StageRegistry};

/// A stage that completes when any player sends `"finish"`. The last stage
/// of a sequence ends the game directly; earlier ones advance to interim.
pub(crate) struct ScriptedStage {
    pub index: u32,
    pub is_final: bool,
}

impl Stage for ScriptedStage {
    fn stage_index(&self) -> u32 {
        self.index
    }

    fn on_enter(&self, room: &mut RoomCore) {
        let payload = json!({ "stage": self.index, "moves": 0 });
        room.set_stage_payload(payload.to_string());
        room.set_stage_texts(format!("Stage {}", self.index), "", "");
    }

    fn on_message(&self, room: &mut RoomCore, sender: Role, msg_type: &str, _data: &Value) -> bool {
        if !sender.is_player() {
            return false;
        }
        match msg_type {
            "move" => {
                let mut payload: Value =
                    serde_json::from_str(room.stage_payload_json()).unwrap_or(json!({}));
                let moves = payload["moves"].as_u64().unwrap_or(0) + 1;
                payload["moves"] = json!(moves);
                room.set_stage_payload(payload.to_string());
                true
            }
            "finish" => {
                room.add_to_history(self.index, json!({ "finishedBy": sender }));
                if self.is_final {
                    room.advance_to_end();
                } else {
                    room.advance_to_interim(self.index + 1);
                }
                true
            }
            _ => false,
        }
    }

    fn interim_title(&self) -> Option<&str> {
        Some("Scripted interim")
    }
}

/// Build and leak a registry of `n` scripted stages. When `final_ends` is
/// false the last stage advances to interim past the end instead of calling
/// `advance_to_end`, exercising the vote-past-last-stage ending.
pub(crate) fn scripted_registry(n: u32, final_ends: bool) -> &'static StageRegistry {
    let stages: Vec<Box<dyn Stage>> = (1..=n)
        .map(|index| {
            Box::new(ScriptedStage {
                index,
                is_final: final_ends && index == n,
            }) as Box<dyn Stage>
        })
        .collect();
    Box::leak(Box::new(
        StageRegistry::build(stages).expect("scripted registry"),
    ))
}
