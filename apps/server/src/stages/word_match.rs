//! Stage 3: both players must type the same word to win the stage.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::role::Role;
use crate::domain::room_core::RoomCore;
use crate::domain::stage::Stage;
use crate::stages::{read_payload, write_payload};

pub(crate) const STAGE_INDEX: u32 = 3;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct WordPayload {
    player1_word: String,
    player2_word: String,
}

fn submitted_word(data: &Value) -> String {
    data.get("text")
        .or_else(|| data.get("word"))
        .and_then(Value::as_str)
        .unwrap_or("")
        .trim()
        .to_string()
}

pub struct WordMatch;

impl Stage for WordMatch {
    fn stage_index(&self) -> u32 {
        STAGE_INDEX
    }

    fn on_enter(&self, room: &mut RoomCore) {
        room.set_stage_texts(
            "Think alike: type the same word!",
            "Type a word and submit. You must both choose the same word.",
            "Type a word and submit. You must both choose the same word.",
        );
        write_payload(room, &WordPayload::default());
    }

    fn on_message(&self, room: &mut RoomCore, sender: Role, msg_type: &str, data: &Value) -> bool {
        if msg_type != "submit" && msg_type != "word" {
            return false;
        }
        if !sender.is_player() {
            return false;
        }

        let word = submitted_word(data);
        let mut payload: WordPayload = read_payload(room);
        match sender {
            Role::Player1 => payload.player1_word = word,
            Role::Player2 => payload.player2_word = word,
            Role::Tv => return false,
        }
        write_payload(room, &payload);

        if !payload.player1_word.is_empty() && !payload.player2_word.is_empty() {
            let matched = payload
                .player1_word
                .eq_ignore_ascii_case(&payload.player2_word);
            if matched {
                let summary = serde_json::to_value(&payload).unwrap_or(Value::Null);
                room.add_to_history(STAGE_INDEX, summary);
                room.advance_to_interim(STAGE_INDEX + 1);
            }
        }
        true
    }

    fn interim_title(&self) -> Option<&str> {
        Some("Get ready for the Word Match!")
    }
}
