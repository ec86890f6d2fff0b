//! Stage 2: "Sound Date Puzzle".
//!
//! Eight buttons, each mapped to a digit of a meaningful date, shuffled per
//! room. Players listen to the digit sounds client-side, then press the
//! buttons in date order. The server tracks only the press sequence of the
//! current attempt: a full correct sequence solves the stage, a wrong one is
//! cleared with an explicit reset (the retry stays inside this stage).

use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::domain::role::Role;
use crate::domain::room_core::RoomCore;
use crate::domain::stage::Stage;
use crate::stages::{read_payload, write_payload};

pub(crate) const STAGE_INDEX: u32 = 2;
const BUTTON_COUNT: usize = 8;

const DEFAULT_MEETING_DATE_DIGITS: [u8; BUTTON_COUNT] = [2, 0, 0, 6, 2, 0, 1, 8];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
enum PuzzleStatus {
    #[default]
    Playing,
    Solved,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct PuzzlePayload {
    buttons: Vec<u8>,
    target_digits: Vec<u8>,
    press_sequence: Vec<usize>,
    stage_complete: bool,
    status: PuzzleStatus,
}

impl Default for PuzzlePayload {
    fn default() -> Self {
        Self {
            buttons: DEFAULT_MEETING_DATE_DIGITS.to_vec(),
            target_digits: DEFAULT_MEETING_DATE_DIGITS.to_vec(),
            press_sequence: Vec::new(),
            stage_complete: false,
            status: PuzzleStatus::Playing,
        }
    }
}

fn is_sequence_correct(payload: &PuzzlePayload) -> bool {
    if payload.press_sequence.len() != payload.target_digits.len() {
        return false;
    }
    payload
        .press_sequence
        .iter()
        .zip(payload.target_digits.iter())
        .all(|(&button_index, &target)| {
            payload.buttons.get(button_index).copied() == Some(target)
        })
}

fn apply_texts(room: &mut RoomCore, payload: &PuzzlePayload) {
    let q = room.questionnaire();
    let title = format!(
        "Sound Date Puzzle — {} & {}",
        q.partner1_name, q.partner2_name
    );

    if payload.stage_complete {
        let done = "Well done! You solved the puzzle.";
        room.set_stage_texts(title, done, done);
    } else {
        let prompt = "Listen to the buttons and press them in the right order.";
        room.set_stage_texts(title, prompt, prompt);
    }
}

pub struct DatePuzzle;

impl Stage for DatePuzzle {
    fn stage_index(&self) -> u32 {
        STAGE_INDEX
    }

    fn on_enter(&self, room: &mut RoomCore) {
        let mut payload = PuzzlePayload::default();
        payload.buttons.shuffle(room.rng());
        write_payload(room, &payload);
        apply_texts(room, &payload);
    }

    fn on_message(&self, room: &mut RoomCore, sender: Role, msg_type: &str, data: &Value) -> bool {
        if !sender.is_player() {
            return false;
        }

        let mut payload: PuzzlePayload = read_payload(room);

        if payload.stage_complete && msg_type != "continue" {
            return false;
        }

        match msg_type {
            "press" => {
                let index = match data.get("index").and_then(Value::as_u64) {
                    Some(i) if (i as usize) < BUTTON_COUNT => i as usize,
                    _ => return false,
                };
                if payload.press_sequence.contains(&index) {
                    return false;
                }

                payload.press_sequence.push(index);

                if payload.press_sequence.len() >= BUTTON_COUNT && is_sequence_correct(&payload) {
                    payload.status = PuzzleStatus::Solved;
                    payload.stage_complete = true;
                }
                // Wrong full sequence: nothing happens, players press reset.

                write_payload(room, &payload);
                if payload.stage_complete {
                    apply_texts(room, &payload);
                }
                true
            }
            "reset" | "shuffle" => {
                if payload.stage_complete {
                    return false;
                }
                payload.press_sequence.clear();
                write_payload(room, &payload);
                true
            }
            "continue" => {
                if !payload.stage_complete {
                    return false;
                }
                room.add_to_history(STAGE_INDEX, json!({ "status": "solved" }));
                room.advance_to_interim(STAGE_INDEX + 1);
                true
            }
            _ => false,
        }
    }

    fn interim_title(&self) -> Option<&str> {
        Some("Get ready for the Sound Date Puzzle!")
    }
}
