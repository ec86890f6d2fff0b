//! Stage 4: "Zoom Map" word guessing.
//!
//! Six turn-based sub-rounds. The describer answers four multiple-choice
//! questions about a secret word; the guesser sees the answers plus four
//! word options and picks one. A correct pick zooms the TV map in, a wrong
//! one zooms it out. Either player may type a location guess at any time;
//! a correct location ends the stage immediately. This is the final stage,
//! so both endings go through `advance_to_end`.

use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::warn;

use crate::domain::role::Role;
use crate::domain::room_core::RoomCore;
use crate::domain::stage::Stage;
use crate::stages::{read_payload, write_payload};

pub(crate) const STAGE_INDEX: u32 = 4;
const MAX_SUB_ROUNDS: u32 = 6;
const ZOOM_MIN: u8 = 0;
const ZOOM_MAX: u8 = 6;
const TARGET_LOCATION: &str = "eiffel tower";
const QUESTIONS_PER_WORD: usize = 4;

struct WordEntry {
    word: &'static str,
    alternatives: [&'static str; 3],
    questions: [(&'static str, [&'static str; 4]); QUESTIONS_PER_WORD],
}

// Secret-word bank; server-side only. The guesser sees the four shuffled
// options, never which one is real.
const WORDS: [WordEntry; 6] = [
    WordEntry {
        word: "croissant",
        alternatives: ["baguette", "pretzel", "bagel"],
        questions: [
            ("Where would you find it?", ["Bakery", "Garage", "Forest", "Office"]),
            ("What shape is it?", ["Crescent", "Square", "Ring", "Stick"]),
            ("When is it usually eaten?", ["Breakfast", "Midnight", "Never", "Only holidays"]),
            ("How does it feel?", ["Flaky", "Rubbery", "Frozen", "Liquid"]),
        ],
    },
    WordEntry {
        word: "lighthouse",
        alternatives: ["windmill", "water tower", "bell tower"],
        questions: [
            ("Where does it stand?", ["By the sea", "Downtown", "Underground", "In a mall"]),
            ("What does it do at night?", ["Shines", "Sings", "Sleeps", "Spins"]),
            ("Who needs it most?", ["Sailors", "Bakers", "Dentists", "Pilots"]),
            ("How tall is it?", ["Very tall", "Knee-high", "Tiny", "Flat"]),
        ],
    },
    WordEntry {
        word: "accordion",
        alternatives: ["harmonica", "bagpipes", "keyboard"],
        questions: [
            ("How do you play it?", ["Squeeze it", "Blow it", "Drum it", "Shake it"]),
            ("Where do you hold it?", ["Against the chest", "On the floor", "Overhead", "In a pocket"]),
            ("What sound does it make?", ["Wheezy chords", "Beeps", "Barks", "Silence"]),
            ("Where is it popular?", ["Street cafes", "Libraries", "Pools", "Elevators"]),
        ],
    },
    WordEntry {
        word: "penguin",
        alternatives: ["seagull", "seal", "puffin"],
        questions: [
            ("Can it fly?", ["No", "Yes", "Only at night", "Only downhill"]),
            ("How does it dress?", ["Black and white", "Pink", "Plaid", "Transparent"]),
            ("Where does it live?", ["Cold coasts", "Desert", "Jungle", "Attic"]),
            ("How does it move on land?", ["Waddles", "Gallops", "Rolls", "Teleports"]),
        ],
    },
    WordEntry {
        word: "hammock",
        alternatives: ["deck chair", "sleeping bag", "swing"],
        questions: [
            ("What is it for?", ["Napping", "Cooking", "Racing", "Singing"]),
            ("Where does it hang?", ["Between trees", "On a wall", "From a crane", "Nowhere"]),
            ("What is it made of?", ["Net or cloth", "Steel", "Glass", "Ice"]),
            ("How does it move?", ["Sways", "Bounces", "Spins fast", "Stays rigid"]),
        ],
    },
    WordEntry {
        word: "fireworks",
        alternatives: ["lightning", "confetti", "sparklers"],
        questions: [
            ("When do you see them?", ["Celebrations", "Breakfast", "Meetings", "Exams"]),
            ("Where do they happen?", ["In the sky", "Underwater", "In a drawer", "On a desk"]),
            ("What do they sound like?", ["Booms", "Whispers", "Meows", "Nothing"]),
            ("How long do they last?", ["Seconds", "Weeks", "Years", "Forever"]),
        ],
    },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
enum ZoomPhase {
    #[default]
    Describe,
    Guess,
    Result,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct ZoomQuestion {
    prompt: String,
    options: Vec<String>,
}

impl Default for ZoomQuestion {
    fn default() -> Self {
        Self {
            prompt: String::new(),
            options: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct ZoomPayload {
    sub_round_index: u32,
    zoom_level: u8,
    phase: ZoomPhase,
    describer_role: Role,
    stage_complete: bool,
    location_correct: bool,
    word: String,
    word_options: Vec<String>,
    questions: Vec<ZoomQuestion>,
    describer_answers: Vec<usize>,
    describer_answer_texts: Vec<String>,
    result: Option<String>,
    last_location_guess_wrong: bool,
}

impl Default for ZoomPayload {
    fn default() -> Self {
        Self {
            sub_round_index: 0,
            zoom_level: ZOOM_MIN,
            phase: ZoomPhase::Describe,
            describer_role: Role::Player1,
            stage_complete: false,
            location_correct: false,
            word: String::new(),
            word_options: Vec::new(),
            questions: Vec::new(),
            describer_answers: Vec::new(),
            describer_answer_texts: Vec::new(),
            result: None,
            last_location_guess_wrong: false,
        }
    }
}

fn describer_for(sub_round_index: u32) -> Role {
    if sub_round_index % 2 == 0 {
        Role::Player1
    } else {
        Role::Player2
    }
}

fn normalize_location(text: &str) -> String {
    text.trim()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn is_location_correct(text: &str) -> bool {
    let n = normalize_location(text);
    n == TARGET_LOCATION || n.contains("eiffel") || n == "tower"
}

fn location_text(data: &Value) -> &str {
    data.get("text")
        .or_else(|| data.get("guess"))
        .and_then(Value::as_str)
        .unwrap_or("")
}

fn apply_texts(room: &mut RoomCore, payload: &ZoomPayload) {
    let round_label = format!(
        "Zoom Map · Round {}/{} · Zoom {}/{}",
        payload.sub_round_index + 1,
        MAX_SUB_ROUNDS,
        payload.zoom_level,
        ZOOM_MAX
    );

    let describe = "Answer the 4 questions below (only you see the secret word).";
    let guess = "Your partner answered 4 questions. Pick the word they're describing.";
    let wait = "Waiting for your partner to guess...";
    let next = "Tap Next to continue to the next round.";

    match payload.phase {
        ZoomPhase::Describe => {
            let (p1, p2) = if payload.describer_role == Role::Player1 {
                (describe, guess)
            } else {
                (guess, describe)
            };
            room.set_stage_texts(round_label, p1, p2);
        }
        ZoomPhase::Guess => {
            let (p1, p2) = if payload.describer_role == Role::Player1 {
                (wait, guess)
            } else {
                (guess, wait)
            };
            room.set_stage_texts(round_label, p1, p2);
        }
        ZoomPhase::Result => {
            let outcome = if payload.result.as_deref() == Some("correct") {
                "Correct! Zooming in."
            } else {
                "Wrong word. Zooming out."
            };
            let title = format!(
                "Zoom Map · {} (Zoom {}/{})",
                outcome, payload.zoom_level, ZOOM_MAX
            );
            room.set_stage_texts(title, next, next);
        }
    }
}

fn start_sub_round(room: &mut RoomCore, payload: &mut ZoomPayload) {
    let Some(entry) = WORDS.choose(room.rng()) else {
        warn!("[STAGE] word bank is empty, cannot start sub-round");
        return;
    };

    let mut options: Vec<String> = std::iter::once(entry.word)
        .chain(entry.alternatives.iter().copied())
        .map(str::to_string)
        .collect();
    use rand::seq::SliceRandom;
    options.shuffle(room.rng());

    payload.word = entry.word.to_string();
    payload.questions = entry
        .questions
        .iter()
        .map(|(prompt, options)| ZoomQuestion {
            prompt: (*prompt).to_string(),
            options: options.iter().map(|o| (*o).to_string()).collect(),
        })
        .collect();
    payload.word_options = options;
    payload.describer_answers = Vec::new();
    payload.describer_answer_texts = Vec::new();
    payload.result = None;
    payload.phase = ZoomPhase::Describe;
    payload.describer_role = describer_for(payload.sub_round_index);

    write_payload(room, payload);
    apply_texts(room, payload);
}

pub struct ZoomMap;

impl Stage for ZoomMap {
    fn stage_index(&self) -> u32 {
        STAGE_INDEX
    }

    fn on_enter(&self, room: &mut RoomCore) {
        let mut payload = ZoomPayload::default();
        start_sub_round(room, &mut payload);
    }

    fn on_message(&self, room: &mut RoomCore, sender: Role, msg_type: &str, data: &Value) -> bool {
        if !sender.is_player() {
            return false;
        }

        let mut payload: ZoomPayload = read_payload(room);
        if payload.stage_complete || payload.location_correct {
            return false;
        }

        // Location guess: allowed anytime.
        if msg_type == "locationGuess" || msg_type == "location" {
            payload.last_location_guess_wrong = false;
            let text = location_text(data);
            if is_location_correct(text) {
                payload.stage_complete = true;
                payload.location_correct = true;
                write_payload(room, &payload);
                room.set_stage_texts(
                    "You found it! Eiffel Tower!",
                    "You found the location!",
                    "You found the location!",
                );
                room.add_to_history(
                    STAGE_INDEX,
                    json!({ "locationCorrect": true, "zoomLevel": payload.zoom_level }),
                );
                room.advance_to_end();
                return true;
            }
            payload.last_location_guess_wrong = true;
            write_payload(room, &payload);
            return true;
        }

        if payload.phase == ZoomPhase::Describe && msg_type == "describerSubmit" {
            if sender != payload.describer_role {
                return false;
            }
            let answers: Vec<usize> = data
                .get("answers")
                .and_then(Value::as_array)
                .map(|arr| {
                    arr.iter()
                        .filter_map(Value::as_u64)
                        .map(|v| v as usize)
                        .collect()
                })
                .unwrap_or_default();
            if answers.len() < QUESTIONS_PER_WORD {
                return false;
            }

            let answer_texts: Vec<String> = answers
                .iter()
                .take(QUESTIONS_PER_WORD)
                .enumerate()
                .map(|(i, &choice)| {
                    payload
                        .questions
                        .get(i)
                        .and_then(|q| q.options.get(choice))
                        .cloned()
                        .unwrap_or_default()
                })
                .collect();

            payload.describer_answers = answers.into_iter().take(QUESTIONS_PER_WORD).collect();
            payload.describer_answer_texts = answer_texts;
            payload.phase = ZoomPhase::Guess;
            write_payload(room, &payload);
            apply_texts(room, &payload);
            return true;
        }

        if payload.phase == ZoomPhase::Guess && msg_type == "guesserSubmit" {
            if sender == payload.describer_role {
                return false;
            }
            let chosen = data
                .get("wordIndex")
                .and_then(Value::as_u64)
                .and_then(|i| payload.word_options.get(i as usize));
            let correct = chosen.is_some_and(|option| *option == payload.word);

            payload.phase = ZoomPhase::Result;
            payload.result = Some(if correct { "correct" } else { "incorrect" }.to_string());
            payload.zoom_level = if correct {
                (payload.zoom_level + 1).min(ZOOM_MAX)
            } else {
                payload.zoom_level.saturating_sub(1)
            };
            write_payload(room, &payload);
            apply_texts(room, &payload);
            return true;
        }

        if payload.phase == ZoomPhase::Result && (msg_type == "next" || msg_type == "continue") {
            let next_sub = payload.sub_round_index + 1;
            if next_sub >= MAX_SUB_ROUNDS {
                room.add_to_history(
                    STAGE_INDEX,
                    json!({ "zoomLevel": payload.zoom_level, "subRounds": MAX_SUB_ROUNDS }),
                );
                room.advance_to_end();
                return true;
            }
            payload.sub_round_index = next_sub;
            start_sub_round(room, &mut payload);
            return true;
        }

        false
    }

    fn interim_title(&self) -> Option<&str> {
        Some("Get ready for the Zoom Map!")
    }
}
