//! Stage 1: "He Said · She Said".
//!
//! The TV shows a blurred image. Both players answer the same question
//! privately with "me" or "partner"; matching answers sharpen the image,
//! mismatches blur it further. A free-text guess of what the image shows may
//! be sent at any time and ends the stage on a correct answer. A perfectly
//! clear image pauses the questions and asks both players for a final
//! written answer instead.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::domain::role::Role;
use crate::domain::room_core::RoomCore;
use crate::domain::stage::Stage;
use crate::stages::{read_payload, write_payload};

pub(crate) const STAGE_INDEX: u32 = 1;
const BLUR_MIN: u8 = 0;
const BLUR_MAX: u8 = 6;

// Question list lives only on the server; clients receive one question at a
// time through the payload. Phrased so "me" / partner-name answers make sense.
const QUESTIONS: [&str; 20] = [
    "Who drinks more coffee?",
    "Who is more likely to be late?",
    "Who sends more memes during the day?",
    "Who falls asleep faster on the couch?",
    "Who is more of a morning person?",
    "Who takes longer to get ready to go out?",
    "Who usually starts the arguments?",
    "Who apologizes first after a fight?",
    "Who plans the date nights more often?",
    "Who remembers important dates better?",
    "Who is more stubborn?",
    "Who is more likely to suggest ordering takeout?",
    "Who gets hangry more quickly?",
    "Who is more romantic on a daily basis?",
    "Who scrolls on their phone more in bed?",
    "Who is more adventurous with new foods?",
    "Who talks more during a movie?",
    "Who is more likely to forget where they parked?",
    "Who sings louder in the car?",
    "Who is more likely to plan a surprise?",
];

// Hidden target phrase; server-side only.
const TARGET_IMAGE_ANSWER: &str = "eiffel tower";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
enum BlurPhase {
    #[default]
    Questions,
    FinalPrompt,
    Results,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
enum Choice {
    Me,
    Partner,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct BlurPayload {
    phase: BlurPhase,
    blur_level: u8,
    current_question_index: usize,
    current_question: String,
    questions_asked: u32,
    total_matches: u32,
    total_mismatches: u32,
    last_pair_matched: Option<bool>,
    stage_complete: bool,
    win: bool,
    win_by: Option<String>,
    winner_role: Option<Role>,
    winner_name: Option<String>,
    last_guess_text: String,
    last_guess_wrong: bool,
    awaiting_final_answers: bool,
    final_answer_player1: String,
    final_answer_player2: String,
    p1_choice: Option<Choice>,
    p2_choice: Option<Choice>,
    p1_answered: bool,
    p2_answered: bool,
}

impl Default for BlurPayload {
    fn default() -> Self {
        Self {
            phase: BlurPhase::Questions,
            blur_level: BLUR_MAX,
            current_question_index: 0,
            current_question: QUESTIONS[0].to_string(),
            questions_asked: 0,
            total_matches: 0,
            total_mismatches: 0,
            last_pair_matched: None,
            stage_complete: false,
            win: false,
            win_by: None,
            winner_role: None,
            winner_name: None,
            last_guess_text: String::new(),
            last_guess_wrong: false,
            awaiting_final_answers: false,
            final_answer_player1: String::new(),
            final_answer_player2: String::new(),
            p1_choice: None,
            p2_choice: None,
            p1_answered: false,
            p2_answered: false,
        }
    }
}

fn normalize_guess(text: &str) -> String {
    text.trim()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn is_guess_correct(text: &str) -> bool {
    let n = normalize_guess(text);
    if n.is_empty() {
        return false;
    }
    n == TARGET_IMAGE_ANSWER || n.contains("eiffel") || n.contains("tower")
}

// "me" points at the sender, "partner" at the other player.
fn choice_to_person(role: Role, choice: Choice) -> Option<Role> {
    if !role.is_player() {
        return None;
    }
    match choice {
        Choice::Me => Some(role),
        Choice::Partner => role.partner(),
    }
}

fn next_question_index(current: usize) -> usize {
    (current + 1) % QUESTIONS.len()
}

fn parse_choice(data: &Value) -> Choice {
    match data.get("choice").and_then(Value::as_str) {
        Some(raw) if raw.eq_ignore_ascii_case("partner") => Choice::Partner,
        _ => Choice::Me,
    }
}

fn guess_text(data: &Value) -> &str {
    data.get("text")
        .or_else(|| data.get("guess"))
        .and_then(Value::as_str)
        .unwrap_or("")
}

fn apply_texts(room: &mut RoomCore, payload: &BlurPayload) {
    let q = room.questionnaire();
    let title = format!(
        "He Said · She Said — {} & {}",
        q.partner1_name, q.partner2_name
    );

    match payload.phase {
        BlurPhase::FinalPrompt => {
            let prompt = "The picture is almost clear. Write what you think it shows.";
            room.set_stage_texts(title, prompt, prompt);
        }
        BlurPhase::Results => {
            let asked = payload.questions_asked.max(1);
            let stats = format!(
                "Matches: {}/{} · Blur: {}/{}",
                payload.total_matches, asked, payload.blur_level, BLUR_MAX
            );
            room.set_stage_texts(title, stats.clone(), stats);
        }
        BlurPhase::Questions => {
            let prompt = "Answer on your phone: \"me\" or your partner's name.";
            room.set_stage_texts(title, prompt, prompt);
        }
    }
}

fn handle_answer(room: &mut RoomCore, sender: Role, payload: &mut BlurPayload, data: &Value) -> bool {
    if payload.phase != BlurPhase::Questions || payload.stage_complete {
        return false;
    }

    // Prevent double-answering the same question.
    match sender {
        Role::Player1 if payload.p1_answered => return true,
        Role::Player2 if payload.p2_answered => return true,
        _ => {}
    }

    let choice = parse_choice(data);
    match sender {
        Role::Player1 => {
            payload.p1_choice = Some(choice);
            payload.p1_answered = true;
        }
        Role::Player2 => {
            payload.p2_choice = Some(choice);
            payload.p2_answered = true;
        }
        Role::Tv => return false,
    }

    // Wait until both have answered this question.
    if !payload.p1_answered || !payload.p2_answered {
        write_payload(room, payload);
        return true;
    }

    let p1_person = payload
        .p1_choice
        .and_then(|c| choice_to_person(Role::Player1, c));
    let p2_person = payload
        .p2_choice
        .and_then(|c| choice_to_person(Role::Player2, c));
    let matched = p1_person.is_some() && p1_person == p2_person;

    if matched {
        payload.total_matches += 1;
        payload.blur_level = payload.blur_level.saturating_sub(1);
    } else {
        payload.total_mismatches += 1;
        payload.blur_level = (payload.blur_level + 1).min(BLUR_MAX);
    }
    payload.questions_asked += 1;
    payload.last_pair_matched = Some(matched);

    // Reset per-question state for the next question.
    payload.p1_choice = None;
    payload.p2_choice = None;
    payload.p1_answered = false;
    payload.p2_answered = false;

    if payload.blur_level == BLUR_MIN {
        payload.phase = BlurPhase::FinalPrompt;
        payload.awaiting_final_answers = true;
    } else {
        let next = next_question_index(payload.current_question_index);
        payload.current_question_index = next;
        payload.current_question = QUESTIONS[next].to_string();
    }

    write_payload(room, payload);
    apply_texts(room, payload);
    true
}

fn complete_with_win(payload: &mut BlurPayload, sender: Role, winner_name: &str, text: &str, by: &str) {
    payload.stage_complete = true;
    payload.win = true;
    payload.win_by = Some(by.to_string());
    payload.winner_role = Some(sender);
    payload.winner_name = Some(winner_name.to_string());
    payload.last_guess_text = text.to_string();
    payload.phase = BlurPhase::Results;
    payload.awaiting_final_answers = false;
}

fn handle_guess(room: &mut RoomCore, sender: Role, payload: &mut BlurPayload, data: &Value) -> bool {
    if payload.stage_complete {
        return false;
    }

    let text = guess_text(data).to_string();
    payload.last_guess_wrong = false;

    if text.trim().is_empty() {
        write_payload(room, payload);
        return true;
    }

    let winner_name = room.questionnaire().name_for(sender).to_string();
    let correct = is_guess_correct(&text);

    if payload.phase == BlurPhase::FinalPrompt {
        match sender {
            Role::Player1 if payload.final_answer_player1.is_empty() => {
                payload.final_answer_player1 = text.clone();
            }
            Role::Player2 if payload.final_answer_player2.is_empty() => {
                payload.final_answer_player2 = text.clone();
            }
            _ => {}
        }

        if correct {
            complete_with_win(payload, sender, &winner_name, &text, "finalPrompt");
        } else if !payload.final_answer_player1.is_empty() && !payload.final_answer_player2.is_empty()
        {
            // Both answered, no correct guess: end without a winner.
            payload.stage_complete = true;
            payload.win = false;
            payload.win_by = Some("finalPrompt".to_string());
            payload.phase = BlurPhase::Results;
            payload.awaiting_final_answers = false;
        } else {
            payload.last_guess_wrong = true;
        }

        write_payload(room, payload);
        apply_texts(room, payload);
        return true;
    }

    // Live guess during the question phase.
    if correct {
        complete_with_win(payload, sender, &winner_name, &text, "liveGuess");
    } else {
        payload.last_guess_wrong = true;
    }

    write_payload(room, payload);
    apply_texts(room, payload);
    true
}

fn summary(payload: &BlurPayload) -> Value {
    json!({
        "blurLevel": payload.blur_level,
        "totalMatches": payload.total_matches,
        "totalMismatches": payload.total_mismatches,
        "questionsAsked": payload.questions_asked,
        "win": payload.win,
        "winBy": payload.win_by,
        "winnerRole": payload.winner_role,
        "winnerName": payload.winner_name,
        "lastGuessText": payload.last_guess_text,
        "finalAnswerPlayer1": payload.final_answer_player1,
        "finalAnswerPlayer2": payload.final_answer_player2,
    })
}

pub struct HeSaidSheSaid;

impl Stage for HeSaidSheSaid {
    fn stage_index(&self) -> u32 {
        STAGE_INDEX
    }

    fn on_enter(&self, room: &mut RoomCore) {
        let payload = BlurPayload::default();
        write_payload(room, &payload);
        apply_texts(room, &payload);
    }

    fn on_message(&self, room: &mut RoomCore, sender: Role, msg_type: &str, data: &Value) -> bool {
        if !sender.is_player() {
            return false;
        }

        let mut payload: BlurPayload = read_payload(room);

        if payload.stage_complete && msg_type != "continue" {
            return false;
        }

        match msg_type {
            "answer" => handle_answer(room, sender, &mut payload, data),
            "imageGuess" => handle_guess(room, sender, &mut payload, data),
            "continue" => {
                // Results screen "Continue": record the outcome and move on.
                room.add_to_history(STAGE_INDEX, summary(&payload));
                room.advance_to_interim(STAGE_INDEX + 1);
                true
            }
            _ => false,
        }
    }

    fn interim_title(&self) -> Option<&str> {
        Some("Get ready for He Said · She Said!")
    }
}
