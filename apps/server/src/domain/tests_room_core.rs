use std::collections::BTreeSet;

use serde_json::{json, Value};

use crate::domain::phase::GamePhase;
use crate::domain::questionnaire::Questionnaire;
use crate::domain::role::Role;
use crate::domain::room_core::{RoomCore, RoomEffect, RosterSnapshot, READY_SIGNAL};
use crate::domain::synced_state::{STAGE_ENDED, STAGE_LOBBY};
use crate::domain::test_stages::scripted_registry;

fn roster(roles: &[Role]) -> RosterSnapshot {
    RosterSnapshot {
        connected_clients: roles.len(),
        player_roles: roles
            .iter()
            .copied()
            .filter(Role::is_player)
            .collect::<BTreeSet<_>>(),
    }
}

fn fresh_room() -> RoomCore {
    RoomCore::new("session-1", Questionnaire::default(), scripted_registry(3, true), 42)
}

fn room_with_both_players() -> (RoomCore, RosterSnapshot) {
    let mut room = fresh_room();
    let full = roster(&[Role::Player1, Role::Player2]);
    room.roster_changed(&roster(&[Role::Player1]));
    room.roster_changed(&full);
    (room, full)
}

fn both_ready(room: &mut RoomCore, full: &RosterSnapshot) {
    room.handle_message(Role::Player1, READY_SIGNAL, &Value::Null, full);
    room.handle_message(Role::Player2, READY_SIGNAL, &Value::Null, full);
}

#[test]
fn fresh_room_waits_in_lobby() {
    let room = fresh_room();
    assert_eq!(room.state().game_state, GamePhase::WaitingForStart);
    assert_eq!(room.state().current_stage_index, STAGE_LOBBY);
    assert!(!room.state().game_started);
}

#[test]
fn one_player_is_not_enough_to_start() {
    let mut room = fresh_room();
    room.roster_changed(&roster(&[Role::Player1]));
    assert_eq!(room.state().game_state, GamePhase::WaitingForStart);

    // A viewer does not count as a player.
    room.roster_changed(&roster(&[Role::Player1, Role::Tv]));
    assert_eq!(room.state().game_state, GamePhase::WaitingForStart);
}

#[test]
fn second_player_triggers_interim_for_stage_1() {
    let (room, _) = room_with_both_players();
    assert_eq!(room.state().game_state, GamePhase::InterimScreen);
    assert_eq!(room.state().current_stage_index, 1);
    assert!(room.state().game_started);
    assert_eq!(room.state().ready_for_next_count, 0);
    assert_eq!(room.state().message, "Scripted interim");
}

#[test]
fn roster_change_mid_stage_does_not_restart() {
    let (mut room, full) = room_with_both_players();
    both_ready(&mut room, &full);
    assert_eq!(room.state().game_state, GamePhase::InProgress);

    let payload_before = room.state().stage_payload_json.clone();

    // One player drops and returns: stage and payload are untouched.
    room.roster_changed(&roster(&[Role::Player1]));
    room.roster_changed(&full);
    assert_eq!(room.state().game_state, GamePhase::InProgress);
    assert_eq!(room.state().current_stage_index, 1);
    assert_eq!(room.state().stage_payload_json, payload_before);
}

#[test]
fn ready_vote_needs_both_connected_players() {
    let (mut room, full) = room_with_both_players();

    room.handle_message(Role::Player1, READY_SIGNAL, &Value::Null, &full);
    assert_eq!(room.state().game_state, GamePhase::InterimScreen);
    assert_eq!(room.state().ready_for_next_count, 1);

    room.handle_message(Role::Player2, READY_SIGNAL, &Value::Null, &full);
    assert_eq!(room.state().game_state, GamePhase::InProgress);
    assert_eq!(room.state().current_stage_index, 1);
    assert_eq!(room.state().ready_for_next_count, 0, "reset on stage entry");
}

#[test]
fn duplicate_ready_from_same_role_counts_once() {
    let (mut room, full) = room_with_both_players();

    room.handle_message(Role::Player1, READY_SIGNAL, &Value::Null, &full);
    room.handle_message(Role::Player1, READY_SIGNAL, &Value::Null, &full);
    room.handle_message(Role::Player1, READY_SIGNAL, &Value::Null, &full);

    assert_eq!(room.state().ready_for_next_count, 1);
    assert_eq!(room.state().game_state, GamePhase::InterimScreen);
}

#[test]
fn lone_connected_player_can_advance_alone() {
    let (mut room, _) = room_with_both_players();

    // Partner disconnected during the interim screen.
    let lone = roster(&[Role::Player1, Role::Tv]);
    room.roster_changed(&lone);
    room.handle_message(Role::Player1, READY_SIGNAL, &Value::Null, &lone);

    assert_eq!(room.state().game_state, GamePhase::InProgress);
    assert_eq!(room.state().current_stage_index, 1);
}

#[test]
fn partner_dropping_after_a_cast_vote_completes_it() {
    let (mut room, full) = room_with_both_players();

    room.handle_message(Role::Player1, READY_SIGNAL, &Value::Null, &full);
    assert_eq!(room.state().game_state, GamePhase::InterimScreen);

    // Player2 disconnects; the quorum shrinks to 1 and the cast vote wins.
    room.roster_changed(&roster(&[Role::Player1]));
    assert_eq!(room.state().game_state, GamePhase::InProgress);
    assert_eq!(room.state().current_stage_index, 1);
}

#[test]
fn viewer_ready_signal_is_ignored() {
    let (mut room, full) = room_with_both_players();
    let with_tv = RosterSnapshot {
        connected_clients: 3,
        player_roles: full.player_roles.clone(),
    };

    assert!(room.handle_message(Role::Tv, READY_SIGNAL, &Value::Null, &with_tv));
    assert_eq!(room.state().ready_for_next_count, 0);
    assert_eq!(room.state().game_state, GamePhase::InterimScreen);
}

#[test]
fn messages_are_dropped_outside_their_phase() {
    let mut room = fresh_room();
    let solo = roster(&[Role::Player1]);

    // Waiting: everything is dropped.
    assert!(!room.handle_message(Role::Player1, "move", &Value::Null, &solo));
    assert!(!room.handle_message(Role::Player1, READY_SIGNAL, &Value::Null, &solo));

    // Interim: only the ready signal is accepted.
    let (mut room, full) = room_with_both_players();
    assert!(!room.handle_message(Role::Player1, "move", &Value::Null, &full));
    assert_eq!(room.state().game_state, GamePhase::InterimScreen);
}

#[test]
fn in_progress_messages_reach_the_active_stage() {
    let (mut room, full) = room_with_both_players();
    both_ready(&mut room, &full);

    assert!(room.handle_message(Role::Player1, "move", &Value::Null, &full));
    let payload: Value = serde_json::from_str(room.stage_payload_json()).expect("payload");
    assert_eq!(payload["moves"], json!(1));

    // Unrecognized type: silently dropped, no mutation.
    let version = room.version();
    assert!(!room.handle_message(Role::Player1, "bogus", &Value::Null, &full));
    assert_eq!(room.version(), version);
}

#[test]
fn stage_finish_enters_interim_with_cleared_ready_marks() {
    let (mut room, full) = room_with_both_players();
    both_ready(&mut room, &full);

    assert!(room.handle_message(Role::Player2, "finish", &Value::Null, &full));
    assert_eq!(room.state().game_state, GamePhase::InterimScreen);
    assert_eq!(room.state().current_stage_index, 2);
    assert_eq!(room.state().ready_for_next_count, 0);
    assert_eq!(room.history().len(), 1);
}

#[test]
fn ready_marks_do_not_leak_across_interims() {
    let (mut room, full) = room_with_both_players();
    both_ready(&mut room, &full);
    room.handle_message(Role::Player1, "finish", &Value::Null, &full);

    // Only player2 readies now; the old marks from the first interim are gone.
    room.handle_message(Role::Player2, READY_SIGNAL, &Value::Null, &full);
    assert_eq!(room.state().game_state, GamePhase::InterimScreen);
    assert_eq!(room.state().ready_for_next_count, 1);
}

#[test]
fn full_run_reaches_the_end_sentinel() {
    let (mut room, full) = room_with_both_players();

    for expected_stage in 1..=3u32 {
        both_ready(&mut room, &full);
        assert_eq!(room.state().game_state, GamePhase::InProgress);
        assert_eq!(room.state().current_stage_index, expected_stage);
        room.handle_message(Role::Player1, "finish", &Value::Null, &full);
    }

    assert_eq!(room.state().game_state, GamePhase::Ended);
    assert!(room.state().current_stage_index >= STAGE_ENDED);
    assert_eq!(room.history().len(), 3);

    // Terminal: everything is dropped.
    assert!(!room.handle_message(Role::Player1, READY_SIGNAL, &Value::Null, &full));
}

#[test]
fn session_used_effect_is_emitted_exactly_once() {
    let (mut room, full) = room_with_both_players();
    for _ in 1..=3u32 {
        both_ready(&mut room, &full);
        room.handle_message(Role::Player1, "finish", &Value::Null, &full);
    }

    let effects = room.take_effects();
    assert_eq!(
        effects.iter().filter(|e| **e == RoomEffect::SessionUsed).count(),
        1
    );
    assert!(effects.contains(&RoomEffect::ScheduleTeardown));

    // A late advance_to_end is ignored and emits nothing further.
    room.advance_to_end();
    assert!(room.take_effects().is_empty());
}

#[test]
fn vote_past_last_stage_ends_the_game() {
    // Final stage advances to interim past the end instead of ending directly.
    let registry = scripted_registry(2, false);
    let mut room = RoomCore::new("session-2", Questionnaire::default(), registry, 42);
    let full = roster(&[Role::Player1, Role::Player2]);
    room.roster_changed(&full);

    both_ready(&mut room, &full);
    room.handle_message(Role::Player1, "finish", &Value::Null, &full); // -> interim 2
    both_ready(&mut room, &full);
    room.handle_message(Role::Player1, "finish", &Value::Null, &full); // -> interim 3 (past end)

    assert_eq!(room.state().game_state, GamePhase::InterimScreen);
    assert_eq!(room.state().current_stage_index, 3);

    both_ready(&mut room, &full);
    assert_eq!(room.state().game_state, GamePhase::Ended);
    assert!(room.state().current_stage_index >= STAGE_ENDED);
    let effects = room.take_effects();
    assert_eq!(
        effects.iter().filter(|e| **e == RoomEffect::SessionUsed).count(),
        1
    );
}

#[test]
fn stage_entry_reinitializes_the_payload() {
    let (mut room, full) = room_with_both_players();
    both_ready(&mut room, &full);
    room.handle_message(Role::Player1, "move", &Value::Null, &full);
    room.handle_message(Role::Player1, "finish", &Value::Null, &full);
    both_ready(&mut room, &full);

    // Stage 2's payload is fresh; stage 1's `moves` counter did not survive.
    let payload: Value = serde_json::from_str(room.stage_payload_json()).expect("payload");
    assert_eq!(payload["stage"], json!(2));
    assert_eq!(payload["moves"], json!(0));
}

#[test]
fn non_monotonic_advance_is_ignored() {
    let registry = scripted_registry(3, true);
    let mut room =
        RoomCore::with_stage_override("session-3", Questionnaire::default(), registry, 42, 2);

    room.advance_to_interim(1);
    assert_eq!(room.state().current_stage_index, 2);
    assert_eq!(room.state().game_state, GamePhase::InProgress);

    room.advance_to_interim(2);
    assert_eq!(room.state().game_state, GamePhase::InProgress);
}

#[test]
fn stage_override_seam_starts_mid_game() {
    let registry = scripted_registry(3, true);
    let room =
        RoomCore::with_stage_override("session-4", Questionnaire::default(), registry, 42, 3);

    assert_eq!(room.state().game_state, GamePhase::InProgress);
    assert_eq!(room.state().current_stage_index, 3);
    assert!(room.state().game_started);
    assert!(!room.state().stage_payload_json.is_empty());
}

#[test]
fn history_mirror_tracks_appends() {
    let (mut room, full) = room_with_both_players();
    both_ready(&mut room, &full);

    assert_eq!(room.state().game_history_json, "[]");
    room.handle_message(Role::Player1, "finish", &Value::Null, &full);
    assert!(room.state().game_history_json.contains("\"stageIndex\":1"));
    assert!(room.state().game_history_json.contains("\"finishedBy\":\"player1\""));
}

#[test]
fn version_changes_only_on_mutation() {
    let mut room = fresh_room();
    let v0 = room.version();

    let solo = roster(&[Role::Player1]);
    room.roster_changed(&solo);
    let v1 = room.version();
    assert!(v1 > v0, "player count mirror changed");

    // Same roster again: nothing changed, no broadcast needed.
    room.roster_changed(&solo);
    assert_eq!(room.version(), v1);
}
