use std::collections::BTreeSet;

use proptest::prelude::*;
use serde_json::Value;

use crate::domain::questionnaire::Questionnaire;
use crate::domain::role::Role;
use crate::domain::room_core::{RoomCore, RosterSnapshot, READY_SIGNAL};
use crate::domain::test_stages::scripted_registry;

fn full_roster() -> RosterSnapshot {
    RosterSnapshot {
        connected_clients: 2,
        player_roles: [Role::Player1, Role::Player2]
            .into_iter()
            .collect::<BTreeSet<_>>(),
    }
}

fn arb_role() -> impl Strategy<Value = Role> {
    prop_oneof![
        Just(Role::Player1),
        Just(Role::Player2),
        Just(Role::Tv),
    ]
}

fn arb_msg_type() -> impl Strategy<Value = &'static str> {
    prop_oneof![
        Just(READY_SIGNAL),
        Just("move"),
        Just("finish"),
        Just("bogus"),
    ]
}

proptest! {
    /// Under any message sequence: the stage index never decreases, the
    /// ready counter never exceeds the player count, and history only grows.
    #[test]
    fn orchestrator_invariants_hold_under_arbitrary_messages(
        script in proptest::collection::vec((arb_role(), arb_msg_type()), 0..60),
    ) {
        let registry = scripted_registry(3, true);
        let mut room = RoomCore::new("prop-session", Questionnaire::default(), registry, 7);
        let roster = full_roster();
        room.roster_changed(&roster);

        let mut last_stage_index = room.state().current_stage_index;
        let mut last_history_len = room.history().len();
        let mut last_history_json = room.state().game_history_json.clone();

        for (sender, msg_type) in script {
            room.handle_message(sender, msg_type, &Value::Null, &roster);

            let state = room.state();
            prop_assert!(
                state.current_stage_index >= last_stage_index,
                "stage index regressed: {} -> {}",
                last_stage_index,
                state.current_stage_index
            );
            prop_assert!(state.ready_for_next_count <= 2);

            // Append-only: earlier entries are a prefix of the new mirror.
            prop_assert!(room.history().len() >= last_history_len);
            if room.history().len() == last_history_len {
                prop_assert_eq!(&state.game_history_json, &last_history_json);
            }

            last_stage_index = state.current_stage_index;
            last_history_len = room.history().len();
            last_history_json = state.game_history_json.clone();
        }
    }

    /// Replaying the same script against the same seed reproduces the same
    /// state and history byte-for-byte.
    #[test]
    fn replay_is_deterministic(
        script in proptest::collection::vec((arb_role(), arb_msg_type()), 0..40),
        seed in any::<u64>(),
    ) {
        let registry = scripted_registry(3, true);
        let roster = full_roster();

        let mut first = RoomCore::new("replay", Questionnaire::default(), registry, seed);
        let mut second = RoomCore::new("replay", Questionnaire::default(), registry, seed);
        first.roster_changed(&roster);
        second.roster_changed(&roster);

        for (sender, msg_type) in &script {
            first.handle_message(*sender, msg_type, &Value::Null, &roster);
        }
        for (sender, msg_type) in &script {
            second.handle_message(*sender, msg_type, &Value::Null, &roster);
        }

        prop_assert_eq!(first.state(), second.state());
        prop_assert_eq!(
            first.state().game_history_json.clone(),
            second.state().game_history_json.clone()
        );
    }
}
