use std::collections::BTreeSet;

use rand_chacha::rand_core::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde_json::Value;
use tracing::{debug, warn};

use crate::domain::history::HistoryLog;
use crate::domain::phase::GamePhase;
use crate::domain::questionnaire::Questionnaire;
use crate::domain::role::Role;
use crate::domain::seeds::derive_stage_seed;
use crate::domain::stage::StageRegistry;
use crate::domain::synced_state::{SyncedState, STAGE_ENDED};

/// Orchestrator-level message type for the ready-voting protocol. The only
/// message the room itself interprets; every other type is stage-defined.
pub const READY_SIGNAL: &str = "ready";

/// Side effects requested by the pure core, drained and executed by the
/// actor shell after each operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomEffect {
    /// Notify the external session service that the session is consumed.
    /// Emitted exactly once per room.
    SessionUsed,
    /// Start the terminal grace timer after which the room tears down.
    ScheduleTeardown,
}

/// What the room actor needs to know about who is currently connected.
#[derive(Debug, Clone, Default)]
pub struct RosterSnapshot {
    /// All connected clients, viewer included.
    pub connected_clients: usize,
    /// Distinct player roles currently connected.
    pub player_roles: BTreeSet<Role>,
}

impl RosterSnapshot {
    pub fn player_count(&self) -> usize {
        self.player_roles.len()
    }
}

/// The single-writer core of one game session.
///
/// Owns the synchronized state, questionnaire snapshot, history log, and the
/// ready-voting bookkeeping. Performs no I/O: network-visible side effects
/// are queued as [`RoomEffect`]s for the actor shell. Every mutation bumps
/// an internal version so the shell knows when to broadcast.
pub struct RoomCore {
    session_id: String,
    registry: &'static StageRegistry,
    state: SyncedState,
    questionnaire: Questionnaire,
    history: HistoryLog,
    ready_roles: BTreeSet<Role>,
    base_seed: u64,
    rng: ChaCha8Rng,
    session_consumed: bool,
    effects: Vec<RoomEffect>,
    version: u64,
}

impl RoomCore {
    pub fn new(
        session_id: impl Into<String>,
        questionnaire: Questionnaire,
        registry: &'static StageRegistry,
        base_seed: u64,
    ) -> Self {
        let questionnaire_json =
            serde_json::to_string(&questionnaire).unwrap_or_else(|_| "{}".to_string());
        Self {
            session_id: session_id.into(),
            registry,
            state: SyncedState::waiting(questionnaire_json),
            questionnaire,
            history: HistoryLog::new(),
            ready_roles: BTreeSet::new(),
            base_seed,
            rng: ChaCha8Rng::seed_from_u64(base_seed),
            session_consumed: false,
            effects: Vec::new(),
            version: 0,
        }
    }

    /// Developer/test seam: a room pre-populated at an arbitrary stage,
    /// already `IN_PROGRESS`. Not reachable from the production join path.
    pub fn with_stage_override(
        session_id: impl Into<String>,
        questionnaire: Questionnaire,
        registry: &'static StageRegistry,
        base_seed: u64,
        stage_index: u32,
    ) -> Self {
        let mut core = Self::new(session_id, questionnaire, registry, base_seed);
        core.state.game_started = true;
        core.enter_stage(stage_index);
        core
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn state(&self) -> &SyncedState {
        &self.state
    }

    pub fn questionnaire(&self) -> &Questionnaire {
        &self.questionnaire
    }

    pub fn history(&self) -> &HistoryLog {
        &self.history
    }

    /// Monotonic mutation counter; the actor broadcasts when it changes.
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn take_effects(&mut self) -> Vec<RoomEffect> {
        std::mem::take(&mut self.effects)
    }

    /// Room RNG. Reseeded deterministically on every stage entry so replays
    /// with the same base seed reproduce identical draws.
    pub fn rng(&mut self) -> &mut ChaCha8Rng {
        &mut self.rng
    }

    fn touch(&mut self) {
        self.version += 1;
    }

    // ---- roster ---------------------------------------------------------

    /// Record a roster change (join, leave, reconnection expiry).
    ///
    /// Fires `WAITING_FOR_START → INTERIM_SCREEN` exactly when the count of
    /// distinct connected player roles reaches 2 while still waiting.
    pub fn roster_changed(&mut self, roster: &RosterSnapshot) {
        let count = roster.connected_clients as u32;
        if self.state.player_count != count {
            self.state.player_count = count;
            self.touch();
        }

        if self.state.game_state == GamePhase::WaitingForStart && roster.player_count() == 2 {
            self.state.game_started = true;
            self.begin_interim(1);
            debug!(
                session_id = %self.session_id,
                "[ROOM] both players present, entering interim for stage 1"
            );
            return;
        }

        // A quorum shrink (partner dropped during the ready screen) may
        // complete a vote that was already cast.
        self.try_complete_ready_vote(roster);
    }

    // ---- message dispatch -----------------------------------------------

    /// Dispatch one inbound client message. Returns whether anything
    /// recognized it; unrecognized messages are dropped silently.
    pub fn handle_message(
        &mut self,
        sender: Role,
        msg_type: &str,
        data: &Value,
        roster: &RosterSnapshot,
    ) -> bool {
        match self.state.game_state {
            GamePhase::WaitingForStart | GamePhase::Ended => false,
            GamePhase::InterimScreen => {
                if msg_type == READY_SIGNAL {
                    self.handle_ready(sender, roster);
                    true
                } else {
                    false
                }
            }
            GamePhase::InProgress => {
                let registry = self.registry;
                let Some(stage) = registry.get(self.state.current_stage_index) else {
                    warn!(
                        session_id = %self.session_id,
                        stage_index = self.state.current_stage_index,
                        "[ROOM] no stage registered for active index, dropping message"
                    );
                    return false;
                };
                stage.on_message(self, sender, msg_type, data)
            }
        }
    }

    /// Ready-voting protocol, executed only during `INTERIM_SCREEN`.
    ///
    /// One idempotent mark per player role. Completes when the number of
    /// distinct ready roles reaches `min(2, connected player roles)`, so a
    /// lone connected player can advance alone and a session stays playable
    /// across a partner's reconnection gap.
    fn handle_ready(&mut self, sender: Role, roster: &RosterSnapshot) {
        if !sender.is_player() {
            return;
        }
        if self.ready_roles.insert(sender) {
            self.state.ready_for_next_count = self.ready_roles.len() as u32;
            self.touch();
        }
        self.try_complete_ready_vote(roster);
    }

    fn try_complete_ready_vote(&mut self, roster: &RosterSnapshot) {
        if self.state.game_state != GamePhase::InterimScreen || self.ready_roles.is_empty() {
            return;
        }
        // With nobody connected the room just waits out the reconnection
        // windows; the vote is re-evaluated when someone returns.
        if roster.player_count() == 0 {
            return;
        }
        let quorum = roster.player_count().clamp(1, 2);
        if self.ready_roles.len() >= quorum {
            let pending = self.state.current_stage_index;
            if pending > self.registry.count() {
                self.finish();
            } else {
                self.enter_stage(pending);
            }
        }
    }

    // ---- stage-facing operations ----------------------------------------

    /// Stage-called: the active stage is done; show the ready screen gating
    /// entry into `next`. Clears ready marks and installs the next stage's
    /// interim title.
    pub fn advance_to_interim(&mut self, next: u32) {
        if self.state.game_state != GamePhase::InProgress {
            warn!(
                session_id = %self.session_id,
                next,
                "[ROOM] advance_to_interim outside IN_PROGRESS, ignoring"
            );
            return;
        }
        if next <= self.state.current_stage_index {
            warn!(
                session_id = %self.session_id,
                current = self.state.current_stage_index,
                next,
                "[ROOM] non-monotonic stage advance, ignoring"
            );
            return;
        }
        self.begin_interim(next);
    }

    /// Stage-called from the final stage: end the game now.
    pub fn advance_to_end(&mut self) {
        if self.state.game_state != GamePhase::InProgress {
            warn!(
                session_id = %self.session_id,
                "[ROOM] advance_to_end outside IN_PROGRESS, ignoring"
            );
            return;
        }
        self.finish();
    }

    /// Append one completed stage's summary. The orchestrator never
    /// interprets the payload; it only appends and re-serializes the mirror.
    pub fn add_to_history(&mut self, stage_index: u32, payload: Value) {
        self.history.append(stage_index, payload);
        self.state.game_history_json = self.history.to_json();
        self.touch();
    }

    pub fn stage_payload_json(&self) -> &str {
        &self.state.stage_payload_json
    }

    pub fn set_stage_payload(&mut self, json: String) {
        self.state.stage_payload_json = json;
        self.touch();
    }

    pub fn set_stage_texts(
        &mut self,
        tv_text: impl Into<String>,
        player1_text: impl Into<String>,
        player2_text: impl Into<String>,
    ) {
        self.state.tv_text = tv_text.into();
        self.state.player1_text = player1_text.into();
        self.state.player2_text = player2_text.into();
        self.touch();
    }

    pub fn set_message(&mut self, message: impl Into<String>) {
        self.state.message = message.into();
        self.touch();
    }

    // ---- transitions -----------------------------------------------------

    fn begin_interim(&mut self, pending_stage: u32) {
        self.ready_roles.clear();
        self.state.ready_for_next_count = 0;
        self.state.current_stage_index = pending_stage;
        self.state.game_state = GamePhase::InterimScreen;
        let title = self.registry.interim_title_for(pending_stage).to_string();
        self.state.message = title.clone();
        self.state.tv_text = title;
        self.state.player1_text = String::new();
        self.state.player2_text = String::new();
        self.touch();
    }

    /// Activate the stage at `index`: fresh payload, cleared ready state,
    /// reseeded RNG, then the stage's `on_enter`. Called exactly once per
    /// stage activation.
    pub fn enter_stage(&mut self, index: u32) {
        let registry = self.registry;
        let Some(stage) = registry.get(index) else {
            warn!(
                session_id = %self.session_id,
                stage_index = index,
                "[ROOM] enter_stage for unregistered index, ending game"
            );
            self.finish();
            return;
        };
        self.ready_roles.clear();
        self.state.ready_for_next_count = 0;
        self.state.stage_payload_json = String::new();
        self.state.current_stage_index = index;
        self.state.game_state = GamePhase::InProgress;
        self.state.message = String::new();
        self.rng = ChaCha8Rng::seed_from_u64(derive_stage_seed(self.base_seed, index));
        stage.on_enter(self);
        self.touch();
    }

    fn finish(&mut self) {
        if self.state.game_state == GamePhase::Ended {
            return;
        }
        self.ready_roles.clear();
        self.state.ready_for_next_count = 0;
        self.state.current_stage_index = STAGE_ENDED;
        self.state.game_state = GamePhase::Ended;
        self.state.message = "You won the game!".to_string();
        if !self.session_consumed {
            self.session_consumed = true;
            self.effects.push(RoomEffect::SessionUsed);
        }
        self.effects.push(RoomEffect::ScheduleTeardown);
        self.touch();
    }
}
