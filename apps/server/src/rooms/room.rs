use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use actix::prelude::*;
use serde_json::Value;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::GameConfig;
use crate::domain::questionnaire::Questionnaire;
use crate::domain::role::Role;
use crate::domain::room_core::{RoomCore, RoomEffect, RosterSnapshot};
use crate::domain::stage::StageRegistry;
use crate::domain::synced_state::SyncedState;
use crate::rooms::registry::RoomRegistry;
use crate::validator::SessionValidator;

/// Timer knobs for one room, copied out of the server config.
#[derive(Debug, Clone, Copy)]
pub struct RoomTimings {
    pub reconnect_window: Duration,
    pub end_teardown: Duration,
}

impl From<&GameConfig> for RoomTimings {
    fn from(config: &GameConfig) -> Self {
        Self {
            reconnect_window: config.reconnect_window,
            end_teardown: config.end_teardown,
        }
    }
}

// ---- messages ------------------------------------------------------------

/// Register a connection under a role. Sent by the websocket session once
/// the upgrade (and admission) has already succeeded.
#[derive(Message)]
#[rtype(result = "Result<JoinAck, JoinRejection>")]
pub struct Connect {
    pub conn_id: Uuid,
    pub role: Role,
    pub recipient: Recipient<SessionEvent>,
}

#[derive(Debug, Clone)]
pub struct JoinAck {
    pub state: SyncedState,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinRejection {
    /// The role is already held by a live connection.
    RoleTaken,
}

#[derive(Message)]
#[rtype(result = "()")]
pub struct Disconnect {
    pub conn_id: Uuid,
    /// An explicit leave gets no reconnection window; a dropped transport
    /// does.
    pub consented: bool,
}

/// One inbound client message, already parsed from the wire envelope.
#[derive(Message)]
#[rtype(result = "()")]
pub struct Inbound {
    pub conn_id: Uuid,
    pub msg_type: String,
    pub data: Value,
}

/// Room-to-session events.
#[derive(Message, Clone)]
#[rtype(result = "()")]
pub enum SessionEvent {
    /// Full synchronized state; pushed on join and on every mutation.
    State(SyncedState),
    /// The room is gone; the session should close.
    Closed,
}

// ---- actor ---------------------------------------------------------------

struct RosterEntry {
    role: Role,
    recipient: Recipient<SessionEvent>,
    connected: bool,
    reconnect_timer: Option<SpawnHandle>,
}

/// One live game session. A single-threaded actix mailbox makes every
/// handler atomic with respect to other messages in the same room, so the
/// core needs no locks.
pub struct GameRoom {
    core: RoomCore,
    roster: HashMap<Uuid, RosterEntry>,
    timings: RoomTimings,
    validator: Arc<dyn SessionValidator>,
    rooms: Arc<RoomRegistry>,
    teardown_handle: Option<SpawnHandle>,
}

impl GameRoom {
    pub fn new(
        session_id: impl Into<String>,
        questionnaire: Questionnaire,
        stage_registry: &'static StageRegistry,
        base_seed: u64,
        timings: RoomTimings,
        validator: Arc<dyn SessionValidator>,
        rooms: Arc<RoomRegistry>,
    ) -> Self {
        Self {
            core: RoomCore::new(session_id, questionnaire, stage_registry, base_seed),
            roster: HashMap::new(),
            timings,
            validator,
            rooms,
            teardown_handle: None,
        }
    }

    /// Developer/test seam mirroring [`RoomCore::with_stage_override`]:
    /// the room starts mid-game at `stage_index`. Never used by the
    /// production join path.
    pub fn with_stage_override(
        session_id: impl Into<String>,
        questionnaire: Questionnaire,
        stage_registry: &'static StageRegistry,
        base_seed: u64,
        timings: RoomTimings,
        validator: Arc<dyn SessionValidator>,
        rooms: Arc<RoomRegistry>,
        stage_index: u32,
    ) -> Self {
        Self {
            core: RoomCore::with_stage_override(
                session_id,
                questionnaire,
                stage_registry,
                base_seed,
                stage_index,
            ),
            roster: HashMap::new(),
            timings,
            validator,
            rooms,
            teardown_handle: None,
        }
    }

    fn roster_snapshot(&self) -> RosterSnapshot {
        RosterSnapshot {
            connected_clients: self.roster.values().filter(|e| e.connected).count(),
            player_roles: self
                .roster
                .values()
                .filter(|e| e.connected && e.role.is_player())
                .map(|e| e.role)
                .collect(),
        }
    }

    fn broadcast(&self) {
        let state = self.core.state().clone();
        for entry in self.roster.values().filter(|e| e.connected) {
            entry.recipient.do_send(SessionEvent::State(state.clone()));
        }
    }

    /// Drain queued effects and broadcast if the core mutated.
    fn after_core_op(&mut self, version_before: u64, ctx: &mut Context<Self>) {
        for effect in self.core.take_effects() {
            match effect {
                RoomEffect::SessionUsed => {
                    // Fire-and-forget: a late or failed notification never
                    // blocks teardown; completion after teardown is harmless.
                    let validator = self.validator.clone();
                    let session_id = self.core.session_id().to_string();
                    actix::spawn(async move {
                        validator.mark_used(&session_id).await;
                    });
                }
                RoomEffect::ScheduleTeardown => self.schedule_teardown(ctx),
            }
        }

        if self.core.version() != version_before {
            self.broadcast();
        }
    }

    fn schedule_teardown(&mut self, ctx: &mut Context<Self>) {
        if self.teardown_handle.is_some() {
            return;
        }
        info!(
            session_id = %self.core.session_id(),
            grace_secs = self.timings.end_teardown.as_secs_f64(),
            "[ROOM] game ended, scheduling teardown"
        );
        let handle = ctx.run_later(self.timings.end_teardown, |actor, ctx| {
            info!(
                session_id = %actor.core.session_id(),
                "[ROOM] terminal grace elapsed, closing room"
            );
            ctx.stop();
        });
        self.teardown_handle = Some(handle);
    }

    fn reconnect_expired(&mut self, conn_id: Uuid, ctx: &mut Context<Self>) {
        let expired = matches!(self.roster.get(&conn_id), Some(entry) if !entry.connected);
        if !expired {
            return;
        }
        let entry = match self.roster.remove(&conn_id) {
            Some(entry) => entry,
            None => return,
        };
        info!(
            session_id = %self.core.session_id(),
            role = %entry.role,
            conn_id = %conn_id,
            "[ROOM] reconnection window elapsed, releasing role"
        );
        let version = self.core.version();
        let snapshot = self.roster_snapshot();
        self.core.roster_changed(&snapshot);
        self.after_core_op(version, ctx);
        self.stop_if_abandoned(ctx);
    }

    fn stop_if_abandoned(&mut self, ctx: &mut Context<Self>) {
        if self.roster.is_empty() {
            info!(
                session_id = %self.core.session_id(),
                "[ROOM] no clients left past their windows, closing room"
            );
            ctx.stop();
        }
    }
}

impl Actor for GameRoom {
    type Context = Context<Self>;

    fn started(&mut self, _ctx: &mut Self::Context) {
        info!(
            session_id = %self.core.session_id(),
            "[ROOM] room created"
        );
    }

    fn stopped(&mut self, _ctx: &mut Self::Context) {
        // Pending timers die with the context; in-flight mark_used tasks
        // were spawned detached and complete (or fail) on their own.
        for entry in self.roster.values().filter(|e| e.connected) {
            entry.recipient.do_send(SessionEvent::Closed);
        }
        self.rooms.remove(self.core.session_id());
        info!(
            session_id = %self.core.session_id(),
            "[ROOM] room destroyed"
        );
    }
}

impl Handler<Connect> for GameRoom {
    type Result = Result<JoinAck, JoinRejection>;

    fn handle(&mut self, msg: Connect, ctx: &mut Self::Context) -> Self::Result {
        // One live connection per role. A role inside its reconnection
        // window resumes; a live duplicate is rejected.
        let existing = self
            .roster
            .iter()
            .find(|(_, entry)| entry.role == msg.role)
            .map(|(id, entry)| (*id, entry.connected));

        if let Some((old_conn, connected)) = existing {
            if connected {
                warn!(
                    session_id = %self.core.session_id(),
                    role = %msg.role,
                    "[ROOM] rejected join: role already connected"
                );
                return Err(JoinRejection::RoleTaken);
            }
            if let Some(entry) = self.roster.remove(&old_conn) {
                if let Some(handle) = entry.reconnect_timer {
                    ctx.cancel_future(handle);
                }
            }
            info!(
                session_id = %self.core.session_id(),
                role = %msg.role,
                conn_id = %msg.conn_id,
                "[ROOM] client reconnected within grace window"
            );
        } else {
            info!(
                session_id = %self.core.session_id(),
                role = %msg.role,
                conn_id = %msg.conn_id,
                "[ROOM] client joined"
            );
        }

        self.roster.insert(
            msg.conn_id,
            RosterEntry {
                role: msg.role,
                recipient: msg.recipient,
                connected: true,
                reconnect_timer: None,
            },
        );

        let version = self.core.version();
        let snapshot = self.roster_snapshot();
        self.core.roster_changed(&snapshot);
        self.after_core_op(version, ctx);

        Ok(JoinAck {
            state: self.core.state().clone(),
        })
    }
}

impl Handler<Disconnect> for GameRoom {
    type Result = ();

    fn handle(&mut self, msg: Disconnect, ctx: &mut Self::Context) -> Self::Result {
        if !self.roster.contains_key(&msg.conn_id) {
            return;
        }

        if msg.consented {
            // Explicit leave: no grace window.
            if let Some(entry) = self.roster.remove(&msg.conn_id) {
                if let Some(handle) = entry.reconnect_timer {
                    ctx.cancel_future(handle);
                }
                info!(
                    session_id = %self.core.session_id(),
                    role = %entry.role,
                    conn_id = %msg.conn_id,
                    "[ROOM] client left"
                );
            }
        } else {
            let conn_id = msg.conn_id;
            let window = self.timings.reconnect_window;
            let handle = ctx.run_later(window, move |actor, ctx| {
                actor.reconnect_expired(conn_id, ctx);
            });
            if let Some(entry) = self.roster.get_mut(&msg.conn_id) {
                if entry.connected {
                    entry.connected = false;
                    entry.reconnect_timer = Some(handle);
                    info!(
                        session_id = %self.core.session_id(),
                        role = %entry.role,
                        conn_id = %msg.conn_id,
                        window_secs = window.as_secs_f64(),
                        "[ROOM] client dropped, holding role for reconnection"
                    );
                } else {
                    ctx.cancel_future(handle);
                }
            }
        }

        let version = self.core.version();
        let snapshot = self.roster_snapshot();
        self.core.roster_changed(&snapshot);
        self.after_core_op(version, ctx);
        self.stop_if_abandoned(ctx);
    }
}

impl Handler<Inbound> for GameRoom {
    type Result = ();

    fn handle(&mut self, msg: Inbound, ctx: &mut Self::Context) -> Self::Result {
        let Some(role) = self
            .roster
            .get(&msg.conn_id)
            .filter(|entry| entry.connected)
            .map(|entry| entry.role)
        else {
            return;
        };

        let version = self.core.version();
        let snapshot = self.roster_snapshot();
        let handled = self
            .core
            .handle_message(role, &msg.msg_type, &msg.data, &snapshot);
        if !handled {
            // Expected noise: late messages from a stage the client already
            // left, or types this phase does not accept.
            debug!(
                session_id = %self.core.session_id(),
                role = %role,
                msg_type = %msg.msg_type,
                "[ROOM] dropped unrecognized message"
            );
        }
        self.after_core_op(version, ctx);
    }
}
