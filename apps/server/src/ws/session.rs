use std::time::{Duration, Instant};

use actix::prelude::*;
use actix_web::{web, Error, HttpRequest, HttpResponse};
use actix_web_actors::ws;
use serde::Deserialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::domain::role::Role;
use crate::error::AppError;
use crate::rooms::room::{Connect, Disconnect, GameRoom, Inbound, JoinRejection, SessionEvent};
use crate::rooms::RoomTimings;
use crate::state::app_state::AppState;
use crate::stages;
use crate::ws::protocol::{ClientMsg, ErrorCode, ServerMsg};

const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(20);
const CLIENT_TIMEOUT: Duration = Duration::from_secs(40);

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinQuery {
    #[serde(default)]
    pub session_id: String,
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub role: String,
}

/// Admission + websocket upgrade.
///
/// Authentication happens here, before the socket exists: the validator is
/// consulted exactly once per join, and a negative or erroring result
/// rejects the request with no room state created.
pub async fn join(
    req: HttpRequest,
    stream: web::Payload,
    query: web::Query<JoinQuery>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, Error> {
    let query = query.into_inner();
    if query.session_id.is_empty() || query.token.is_empty() || query.role.is_empty() {
        return Err(AppError::bad_request(
            "MISSING_FIELDS",
            "sessionId, token and role are required".to_string(),
        )
        .into());
    }

    let role: Role = query
        .role
        .parse()
        .map_err(|_| AppError::invalid_role(&query.role))?;

    // Reject a bad upgrade before consulting the validator or touching the
    // room registry: a failed handshake must leave no partial room behind.
    ws::handshake(&req).map_err(Error::from)?;

    let outcome = app_state
        .validator()
        .validate(&query.session_id, &query.token, role)
        .await;
    if !outcome.valid {
        info!(
            session_id = %query.session_id,
            role = %role,
            "[WS SESSION] join rejected: invalid credentials"
        );
        return Err(AppError::invalid_link().into());
    }

    let questionnaire = outcome.questionnaire.unwrap_or_default();
    let room = app_state.rooms().get_or_create(
        &query.session_id,
        questionnaire,
        stages::registry(),
        RoomTimings::from(app_state.config()),
        app_state.validator(),
    );

    let session = WsSession::new(query.session_id, role, room);
    ws::start(session, &req, stream)
}

pub struct WsSession {
    conn_id: Uuid,
    session_id: String,
    role: Role,
    room: Addr<GameRoom>,
    last_heartbeat: Instant,
    heartbeat_handle: Option<actix::SpawnHandle>,
    disconnect_sent: bool,
}

impl WsSession {
    fn new(session_id: String, role: Role, room: Addr<GameRoom>) -> Self {
        Self {
            conn_id: Uuid::new_v4(),
            session_id,
            role,
            room,
            last_heartbeat: Instant::now(),
            heartbeat_handle: None,
            disconnect_sent: false,
        }
    }

    fn send_json(ctx: &mut ws::WebsocketContext<Self>, msg: &ServerMsg) {
        match serde_json::to_string(msg) {
            Ok(payload) => ctx.text(payload),
            Err(err) => warn!(error = %err, "[WS SESSION] failed to serialize outbound message"),
        }
    }

    fn start_heartbeat(&mut self, ctx: &mut ws::WebsocketContext<Self>) {
        let handle = ctx.run_interval(HEARTBEAT_INTERVAL, |actor, ctx| {
            if Instant::now().duration_since(actor.last_heartbeat) > CLIENT_TIMEOUT {
                warn!(
                    conn_id = %actor.conn_id,
                    session_id = %actor.session_id,
                    role = %actor.role,
                    "[WS SESSION] heartbeat timed out"
                );
                // A dead transport is an unintentional disconnect; the room
                // holds the role for the reconnection window.
                ctx.close(Some(ws::CloseReason::from(ws::CloseCode::Normal)));
                ctx.stop();
                return;
            }
            ctx.ping(b"keepalive");
        });
        self.heartbeat_handle = Some(handle);
    }

    fn leave_room(&mut self, consented: bool) {
        if self.disconnect_sent {
            return;
        }
        self.disconnect_sent = true;
        self.room.do_send(Disconnect {
            conn_id: self.conn_id,
            consented,
        });
    }
}

impl Actor for WsSession {
    type Context = ws::WebsocketContext<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        info!(
            conn_id = %self.conn_id,
            session_id = %self.session_id,
            role = %self.role,
            "[WS SESSION] started"
        );
        self.start_heartbeat(ctx);

        let connect = Connect {
            conn_id: self.conn_id,
            role: self.role,
            recipient: ctx.address().recipient(),
        };
        self.room
            .send(connect)
            .into_actor(self)
            .map(|res, actor, ctx| {
                match res {
                    Ok(Ok(ack)) => {
                        Self::send_json(ctx, &ServerMsg::Connected { role: actor.role });
                        Self::send_json(ctx, &ServerMsg::State { state: ack.state });
                    }
                    Ok(Err(JoinRejection::RoleTaken)) => {
                        warn!(
                            conn_id = %actor.conn_id,
                            session_id = %actor.session_id,
                            role = %actor.role,
                            "[WS SESSION] role already connected"
                        );
                        // Never registered: don't send a disconnect later.
                        actor.disconnect_sent = true;
                        Self::send_json(
                            ctx,
                            &ServerMsg::Error {
                                code: ErrorCode::RoleTaken,
                                message: "This role is already connected".to_string(),
                            },
                        );
                        ctx.close(Some(ws::CloseReason::from(ws::CloseCode::Policy)));
                        ctx.stop();
                    }
                    Err(err) => {
                        warn!(
                            conn_id = %actor.conn_id,
                            session_id = %actor.session_id,
                            error = %err,
                            "[WS SESSION] room unavailable"
                        );
                        actor.disconnect_sent = true;
                        Self::send_json(
                            ctx,
                            &ServerMsg::Error {
                                code: ErrorCode::RoomClosed,
                                message: "Room is no longer available".to_string(),
                            },
                        );
                        ctx.close(Some(ws::CloseReason::from(ws::CloseCode::Error)));
                        ctx.stop();
                    }
                }
            })
            .wait(ctx);
    }

    fn stopped(&mut self, _ctx: &mut Self::Context) {
        // Reaching here without an explicit leave means the transport died.
        self.leave_room(false);
        info!(
            conn_id = %self.conn_id,
            session_id = %self.session_id,
            role = %self.role,
            "[WS SESSION] stopped"
        );
    }
}

impl StreamHandler<Result<ws::Message, ws::ProtocolError>> for WsSession {
    fn handle(&mut self, msg: Result<ws::Message, ws::ProtocolError>, ctx: &mut Self::Context) {
        match msg {
            Ok(ws::Message::Ping(payload)) => {
                self.last_heartbeat = Instant::now();
                ctx.pong(&payload);
            }
            Ok(ws::Message::Pong(_)) => {
                self.last_heartbeat = Instant::now();
            }
            Ok(ws::Message::Text(text)) => {
                self.last_heartbeat = Instant::now();

                match serde_json::from_str::<ClientMsg>(&text) {
                    Ok(msg) => self.room.do_send(Inbound {
                        conn_id: self.conn_id,
                        msg_type: msg.msg_type,
                        data: msg.data,
                    }),
                    Err(err) => {
                        // Malformed shapes are ignored, never surfaced.
                        debug!(
                            conn_id = %self.conn_id,
                            error = %err,
                            "[WS SESSION] dropped malformed message"
                        );
                    }
                }
            }
            Ok(ws::Message::Binary(_)) => {
                self.last_heartbeat = Instant::now();
            }
            Ok(ws::Message::Close(reason)) => {
                // An explicit close is a consented leave: no grace window.
                self.leave_room(true);
                ctx.close(reason);
                ctx.stop();
            }
            Ok(ws::Message::Continuation(_)) => {
                self.last_heartbeat = Instant::now();
            }
            Ok(ws::Message::Nop) => {
                self.last_heartbeat = Instant::now();
            }
            Err(err) => {
                warn!(
                    conn_id = %self.conn_id,
                    session_id = %self.session_id,
                    error = %err,
                    "[WS SESSION] protocol error"
                );
                ctx.close(Some(ws::CloseReason::from(ws::CloseCode::Error)));
                ctx.stop();
            }
        }
    }
}

impl Handler<SessionEvent> for WsSession {
    type Result = ();

    fn handle(&mut self, msg: SessionEvent, ctx: &mut Self::Context) -> Self::Result {
        match msg {
            SessionEvent::State(state) => {
                Self::send_json(ctx, &ServerMsg::State { state });
            }
            SessionEvent::Closed => {
                self.disconnect_sent = true;
                if let Some(handle) = self.heartbeat_handle.take() {
                    ctx.cancel_future(handle);
                }
                ctx.close(Some(ws::CloseReason::from(ws::CloseCode::Normal)));
                ctx.stop();
            }
        }
    }
}
