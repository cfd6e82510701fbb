//! The per-client actor behind `GET /ws`.
//!
//! Each connection is registered in the [`SubscriptionRegistry`] on arrival
//! and removed when the session stops. Inbound "fetch near me" frames run a
//! snapshot query off the actor thread; everything pushed at the connection
//! (snapshot replies and live fan-out alike) travels through the registry
//! channel and is forwarded into the actor mailbox.

use crate::metrics;
use crate::middleware::verify_token;
use crate::models::{Region, TimeWindow};
use crate::services::snapshot::SnapshotService;
use crate::state::AppState;
use crate::websocket::messages::{ClientMessage, ServerMessage};
use crate::websocket::registry::{ConnectionId, SubscriptionRegistry};
use actix::{
    Actor, ActorContext, AsyncContext, Handler, Message as ActixMessage, StreamHandler,
};
use actix_web::{web, Error, HttpRequest, HttpResponse};
use actix_web_actors::ws;
use serde::Deserialize;
use std::time::{Duration, Instant};

const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(5);
const CLIENT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(ActixMessage)]
#[rtype(result = "()")]
pub struct OutboundFrame(pub String);

pub struct NearMeSession {
    connection_id: ConnectionId,
    user_id: i32,
    registry: SubscriptionRegistry,
    snapshot: SnapshotService,
    hb: Instant,
}

impl NearMeSession {
    fn new(
        connection_id: ConnectionId,
        user_id: i32,
        registry: SubscriptionRegistry,
        snapshot: SnapshotService,
    ) -> Self {
        Self {
            connection_id,
            user_id,
            registry,
            snapshot,
            hb: Instant::now(),
        }
    }

    fn hb(&self, ctx: &mut ws::WebsocketContext<Self>) {
        ctx.run_interval(HEARTBEAT_INTERVAL, |act, ctx| {
            if Instant::now().duration_since(act.hb) > CLIENT_TIMEOUT {
                tracing::warn!(connection = %act.connection_id, "heartbeat timed out");
                ctx.stop();
                return;
            }
            ctx.ping(b"");
        });
    }

    fn handle_fetch_near_me(
        &self,
        region: Region,
        time: TimeWindow,
        ctx: &mut ws::WebsocketContext<Self>,
    ) {
        let snapshot = self.snapshot.clone();
        let connection_id = self.connection_id;
        let addr = ctx.address();

        actix::spawn(async move {
            let reply = match snapshot.posts_in_region(connection_id, &region, &time).await {
                Ok(posts) => ServerMessage::Posts { posts },
                Err(e) => {
                    tracing::warn!(connection = %connection_id, error = %e, "snapshot query failed");
                    ServerMessage::Error {
                        message: "unable to fetch posts for this region".to_string(),
                    }
                }
            };

            match reply.to_json() {
                Ok(json) => addr.do_send(OutboundFrame(json)),
                Err(e) => tracing::error!(error = %e, "failed to encode snapshot reply"),
            }
        });
    }
}

impl Actor for NearMeSession {
    type Context = ws::WebsocketContext<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        tracing::info!(connection = %self.connection_id, user_id = self.user_id, "near-me session started");
        metrics::WS_CONNECTIONS.inc();
        self.hb(ctx);
    }

    fn stopped(&mut self, _ctx: &mut Self::Context) {
        tracing::info!(connection = %self.connection_id, user_id = self.user_id, "near-me session stopped");
        metrics::WS_CONNECTIONS.dec();

        let registry = self.registry.clone();
        let connection_id = self.connection_id;
        actix::spawn(async move {
            registry.disconnect(connection_id).await;
        });
    }
}

impl Handler<OutboundFrame> for NearMeSession {
    type Result = ();

    fn handle(&mut self, msg: OutboundFrame, ctx: &mut Self::Context) {
        ctx.text(msg.0);
    }
}

impl StreamHandler<Result<ws::Message, ws::ProtocolError>> for NearMeSession {
    fn handle(&mut self, msg: Result<ws::Message, ws::ProtocolError>, ctx: &mut Self::Context) {
        match msg {
            Ok(ws::Message::Ping(msg)) => {
                self.hb = Instant::now();
                ctx.pong(&msg);
            }
            Ok(ws::Message::Pong(_)) => {
                self.hb = Instant::now();
            }
            Ok(ws::Message::Text(text)) => match serde_json::from_str::<ClientMessage>(&text) {
                Ok(ClientMessage::FetchNearMe {
                    location_from,
                    location_to,
                    time,
                }) => {
                    let region = Region {
                        location_from,
                        location_to,
                    };
                    self.handle_fetch_near_me(region, time, ctx);
                }
                Err(e) => {
                    tracing::warn!(connection = %self.connection_id, error = %e, "malformed frame");
                    let reply = ServerMessage::Error {
                        message: format!("malformed request: {e}"),
                    };
                    if let Ok(json) = reply.to_json() {
                        ctx.text(json);
                    }
                }
            },
            Ok(ws::Message::Binary(_)) => {
                tracing::warn!(connection = %self.connection_id, "binary frames not supported");
            }
            Ok(ws::Message::Close(reason)) => {
                tracing::debug!(connection = %self.connection_id, ?reason, "close frame received");
                ctx.stop();
            }
            _ => {}
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct WsQuery {
    pub token: Option<String>,
}

/// Upgrade handler for the near-me channel.
pub async fn nearme_ws(
    req: HttpRequest,
    stream: web::Payload,
    state: web::Data<AppState>,
    query: web::Query<WsQuery>,
) -> Result<HttpResponse, Error> {
    let token = query.into_inner().token.or_else(|| {
        req.headers()
            .get(actix_web::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.strip_prefix("Bearer "))
            .map(|s| s.to_string())
    });

    let user_id = match token.and_then(|t| verify_token(&t, &state.config.jwt_secret).ok()) {
        Some(claims) => claims.sub,
        None => return Ok(HttpResponse::Unauthorized().finish()),
    };

    let (connection_id, mut rx) = state.registry.connect().await;

    let session = NearMeSession::new(
        connection_id,
        user_id,
        state.registry.clone(),
        SnapshotService::new(state.db.clone(), state.registry.clone()),
    );

    let (addr, resp) = ws::WsResponseBuilder::new(session, &req, stream).start_with_addr()?;

    // Bridge the registry channel into the actor mailbox. The task ends when
    // the registry entry is dropped (sender gone) or the actor stops.
    tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            if addr.try_send(OutboundFrame(frame)).is_err() {
                break;
            }
        }
    });

    Ok(resp)
}
