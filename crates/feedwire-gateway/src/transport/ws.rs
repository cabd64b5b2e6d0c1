//! Feed WebSocket handler.
//!
//! Responsibilities:
//! - Upgrade HTTP -> WS for a known topic
//! - Read the advisory `format` query parameter (fallback: config default)
//! - Lifecycle: ping/pong + idle timeout
//! - Inbound: reader capped at twice `max_frame_bytes`, size check, decode-once
//!   via the message parser, then dispatch
//! - Outbound: topic events encoded in the session's format
//!
//! A frame that fails to decode is answered with an `error` frame and dropped;
//! the session stays open.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, RawQuery, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::sync::broadcast::error::RecvError;
use tokio::time::{Duration, Instant};
use tracing::Instrument;

use feedwire_core::error::{ErrorKind, FeedError, Result};
use feedwire_core::protocol::negotiate::requested_format;
use feedwire_core::Format;

use crate::app_state::AppState;
use crate::feed::envelope::{error_json, heartbeat_ack_json, welcome_json, ClientMessage};
use crate::transport::codec::{decode, encode, frame_len, peek_format, to_ws_message, Inbound};

type WsSink = SplitSink<WebSocket, Message>;

// --------------------
// Session local state
// --------------------
struct Session {
    app: AppState,
    topic: String,
    format: Format,
    last_activity: Instant,
}

impl Session {
    /// Encode `value` in the session format and write it.
    async fn send_value(&self, tx: &mut WsSink, value: &Value) -> Result<()> {
        let msg = encode(self.app.codec(), self.format, value).inspect_err(|_| {
            self.app.metrics().encode_errors.inc(&[("format", self.format.as_str())]);
        })?;
        self.write(tx, msg).await
    }

    async fn send_error(&self, tx: &mut WsSink, kind: ErrorKind, msg: &str) -> Result<()> {
        self.send_value(tx, &error_json(kind.as_str(), msg)).await
    }

    async fn write(&self, tx: &mut WsSink, msg: Message) -> Result<()> {
        tx.send(msg)
            .await
            .map_err(|e| FeedError::Internal(format!("socket write failed: {e}")))?;
        self.app.metrics().frames_out.inc(&[("format", self.format.as_str())]);
        Ok(())
    }

    /// Handle one decoded client message.
    async fn on_client_value(&self, tx: &mut WsSink, value: Value) -> Result<()> {
        match serde_json::from_value::<ClientMessage>(value) {
            Ok(ClientMessage::Heartbeat { ts }) => self.send_value(tx, &heartbeat_ack_json(ts)).await,
            Ok(ClientMessage::Publish { data }) => {
                let n = self.app.hub().publish(&self.topic, data)?;
                tracing::debug!(topic = %self.topic, receivers = n, "event published");
                Ok(())
            }
            Err(e) => {
                self.send_error(tx, ErrorKind::BadRequest, &format!("unsupported message: {e}"))
                    .await
            }
        }
    }
}

// --------------------
// Entry
// --------------------
pub async fn ws_upgrade(
    State(app): State<AppState>,
    Path(topic): Path<String>,
    RawQuery(query): RawQuery,
    ws: WebSocketUpgrade,
) -> Response {
    if !app.hub().has_topic(&topic) {
        return (StatusCode::NOT_FOUND, "unknown topic").into_response();
    }
    if app.is_draining() {
        return (StatusCode::SERVICE_UNAVAILABLE, "draining").into_response();
    }

    let format = query
        .as_deref()
        .and_then(requested_format)
        .unwrap_or(app.cfg().feed.default_format);

    app.metrics().ws_upgrades.inc(&[("format", format.as_str())]);

    let read_limit = app.cfg().feed.read_limit();
    ws.max_message_size(read_limit)
        .max_frame_size(read_limit)
        .on_upgrade(move |socket| async move {
            let metrics_app = app.clone();
            let label = topic.clone();
            metrics_app.metrics().sessions_active.inc(&[("topic", label.as_str())]);

            let span = tracing::info_span!("feed_session", topic = %label, format = %format);
            if let Err(e) = run_session(app, topic, format, socket).instrument(span).await {
                tracing::debug!(error = %e, "feed session ended with error");
            }

            metrics_app.metrics().sessions_active.dec(&[("topic", label.as_str())]);
        })
}

// --------------------
// Core session loop
// --------------------
async fn run_session(app: AppState, topic: String, format: Format, socket: WebSocket) -> Result<()> {
    let mut events = app
        .hub()
        .subscribe(&topic)
        .ok_or_else(|| FeedError::BadRequest(format!("unknown topic: {topic}")))?;

    let (mut ws_tx, mut ws_rx) = socket.split();

    let mut sess = Session {
        app: app.clone(),
        topic,
        format,
        last_activity: Instant::now(),
    };

    tracing::info!("session opened");

    sess.send_value(&mut ws_tx, &welcome_json(&sess.topic, format.as_str())).await?;

    let gw = &app.cfg().gateway;
    let max_frame_bytes = app.cfg().feed.max_frame_bytes;
    let idle_timeout = Duration::from_millis(gw.idle_timeout_ms);

    let mut ping_tick = tokio::time::interval(Duration::from_millis(gw.ping_interval_ms));
    ping_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    ping_tick.tick().await;

    loop {
        tokio::select! {
            // topic fan-out
            ev = events.recv() => {
                match ev {
                    Ok(ev) => {
                        let frame = match ev.frame(app.codec(), format) {
                            Ok(f) => f,
                            Err(e) => {
                                app.metrics().encode_errors.inc(&[("format", format.as_str())]);
                                tracing::warn!(error = %e, "event not encodable, skipped");
                                continue;
                            }
                        };
                        if sess.write(&mut ws_tx, to_ws_message(frame)).await.is_err() {
                            break;
                        }
                    }
                    Err(RecvError::Lagged(n)) => {
                        app.metrics().lagged_events.add(&[("topic", sess.topic.as_str())], n);
                        tracing::warn!(skipped = n, "session lagging, events dropped");
                    }
                    Err(RecvError::Closed) => break,
                }
            }

            // inbound reader
            incoming = ws_rx.next() => {
                let Some(incoming) = incoming else { break; };
                let Ok(msg) = incoming else { break; };

                sess.last_activity = Instant::now();

                // cheap-first: size before decode
                let bytes_len = frame_len(&msg);
                let claimed = peek_format(&msg).unwrap_or_default();
                if bytes_len > max_frame_bytes {
                    let e = FeedError::PayloadTooLarge { size: bytes_len, limit: max_frame_bytes };
                    app.metrics().decode_errors.inc(&[("format", claimed.as_str()), ("kind", e.kind().as_str())]);
                    if sess.send_error(&mut ws_tx, e.kind(), &e.to_string()).await.is_err() {
                        break;
                    }
                    continue;
                }

                let started = std::time::Instant::now();
                match decode(app.codec(), msg).await {
                    Ok(Inbound::Value { value, format: got, .. }) => {
                        app.metrics().frames_in.inc(&[("format", got.as_str())]);
                        app.metrics().decode_duration.observe(&[("format", got.as_str())], started.elapsed());
                        if sess.on_client_value(&mut ws_tx, value).await.is_err() {
                            break;
                        }
                    }
                    Ok(Inbound::Ping(payload)) => {
                        if ws_tx.send(Message::Pong(payload)).await.is_err() {
                            break;
                        }
                    }
                    Ok(Inbound::Pong(_)) => {}
                    Ok(Inbound::Close) => break,
                    Err(e) => {
                        app.metrics().decode_errors.inc(&[("format", claimed.as_str()), ("kind", e.kind().as_str())]);
                        tracing::warn!(error = %e, format = %claimed, len = bytes_len, "dropping undecodable frame");
                        if sess.send_error(&mut ws_tx, e.kind(), &e.to_string()).await.is_err() {
                            break;
                        }
                    }
                }
            }

            // ping
            _ = ping_tick.tick() => {
                if ws_tx.send(Message::Ping(Vec::new())).await.is_err() {
                    break;
                }
            }

            // idle timeout
            _ = tokio::time::sleep_until(sess.last_activity + idle_timeout) => {
                let _ = sess.send_error(&mut ws_tx, ErrorKind::BadRequest, "idle timeout").await;
                break;
            }
        }
    }

    let _ = ws_tx.close().await;
    tracing::info!("session closed");
    Ok(())
}
