//! Client <-> gateway message shapes (after frame decode).
//!
//! Inbound messages are typed; outbound ones are built with `json!` so they
//! can be encoded in any format.

use serde::Deserialize;
use serde_json::{json, Value};

/// Messages a client may send on a feed socket.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Liveness probe; `ts` is echoed back.
    Heartbeat {
        #[serde(default)]
        ts: Option<Value>,
    },
    /// Broadcast `data` to every session on the topic.
    Publish { data: Value },
}

pub fn welcome_json(topic: &str, format: &str) -> Value {
    json!({
        "type": "welcome",
        "topic": topic,
        "format": format,
    })
}

pub fn heartbeat_ack_json(ts: Option<Value>) -> Value {
    json!({
        "type": "heartbeat_ack",
        "ts": ts,
    })
}

pub fn event_json(topic: &str, data: Value) -> Value {
    json!({
        "type": "event",
        "topic": topic,
        "data": data,
    })
}

pub fn error_json(code: &str, msg: &str) -> Value {
    json!({
        "type": "error",
        "code": code,
        "message": msg,
    })
}
