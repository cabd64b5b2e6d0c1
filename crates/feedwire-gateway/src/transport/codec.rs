//! Decode-once codec for the transport layer.
//!
//! - Text frames => JSON value
//! - Binary frames => magic-byte auto-detect (zlib / msgpack / unframed JSON)
//! - Ping/Pong/Close are surfaced for lifecycle management

use axum::extract::ws::Message;
use bytes::Bytes;
use serde_json::Value;

use feedwire_core::error::Result;
use feedwire_core::{detect_format, Format, Frame, FrameCodec, WireMessage};

#[derive(Debug)]
pub enum Inbound {
    Value { value: Value, format: Format, bytes_len: usize },
    Ping(Vec<u8>),
    Pong(Vec<u8>),
    Close,
}

pub async fn decode(codec: &FrameCodec, msg: Message) -> Result<Inbound> {
    match msg {
        Message::Text(s) => {
            let bytes_len = s.len();
            let value = codec.parse_message::<Bytes>(WireMessage::Text(s)).await?;
            Ok(Inbound::Value { value, format: Format::Json, bytes_len })
        }
        Message::Binary(b) => {
            let bytes_len = b.len();
            let format = detect_format(&b);
            let value = codec.parse_message(WireMessage::Binary(b)).await?;
            Ok(Inbound::Value { value, format, bytes_len })
        }
        Message::Ping(v) => Ok(Inbound::Ping(v)),
        Message::Pong(v) => Ok(Inbound::Pong(v)),
        Message::Close(_) => Ok(Inbound::Close),
    }
}

/// Format an inbound message claims to be in, before decoding it.
pub fn peek_format(msg: &Message) -> Option<Format> {
    match msg {
        Message::Text(_) => Some(Format::Json),
        Message::Binary(b) => Some(detect_format(b)),
        _ => None,
    }
}

/// Cheap frame length (policy before decode).
pub fn frame_len(msg: &Message) -> usize {
    match msg {
        Message::Text(s) => s.len(),
        Message::Binary(b) => b.len(),
        Message::Ping(v) => v.len(),
        Message::Pong(v) => v.len(),
        Message::Close(_) => 0,
    }
}

/// Convert an encoded frame to an axum message.
/// NOTE: axum::Message::Binary requires Vec<u8>, so the binary path copies.
pub fn to_ws_message(frame: Frame) -> Message {
    match frame {
        Frame::Text(s) => Message::Text(s),
        Frame::Binary(b) => Message::Binary(b.to_vec()),
    }
}

/// Encode a value in `format` for transport.
pub fn encode(codec: &FrameCodec, format: Format, value: &Value) -> Result<Message> {
    codec.encode(format, value).map(to_ws_message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn decodes_each_format() {
        let codec = FrameCodec::default();
        let v = json!({"type": "heartbeat"});
        for format in Format::ALL {
            let msg = encode(&codec, format, &v).unwrap();
            assert_eq!(peek_format(&msg), Some(format));
            let Inbound::Value { value, format: got, .. } = decode(&codec, msg).await.unwrap() else {
                panic!("expected value");
            };
            assert_eq!(value, v);
            assert_eq!(got, format);
        }
    }

    #[tokio::test]
    async fn corrupt_binary_is_an_error() {
        let codec = FrameCodec::default();
        let err = decode(&codec, Message::Binary(vec![0x00, 0xff, 0xff, 0xff])).await.unwrap_err();
        assert_eq!(err.kind().as_str(), "DECOMPRESSION_ERROR");
    }
}
