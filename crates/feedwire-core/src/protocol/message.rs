//! Message parser: the single entry point for socket consumers.
//!
//! - Text messages => JSON parse, never inspected for a magic byte
//! - Binary messages => materialize fully, then auto-detecting frame decode
//!
//! No retry and no fallback between formats: a corrupt payload fails that one
//! message and nothing else.

use std::future::Future;

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::future::BoxFuture;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::Result;
use crate::protocol::format::detect_format;
use crate::protocol::frame::{Frame, FrameCodec};

/// Raw transport unit, consumed exactly once by the parser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WireMessage<B = Bytes> {
    Text(String),
    Binary(B),
}

impl From<Frame> for WireMessage {
    fn from(frame: Frame) -> Self {
        match frame {
            Frame::Text(s) => WireMessage::Text(s),
            Frame::Binary(b) => WireMessage::Binary(b),
        }
    }
}

/// Anything that can hand over the complete bytes of a binary message,
/// either immediately or after an await (blob-like handles).
#[async_trait]
pub trait BinarySource: Send + Sized {
    async fn into_bytes(self) -> Result<Bytes>;
}

#[async_trait]
impl BinarySource for Bytes {
    async fn into_bytes(self) -> Result<Bytes> {
        Ok(self)
    }
}

#[async_trait]
impl BinarySource for Vec<u8> {
    async fn into_bytes(self) -> Result<Bytes> {
        Ok(Bytes::from(self))
    }
}

/// Deferred binary handle: resolves to the full payload later.
pub struct Deferred(BoxFuture<'static, Result<Bytes>>);

impl Deferred {
    pub fn new<F>(fut: F) -> Self
    where
        F: Future<Output = Result<Bytes>> + Send + 'static,
    {
        Self(Box::pin(fut))
    }
}

impl std::fmt::Debug for Deferred {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Deferred(..)")
    }
}

#[async_trait]
impl BinarySource for Deferred {
    async fn into_bytes(self) -> Result<Bytes> {
        self.0.await
    }
}

impl FrameCodec {
    /// Decode one transport message into an application value.
    pub async fn parse_message<B: BinarySource>(&self, msg: WireMessage<B>) -> Result<Value> {
        match msg {
            WireMessage::Text(s) => Ok(serde_json::from_str(&s)?),
            WireMessage::Binary(src) => {
                let bytes = src.into_bytes().await?;
                tracing::trace!(
                    format = %detect_format(&bytes),
                    len = bytes.len(),
                    "decoding binary frame"
                );
                self.decode(&bytes)
            }
        }
    }

    /// `parse_message` into a concrete type.
    pub async fn parse_message_into<T, B>(&self, msg: WireMessage<B>) -> Result<T>
    where
        T: DeserializeOwned,
        B: BinarySource,
    {
        let value = self.parse_message(msg).await?;
        Ok(serde_json::from_value(value)?)
    }
}

/// Parse with default codec options.
pub async fn parse_message<B: BinarySource>(msg: WireMessage<B>) -> Result<Value> {
    FrameCodec::default().parse_message(msg).await
}
