//! Transport layer (WebSocket).
//!
//! Exposes the feed upgrade handler and the codec that decodes messages once
//! before they reach the feed layer.

pub mod codec;
pub mod ws;
