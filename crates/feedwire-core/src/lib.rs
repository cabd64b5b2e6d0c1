//! feedwire core: transport-agnostic feed framing primitives and error types.
//!
//! This crate defines the wire-level contract shared by the gateway, the
//! `feed-tail` client and any other consumer of the dashboard feeds: magic-byte
//! format detection, the zlib/MessagePack/JSON frame codec, the message parser
//! every socket consumer calls, and format negotiation. It carries no transport
//! or runtime dependencies so it can be reused in multiple contexts.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here
//! (`#![deny(clippy::panic, clippy::unwrap_used, clippy::expect_used)]`).
//! All fallible paths must surface as `FeedError`/`Result` so a corrupt frame
//! only ever fails the one message it arrived in.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod protocol;
pub mod state;

/// Shared result type.
pub use error::{ErrorKind, FeedError, Result};
pub use protocol::format::{detect_format, Format};
pub use protocol::frame::{decode, decode_to_string, encode, CodecOptions, Frame, FrameCodec};
pub use protocol::message::{parse_message, BinarySource, Deferred, WireMessage};
pub use state::AsyncState;
