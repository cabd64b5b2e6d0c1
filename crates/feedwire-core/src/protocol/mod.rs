//! Feed wire protocol.
//!
//! Frames come in three formats behind one framing rule:
//! - Text frames are always plain JSON and are never inspected for a prefix.
//! - Binary frames starting with `0x00` carry zlib-compressed JSON.
//! - Binary frames starting with `0x01` carry MessagePack.
//! - Any other binary frame is unframed UTF-8 JSON.
//!
//! `0x00` and `0x01` can never lead valid UTF-8 JSON text, which is what keeps
//! framed and unframed binary payloads unambiguous. New formats must take a
//! fresh sentinel from the control range and never reuse an assigned value.
//!
//! All decoders are panic-free: malformed input is reported as `FeedError`.

pub mod format;
pub mod frame;
pub mod message;
pub mod negotiate;
