//! Format detection (magic byte classification).
//!
//! Rules:
//! - Never index (`buf[0]`), use `first()`.
//! - Classification looks at byte 0 only and never attempts a decode.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::FeedError;

/// Magic byte: zlib-compressed JSON follows.
pub const ZLIB_MAGIC: u8 = 0x00;

/// Magic byte: MessagePack follows.
pub const MSGPACK_MAGIC: u8 = 0x01;

/// Serialization format of a feed frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    /// Plain JSON (text frame, or unframed UTF-8 bytes).
    #[default]
    Json,
    /// `[0x00][zlib(utf8(json))]`
    Zlib,
    /// `[0x01][msgpack]`
    Msgpack,
}

impl Format {
    pub const ALL: [Format; 3] = [Format::Json, Format::Zlib, Format::Msgpack];

    /// Name used in the `format` query parameter and metric labels.
    pub fn as_str(self) -> &'static str {
        match self {
            Format::Json => "json",
            Format::Zlib => "zlib",
            Format::Msgpack => "msgpack",
        }
    }

    /// Prefix byte for binary frames. JSON has no framing.
    pub fn magic(self) -> Option<u8> {
        match self {
            Format::Json => None,
            Format::Zlib => Some(ZLIB_MAGIC),
            Format::Msgpack => Some(MSGPACK_MAGIC),
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Format {
    type Err = FeedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "json" => Ok(Format::Json),
            "zlib" => Ok(Format::Zlib),
            "msgpack" => Ok(Format::Msgpack),
            other => Err(FeedError::BadRequest(format!("unknown format: {other}"))),
        }
    }
}

/// Classify a binary payload by its first byte.
///
/// Empty payloads are `Json` (they decode to nothing).
pub fn detect_format(bytes: &[u8]) -> Format {
    match bytes.first() {
        Some(&ZLIB_MAGIC) => Format::Zlib,
        Some(&MSGPACK_MAGIC) => Format::Msgpack,
        _ => Format::Json,
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn magic_bytes_select_format() {
        assert_eq!(detect_format(&[0x00]), Format::Zlib);
        assert_eq!(detect_format(&[0x00, 0x78, 0x9c]), Format::Zlib);
        assert_eq!(detect_format(&[0x01]), Format::Msgpack);
        assert_eq!(detect_format(&[0x01, 0x81]), Format::Msgpack);
    }

    #[test]
    fn everything_else_is_json() {
        assert_eq!(detect_format(&[]), Format::Json);
        assert_eq!(detect_format(b"{\"b\":2}"), Format::Json);
        assert_eq!(detect_format(b"[1]"), Format::Json);
        for b in 0x02..=0xffu8 {
            assert_eq!(detect_format(&[b, 0x00]), Format::Json, "byte={b:#04x}");
        }
    }

    #[test]
    fn json_tokens_never_start_with_a_magic_byte() {
        let samples = ["{}", "[]", "\"s\"", "1", "-1", "true", "false", "null", " {}", "\n[]"];
        for s in samples {
            assert_eq!(detect_format(s.as_bytes()), Format::Json, "sample={s:?}");
        }
    }

    #[test]
    fn names_round_trip() {
        for f in Format::ALL {
            assert_eq!(f.as_str().parse::<Format>().unwrap(), f);
        }
        assert!("gzip".parse::<Format>().is_err());
        assert_eq!(Format::Json.magic(), None);
    }
}
