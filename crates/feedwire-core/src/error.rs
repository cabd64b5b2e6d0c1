//! Shared error type across feedwire crates.

use thiserror::Error;

use crate::protocol::format::Format;

/// Stable error kinds (surfaced to clients in `error` frames).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// zlib inflate failed (corrupt or truncated stream).
    Decompression,
    /// MessagePack body malformed.
    MsgpackDecode,
    /// JSON text malformed.
    JsonParse,
    /// Outgoing value could not be encoded.
    Encode,
    /// Deferred binary payload could not be read.
    Materialize,
    /// Frame or inflated body over the configured limit.
    PayloadTooLarge,
    /// Invalid input that is not a decode failure.
    BadRequest,
    /// Unsupported config version.
    UnsupportedVersion,
    /// Internal error.
    Internal,
}

impl ErrorKind {
    /// String representation used in JSON responses and metric labels.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::Decompression => "DECOMPRESSION_ERROR",
            ErrorKind::MsgpackDecode => "MSGPACK_DECODE_ERROR",
            ErrorKind::JsonParse => "JSON_PARSE_ERROR",
            ErrorKind::Encode => "ENCODE_ERROR",
            ErrorKind::Materialize => "MATERIALIZE_ERROR",
            ErrorKind::PayloadTooLarge => "PAYLOAD_TOO_LARGE",
            ErrorKind::BadRequest => "BAD_REQUEST",
            ErrorKind::UnsupportedVersion => "UNSUPPORTED_VERSION",
            ErrorKind::Internal => "INTERNAL",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, FeedError>;

/// Unified error type used by core and gateway.
///
/// Decode variants keep the low-level library message as their payload.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("zlib decompression failed: {0}")]
    Decompression(String),
    #[error("msgpack decode failed: {0}")]
    MsgpackDecode(String),
    #[error("json parse failed: {0}")]
    JsonParse(String),
    #[error("{format} encode failed: {message}")]
    Encode { format: Format, message: String },
    #[error("binary payload unavailable: {0}")]
    Materialize(String),
    #[error("payload too large: {size} bytes exceeds limit of {limit}")]
    PayloadTooLarge { size: usize, limit: usize },
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("unsupported config version")]
    UnsupportedVersion,
    #[error("internal: {0}")]
    Internal(String),
}

impl FeedError {
    /// Map to a stable kind.
    pub fn kind(&self) -> ErrorKind {
        match self {
            FeedError::Decompression(_) => ErrorKind::Decompression,
            FeedError::MsgpackDecode(_) => ErrorKind::MsgpackDecode,
            FeedError::JsonParse(_) => ErrorKind::JsonParse,
            FeedError::Encode { .. } => ErrorKind::Encode,
            FeedError::Materialize(_) => ErrorKind::Materialize,
            FeedError::PayloadTooLarge { .. } => ErrorKind::PayloadTooLarge,
            FeedError::BadRequest(_) => ErrorKind::BadRequest,
            FeedError::UnsupportedVersion => ErrorKind::UnsupportedVersion,
            FeedError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Wire format the failure belongs to, for decode and encode errors.
    pub fn format(&self) -> Option<Format> {
        match self {
            FeedError::Decompression(_) => Some(Format::Zlib),
            FeedError::MsgpackDecode(_) => Some(Format::Msgpack),
            FeedError::JsonParse(_) => Some(Format::Json),
            FeedError::Encode { format, .. } => Some(*format),
            _ => None,
        }
    }

    /// True for failures caused by the bytes of a single message.
    pub fn is_decode(&self) -> bool {
        matches!(
            self,
            FeedError::Decompression(_)
                | FeedError::MsgpackDecode(_)
                | FeedError::JsonParse(_)
                | FeedError::PayloadTooLarge { .. }
        )
    }
}

impl From<serde_json::Error> for FeedError {
    fn from(e: serde_json::Error) -> Self {
        FeedError::JsonParse(e.to_string())
    }
}
