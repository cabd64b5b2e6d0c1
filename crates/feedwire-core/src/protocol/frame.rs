//! Frame codec: strip/attach the magic byte and run the matching coder.
//!
//! The object-returning `decode` is canonical. `decode_to_string` is a thin
//! adapter over it so both entry points share one dispatch path.

use std::io::{Cursor, Write};

use bytes::Bytes;
use flate2::write::ZlibEncoder;
use flate2::{Compression, Decompress, FlushDecompress, Status};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{FeedError, Result};
use crate::protocol::format::{detect_format, Format, MSGPACK_MAGIC, ZLIB_MAGIC};

/// Maximum inflated size of a zlib frame (64 MiB).
pub const DEFAULT_MAX_INFLATED_BYTES: usize = 64 << 20;

/// zlib level used for outgoing frames.
pub const DEFAULT_ZLIB_LEVEL: u32 = 6;

const INFLATE_CHUNK: usize = 8 * 1024;

/// Codec tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodecOptions {
    /// Upper bound for the inflated body of a zlib frame.
    pub max_inflated_bytes: usize,
    /// zlib compression level (0..=9).
    pub zlib_level: u32,
}

impl Default for CodecOptions {
    fn default() -> Self {
        Self {
            max_inflated_bytes: DEFAULT_MAX_INFLATED_BYTES,
            zlib_level: DEFAULT_ZLIB_LEVEL,
        }
    }
}

/// Encoded outgoing frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// JSON text, sent as a text frame.
    Text(String),
    /// Magic-prefixed binary body.
    Binary(Bytes),
}

impl Frame {
    /// Wire length in bytes.
    pub fn len(&self) -> usize {
        match self {
            Frame::Text(s) => s.len(),
            Frame::Binary(b) => b.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Stateless decoder/encoder for feed frames.
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameCodec {
    opts: CodecOptions,
}

impl FrameCodec {
    pub fn new(opts: CodecOptions) -> Self {
        Self { opts }
    }

    pub fn options(&self) -> CodecOptions {
        self.opts
    }

    /// Auto-detecting decode of a binary payload.
    pub fn decode(&self, bytes: &[u8]) -> Result<Value> {
        match detect_format(bytes) {
            Format::Zlib => self.decode_zlib(bytes),
            Format::Msgpack => self.decode_msgpack(bytes),
            Format::Json => self.decode_json(bytes),
        }
    }

    /// Auto-detecting decode into a concrete type.
    pub fn decode_into<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T> {
        let value = self.decode(bytes)?;
        Ok(serde_json::from_value(value)?)
    }

    /// String-returning adapter: JSON text regardless of the source format.
    ///
    /// An empty payload yields an empty string.
    pub fn decode_to_string(&self, bytes: &[u8]) -> Result<String> {
        if bytes.is_empty() {
            return Ok(String::new());
        }
        let value = self.decode(bytes)?;
        serde_json::to_string(&value).map_err(|e| FeedError::Encode {
            format: Format::Json,
            message: e.to_string(),
        })
    }

    /// `[0x00][zlib(json)]` -> value. Byte 0 is always dropped.
    pub fn decode_zlib(&self, bytes: &[u8]) -> Result<Value> {
        let body = bytes.split_first().map(|(_, rest)| rest).unwrap_or(&[]);
        let text = inflate(body, self.opts.max_inflated_bytes)?;
        Ok(serde_json::from_slice(&text)?)
    }

    /// `[0x01][msgpack]` -> value. The prefix is optional here: callers may
    /// pass an already stripped body.
    pub fn decode_msgpack(&self, bytes: &[u8]) -> Result<Value> {
        let body = bytes.strip_prefix(&[MSGPACK_MAGIC]).unwrap_or(bytes);

        let mut cursor = Cursor::new(body);
        let value = {
            let mut de = rmp_serde::Deserializer::new(&mut cursor);
            Value::deserialize(&mut de).map_err(|e| FeedError::MsgpackDecode(e.to_string()))?
        };

        let used = usize::try_from(cursor.position()).unwrap_or(body.len());
        if used < body.len() {
            return Err(FeedError::MsgpackDecode(format!(
                "{} trailing byte(s) after value",
                body.len() - used
            )));
        }
        Ok(value)
    }

    /// Unframed UTF-8 JSON -> value. Nothing is stripped; empty is `null`.
    pub fn decode_json(&self, bytes: &[u8]) -> Result<Value> {
        if bytes.is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Encode for the given format. JSON goes out as text, the rest as binary.
    pub fn encode<T: Serialize + ?Sized>(&self, format: Format, value: &T) -> Result<Frame> {
        match format {
            Format::Json => self.encode_json(value).map(Frame::Text),
            Format::Zlib => self.encode_zlib(value).map(Frame::Binary),
            Format::Msgpack => self.encode_msgpack(value).map(Frame::Binary),
        }
    }

    /// Plain JSON text, no framing.
    pub fn encode_json<T: Serialize + ?Sized>(&self, value: &T) -> Result<String> {
        serde_json::to_string(value).map_err(|e| encode_err(Format::Json, e))
    }

    /// `[0x00][zlib(utf8(json))]`
    pub fn encode_zlib<T: Serialize + ?Sized>(&self, value: &T) -> Result<Bytes> {
        let json = serde_json::to_vec(value).map_err(|e| encode_err(Format::Zlib, e))?;

        let mut enc = ZlibEncoder::new(vec![ZLIB_MAGIC], Compression::new(self.opts.zlib_level));
        enc.write_all(&json).map_err(|e| encode_err(Format::Zlib, e))?;
        let out = enc.finish().map_err(|e| encode_err(Format::Zlib, e))?;
        Ok(Bytes::from(out))
    }

    /// `[0x01][msgpack]`. Structs are written as maps so they stay JSON-shaped.
    pub fn encode_msgpack<T: Serialize + ?Sized>(&self, value: &T) -> Result<Bytes> {
        let mut out = vec![MSGPACK_MAGIC];
        rmp_serde::encode::write_named(&mut out, value)
            .map_err(|e| encode_err(Format::Msgpack, e))?;
        Ok(Bytes::from(out))
    }
}

/// Auto-detecting decode with default options.
pub fn decode(bytes: &[u8]) -> Result<Value> {
    FrameCodec::default().decode(bytes)
}

/// String-returning decode with default options.
pub fn decode_to_string(bytes: &[u8]) -> Result<String> {
    FrameCodec::default().decode_to_string(bytes)
}

/// Encode with default options.
pub fn encode<T: Serialize + ?Sized>(format: Format, value: &T) -> Result<Frame> {
    FrameCodec::default().encode(format, value)
}

fn encode_err(format: Format, e: impl std::fmt::Display) -> FeedError {
    FeedError::Encode {
        format,
        message: e.to_string(),
    }
}

/// Inflate exactly one complete zlib stream. Truncated streams, bytes after
/// the stream end and streams that would grow past `limit` are errors.
fn inflate(body: &[u8], limit: usize) -> Result<Vec<u8>> {
    let mut z = Decompress::new(true);
    let mut out = Vec::with_capacity(body.len().saturating_mul(4).clamp(64, INFLATE_CHUNK));

    loop {
        if out.len() == out.capacity() {
            if out.len() >= limit {
                return Err(FeedError::PayloadTooLarge {
                    size: out.len(),
                    limit,
                });
            }
            out.reserve(INFLATE_CHUNK);
        }

        let consumed = usize::try_from(z.total_in()).unwrap_or(body.len());
        let produced = z.total_out();
        let input = body.get(consumed..).unwrap_or(&[]);

        let status = z
            .decompress_vec(input, &mut out, FlushDecompress::None)
            .map_err(|e| FeedError::Decompression(e.to_string()))?;

        match status {
            Status::StreamEnd => break,
            Status::Ok | Status::BufError => {
                if z.total_in() as usize == consumed && z.total_out() == produced {
                    return Err(FeedError::Decompression(
                        "unexpected end of compressed stream".into(),
                    ));
                }
            }
        }
    }

    let trailing = body.len().saturating_sub(usize::try_from(z.total_in()).unwrap_or(body.len()));
    if trailing > 0 {
        return Err(FeedError::Decompression(format!(
            "{trailing} trailing byte(s) after zlib stream"
        )));
    }

    if out.len() > limit {
        return Err(FeedError::PayloadTooLarge {
            size: out.len(),
            limit,
        });
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use serde_json::json;

    fn codec() -> FrameCodec {
        FrameCodec::default()
    }

    #[test]
    fn zlib_frame_decodes() {
        let frame = hex_frame("00789cab564a54b232ac0500082a0209");
        assert_eq!(codec().decode(&frame).unwrap(), json!({"a": 1}));
    }

    #[test]
    fn msgpack_frame_decodes_with_or_without_prefix() {
        assert_eq!(codec().decode(&[0x01, 0x81, 0xa1, 0x61, 0x01]).unwrap(), json!({"a": 1}));
        assert_eq!(codec().decode_msgpack(&[0x81, 0xa1, 0x61, 0x01]).unwrap(), json!({"a": 1}));
    }

    #[test]
    fn empty_payload_is_null_or_empty_string() {
        assert_eq!(codec().decode(&[]).unwrap(), Value::Null);
        assert_eq!(codec().decode_to_string(&[]).unwrap(), "");
    }

    #[test]
    fn corrupt_deflate_is_decompression_error() {
        let err = codec().decode(&[0x00, 0xff, 0xff, 0xff]).unwrap_err();
        assert!(matches!(err, FeedError::Decompression(_)), "{err}");
        assert_eq!(err.format(), Some(Format::Zlib));
    }

    #[test]
    fn truncated_deflate_is_decompression_error() {
        let frame = hex_frame("00789cab564a54b232ac");
        let err = codec().decode(&frame).unwrap_err();
        assert!(matches!(err, FeedError::Decompression(_)), "{err}");

        let err = codec().decode(&[0x00]).unwrap_err();
        assert!(matches!(err, FeedError::Decompression(_)), "{err}");
    }

    #[test]
    fn bytes_after_zlib_stream_are_rejected() {
        let mut frame = codec().encode_zlib(&json!({"a": 1})).unwrap().to_vec();
        frame.extend_from_slice(b"GARBAGE");
        let err = codec().decode(&frame).unwrap_err();
        assert!(matches!(err, FeedError::Decompression(_)), "{err}");
        assert!(err.to_string().contains("7 trailing byte(s)"), "{err}");
    }

    #[test]
    fn msgpack_ff_is_negative_fixint() {
        assert_eq!(codec().decode(&[0x01, 0xff]).unwrap(), json!(-1));
    }

    #[test]
    fn malformed_msgpack_is_msgpack_error() {
        // 0xc1 is the one byte msgpack never assigns.
        let err = codec().decode(&[0x01, 0xc1]).unwrap_err();
        assert!(matches!(err, FeedError::MsgpackDecode(_)), "{err}");

        // map header promising one entry, nothing after it
        let err = codec().decode(&[0x01, 0x81]).unwrap_err();
        assert!(matches!(err, FeedError::MsgpackDecode(_)), "{err}");

        let err = codec().decode(&[0x01]).unwrap_err();
        assert_eq!(err.format(), Some(Format::Msgpack));
    }

    #[test]
    fn msgpack_trailing_bytes_are_rejected() {
        let err = codec().decode(&[0x01, 0xc0, 0xc0]).unwrap_err();
        assert!(err.to_string().contains("1 trailing byte"), "{err}");
    }

    #[test]
    fn inflate_respects_limit() {
        let big = json!({"pad": "x".repeat(10_000)});
        let frame = codec().encode_zlib(&big).unwrap();

        let tight = FrameCodec::new(CodecOptions {
            max_inflated_bytes: 1024,
            ..CodecOptions::default()
        });
        let err = tight.decode(&frame).unwrap_err();
        assert!(matches!(err, FeedError::PayloadTooLarge { limit: 1024, .. }), "{err}");

        assert_eq!(codec().decode(&frame).unwrap(), big);
    }

    #[test]
    fn encoders_prefix_their_magic_byte() {
        let v = json!({"a": 1});
        let raw = rmp_serde::to_vec_named(&v).unwrap();
        let framed = codec().encode_msgpack(&v).unwrap();
        assert_eq!(framed.len(), raw.len() + 1);
        assert_eq!(framed[0], MSGPACK_MAGIC);
        assert_eq!(&framed[1..], &raw[..]);

        let z = codec().encode_zlib(&v).unwrap();
        assert_eq!(z[0], ZLIB_MAGIC);
        assert_eq!(codec().encode(Format::Json, &v).unwrap(), Frame::Text(r#"{"a":1}"#.into()));
    }

    #[test]
    fn encode_then_decode_is_identity() {
        let v = json!({
            "type": "zone_crossing",
            "camera_id": "cam-07",
            "zone": {"id": 3, "name": "dock"},
            "confidence": 0.875,
            "direction": null,
            "ok": true,
            "tracks": [-4, 0, 18446744073709551615u64],
        });
        for format in Format::ALL {
            let decoded = match codec().encode(format, &v).unwrap() {
                Frame::Text(s) => codec().decode(s.as_bytes()).unwrap(),
                Frame::Binary(b) => codec().decode(&b).unwrap(),
            };
            assert_eq!(decoded, v, "format={format}");
        }
    }

    #[test]
    fn structs_encode_as_maps() {
        #[derive(Serialize, Deserialize, Debug, PartialEq)]
        struct Alert {
            camera: String,
            score: f64,
        }

        let alert = Alert { camera: "cam-1".into(), score: 0.5 };
        let bytes = codec().encode_msgpack(&alert).unwrap();
        assert_eq!(codec().decode(&bytes).unwrap(), json!({"camera": "cam-1", "score": 0.5}));
        assert_eq!(codec().decode_into::<Alert>(&bytes).unwrap(), alert);
    }

    #[test]
    fn string_adapter_matches_object_path() {
        let v = json!({"b": 2, "a": [1, 2]});
        let z = codec().encode_zlib(&v).unwrap();
        let m = codec().encode_msgpack(&v).unwrap();
        let expected = r#"{"b":2,"a":[1,2]}"#;
        assert_eq!(codec().decode_to_string(&z).unwrap(), expected);
        assert_eq!(codec().decode_to_string(&m).unwrap(), expected);
        assert_eq!(codec().decode_to_string(expected.as_bytes()).unwrap(), expected);
    }

    #[test]
    fn decoding_is_repeatable() {
        let frame = codec().encode_zlib(&json!({"n": 1})).unwrap();
        assert_eq!(codec().decode(&frame).unwrap(), codec().decode(&frame).unwrap());
    }

    fn hex_frame(s: &str) -> Vec<u8> {
        (0..s.len())
            .step_by(2)
            .map(|i| u8::from_str_radix(&s[i..i + 2], 16).unwrap())
            .collect()
    }
}
