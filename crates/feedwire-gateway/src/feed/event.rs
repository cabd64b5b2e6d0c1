use std::sync::OnceLock;

use serde_json::Value;

use feedwire_core::error::Result;
use feedwire_core::{Format, Frame, FrameCodec};

/// Event cached for broadcasting (encode once per format, send N times).
#[derive(Debug)]
pub struct FeedEvent {
    value: Value,
    frames: [OnceLock<Frame>; 3],
}

impl FeedEvent {
    pub fn new(value: Value) -> Self {
        Self {
            value,
            frames: [OnceLock::new(), OnceLock::new(), OnceLock::new()],
        }
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Encoded frame for `format`, encoding on first use.
    pub fn frame(&self, codec: &FrameCodec, format: Format) -> Result<Frame> {
        let slot = &self.frames[slot_index(format)];
        if let Some(f) = slot.get() {
            return Ok(f.clone());
        }
        let f = codec.encode(format, &self.value)?;
        // A concurrent encoder may have won; both results are identical.
        let _ = slot.set(f.clone());
        Ok(f)
    }
}

fn slot_index(format: Format) -> usize {
    match format {
        Format::Json => 0,
        Format::Zlib => 1,
        Format::Msgpack => 2,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn frames_are_cached_per_format() {
        let codec = FrameCodec::default();
        let ev = FeedEvent::new(json!({"type": "event", "data": {"n": 1}}));

        let a = ev.frame(&codec, Format::Msgpack).unwrap();
        let b = ev.frame(&codec, Format::Msgpack).unwrap();
        assert_eq!(a, b);

        let Frame::Text(t) = ev.frame(&codec, Format::Json).unwrap() else {
            panic!("json must be a text frame");
        };
        assert_eq!(t, r#"{"type":"event","data":{"n":1}}"#);
    }
}
