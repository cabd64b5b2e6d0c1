use std::collections::HashSet;

use serde::Deserialize;

use feedwire_core::error::{FeedError, Result};
use feedwire_core::protocol::frame::CodecOptions;
use feedwire_core::Format;

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    pub version: u32,

    #[serde(default)]
    pub gateway: GatewaySection,

    #[serde(default)]
    pub feed: FeedSection,

    #[serde(default)]
    pub topics: Vec<String>,
}

impl GatewayConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(FeedError::UnsupportedVersion);
        }
        if self.topics.is_empty() {
            return Err(FeedError::BadRequest("topics must not be empty".into()));
        }

        let mut seen = HashSet::new();
        for t in &self.topics {
            if t.is_empty() || !t.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-') {
                return Err(FeedError::BadRequest(format!(
                    "topic {t:?} must be non-empty [A-Za-z0-9_-]"
                )));
            }
            if !seen.insert(t.as_str()) {
                return Err(FeedError::BadRequest(format!("duplicate topic {t:?}")));
            }
        }

        self.gateway.validate()?;
        self.feed.validate()?;

        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GatewaySection {
    #[serde(default = "default_listen")]
    pub listen: String,

    #[serde(default = "default_ping_interval_ms")]
    pub ping_interval_ms: u64,

    #[serde(default = "default_idle_timeout_ms")]
    pub idle_timeout_ms: u64,
}

impl Default for GatewaySection {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            ping_interval_ms: default_ping_interval_ms(),
            idle_timeout_ms: default_idle_timeout_ms(),
        }
    }
}

impl GatewaySection {
    pub fn validate(&self) -> Result<()> {
        if !(5000..=120000).contains(&self.ping_interval_ms) {
            return Err(FeedError::BadRequest(
                "gateway.ping_interval_ms must be between 5000 and 120000".into(),
            ));
        }
        if !(10000..=600000).contains(&self.idle_timeout_ms) {
            return Err(FeedError::BadRequest(
                "gateway.idle_timeout_ms must be between 10000 and 600000".into(),
            ));
        }
        if self.idle_timeout_ms <= self.ping_interval_ms {
            return Err(FeedError::BadRequest(
                "gateway.idle_timeout_ms must be greater than ping_interval_ms".into(),
            ));
        }
        Ok(())
    }
}

fn default_listen() -> String {
    "0.0.0.0:8080".into()
}
fn default_ping_interval_ms() -> u64 {
    20000
}
fn default_idle_timeout_ms() -> u64 {
    60000
}

/// Framing and fan-out settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FeedSection {
    /// Outbound format when the client does not ask for one.
    #[serde(default)]
    pub default_format: Format,

    #[serde(default = "default_zlib_level")]
    pub zlib_level: u32,

    /// Largest inbound frame accepted before decode.
    #[serde(default = "default_max_frame_bytes")]
    pub max_frame_bytes: usize,

    /// Largest inflated body of an inbound zlib frame.
    #[serde(default = "default_max_inflated_bytes")]
    pub max_inflated_bytes: usize,

    /// Per-topic broadcast buffer; slow sessions skip what falls out of it.
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

impl Default for FeedSection {
    fn default() -> Self {
        Self {
            default_format: Format::default(),
            zlib_level: default_zlib_level(),
            max_frame_bytes: default_max_frame_bytes(),
            max_inflated_bytes: default_max_inflated_bytes(),
            channel_capacity: default_channel_capacity(),
        }
    }
}

impl FeedSection {
    pub fn validate(&self) -> Result<()> {
        if self.zlib_level > 9 {
            return Err(FeedError::BadRequest("feed.zlib_level must be between 0 and 9".into()));
        }
        if self.max_frame_bytes == 0 {
            return Err(FeedError::BadRequest("feed.max_frame_bytes must be positive".into()));
        }
        if self.max_inflated_bytes < self.max_frame_bytes {
            return Err(FeedError::BadRequest(
                "feed.max_inflated_bytes must be at least max_frame_bytes".into(),
            ));
        }
        if !(1..=65536).contains(&self.channel_capacity) {
            return Err(FeedError::BadRequest(
                "feed.channel_capacity must be between 1 and 65536".into(),
            ));
        }
        Ok(())
    }

    /// Hard cap handed to the socket reader. Frames between `max_frame_bytes`
    /// and this cap get an error frame; larger ones end the session.
    pub fn read_limit(&self) -> usize {
        self.max_frame_bytes.saturating_mul(2)
    }

    pub fn codec_options(&self) -> CodecOptions {
        CodecOptions {
            max_inflated_bytes: self.max_inflated_bytes,
            zlib_level: self.zlib_level,
        }
    }
}

fn default_zlib_level() -> u32 {
    6
}
fn default_max_frame_bytes() -> usize {
    1 << 20
}
fn default_max_inflated_bytes() -> usize {
    16 << 20
}
fn default_channel_capacity() -> usize {
    1024
}
