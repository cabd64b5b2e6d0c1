//! Gateway config loader (strict parsing).

pub mod schema;

use std::fs;

use feedwire_core::error::{FeedError, Result};

pub use schema::{FeedSection, GatewayConfig, GatewaySection};

/// Env var naming the config file.
pub const CONFIG_ENV: &str = "FEEDWIRE_CONFIG";

/// Default config path.
pub const DEFAULT_CONFIG_PATH: &str = "feedwire.yaml";

pub fn load_from_file(path: &str) -> Result<GatewayConfig> {
    let s = fs::read_to_string(path)
        .map_err(|e| FeedError::Internal(format!("read config {path} failed: {e}")))?;
    load_from_str(&s)
}

pub fn load_from_str(s: &str) -> Result<GatewayConfig> {
    let cfg: GatewayConfig = serde_yaml::from_str(s)
        .map_err(|e| FeedError::BadRequest(format!("invalid yaml: {e}")))?;
    cfg.validate()?;
    Ok(cfg)
}
