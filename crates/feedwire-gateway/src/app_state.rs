//! Shared application state for the feed gateway.

use std::sync::Arc;

use feedwire_core::error::Result;
use feedwire_core::FrameCodec;

use crate::config::GatewayConfig;
use crate::feed::FeedHub;
use crate::obs::FeedMetrics;

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    cfg: GatewayConfig,
    codec: FrameCodec,
    hub: FeedHub,
    metrics: FeedMetrics,
}

impl AppState {
    /// Build application state from a config.
    /// Returns Result so main can report bad configs instead of panicking.
    pub fn new(cfg: GatewayConfig) -> Result<Self> {
        cfg.validate()?;

        let codec = FrameCodec::new(cfg.feed.codec_options());
        let hub = FeedHub::new(cfg.topics.iter().cloned(), cfg.feed.channel_capacity);

        tracing::info!(
            topics = ?hub.topics(),
            default_format = %cfg.feed.default_format,
            "feed hub ready"
        );

        Ok(Self {
            inner: Arc::new(AppStateInner {
                cfg,
                codec,
                hub,
                metrics: FeedMetrics::default(),
            }),
        })
    }

    pub fn cfg(&self) -> &GatewayConfig {
        &self.inner.cfg
    }

    pub fn codec(&self) -> &FrameCodec {
        &self.inner.codec
    }

    pub fn hub(&self) -> &FeedHub {
        &self.inner.hub
    }

    pub fn metrics(&self) -> &FeedMetrics {
        &self.inner.metrics
    }

    pub fn is_draining(&self) -> bool {
        self.inner.metrics.is_draining()
    }

    /// Per-topic subscriber gauges appended to `/metrics`.
    pub fn metrics_extra(&self) -> Vec<(String, u64)> {
        self.hub()
            .topics()
            .into_iter()
            .map(|t| {
                let n = self.hub().subscriber_count(&t) as u64;
                (format!("feedwire_topic_subscribers{{topic=\"{t}\"}}"), n)
            })
            .collect()
    }
}
