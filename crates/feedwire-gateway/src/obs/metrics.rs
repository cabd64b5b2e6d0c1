//! Minimal metrics registry for the feed gateway.
//!
//! Label sets are flattened into sorted key vectors so rendering order is
//! deterministic. Histogram buckets are fixed in microseconds.

use dashmap::DashMap;
use std::fmt::Write;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU64, Ordering};
use std::time::Duration;

type LabelKey = Vec<(String, String)>;

fn label_key(labels: &[(&str, &str)]) -> LabelKey {
    let mut key: LabelKey = labels
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    key.sort();
    key
}

fn escape_label(v: &str) -> String {
    v.replace('\\', "\\\\").replace('"', "\\\"").replace('\n', "\\n")
}

fn render_labels(key: &LabelKey) -> String {
    key.iter()
        .map(|(k, v)| format!("{}=\"{}\"", k, escape_label(v)))
        .collect::<Vec<_>>()
        .join(",")
}

#[derive(Default)]
pub struct CounterVec {
    map: DashMap<LabelKey, AtomicU64>,
}

impl CounterVec {
    pub fn inc(&self, labels: &[(&str, &str)]) {
        self.add(labels, 1);
    }

    pub fn add(&self, labels: &[(&str, &str)], v: u64) {
        self.map
            .entry(label_key(labels))
            .or_insert_with(|| AtomicU64::new(0))
            .fetch_add(v, Ordering::Relaxed);
    }

    /// Current value for one label set (0 if never touched).
    pub fn get(&self, labels: &[(&str, &str)]) -> u64 {
        self.map
            .get(&label_key(labels))
            .map(|c| c.load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    fn render(&self, name: &str, out: &mut String) {
        let _ = writeln!(out, "# TYPE {name} counter");
        for r in self.map.iter() {
            let _ = writeln!(out, "{name}{{{}}} {}", render_labels(r.key()), r.value().load(Ordering::Relaxed));
        }
    }
}

#[derive(Default)]
pub struct GaugeVec {
    map: DashMap<LabelKey, AtomicI64>,
}

impl GaugeVec {
    pub fn inc(&self, labels: &[(&str, &str)]) {
        self.add(labels, 1);
    }

    pub fn dec(&self, labels: &[(&str, &str)]) {
        self.add(labels, -1);
    }

    pub fn add(&self, labels: &[(&str, &str)], v: i64) {
        self.map
            .entry(label_key(labels))
            .or_insert_with(|| AtomicI64::new(0))
            .fetch_add(v, Ordering::Relaxed);
    }

    pub fn get(&self, labels: &[(&str, &str)]) -> i64 {
        self.map
            .get(&label_key(labels))
            .map(|g| g.load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    fn render(&self, name: &str, out: &mut String) {
        let _ = writeln!(out, "# TYPE {name} gauge");
        for r in self.map.iter() {
            let _ = writeln!(out, "{name}{{{}}} {}", render_labels(r.key()), r.value().load(Ordering::Relaxed));
        }
    }
}

// Decode latency buckets (µs): 10us .. 100ms
const BUCKETS_MICROS: [u64; 8] = [10, 50, 100, 500, 1_000, 5_000, 20_000, 100_000];

#[derive(Default)]
struct AtomicHistogram {
    count: AtomicU64,
    sum: AtomicU64,
    buckets: [AtomicU64; BUCKETS_MICROS.len()],
}

#[derive(Default)]
pub struct HistogramVec {
    map: DashMap<LabelKey, AtomicHistogram>,
}

impl HistogramVec {
    /// Observe a duration into cumulative buckets.
    pub fn observe(&self, labels: &[(&str, &str)], duration: Duration) {
        let hist = self.map.entry(label_key(labels)).or_default();
        let micros = u64::try_from(duration.as_micros()).unwrap_or(u64::MAX);

        hist.count.fetch_add(1, Ordering::Relaxed);
        hist.sum.fetch_add(micros, Ordering::Relaxed);
        for (i, &le) in BUCKETS_MICROS.iter().enumerate() {
            if micros <= le {
                hist.buckets[i].fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    fn render(&self, name: &str, out: &mut String) {
        let _ = writeln!(out, "# TYPE {name} histogram");
        for r in self.map.iter() {
            let labels = render_labels(r.key());
            let prefix = if labels.is_empty() { String::new() } else { format!("{labels},") };
            let hist = r.value();

            for (i, &le) in BUCKETS_MICROS.iter().enumerate() {
                let n = hist.buckets[i].load(Ordering::Relaxed);
                let _ = writeln!(out, "{name}_bucket{{{prefix}le=\"{le}\"}} {n}");
            }
            let count = hist.count.load(Ordering::Relaxed);
            let _ = writeln!(out, "{name}_bucket{{{prefix}le=\"+Inf\"}} {count}");
            let _ = writeln!(out, "{name}_sum{{{labels}}} {}", hist.sum.load(Ordering::Relaxed));
            let _ = writeln!(out, "{name}_count{{{labels}}} {count}");
        }
    }
}

#[derive(Default)]
pub struct FeedMetrics {
    /// label: format
    pub ws_upgrades: CounterVec,
    /// label: topic
    pub sessions_active: GaugeVec,
    /// label: format
    pub frames_in: CounterVec,
    /// label: format
    pub frames_out: CounterVec,
    /// labels: format, kind
    pub decode_errors: CounterVec,
    /// label: format
    pub encode_errors: CounterVec,
    /// label: topic
    pub lagged_events: CounterVec,
    /// label: format
    pub decode_duration: HistogramVec,
    draining: AtomicBool,
}

impl FeedMetrics {
    pub fn set_draining(&self) {
        self.draining.store(true, Ordering::Relaxed);
    }

    pub fn is_draining(&self) -> bool {
        self.draining.load(Ordering::Relaxed)
    }

    /// Render all metrics plus caller-provided gauge lines.
    pub fn render(&self, extra: &[(String, u64)]) -> String {
        let mut out = String::new();
        self.ws_upgrades.render("feedwire_ws_upgrades_total", &mut out);
        self.sessions_active.render("feedwire_sessions_active", &mut out);
        self.frames_in.render("feedwire_frames_in_total", &mut out);
        self.frames_out.render("feedwire_frames_out_total", &mut out);
        self.decode_errors.render("feedwire_decode_errors_total", &mut out);
        self.encode_errors.render("feedwire_encode_errors_total", &mut out);
        self.lagged_events.render("feedwire_lagged_events_total", &mut out);
        self.decode_duration.render("feedwire_decode_duration_micros", &mut out);

        let _ = writeln!(
            out,
            "# TYPE feedwire_draining gauge\nfeedwire_draining {}",
            u8::from(self.is_draining())
        );
        for (k, v) in extra {
            let _ = writeln!(out, "{k} {v}");
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_ignore_label_order() {
        let m = FeedMetrics::default();
        m.decode_errors.inc(&[("format", "zlib"), ("kind", "DECOMPRESSION_ERROR")]);
        m.decode_errors.inc(&[("kind", "DECOMPRESSION_ERROR"), ("format", "zlib")]);
        assert_eq!(m.decode_errors.get(&[("format", "zlib"), ("kind", "DECOMPRESSION_ERROR")]), 2);
    }

    #[test]
    fn renders_prometheus_text() {
        let m = FeedMetrics::default();
        m.frames_in.inc(&[("format", "msgpack")]);
        m.sessions_active.inc(&[("topic", "alerts")]);
        m.decode_duration.observe(&[("format", "msgpack")], Duration::from_micros(40));

        let text = m.render(&[("feedwire_topic_subscribers{topic=\"alerts\"}".into(), 1)]);
        assert!(text.contains("feedwire_frames_in_total{format=\"msgpack\"} 1"));
        assert!(text.contains("feedwire_sessions_active{topic=\"alerts\"} 1"));
        assert!(text.contains("feedwire_decode_duration_micros_bucket{format=\"msgpack\",le=\"10\"} 0"));
        assert!(text.contains("feedwire_decode_duration_micros_bucket{format=\"msgpack\",le=\"50\"} 1"));
        assert!(text.contains("feedwire_draining 0"));
        assert!(text.contains("feedwire_topic_subscribers{topic=\"alerts\"} 1"));
    }
}
