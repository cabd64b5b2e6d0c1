#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use feedwire_core::Format;
use feedwire_gateway::config;

#[test]
fn deny_unknown_fields_nested() {
    let bad = r#"
version: 1
feed:
  default_fromat: msgpack # typo should fail
topics: ["alerts"]
"#;

    let err = config::load_from_str(bad).expect_err("must fail");
    assert_eq!(err.kind().as_str(), "BAD_REQUEST");
}

#[test]
fn ok_minimal_config() {
    let ok = r#"
version: 1
topics:
  - alerts
"#;
    let cfg = config::load_from_str(ok).expect("must parse");
    assert_eq!(cfg.version, 1);
    assert_eq!(cfg.topics[0], "alerts");
    assert_eq!(cfg.feed.default_format, Format::Json);
    assert_eq!(cfg.feed.zlib_level, 6);
    assert_eq!(cfg.gateway.listen, "0.0.0.0:8080");
}

#[test]
fn full_config() {
    let ok = r#"
version: 1
gateway:
  listen: "127.0.0.1:9100"
  ping_interval_ms: 10000
  idle_timeout_ms: 30000
feed:
  default_format: zlib
  zlib_level: 9
  max_frame_bytes: 65536
  max_inflated_bytes: 1048576
  channel_capacity: 256
topics: [alerts, zone_crossings, batch-stats]
"#;
    let cfg = config::load_from_str(ok).expect("must parse");
    assert_eq!(cfg.feed.default_format, Format::Zlib);
    assert_eq!(cfg.feed.codec_options().max_inflated_bytes, 1048576);
    assert_eq!(cfg.feed.read_limit(), 131072);
    assert_eq!(cfg.topics.len(), 3);
}

#[test]
fn unknown_format_name_fails() {
    let bad = r#"
version: 1
feed:
  default_format: brotli
topics: [alerts]
"#;
    assert!(config::load_from_str(bad).is_err());
}

#[test]
fn rejects_out_of_range_values() {
    let cases = [
        ("version: 2\ntopics: [a]\n", "UNSUPPORTED_VERSION"),
        ("version: 1\ntopics: []\n", "BAD_REQUEST"),
        ("version: 1\ntopics: [a, a]\n", "BAD_REQUEST"),
        ("version: 1\ntopics: [\"a b\"]\n", "BAD_REQUEST"),
        ("version: 1\nfeed: { zlib_level: 10 }\ntopics: [a]\n", "BAD_REQUEST"),
        (
            "version: 1\nfeed: { max_frame_bytes: 2048, max_inflated_bytes: 1024 }\ntopics: [a]\n",
            "BAD_REQUEST",
        ),
        ("version: 1\nfeed: { channel_capacity: 0 }\ntopics: [a]\n", "BAD_REQUEST"),
        (
            "version: 1\ngateway: { ping_interval_ms: 20000, idle_timeout_ms: 15000 }\ntopics: [a]\n",
            "BAD_REQUEST",
        ),
    ];

    for (yaml, code) in cases {
        let err = config::load_from_str(yaml).expect_err(yaml);
        assert_eq!(err.kind().as_str(), code, "yaml={yaml}");
    }
}
