//! feed-tail: follow a feedwire topic from the terminal.
//!
//! Negotiates a wire format, decodes every message through the feed message
//! parser and prints it as one JSON line. Undecodable messages are logged and
//! skipped.

use bytes::Bytes;
use clap::Parser;
use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing_subscriber::{fmt, EnvFilter};

use feedwire_core::error::{FeedError, Result};
use feedwire_core::protocol::negotiate::ws_url;
use feedwire_core::{Format, Frame, FrameCodec, WireMessage};

#[derive(Debug, Parser)]
#[command(name = "feed-tail", about = "Print decoded events from a feedwire topic")]
struct Args {
    /// Feed URL, e.g. ws://localhost:8080/v1/feeds/alerts
    url: String,

    /// Preferred outbound format (json, zlib, msgpack).
    #[arg(long, default_value = "json")]
    format: Format,

    /// Publish this JSON document on the topic after connecting.
    #[arg(long)]
    publish: Option<String>,

    /// Exit after this many decoded messages.
    #[arg(long)]
    count: Option<usize>,
}

fn to_tungstenite(frame: Frame) -> Message {
    match frame {
        Frame::Text(s) => Message::Text(s),
        Frame::Binary(b) => Message::Binary(b.to_vec()),
    }
}

#[tokio::main]
async fn main() {
    fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    if let Err(e) = run(args).await {
        tracing::error!(error = %e, "feed-tail failed");
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<()> {
    let url = ws_url(&args.url, args.format)?;
    let codec = FrameCodec::default();

    let (socket, _) = connect_async(url.as_str())
        .await
        .map_err(|e| FeedError::Internal(format!("connect {url} failed: {e}")))?;
    tracing::info!(%url, "connected");

    let (mut tx, mut rx) = socket.split();

    if let Some(doc) = &args.publish {
        let data: Value = serde_json::from_str(doc)?;
        let frame = codec.encode(args.format, &json!({"type": "publish", "data": data}))?;
        tx.send(to_tungstenite(frame))
            .await
            .map_err(|e| FeedError::Internal(format!("send failed: {e}")))?;
    }

    let mut seen = 0usize;
    while let Some(msg) = rx.next().await {
        let msg = msg.map_err(|e| FeedError::Internal(format!("read failed: {e}")))?;
        let wire = match msg {
            Message::Text(s) => WireMessage::Text(s),
            Message::Binary(b) => WireMessage::Binary(Bytes::from(b)),
            Message::Close(_) => break,
            _ => continue,
        };

        match codec.parse_message(wire).await {
            Ok(value) => println!("{value}"),
            Err(e) => {
                tracing::warn!(kind = e.kind().as_str(), error = %e, "skipping message");
                continue;
            }
        }

        seen += 1;
        if args.count.is_some_and(|n| seen >= n) {
            break;
        }
    }

    let _ = tx.close().await;
    Ok(())
}
