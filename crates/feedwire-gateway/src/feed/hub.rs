use std::sync::Arc;

use dashmap::DashMap;
use serde_json::Value;
use tokio::sync::broadcast;

use feedwire_core::error::{FeedError, Result};

use crate::feed::envelope::event_json;
use crate::feed::event::FeedEvent;

/// Topic registry: `topic -> broadcast sender`.
pub struct FeedHub {
    topics: DashMap<String, broadcast::Sender<Arc<FeedEvent>>>,
}

impl FeedHub {
    pub fn new<I, S>(topics: I, capacity: usize) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let map = DashMap::new();
        for t in topics {
            let (tx, _) = broadcast::channel(capacity.max(1));
            map.insert(t.into(), tx);
        }
        Self { topics: map }
    }

    pub fn has_topic(&self, topic: &str) -> bool {
        self.topics.contains_key(topic)
    }

    pub fn subscribe(&self, topic: &str) -> Option<broadcast::Receiver<Arc<FeedEvent>>> {
        self.topics.get(topic).map(|tx| tx.subscribe())
    }

    /// Publish `data` as an event on `topic`. Returns the number of sessions
    /// it was queued for (0 when nobody listens).
    pub fn publish(&self, topic: &str, data: Value) -> Result<usize> {
        let tx = self
            .topics
            .get(topic)
            .ok_or_else(|| FeedError::BadRequest(format!("unknown topic: {topic}")))?;
        let ev = Arc::new(FeedEvent::new(event_json(topic, data)));
        Ok(tx.send(ev).unwrap_or(0))
    }

    pub fn subscriber_count(&self, topic: &str) -> usize {
        self.topics.get(topic).map(|tx| tx.receiver_count()).unwrap_or(0)
    }

    /// Topic names, sorted.
    pub fn topics(&self) -> Vec<String> {
        let mut names: Vec<String> = self.topics.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn publish_reaches_subscribers() {
        let hub = FeedHub::new(["alerts", "zones"], 8);
        let mut rx = hub.subscribe("alerts").unwrap();

        assert_eq!(hub.publish("alerts", json!({"id": 1})).unwrap(), 1);
        let ev = rx.recv().await.unwrap();
        assert_eq!(ev.value(), &json!({"type": "event", "topic": "alerts", "data": {"id": 1}}));

        assert_eq!(hub.publish("zones", json!({})).unwrap(), 0);
        assert!(hub.publish("nope", json!({})).is_err());
        assert!(hub.subscribe("nope").is_none());
    }

    #[test]
    fn lists_topics() {
        let hub = FeedHub::new(vec!["zones".to_string(), "alerts".to_string()], 8);
        assert_eq!(hub.topics(), vec!["alerts", "zones"]);
        assert!(hub.has_topic("zones"));
        assert_eq!(hub.subscriber_count("zones"), 0);
    }
}
