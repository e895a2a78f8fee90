use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, warn};

use super::transport::{Transport, TransportError, TransportMessage, TransportSubscription};

type TopicSubscribers = HashMap<u64, mpsc::Sender<TransportMessage>>;

#[derive(Default)]
struct Topics {
    subscribers: Mutex<HashMap<String, TopicSubscribers>>,
    next_id: AtomicU64,
}

impl Topics {
    fn lock(&self) -> MutexGuard<'_, HashMap<String, TopicSubscribers>> {
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn remove(&self, topic: &str, id: u64) -> bool {
        let mut topics = self.lock();
        let Some(subscribers) = topics.get_mut(topic) else {
            return false;
        };
        let removed = subscribers.remove(&id).is_some();
        if subscribers.is_empty() {
            topics.remove(topic);
        }
        removed
    }
}

/// In-process broker, lets several hub replicas living in the same process
/// share events the way they would through an external broker.
///
/// Delivery is best effort: a subscriber whose delivery channel is full
/// loses the message.
#[derive(Clone, Default)]
pub struct LocalBroker {
    topics: Arc<Topics>,
}

impl LocalBroker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscription_count(&self, topic: &str) -> usize {
        self.topics.lock().get(topic).map_or(0, HashMap::len)
    }
}

#[async_trait]
impl Transport for LocalBroker {
    async fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<(), TransportError> {
        let senders: Vec<(u64, mpsc::Sender<TransportMessage>)> = self
            .topics
            .lock()
            .get(topic)
            .map(|subscribers| {
                subscribers
                    .iter()
                    .map(|(id, sender)| (*id, sender.clone()))
                    .collect()
            })
            .unwrap_or_default();

        debug!(topic = %topic, receivers = senders.len(), "Publishing message");

        for (id, sender) in senders {
            match sender.try_send(TransportMessage::new(topic, payload.clone())) {
                Ok(()) => {}
                Err(TrySendError::Full(_)) => {
                    warn!(topic = %topic, subscription = id, "Slow consumer, message dropped");
                }
                Err(TrySendError::Closed(_)) => {
                    debug!(topic = %topic, subscription = id, "Delivery channel closed, pruning");
                    self.topics.remove(topic, id);
                }
            }
        }

        Ok(())
    }

    async fn channel_subscribe(
        &self,
        topic: &str,
        delivery: mpsc::Sender<TransportMessage>,
    ) -> Result<Box<dyn TransportSubscription>, TransportError> {
        if delivery.is_closed() {
            return Err(TransportError::Subscribe(
                "delivery channel is closed".to_string(),
            ));
        }

        let id = self.topics.next_id.fetch_add(1, Ordering::Relaxed);
        self.topics
            .lock()
            .entry(topic.to_string())
            .or_default()
            .insert(id, delivery);

        debug!(topic = %topic, subscription = id, "Subscribed to topic");
        Ok(Box::new(LocalSubscription {
            topics: self.topics.clone(),
            topic: topic.to_string(),
            id,
        }))
    }
}

struct LocalSubscription {
    topics: Arc<Topics>,
    topic: String,
    id: u64,
}

#[async_trait]
impl TransportSubscription for LocalSubscription {
    async fn unsubscribe(&mut self) -> Result<(), TransportError> {
        if self.topics.remove(&self.topic, self.id) {
            debug!(topic = %self.topic, subscription = self.id, "Unsubscribed from topic");
            Ok(())
        } else {
            Err(TransportError::Unsubscribe(format!(
                "subscription {} on {} is not active",
                self.id, self.topic
            )))
        }
    }
}
