use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};

use rollify::event::{
    DiceRollCreatedHandler, HandlerError, LocalBroker, Transport, TransportError,
    TransportMessage, TransportSubscription,
};
use rollify::model::DiceRollCreated;

// ============================================================================
// Mock Infrastructure
// ============================================================================

/// Transport backed by a [`LocalBroker`] that counts unsubscribes and can be
/// told to fail
#[derive(Clone, Default)]
pub struct MockTransport {
    broker: LocalBroker,
    fail_publish: Arc<AtomicBool>,
    fail_subscribe: Arc<AtomicBool>,
    published: Arc<AtomicUsize>,
    unsubscribes: Arc<AtomicUsize>,
}

#[allow(dead_code)]
impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_publish(self) -> Self {
        self.fail_publish.store(true, Ordering::SeqCst);
        self
    }

    pub fn failing_subscribe(self) -> Self {
        self.fail_subscribe.store(true, Ordering::SeqCst);
        self
    }

    pub fn broker(&self) -> &LocalBroker {
        &self.broker
    }

    pub fn published(&self) -> usize {
        self.published.load(Ordering::SeqCst)
    }

    pub fn unsubscribes(&self) -> usize {
        self.unsubscribes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<(), TransportError> {
        if self.fail_publish.load(Ordering::SeqCst) {
            return Err(TransportError::Publish("broker unavailable".to_string()));
        }
        self.published.fetch_add(1, Ordering::SeqCst);
        self.broker.publish(topic, payload).await
    }

    async fn channel_subscribe(
        &self,
        topic: &str,
        delivery: mpsc::Sender<TransportMessage>,
    ) -> Result<Box<dyn TransportSubscription>, TransportError> {
        if self.fail_subscribe.load(Ordering::SeqCst) {
            return Err(TransportError::Subscribe("broker unavailable".to_string()));
        }
        let inner = self.broker.channel_subscribe(topic, delivery).await?;
        Ok(Box::new(CountingSubscription {
            inner,
            unsubscribes: self.unsubscribes.clone(),
        }))
    }
}

struct CountingSubscription {
    inner: Box<dyn TransportSubscription>,
    unsubscribes: Arc<AtomicUsize>,
}

#[async_trait]
impl TransportSubscription for CountingSubscription {
    async fn unsubscribe(&mut self) -> Result<(), TransportError> {
        self.unsubscribes.fetch_add(1, Ordering::SeqCst);
        self.inner.unsubscribe().await
    }
}

/// Handler recording every event it receives
#[derive(Clone, Default)]
pub struct RecordingHandler {
    events: Arc<Mutex<Vec<DiceRollCreated>>>,
}

#[allow(dead_code)]
impl RecordingHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arc(&self) -> Arc<dyn DiceRollCreatedHandler> {
        Arc::new(self.clone())
    }

    pub async fn events(&self) -> Vec<DiceRollCreated> {
        self.events.lock().await.clone()
    }

    pub async fn ids(&self) -> Vec<String> {
        self.events
            .lock()
            .await
            .iter()
            .map(|e| e.dice_roll.id.clone())
            .collect()
    }

    /// Waits until at least `count` events arrived, giving up after a second
    pub async fn wait_for(&self, count: usize) -> Vec<DiceRollCreated> {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(1);
        loop {
            let events = self.events().await;
            if events.len() >= count || tokio::time::Instant::now() >= deadline {
                return events;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }
}

#[async_trait]
impl DiceRollCreatedHandler for RecordingHandler {
    async fn handle(&self, event: DiceRollCreated) -> Result<(), HandlerError> {
        self.events.lock().await.push(event);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "RecordingHandler"
    }
}

/// Handler that always fails, counting its invocations
#[derive(Clone, Default)]
pub struct FailingHandler {
    calls: Arc<AtomicUsize>,
}

#[allow(dead_code)]
impl FailingHandler {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DiceRollCreatedHandler for FailingHandler {
    async fn handle(&self, _event: DiceRollCreated) -> Result<(), HandlerError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(HandlerError::new("handler exploded"))
    }

    fn name(&self) -> &'static str {
        "FailingHandler"
    }
}

/// Handler that panics on every event
#[derive(Clone, Default)]
pub struct PanickingHandler;

#[async_trait]
impl DiceRollCreatedHandler for PanickingHandler {
    async fn handle(&self, event: DiceRollCreated) -> Result<(), HandlerError> {
        panic!("handler blew up on {}", event.dice_roll.id)
    }

    fn name(&self) -> &'static str {
        "PanickingHandler"
    }
}
