use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::codec;
use super::transport::{TransportMessage, TransportSubscription};
use crate::event::registry::HandlerRegistry;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum LoopState {
    Running,
    Draining,
    Stopped,
}

enum Step {
    Cancelled,
    Delivered(TransportMessage),
    ChannelClosed,
}

/// Background loop feeding transport messages into a hub's local registry.
///
/// Runs until the cancellation token fires, then unsubscribes from the
/// transport and returns. A handler already running when cancellation
/// arrives is allowed to finish.
pub(super) struct ReceiveLoop {
    topic: String,
    registry: Arc<HandlerRegistry>,
    deliveries: mpsc::Receiver<TransportMessage>,
    subscription: Box<dyn TransportSubscription>,
    cancellation: CancellationToken,
    state: LoopState,
}

impl ReceiveLoop {
    pub(super) fn new(
        topic: String,
        registry: Arc<HandlerRegistry>,
        deliveries: mpsc::Receiver<TransportMessage>,
        subscription: Box<dyn TransportSubscription>,
        cancellation: CancellationToken,
    ) -> Self {
        Self {
            topic,
            registry,
            deliveries,
            subscription,
            cancellation,
            state: LoopState::Running,
        }
    }

    pub(super) async fn run(mut self) -> LoopState {
        info!(topic = %self.topic, "Started event receiver loop");

        while self.state == LoopState::Running {
            let step = tokio::select! {
                biased;
                _ = self.cancellation.cancelled() => Step::Cancelled,
                message = self.deliveries.recv() => match message {
                    Some(message) => Step::Delivered(message),
                    None => Step::ChannelClosed,
                },
            };

            match step {
                Step::Delivered(message) => Self::handle_message(&self.registry, message).await,
                Step::Cancelled => {
                    info!(topic = %self.topic, "Stopping event receiver loop, cancellation requested");
                    self.state = LoopState::Draining;
                }
                Step::ChannelClosed => {
                    warn!(topic = %self.topic, "Delivery channel closed by the transport");
                    self.state = LoopState::Draining;
                }
            }
        }

        self.drain().await
    }

    async fn handle_message(registry: &HandlerRegistry, message: TransportMessage) {
        let event = match codec::decode(&message.payload) {
            Ok(event) => event,
            Err(e) => {
                error!(
                    topic = %message.topic,
                    error = %e,
                    "Could not handle DiceRollCreated event, message dropped"
                );
                return;
            }
        };

        debug!(
            room_id = %event.room_id(),
            dice_roll_id = %event.dice_roll.id,
            "DiceRollCreated event received, broadcasting"
        );
        let report = registry.broadcast(&event).await;
        if report.failed > 0 {
            warn!(
                room_id = %event.room_id(),
                dice_roll_id = %event.dice_roll.id,
                delivered = report.delivered,
                failed = report.failed,
                "DiceRollCreated event partially delivered"
            );
        }
    }

    async fn drain(mut self) -> LoopState {
        debug_assert_eq!(self.state, LoopState::Draining);
        self.deliveries.close();

        if let Err(e) = self.subscription.unsubscribe().await {
            warn!(topic = %self.topic, error = %e, "Could not unsubscribe from transport");
        }

        self.state = LoopState::Stopped;
        info!(topic = %self.topic, "Stopped event receiver loop");
        self.state
    }
}
