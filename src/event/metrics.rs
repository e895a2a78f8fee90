use async_trait::async_trait;
use std::sync::Arc;
use metrics::histogram;
use std::time::{Duration, Instant};

use super::handler::{DiceRollCreatedHandler, EventError};
use super::hub::{Notifier, Subscriber};
use crate::model::DiceRollCreated;

/// Knows how to record the duration of hub operations
pub trait MetricsRecorder: Send + Sync {
    fn measure_notify_op_duration(&self, hub_kind: &str, op: &str, success: bool, took: Duration);

    fn measure_subscribe_op_duration(&self, hub_kind: &str, op: &str, success: bool, took: Duration);
}

pub const NOTIFIER_OP_DURATION: &str = "rollify_notifier_operation_duration_seconds";
pub const SUBSCRIBER_OP_DURATION: &str = "rollify_subscriber_operation_duration_seconds";

/// Recorder publishing measurements as `metrics` histograms, labelled by
/// hub kind, operation and outcome. Whatever exporter the process installs
/// (Prometheus or otherwise) receives them.
pub struct HistogramMetricsRecorder;

fn success_label(success: bool) -> &'static str {
    if success {
        "true"
    } else {
        "false"
    }
}

impl MetricsRecorder for HistogramMetricsRecorder {
    fn measure_notify_op_duration(&self, hub_kind: &str, op: &str, success: bool, took: Duration) {
        histogram!(
            NOTIFIER_OP_DURATION,
            "hub_kind" => hub_kind.to_string(),
            "op" => op.to_string(),
            "success" => success_label(success)
        )
        .record(took.as_secs_f64());
    }

    fn measure_subscribe_op_duration(&self, hub_kind: &str, op: &str, success: bool, took: Duration) {
        histogram!(
            SUBSCRIBER_OP_DURATION,
            "hub_kind" => hub_kind.to_string(),
            "op" => op.to_string(),
            "success" => success_label(success)
        )
        .record(took.as_secs_f64());
    }
}

/// Wraps a [`Notifier`] measuring every call
pub struct MeasuredNotifier {
    hub_kind: String,
    recorder: Arc<dyn MetricsRecorder>,
    next: Arc<dyn Notifier>,
}

impl MeasuredNotifier {
    pub fn new(
        hub_kind: impl Into<String>,
        recorder: Arc<dyn MetricsRecorder>,
        next: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            hub_kind: hub_kind.into(),
            recorder,
            next,
        }
    }
}

#[async_trait]
impl Notifier for MeasuredNotifier {
    async fn notify_dice_roll_created(&self, event: &DiceRollCreated) -> Result<(), EventError> {
        let start = Instant::now();
        let result = self.next.notify_dice_roll_created(event).await;
        self.recorder.measure_notify_op_duration(
            &self.hub_kind,
            "notify_dice_roll_created",
            result.is_ok(),
            start.elapsed(),
        );
        result
    }
}

/// Wraps a [`Subscriber`] measuring every call
pub struct MeasuredSubscriber {
    hub_kind: String,
    recorder: Arc<dyn MetricsRecorder>,
    next: Arc<dyn Subscriber>,
}

impl MeasuredSubscriber {
    pub fn new(
        hub_kind: impl Into<String>,
        recorder: Arc<dyn MetricsRecorder>,
        next: Arc<dyn Subscriber>,
    ) -> Self {
        Self {
            hub_kind: hub_kind.into(),
            recorder,
            next,
        }
    }
}

#[async_trait]
impl Subscriber for MeasuredSubscriber {
    async fn subscribe_dice_roll_created(
        &self,
        subscriber_id: &str,
        room_id: &str,
        handler: Arc<dyn DiceRollCreatedHandler>,
    ) -> Result<(), EventError> {
        let start = Instant::now();
        let result = self
            .next
            .subscribe_dice_roll_created(subscriber_id, room_id, handler)
            .await;
        self.recorder.measure_subscribe_op_duration(
            &self.hub_kind,
            "subscribe_dice_roll_created",
            result.is_ok(),
            start.elapsed(),
        );
        result
    }

    async fn unsubscribe_dice_roll_created(
        &self,
        subscriber_id: &str,
        room_id: &str,
    ) -> Result<(), EventError> {
        let start = Instant::now();
        let result = self
            .next
            .unsubscribe_dice_roll_created(subscriber_id, room_id)
            .await;
        self.recorder.measure_subscribe_op_duration(
            &self.hub_kind,
            "unsubscribe_dice_roll_created",
            result.is_ok(),
            start.elapsed(),
        );
        result
    }
}
