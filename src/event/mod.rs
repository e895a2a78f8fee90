// Event notification hub
//
// Room scoped publish/subscribe used to push new dice rolls to everyone
// watching a room. Callers only see the Notifier and Subscriber traits, the
// backing hub is either in process (MemoryHub) or shared across replicas
// through a broker (BrokerHub).

// Public API - what other modules can use
pub use broker::{
    decode, encode, BrokerHub, BrokerHubConfig, CodecError, LocalBroker, Transport,
    TransportError, TransportMessage, TransportSubscription, DEFAULT_DELIVERY_CAPACITY,
    DICE_ROLL_CREATED_TOPIC,
};
pub use handler::{
    handler_fn, DiceRollCreatedHandler, EventError, HandlerError, HandlerFn, NoOpHandler,
};
pub use hub::{Notifier, Subscriber};
pub use memory::MemoryHub;
pub use self::metrics::{
    HistogramMetricsRecorder, MeasuredNotifier, MeasuredSubscriber, MetricsRecorder,
    NOTIFIER_OP_DURATION, SUBSCRIBER_OP_DURATION,
};
pub use registry::{BroadcastReport, HandlerRegistry};

pub mod broker;
mod handler;
mod hub;
mod memory;
mod metrics;
mod registry;
