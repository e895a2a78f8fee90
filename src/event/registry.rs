use futures::future::join_all;
use futures::FutureExt;
use std::any::Any;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, error};

use super::handler::{DiceRollCreatedHandler, HandlerError};
use crate::model::DiceRollCreated;

type RoomHandlers = HashMap<String, Arc<dyn DiceRollCreatedHandler>>;

/// Outcome of broadcasting one event to the handlers of its room
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    pub delivered: usize,
    pub failed: usize,
}

impl BroadcastReport {
    pub fn invoked(&self) -> usize {
        self.delivered + self.failed
    }
}

/// Handlers registered on a hub: room_id -> subscriber_id -> handler
///
/// Every read and write goes through one mutex. Handlers are copied out of
/// the critical section before being invoked, so a slow handler never blocks
/// subscribe or unsubscribe calls.
#[derive(Default)]
pub struct HandlerRegistry {
    rooms: Mutex<HashMap<String, RoomHandlers>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn rooms(&self) -> MutexGuard<'_, HashMap<String, RoomHandlers>> {
        // The map is left consistent by every operation, a panic elsewhere
        // while holding the lock does not invalidate it.
        self.rooms.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Registers a handler, returning true if it replaced an existing one
    pub fn set(
        &self,
        room_id: &str,
        subscriber_id: &str,
        handler: Arc<dyn DiceRollCreatedHandler>,
    ) -> bool {
        let mut rooms = self.rooms();
        rooms
            .entry(room_id.to_string())
            .or_default()
            .insert(subscriber_id.to_string(), handler)
            .is_some()
    }

    /// Removes a handler, returning true if one was registered.
    /// Rooms left without subscribers are dropped from the map.
    pub fn delete(&self, room_id: &str, subscriber_id: &str) -> bool {
        let mut rooms = self.rooms();
        let Some(handlers) = rooms.get_mut(room_id) else {
            return false;
        };

        let removed = handlers.remove(subscriber_id).is_some();
        if handlers.is_empty() {
            rooms.remove(room_id);
        }
        removed
    }

    /// Copies the handlers currently registered for a room
    pub fn snapshot(&self, room_id: &str) -> Vec<(String, Arc<dyn DiceRollCreatedHandler>)> {
        let rooms = self.rooms();
        rooms
            .get(room_id)
            .map(|handlers| {
                handlers
                    .iter()
                    .map(|(id, handler)| (id.clone(), handler.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn subscriber_count(&self, room_id: &str) -> usize {
        self.rooms().get(room_id).map_or(0, HashMap::len)
    }

    pub fn room_count(&self) -> usize {
        self.rooms().len()
    }

    /// Invokes every handler of the event's room with the event.
    ///
    /// Handler failures are logged and never stop the remaining handlers.
    pub async fn broadcast(&self, event: &DiceRollCreated) -> BroadcastReport {
        let room_id = event.room_id();
        let handlers = self.snapshot(room_id);

        if handlers.is_empty() {
            debug!(room_id = %room_id, "No subscribers for room, event dropped");
            return BroadcastReport::default();
        }

        debug!(
            room_id = %room_id,
            dice_roll_id = %event.dice_roll.id,
            "Dispatching event to {} handlers",
            handlers.len()
        );

        let results = join_all(handlers.iter().map(|(subscriber_id, handler)| async move {
            let result = AssertUnwindSafe(handler.handle(event.clone()))
                .catch_unwind()
                .await
                .unwrap_or_else(|panic| Err(panicked(panic)));
            (subscriber_id, handler.name(), result)
        }))
        .await;

        let mut report = BroadcastReport::default();
        for (subscriber_id, handler_name, result) in results {
            match result {
                Ok(()) => report.delivered += 1,
                Err(e) => {
                    report.failed += 1;
                    error!(
                        room_id = %room_id,
                        subscriber_id = %subscriber_id,
                        handler = handler_name,
                        error = %e,
                        "Error executing hub event handler"
                    );
                }
            }
        }

        report
    }
}

fn panicked(panic: Box<dyn Any + Send>) -> HandlerError {
    let reason = panic
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string());
    HandlerError::new(format!("handler panicked: {reason}"))
}
