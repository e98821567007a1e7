//! Where the decision loop publishes panel events.
//!
//! A desktop shell forwards them to its frontend, the headless host logs
//! them and tests record them.

use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Sink for topic-tagged JSON payloads. Must not block the caller.
pub trait EventBus: Send + Sync {
    fn emit(&self, topic: &str, payload: serde_json::Value);
}

pub type EventBusRef = Arc<dyn EventBus>;

/// Serialize `event` and emit it. Serialization failures are logged and
/// the event is dropped.
pub fn emit_event<T: Serialize>(bus: &dyn EventBus, topic: &str, event: &T) {
    match serde_json::to_value(event) {
        Ok(payload) => bus.emit(topic, payload),
        Err(e) => tracing::warn!(topic, error = %e, "failed to serialize event"),
    }
}

/// One event as recorded by [`InMemoryEventBus`].
#[derive(Debug, Clone)]
pub struct EmittedEvent {
    pub topic: String,
    pub payload: serde_json::Value,
}

/// Records every event in emission order.
#[derive(Default)]
pub struct InMemoryEventBus {
    recorded: Mutex<Vec<EmittedEvent>>,
}

impl InMemoryEventBus {
    pub fn new() -> Self {
        Self::default()
    }

    fn recorded(&self) -> MutexGuard<'_, Vec<EmittedEvent>> {
        self.recorded.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn events(&self) -> Vec<EmittedEvent> {
        self.recorded().clone()
    }

    /// Recorded events on `topic`, oldest first.
    pub fn events_for(&self, topic: &str) -> Vec<EmittedEvent> {
        self.recorded()
            .iter()
            .filter(|event| event.topic == topic)
            .cloned()
            .collect()
    }

    pub fn clear(&self) {
        self.recorded().clear();
    }
}

impl EventBus for InMemoryEventBus {
    fn emit(&self, topic: &str, payload: serde_json::Value) {
        self.recorded().push(EmittedEvent {
            topic: topic.to_owned(),
            payload,
        });
    }
}

/// Drops everything. Default when no host listens.
pub struct NullEventBus;

impl EventBus for NullEventBus {
    fn emit(&self, _topic: &str, _payload: serde_json::Value) {}
}

/// Logs every event at debug level.
pub struct TracingEventBus;

impl EventBus for TracingEventBus {
    fn emit(&self, topic: &str, payload: serde_json::Value) {
        tracing::debug!(topic, %payload, "event");
    }
}
