//! Instrumentation hub registered under `rack.monitor`.
//!
//! Listeners subscribe to an event name; [`Monitor::instrument`] delivers each
//! event to every listener of that name, in subscription order.

use parking_lot::RwLock;
use serde_json::Value as Json;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// An instrumented occurrence.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub name: String,
    pub payload: serde_json::Map<String, Json>,
    pub elapsed: Duration,
}

impl Event {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            payload: serde_json::Map::new(),
            elapsed: Duration::ZERO,
        }
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<Json>) -> Self {
        self.payload.insert(key.into(), value.into());
        self
    }

    pub fn elapsed(mut self, elapsed: Duration) -> Self {
        self.elapsed = elapsed;
        self
    }
}

type Listener = Arc<dyn Fn(&Event) + Send + Sync>;

/// Cloning shares the listener list.
#[derive(Clone, Default)]
pub struct Monitor {
    listeners: Arc<RwLock<Vec<(String, Listener)>>>,
}

impl Monitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, event: impl Into<String>, listener: impl Fn(&Event) + Send + Sync + 'static) {
        self.listeners.write().push((event.into(), Arc::new(listener)));
    }

    pub fn instrument(&self, event: Event) {
        let listeners: Vec<Listener> = self
            .listeners
            .read()
            .iter()
            .filter(|(name, _)| *name == event.name)
            .map(|(_, listener)| Arc::clone(listener))
            .collect();
        for listener in listeners {
            listener(&event);
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.read().len()
    }
}

impl fmt::Debug for Monitor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Monitor")
            .field("listeners", &self.listener_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[test]
    fn delivers_only_matching_events() {
        let monitor = Monitor::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        monitor.subscribe("action.call", move |event| {
            sink.lock().push(event.payload["status"].clone());
        });

        monitor.instrument(Event::new("action.call").with("status", 200));
        monitor.instrument(Event::new("other").with("status", 500));

        assert_eq!(*seen.lock(), [Json::from(200)]);
    }
}
