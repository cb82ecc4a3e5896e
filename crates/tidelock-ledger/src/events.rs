//! Event sinks.

use parking_lot::Mutex;
use tidelock_core::events::LedgerEvent;
use tidelock_core::traits::EventSink;
use tracing::info;

/// Records every event in order.
#[derive(Debug, Default)]
pub struct EventLog {
    events: Mutex<Vec<LedgerEvent>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<LedgerEvent> {
        self.events.lock().clone()
    }

    /// Drain the recorded events.
    pub fn take(&self) -> Vec<LedgerEvent> {
        std::mem::take(&mut *self.events.lock())
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }

    pub fn last(&self) -> Option<LedgerEvent> {
        self.events.lock().last().cloned()
    }
}

impl EventSink for EventLog {
    fn emit(&self, event: &LedgerEvent) {
        self.events.lock().push(event.clone());
    }
}

/// Logs each event as a structured `tracing` record.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, event: &LedgerEvent) {
        match serde_json::to_string(event) {
            Ok(payload) => info!(event = event.name(), %payload, "ledger event"),
            Err(_) => info!(event = event.name(), ?event, "ledger event"),
        }
    }
}
