use serde::Serialize;
use tokio::sync::mpsc::UnboundedSender;

use crate::model::run::RunEvent;

/// What the host hears about without asking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CoreEvent {
    StoreChanged { persisted: usize },
    Collection(RunEvent),
}

pub trait EventSink: Send + Sync {
    fn emit(&self, event: CoreEvent);
}

/// Drops every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl EventSink for NoopSink {
    fn emit(&self, _event: CoreEvent) {}
}

impl EventSink for UnboundedSender<CoreEvent> {
    fn emit(&self, event: CoreEvent) {
        // receiver gone means the host stopped listening
        let _ = self.send(event);
    }
}
