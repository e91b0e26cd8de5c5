//! TracingEventSink - writes domain events to the log.

use async_trait::async_trait;
use tracing::info;

use crate::domain::DomainEvent;
use crate::ports::EventSink;

#[derive(Debug, Clone, Copy, Default)]
pub struct TracingEventSink;

#[async_trait]
impl EventSink for TracingEventSink {
    async fn emit(&self, event: DomainEvent) {
        let payload = serde_json::to_string(&event).unwrap_or_else(|_| format!("{event:?}"));
        info!(
            target: "trellis::events",
            event = event.name(),
            project = %event.project(),
            %payload,
            "domain event"
        );
    }
}
