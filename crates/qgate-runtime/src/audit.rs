//! Audit trail of gateway decisions.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Mutex;
use uuid::Uuid;

use qgate_core::QuerySource;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    Validate,
    Execute,
    Provision,
}

#[derive(Debug, Clone, Serialize)]
pub struct AuditEvent {
    pub event_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub action: AuditAction,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<QuerySource>,
    pub catalog_version: String,
    /// Whether the action was allowed / succeeded.
    pub allowed: bool,
    pub detail: serde_json::Value,
}

impl AuditEvent {
    pub fn new(
        action: AuditAction,
        catalog_version: impl Into<String>,
        allowed: bool,
        detail: serde_json::Value,
    ) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            action,
            source: None,
            catalog_version: catalog_version.into(),
            allowed,
            detail,
        }
    }

    pub fn with_source(mut self, source: QuerySource) -> Self {
        self.source = Some(source);
        self
    }
}

/// Receives audit events. Implementations must not block for long; they are
/// called inline on the request path.
pub trait AuditSink: Send + Sync {
    fn record(&self, event: AuditEvent);
}

/// Emits events as structured `tracing` records under the `qgate::audit`
/// target.
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn record(&self, event: AuditEvent) {
        tracing::info!(
            target: "qgate::audit",
            event_id = %event.event_id,
            action = ?event.action,
            source = ?event.source,
            catalog_version = %event.catalog_version,
            allowed = event.allowed,
            detail = %event.detail,
            "audit"
        );
    }
}

/// Keeps events in memory; useful when embedding and in tests.
#[derive(Default)]
pub struct MemoryAuditSink {
    events: Mutex<Vec<AuditEvent>>,
}

impl MemoryAuditSink {
    pub fn events(&self) -> Vec<AuditEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }
}

impl AuditSink for MemoryAuditSink {
    fn record(&self, event: AuditEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_memory_sink() {
        let sink = MemoryAuditSink::default();
        sink.record(
            AuditEvent::new(AuditAction::Validate, "v1", false, json!({"reason": "x"}))
                .with_source(QuerySource::Manual),
        );
        let events = sink.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].source, Some(QuerySource::Manual));

        let value = serde_json::to_value(&events[0]).unwrap();
        assert_eq!(value["action"], "validate");
        assert_eq!(value["source"], "manual");
    }
}
