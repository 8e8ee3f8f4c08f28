use serde_json::{Map, Value};

/// Flat property map attached to an analytics event.
pub type EventProperties = Map<String, Value>;

/// Destination for named analytics events.
///
/// Implementations must not block; delivery happens elsewhere.
pub trait AnalyticsSink: Send + Sync {
    fn track(&self, name: &str, properties: EventProperties);
}

/// Discards every event.
#[derive(Debug, Clone, Default)]
pub struct NoopSink;

impl AnalyticsSink for NoopSink {
    fn track(&self, _name: &str, _properties: EventProperties) {}
}
