use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::sink::{AnalyticsSink, EventProperties};

/// Metadata attached to every tracked event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventMeta {
    /// Unique event ID (UUID v4)
    pub event_id: String,
    /// When the event was tracked
    pub occurred_at: DateTime<Utc>,
}

impl EventMeta {
    pub fn new() -> Self {
        Self {
            event_id: Uuid::new_v4().to_string(),
            occurred_at: Utc::now(),
        }
    }
}

impl Default for EventMeta {
    fn default() -> Self {
        Self::new()
    }
}

/// An event as it travels from a sink to whatever delivers it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackedEvent {
    pub meta: EventMeta,
    pub name: String,
    pub properties: EventProperties,
}

// ============================================================================
// Lifecycle Events
// ============================================================================

/// Events emitted at key transitions of a question's lifecycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LifecycleEvent {
    QuestionCreated {
        id: String,
        title: String,
        hit_cache: bool,
        spent_ms: u64,
    },
    QuestionCreateFailed {
        title: String,
        error: String,
        spent_ms: u64,
    },
    /// The question reached a final phase other than summarizing.
    QuestionCompleted {
        id: String,
        title: String,
        hit_cache: bool,
        recommended: bool,
        /// Raw backend status
        status: String,
        not_clear: bool,
        has_assumption: bool,
        sql_can_answer: Option<bool>,
        /// Time since the question was submitted or first loaded, if known
        spent_ms: Option<u64>,
    },
}

impl LifecycleEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::QuestionCreated { .. } => "question_created",
            Self::QuestionCreateFailed { .. } => "question_create_failed",
            Self::QuestionCompleted { .. } => "question_completed",
        }
    }

    /// Flatten the event into the property map sinks accept.
    pub fn properties(&self) -> EventProperties {
        let value = match self {
            Self::QuestionCreated {
                id,
                title,
                hit_cache,
                spent_ms,
            } => json!({
                "id": id,
                "title": title,
                "hit_cache": hit_cache,
                "spent_ms": spent_ms,
            }),
            Self::QuestionCreateFailed {
                title,
                error,
                spent_ms,
            } => json!({
                "title": title,
                "error": error,
                "spent_ms": spent_ms,
            }),
            Self::QuestionCompleted {
                id,
                title,
                hit_cache,
                recommended,
                status,
                not_clear,
                has_assumption,
                sql_can_answer,
                spent_ms,
            } => json!({
                "id": id,
                "title": title,
                "hit_cache": hit_cache,
                "recommended": recommended,
                "status": status,
                "not_clear": not_clear,
                "has_assumption": has_assumption,
                "sql_can_answer": sql_can_answer,
                "spent_ms": spent_ms,
            }),
        };
        match value {
            Value::Object(map) => map,
            _ => EventProperties::new(),
        }
    }

    pub fn emit(&self, sink: &dyn AnalyticsSink) {
        sink.track(self.name(), self.properties());
    }
}
