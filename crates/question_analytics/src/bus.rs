use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use log::warn;
use tokio::sync::mpsc;

use crate::events::{EventMeta, TrackedEvent};
use crate::sink::{AnalyticsSink, EventProperties};

/// A bounded channel-based analytics sink
///
/// Uses `try_send` for non-blocking emission. If the channel is full,
/// events are dropped and counted in the `dropped` counter.
pub struct AnalyticsBus {
    tx: mpsc::Sender<TrackedEvent>,
    dropped: Arc<AtomicU64>,
}

impl AnalyticsBus {
    /// Create a new AnalyticsBus with the specified channel capacity
    ///
    /// Returns the bus (for tracking events) and the receiver (for delivering them)
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<TrackedEvent>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (
            Self {
                tx,
                dropped: Arc::new(AtomicU64::new(0)),
            },
            rx,
        )
    }

    /// Get the number of dropped events since the bus was created
    pub fn dropped_count(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Check if the channel is closed (receiver dropped)
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

impl AnalyticsSink for AnalyticsBus {
    fn track(&self, name: &str, properties: EventProperties) {
        let event = TrackedEvent {
            meta: EventMeta::new(),
            name: name.to_string(),
            properties,
        };
        if self.tx.try_send(event).is_err() {
            let dropped = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
            warn!("analytics event {name} dropped ({dropped} so far)");
        }
    }
}

impl Clone for AnalyticsBus {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
            dropped: Arc::clone(&self.dropped),
        }
    }
}
