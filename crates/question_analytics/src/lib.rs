pub mod bus;
pub mod events;
pub mod sink;

pub use bus::AnalyticsBus;
pub use events::{EventMeta, LifecycleEvent, TrackedEvent};
pub use sink::{AnalyticsSink, EventProperties, NoopSink};
