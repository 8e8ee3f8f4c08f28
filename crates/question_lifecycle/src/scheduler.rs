use std::time::Duration;

use tokio::time::{sleep_until, Instant};

/// Holds at most one pending poll deadline.
#[derive(Debug)]
pub(crate) struct PollScheduler {
    interval: Duration,
    deadline: Option<Instant>,
    scheduled: u64,
}

impl PollScheduler {
    pub(crate) fn new(interval: Duration) -> Self {
        Self {
            interval,
            deadline: None,
            scheduled: 0,
        }
    }

    pub(crate) fn interval(&self) -> Duration {
        self.interval
    }

    /// Replace any pending deadline with one `interval` from now.
    pub(crate) fn schedule(&mut self) {
        self.deadline = Some(Instant::now() + self.interval);
        self.scheduled += 1;
    }

    /// Returns whether a poll was pending.
    pub(crate) fn cancel(&mut self) -> bool {
        self.deadline.take().is_some()
    }

    pub(crate) fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub(crate) fn scheduled_count(&self) -> u64 {
        self.scheduled
    }
}

/// Completes at `deadline`, or never when there is none.
pub(crate) async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
