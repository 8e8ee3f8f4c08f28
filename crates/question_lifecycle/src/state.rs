use question_core::Question;
use question_state::Phase;
use tokio::time::Instant;

use crate::error::LifecycleError;

/// Everything the lifecycle knows about the current question.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LifecycleState {
    pub phase: Phase,
    pub question: Option<Question>,
    /// True only while a fetch or create request is outstanding.
    pub loading: bool,
    pub error: Option<LifecycleError>,
    /// Id of the tracked question; polls target this id.
    pub question_id: Option<String>,
    /// When the current wait started (creation or a clearing load).
    pub wait_started_at: Option<Instant>,
    /// Bumped on every phase assignment, even when the phase is unchanged.
    pub revision: u64,
    /// Bumped whenever prior state is discarded (reset, create, clearing load).
    /// Requests started under an older epoch do not write their results back.
    pub epoch: u64,
}

impl LifecycleState {
    pub(crate) fn assign_phase(&mut self, phase: Phase) {
        self.phase = phase;
        self.revision = self.revision.wrapping_add(1);
    }

    pub(crate) fn begin_epoch(&mut self) -> u64 {
        self.epoch = self.epoch.wrapping_add(1);
        self.epoch
    }

    /// Whether every observable field matches a freshly constructed state.
    pub fn is_initial(&self) -> bool {
        self.phase == Phase::None
            && self.question.is_none()
            && !self.loading
            && self.error.is_none()
            && self.question_id.is_none()
            && self.wait_started_at.is_none()
    }
}

/// Result of a create call that did not fail.
#[derive(Debug, Clone, PartialEq)]
pub enum CreateOutcome {
    Created(Question),
    /// No user was signed in; the login flow was started instead.
    LoginRequired,
    /// The lifecycle is inert and ignored the call.
    Inactive,
}
