use async_trait::async_trait;
use question_core::Question;
use question_state::Phase;
use tokio::sync::watch;

use crate::error::LifecycleError;
use crate::state::{CreateOutcome, LifecycleState};

/// The surface UI code works against.
#[async_trait]
pub trait QuestionLifecycle: Send + Sync {
    fn snapshot(&self) -> LifecycleState;

    /// Receiver notified on every state change.
    fn subscribe(&self) -> watch::Receiver<LifecycleState>;

    async fn load(&self, id: &str, clear: bool) -> Result<(), LifecycleError>;

    async fn create(&self, title: &str, ignore_cache: bool)
        -> Result<CreateOutcome, LifecycleError>;

    fn reset(&self);

    fn phase(&self) -> Phase {
        self.snapshot().phase
    }

    fn question(&self) -> Option<Question> {
        self.snapshot().question
    }

    fn is_loading(&self) -> bool {
        self.snapshot().loading
    }

    fn error(&self) -> Option<LifecycleError> {
        self.snapshot().error
    }
}

/// Stand-in for contexts without an active controller: phase `NONE`, every
/// operation a no-op.
pub struct InertLifecycle {
    state: watch::Sender<LifecycleState>,
}

impl InertLifecycle {
    pub fn new() -> Self {
        let (state, _) = watch::channel(LifecycleState::default());
        Self { state }
    }
}

impl Default for InertLifecycle {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl QuestionLifecycle for InertLifecycle {
    fn snapshot(&self) -> LifecycleState {
        self.state.borrow().clone()
    }

    fn subscribe(&self) -> watch::Receiver<LifecycleState> {
        self.state.subscribe()
    }

    async fn load(&self, _id: &str, _clear: bool) -> Result<(), LifecycleError> {
        Ok(())
    }

    async fn create(
        &self,
        _title: &str,
        _ignore_cache: bool,
    ) -> Result<CreateOutcome, LifecycleError> {
        Ok(CreateOutcome::Inactive)
    }

    fn reset(&self) {}
}
