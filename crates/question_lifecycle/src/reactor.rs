//! Background reactions to lifecycle state changes: the poll loop and the
//! completion event.

use std::sync::{Arc, Weak};

use log::{debug, info};
use question_analytics::AnalyticsSink;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::collaborators::Clock;
use crate::completion::CompletionTracker;
use crate::controller::{QuestionController, Shared};
use crate::scheduler::{wait_until, PollScheduler};
use crate::state::LifecycleState;

enum Wake {
    Stop,
    Changed,
    PollDue,
}

pub(crate) struct Reactor {
    shared: Weak<Shared>,
    rx: watch::Receiver<LifecycleState>,
    shutdown: CancellationToken,
    analytics: Arc<dyn AnalyticsSink>,
    clock: Arc<dyn Clock>,
    scheduler: PollScheduler,
    completion: CompletionTracker,
    last_revision: u64,
    in_flight: Option<JoinHandle<()>>,
}

impl Reactor {
    pub(crate) fn spawn(shared: &Arc<Shared>) {
        let rx = shared.state.subscribe();
        let last_revision = rx.borrow().revision;
        let reactor = Reactor {
            shared: Arc::downgrade(shared),
            rx,
            shutdown: shared.shutdown.clone(),
            analytics: Arc::clone(&shared.analytics),
            clock: Arc::clone(&shared.clock),
            scheduler: PollScheduler::new(shared.settings.poll_interval()),
            completion: CompletionTracker::default(),
            last_revision,
            in_flight: None,
        };
        tokio::spawn(reactor.run());
    }

    async fn run(mut self) {
        let shutdown = self.shutdown.clone();
        loop {
            let deadline = self.scheduler.deadline();
            let wake = tokio::select! {
                biased;
                _ = shutdown.cancelled() => Wake::Stop,
                changed = self.rx.changed() => match changed {
                    Ok(()) => Wake::Changed,
                    Err(_) => Wake::Stop,
                },
                _ = wait_until(deadline) => Wake::PollDue,
            };

            match wake {
                Wake::Stop => break,
                Wake::Changed => {
                    let state = self.rx.borrow_and_update().clone();
                    self.observe(&state);
                }
                Wake::PollDue => self.fire(),
            }
        }

        self.scheduler.cancel();
        if let Some(tick) = self.in_flight.take() {
            tick.abort();
        }
        debug!("question lifecycle reactor stopped");
    }

    fn observe(&mut self, state: &LifecycleState) {
        if state.revision != self.last_revision {
            self.last_revision = state.revision;
            if self.scheduler.cancel() {
                debug!("cancelled pending poll, phase is now {}", state.phase);
            }
            if state.phase.is_polling() {
                self.scheduler.schedule();
                debug!(
                    "poll #{} scheduled in {:?} for phase {}",
                    self.scheduler.scheduled_count(),
                    self.scheduler.interval(),
                    state.phase
                );
            }
        }

        if let Some(event) = self.completion.observe(state, self.clock.now()) {
            info!(
                "question {} completed with phase {}",
                state.question_id.as_deref().unwrap_or_default(),
                state.phase
            );
            event.emit(self.analytics.as_ref());
        }
    }

    fn fire(&mut self) {
        self.scheduler.cancel();
        let Some(shared) = self.shared.upgrade() else {
            return;
        };
        let controller = QuestionController::from_shared(shared);
        self.in_flight = Some(tokio::spawn(async move {
            controller.poll_tick().await;
        }));
    }
}
