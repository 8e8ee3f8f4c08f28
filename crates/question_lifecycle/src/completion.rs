use question_analytics::LifecycleEvent;
use question_state::Phase;
use tokio::time::Instant;

use crate::state::LifecycleState;

/// Emits the completion event once per (epoch, question id, phase) transition.
///
/// The epoch changes on every clearing load, so reloading a finished question
/// completes again even when the intermediate `LOADING` state was coalesced away.
#[derive(Debug, Default)]
pub(crate) struct CompletionTracker {
    last: Option<(u64, Option<String>, Phase)>,
}

impl CompletionTracker {
    pub(crate) fn observe(&mut self, state: &LifecycleState, now: Instant) -> Option<LifecycleEvent> {
        let key = (state.epoch, state.question_id.clone(), state.phase);
        if self.last.as_ref() == Some(&key) {
            return None;
        }
        self.last = Some(key);

        if !state.phase.is_complete() {
            return None;
        }
        let id = state.question_id.as_deref().filter(|id| !id.is_empty())?;
        let question = state.question.as_ref();

        Some(LifecycleEvent::QuestionCompleted {
            id: id.to_string(),
            title: question.map(|q| q.title.clone()).unwrap_or_default(),
            hit_cache: question.is_some_and(|q| q.hit_cache),
            recommended: question.is_some_and(|q| q.recommended),
            status: question
                .map(|q| q.status.as_str().to_string())
                .unwrap_or_default(),
            not_clear: question.is_some_and(|q| q.is_not_clear()),
            has_assumption: question.is_some_and(|q| q.has_assumption()),
            sql_can_answer: question.and_then(|q| q.sql_can_answer),
            spent_ms: state
                .wait_started_at
                .map(|started| now.saturating_duration_since(started).as_millis() as u64),
        })
    }
}
