use std::sync::Arc;

use async_trait::async_trait;
use log::{debug, error, info, warn};
use question_analytics::{AnalyticsSink, LifecycleEvent};
use question_core::{AccessCredentials, NewQuestionInput, Question};
use question_state::{derive_phase, Phase};
use tokio::sync::watch;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::collaborators::{AuthProvider, Clock, QuestionApi};
use crate::config::{ControllerConfig, LifecycleSettings};
use crate::error::LifecycleError;
use crate::lifecycle::QuestionLifecycle;
use crate::reactor::Reactor;
use crate::state::{CreateOutcome, LifecycleState};

pub(crate) struct Shared {
    pub(crate) api: Arc<dyn QuestionApi>,
    pub(crate) auth: Arc<dyn AuthProvider>,
    pub(crate) analytics: Arc<dyn AnalyticsSink>,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) settings: LifecycleSettings,
    pub(crate) state: watch::Sender<LifecycleState>,
    pub(crate) shutdown: CancellationToken,
}

impl Drop for Shared {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

/// Drives one question at a time from creation (or load) to a final phase.
///
/// Cloning yields another handle to the same controller. The background poll
/// loop stops on [`shutdown`](Self::shutdown) or when the last handle is dropped.
#[derive(Clone)]
pub struct QuestionController {
    shared: Arc<Shared>,
}

/// Clears the loading flag if an operation is abandoned mid-request, unless
/// the state it was started under has since been discarded.
struct LoadingGuard<'a> {
    state: &'a watch::Sender<LifecycleState>,
    epoch: u64,
    armed: bool,
}

impl<'a> LoadingGuard<'a> {
    fn new(state: &'a watch::Sender<LifecycleState>, epoch: u64) -> Self {
        Self {
            state,
            epoch,
            armed: true,
        }
    }

    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            let epoch = self.epoch;
            self.state.send_if_modified(|state| {
                state.epoch == epoch && std::mem::replace(&mut state.loading, false)
            });
        }
    }
}

fn elapsed_ms(from: Instant, to: Instant) -> u64 {
    to.saturating_duration_since(from).as_millis() as u64
}

impl QuestionController {
    /// Build a controller and start its poll loop. Must be called within a Tokio runtime.
    pub fn new(config: ControllerConfig) -> Self {
        let (state, _) = watch::channel(LifecycleState::default());
        let shared = Arc::new(Shared {
            api: config.api,
            auth: config.auth,
            analytics: config.analytics,
            clock: config.clock,
            settings: config.settings,
            state,
            shutdown: CancellationToken::new(),
        });
        Reactor::spawn(&shared);
        Self { shared }
    }

    pub(crate) fn from_shared(shared: Arc<Shared>) -> Self {
        Self { shared }
    }

    /// Stop the poll loop and cancel any pending poll.
    pub fn shutdown(&self) {
        self.shared.shutdown.cancel();
    }

    pub fn is_shut_down(&self) -> bool {
        self.shared.shutdown.is_cancelled()
    }

    /// Fetch question `id`. With `clear`, prior state is dropped first and the
    /// phase shows `LOADING`; without it, a load of the already tracked id is a
    /// no-op unless a request is outstanding.
    pub async fn load(&self, id: &str, clear: bool) -> Result<(), LifecycleError> {
        {
            let state = self.shared.state.borrow();
            if !clear && !state.loading && state.question_id.as_deref() == Some(id) {
                debug!("question {id} is already tracked, skipping load");
                return Ok(());
            }
        }
        self.fetch(id, clear).await
    }

    /// Submit a new question. Starts the login flow instead when no user is signed in.
    pub async fn create(
        &self,
        title: &str,
        ignore_cache: bool,
    ) -> Result<CreateOutcome, LifecycleError> {
        let auth = &self.shared.auth;
        if !auth.is_loading() && auth.current_user().is_none() {
            let cause = self.shared.settings.login_cause.as_str();
            info!("no signed-in user, starting login ({cause})");
            if let Err(source) = auth.login(cause).await {
                let error = LifecycleError::Login(source);
                self.shared.state.send_modify(|state| {
                    state.begin_epoch();
                    state.error = Some(error.clone());
                    state.assign_phase(Phase::CreateFailed);
                });
                return Err(error);
            }
            return Ok(CreateOutcome::LoginRequired);
        }

        let started = self.shared.clock.now();
        let mut epoch = 0;
        self.shared.state.send_modify(|state| {
            epoch = state.begin_epoch();
            state.error = None;
            state.question = None;
            state.question_id = None;
            state.loading = true;
            state.wait_started_at = Some(started);
            state.assign_phase(Phase::Creating);
        });
        let guard = LoadingGuard::new(&self.shared.state, epoch);

        match self.submit(title, ignore_cache).await {
            Ok(question) => {
                tokio::time::sleep(self.shared.settings.settle_delay()).await;
                if !self.apply_question(question.clone(), epoch) {
                    debug!("question {} created after its state was discarded", question.id);
                }
                guard.disarm();

                let spent_ms = elapsed_ms(started, self.shared.clock.now());
                info!("created question {} in {spent_ms}ms", question.id);
                LifecycleEvent::QuestionCreated {
                    id: question.id.clone(),
                    title: question.title.clone(),
                    hit_cache: question.hit_cache,
                    spent_ms,
                }
                .emit(self.shared.analytics.as_ref());
                Ok(CreateOutcome::Created(question))
            }
            Err(error) => {
                let spent_ms = elapsed_ms(started, self.shared.clock.now());
                error!("failed to create question: {error}");
                LifecycleEvent::QuestionCreateFailed {
                    title: title.to_string(),
                    error: error.to_string(),
                    spent_ms,
                }
                .emit(self.shared.analytics.as_ref());

                self.shared.state.send_if_modified(|state| {
                    if state.epoch != epoch {
                        return false;
                    }
                    state.loading = false;
                    state.error = Some(error.clone());
                    state.assign_phase(Phase::CreateFailed);
                    true
                });
                guard.disarm();
                Err(error)
            }
        }
    }

    /// Forget the current question. Requests still outstanding are ignored
    /// when they return.
    pub fn reset(&self) {
        self.shared.state.send_modify(|state| {
            let (revision, epoch) = (state.revision, state.epoch);
            *state = LifecycleState {
                revision: revision.wrapping_add(1),
                epoch,
                ..LifecycleState::default()
            };
            state.begin_epoch();
        });
    }

    pub fn snapshot(&self) -> LifecycleState {
        self.shared.state.borrow().clone()
    }

    /// Receiver notified on every state change.
    pub fn subscribe(&self) -> watch::Receiver<LifecycleState> {
        self.shared.state.subscribe()
    }

    /// One scheduled poll: re-fetch the tracked question if idle.
    pub(crate) async fn poll_tick(&self) {
        if self.is_shut_down() {
            return;
        }
        let (id, loading) = {
            let state = self.shared.state.borrow();
            (state.question_id.clone(), state.loading)
        };
        let Some(id) = id else {
            debug!("poll tick with no tracked question");
            return;
        };
        if loading {
            debug!("poll tick for question {id} skipped, a request is outstanding");
            return;
        }
        if let Err(e) = self.fetch(&id, false).await {
            warn!("poll for question {id} failed: {e}");
        }
    }

    async fn submit(&self, title: &str, ignore_cache: bool) -> Result<Question, LifecycleError> {
        let access_token = self
            .shared
            .auth
            .access_token()
            .await
            .map_err(LifecycleError::Credential)?;
        let input = NewQuestionInput {
            question: title.to_string(),
            ignore_cache,
        };
        self.shared
            .api
            .new_question(input, AccessCredentials { access_token })
            .await
            .map_err(LifecycleError::Create)
    }

    async fn fetch(&self, id: &str, clear: bool) -> Result<(), LifecycleError> {
        let now = self.shared.clock.now();
        let mut epoch = 0;
        self.shared.state.send_modify(|state| {
            if clear {
                state.begin_epoch();
                state.error = None;
                state.question = None;
                state.wait_started_at = Some(now);
                state.assign_phase(Phase::Loading);
            }
            state.loading = true;
            epoch = state.epoch;
        });
        let guard = LoadingGuard::new(&self.shared.state, epoch);

        match self.shared.api.poll_question(id).await {
            Ok(question) => {
                if !self.apply_question(question, epoch) {
                    debug!("dropped result for question {id}, its state was discarded");
                }
                guard.disarm();
                Ok(())
            }
            Err(source) => {
                let error = LifecycleError::Load {
                    id: id.to_string(),
                    source,
                };
                let applied = self.shared.state.send_if_modified(|state| {
                    if state.epoch != epoch {
                        return false;
                    }
                    state.loading = false;
                    state.error = Some(error.clone());
                    state.assign_phase(Phase::LoadFailed);
                    true
                });
                if !applied {
                    debug!("dropped failure for question {id}, its state was discarded");
                }
                guard.disarm();
                Err(error)
            }
        }
    }

    /// Store a fetched or created question together with its derived phase.
    /// Returns false, leaving state untouched, when `epoch` is no longer current.
    fn apply_question(&self, question: Question, epoch: u64) -> bool {
        let mut reported = None;
        let phase = derive_phase(&question, &mut |message| reported = Some(message));

        self.shared.state.send_if_modified(|state| {
            if state.epoch != epoch {
                return false;
            }
            if let Some(message) = &reported {
                warn!("question {} failed: {message}", question.id);
            }
            if state.question_id.as_deref() != Some(question.id.as_str()) {
                debug!("now tracking question {}", question.id);
            }
            state.question_id = Some(question.id.clone());
            state.error = reported.map(LifecycleError::Question);
            state.question = Some(question);
            state.loading = false;
            state.assign_phase(phase);
            true
        })
    }
}

#[async_trait]
impl QuestionLifecycle for QuestionController {
    fn snapshot(&self) -> LifecycleState {
        QuestionController::snapshot(self)
    }

    fn subscribe(&self) -> watch::Receiver<LifecycleState> {
        QuestionController::subscribe(self)
    }

    async fn load(&self, id: &str, clear: bool) -> Result<(), LifecycleError> {
        QuestionController::load(self, id, clear).await
    }

    async fn create(
        &self,
        title: &str,
        ignore_cache: bool,
    ) -> Result<CreateOutcome, LifecycleError> {
        QuestionController::create(self, title, ignore_cache).await
    }

    fn reset(&self) {
        QuestionController::reset(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::{MockAuthProvider, MockQuestionApi};
    use question_analytics::NoopSink;
    use question_core::{ApiError, AuthError, AuthUser, QuestionStatus};
    use std::sync::Mutex;

    fn running(id: &str) -> Question {
        let mut question = Question::new(id, "Revenue by region");
        question.status = QuestionStatus::Running;
        question.query_sql = Some("SELECT region, sum(amount) FROM orders GROUP BY 1".to_string());
        question
    }

    fn signed_in() -> MockAuthProvider {
        let mut auth = MockAuthProvider::new();
        auth.expect_is_loading().return_const(false);
        auth.expect_current_user().returning(|| {
            Some(AuthUser {
                id: "u-1".to_string(),
                name: None,
            })
        });
        auth.expect_access_token()
            .returning(|| Ok("token-1".to_string()));
        auth
    }

    fn controller(api: MockQuestionApi, auth: MockAuthProvider) -> QuestionController {
        QuestionController::new(ControllerConfig::new(
            Arc::new(api),
            Arc::new(auth),
            Arc::new(NoopSink),
        ))
    }

    #[tokio::test(start_paused = true)]
    async fn duplicate_load_is_a_noop() {
        let mut api = MockQuestionApi::new();
        api.expect_poll_question()
            .times(1)
            .returning(|id| Ok(running(id)));
        let controller = controller(api, MockAuthProvider::new());

        controller.load("q-1", false).await.expect("first load");
        let before = controller.snapshot();
        controller.load("q-1", false).await.expect("second load");

        assert_eq!(controller.snapshot(), before);
        assert_eq!(before.phase, Phase::Executing);
        controller.shutdown();
    }

    #[tokio::test(start_paused = true)]
    async fn clearing_load_refetches_tracked_question() {
        let mut api = MockQuestionApi::new();
        api.expect_poll_question()
            .times(2)
            .returning(|id| Ok(running(id)));
        let controller = controller(api, MockAuthProvider::new());

        controller.load("q-1", true).await.expect("first load");
        controller.load("q-1", true).await.expect("clearing load");
        controller.shutdown();
    }

    #[tokio::test(start_paused = true)]
    async fn fetched_id_supersedes_requested_id() {
        let mut api = MockQuestionApi::new();
        api.expect_poll_question()
            .returning(|_| Ok(running("q-canonical")));
        let controller = controller(api, MockAuthProvider::new());

        controller.load("q-alias", true).await.expect("load");

        let state = controller.snapshot();
        assert_eq!(state.question_id.as_deref(), Some("q-canonical"));
        assert!(!state.loading);
        controller.shutdown();
    }

    #[tokio::test(start_paused = true)]
    async fn load_failure_sets_load_failed() {
        let mut api = MockQuestionApi::new();
        api.expect_poll_question()
            .returning(|_| Err(ApiError::Transport("connection reset".to_string())));
        let controller = controller(api, MockAuthProvider::new());

        let err = controller.load("q-1", true).await.unwrap_err();
        assert!(matches!(err, LifecycleError::Load { ref id, .. } if id == "q-1"));

        let state = controller.snapshot();
        assert_eq!(state.phase, Phase::LoadFailed);
        assert_eq!(state.error, Some(err));
        assert!(!state.loading);
        controller.shutdown();
    }

    #[tokio::test(start_paused = true)]
    async fn create_without_user_starts_login() {
        let mut auth = MockAuthProvider::new();
        auth.expect_is_loading().return_const(false);
        auth.expect_current_user().returning(|| None);
        auth.expect_access_token().never();
        let causes = Arc::new(Mutex::new(Vec::new()));
        let recorded = Arc::clone(&causes);
        auth.expect_login().times(1).returning(move |cause| {
            recorded.lock().unwrap().push(cause.to_string());
            Ok(())
        });
        let mut api = MockQuestionApi::new();
        api.expect_new_question().never();
        let controller = controller(api, auth);

        let outcome = controller.create("Orders per day", false).await.expect("create");

        assert_eq!(outcome, CreateOutcome::LoginRequired);
        assert_eq!(*causes.lock().unwrap(), vec!["new_question".to_string()]);
        assert!(controller.snapshot().is_initial());
        controller.shutdown();
    }

    #[tokio::test(start_paused = true)]
    async fn create_proceeds_while_auth_is_loading() {
        let mut auth = MockAuthProvider::new();
        auth.expect_is_loading().return_const(true);
        auth.expect_current_user().returning(|| None);
        auth.expect_login().never();
        auth.expect_access_token()
            .returning(|| Err(AuthError::Credential("expired".to_string())));
        let mut api = MockQuestionApi::new();
        api.expect_new_question().never();
        let controller = controller(api, auth);

        let err = controller.create("Orders per day", false).await.unwrap_err();

        assert!(matches!(err, LifecycleError::Credential(_)));
        assert_eq!(controller.snapshot().phase, Phase::CreateFailed);
        controller.shutdown();
    }

    #[tokio::test(start_paused = true)]
    async fn create_passes_input_and_token() {
        let mut api = MockQuestionApi::new();
        api.expect_new_question()
            .times(1)
            .returning(|input, credentials| {
                assert_eq!(input.question, "Orders per day");
                assert!(input.ignore_cache);
                assert_eq!(credentials.access_token, "token-1");
                Ok(Question::new("q-9", input.question))
            });
        let controller = controller(api, signed_in());

        let outcome = controller.create("Orders per day", true).await.expect("create");

        assert!(matches!(outcome, CreateOutcome::Created(ref q) if q.id == "q-9"));
        let state = controller.snapshot();
        assert_eq!(state.phase, Phase::Created);
        assert_eq!(state.question_id.as_deref(), Some("q-9"));
        assert!(!state.loading);
        controller.shutdown();
    }

    #[tokio::test(start_paused = true)]
    async fn reset_restores_initial_state() {
        let mut api = MockQuestionApi::new();
        api.expect_poll_question().returning(|id| Ok(running(id)));
        let controller = controller(api, MockAuthProvider::new());

        controller.load("q-1", true).await.expect("load");
        assert!(!controller.snapshot().is_initial());

        controller.reset();
        assert!(controller.snapshot().is_initial());
        controller.shutdown();
    }

    #[tokio::test(start_paused = true)]
    async fn abandoned_load_clears_loading() {
        let mut api = MockQuestionApi::new();
        api.expect_poll_question().returning(|id| Ok(running(id)));
        let controller = controller(api, MockAuthProvider::new());

        {
            let epoch = controller.snapshot().epoch;
            let guard = LoadingGuard::new(&controller.shared.state, epoch);
            controller.shared.state.send_modify(|state| state.loading = true);
            drop(guard);
        }
        assert!(!controller.snapshot().loading);
        controller.shutdown();
    }

    #[tokio::test(start_paused = true)]
    async fn abandoned_load_spares_newer_state() {
        let controller = controller(MockQuestionApi::new(), MockAuthProvider::new());

        {
            let guard = LoadingGuard::new(&controller.shared.state, controller.snapshot().epoch);
            controller.shared.state.send_modify(|state| {
                state.begin_epoch();
                state.loading = true;
            });
            drop(guard);
        }
        assert!(controller.snapshot().loading);
        controller.shutdown();
    }

    #[tokio::test(start_paused = true)]
    async fn stale_question_is_not_applied() {
        let controller = controller(MockQuestionApi::new(), MockAuthProvider::new());
        let epoch = controller.snapshot().epoch;
        controller.reset();

        assert!(!controller.apply_question(running("q-1"), epoch));
        assert!(controller.snapshot().is_initial());
        assert!(controller.apply_question(running("q-1"), controller.snapshot().epoch));
        assert_eq!(controller.snapshot().phase, Phase::Executing);
        controller.shutdown();
    }
}
