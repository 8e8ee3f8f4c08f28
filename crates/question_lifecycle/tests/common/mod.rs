//! Test utilities: scripted collaborators and question fixtures

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use question_analytics::{AnalyticsBus, TrackedEvent};
use question_core::{
    AccessCredentials, ApiError, AuthError, AuthUser, NewQuestionInput, Question, QuestionStatus,
};
use question_lifecycle::{
    AuthProvider, ControllerConfig, LifecycleSettings, QuestionApi, QuestionController,
};
use serde_json::json;
use tokio::sync::mpsc;

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn question(id: &str, status: QuestionStatus) -> Question {
    let mut question = Question::new(id, "Weekly signups by country");
    question.status = status;
    question
}

pub fn running(id: &str) -> Question {
    let mut q = question(id, QuestionStatus::Running);
    q.query_sql = Some("SELECT country, count(*) FROM signups GROUP BY 1".to_string());
    q
}

pub fn ready(id: &str) -> Question {
    let mut q = running(id);
    q.status = QuestionStatus::Success;
    q.result = Some(json!({"columns": ["country", "count"], "rows": [["SE", 12]]}));
    q.chart = Some(json!({"type": "bar"}));
    q
}

/// Backend fake whose responses tests swap between steps.
pub struct ScriptedApi {
    poll_response: Mutex<Result<Question, ApiError>>,
    create_response: Mutex<Result<Question, ApiError>>,
    poll_calls: AtomicUsize,
    poll_delay: Mutex<Duration>,
    create_inputs: Mutex<Vec<NewQuestionInput>>,
}

impl ScriptedApi {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            poll_response: Mutex::new(Err(ApiError::Transport("not scripted".to_string()))),
            create_response: Mutex::new(Err(ApiError::Transport("not scripted".to_string()))),
            poll_calls: AtomicUsize::new(0),
            poll_delay: Mutex::new(Duration::ZERO),
            create_inputs: Mutex::new(Vec::new()),
        })
    }

    pub fn respond_to_poll(&self, response: Result<Question, ApiError>) {
        *self.poll_response.lock().unwrap() = response;
    }

    pub fn respond_to_create(&self, response: Result<Question, ApiError>) {
        *self.create_response.lock().unwrap() = response;
    }

    /// Make later polls take `delay` before answering.
    pub fn delay_polls(&self, delay: Duration) {
        *self.poll_delay.lock().unwrap() = delay;
    }

    pub fn poll_calls(&self) -> usize {
        self.poll_calls.load(Ordering::SeqCst)
    }

    pub fn create_inputs(&self) -> Vec<NewQuestionInput> {
        self.create_inputs.lock().unwrap().clone()
    }
}

#[async_trait]
impl QuestionApi for ScriptedApi {
    async fn new_question(
        &self,
        input: NewQuestionInput,
        _credentials: AccessCredentials,
    ) -> Result<Question, ApiError> {
        self.create_inputs.lock().unwrap().push(input);
        self.create_response.lock().unwrap().clone()
    }

    async fn poll_question(&self, _id: &str) -> Result<Question, ApiError> {
        self.poll_calls.fetch_add(1, Ordering::SeqCst);
        let delay = *self.poll_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        self.poll_response.lock().unwrap().clone()
    }
}

/// Auth fake with a fixed user.
pub struct StaticAuth {
    pub loading: bool,
    pub user: Option<AuthUser>,
    pub logins: Mutex<Vec<String>>,
}

impl StaticAuth {
    pub fn signed_in() -> Arc<Self> {
        Arc::new(Self {
            loading: false,
            user: Some(AuthUser {
                id: "u-1".to_string(),
                name: Some("Ada".to_string()),
            }),
            logins: Mutex::new(Vec::new()),
        })
    }

    pub fn signed_out() -> Arc<Self> {
        Arc::new(Self {
            loading: false,
            user: None,
            logins: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl AuthProvider for StaticAuth {
    fn is_loading(&self) -> bool {
        self.loading
    }

    fn current_user(&self) -> Option<AuthUser> {
        self.user.clone()
    }

    async fn access_token(&self) -> Result<String, AuthError> {
        match self.user {
            Some(_) => Ok("access-token".to_string()),
            None => Err(AuthError::NotSignedIn),
        }
    }

    async fn login(&self, cause: &str) -> Result<(), AuthError> {
        self.logins.lock().unwrap().push(cause.to_string());
        Ok(())
    }
}

pub struct Harness {
    pub controller: QuestionController,
    pub api: Arc<ScriptedApi>,
    pub auth: Arc<StaticAuth>,
    pub events: mpsc::Receiver<TrackedEvent>,
}

impl Harness {
    pub fn new(auth: Arc<StaticAuth>) -> Self {
        Self::with_settings(auth, LifecycleSettings::default())
    }

    pub fn with_settings(auth: Arc<StaticAuth>, settings: LifecycleSettings) -> Self {
        init_logging();
        let api = ScriptedApi::new();
        let (bus, events) = AnalyticsBus::new(64);
        let controller = QuestionController::new(
            ControllerConfig::new(api.clone(), auth.clone(), Arc::new(bus))
                .with_settings(settings),
        );
        Self {
            controller,
            api,
            auth,
            events,
        }
    }

    /// Drain tracked events with the given name.
    pub fn take_events(&mut self, name: &str) -> Vec<TrackedEvent> {
        let mut matching = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            if event.name == name {
                matching.push(event);
            }
        }
        matching
    }
}

/// Let the reactor observe the latest state without advancing far.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(1)).await;
}
