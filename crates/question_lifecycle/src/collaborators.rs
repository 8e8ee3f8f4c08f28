use async_trait::async_trait;
use question_core::{AccessCredentials, ApiError, AuthError, AuthUser, NewQuestionInput, Question};
use tokio::time::Instant;

/// Backend calls the lifecycle depends on.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait QuestionApi: Send + Sync {
    async fn new_question(
        &self,
        input: NewQuestionInput,
        credentials: AccessCredentials,
    ) -> Result<Question, ApiError>;

    async fn poll_question(&self, id: &str) -> Result<Question, ApiError>;
}

/// Authentication state and flows.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// True until the provider knows whether a user is signed in.
    fn is_loading(&self) -> bool;

    fn current_user(&self) -> Option<AuthUser>;

    async fn access_token(&self) -> Result<String, AuthError>;

    /// Start the login flow. `cause` tags why login was requested.
    async fn login(&self, cause: &str) -> Result<(), AuthError>;
}

/// Source of timestamps for elapsed-time measurements.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TokioClock;

impl Clock for TokioClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}
