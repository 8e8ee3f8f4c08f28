use question_core::{ApiError, AuthError};
use thiserror::Error;

/// Errors surfaced by lifecycle operations and stored in the lifecycle state.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LifecycleError {
    #[error("failed to load question {id}: {source}")]
    Load { id: String, source: ApiError },

    #[error("failed to create question: {0}")]
    Create(#[source] ApiError),

    #[error("failed to obtain credentials: {0}")]
    Credential(#[source] AuthError),

    #[error("failed to start login: {0}")]
    Login(#[source] AuthError),

    /// The backend finished the question but reported a failure.
    #[error("{0}")]
    Question(String),
}
