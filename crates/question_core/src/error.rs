use thiserror::Error;

/// Failure reported by the question backend client.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ApiError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("backend rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("malformed response: {0}")]
    Decode(String),
}

/// Failure reported by the authentication provider.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("no signed-in user")]
    NotSignedIn,

    #[error("failed to obtain access token: {0}")]
    Credential(String),

    #[error("login failed: {0}")]
    Login(String),
}
