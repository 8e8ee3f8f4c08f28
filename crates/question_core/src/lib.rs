//! question_core - Backend record types for asynchronously answered questions
//!
//! The backend owns these records; clients hold read-only cached copies.

pub mod error;
pub mod models;

pub use error::{ApiError, AuthError};
pub use models::{AccessCredentials, AuthUser, NewQuestionInput, Question, QuestionStatus};
