//! question_lifecycle - Create, poll and track asynchronously answered questions
//!
//! A [`QuestionController`] owns the current question's identity, derived
//! [`Phase`], loading flag and last error. While the question is in flight it
//! re-fetches it on a timer, and it reports analytics at creation and
//! completion. Collaborators (backend API, authentication, analytics sink,
//! clock) are injected through [`ControllerConfig`].

pub mod collaborators;
pub mod config;
pub mod controller;
pub mod error;
pub mod lifecycle;
pub mod state;

mod completion;
mod reactor;
mod scheduler;

pub use collaborators::{AuthProvider, Clock, QuestionApi, TokioClock};
pub use config::{ControllerConfig, LifecycleSettings, MIN_POLL_INTERVAL_MS};
pub use controller::QuestionController;
pub use error::LifecycleError;
pub use lifecycle::{InertLifecycle, QuestionLifecycle};
pub use state::{CreateOutcome, LifecycleState};

pub use question_core::{Question, QuestionStatus};
pub use question_state::Phase;
