//! Phases - the UI-facing lifecycle of a question
//!
//! Finer-grained than the backend status: a phase also encodes which
//! artifact (SQL, result, chart) is missing when something went wrong.

use serde::{Deserialize, Serialize};

/// Exactly one phase is active at a time.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Phase {
    // ========== Idle ==========
    /// No question is tracked.
    #[default]
    None,

    // ========== Fetching ==========
    /// Fetching an existing question by id.
    Loading,
    /// The fetch itself failed (transport or backend rejection).
    LoadFailed,

    // ========== Creation ==========
    /// Submitting a new question.
    Creating,
    /// The backend accepted the question and has not started on it.
    Created,
    /// The creation request failed.
    CreateFailed,

    // ========== SQL Generation ==========
    GeneratingSql,
    /// No usable SQL could be produced for the question.
    GenerateSqlFailed,

    // ========== Execution ==========
    /// Waiting for an execution slot.
    Queueing,
    Executing,
    ExecuteFailed,

    // ========== Presentation ==========
    /// A result exists but no chart could be built from it.
    VisualizeFailed,
    /// The backend reported an error although every artifact is present.
    UnknownError,
    /// Result and chart are shown while the summary is still being written.
    Summarizing,
    Ready,
}

impl Phase {
    /// Phases that present a settled outcome to the user.
    ///
    /// `Summarizing` belongs here because its result is displayable, even
    /// though it is still polled.
    pub fn is_final(&self) -> bool {
        matches!(
            self,
            Self::LoadFailed
                | Self::CreateFailed
                | Self::GenerateSqlFailed
                | Self::ExecuteFailed
                | Self::VisualizeFailed
                | Self::UnknownError
                | Self::Summarizing
                | Self::Ready
        )
    }

    /// In-flight phases that keep the poll loop running.
    pub fn is_polling(&self) -> bool {
        matches!(
            self,
            Self::Created
                | Self::GeneratingSql
                | Self::Executing
                | Self::Queueing
                | Self::Summarizing
        )
    }

    /// Final phases after which the question is considered complete.
    pub fn is_complete(&self) -> bool {
        self.is_final() && *self != Self::Summarizing
    }

    /// The wire/analytics name, e.g. `GENERATE_SQL_FAILED`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "NONE",
            Self::Loading => "LOADING",
            Self::LoadFailed => "LOAD_FAILED",
            Self::Creating => "CREATING",
            Self::Created => "CREATED",
            Self::CreateFailed => "CREATE_FAILED",
            Self::GeneratingSql => "GENERATING_SQL",
            Self::GenerateSqlFailed => "GENERATE_SQL_FAILED",
            Self::Queueing => "QUEUEING",
            Self::Executing => "EXECUTING",
            Self::ExecuteFailed => "EXECUTE_FAILED",
            Self::VisualizeFailed => "VISUALIZE_FAILED",
            Self::UnknownError => "UNKNOWN_ERROR",
            Self::Summarizing => "SUMMARIZING",
            Self::Ready => "READY",
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
