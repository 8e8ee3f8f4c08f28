//! Phase derivation - raw backend status to UI phase
//!
//! Pure and deterministic: the only side effect is the error-reporting
//! callback, invoked for domain failures (`Error` and `Cancel`).

use question_core::{Question, QuestionStatus};

use super::phases::Phase;

pub const ERROR_FALLBACK_MESSAGE: &str = "Failed to answer the question";
pub const CANCEL_FALLBACK_MESSAGE: &str = "The question was cancelled";

/// Derive the phase for `question`, reporting domain failures through `report_error`.
pub fn derive_phase(question: &Question, report_error: &mut dyn FnMut(String)) -> Phase {
    match question.status {
        QuestionStatus::New => Phase::Created,
        QuestionStatus::AnswerGenerating | QuestionStatus::SqlValidating => Phase::GeneratingSql,
        QuestionStatus::Waiting => Phase::Queueing,
        QuestionStatus::Running => Phase::Executing,
        QuestionStatus::Summarizing => Phase::Summarizing,

        QuestionStatus::Success => {
            if question.has_chart() {
                Phase::Ready
            } else if question.sql_can_answer == Some(false) {
                Phase::GenerateSqlFailed
            } else {
                Phase::VisualizeFailed
            }
        }

        QuestionStatus::Error => {
            report_error(
                question
                    .error_message()
                    .unwrap_or(ERROR_FALLBACK_MESSAGE)
                    .to_string(),
            );
            if !question.has_query_sql() {
                Phase::GenerateSqlFailed
            } else if !question.has_result() {
                Phase::ExecuteFailed
            } else if !question.has_chart() {
                Phase::VisualizeFailed
            } else {
                Phase::UnknownError
            }
        }

        QuestionStatus::Cancel => {
            report_error(
                question
                    .error_message()
                    .unwrap_or(CANCEL_FALLBACK_MESSAGE)
                    .to_string(),
            );
            Phase::ExecuteFailed
        }

        // Best-effort guess from whatever artifacts are present.
        QuestionStatus::Unknown => {
            match (
                question.has_query_sql(),
                question.has_result(),
                question.error_message().is_some(),
            ) {
                (true, true, _) => Phase::Ready,
                (true, false, true) => Phase::ExecuteFailed,
                (true, false, false) => Phase::Executing,
                (false, _, true) => Phase::GenerateSqlFailed,
                (false, _, false) => Phase::GeneratingSql,
            }
        }
    }
}

/// A derived phase together with the domain failure message, if one was reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Derivation {
    pub phase: Phase,
    pub reported: Option<String>,
}

/// Collecting variant of [`derive_phase`].
pub fn derive_with_report(question: &Question) -> Derivation {
    let mut reported = None;
    let phase = derive_phase(question, &mut |message| reported = Some(message));
    Derivation { phase, reported }
}
