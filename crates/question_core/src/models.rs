//! Question records as the backend reports them.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Raw status assigned by the backend while it answers a question.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum QuestionStatus {
    New,
    AnswerGenerating,
    #[serde(rename = "SQLValidating")]
    SqlValidating,
    Waiting,
    Running,
    Summarizing,
    Success,
    Error,
    Cancel,
    /// Any status value this client does not recognize.
    #[serde(other)]
    Unknown,
}

impl QuestionStatus {
    /// The wire name of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "New",
            Self::AnswerGenerating => "AnswerGenerating",
            Self::SqlValidating => "SQLValidating",
            Self::Waiting => "Waiting",
            Self::Running => "Running",
            Self::Summarizing => "Summarizing",
            Self::Success => "Success",
            Self::Error => "Error",
            Self::Cancel => "Cancel",
            Self::Unknown => "Unknown",
        }
    }
}

impl std::fmt::Display for QuestionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A natural-language question and whatever the backend has produced for it so far.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: String,
    #[serde(default)]
    pub title: String,
    pub status: QuestionStatus,
    /// Generated SQL, once the backend has produced it.
    #[serde(rename = "querySQL", default)]
    pub query_sql: Option<String>,
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub chart: Option<Value>,
    #[serde(default)]
    pub error: Option<String>,
    /// `Some(false)` when the backend decided the data cannot answer the question.
    #[serde(default)]
    pub sql_can_answer: Option<bool>,
    #[serde(default)]
    pub hit_cache: bool,
    #[serde(default)]
    pub recommended: bool,
    #[serde(default)]
    pub not_clear: Option<String>,
    #[serde(default)]
    pub assumption: Option<String>,
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn present(value: &Option<Value>) -> bool {
    !matches!(value, None | Some(Value::Null))
}

impl Question {
    /// Create a fresh record in the `New` status with nothing generated yet.
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            status: QuestionStatus::New,
            query_sql: None,
            result: None,
            chart: None,
            error: None,
            sql_can_answer: None,
            hit_cache: false,
            recommended: false,
            not_clear: None,
            assumption: None,
        }
    }

    pub fn has_query_sql(&self) -> bool {
        non_blank(&self.query_sql).is_some()
    }

    pub fn has_result(&self) -> bool {
        present(&self.result)
    }

    pub fn has_chart(&self) -> bool {
        present(&self.chart)
    }

    /// The backend's error message, if it supplied a non-blank one.
    pub fn error_message(&self) -> Option<&str> {
        non_blank(&self.error)
    }

    /// Whether the backend flagged the question as ambiguous.
    ///
    /// The field is free text; blank values and negative words do not count.
    pub fn is_not_clear(&self) -> bool {
        match non_blank(&self.not_clear) {
            Some(text) => !matches!(
                text.to_ascii_lowercase().as_str(),
                "false" | "no" | "none" | "null"
            ),
            None => false,
        }
    }

    pub fn has_assumption(&self) -> bool {
        non_blank(&self.assumption).is_some()
    }
}

/// Payload for creating a question.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NewQuestionInput {
    pub question: String,
    pub ignore_cache: bool,
}

/// Credential passed alongside a creation request.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessCredentials {
    pub access_token: String,
}

impl std::fmt::Debug for AccessCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessCredentials")
            .field("access_token", &"***")
            .finish()
    }
}

/// The signed-in user, as far as the lifecycle cares.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct AuthUser {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}
