use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use log::warn;
use question_analytics::AnalyticsSink;
use serde::{Deserialize, Serialize};

use crate::collaborators::{AuthProvider, Clock, QuestionApi, TokioClock};

/// Polls are never scheduled closer together than this.
pub const MIN_POLL_INTERVAL_MS: u64 = 1000;

const SETTINGS_FILE_PATH: &str = "question_lifecycle.toml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LifecycleSettings {
    pub poll_interval_ms: u64,
    /// Pause after a creation request before reading the new question's phase.
    pub settle_delay_ms: u64,
    /// Cause tag passed to the login flow when creating without a user.
    pub login_cause: String,
}

impl Default for LifecycleSettings {
    fn default() -> Self {
        Self {
            poll_interval_ms: 2000,
            settle_delay_ms: 500,
            login_cause: "new_question".to_string(),
        }
    }
}

impl LifecycleSettings {
    /// Defaults, overlaid with `question_lifecycle.toml` when present and then
    /// with environment variables.
    pub fn new() -> Self {
        Self::load_from(SETTINGS_FILE_PATH, |key| std::env::var(key).ok())
    }

    fn load_from(path: impl AsRef<Path>, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let path = path.as_ref();
        let mut settings = Self::default();

        if path.exists() {
            match Self::from_file(path) {
                Ok(file_settings) => settings = file_settings,
                Err(e) => warn!("Ignoring {}: {e:#}", path.display()),
            }
        }

        settings.apply_env(lookup);
        settings
    }

    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("failed to parse {}", path.display()))
    }

    fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(ms) = lookup("QUESTION_POLL_INTERVAL_MS").and_then(|v| v.trim().parse().ok()) {
            self.poll_interval_ms = ms;
        }
        if let Some(ms) = lookup("QUESTION_SETTLE_DELAY_MS").and_then(|v| v.trim().parse().ok()) {
            self.settle_delay_ms = ms;
        }
        if let Some(cause) = lookup("QUESTION_LOGIN_CAUSE").filter(|v| !v.trim().is_empty()) {
            self.login_cause = cause;
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(MIN_POLL_INTERVAL_MS))
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }
}

/// Collaborators and settings a [`QuestionController`](crate::QuestionController) is built from.
pub struct ControllerConfig {
    pub api: Arc<dyn QuestionApi>,
    pub auth: Arc<dyn AuthProvider>,
    pub analytics: Arc<dyn AnalyticsSink>,
    pub clock: Arc<dyn Clock>,
    pub settings: LifecycleSettings,
}

impl ControllerConfig {
    /// Settings come from [`LifecycleSettings::new`]; override them with
    /// [`with_settings`](Self::with_settings).
    pub fn new(
        api: Arc<dyn QuestionApi>,
        auth: Arc<dyn AuthProvider>,
        analytics: Arc<dyn AnalyticsSink>,
    ) -> Self {
        Self {
            api,
            auth,
            analytics,
            clock: Arc::new(TokioClock),
            settings: LifecycleSettings::new(),
        }
    }

    pub fn with_settings(mut self, settings: LifecycleSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }
}
