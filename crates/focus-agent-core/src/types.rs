//! Domain types shared across the workspace.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Binary focus classification.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FocusState {
    /// Screen activity matches the declared task.
    #[default]
    OnTask,
    /// Screen activity looks unrelated or distracted.
    OffTask,
}

impl FocusState {
    /// Wire name of the state.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OnTask => "on_task",
            Self::OffTask => "off_task",
        }
    }
}

impl fmt::Display for FocusState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of one analyzer run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Short description of what the screen shows.
    pub summary: String,
    /// Focus classification.
    pub state: FocusState,
}

impl AnalysisResult {
    #[must_use]
    pub fn new(summary: impl Into<String>, state: FocusState) -> Self {
        Self {
            summary: summary.into(),
            state,
        }
    }
}

/// The single active focus-tracking session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Trimmed task the user declared.
    pub task_description: String,
    /// Absolute deadline.
    pub ends_at: DateTime<Utc>,
    pub last_summary: Option<String>,
    pub last_state: Option<FocusState>,
    pub last_updated: Option<DateTime<Utc>>,
}

impl Session {
    /// Create a session with no analysis results yet.
    ///
    /// The task description is trimmed.
    #[must_use]
    pub fn new(task_description: &str, ends_at: DateTime<Utc>) -> Self {
        Self {
            task_description: task_description.trim().to_string(),
            ends_at,
            last_summary: None,
            last_state: None,
            last_updated: None,
        }
    }

    /// Whole seconds left before `ends_at`, never negative.
    #[must_use]
    pub fn seconds_remaining_at(&self, now: DateTime<Utc>) -> i64 {
        (self.ends_at - now).num_seconds().max(0)
    }

    /// Whole seconds left from the current instant.
    #[must_use]
    pub fn seconds_remaining(&self) -> i64 {
        self.seconds_remaining_at(Utc::now())
    }

    /// Whether the session has reached its deadline at `now`.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.ends_at
    }

    /// Whether the session has reached its deadline.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// Last known state, `on_task` when nothing has been analyzed yet.
    #[must_use]
    pub fn state_or_default(&self) -> FocusState {
        self.last_state.unwrap_or_default()
    }
}
