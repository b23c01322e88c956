//! Request and response bodies for the HTTP API.

use chrono::{DateTime, Utc};
use focus_agent_core::{AnalysisResult, FocusState, Session};
use serde::{Deserialize, Serialize};

/// Shortest session a client may start, in minutes.
pub const MIN_DURATION_MINUTES: i64 = 1;
/// Longest session a client may start, in minutes.
pub const MAX_DURATION_MINUTES: i64 = 480;

/// `{status: ...}` acknowledgement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: String,
}

impl StatusResponse {
    #[must_use]
    pub fn new(status: impl Into<String>) -> Self {
        Self {
            status: status.into(),
        }
    }
}

/// One-shot analysis request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalyzeRequest {
    #[serde(default)]
    pub task_description: String,
}

/// One-shot analysis result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyzeResponse {
    pub summary: String,
    pub state: FocusState,
}

impl From<AnalysisResult> for AnalyzeResponse {
    fn from(result: AnalysisResult) -> Self {
        Self {
            summary: result.summary,
            state: result.state,
        }
    }
}

/// Start-session request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionStartRequest {
    pub task_description: String,
    pub duration_minutes: i64,
}

/// Snapshot of the active session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionInfo {
    pub task_description: String,
    pub ends_at: DateTime<Utc>,
    pub seconds_remaining: i64,
    pub last_summary: Option<String>,
    pub last_state: Option<FocusState>,
    pub session_active: bool,
}

impl SessionInfo {
    /// Describe `session` as of `now`.
    #[must_use]
    pub fn at(session: &Session, now: DateTime<Utc>) -> Self {
        Self {
            task_description: session.task_description.clone(),
            ends_at: session.ends_at,
            seconds_remaining: session.seconds_remaining_at(now),
            last_summary: session.last_summary.clone(),
            last_state: session.last_state,
            session_active: true,
        }
    }
}
