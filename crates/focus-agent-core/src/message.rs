//! Status message pushed to live subscribers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{AnalysisResult, FocusState, Session};

/// Broadcast payload.
///
/// Optional fields are omitted from the JSON when absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusUpdate {
    pub state: FocusState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    pub session_active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StatusUpdate {
    /// No session is running any more.
    #[must_use]
    pub const fn ended() -> Self {
        Self {
            state: FocusState::OnTask,
            summary: None,
            task: None,
            timestamp: None,
            session_active: false,
            error: None,
        }
    }

    /// A session has just been started.
    #[must_use]
    pub fn started(session: &Session) -> Self {
        Self {
            state: session.state_or_default(),
            task: Some(session.task_description.clone()),
            session_active: true,
            ..Self::ended()
        }
    }

    /// The screen could not be captured this tick.
    #[must_use]
    pub fn capture_error(session: &Session, error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::started(session)
        }
    }

    /// Fresh analysis result for the active session.
    #[must_use]
    pub fn analysis(session: &Session, result: &AnalysisResult, timestamp: DateTime<Utc>) -> Self {
        Self {
            state: result.state,
            summary: Some(result.summary.clone()),
            task: Some(session.task_description.clone()),
            timestamp: Some(timestamp),
            session_active: true,
            error: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_ended_omits_optional_fields() {
        let value = serde_json::to_value(StatusUpdate::ended()).unwrap();
        assert_eq!(value, json!({"state": "on_task", "session_active": false}));
    }

    #[test]
    fn test_capture_error_keeps_last_state() {
        let mut session = Session::new("write report", Utc::now());
        session.last_state = Some(FocusState::OffTask);

        let value =
            serde_json::to_value(StatusUpdate::capture_error(&session, "no display")).unwrap();
        assert_eq!(
            value,
            json!({
                "state": "off_task",
                "task": "write report",
                "session_active": true,
                "error": "no display",
            })
        );
    }

    #[test]
    fn test_analysis_message_fields() {
        let session = Session::new("write report", Utc::now());
        let result = AnalysisResult::new("Editing a document.", FocusState::OnTask);
        let update = StatusUpdate::analysis(&session, &result, Utc::now());

        let value = serde_json::to_value(&update).unwrap();
        assert_eq!(value["state"], "on_task");
        assert_eq!(value["summary"], "Editing a document.");
        assert_eq!(value["task"], "write report");
        assert_eq!(value["session_active"], true);
        assert!(value["timestamp"].is_string());
        assert!(value.get("error").is_none());
    }
}
