//! In-memory store for the single active session.

use chrono::{DateTime, Duration, Utc};
use focus_agent_core::{FocusState, Session};
use tokio::sync::Mutex;

/// Holds at most one session.
///
/// Every operation runs inside the same critical section, so a start or
/// clear can never interleave with a tick's result write. Snapshots are
/// returned by value. Data is lost on restart.
#[derive(Default)]
pub struct SessionStore {
    session: Mutex<Option<Session>>,
}

impl SessionStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current session, if any.
    pub async fn get(&self) -> Option<Session> {
        self.session.lock().await.clone()
    }

    /// Replace any existing session with one ending `duration_minutes` from now.
    ///
    /// The range of `duration_minutes` is validated by the caller.
    pub async fn set(&self, task_description: &str, duration_minutes: u32) -> Session {
        let ends_at = Utc::now() + Duration::minutes(i64::from(duration_minutes));
        self.set_until(task_description, ends_at).await
    }

    /// Replace any existing session with one ending at `ends_at`.
    pub async fn set_until(&self, task_description: &str, ends_at: DateTime<Utc>) -> Session {
        let session = Session::new(task_description, ends_at);
        *self.session.lock().await = Some(session.clone());
        tracing::info!(task = %session.task_description, %ends_at, "Session started");
        session
    }

    /// Remove the current session. No-op when empty.
    pub async fn clear(&self) {
        if self.session.lock().await.take().is_some() {
            tracing::info!("Session cleared");
        }
    }

    /// Clear the session if it has expired at `now`.
    ///
    /// Returns true when a session was removed.
    pub async fn take_if_expired(&self, now: DateTime<Utc>) -> bool {
        let mut guard = self.session.lock().await;
        if guard.as_ref().is_some_and(|s| s.is_expired_at(now)) {
            *guard = None;
            tracing::info!("Session expired");
            true
        } else {
            false
        }
    }

    /// Record an analysis result on the active session.
    ///
    /// Returns `None` without creating anything when no session is active, so
    /// a late tick cannot bring back a cleared session.
    pub async fn update_result(&self, summary: &str, state: FocusState) -> Option<Session> {
        let mut guard = self.session.lock().await;
        let session = guard.as_mut()?;
        session.last_summary = Some(summary.to_string());
        session.last_state = Some(state);
        session.last_updated = Some(Utc::now());
        Some(session.clone())
    }
}
