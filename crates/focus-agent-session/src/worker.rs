//! Periodic analysis worker.

use std::{sync::Arc, time::Duration};

use chrono::Utc;
use focus_agent_core::{Analyzer, AnalyzerError, BroadcastHub, StatusUpdate};
use tokio::task::JoinHandle;
use tokio_util::{sync::CancellationToken, task::AbortOnDropHandle};

use crate::SessionStore;

/// Default time between ticks.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(10);

/// Worker error.
#[derive(Debug, thiserror::Error)]
pub enum WorkerError {
    #[error("Analysis loop failed to join: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Worker settings.
#[derive(Debug, Clone, Copy)]
pub struct WorkerConfig {
    /// Sleep between ticks.
    pub interval: Duration,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_INTERVAL,
        }
    }
}

/// What a single tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// No session was active.
    Idle,
    /// The session had expired and was cleared.
    Expired,
    /// A result was stored and broadcast.
    Analyzed,
    /// Capture failed; an error update was broadcast.
    CaptureFailed,
    /// The analyzer failed for another reason; nothing was broadcast.
    Skipped,
    /// The session went away while the analyzer ran; the result was dropped.
    Dropped,
}

/// Background loop that re-evaluates the active session.
///
/// Sleeps, checks expiry, runs the analyzer on its own task, stores the
/// result and broadcasts it. No single tick can end the loop.
pub struct AnalysisWorker {
    store: Arc<SessionStore>,
    hub: Arc<BroadcastHub>,
    analyzer: Arc<dyn Analyzer>,
    config: WorkerConfig,
}

impl AnalysisWorker {
    /// Create a worker over shared services.
    #[must_use]
    pub fn new(
        store: Arc<SessionStore>,
        hub: Arc<BroadcastHub>,
        analyzer: Arc<dyn Analyzer>,
        config: WorkerConfig,
    ) -> Self {
        Self {
            store,
            hub,
            analyzer,
            config,
        }
    }

    /// Start the loop on the runtime.
    #[must_use]
    pub fn spawn(self) -> WorkerHandle {
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let handle = tokio::spawn(async move { self.run(token).await });
        WorkerHandle { handle, cancel }
    }

    async fn run(self, cancel: CancellationToken) {
        tracing::info!(interval = ?self.config.interval, "Analysis loop started");

        loop {
            tokio::select! {
                () = cancel.cancelled() => break,
                () = tokio::time::sleep(self.config.interval) => {}
            }

            tokio::select! {
                () = cancel.cancelled() => break,
                outcome = self.tick() => {
                    tracing::debug!(?outcome, "Tick finished");
                }
            }
        }

        tracing::info!("Analysis loop shutting down");
    }

    /// Run one iteration against the current session.
    pub async fn tick(&self) -> TickOutcome {
        if self.store.take_if_expired(Utc::now()).await {
            self.hub.broadcast(&StatusUpdate::ended()).await;
            return TickOutcome::Expired;
        }

        let Some(session) = self.store.get().await else {
            return TickOutcome::Idle;
        };

        let analyzer = Arc::clone(&self.analyzer);
        let task = session.task_description.clone();
        let analysis =
            AbortOnDropHandle::new(tokio::spawn(async move { analyzer.analyze(&task).await }));

        match analysis.await {
            Ok(Ok(result)) => {
                // Announce the session that now holds the result, which may
                // have replaced the one analyzed.
                let Some(updated) = self.store.update_result(&result.summary, result.state).await
                else {
                    tracing::debug!("Session ended during analysis, dropping result");
                    return TickOutcome::Dropped;
                };
                self.hub
                    .broadcast(&StatusUpdate::analysis(&updated, &result, Utc::now()))
                    .await;
                TickOutcome::Analyzed
            }
            Ok(Err(AnalyzerError::Capture(message))) => {
                tracing::warn!("Screen capture failed: {message}");
                self.hub
                    .broadcast(&StatusUpdate::capture_error(&session, message))
                    .await;
                TickOutcome::CaptureFailed
            }
            Ok(Err(e)) => {
                tracing::warn!("Skipping tick: {e}");
                TickOutcome::Skipped
            }
            Err(e) => {
                tracing::warn!("Analyzer task failed, skipping tick: {e}");
                TickOutcome::Skipped
            }
        }
    }
}

/// Handle to a running analysis loop.
pub struct WorkerHandle {
    handle: JoinHandle<()>,
    cancel: CancellationToken,
}

impl WorkerHandle {
    /// Signal cancellation and wait for the loop to exit.
    ///
    /// # Errors
    /// Returns error if the loop task panicked.
    pub async fn shutdown(self) -> Result<(), WorkerError> {
        self.cancel.cancel();
        self.handle.await?;
        Ok(())
    }

    /// Whether the loop has exited.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}
