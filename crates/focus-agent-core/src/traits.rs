//! Core traits for analysis and delivery.

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::AnalysisResult;

/// Analyzer error.
#[derive(Debug, Clone, Error)]
pub enum AnalyzerError {
    /// The screen could not be captured.
    #[error("{0}")]
    Capture(String),
    /// The model call failed.
    #[error("Model request failed: {0}")]
    Model(String),
    #[error("Analysis failed: {0}")]
    Other(String),
}

impl AnalyzerError {
    #[must_use]
    pub const fn is_capture(&self) -> bool {
        matches!(self, Self::Capture(_))
    }
}

/// Turns a screen capture plus a task description into a focus verdict.
///
/// Implementations may block on I/O; callers run them off their own task.
#[async_trait]
pub trait Analyzer: Send + Sync {
    /// Analyze the current screen against `task_description`.
    async fn analyze(&self, task_description: &str) -> Result<AnalysisResult, AnalyzerError>;
}

/// Subscriber write error.
#[derive(Debug, Error)]
pub enum SubscriberError {
    #[error("Subscriber closed")]
    Closed,
    #[error("Send failed: {0}")]
    Send(String),
}

/// A live connection that accepts serialized broadcast messages.
#[async_trait]
pub trait Subscriber: Send + Sync {
    /// Write one message to the peer.
    async fn send(&self, message: &str) -> Result<(), SubscriberError>;
}

#[async_trait]
impl Subscriber for mpsc::UnboundedSender<String> {
    async fn send(&self, message: &str) -> Result<(), SubscriberError> {
        mpsc::UnboundedSender::send(self, message.to_string()).map_err(|_| SubscriberError::Closed)
    }
}

#[async_trait]
impl Subscriber for mpsc::Sender<String> {
    async fn send(&self, message: &str) -> Result<(), SubscriberError> {
        mpsc::Sender::send(self, message.to_string())
            .await
            .map_err(|_| SubscriberError::Closed)
    }
}
