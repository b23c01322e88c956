//! `Analyzer` backed by a screen capture and a vision model.

use async_trait::async_trait;
use focus_agent_core::{AnalysisResult, Analyzer, AnalyzerError};

use crate::{
    CaptureCommand, CaptureError, ChatClient, ClientError, encode, prompt,
    response::{self, ResponseError},
};

const CAPTURE_HINT: &str =
    "Unable to capture the screen. Ensure a display is accessible to the backend process.";

impl From<CaptureError> for AnalyzerError {
    fn from(e: CaptureError) -> Self {
        Self::Capture(format!("{CAPTURE_HINT} ({e})"))
    }
}

impl From<ClientError> for AnalyzerError {
    fn from(e: ClientError) -> Self {
        Self::Model(e.to_string())
    }
}

impl From<ResponseError> for AnalyzerError {
    fn from(e: ResponseError) -> Self {
        Self::Model(e.to_string())
    }
}

/// Captures the screen, asks the model whether it matches the task, and
/// classifies the reply.
#[derive(Debug, Clone)]
pub struct VisionAnalyzer {
    capture: CaptureCommand,
    client: ChatClient,
}

impl VisionAnalyzer {
    #[must_use]
    pub const fn new(capture: CaptureCommand, client: ChatClient) -> Self {
        Self { capture, client }
    }
}

#[async_trait]
impl Analyzer for VisionAnalyzer {
    async fn analyze(&self, task_description: &str) -> Result<AnalysisResult, AnalyzerError> {
        let raw = self.capture.capture().await?;

        let image_url = tokio::task::spawn_blocking(move || encode::to_jpeg_data_url(&raw))
            .await
            .map_err(|e| AnalyzerError::Other(format!("encode worker join failed: {e}")))?
            .map_err(|e| AnalyzerError::Other(e.to_string()))?;

        let content = self
            .client
            .complete(&prompt::build_prompt(task_description), &image_url)
            .await?;

        let result = response::parse_analysis(&content)?;
        tracing::debug!(state = %result.state, model = self.client.model(), "Screen analyzed");
        Ok(result)
    }
}
