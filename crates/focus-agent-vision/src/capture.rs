//! Screen capture through an external command.

use std::{path::PathBuf, process::Stdio};

use thiserror::Error;
use tokio::process::Command;

/// Capture command error.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("Capture command cannot be parsed: {0}")]
    InvalidCommand(String),
    #[error("Capture command is empty after parsing")]
    EmptyCommand,
    #[error("Executable not found: {0}")]
    NotFound(String),
    #[error("Failed to run capture command: {0}")]
    Spawn(#[from] std::io::Error),
    #[error("Capture command exited with {status}: {stderr}")]
    Failed { status: String, stderr: String },
    #[error("Capture command produced no image data")]
    EmptyOutput,
}

/// Parsed command parts (program + args).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandParts {
    pub program: String,
    pub args: Vec<String>,
}

/// Shell-style command line that writes a screenshot to stdout.
#[derive(Debug, Clone)]
pub struct CaptureCommand {
    base: String,
}

impl Default for CaptureCommand {
    fn default() -> Self {
        Self::platform_default()
    }
}

impl CaptureCommand {
    /// Use a custom command line.
    #[must_use]
    pub fn new<S: Into<String>>(base: S) -> Self {
        Self { base: base.into() }
    }

    /// Full-screen capture tool for the current platform.
    #[must_use]
    pub fn platform_default() -> Self {
        if cfg!(target_os = "macos") {
            Self::new("screencapture -x -t png /dev/stdout")
        } else {
            Self::new("import -window root png:-")
        }
    }

    /// The configured command line.
    #[must_use]
    pub fn command_line(&self) -> &str {
        &self.base
    }

    /// Split the command line into program and arguments.
    ///
    /// # Errors
    /// Returns error if the line cannot be parsed or is empty.
    pub fn parts(&self) -> Result<CommandParts, CaptureError> {
        let mut parts = shlex::split(&self.base)
            .ok_or_else(|| CaptureError::InvalidCommand(self.base.clone()))?;
        if parts.is_empty() {
            return Err(CaptureError::EmptyCommand);
        }
        let program = parts.remove(0);
        Ok(CommandParts {
            program,
            args: parts,
        })
    }

    /// Run the command and return the raw image bytes it printed.
    ///
    /// # Errors
    /// Returns error if the program is missing, fails, or prints nothing.
    pub async fn capture(&self) -> Result<Vec<u8>, CaptureError> {
        let CommandParts { program, args } = self.parts()?;
        let executable = resolve_executable(&program)
            .await
            .ok_or(CaptureError::NotFound(program))?;

        let output = Command::new(&executable)
            .args(&args)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await?;

        if !output.status.success() {
            return Err(CaptureError::Failed {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        if output.stdout.is_empty() {
            return Err(CaptureError::EmptyOutput);
        }

        tracing::debug!(bytes = output.stdout.len(), "Screen captured");
        Ok(output.stdout)
    }
}

async fn resolve_executable(program: &str) -> Option<PathBuf> {
    let program = program.to_string();
    tokio::task::spawn_blocking(move || which::which(program))
        .await
        .ok()
        .and_then(Result::ok)
}
