//! Command-line and environment configuration.

use std::{net::SocketAddr, time::Duration};

use anyhow::{Context, bail};
use axum::http::HeaderValue;
use clap::{Args, Parser, Subcommand};
use focus_agent_vision::{
    CaptureCommand, ChatConfig,
    client::{DEFAULT_BASE_URL, DEFAULT_MODEL},
};

/// Focus tracking server.
#[derive(Debug, Parser)]
#[command(name = "focus-agent-server", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    #[command(flatten)]
    pub provider: ProviderArgs,

    #[command(flatten)]
    pub serve: ServeArgs,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print a screen analysis on a fixed interval, without the server.
    Watch(WatchArgs),
}

/// Model provider and capture settings.
#[derive(Debug, Args)]
pub struct ProviderArgs {
    /// Model provider credential.
    #[arg(long, env = "GROQ_API_KEY", hide_env_values = true, global = true)]
    pub api_key: Option<String>,

    /// OpenAI-compatible API base URL.
    #[arg(long, env = "FOCUS_AGENT_BASE_URL", default_value = DEFAULT_BASE_URL, global = true)]
    pub base_url: String,

    /// Vision model name.
    #[arg(long, env = "FOCUS_AGENT_MODEL", default_value = DEFAULT_MODEL, global = true)]
    pub model: String,

    /// Model request timeout in seconds.
    #[arg(
        long,
        env = "FOCUS_AGENT_REQUEST_TIMEOUT_SECS",
        default_value_t = 60,
        value_parser = clap::value_parser!(u64).range(1..),
        global = true
    )]
    pub request_timeout_secs: u64,

    /// Command that prints a full-screen PNG/JPEG to stdout.
    #[arg(long, env = "FOCUS_AGENT_CAPTURE_COMMAND", global = true)]
    pub capture_command: Option<String>,
}

impl ProviderArgs {
    /// Resolve the chat client settings.
    ///
    /// # Errors
    /// Returns error if the credential is missing or blank.
    pub fn chat_config(&self) -> anyhow::Result<ChatConfig> {
        let Some(api_key) = self.api_key.as_deref().map(str::trim).filter(|k| !k.is_empty())
        else {
            bail!("GROQ_API_KEY is not set. Export it or pass --api-key.");
        };

        Ok(ChatConfig {
            api_key: api_key.to_string(),
            base_url: self.base_url.clone(),
            model: self.model.clone(),
            timeout: Duration::from_secs(self.request_timeout_secs),
        })
    }

    #[must_use]
    pub fn capture(&self) -> CaptureCommand {
        self.capture_command
            .as_ref()
            .map_or_else(CaptureCommand::platform_default, CaptureCommand::new)
    }
}

/// HTTP server settings.
#[derive(Debug, Args)]
pub struct ServeArgs {
    /// Address to listen on.
    #[arg(long, env = "FOCUS_AGENT_BIND", default_value = "127.0.0.1:8000")]
    pub bind: SocketAddr,

    /// Seconds between analysis ticks.
    #[arg(
        long,
        env = "FOCUS_AGENT_INTERVAL_SECS",
        default_value_t = 10,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub interval_secs: u64,

    /// Origins allowed by CORS.
    #[arg(
        long = "allowed-origin",
        env = "FOCUS_AGENT_ALLOWED_ORIGINS",
        value_delimiter = ',',
        default_value = "http://localhost:5173,http://127.0.0.1:5173"
    )]
    pub allowed_origins: Vec<String>,
}

impl ServeArgs {
    #[must_use]
    pub const fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    /// Parse the CORS origins.
    ///
    /// # Errors
    /// Returns error if an origin is `*` or not a valid header value.
    pub fn origins(&self) -> anyhow::Result<Vec<HeaderValue>> {
        self.allowed_origins
            .iter()
            .map(|o| o.trim())
            .filter(|o| !o.is_empty())
            .map(|o| {
                if o == "*" {
                    bail!(
                        "wildcard origin is not allowed with credentialed CORS; \
                         list origins explicitly"
                    );
                }
                HeaderValue::from_str(o).with_context(|| format!("invalid origin: {o}"))
            })
            .collect()
    }
}

/// Standalone monitor settings.
#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Task to compare the screen against.
    #[arg(long, default_value = "Describe the user's activity.")]
    pub task: String,

    /// Seconds to wait between analyses.
    #[arg(long, default_value_t = 10, value_parser = clap::value_parser!(u64).range(1..))]
    pub interval_secs: u64,
}
