//! Focus tracking server.
//!
//! Run with: `GROQ_API_KEY=... cargo run -p focus-agent-server`
//!
//! Clients start a session over HTTP and listen on `/ws` for live focus
//! updates.

mod config;
mod watch;

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use focus_agent_core::{Analyzer, BroadcastHub};
use focus_agent_session::{AnalysisWorker, SessionStore, WorkerConfig};
use focus_agent_transport::{AppState, create_router};
use focus_agent_vision::{ChatClient, VisionAnalyzer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{Cli, Command, ServeArgs};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();

    let client = ChatClient::new(cli.provider.chat_config()?)?;
    let capture = cli.provider.capture();
    tracing::info!(
        model = client.model(),
        capture = capture.command_line(),
        "Analyzer configured"
    );
    let analyzer: Arc<dyn Analyzer> = Arc::new(VisionAnalyzer::new(capture, client));

    match cli.command {
        Some(Command::Watch(args)) => {
            watch::run(analyzer, &args).await;
            Ok(())
        }
        None => serve(cli.serve, analyzer).await,
    }
}

async fn serve(args: ServeArgs, analyzer: Arc<dyn Analyzer>) -> anyhow::Result<()> {
    let store = Arc::new(SessionStore::new());
    let hub = Arc::new(BroadcastHub::new());

    let worker = AnalysisWorker::new(
        Arc::clone(&store),
        Arc::clone(&hub),
        Arc::clone(&analyzer),
        WorkerConfig {
            interval: args.interval(),
        },
    )
    .spawn();

    let app = create_router(AppState::new(store, hub, analyzer), args.origins()?);

    let listener = tokio::net::TcpListener::bind(args.bind)
        .await
        .with_context(|| format!("failed to bind {}", args.bind))?;
    tracing::info!("Server listening on http://{}", args.bind);

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    // Stop ticking before the hub goes away.
    worker.shutdown().await?;
    served.context("server error")?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }

    tracing::info!("Shutdown signal received");
}
