//! Backend for the video moderation app.
//!
//! Clients upload videos straight to object storage through signed URLs, then
//! ask the backend to analyze them. Analysis runs a video moderation job,
//! transcribes the audio, scans the transcript against per-language bad-words
//! lists and scores it for toxicity and sentiment. The combined report is
//! polled by moderation job id.
//!
//! Storage for users, holograms and bad-words lists is either DocumentDB or an
//! in-memory store, chosen from the environment at startup.

pub mod api;
pub mod auth;
pub mod config;
pub mod database;
pub mod errors;
pub mod middleware;
pub mod services;
pub mod state;
pub mod utils;

#[cfg(test)]
pub(crate) mod test_support;

use std::{sync::Arc, time::Duration};

use anyhow::Context;
use tokio::{net::TcpListener, signal};
use tracing::{debug, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use config::Config;
use services::job_cache::JobCache;
use state::AppState;

const JOB_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

pub async fn start_server() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).init();

    info!("Loading configuration...");
    let config = Config::load()?;

    info!("Initializing state...");
    let state = AppState::new(config).await?;
    spawn_job_sweeper(state.analyzer.jobs().clone());

    let app = api::router(state.clone());

    let address = format!("0.0.0.0:{}", state.config.port);
    info!("Binding to {address}");
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind {address}"))?;
    info!("Server running on {address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down");
    Ok(())
}

fn spawn_job_sweeper(jobs: Arc<JobCache>) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(JOB_SWEEP_INTERVAL);
        loop {
            ticker.tick().await;
            let purged = jobs.purge_expired().await;
            if purged > 0 {
                debug!("Purged {purged} expired analysis jobs, {} remaining", jobs.len().await);
            }
        }
    });
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(err) => {
                warn!("Failed to install Ctrl+C handler: {err}");
                std::future::pending::<()>().await
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(err) => {
                warn!("Failed to install terminate handler: {err}");
                std::future::pending::<()>().await
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
