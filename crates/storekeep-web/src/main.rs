mod api;
mod app;
mod auth;
mod config;
mod dto;
mod error;
mod middleware;
mod state;
#[cfg(test)]
mod test_support;

use std::future::{Future, IntoFuture};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use storekeep_core::SystemClock;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{LogConfig, LogFormat, ServerConfig};
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServerConfig::from_env()?;
    init_tracing(&config.log);
    let config = config.validate()?;

    let bind_addr = config.bind_addr;
    let shutdown_timeout = config.shutdown_timeout();
    let rate_limit = config.rate_limit.clone();
    tracing::info!(
        rps = rate_limit.requests_per_second,
        burst = rate_limit.limiter_config().burst(),
        "Rate limiting per client address"
    );

    let state = AppState::new(config, Arc::new(SystemClock));

    // Idle limiter entry sweep
    let limiter = state.limiter.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(rate_limit.sweep_interval());
        loop {
            interval.tick().await;
            let evicted = limiter.evict_idle(rate_limit.idle_ttl());
            if evicted > 0 {
                tracing::debug!(evicted, remaining = limiter.len(), "Evicted idle rate limiter entries");
            }
        }
    });

    let app = app::build_app(state);

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    tracing::info!("storekeep-web listening on http://{}", bind_addr);

    let (stopping_tx, stopping_rx) = tokio::sync::oneshot::channel::<()>();
    let server = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async move {
        shutdown_signal().await;
        let _ = stopping_tx.send(());
    })
    .into_future();

    let stopping = async move {
        let _ = stopping_rx.await;
    };
    serve_until_drained(server, stopping, shutdown_timeout).await?;

    tracing::info!("Server exited");
    Ok(())
}

/// Drives `server` to completion, but once `stopping` resolves gives
/// in-flight requests at most `grace` to finish.
async fn serve_until_drained<S, T>(server: S, stopping: T, grace: Duration) -> anyhow::Result<()>
where
    S: Future<Output = std::io::Result<()>>,
    T: Future<Output = ()>,
{
    tokio::pin!(server);
    tokio::select! {
        result = &mut server => return Ok(result?),
        _ = stopping => {}
    }

    match tokio::time::timeout(grace, server).await {
        Ok(result) => Ok(result?),
        Err(_) => {
            tracing::warn!(?grace, "Graceful shutdown timed out, dropping open connections");
            Ok(())
        }
    }
}

fn init_tracing(log: &LogConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!(
            "storekeep_web={level},storekeep_core={level},tower_http={level}",
            level = log.level
        )
        .into()
    });

    let registry = tracing_subscriber::registry().with(filter);
    match log.format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {e}");
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
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutting down server...");
}
