//! # rp-server
//!
//! HTTP surface of the reel-panel control panel.
//!
//! The server exposes the pipeline state, run controls, incremental log and
//! event paging, a push channel, the generated media files and the
//! credential variables. All handlers share one
//! [`StateManager`](rp_core::state::manager::StateManager).

pub mod error;
pub mod routes;

pub use routes::{build_router, AppState};

use anyhow::{Context, Result};
use rp_core::config::models::AppConfig;
use rp_core::state::manager::StateManager;
use std::io::ErrorKind;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Run the control panel until Ctrl-C.
pub async fn serve(config: AppConfig) -> Result<()> {
    let manager = Arc::new(StateManager::from_config(&config));
    let state = AppState::new(Arc::clone(&manager), config.heartbeat());
    let shutdown = state.shutdown.clone();

    let listener = bind_with_retry(&config.host, config.port, config.port_retries)
        .await
        .with_context(|| format!("error binding {}:{}", config.host, config.port))?;
    let addr = listener.local_addr().context("error reading bound address")?;
    info!(
        root = %config.project_root.display(),
        output = %config.output_dir.display(),
        "control panel listening on http://{addr}"
    );

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown_signal(manager, shutdown))
        .await
        .context("error from http server")?;

    info!("control panel stopped");
    Ok(())
}

/// Bind `host:port`, moving to the next port while the address is in use.
///
/// At most `retries` further ports are tried.
pub async fn bind_with_retry(host: &str, port: u16, retries: u16) -> std::io::Result<TcpListener> {
    let mut attempt: u16 = 0;
    loop {
        let candidate = port.saturating_add(attempt);
        match TcpListener::bind((host, candidate)).await {
            Ok(listener) => return Ok(listener),
            Err(e) if e.kind() == ErrorKind::AddrInUse && attempt < retries => {
                warn!(port = candidate, "port in use, trying {}", candidate.saturating_add(1));
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Resolve on Ctrl-C after terminating the active step and ending streams.
async fn shutdown_signal(manager: Arc<StateManager>, shutdown: CancellationToken) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("failed to listen for Ctrl-C: {e}");
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
    manager.shutdown().await;
    shutdown.cancel();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_bind_with_retry_skips_used_port() {
        let taken = TcpListener::bind(("127.0.0.1", 0)).await.unwrap();
        let port = taken.local_addr().unwrap().port();

        let listener = bind_with_retry("127.0.0.1", port, 20).await.unwrap();
        let bound = listener.local_addr().unwrap().port();

        assert!(bound > port);
        assert!(bound <= port.saturating_add(20));
    }

    #[tokio::test]
    async fn test_bind_with_retry_gives_up() {
        let taken = TcpListener::bind(("127.0.0.1", 0)).await.unwrap();
        let port = taken.local_addr().unwrap().port();

        let err = bind_with_retry("127.0.0.1", port, 0).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AddrInUse);
    }
}
