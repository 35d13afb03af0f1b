//! Control server lifecycle.

use std::net::SocketAddr;
use std::time::Duration;

use axum::middleware;
use clicktest_core::api::CliError;
use tokio::signal;
use tracing::{info, warn};

use super::{
    middleware::{create_middleware_stack, request_logger},
    routes::create_router,
    AppState,
};

#[derive(Debug, Clone)]
pub struct ListenConfig {
    pub host: String,
    pub port: u16,
    pub request_timeout: Duration,
    pub open_browser: bool,
}

/// Binds, serves until Ctrl+C, SIGTERM or `POST /api/shutdown`, then cancels
/// any run still in flight.
pub async fn start_server(listen: ListenConfig, state: AppState) -> Result<(), CliError> {
    let router = create_router(state.clone());
    let app = router
        .layer(middleware::from_fn(request_logger))
        .layer(create_middleware_stack(listen.request_timeout));

    let addr: SocketAddr = format!("{}:{}", listen.host, listen.port)
        .parse()
        .map_err(|e| CliError::Server(format!("invalid listen address: {e}")))?;

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| CliError::Server(format!("bind {addr}: {e}")))?;
    let local = listener.local_addr().unwrap_or(addr);
    let url = format!("http://{local}");
    info!("control server listening on {url}");
    eprintln!("clicktest server listening on {url}");

    if listen.open_browser {
        let url = url.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(500)).await;
            if let Err(e) = open_browser(&url).await {
                warn!("failed to open browser: {e}");
            }
        });
    }

    let mut shutdown_rx = state.shutdown_tx.subscribe();
    let cancel = state.cancel.clone();

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            tokio::select! {
                _ = signal::ctrl_c() => info!("received Ctrl+C"),
                _ = shutdown_rx.recv() => info!("received shutdown request"),
                _ = wait_for_sigterm() => info!("received SIGTERM"),
            }
            cancel.cancel();
            info!("starting graceful shutdown");
        })
        .await
        .map_err(|e| CliError::Server(e.to_string()))?;

    info!("server shutdown complete");
    Ok(())
}

async fn open_browser(url: &str) -> std::io::Result<()> {
    let mut cmd = if cfg!(target_os = "windows") {
        let mut c = tokio::process::Command::new("cmd");
        c.args(["/C", "start", "", url]);
        c
    } else if cfg!(target_os = "macos") {
        let mut c = tokio::process::Command::new("open");
        c.arg(url);
        c
    } else {
        let mut c = tokio::process::Command::new("xdg-open");
        c.arg(url);
        c
    };
    cmd.status().await.map(|_| ())
}

#[cfg(unix)]
async fn wait_for_sigterm() {
    use tokio::signal::unix::{signal, SignalKind};

    match signal(SignalKind::terminate()) {
        Ok(mut sigterm) => {
            sigterm.recv().await;
        }
        Err(e) => {
            warn!("failed to install SIGTERM handler: {e}");
            std::future::pending::<()>().await
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_sigterm() {
    std::future::pending::<()>().await
}
