use std::sync::Arc;
use std::time::Duration;

use clicktest_core::api::{AppConfig, CliError, DbClient, Task};
use tokio::sync::broadcast;

use super::cli::ServeArgs;
use crate::http::{start_server, AppState, ListenConfig};

/// Command-line values win over the `[server]` section.
pub fn listen_config(cfg: &AppConfig, args: &ServeArgs) -> ListenConfig {
    let host = args
        .host
        .clone()
        .filter(|h| !h.trim().is_empty())
        .unwrap_or_else(|| cfg.server.host.clone());
    let port = args.port.unwrap_or(cfg.server.port);

    ListenConfig {
        host,
        port,
        request_timeout: Duration::from_secs(cfg.server.request_timeout_sec.max(1)),
        open_browser: args.open,
    }
}

pub async fn handle_serve(
    cfg: AppConfig,
    tasks: Vec<Task>,
    args: ServeArgs,
    client: Arc<dyn DbClient>,
) -> Result<i32, CliError> {
    let listen = listen_config(&cfg, &args);
    tracing::info!(
        host = %listen.host,
        port = listen.port,
        tasks = tasks.len(),
        "starting control server"
    );

    let (shutdown_tx, _) = broadcast::channel(1);
    let state = AppState::new(cfg, tasks, client, shutdown_tx);
    start_server(listen, state).await?;
    Ok(0)
}
