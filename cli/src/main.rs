use clap::Parser;
use clicktest_cli::commands::{self, batch, cli, serve, stress};
use clicktest_core::api::{build_tasks, AppConfig, CliError, DbClient, LoggingConfig};
use clicktest_plugins::factory;
use std::sync::Arc;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

static LOG_GUARD: std::sync::OnceLock<tracing_appender::non_blocking::WorkerGuard> =
    std::sync::OnceLock::new();

#[tokio::main]
async fn main() {
    let exit = match real_main().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{e}");
            e.exit_code()
        }
    };

    std::process::exit(exit);
}

async fn real_main() -> Result<i32, CliError> {
    let mut args = cli::Args::parse();
    let mut cfg = clicktest_core::api::load(&args.config)?;
    commands::apply_overrides(&mut cfg, &args);
    init_tracing(&cfg.logging).map_err(CliError::Command)?;

    let show_progress = args.progress && atty::is(atty::Stream::Stderr);
    let cmd = args.command.take().unwrap_or(cli::Commands::Run);

    match cmd {
        cli::Commands::Run => {
            let tasks = build_tasks(&cfg)?;
            let client = connect(&cfg).await?;
            let exit = batch::run_batch(&cfg, tasks, client.clone(), show_progress).await;
            close(client).await;
            exit
        }
        cli::Commands::Stress(stress_args) => {
            let plan = stress::StressPlan::from_config(&cfg, &stress_args)?;
            let client = connect(&cfg).await?;
            let exit = stress::run_stress_command(plan, client.clone(), show_progress).await;
            close(client).await;
            exit
        }
        cli::Commands::Serve(serve_args) => {
            let tasks = build_tasks(&cfg)?;
            let client = connect(&cfg).await?;
            let exit = serve::handle_serve(cfg, tasks, serve_args, client.clone()).await;
            close(client).await;
            exit
        }
    }
}

async fn connect(cfg: &AppConfig) -> Result<Arc<dyn DbClient>, CliError> {
    tracing::info!(
        host = %cfg.clickhouse.host,
        port = cfg.clickhouse.port,
        database = %cfg.clickhouse.database,
        "connecting"
    );
    factory::build_client(cfg)
        .await
        .map_err(CliError::Connection)
}

async fn close(client: Arc<dyn DbClient>) {
    if let Err(e) = client.close().await {
        tracing::warn!("close client: {e}");
    }
}

fn init_tracing(logging: &LoggingConfig) -> Result<(), String> {
    if !logging.enabled {
        return Ok(());
    }

    let filter = match std::env::var("RUST_LOG") {
        Ok(v) if !v.trim().is_empty() => EnvFilter::from_default_env(),
        _ => EnvFilter::try_new(logging.level.clone()).map_err(|e| e.to_string())?,
    };

    let mut maybe_writer = None;

    if logging.file {
        let dir = match logging
            .directory
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
        {
            Some(d) => std::path::PathBuf::from(d),
            None => dirs::home_dir()
                .map(|h| h.join(".clicktest").join("logs"))
                .unwrap_or_else(|| std::env::temp_dir().join("clicktest")),
        };

        std::fs::create_dir_all(&dir).map_err(|e| format!("create log dir failed: {e}"))?;
        let file_name = format!(
            "clicktest.{}.{}.log",
            chrono::Local::now().format("%Y%m%d-%H%M%S"),
            std::process::id()
        );
        let appender = tracing_appender::rolling::never(dir, file_name);
        let (non_blocking, guard) = tracing_appender::non_blocking(appender);
        let _ = LOG_GUARD.set(guard);
        maybe_writer = Some(non_blocking);
    }

    if !logging.console && maybe_writer.is_none() {
        return Err("logging disabled for both console and file".to_string());
    }

    let console_layer = logging.console.then(|| {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(atty::is(atty::Stream::Stderr))
    });

    let file_layer = maybe_writer.map(|w| {
        tracing_subscriber::fmt::layer()
            .with_writer(w)
            .with_ansi(false)
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .init();

    Ok(())
}
