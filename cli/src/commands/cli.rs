use clap::{Args as ClapArgs, Parser, Subcommand};
use clicktest_core::api::ReportFormat;

#[derive(Parser, Debug)]
#[command(
    name = "clicktest",
    version,
    about = "Smoke-test ClickHouse table structure and query performance"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Path to the TOML (or .json) config file.
    #[arg(long, short = 'c', default_value = "configs/default.toml", global = true)]
    pub config: String,

    /// Override the number of workers (0 = use config).
    #[arg(long, default_value_t = 0, global = true)]
    pub workers: usize,

    /// Override the HTML report path.
    #[arg(long, global = true)]
    pub output: Option<String>,

    /// Report format: html, json or both.
    #[arg(long, value_parser = parse_format, global = true)]
    pub format: Option<ReportFormat>,

    /// Draw progress bars on stderr.
    #[arg(long, global = true)]
    pub progress: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Run every structure check and query template once (default).
    Run,
    /// Hammer one query template until the configured duration elapses.
    Stress(StressArgs),
    /// Serve the task list and an on-demand run API.
    Serve(ServeArgs),
}

#[derive(ClapArgs, Debug, Clone, Default)]
pub struct StressArgs {
    /// Query template to use instead of `stress_test.query_name`.
    #[arg(long)]
    pub query: Option<String>,

    /// Override `stress_test.duration_minutes`.
    #[arg(long)]
    pub minutes: Option<u64>,
}

#[derive(ClapArgs, Debug, Clone, Default)]
pub struct ServeArgs {
    #[arg(long)]
    pub host: Option<String>,

    #[arg(long)]
    pub port: Option<u16>,

    /// Open the UI in the system browser once listening.
    #[arg(long)]
    pub open: bool,
}

fn parse_format(s: &str) -> Result<ReportFormat, String> {
    s.parse()
}
