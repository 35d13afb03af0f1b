pub mod batch;
pub mod cli;
pub mod serve;
pub mod stress;

use clicktest_core::api::AppConfig;

use cli::Args;

/// Folds command-line overrides into the loaded config.
pub fn apply_overrides(cfg: &mut AppConfig, args: &Args) {
    if args.workers > 0 {
        cfg.execution.workers = args.workers;
    }
    if let Some(output) = args.output.as_deref().filter(|s| !s.trim().is_empty()) {
        cfg.report.output_path = output.to_string();
    }
    if let Some(format) = args.format {
        cfg.report.format = format;
    }
}
