#[allow(clippy::module_inception)]
pub mod error;
pub mod client;
pub mod config;

pub use client::ClientError;
pub use config::ConfigError;
pub use error::CliError;
