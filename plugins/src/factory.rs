use std::sync::Arc;

use clicktest_core::api::{AppConfig, ClientError, DbClient};

use crate::clickhouse;

/// Connects to the configured server and returns the client behind the
/// engine-facing trait.
pub async fn build_client(cfg: &AppConfig) -> Result<Arc<dyn DbClient>, ClientError> {
    let client = clickhouse::connect(&cfg.clickhouse).await?;
    Ok(Arc::new(client))
}
