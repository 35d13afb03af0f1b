use std::time::Duration;

use async_trait::async_trait;
use clicktest_core::api::{ClickHouseConfig, ClientError, DbClient, PartitionInfo, QueryOutcome, QueryStats};
use serde::Deserialize;
use serde_json::Value;

use super::error::{from_reqwest, status_error};
use super::summary::{value_to_u64, Summary};
use super::tls;

const HEADER_USER: &str = "X-ClickHouse-User";
const HEADER_KEY: &str = "X-ClickHouse-Key";
const HEADER_SUMMARY: &str = "X-ClickHouse-Summary";
const HEADER_QUERY_ID: &str = "X-ClickHouse-Query-Id";

const FORMAT_JSON_COMPACT: &str = "JSONCompact";
const FORMAT_TSV_RAW: &str = "TabSeparatedRaw";

const QUERY_LOG_RETRY_DELAYS_MS: [u64; 3] = [0, 50, 150];

/// Subset of a `JSONCompact` response body.
#[derive(Debug, Deserialize)]
struct CompactBody {
    #[serde(default)]
    data: Vec<Vec<Value>>,
    #[serde(default)]
    rows: u64,
}

/// Successful HTTP response: headers and the full body.
struct Reply {
    headers: reqwest::header::HeaderMap,
    body: String,
}

/// `DbClient` over the ClickHouse HTTP interface.
#[derive(Clone)]
pub struct ClickHouseHttpClient {
    http: reqwest::Client,
    base_url: String,
    url_ping: String,
    database: String,
    table_name: String,
    user: String,
    password: String,
    query_log_stats: bool,
}

impl ClickHouseHttpClient {
    pub fn new(cfg: &ClickHouseConfig) -> Result<Self, ClientError> {
        let scheme = if cfg.use_tls() { "https" } else { "http" };
        let base_url = format!("{}://{}:{}", scheme, cfg.host, cfg.port);
        Self::with_base_url(cfg, base_url)
    }

    /// Same as [`ClickHouseHttpClient::new`] but talks to `base_url`
    /// instead of the host and port in `cfg`.
    pub fn with_base_url(cfg: &ClickHouseConfig, base_url: impl Into<String>) -> Result<Self, ClientError> {
        let builder = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(cfg.connect_timeout_sec.max(1)));
        let http = tls::configure(builder, cfg)?
            .build()
            .map_err(|e| ClientError::Transport(format!("build http client: {e}")))?;

        let base_url = base_url.into();
        let normalized = base_url.trim_end_matches('/').to_string();
        Ok(Self {
            http,
            url_ping: format!("{normalized}/ping"),
            base_url: format!("{normalized}/"),
            database: cfg.database.clone(),
            table_name: cfg.table_name.clone(),
            user: cfg.user.clone(),
            password: cfg.password.clone(),
            query_log_stats: cfg.query_log_stats,
        })
    }

    async fn post(&self, sql: &str, format: &str, query_id: &str) -> Result<Reply, ClientError> {
        let url = &self.base_url;
        tracing::trace!(
            target: "clicktest.http",
            url = %url,
            query_id = %query_id,
            format = %format,
            sql_len = sql.len()
        );

        let mut req = self
            .http
            .post(url)
            .query(&[
                ("database", self.database.as_str()),
                ("query_id", query_id),
                ("default_format", format),
            ])
            .header(HEADER_USER, &self.user)
            .body(sql.to_string());
        if !self.password.is_empty() {
            req = req.header(HEADER_KEY, &self.password);
        }

        let resp = req.send().await.map_err(|err| from_reqwest(err, url))?;
        let status = resp.status();
        let headers = resp.headers().clone();
        let body = resp.text().await.map_err(|err| from_reqwest(err, url))?;

        if !status.is_success() {
            tracing::debug!(target: "clicktest.http", status = %status, query_id = %query_id, "query rejected");
            return Err(status_error(status.as_u16(), &headers, &body));
        }
        Ok(Reply { headers, body })
    }

    async fn select_compact(&self, sql: &str) -> Result<CompactBody, ClientError> {
        let reply = self.post(sql, FORMAT_JSON_COMPACT, &new_query_id()).await?;
        parse_compact(&reply.body)
    }

    /// Looks up the finished query in `system.query_log` and the touched
    /// partitions in `system.parts`. Best effort: failures are logged.
    async fn query_log_stats(&self, query_id: &str, outcome: &mut QueryOutcome) {
        if let Err(e) = self.post("SYSTEM FLUSH LOGS", FORMAT_TSV_RAW, &new_query_id()).await {
            tracing::warn!(query_id = %query_id, error = %e, "SYSTEM FLUSH LOGS failed");
        }

        let sql = format!(
            "SELECT read_rows, read_bytes, memory_usage, partitions FROM system.query_log \
             WHERE query_id = '{}' AND type = 'QueryFinish' LIMIT 1",
            escape_literal(query_id)
        );

        let mut row = None;
        for delay in QUERY_LOG_RETRY_DELAYS_MS {
            if delay > 0 {
                tokio::time::sleep(Duration::from_millis(delay)).await;
            }
            match self.select_compact(&sql).await {
                Ok(body) => {
                    if let Some(first) = body.data.into_iter().next() {
                        row = Some(first);
                        break;
                    }
                }
                Err(e) => {
                    tracing::warn!(query_id = %query_id, error = %e, "system.query_log lookup failed");
                }
            }
        }

        let Some(row) = row else {
            tracing::warn!(
                query_id = %query_id,
                "query not found in system.query_log; check log_queries=1 and access to system tables"
            );
            return;
        };

        if let Some(v) = row.first().and_then(value_to_u64).filter(|v| *v > 0) {
            outcome.read_rows = v;
        }
        if let Some(v) = row.get(1).and_then(value_to_u64).filter(|v| *v > 0) {
            outcome.read_bytes = v;
        }
        if let Some(v) = row.get(2).and_then(value_to_u64) {
            outcome.stats.memory_usage = Some(v);
        }
        let partitions: Vec<String> = row
            .get(3)
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(|v| v.as_str().map(str::to_string)).collect())
            .unwrap_or_default();

        if !partitions.is_empty() {
            match self.partition_details(&partitions).await {
                Ok(details) => outcome.stats.partition_details = details,
                Err(e) => tracing::warn!(query_id = %query_id, error = %e, "system.parts lookup failed"),
            }
        }
        outcome.stats.partitions = partitions;
    }

    async fn partition_details(&self, partitions: &[String]) -> Result<Vec<PartitionInfo>, ClientError> {
        // query_log reports `db.table.partition_id`; system.parts wants the bare id.
        let ids: Vec<String> = partitions
            .iter()
            .map(|p| format!("'{}'", escape_literal(p.rsplit('.').next().unwrap_or(p.as_str()))))
            .collect();
        let sql = format!(
            "SELECT partition_id, sum(rows), sum(bytes_on_disk) FROM system.parts \
             WHERE database = '{}' AND table = '{}' AND active AND partition_id IN ({}) \
             GROUP BY partition_id ORDER BY partition_id",
            escape_literal(&self.database),
            escape_literal(&self.table_name),
            ids.join(", ")
        );
        let body = self.select_compact(&sql).await?;
        Ok(body
            .data
            .into_iter()
            .map(|row| PartitionInfo {
                partition: row
                    .first()
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
                rows: row.get(1).and_then(value_to_u64).unwrap_or(0),
                bytes: row.get(2).and_then(value_to_u64).unwrap_or(0),
            })
            .collect())
    }
}

#[async_trait]
impl DbClient for ClickHouseHttpClient {
    async fn ping(&self) -> Result<(), ClientError> {
        let url = &self.url_ping;
        let resp = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|err| from_reqwest(err, url))?;
        let status = resp.status();
        if status.is_success() {
            return Ok(());
        }
        let headers = resp.headers().clone();
        let body = resp.text().await.unwrap_or_default();
        Err(status_error(status.as_u16(), &headers, &body))
    }

    async fn query(&self, sql: &str) -> Result<QueryOutcome, ClientError> {
        let query_id = new_query_id();
        let reply = self.post(sql, FORMAT_JSON_COMPACT, &query_id).await?;

        let summary = reply
            .headers
            .get(HEADER_SUMMARY)
            .and_then(|v| v.to_str().ok())
            .and_then(Summary::parse)
            .unwrap_or_default();
        let server_query_id = reply
            .headers
            .get(HEADER_QUERY_ID)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .unwrap_or(query_id);

        let rows = if reply.body.trim().is_empty() {
            0
        } else {
            parse_compact(&reply.body)?.rows
        };

        let mut outcome = QueryOutcome {
            rows,
            read_rows: summary.read_rows,
            read_bytes: summary.read_bytes,
            stats: QueryStats {
                query_id: Some(server_query_id.clone()),
                memory_usage: summary.memory_usage,
                ..Default::default()
            },
        };

        if self.query_log_stats {
            self.query_log_stats(&server_query_id, &mut outcome).await;
        }

        tracing::debug!(
            target: "clicktest.http",
            query_id = %server_query_id,
            rows = outcome.rows,
            read_rows = outcome.read_rows,
            read_bytes = outcome.read_bytes,
            "query ok"
        );
        Ok(outcome)
    }

    async fn explain(&self, sql: &str) -> Result<String, ClientError> {
        let explain = format!("EXPLAIN indexes = 1 {sql}");
        let reply = self.post(&explain, FORMAT_TSV_RAW, &new_query_id()).await?;
        Ok(reply.body)
    }
}

/// Builds the client and checks the server answers `/ping`.
pub async fn connect(cfg: &ClickHouseConfig) -> Result<ClickHouseHttpClient, ClientError> {
    let client = ClickHouseHttpClient::new(cfg)?;
    client.ping().await.map_err(|e| e.wrap("ping"))?;
    tracing::info!(host = %cfg.host, port = cfg.port, tls = cfg.use_tls(), "connected to ClickHouse");
    Ok(client)
}

fn new_query_id() -> String {
    format!("ct-{}", uuid::Uuid::new_v4().simple())
}

fn parse_compact(body: &str) -> Result<CompactBody, ClientError> {
    serde_json::from_str(body).map_err(|e| {
        ClientError::Decode(format!(
            "failed to decode response body: {e} | body={}",
            super::error::preview_body(body)
        ))
    })
}

fn escape_literal(s: &str) -> String {
    s.replace('\\', "\\\\").replace('\'', "\\'")
}
