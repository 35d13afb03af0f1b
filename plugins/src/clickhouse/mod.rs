//! ClickHouse over its HTTP interface.

mod error;
mod http_client;
mod summary;
mod tls;

pub use http_client::{connect, ClickHouseHttpClient};
