pub mod clickhouse;
pub mod factory;
pub mod report;
