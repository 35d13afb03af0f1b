pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod executor;
pub mod outcome;
pub mod stress;
pub mod task;
