//! Storage module for persistent data storage
//!
//! Provides SQLite-based persistence for reconciled wait metrics.

mod database;

pub use database::{MetricStore, StorageTarget, WaitMetricsDb};
