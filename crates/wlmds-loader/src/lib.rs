//! wlmds-loader: batch import of NHS Waiting List Minimum Dataset workbooks
//!
//! A run resolves the newest published summary workbook (or an explicit
//! location), copies it into a scoped temporary file, picks the
//! provider-level worksheet, normalizes its rows across the column naming of
//! different releases, and upserts the result into the `wait_metrics` table.

pub mod config;
pub mod error;
pub mod ingestion;
pub mod pipeline;
pub mod source;
pub mod storage;
pub mod types;

pub use config::LoaderConfig;
pub use error::{Error, Result};
pub use pipeline::{reconcile, Pipeline, RunFailure, RunReport, RunStage};
pub use storage::{MetricStore, WaitMetricsDb};
pub use types::{RecordKey, WaitMetricRecord};
