//! Core types for the loader

pub mod record;

pub use record::{RecordKey, WaitMetricRecord};
