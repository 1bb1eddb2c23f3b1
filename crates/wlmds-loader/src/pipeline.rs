//! Run orchestration
//!
//! A run moves through `Resolving → Retrieving → Selecting → Normalizing →
//! Reconciling → Done`. The first failing stage ends the run; nothing is
//! retried. The temporary workbook is released before storage is opened,
//! and the storage connection lives only for the reconciling stage.

use reqwest::blocking::Client;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

use crate::config::LoaderConfig;
use crate::error::{Error, Result};
use crate::ingestion::{normalize_range, select_sheet, NormalizeOutcome, Workbook};
use crate::source::{http_client, Retriever, SourceResolver};
use crate::storage::{MetricStore, WaitMetricsDb};
use crate::types::WaitMetricRecord;

/// Stage of a single run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStage {
    Resolving,
    Retrieving,
    Selecting,
    Normalizing,
    Reconciling,
    Done,
}

impl fmt::Display for RunStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunStage::Resolving => "resolving",
            RunStage::Retrieving => "retrieving",
            RunStage::Selecting => "selecting",
            RunStage::Normalizing => "normalizing",
            RunStage::Reconciling => "reconciling",
            RunStage::Done => "done",
        };
        f.write_str(name)
    }
}

/// A run that stopped at `stage`
#[derive(Debug, Error)]
#[error("WLMDS load failed while {stage}: {error}")]
pub struct RunFailure {
    pub stage: RunStage,
    pub error: Error,
}

/// Summary of a successful run
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// Workbook location that was ingested
    pub source: String,
    /// Worksheet that was read
    pub sheet: String,
    /// Valid records produced by normalization
    pub parsed: usize,
    /// Rows dropped for an unparseable period
    pub dropped_period: usize,
    /// Rows dropped for a blank provider or treatment code
    pub dropped_identity: usize,
    /// Records written to storage
    pub upserted: usize,
    /// Storage was skipped on request
    pub dry_run: bool,
}

/// Merge `records` into `store`
///
/// An empty batch is logged and returns without touching the store.
pub fn reconcile<S: MetricStore + ?Sized>(
    store: &mut S,
    records: &[WaitMetricRecord],
) -> Result<usize> {
    tracing::info!("Upserting {} records into wait_metrics", records.len());
    if records.is_empty() {
        tracing::warn!("No records to upsert; skipping.");
        return Ok(0);
    }

    store.ensure_schema()?;
    let written = store.upsert_batch(records)?;

    tracing::info!("Upsert completed successfully");
    Ok(written)
}

/// One-shot WLMDS import
pub struct Pipeline {
    config: LoaderConfig,
    client: Client,
    dry_run: bool,
}

impl Pipeline {
    /// Create a pipeline, validating the configuration first
    pub fn new(config: LoaderConfig) -> Result<Self> {
        let config = config.normalized();
        config.validate()?;

        Ok(Self {
            config,
            client: http_client()?,
            dry_run: false,
        })
    }

    /// Stop after normalization without opening storage
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Run against the configured database
    pub fn run(&self) -> std::result::Result<RunReport, RunFailure> {
        self.run_with(|| {
            let url = self
                .config
                .database_url
                .as_deref()
                .ok_or_else(|| Error::config("DATABASE_URL is required"))?;
            WaitMetricsDb::open(url)
        })
    }

    /// Run against a store produced by `open_store` once reconciling starts
    pub fn run_with<S, F>(&self, open_store: F) -> std::result::Result<RunReport, RunFailure>
    where
        S: MetricStore,
        F: FnOnce() -> Result<S>,
    {
        let mut stage = RunStage::Resolving;
        match self.execute(&mut stage, open_store) {
            Ok(report) => {
                tracing::info!(
                    "WLMDS load complete: {} records upserted from '{}'",
                    report.upserted,
                    report.sheet
                );
                Ok(report)
            }
            Err(error) => {
                tracing::error!("WLMDS load failed while {}: {}", stage, error);
                Err(RunFailure { stage, error })
            }
        }
    }

    fn execute<S, F>(&self, stage: &mut RunStage, open_store: F) -> Result<RunReport>
    where
        S: MetricStore,
        F: FnOnce() -> Result<S>,
    {
        let resolver = SourceResolver::new(self.client.clone(), &self.config.source);
        let source = resolver.resolve(self.config.source.location.as_deref())?;
        tracing::info!("WLMDS source: {}", source);

        let (sheet, outcome) = self.read_source(stage, &source)?;

        advance(stage, RunStage::Reconciling);
        let upserted = if self.dry_run {
            tracing::info!("Dry run: {} records not written", outcome.records.len());
            0
        } else {
            let mut store = open_store()?;
            reconcile(&mut store, &outcome.records)?
        };

        advance(stage, RunStage::Done);
        Ok(RunReport {
            source,
            sheet,
            parsed: outcome.records.len(),
            dropped_period: outcome.dropped_period,
            dropped_identity: outcome.dropped_identity,
            upserted,
            dry_run: self.dry_run,
        })
    }

    /// Retrieve, select and normalize; the temp workbook is gone when this returns
    fn read_source(
        &self,
        stage: &mut RunStage,
        source: &str,
    ) -> Result<(String, NormalizeOutcome)> {
        advance(stage, RunStage::Retrieving);
        let temp = Retriever::new(self.client.clone(), &self.config.source).retrieve(source)?;

        advance(stage, RunStage::Selecting);
        let mut workbook = Workbook::open(temp.path())?;
        let names = workbook.sheet_names();
        let sheet = select_sheet(&names, self.config.sheet.as_deref())?;
        tracing::info!("Using sheet: {} (available: {:?})", sheet, names);

        advance(stage, RunStage::Normalizing);
        tracing::info!("Parsing Excel: {} (sheet: {})", temp.path().display(), sheet);
        let range = workbook.range(&sheet)?;
        let outcome = normalize_range(&range)?;
        tracing::info!(
            "Parsed {} rows from sheet '{}' ({} bad periods, {} missing codes dropped)",
            outcome.records.len(),
            sheet,
            outcome.dropped_period,
            outcome.dropped_identity
        );

        // Close the workbook before its temp file is removed
        drop(workbook);
        Ok((sheet, outcome))
    }
}

fn advance(stage: &mut RunStage, next: RunStage) {
    tracing::debug!("Stage {} -> {}", stage, next);
    *stage = next;
}
