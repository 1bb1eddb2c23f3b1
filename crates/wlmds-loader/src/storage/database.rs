//! SQLite storage for the `wait_metrics` table
//!
//! Natural identity `(provider_code, treatment_code, period_date)` is the
//! primary key; repeated imports overwrite only the measurement columns.

use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::types::{RecordKey, WaitMetricRecord};

const SCHEMA_SQL: &str = r#"
    CREATE TABLE IF NOT EXISTS wait_metrics (
        provider_code TEXT NOT NULL,
        treatment_code TEXT NOT NULL,
        period_date DATE NOT NULL,
        median_weeks DOUBLE PRECISION,
        pct_over_18w DOUBLE PRECISION,
        pct_over_52w DOUBLE PRECISION,
        PRIMARY KEY (provider_code, treatment_code, period_date)
    );

    -- Latest period per treatment; (provider, treatment) lookups use the primary key
    CREATE INDEX IF NOT EXISTS idx_wait_metrics_treatment_period
        ON wait_metrics(treatment_code, period_date);
"#;

const UPSERT_SQL: &str = r#"
    INSERT INTO wait_metrics
        (provider_code, treatment_code, period_date, median_weeks, pct_over_18w, pct_over_52w)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6)
    ON CONFLICT (provider_code, treatment_code, period_date) DO UPDATE SET
        median_weeks = excluded.median_weeks,
        pct_over_18w = excluded.pct_over_18w,
        pct_over_52w = excluded.pct_over_52w
"#;

const SELECT_COLUMNS: &str = "SELECT provider_code, treatment_code, period_date, \
     median_weeks, pct_over_18w, pct_over_52w FROM wait_metrics";

/// Wait for a competing run's write lock instead of failing immediately
const BUSY_TIMEOUT: Duration = Duration::from_secs(30);

/// Destination for reconciled records
pub trait MetricStore {
    /// Create the backing table if it does not exist
    fn ensure_schema(&mut self) -> Result<()>;

    /// Insert or overwrite `records` atomically, returning how many were written
    fn upsert_batch(&mut self, records: &[WaitMetricRecord]) -> Result<usize>;
}

/// Parsed storage connection string
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageTarget {
    /// Private in-memory database
    Memory,
    /// Database file on disk
    File(PathBuf),
}

impl StorageTarget {
    /// Parse `sqlite://path`, `sqlite:path`, `:memory:` or a bare path
    pub fn parse(url: &str) -> Result<Self> {
        let url = url.trim();
        let path = url
            .strip_prefix("sqlite://")
            .or_else(|| url.strip_prefix("sqlite:"))
            .unwrap_or(url);

        if path.is_empty() {
            return Err(Error::config("storage connection string is empty"));
        }
        if path == ":memory:" {
            return Ok(Self::Memory);
        }
        if let Some((scheme, _)) = path.split_once("://") {
            return Err(Error::config(format!(
                "unsupported storage scheme '{}': expected a SQLite path",
                scheme
            )));
        }
        Ok(Self::File(PathBuf::from(path)))
    }
}

/// SQLite-backed wait metrics table
pub struct WaitMetricsDb {
    conn: Connection,
}

impl WaitMetricsDb {
    /// Open the database named by a storage connection string
    pub fn open(url: &str) -> Result<Self> {
        match StorageTarget::parse(url)? {
            StorageTarget::Memory => Self::in_memory(),
            StorageTarget::File(path) => {
                let conn = Connection::open(&path).map_err(|e| {
                    Error::storage(format!(
                        "Failed to open database {}: {}",
                        path.display(),
                        e
                    ))
                })?;

                conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")
                    .map_err(|e| Error::storage(format!("Failed to set pragmas: {}", e)))?;

                Self::from_connection(conn)
            }
        }
    }

    /// Create an in-memory database
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| Error::storage(format!("Failed to open in-memory database: {}", e)))?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.busy_timeout(BUSY_TIMEOUT)
            .map_err(|e| Error::storage(format!("Failed to set busy timeout: {}", e)))?;
        Ok(Self { conn })
    }

    /// Number of stored records
    pub fn count(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM wait_metrics", [], |row| row.get(0))
            .map_err(|e| Error::storage(format!("Failed to count wait metrics: {}", e)))?;
        Ok(count as usize)
    }

    /// Record stored for one identity
    pub fn get(&self, key: RecordKey<'_>) -> Result<Option<WaitMetricRecord>> {
        let sql = format!(
            "{} WHERE provider_code = ?1 AND treatment_code = ?2 AND period_date = ?3",
            SELECT_COLUMNS
        );
        self.conn
            .query_row(
                &sql,
                params![key.provider_code, key.treatment_code, key.period_date],
                row_to_record,
            )
            .optional()
            .map_err(|e| Error::storage(format!("Failed to get wait metric: {}", e)))
    }

    /// Every period for one provider and treatment, oldest first
    pub fn trend(
        &self,
        provider_code: &str,
        treatment_code: &str,
    ) -> Result<Vec<WaitMetricRecord>> {
        let sql = format!(
            "{} WHERE provider_code = ?1 AND treatment_code = ?2 ORDER BY period_date",
            SELECT_COLUMNS
        );
        self.query(&sql, params![provider_code, treatment_code])
    }

    /// All providers' records for the most recent period of a treatment
    pub fn latest_for_treatment(&self, treatment_code: &str) -> Result<Vec<WaitMetricRecord>> {
        let sql = format!(
            "{} WHERE treatment_code = ?1 AND period_date = \
             (SELECT MAX(period_date) FROM wait_metrics WHERE treatment_code = ?1) \
             ORDER BY provider_code",
            SELECT_COLUMNS
        );
        self.query(&sql, params![treatment_code])
    }

    /// Most recent period stored for a treatment
    pub fn latest_period(&self, treatment_code: &str) -> Result<Option<NaiveDate>> {
        self.conn
            .query_row(
                "SELECT MAX(period_date) FROM wait_metrics WHERE treatment_code = ?1",
                params![treatment_code],
                |row| row.get(0),
            )
            .map_err(|e| Error::storage(format!("Failed to get latest period: {}", e)))
    }

    /// All stored records in identity order
    pub fn list(&self) -> Result<Vec<WaitMetricRecord>> {
        let sql = format!(
            "{} ORDER BY provider_code, treatment_code, period_date",
            SELECT_COLUMNS
        );
        self.query(&sql, [])
    }

    fn query<P: rusqlite::Params>(&self, sql: &str, params: P) -> Result<Vec<WaitMetricRecord>> {
        let mut stmt = self
            .conn
            .prepare(sql)
            .map_err(|e| Error::storage(format!("Failed to prepare query: {}", e)))?;

        let records = stmt
            .query_map(params, row_to_record)
            .map_err(|e| Error::storage(format!("Failed to query wait metrics: {}", e)))?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(|e| Error::storage(format!("Failed to read wait metric row: {}", e)))?;

        Ok(records)
    }
}

impl MetricStore for WaitMetricsDb {
    fn ensure_schema(&mut self) -> Result<()> {
        self.conn
            .execute_batch(SCHEMA_SQL)
            .map_err(|e| Error::storage(format!("Failed to create wait_metrics: {}", e)))?;

        tracing::debug!("wait_metrics schema ready");
        Ok(())
    }

    fn upsert_batch(&mut self, records: &[WaitMetricRecord]) -> Result<usize> {
        // Dropping the transaction without commit rolls the whole batch back
        let tx = self
            .conn
            .transaction()
            .map_err(|e| Error::storage(format!("Failed to begin transaction: {}", e)))?;

        {
            let mut stmt = tx
                .prepare_cached(UPSERT_SQL)
                .map_err(|e| Error::storage(format!("Failed to prepare upsert: {}", e)))?;

            for record in records {
                stmt.execute(params![
                    record.provider_code,
                    record.treatment_code,
                    record.period_date,
                    measurement(record.median_weeks),
                    measurement(record.pct_over_18w),
                    measurement(record.pct_over_52w),
                ])
                .map_err(|e| {
                    Error::storage(format!(
                        "Failed to upsert {}/{}/{}: {}",
                        record.provider_code, record.treatment_code, record.period_date, e
                    ))
                })?;
            }
        }

        tx.commit()
            .map_err(|e| Error::storage(format!("Failed to commit upsert: {}", e)))?;

        Ok(records.len())
    }
}

/// `NaN` is stored as SQL NULL
fn measurement(value: f64) -> Option<f64> {
    (!value.is_nan()).then_some(value)
}

fn row_to_record(row: &Row<'_>) -> rusqlite::Result<WaitMetricRecord> {
    let measure = |idx: usize| -> rusqlite::Result<f64> {
        Ok(row.get::<_, Option<f64>>(idx)?.unwrap_or(f64::NAN))
    };

    Ok(WaitMetricRecord {
        provider_code: row.get(0)?,
        treatment_code: row.get(1)?,
        period_date: row.get(2)?,
        median_weeks: measure(3)?,
        pct_over_18w: measure(4)?,
        pct_over_52w: measure(5)?,
    })
}
