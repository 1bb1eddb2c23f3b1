//! Canonical wait-time measurement produced by one spreadsheet row

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One provider/treatment/period measurement
///
/// `(provider_code, treatment_code, period_date)` is the natural identity.
/// Measurement fields hold `NaN` when the source cell could not be parsed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaitMetricRecord {
    /// Organisation (ODS) code of the provider
    pub provider_code: String,
    /// Treatment function code
    pub treatment_code: String,
    /// Reporting period
    pub period_date: NaiveDate,
    /// Median wait in weeks
    pub median_weeks: f64,
    /// Share of the list waiting more than 18 weeks
    pub pct_over_18w: f64,
    /// Share of the list waiting more than 52 weeks
    pub pct_over_52w: f64,
}

/// Borrowed identity of a [`WaitMetricRecord`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordKey<'a> {
    pub provider_code: &'a str,
    pub treatment_code: &'a str,
    pub period_date: NaiveDate,
}

impl WaitMetricRecord {
    /// Identity triple of this record
    pub fn key(&self) -> RecordKey<'_> {
        RecordKey {
            provider_code: &self.provider_code,
            treatment_code: &self.treatment_code,
            period_date: self.period_date,
        }
    }

    /// Whether the two records carry the same measurements, treating `NaN` as equal to `NaN`
    pub fn same_measurements(&self, other: &Self) -> bool {
        fn eq(a: f64, b: f64) -> bool {
            (a.is_nan() && b.is_nan()) || a == b
        }
        eq(self.median_weeks, other.median_weeks)
            && eq(self.pct_over_18w, other.pct_over_18w)
            && eq(self.pct_over_52w, other.pct_over_52w)
    }
}
