//! Row normalization into [`WaitMetricRecord`]s
//!
//! Structural problems (no header row, unresolvable columns) fail before any
//! row is produced. Row-level problems never fail the sheet: a bad period
//! drops the row, a bad measurement becomes `NaN`.

use calamine::{Data, Range};
use chrono::{DateTime, Datelike, Days, NaiveDate, NaiveDateTime};

use crate::error::Result;
use crate::types::WaitMetricRecord;

use super::aliases::{normalize_header, ColumnMap};

const EMPTY: Data = Data::Empty;

/// Text date layouts seen in period columns
///
/// Two-digit-year layouts come before their four-digit twins: chrono's `%Y`
/// also takes `25` as the year 25.
const DATE_FORMATS: &[&str] = &[
    "%d/%m/%y",
    "%d-%m-%y",
    "%d-%b-%y",
    "%d %b %y",
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%d/%m/%Y",
    "%d-%m-%Y",
    "%d-%b-%Y",
    "%d %b %Y",
];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%d/%m/%y %H:%M:%S",
    "%d/%m/%y %H:%M",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
];

/// Month-only layouts (`"March 2025"`, `"Mar-25"`) with the day-1 prefix
/// matching each separator
const MONTH_FORMATS: &[(&str, &str)] = &[
    ("1-", "%d-%b-%y"),
    ("1 ", "%d %b %y"),
    ("1-", "%d-%b-%Y"),
    ("1 ", "%d %b %Y"),
];

/// Periods outside these years are treated as unparseable
const MIN_PERIOD_YEAR: i32 = 1900;
const MAX_PERIOD_YEAR: i32 = 2100;

/// Largest serial Excel accepts (9999-12-31)
const MAX_EXCEL_SERIAL: f64 = 2_958_465.0;

/// Records parsed from one sheet plus what was dropped on the way
#[derive(Debug, Clone, Default)]
pub struct NormalizeOutcome {
    /// Valid records in source row order
    pub records: Vec<WaitMetricRecord>,
    /// Rows dropped because the period could not be parsed
    pub dropped_period: usize,
    /// Rows dropped because the provider or treatment code was blank
    pub dropped_identity: usize,
}

/// Normalize a worksheet range whose first row holds the headers
pub fn normalize_range(range: &Range<Data>) -> Result<NormalizeOutcome> {
    let first_row = range.start().map(|(row, _)| row as usize).unwrap_or(0);
    let mut rows = range.rows();

    let headers: Vec<String> = rows
        .next()
        .map(|row| row.iter().map(|cell| normalize_header(&cell_text(cell))).collect())
        .unwrap_or_default();
    let columns = ColumnMap::resolve(&headers)?;

    let mut outcome = NormalizeOutcome::default();

    for (offset, row) in rows.enumerate() {
        if row.iter().all(is_blank) {
            continue;
        }
        let cell = |idx: usize| row.get(idx).unwrap_or(&EMPTY);
        // +2: header row, then 1-based sheet numbering
        let row_number = first_row + offset + 2;

        let Some(period_date) = parse_period(cell(columns.period)) else {
            tracing::debug!("Row {}: unparseable period {:?}", row_number, cell(columns.period));
            outcome.dropped_period += 1;
            continue;
        };

        let provider_code = cell_text(cell(columns.provider_code));
        let treatment_code = treatment_code(&cell_text(cell(columns.treatment_code)));
        if provider_code.is_empty() || treatment_code.is_empty() {
            tracing::debug!("Row {}: missing provider or treatment code", row_number);
            outcome.dropped_identity += 1;
            continue;
        }

        outcome.records.push(WaitMetricRecord {
            provider_code,
            treatment_code,
            period_date,
            median_weeks: parse_measure(cell(columns.median_weeks)),
            pct_over_18w: parse_measure(cell(columns.pct_over_18w)),
            pct_over_52w: parse_measure(cell(columns.pct_over_52w)),
        });
    }

    Ok(outcome)
}

/// Leading digits of a `"<digits> - <description>"` value, else the trimmed value
pub fn treatment_code(raw: &str) -> String {
    let trimmed = raw.trim();
    if let Some((code, _)) = trimmed.split_once('-') {
        let code = code.trim();
        if !code.is_empty() && code.chars().all(|c| c.is_ascii_digit()) {
            return code.to_string();
        }
    }
    trimmed.to_string()
}

/// Reporting period of a cell, if it holds anything date-like
///
/// Dates outside 1900..=2100 are rejected so a misread year drops the row.
pub fn parse_period(cell: &Data) -> Option<NaiveDate> {
    let date = match cell {
        Data::DateTime(dt) => dt.as_datetime().map(|d| d.date()),
        Data::DateTimeIso(s) | Data::String(s) => parse_period_text(s),
        Data::Float(f) => from_excel_serial(*f),
        Data::Int(i) => from_excel_serial(*i as f64),
        _ => None,
    }?;
    plausible(date)
}

fn plausible(date: NaiveDate) -> Option<NaiveDate> {
    (MIN_PERIOD_YEAR..=MAX_PERIOD_YEAR)
        .contains(&date.year())
        .then_some(date)
}

fn parse_period_text(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    let rfc3339 = DateTime::parse_from_rfc3339(text)
        .ok()
        .map(|dt| dt.date_naive());
    let datetime = || {
        DATETIME_FORMATS
            .iter()
            .filter_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
            .find_map(|dt| plausible(dt.date()))
    };
    let date = || {
        DATE_FORMATS
            .iter()
            .filter_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
            .find_map(plausible)
    };
    let month = || {
        MONTH_FORMATS
            .iter()
            .filter_map(|(prefix, fmt)| {
                NaiveDate::parse_from_str(&format!("{}{}", prefix, text), fmt).ok()
            })
            .find_map(plausible)
    };

    rfc3339
        .and_then(plausible)
        .or_else(datetime)
        .or_else(date)
        .or_else(month)
}

/// Excel serial day number (1900 date system) to a date
fn from_excel_serial(value: f64) -> Option<NaiveDate> {
    if !(1.0..=MAX_EXCEL_SERIAL).contains(&value) {
        return None;
    }
    NaiveDate::from_ymd_opt(1899, 12, 30)?.checked_add_days(Days::new(value.trunc() as u64))
}

/// Measurement value of a cell, `NaN` when it is not numeric
pub fn parse_measure(cell: &Data) -> f64 {
    match cell {
        Data::Float(f) => *f,
        Data::Int(i) => *i as f64,
        Data::String(s) => s.trim().parse().unwrap_or(f64::NAN),
        _ => f64::NAN,
    }
}

/// Trimmed text of a cell; empty for blanks and spreadsheet errors
fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty | Data::Error(_) => String::new(),
        Data::String(s) => s.trim().to_string(),
        other => other.to_string().trim().to_string(),
    }
}

fn is_blank(cell: &Data) -> bool {
    match cell {
        Data::Empty => true,
        Data::String(s) => s.trim().is_empty(),
        _ => false,
    }
}
