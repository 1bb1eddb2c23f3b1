//! Header aliases for the six logical WLMDS columns
//!
//! Column names drift between releases. Each logical field carries an
//! ordered alias list; the first alias present in the sheet wins.

use std::fmt;

use crate::error::{Error, Result};

/// Logical column of the canonical schema
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogicalField {
    ProviderCode,
    TreatmentCode,
    Period,
    MedianWeeks,
    PctOver18w,
    PctOver52w,
}

impl LogicalField {
    /// All fields in resolution order
    pub const ALL: [LogicalField; 6] = [
        LogicalField::ProviderCode,
        LogicalField::TreatmentCode,
        LogicalField::Period,
        LogicalField::MedianWeeks,
        LogicalField::PctOver18w,
        LogicalField::PctOver52w,
    ];

    /// Known header spellings, most preferred first (already normalized)
    pub fn aliases(self) -> &'static [&'static str] {
        match self {
            LogicalField::ProviderCode => &[
                "organisation code",
                "organisation code (ods)",
                "provider code",
                "org code",
            ],
            LogicalField::TreatmentCode => &[
                "treatment function code",
                "treatment function",
                "tfc code",
                "tfc",
            ],
            LogicalField::Period => &[
                "period ending",
                "period end",
                "period",
                "month",
                "reporting period",
            ],
            LogicalField::MedianWeeks => &[
                "median wait",
                "median wait (weeks)",
                "median (weeks)",
                "median weeks",
            ],
            LogicalField::PctOver18w => &[
                "% waiting > 18 weeks",
                "% waiting over 18 weeks",
                "% > 18 weeks",
                "over 18 weeks (%)",
            ],
            LogicalField::PctOver52w => &[
                "% waiting > 52 weeks",
                "% waiting over 52 weeks",
                "% > 52 weeks",
                "over 52 weeks (%)",
            ],
        }
    }

    /// Human readable field name used in errors
    pub fn name(self) -> &'static str {
        match self {
            LogicalField::ProviderCode => "provider code",
            LogicalField::TreatmentCode => "treatment code",
            LogicalField::Period => "period",
            LogicalField::MedianWeeks => "median weeks",
            LogicalField::PctOver18w => "% over 18 weeks",
            LogicalField::PctOver52w => "% over 52 weeks",
        }
    }
}

impl fmt::Display for LogicalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Trim and lower-case a raw header cell
pub fn normalize_header(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Column index of `field` within normalized `headers`
pub fn resolve_column(headers: &[String], field: LogicalField) -> Result<usize> {
    field
        .aliases()
        .iter()
        .find_map(|alias| headers.iter().position(|h| h == alias))
        .ok_or_else(|| Error::Schema {
            field: field.name().to_string(),
            tried: field.aliases().iter().map(|a| a.to_string()).collect(),
            actual: headers.to_vec(),
        })
}

/// Resolved column positions for every logical field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnMap {
    pub provider_code: usize,
    pub treatment_code: usize,
    pub period: usize,
    pub median_weeks: usize,
    pub pct_over_18w: usize,
    pub pct_over_52w: usize,
}

impl ColumnMap {
    /// Resolve all six fields, failing on the first one with no matching header
    pub fn resolve(headers: &[String]) -> Result<Self> {
        Ok(Self {
            provider_code: resolve_column(headers, LogicalField::ProviderCode)?,
            treatment_code: resolve_column(headers, LogicalField::TreatmentCode)?,
            period: resolve_column(headers, LogicalField::Period)?,
            median_weeks: resolve_column(headers, LogicalField::MedianWeeks)?,
            pct_over_18w: resolve_column(headers, LogicalField::PctOver18w)?,
            pct_over_52w: resolve_column(headers, LogicalField::PctOver52w)?,
        })
    }

    /// Column index for a field
    pub fn index(&self, field: LogicalField) -> usize {
        match field {
            LogicalField::ProviderCode => self.provider_code,
            LogicalField::TreatmentCode => self.treatment_code,
            LogicalField::Period => self.period,
            LogicalField::MedianWeeks => self.median_weeks,
            LogicalField::PctOver18w => self.pct_over_18w,
            LogicalField::PctOver52w => self.pct_over_52w,
        }
    }
}
