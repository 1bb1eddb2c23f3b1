//! Spreadsheet ingestion: sheet selection and row normalization

pub mod aliases;
mod normalizer;
mod sheet;
mod workbook;

pub use aliases::{ColumnMap, LogicalField};
pub use normalizer::{
    normalize_range, parse_measure, parse_period, treatment_code, NormalizeOutcome,
};
pub use sheet::{select_sheet, PROVIDER_MARKER};
pub use workbook::Workbook;
