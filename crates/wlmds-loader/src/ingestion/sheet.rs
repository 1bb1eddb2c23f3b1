//! Worksheet selection

use crate::error::{Error, Result};

/// Sheet-name token marking the provider-level breakdown
pub const PROVIDER_MARKER: &str = "provider";

/// Pick the worksheet to ingest
///
/// An explicit name must match exactly. Without one, the first sheet whose
/// name contains [`PROVIDER_MARKER`] (any case) wins, falling back to the
/// first sheet in the workbook.
pub fn select_sheet(names: &[String], explicit: Option<&str>) -> Result<String> {
    if let Some(requested) = explicit.filter(|s| !s.trim().is_empty()) {
        return names
            .iter()
            .find(|name| name.as_str() == requested)
            .cloned()
            .ok_or_else(|| Error::SheetNotFound {
                requested: requested.to_string(),
                available: names.to_vec(),
            });
    }

    names
        .iter()
        .find(|name| name.to_lowercase().contains(PROVIDER_MARKER))
        .or_else(|| names.first())
        .cloned()
        .ok_or_else(|| Error::SheetNotFound {
            requested: PROVIDER_MARKER.to_string(),
            available: Vec::new(),
        })
}
