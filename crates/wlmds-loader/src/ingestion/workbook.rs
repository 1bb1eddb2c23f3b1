//! Spreadsheet access over any format the reader recognises by extension

use calamine::{open_workbook_auto, Data, Range, Reader, Sheets};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Open workbook with its sheet names in file order
pub struct Workbook {
    path: PathBuf,
    sheets: Sheets<BufReader<File>>,
}

impl Workbook {
    /// Open the workbook at `path`
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let sheets = open_workbook_auto(&path).map_err(|e| Error::workbook(&path, e.to_string()))?;
        Ok(Self { path, sheets })
    }

    /// Worksheet names in file order
    pub fn sheet_names(&self) -> Vec<String> {
        self.sheets.sheet_names()
    }

    /// Used cell range of a worksheet
    pub fn range(&mut self, sheet: &str) -> Result<Range<Data>> {
        self.sheets
            .worksheet_range(sheet)
            .map_err(|e| Error::workbook(&self.path, format!("sheet '{}': {}", sheet, e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_open_rejects_non_workbook() {
        let mut file = tempfile::Builder::new().suffix(".xlsx").tempfile().unwrap();
        file.write_all(b"this is not a zip archive").unwrap();

        let err = Workbook::open(file.path()).err().unwrap();
        assert!(matches!(err, Error::Workbook { .. }));
    }
}
