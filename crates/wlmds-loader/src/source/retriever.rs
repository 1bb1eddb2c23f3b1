//! Workbook retrieval into a scoped temporary file

use reqwest::blocking::Client;
use reqwest::Url;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::NamedTempFile;

use crate::config::SourceConfig;
use crate::error::{Error, Result};

/// Extensions the workbook reader understands, checked in order
const WORKBOOK_SUFFIXES: &[&str] = &[".xlsx", ".xlsm", ".xlsb", ".xls", ".ods"];

/// Temporary copy of the source workbook
///
/// The file is removed when this value is dropped. Removal failures are
/// logged and otherwise ignored.
#[derive(Debug)]
pub struct TempWorkbook {
    file: Option<NamedTempFile>,
    path: PathBuf,
}

impl TempWorkbook {
    fn create(suffix: &str) -> Result<Self> {
        Ok(Self::from_file(new_temp_file(suffix)?))
    }

    fn from_file(file: NamedTempFile) -> Self {
        let path = file.path().to_path_buf();
        Self {
            file: Some(file),
            path,
        }
    }

    /// Location of the temporary workbook
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempWorkbook {
    fn drop(&mut self) {
        if let Some(file) = self.file.take() {
            match file.close() {
                Ok(()) => tracing::debug!("Removed temp workbook {}", self.path.display()),
                Err(e) => tracing::debug!(
                    "Could not remove temp workbook {}: {}",
                    self.path.display(),
                    e
                ),
            }
        }
    }
}

/// Fetches a workbook from a URL or local path
pub struct Retriever {
    client: Client,
    timeout: Duration,
}

impl Retriever {
    /// Create a retriever using the configured download timeout
    pub fn new(client: Client, config: &SourceConfig) -> Self {
        Self {
            client,
            timeout: Duration::from_secs(config.download_timeout_secs),
        }
    }

    /// Copy the workbook at `location` into a new temporary file
    pub fn retrieve(&self, location: &str) -> Result<TempWorkbook> {
        if is_remote(location) {
            self.download(location)
        } else {
            copy_local(Path::new(location))
        }
    }

    fn download(&self, url: &str) -> Result<TempWorkbook> {
        tracing::info!("Downloading WLMDS from {}", url);

        let mut response = self
            .client
            .get(url)
            .timeout(self.timeout)
            .send()
            .map_err(|e| Error::retrieval(url, e.to_string()))?;

        if !response.status().is_success() {
            return Err(Error::retrieval(url, format!("HTTP status {}", response.status())));
        }

        let mut file = new_temp_file(workbook_suffix(url))?;
        let bytes = response
            .copy_to(&mut file)
            .map_err(|e| Error::retrieval(url, e.to_string()))?;
        let workbook = TempWorkbook::from_file(file);

        tracing::info!("Downloaded {} bytes to {}", bytes, workbook.path().display());
        Ok(workbook)
    }
}

fn new_temp_file(suffix: &str) -> Result<NamedTempFile> {
    Ok(tempfile::Builder::new()
        .prefix("wlmds-")
        .suffix(suffix)
        .tempfile()?)
}

fn copy_local(src: &Path) -> Result<TempWorkbook> {
    if !src.exists() {
        return Err(Error::NotFound(src.to_path_buf()));
    }

    let workbook = TempWorkbook::create(workbook_suffix(&src.to_string_lossy()))?;
    std::fs::copy(src, workbook.path())?;

    tracing::info!("Copied local WLMDS file to temp: {}", workbook.path().display());
    Ok(workbook)
}

/// Whether `location` should be fetched over HTTP(S)
pub fn is_remote(location: &str) -> bool {
    Url::parse(location)
        .map(|url| matches!(url.scheme(), "http" | "https"))
        .unwrap_or(false)
}

/// Spreadsheet extension to give the temp file, defaulting to `.xlsx`
fn workbook_suffix(location: &str) -> &'static str {
    let path = match Url::parse(location) {
        Ok(url) if is_remote(location) => url.path().to_lowercase(),
        _ => location.to_lowercase(),
    };

    WORKBOOK_SUFFIXES
        .iter()
        .copied()
        .find(|suffix| path.ends_with(suffix))
        .unwrap_or(".xlsx")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::test_http::{self, serve, Reply};
    use std::io::Write;

    fn retriever() -> Retriever {
        Retriever::new(Client::new(), &SourceConfig::default())
    }

    #[test]
    fn test_is_remote() {
        assert!(is_remote("https://example.org/WLMDS-Summary-to-30-Mar-2025.xlsx"));
        assert!(is_remote("http://example.org/file.xlsx"));
        assert!(!is_remote("/tmp/file.xlsx"));
        assert!(!is_remote("data/file.xlsx"));
        assert!(!is_remote("C:\\data\\file.xlsx"));
        assert!(!is_remote("ftp://example.org/file.xlsx"));
    }

    #[test]
    fn test_workbook_suffix() {
        assert_eq!(workbook_suffix("https://example.org/a.XLSX?download=1"), ".xlsx");
        assert_eq!(workbook_suffix("https://example.org/a.xls"), ".xls");
        assert_eq!(workbook_suffix("/data/a.ods"), ".ods");
        assert_eq!(workbook_suffix("/data/a.xlsm"), ".xlsm");
        assert_eq!(workbook_suffix("/data/noext"), ".xlsx");
    }

    #[test]
    fn test_local_copy_is_removed_on_drop() {
        let mut src = tempfile::Builder::new().suffix(".xlsx").tempfile().unwrap();
        src.write_all(b"workbook bytes").unwrap();

        let workbook = retriever().retrieve(src.path().to_str().unwrap()).unwrap();
        let copied = workbook.path().to_path_buf();

        assert_ne!(copied, src.path());
        assert_eq!(std::fs::read(&copied).unwrap(), b"workbook bytes");
        assert!(copied.to_string_lossy().ends_with(".xlsx"));

        drop(workbook);
        assert!(!copied.exists());
        assert!(src.path().exists());
    }

    #[test]
    fn test_drop_tolerates_already_removed_file() {
        let workbook = TempWorkbook::create(".xlsx").unwrap();
        std::fs::remove_file(workbook.path()).unwrap();
        drop(workbook);
    }

    #[test]
    fn test_download_lands_in_temp_file() {
        let base = serve(vec![Reply::ok(&b"PK fake workbook"[..])]);
        let url = format!("{}/uploads/WLMDS-Summary-to-30-Mar-2025.xlsx", base);
        let retriever = Retriever::new(test_http::client(), &SourceConfig::default());

        let workbook = retriever.retrieve(&url).unwrap();
        let path = workbook.path().to_path_buf();

        assert_eq!(std::fs::read(&path).unwrap(), b"PK fake workbook");
        assert!(path.to_string_lossy().ends_with(".xlsx"));
        assert!(path
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with("wlmds-"));

        drop(workbook);
        assert!(!path.exists());
    }

    #[test]
    fn test_download_keeps_legacy_suffix() {
        let base = serve(vec![Reply::ok(&b"legacy"[..])]);
        let retriever = Retriever::new(test_http::client(), &SourceConfig::default());

        let workbook = retriever.retrieve(&format!("{}/old/summary.xls", base)).unwrap();
        assert!(workbook.path().to_string_lossy().ends_with(".xls"));
    }

    #[test]
    fn test_download_error_status_is_retrieval_error() {
        let base = serve(vec![Reply::status("404 Not Found")]);
        let url = format!("{}/missing.xlsx", base);
        let retriever = Retriever::new(test_http::client(), &SourceConfig::default());

        match retriever.retrieve(&url).unwrap_err() {
            Error::Retrieval { location, message } => {
                assert_eq!(location, url);
                assert!(message.contains("404"), "{message}");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_local_file() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.xlsx");

        let err = retriever().retrieve(missing.to_str().unwrap()).unwrap_err();
        assert!(matches!(err, Error::NotFound(path) if path == missing));
    }
}
