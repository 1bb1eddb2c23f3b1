//! Configuration for the loader

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{Error, Result};
use crate::storage::StorageTarget;

/// NHS page listing the published WLMDS summary workbooks
pub const DEFAULT_INDEX_URL: &str =
    "https://www.england.nhs.uk/statistics/statistical-work-areas/rtt-waiting-times/wlmds/";

/// Environment variable holding the storage connection string
pub const ENV_DATABASE_URL: &str = "DATABASE_URL";
/// Environment variable holding an explicit workbook URL or path
pub const ENV_SOURCE: &str = "WLMDS_URL";
/// Environment variable holding an explicit worksheet name
pub const ENV_SHEET: &str = "WLMDS_SHEET";
/// Environment variable overriding the discovery index page
pub const ENV_INDEX_URL: &str = "WLMDS_INDEX_URL";

/// Main loader configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct LoaderConfig {
    /// Storage connection string (required before a run)
    pub database_url: Option<String>,
    /// Where the workbook comes from
    pub source: SourceConfig,
    /// Explicit worksheet name; auto-selected when absent
    pub sheet: Option<String>,
}

/// Source resolution and retrieval configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Explicit HTTP(S) URL or local path; discovered when absent
    pub location: Option<String>,
    /// Index page scanned during discovery
    pub index_url: String,
    /// Timeout for fetching the index page in seconds
    pub index_timeout_secs: u64,
    /// Timeout for downloading the workbook in seconds
    pub download_timeout_secs: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            location: None,
            index_url: DEFAULT_INDEX_URL.to_string(),
            index_timeout_secs: 30,
            download_timeout_secs: 60,
        }
    }
}

impl LoaderConfig {
    /// Load configuration from a TOML file; missing keys take their defaults
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::config(format!("Failed to read {}: {}", path.display(), e)))?;
        let config: Self = toml::from_str(&text)
            .map_err(|e| Error::config(format!("Invalid config {}: {}", path.display(), e)))?;
        Ok(config.normalized())
    }

    /// Treat blank optional values as absent
    ///
    /// The sheet name is kept verbatim since worksheet names may carry
    /// surrounding spaces.
    pub fn normalized(mut self) -> Self {
        self.database_url = non_blank(self.database_url);
        self.sheet = non_blank_raw(self.sheet);
        self.source.location = non_blank(self.source.location);
        self
    }

    /// Check that a run can start with this configuration
    pub fn validate(&self) -> Result<()> {
        match &self.database_url {
            None => return Err(Error::config(format!("{} is required", ENV_DATABASE_URL))),
            Some(url) => {
                StorageTarget::parse(url)?;
            }
        }
        if self.source.index_url.trim().is_empty() {
            return Err(Error::config("index_url must not be empty"));
        }
        if self.source.index_timeout_secs == 0 || self.source.download_timeout_secs == 0 {
            return Err(Error::config("timeouts must be greater than zero"));
        }
        Ok(())
    }
}

/// Trim a value and drop it when nothing is left
pub fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Drop a value that is only whitespace, keeping it untrimmed otherwise
pub fn non_blank_raw(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
