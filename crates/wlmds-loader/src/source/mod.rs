//! Locating and fetching the WLMDS workbook

pub mod resolver;
pub mod retriever;

pub use resolver::{latest_link, SourceResolver};
pub use retriever::{is_remote, Retriever, TempWorkbook};

use reqwest::blocking::Client;

use crate::error::{Error, Result};

/// Build the blocking HTTP client shared by discovery and download
///
/// Timeouts are applied per request by the caller.
pub fn http_client() -> Result<Client> {
    Client::builder()
        .user_agent(concat!("wlmds-loader/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| Error::config(format!("Failed to create HTTP client: {}", e)))
}
