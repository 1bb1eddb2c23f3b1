//! Source resolution: explicit location or discovery from the NHS index page

use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::blocking::Client;
use reqwest::Url;
use scraper::{Html, Selector};
use std::collections::BTreeSet;
use std::time::Duration;

use crate::config::SourceConfig;
use crate::error::{Error, Result};

static SUMMARY_LINK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)WLMDS-Summary-to-.*\.xlsx$").expect("summary link pattern"));

static HREF: Lazy<Selector> = Lazy::new(|| Selector::parse("[href]").expect("href selector"));

/// Picks the workbook a run should ingest
pub struct SourceResolver {
    client: Client,
    index_url: String,
    timeout: Duration,
}

impl SourceResolver {
    /// Create a resolver over the configured index page
    pub fn new(client: Client, config: &SourceConfig) -> Self {
        Self {
            client,
            index_url: config.index_url.clone(),
            timeout: Duration::from_secs(config.index_timeout_secs),
        }
    }

    /// Return the explicit location when given, otherwise discover the newest workbook
    pub fn resolve(&self, explicit: Option<&str>) -> Result<String> {
        match explicit.map(str::trim).filter(|s| !s.is_empty()) {
            Some(location) => Ok(location.to_string()),
            None => self.discover_latest(),
        }
    }

    /// Fetch the index page and pick the newest `WLMDS-Summary-to-*.xlsx` link
    pub fn discover_latest(&self) -> Result<String> {
        tracing::info!("Discovering latest WLMDS URL from {}", self.index_url);

        let response = self
            .client
            .get(&self.index_url)
            .timeout(self.timeout)
            .send()
            .map_err(|e| {
                Error::discovery(format!("index page {} unreachable: {}", self.index_url, e))
            })?;

        if !response.status().is_success() {
            return Err(Error::discovery(format!(
                "index page {} returned {}",
                self.index_url,
                response.status()
            )));
        }

        // Relative links resolve against the final URL after redirects
        let base = response.url().clone();
        let html = response
            .text()
            .map_err(|e| Error::discovery(format!("Failed to read index page: {}", e)))?;

        let chosen = latest_link(&html, &base).ok_or_else(|| {
            Error::discovery("Could not find any WLMDS-Summary-to-*.xlsx links on the index page")
        })?;

        tracing::info!("Discovered WLMDS: {}", chosen);
        Ok(chosen)
    }
}

/// Newest summary workbook link on an index page
///
/// Links are made absolute against `base`, de-duplicated and compared as
/// strings; the release naming puts the newest file last.
pub fn latest_link(html: &str, base: &Url) -> Option<String> {
    let document = Html::parse_document(html);

    let links: BTreeSet<String> = document
        .select(&HREF)
        .filter_map(|element| element.value().attr("href"))
        .map(str::trim)
        .filter(|href| SUMMARY_LINK.is_match(href))
        .filter_map(|href| base.join(href).ok())
        .map(String::from)
        .collect();

    tracing::debug!("Found {} candidate WLMDS links", links.len());
    links.into_iter().next_back()
}
