//! WLMDS loader binary
//!
//! Run with: cargo run -p wlmds-loader -- --database-url sqlite://wait_metrics.db

use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use wlmds_loader::config::{
    non_blank, non_blank_raw, ENV_DATABASE_URL, ENV_INDEX_URL, ENV_SHEET, ENV_SOURCE,
};
use wlmds_loader::{LoaderConfig, Pipeline};

/// Load the latest NHS WLMDS provider-level wait times into wait_metrics
#[derive(Debug, Parser)]
#[command(name = "wlmds-loader", version, about)]
struct Args {
    /// Storage connection string (sqlite://path, a bare path, or :memory:)
    #[arg(long, env = ENV_DATABASE_URL)]
    database_url: Option<String>,

    /// Workbook URL or local path; discovered from the index page when absent
    #[arg(long, env = ENV_SOURCE)]
    source: Option<String>,

    /// Worksheet to read; defaults to the first sheet mentioning "provider"
    #[arg(long, env = ENV_SHEET)]
    sheet: Option<String>,

    /// Index page scanned for WLMDS-Summary-to-*.xlsx links
    #[arg(long, env = ENV_INDEX_URL)]
    index_url: Option<String>,

    /// TOML file with defaults; flags and environment take precedence
    #[arg(long)]
    config: Option<PathBuf>,

    /// Parse and report without writing to storage
    #[arg(long)]
    dry_run: bool,

    /// Print the run report as JSON on stdout
    #[arg(long)]
    json: bool,
}

impl Args {
    fn to_config(&self) -> anyhow::Result<LoaderConfig> {
        let mut config = match &self.config {
            Some(path) => LoaderConfig::from_file(path)?,
            None => LoaderConfig::default(),
        };

        if let Some(url) = non_blank(self.database_url.clone()) {
            config.database_url = Some(url);
        }
        if let Some(source) = non_blank(self.source.clone()) {
            config.source.location = Some(source);
        }
        if let Some(sheet) = non_blank_raw(self.sheet.clone()) {
            config.sheet = Some(sheet);
        }
        if let Some(index_url) = non_blank(self.index_url.clone()) {
            config.source.index_url = index_url;
        }

        Ok(config.normalized())
    }
}

fn main() -> anyhow::Result<()> {
    // Logs go to stderr so --json output stays clean
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "wlmds_loader=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();
    let config = args.to_config()?;

    let report = Pipeline::new(config)?.dry_run(args.dry_run).run()?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    }

    Ok(())
}
