use spotter_scanner::ScanError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CrawlError {
    #[error(transparent)]
    Scan(#[from] ScanError),

    #[error("Failed to append to {path}: {source}")]
    Output {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to render record: {0}")]
    Render(#[from] serde_json::Error),

    #[error("Country list {path}: {source}")]
    CountryList {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("No countries to crawl in {}", .0.display())]
    NoCountries(PathBuf),

    #[error("Record writer task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

pub type Result<T> = std::result::Result<T, CrawlError>;
