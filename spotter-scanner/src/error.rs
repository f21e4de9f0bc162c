use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("HTTP {status} for {url}")]
    StatusError { url: String, status: u16 },

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Invalid selector '{0}'")]
    SelectorError(String),

    #[error("Record channel closed before {0} could be delivered")]
    RecordChannelClosed(String),
}

impl ScanError {
    /// Fetch failures are contained to their branch; everything else aborts the crawl.
    pub fn is_branch_local(&self) -> bool {
        matches!(
            self,
            ScanError::HttpError(_) | ScanError::StatusError { .. } | ScanError::InvalidUrl(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, ScanError>;
