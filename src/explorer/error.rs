use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Media host returned status {0}")]
    Status(u16),

    #[error("Malformed collection payload: {0}")]
    Malformed(String),

    #[error("Request aborted")]
    Aborted,
}

impl FetchError {
    /// Aborts come from a superseded load and are never surfaced.
    pub fn is_abort(&self) -> bool {
        matches!(self, FetchError::Aborted)
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(e: serde_json::Error) -> Self {
        FetchError::Malformed(e.to_string())
    }
}
