//! Error types for the fallible edges of the dashboard.
//!
//! None of these ever escape the orchestrator: they are logged and degrade to
//! "no data", "no results" or "no cities".

/// Failure to fetch a weather snapshot.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    #[error("weather provider rejected the request: {0}")]
    ProviderRejected(String),
    #[error("weather request failed: {0}")]
    Transport(String),
}

/// Failure to fetch autocomplete suggestions.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SearchError {
    #[error("city search provider rejected the request: {0}")]
    ProviderRejected(String),
    #[error("city search request failed: {0}")]
    Transport(String),
}

#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("stored data is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("could not determine platform data directory")]
    NoDataDir,
}
