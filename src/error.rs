use thiserror::Error;

/// Failures while fetching raw words for a refill
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("word request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("word service returned status {0}")]
    Status(u16),

    #[error("no embedded word list for language `{0}`")]
    MissingList(String),

    #[error("unable to decode word list: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Failures while submitting a finished session somewhere
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("result request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("result service returned status {0}")]
    Status(u16),

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("result history database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("unable to create history directory: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unable to access config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config file: {0}")]
    Parse(#[from] serde_json::Error),
}
