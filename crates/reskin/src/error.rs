use reqwest::StatusCode;

// Custom error type for engine operations
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("Cache storage unavailable: {0}")]
    CacheUnavailable(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Profile already exists: {0}")]
    DuplicateProfile(String),

    #[error("Invalid profile name: {0:?}")]
    InvalidName(String),

    #[error("The default profile cannot be deleted")]
    Undeletable,

    #[error("The default cache is not writable: {0}")]
    WriteRejected(String),

    #[error("Network request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Server returned status code {0}")]
    StatusCode(StatusCode),

    #[error("Archive export failed: {0}")]
    ExportFailure(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
