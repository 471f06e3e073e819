use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Encoder unavailable: {0}")]
    EncoderUnavailable(String),

    #[error("Malformed query: {0}")]
    MalformedQuery(String),

    #[error("Invalid catalog: {0}")]
    InvalidCatalog(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Provider failed: {0}")]
    Provider(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
