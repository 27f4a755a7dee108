//! Error types shared across the client.

use thiserror::Error;

pub type TransportResult<T> = Result<T, TransportError>;

/// Failures talking to the conversation service.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The server answered with a non-2xx status.
    #[error("API error {status}: {body}")]
    Status { status: u16, body: String },

    /// The request never produced a response (connect, timeout, TLS).
    #[error("request failed: {0}")]
    Network(#[from] reqwest::Error),

    /// A 2xx response whose payload could not be understood.
    #[error("unexpected response: {0}")]
    Decode(String),

    /// The client was built from unusable settings.
    #[error("client misconfigured: {0}")]
    Config(String),
}

impl TransportError {
    /// HTTP status of the failed response, when there was one.
    pub fn status(&self) -> Option<u16> {
        match self {
            TransportError::Status { status, .. } => Some(*status),
            TransportError::Network(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("no data directory available")]
    NoDataDir,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed config {path}: {message}")]
    Parse { path: String, message: String },

    #[error("could not write config: {0}")]
    Write(String),

    #[error("invalid base url {url:?}: {message}")]
    InvalidUrl { url: String, message: String },

    #[error("invalid value for {key}: {value:?}")]
    InvalidValue { key: String, value: String },
}

/// Top-level error for the binary.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}
