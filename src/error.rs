//! Crate-wide error type.
//!
//! The taxonomy mirrors how failures are handled: configuration problems are
//! fatal at startup, storage write failures propagate to the caller, and
//! everything else (fetch, parse, backend) is recovered close to where it
//! happens and logged rather than raised.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, NewsError>;

#[derive(Debug, Error)]
pub enum NewsError {
    /// Malformed or incomplete source configuration. Fatal at startup.
    #[error("configuration error: {0}")]
    Config(String),

    /// Configuration file could not be parsed as YAML.
    #[error("configuration parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// An invalid CSS selector was supplied for a web source.
    #[error("invalid selector `{0}`")]
    Selector(String),

    /// Filesystem failure. Save paths treat this as data loss and propagate.
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization failure for a batch file.
    #[error("batch serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP transport failure.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// AI backend call failed; callers degrade to the heuristic fallback.
    #[error("backend error: {0}")]
    Backend(String),
}
