//! Error types for issue creation.

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors that end a run.
///
/// Markdown conversion has no variant here: every input converts.
#[derive(Debug, Error)]
pub enum Error {
    /// Missing or conflicting inputs
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Request could not be sent or Jira rejected it
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Jira answered but the body has no issue key
    #[error("failed to parse Jira response: {0}")]
    ResponseParse(String),

    /// Payload could not be serialized
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// CI output file could not be written
    #[error("failed to write output file {}: {source}", path.display())]
    Output {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Jira API error ({status}): {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },
}
