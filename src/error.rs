//! Error types for the extract/filter/export pipeline

use thiserror::Error;

/// Errors raised by calls into the remote spreadsheet and file stores.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// HTTP transport error.
    #[error("HTTP request failed")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-success status code.
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code returned by the API.
        status: u16,
        /// Message extracted from the error body, or the raw body.
        message: String,
    },

    /// The service account key could not be used to sign a token request.
    #[error("credential error: {0}")]
    Credentials(String),

    /// A response body did not have the expected shape.
    #[error("parse error: {0}")]
    Parse(String),
}

impl RemoteError {
    /// True for permission and not-found answers, the two cases an operator
    /// can usually fix by sharing the sheet or correcting the address.
    pub fn is_access_problem(&self) -> bool {
        matches!(self, RemoteError::Api { status, .. } if matches!(status, 401 | 403 | 404))
    }
}

/// Fatal pipeline failures.
///
/// Non-fatal conditions (missing class column, empty selection, empty result)
/// are reported to the operator as warnings and never surface here.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("invalid sheet reference '{address}': expected an address containing '/d/<id>'")]
    InvalidReference { address: String },

    #[error("authentication failed")]
    Authentication(#[source] RemoteError),

    #[error("source sheet unavailable")]
    SourceUnavailable(#[source] RemoteError),

    #[error("failed to stage table for upload")]
    Serialization(#[source] csv::Error),

    #[error("export failed")]
    ExportFailure(#[source] RemoteError),

    #[error("I/O error")]
    Io(#[from] std::io::Error),
}

impl PipelineError {
    pub(crate) fn configuration(message: impl Into<String>) -> Self {
        PipelineError::Configuration(message.into())
    }
}
