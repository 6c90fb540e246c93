//! Error type shared by the session and the report queries.

use crate::ReportKind;

/// Errors returned by [`Session`](crate::Session) and [`Report`](crate::Report).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Transport failure or a non-2xx HTTP status.
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The body was not valid JSON.
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The body parsed, but an expected field was missing or had the wrong type.
    #[error("unexpected response: {0}")]
    ResponseParse(&'static str),

    /// The API answered with a non-OK status inside its response envelope.
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    /// The report kind has no endpoint this client knows how to query.
    #[error("{0} reports are not supported yet")]
    Unsupported(ReportKind),

    /// `DYN_MM_API_KEY` was not set when building from the environment.
    #[error("no API key configured (set DYN_MM_API_KEY)")]
    MissingApiKey,

    /// The configured base URL could not be parsed.
    #[error("invalid base URL: {0}")]
    InvalidBaseUrl(String),
}
