//! Error taxonomy for the live feed.
//!
//! Nothing here is fatal to the host application. Snapshot errors are
//! surfaced verbatim through the read model; stream errors flip the
//! connected flag and pause live updates; side-effect errors are logged and
//! suppressed where they occur.

use thiserror::Error;

/// Failure fetching the point-in-time order snapshot.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// Network-level failure.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with GraphQL errors.
    #[error("GraphQL error: {0}")]
    GraphQl(String),

    /// 200 response with neither data nor errors.
    #[error("no data in snapshot response")]
    MissingData,
}

/// Failure on the mutation event stream.
#[derive(Debug, Error)]
pub enum StreamError {
    /// Transport-level failure (connection reset, bad status).
    #[error("transport error: {0}")]
    Transport(String),

    /// An event frame that could not be decoded.
    #[error("malformed event: {0}")]
    Malformed(#[from] serde_json::Error),
}
