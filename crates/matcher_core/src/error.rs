//! Error kinds surfaced by the core.
//!
//! Client-facing errors carry a stable kind tag and no store-internal
//! detail. Internal-only kinds (`CapacityExceeded`, `StaleCandidate`) are
//! not public error types at all — they're absorbed by the engine's scan
//! loop as plain `Option`/`continue` control flow.

use thiserror::Error;

/// Errors the Route Indexer can fail with.
#[derive(Debug, Error)]
pub enum IndexerError {
    #[error("routing API unavailable: {0}")]
    RoutingApiUnavailable(String),

    #[error("routing API returned no usable route")]
    NoRouteFound,

    #[error("routing API request timed out")]
    Timeout,
}

/// Client-facing error kinds returned by the Matching Engine.
///
/// `PoolUnavailable` and `DurableCommitFailed` deliberately do not wrap the
/// underlying adapter error: these payloads carry no store-internal detail.
/// Adapters log the real cause before converting.
#[derive(Debug, Error)]
pub enum MatchError {
    #[error("route indexer unavailable")]
    IndexerUnavailable,

    #[error("pool store unavailable")]
    PoolUnavailable,

    /// The pool-side commit succeeded but the Trip Store transaction did
    /// not. Not actually an error to the caller — the engine still returns
    /// a successful `MatchOutcome` with `trip: None`.
    #[error("durable commit failed after pool commit")]
    DurableCommitFailed,

    /// The request's own passenger or luggage count already exceeds a cap,
    /// independent of any pairing. Rejected before self-registration so it
    /// never enters the pool.
    #[error("request exceeds capacity on its own")]
    RequestExceedsCapacity,
}

impl From<IndexerError> for MatchError {
    fn from(_: IndexerError) -> Self {
        MatchError::IndexerUnavailable
    }
}
