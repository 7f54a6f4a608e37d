//! Error types surfaced by the claim search engine.

use thiserror::Error;

/// Result type alias used throughout the engine.
pub type ClaimSearchResult<T> = std::result::Result<T, ClaimSearchError>;

/// Errors the engine can surface to its caller.
///
/// Per-URL resolution errors are carried as values (see
/// `claimsearch-engine::resolver`), not raised as this type; `UrlParse`,
/// `ChannelNotFound`, `StreamNotFound`, and `Censored` below are the
/// payloads those values wrap when they do need a uniform error type (for
/// example inside a batched `resolve` response).
#[derive(Debug, Error)]
pub enum ClaimSearchError {
    /// A resolve URL failed to parse.
    #[error("failed to parse url {url:?}: {reason}")]
    UrlParse { url: String, reason: String },

    /// Channel segment resolution found no matching claim.
    #[error("channel not found for url {0:?}")]
    ChannelNotFound(String),

    /// Stream segment resolution found no matching claim.
    #[error("stream not found for url {0:?}")]
    StreamNotFound(String),

    /// The resolved claim is censored by the given channel.
    #[error("result censored by channel {censoring_channel_hash}")]
    Censored {
        censoring_channel_hash: String,
    },

    /// The backend index does not exist yet, or the backend reports the
    /// index as not-found. Search degrades to an empty page rather than
    /// propagating this (spec.md §7); it is surfaced here for ingest-path
    /// callers, who are responsible for retrying.
    #[error("backend unavailable: {0}")]
    BackendUnavailable(String),

    /// A single bulk item failed. Logged, not fatal; the queue entry is
    /// dropped and the ingester is expected to resubmit.
    #[error("bulk item failed for claim {claim_id}: {reason}")]
    BulkItemFailed { claim_id: String, reason: String },

    /// Any other backend or internal failure.
    #[error("internal error: {0}")]
    Internal(String),

    /// Serialization error surfaced while encoding/decoding a document.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ClaimSearchError {
    /// Machine-readable classification, suitable for JSON error envelopes.
    #[must_use]
    pub const fn error_type(&self) -> &'static str {
        match self {
            Self::UrlParse { .. } => "URL_PARSE_ERROR",
            Self::ChannelNotFound(_) => "CHANNEL_NOT_FOUND",
            Self::StreamNotFound(_) => "STREAM_NOT_FOUND",
            Self::Censored { .. } => "CENSORED",
            Self::BackendUnavailable(_) => "BACKEND_UNAVAILABLE",
            Self::BulkItemFailed { .. } => "BULK_ITEM_FAILED",
            Self::Internal(_) => "INTERNAL_ERROR",
            Self::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }

    /// Whether the error represents a transient condition worth retrying.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::BackendUnavailable(_) | Self::BulkItemFailed { .. })
    }
}
