//! [`IndexBackend`]: the trait abstracting the search backend itself —
//! out of scope to implement for real here, but load-bearing enough to
//! need a typed seam. Every method is a suspension point.

use std::collections::HashMap;

use asupersync::{Cx, Outcome};

use claimsearch_core::document::IndexedDocument;
use claimsearch_core::error::ClaimSearchError;
use claimsearch_query::backend_query::BackendQuery;

use crate::response::{BulkAction, BulkResult, ClusterHealthStatus, MultiGetResponse, SearchResponse};
use crate::settings::IndexSettings;

/// Which hash field an [`UpdateByQuery`] call is keyed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyedField {
    ClaimId,
    ChannelId,
}

impl KeyedField {
    #[must_use]
    pub const fn index_field_name(self) -> &'static str {
        match self {
            Self::ClaimId => "claim_id",
            Self::ChannelId => "channel_id",
        }
    }
}

/// The script-based bulk update censorship tagging relies on: stamp
/// `censor_type` and `censoring_channel_hash` onto every document keyed
/// by `keyed_field` whose current `censor_type` is below
/// `target_censor_type`, in one atomic per-document update — splitting
/// this into a read-modify-write round trip would break the
/// monotonicity invariant under concurrent writers.
#[derive(Debug, Clone)]
pub struct UpdateByQuery {
    pub keyed_field: KeyedField,
    /// Maps each matched key (hex hash) to the responsible channel hash
    /// (hex) that should be written into `censoring_channel_hash` for
    /// documents matching that key.
    pub key_to_censoring_channel: HashMap<String, String>,
    pub target_censor_type: u8,
    pub slices: u32,
}

/// The result of an `update_by_query` call.
#[derive(Debug, Clone, Default)]
pub struct UpdateByQueryResult {
    pub updated: u64,
}

/// The pluggable interface to an external full-text/inverted-index store
/// with range queries, terms filters, grouped-by-field collapse, bulk
/// update, update-by-query, and script-based updates (spec.md §1).
///
/// A production implementation speaks to a real backend over the
/// network; [`crate::memory::MemoryBackend`] is an in-process fake
/// sufficient for this crate's own test suite.
pub trait IndexBackend: Send + Sync {
    /// Waits for the backend's cluster health; used by the startup
    /// handshake.
    async fn cluster_health(&self, cx: &Cx) -> Outcome<ClusterHealthStatus, ClaimSearchError>;

    /// Idempotently creates the claims index if it does not already
    /// exist.
    async fn ensure_index(&self, cx: &Cx, settings: &IndexSettings) -> Outcome<(), ClaimSearchError>;

    /// Deletes the claims index. Used by test setup/teardown; no
    /// spec.md component calls this directly.
    async fn delete_index(&self, cx: &Cx) -> Outcome<(), ClaimSearchError>;

    /// Manual refresh — makes recently-written documents visible to
    /// subsequent searches.
    async fn refresh(&self, cx: &Cx) -> Outcome<(), ClaimSearchError>;

    /// Flushes the backend's durable storage.
    async fn flush(&self, cx: &Cx) -> Outcome<(), ClaimSearchError>;

    /// Streams a batch of upserts/deletes.
    async fn bulk(&self, cx: &Cx, actions: &[BulkAction]) -> Outcome<BulkResult, ClaimSearchError>;

    /// Executes a compiled query.
    async fn search(&self, cx: &Cx, query: &BackendQuery) -> Outcome<SearchResponse, ClaimSearchError>;

    /// Multi-get by `claim_id`, excluding the given source fields from
    /// the response.
    async fn mget(
        &self,
        cx: &Cx,
        claim_ids: &[String],
        source_excludes: &[String],
    ) -> Outcome<MultiGetResponse, ClaimSearchError>;

    /// Runs a script-based bulk update (censorship tagging).
    async fn update_by_query(
        &self,
        cx: &Cx,
        spec: &UpdateByQuery,
    ) -> Outcome<UpdateByQueryResult, ClaimSearchError>;

    /// Deletes every document with `height > height`.
    async fn delete_by_query_height_greater_than(
        &self,
        cx: &Cx,
        height: u32,
    ) -> Outcome<u64, ClaimSearchError>;
}
