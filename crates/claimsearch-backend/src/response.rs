//! Response shapes returned by an [`crate::backend::IndexBackend`].

use claimsearch_core::document::IndexedDocument;

/// One hit in a search response. `inner_hits` is populated only when the
/// query used `collapse` (`limit_claims_per_channel`); in that case
/// `doc` is meaningless and the real documents are nested inside
/// `inner_hits`.
#[derive(Debug, Clone)]
pub struct SearchHit {
    pub doc: IndexedDocument,
    pub inner_hits: Option<Vec<SearchHit>>,
}

/// The result of `IndexBackend::search`.
#[derive(Debug, Clone, Default)]
pub struct SearchResponse {
    pub hits: Vec<SearchHit>,
    pub total: u64,
}

/// Recursively flattens a collapse/`inner_hits` result carrier into a
/// flat list of documents. A nested-hit result carrier is flattened
/// recursively before decoding.
///
/// Mirrors the original indexer's `expand_result`: any hit carrying
/// `inner_hits` is not itself a result — its nested hits replace it, and
/// if *any* top-level hit had nested hits, the nested set recurses and
/// wholly supersedes whatever direct hits were collected at this level
/// (consistent, since a collapsed query's every top hit carries
/// `inner_hits`).
#[must_use]
pub fn flatten_collapsed_hits(hits: Vec<SearchHit>) -> Vec<IndexedDocument> {
    let mut direct = Vec::new();
    let mut nested = Vec::new();
    for hit in hits {
        match hit.inner_hits {
            Some(inner) => nested.extend(inner),
            None => direct.push(hit.doc),
        }
    }
    if nested.is_empty() {
        direct
    } else {
        flatten_collapsed_hits(nested)
    }
}

/// The result of `IndexBackend::mget`. Missing ids are simply absent
/// (never an error).
#[derive(Debug, Clone, Default)]
pub struct MultiGetResponse {
    pub found: Vec<IndexedDocument>,
}

/// Which action a single bulk entry performs.
#[derive(Debug, Clone)]
pub enum BulkAction {
    /// `doc_as_upsert=true` update.
    Upsert(Box<IndexedDocument>),
    /// Delete keyed by `claim_id`.
    Delete { claim_id: String },
}

/// Per-item outcome of a bulk call.
#[derive(Debug, Clone)]
pub struct BulkItemResult {
    pub claim_id: String,
    pub error: Option<String>,
}

/// The result of `IndexBackend::bulk`. Individual item failures are
/// carried here, not as an `Err` of the whole call — failures on
/// individual bulk items are logged but do not abort the stream.
#[derive(Debug, Clone, Default)]
pub struct BulkResult {
    pub items: Vec<BulkItemResult>,
}

impl BulkResult {
    #[must_use]
    pub fn failures(&self) -> impl Iterator<Item = &BulkItemResult> {
        self.items.iter().filter(|i| i.error.is_some())
    }
}

/// Cluster-health status, used by the startup handshake
/// (`IndexWriter::start`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ClusterHealthStatus {
    Red,
    Yellow,
    Green,
}

impl ClusterHealthStatus {
    #[must_use]
    pub const fn is_at_least_yellow(self) -> bool {
        matches!(self, Self::Yellow | Self::Green)
    }
}
