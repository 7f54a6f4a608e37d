//! `Censor`: the consumption-time filter [`crate::dispatcher::SessionDispatcher`]
//! runs over already-fetched results.
//!
//! Distinct from [`crate::censorship::CensorshipApplier`], which tags
//! documents at ingest time. `original_source/` does not ship
//! `lbry/schema/result.py` (only `elastic_search.py`, which imports
//! `Censor` from it, was retrieved), so this module's shape is this
//! crate's own design rather than a port — see `DESIGN.md` "Open
//! Question Decisions" for the threshold choice below.

use claimsearch_core::document::IndexedDocument;

/// Which call site is running the policy — kept distinct because a
/// future severity split (e.g. resolve tolerating filtered but not
/// blocked) hangs off this, even though both contexts currently censor
/// at the same threshold (see `DESIGN.md`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CensorContext {
    Resolve,
    Search,
}

/// One censored item: the claim id that was hidden and the channel
/// responsible for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CensoredItem {
    pub claim_id: String,
    pub censoring_channel_hash: String,
}

/// Tracks how many documents a resolve/search call censored, and which.
/// Mutates as `censor`/`apply` are called against a batch of documents.
#[derive(Debug, Clone)]
pub struct Censor {
    context: CensorContext,
    censored: Vec<CensoredItem>,
}

impl Censor {
    #[must_use]
    pub fn new(context: CensorContext) -> Self {
        Self { context, censored: Vec::new() }
    }

    #[must_use]
    pub fn context(&self) -> CensorContext {
        self.context
    }

    #[must_use]
    pub fn censored_count(&self) -> usize {
        self.censored.len()
    }

    #[must_use]
    pub fn is_censored(&self) -> bool {
        !self.censored.is_empty()
    }

    #[must_use]
    pub fn censored_items(&self) -> &[CensoredItem] {
        &self.censored
    }

    /// Tests a single document against the policy, recording it if it
    /// is censored. Returns the responsible channel hash when censored.
    ///
    /// A document is censored when `censor_type >= 1` (filtered or
    /// blocked) AND a `censoring_channel_hash` was actually stamped —
    /// the latter should always be present whenever `censor_type > 0`
    /// (an invariant `CensorshipApplier` upholds), but the check guards
    /// against a document that was tagged by some other path.
    pub fn censor(&mut self, doc: &IndexedDocument) -> Option<String> {
        if doc.censor_type == 0 {
            return None;
        }
        let hash = doc.censoring_channel_hash.clone()?;
        self.censored.push(CensoredItem { claim_id: doc.claim_id.clone(), censoring_channel_hash: hash.clone() });
        Some(hash)
    }

    /// Applies the policy to a batch, returning only the uncensored
    /// documents. Censored ones are recorded (`censored_items`) but
    /// dropped from the returned vector — `SessionDispatcher::search`
    /// uses this to produce the primary (censored) result page.
    pub fn apply(&mut self, docs: Vec<IndexedDocument>) -> Vec<IndexedDocument> {
        docs.into_iter().filter(|doc| self.censor(doc).is_none()).collect()
    }
}
