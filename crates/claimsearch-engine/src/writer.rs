//! `IndexWriter`: the ingest-side half of the engine. Owns the
//! bulk-upsert queue, the cluster-health startup handshake, and the
//! `deleteAboveHeight` reorg hook — grounded in the original indexer's
//! `SearchIndex.start`/`sync_queue`/`delete_above_height`
//! (`elastic_search.py`) and, for the queue/flush shape itself, the
//! teacher's `IncrementalUpdater` (`mcp-agent-mail-search-core::updater`).

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use asupersync::{Cx, Outcome};
use tracing::{debug, info, warn};

use claimsearch_backend::backend::IndexBackend;
use claimsearch_backend::response::BulkAction;
use claimsearch_backend::settings::IndexSettings;
use claimsearch_core::codec::DocumentCodec;
use claimsearch_core::document::DocChange;
use claimsearch_core::error::ClaimSearchError;

use crate::config::EngineConfig;

/// Early-returns a non-`Ok` `Outcome` from the enclosing async fn,
/// unwrapping the `Ok` value otherwise. Mirrors the teacher's repeated
/// `match outcome { Ok(v) => v, Err(e) => return Err(e), Cancelled(r)
/// => return Cancelled(r), Panicked(p) => return Panicked(p) }` blocks
/// (`mcp-agent-mail-db::search_service`) without restating it at every
/// await point.
macro_rules! propagate {
    ($outcome:expr) => {
        match $outcome {
            Outcome::Ok(value) => value,
            Outcome::Err(err) => return Outcome::Err(err),
            Outcome::Cancelled(reason) => return Outcome::Cancelled(reason),
            Outcome::Panicked(payload) => return Outcome::Panicked(payload),
        }
    };
}

struct PendingState {
    changes: VecDeque<DocChange>,
}

/// Owns the pending-change queue and drives it into an [`IndexBackend`].
///
/// One `IndexWriter` per process. `start` performs the cluster-health
/// handshake and index creation once; `enqueue` is cheap and
/// lock-scoped; `flush` is the only method that talks to the backend.
///
/// The original indexer is one class owning both the write queue and
/// the resolver caches, so a successful `sync_queue` can clear them
/// directly. Here `IndexWriter` and `Resolver` are separate types (each
/// borrowing/owning its own handle to the backend), so the cache clear
/// is wired through an optional hook set at construction time rather
/// than a direct field reference — see `DESIGN.md`.
pub struct IndexWriter<B: IndexBackend> {
    backend: B,
    config: EngineConfig,
    pending: Mutex<PendingState>,
    cache_invalidation_hook: Option<Box<dyn Fn() + Send + Sync>>,
}

impl<B: IndexBackend> IndexWriter<B> {
    #[must_use]
    pub fn new(backend: B, config: EngineConfig) -> Self {
        Self {
            backend,
            config,
            pending: Mutex::new(PendingState { changes: VecDeque::new() }),
            cache_invalidation_hook: None,
        }
    }

    /// Registers a hook run after every successful non-empty `flush` —
    /// the composing service wires a `Resolver::clear_caches` closure
    /// here so a bulk write invalidates the resolver's caches the
    /// instant it becomes visible (spec.md §4.3, §4.5).
    #[must_use]
    pub fn with_cache_invalidation_hook(mut self, hook: impl Fn() + Send + Sync + 'static) -> Self {
        self.cache_invalidation_hook = Some(Box::new(hook));
        self
    }

    /// Waits for the backend to report at least yellow cluster health,
    /// retrying indefinitely on connection failure (spec.md §11), then
    /// idempotently creates the claims index.
    ///
    /// There is no `ConnectionPending` error variant (spec.md §7) —
    /// a backend connection failure during the handshake is just
    /// another iteration of this loop, logged and retried, never
    /// surfaced to the caller.
    pub async fn start(&self, cx: &Cx) -> Outcome<(), ClaimSearchError> {
        loop {
            match self.backend.cluster_health(cx).await {
                Outcome::Ok(status) if status.is_at_least_yellow() => break,
                Outcome::Ok(_) => {
                    warn!(target: "claimsearch::writer", "cluster health below yellow, waiting");
                }
                Outcome::Err(err) => {
                    warn!(target: "claimsearch::writer", error = %err, "failed to reach backend, waiting");
                }
                Outcome::Cancelled(reason) => return Outcome::Cancelled(reason),
                Outcome::Panicked(payload) => return Outcome::Panicked(payload),
            }
            if cx.checkpoint().is_err() {
                return Outcome::Ok(());
            }
            asupersync::time::sleep(Duration::from_secs(self.config.cluster_health_poll_secs)).await;
        }

        let settings = IndexSettings::claims_index(&self.config.index_prefix);
        self.backend.ensure_index(cx, &settings).await
    }

    /// Appends a single change to the pending queue. Does not talk to
    /// the backend.
    pub fn enqueue(&self, change: DocChange) {
        let mut state = self.pending.lock().expect("writer queue lock poisoned");
        state.changes.push_back(change);
    }

    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.pending.lock().expect("writer queue lock poisoned").changes.len()
    }

    /// Drains the pending queue and streams it to the backend as a
    /// single bulk call, bracketed by refresh/flush and a cache clear —
    /// `SearchIndex.sync_queue`'s exact shape: refresh before the bulk
    /// stream (so deletes racing with an in-flight search are visible),
    /// refresh again after, then flush, then drop anything the
    /// resolver/dispatcher have cached (spec.md §4.3).
    pub async fn flush(&self, cx: &Cx) -> Outcome<(), ClaimSearchError> {
        let changes: Vec<DocChange> = {
            let mut state = self.pending.lock().expect("writer queue lock poisoned");
            state.changes.drain(..).collect()
        };
        if changes.is_empty() {
            return Outcome::Ok(());
        }

        debug!(target: "claimsearch::writer", count = changes.len(), "flushing pending changes");
        propagate!(self.backend.refresh(cx).await);

        let actions: Vec<BulkAction> = changes
            .into_iter()
            .map(|change| match change {
                DocChange::Upsert(record) => BulkAction::Upsert(Box::new(DocumentCodec::to_index(&record))),
                DocChange::Delete { claim_id } => {
                    BulkAction::Delete { claim_id: claimsearch_core::codec::hash_to_hex(&claim_id) }
                }
            })
            .collect();

        debug!(target: "claimsearch::writer", count = actions.len(), "streaming bulk actions");
        let result = propagate!(self.backend.bulk(cx, &actions).await);
        for failure in result.failures() {
            warn!(
                target: "claimsearch::writer",
                claim_id = %failure.claim_id,
                reason = failure.error.as_deref().unwrap_or("unknown"),
                "bulk item failed"
            );
        }

        propagate!(self.backend.refresh(cx).await);
        propagate!(self.backend.flush(cx).await);

        if let Some(hook) = &self.cache_invalidation_hook {
            hook();
        }

        Outcome::Ok(())
    }

    /// Deletes every claim above `height` — the reorg-rollback hook.
    /// Logged once, since it is a rare, consequential operation rather
    /// than routine traffic (spec.md §10.1).
    pub async fn delete_above_height(&self, cx: &Cx, height: u32) -> Outcome<(), ClaimSearchError> {
        let deleted = propagate!(self.backend.delete_by_query_height_greater_than(cx, height).await);
        info!(target: "claimsearch::writer", height, deleted, "deleted claims above height");
        propagate!(self.backend.refresh(cx).await);
        if let Some(hook) = &self.cache_invalidation_hook {
            hook();
        }
        Outcome::Ok(())
    }

    /// Tears the writer down: flushes whatever is still pending so no
    /// enqueued change is silently dropped, on every exit path
    /// including a `start` that never finished the cluster-health
    /// handshake (spec.md §5 "guaranteed close"). Safe to call more than
    /// once — a second call just flushes an empty queue.
    pub async fn stop(&self, cx: &Cx) -> Outcome<(), ClaimSearchError> {
        propagate!(self.flush(cx).await);
        info!(target: "claimsearch::writer", "writer stopped");
        Outcome::Ok(())
    }

    #[must_use]
    pub fn backend(&self) -> &B {
        &self.backend
    }
}

/// RAII safety net layered over the explicit async [`IndexWriter::stop`]
/// (spec.md §5 "guaranteed close"): `Drop` cannot run an async flush
/// (the handle may be dropped outside any runtime, or a panic may be
/// unwinding through it), so it only warns if the caller forgot to call
/// `stop` with changes still pending — the diagnostic of last resort,
/// not a substitute for calling `stop`.
pub struct WriterHandle<B: IndexBackend + 'static> {
    writer: std::sync::Arc<IndexWriter<B>>,
}

impl<B: IndexBackend + 'static> WriterHandle<B> {
    #[must_use]
    pub fn new(writer: std::sync::Arc<IndexWriter<B>>) -> Self {
        Self { writer }
    }

    #[must_use]
    pub fn writer(&self) -> &std::sync::Arc<IndexWriter<B>> {
        &self.writer
    }
}

impl<B: IndexBackend + 'static> Drop for WriterHandle<B> {
    fn drop(&mut self) {
        if self.writer.pending_count() == 0 {
            return;
        }
        warn!(
            target: "claimsearch::writer",
            pending = self.writer.pending_count(),
            "writer handle dropped with pending changes unflushed"
        );
    }
}
