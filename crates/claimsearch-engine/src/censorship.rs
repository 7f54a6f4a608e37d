//! `CensorshipApplier`: ingest-time bulk tagging of blocked/filtered
//! claims and channels, grounded in `SearchIndex.apply_filters`
//! (`elastic_search.py`). Distinct from [`crate::censor_policy`], which
//! is the *consumption*-time filter a [`crate::dispatcher::SessionDispatcher`]
//! runs over an already-fetched result page.

use std::collections::HashMap;

use asupersync::{Cx, Outcome};
use tracing::{debug, info};

use claimsearch_backend::backend::{IndexBackend, KeyedField, UpdateByQuery};
use claimsearch_core::document::Hash20;
use claimsearch_core::error::ClaimSearchError;
use claimsearch_core::types::CensorType;

use crate::config::EngineConfig;

/// See `writer::propagate!` — the same early-return shape, redefined
/// locally since macros are not re-exported across modules by default.
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

/// One admin list: claim/channel hash to the channel hash that is
/// responsible for the block/filter (the reference, blame-attribution
/// channel recorded in `censoring_channel_hash`).
pub type CensorList = HashMap<Hash20, Hash20>;

/// The four admin lists `apply_filters` consumes, named identically.
#[derive(Debug, Clone, Default)]
pub struct FilterLists {
    pub blocked_streams: CensorList,
    pub blocked_channels: CensorList,
    pub filtered_streams: CensorList,
    pub filtered_channels: CensorList,
}

fn to_key_map(list: &CensorList) -> HashMap<String, String> {
    list.iter()
        .map(|(key, value)| {
            (
                claimsearch_core::codec::hash_to_hex(key),
                claimsearch_core::codec::hash_to_hex(value),
            )
        })
        .collect()
}

/// Applies the four filter lists to the index, in the original's fixed
/// order: filtered streams, then filtered channels (claim-keyed pass
/// then channel-keyed pass), then blocked streams, then blocked
/// channels (claim-keyed then channel-keyed) — filter before block
/// matters only insofar as both calls use the `censor_type < N` guard,
/// so a blocked claim is never downgraded back to filtered by a
/// same-run filter call that happens to run second; the original's
/// fixed ordering is preserved rather than re-derived (spec.md §4.4).
/// Refreshes the index after each `update_by_query` call, matching the
/// original's per-call refresh.
pub struct CensorshipApplier<'a, B: IndexBackend> {
    backend: &'a B,
    slices: u32,
}

impl<'a, B: IndexBackend> CensorshipApplier<'a, B> {
    #[must_use]
    pub fn new(backend: &'a B, config: &EngineConfig) -> Self {
        Self { backend, slices: config.update_by_query_slices }
    }

    pub async fn apply(&self, cx: &Cx, lists: &FilterLists) -> Outcome<(), ClaimSearchError> {
        if !lists.filtered_streams.is_empty() {
            propagate!(
                self.update(cx, KeyedField::ClaimId, &lists.filtered_streams, CensorType::Filtered, "filtered_streams")
                    .await
            );
        }
        if !lists.filtered_channels.is_empty() {
            propagate!(
                self.update(cx, KeyedField::ClaimId, &lists.filtered_channels, CensorType::Filtered, "filtered_channels")
                    .await
            );
            propagate!(
                self.update(cx, KeyedField::ChannelId, &lists.filtered_channels, CensorType::Filtered, "filtered_channels")
                    .await
            );
        }
        if !lists.blocked_streams.is_empty() {
            propagate!(
                self.update(cx, KeyedField::ClaimId, &lists.blocked_streams, CensorType::Blocked, "blocked_streams")
                    .await
            );
        }
        if !lists.blocked_channels.is_empty() {
            propagate!(
                self.update(cx, KeyedField::ClaimId, &lists.blocked_channels, CensorType::Blocked, "blocked_channels")
                    .await
            );
            propagate!(
                self.update(cx, KeyedField::ChannelId, &lists.blocked_channels, CensorType::Blocked, "blocked_channels")
                    .await
            );
        }
        Outcome::Ok(())
    }

    async fn update(
        &self,
        cx: &Cx,
        keyed_field: KeyedField,
        list: &CensorList,
        target: CensorType,
        list_kind: &'static str,
    ) -> Outcome<(), ClaimSearchError> {
        let spec = UpdateByQuery {
            keyed_field,
            key_to_censoring_channel: to_key_map(list),
            target_censor_type: target.code(),
            slices: self.slices,
        };
        let result = match self.backend.update_by_query(cx, &spec).await {
            Outcome::Ok(r) => r,
            Outcome::Err(err) => return Outcome::Err(err),
            Outcome::Cancelled(reason) => return Outcome::Cancelled(reason),
            Outcome::Panicked(payload) => return Outcome::Panicked(payload),
        };
        info!(
            target: "claimsearch::censorship",
            list_kind,
            keyed_field = keyed_field.index_field_name(),
            matched = result.updated,
            "applied censorship list"
        );
        match self.backend.refresh(cx).await {
            Outcome::Ok(()) => {}
            Outcome::Err(err) => return Outcome::Err(err),
            Outcome::Cancelled(reason) => return Outcome::Cancelled(reason),
            Outcome::Panicked(payload) => return Outcome::Panicked(payload),
        }
        debug!(target: "claimsearch::censorship", list_kind, "refreshed after update_by_query");
        Outcome::Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use asupersync::runtime::RuntimeBuilder;
    use claimsearch_backend::memory::MemoryBackend;
    use claimsearch_core::document::{ClaimRecord, IndexedDocument};
    use claimsearch_core::types::{ClaimType, StreamType};

    fn block_on<F, Fut, T>(f: F) -> T
    where
        F: FnOnce(Cx) -> Fut,
        Fut: std::future::Future<Output = T>,
    {
        let cx = Cx::for_testing();
        let rt = RuntimeBuilder::current_thread().build().expect("build runtime");
        rt.block_on(f(cx))
    }

    fn ok<T, E: std::fmt::Debug>(outcome: Outcome<T, E>) -> T {
        match outcome {
            Outcome::Ok(v) => v,
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    async fn seed(backend: &MemoryBackend, cx: &Cx, claim_id_byte: u8, channel_id: Option<Hash20>) {
        let record = ClaimRecord {
            claim_hash: [claim_id_byte; 20],
            claim_name: "x".to_owned(),
            short_url: String::new(),
            canonical_url: String::new(),
            channel_hash: channel_id,
            reposted_claim_hash: None,
            signature: None,
            signature_digest: None,
            signature_valid: false,
            public_key_bytes: None,
            public_key_hash: None,
            height: 1,
            creation_height: 1,
            activation_height: 1,
            expiration_height: 1000,
            tx_position: 0,
            txo_hash: [0u8; 36],
            timestamp: 0,
            creation_timestamp: 0,
            release_time: None,
            amount: 1,
            effective_amount: 1,
            support_amount: 0,
            fee_amount: None,
            fee_currency: None,
            claim_type: ClaimType::Stream,
            stream_type: StreamType::Video,
            trending_group: 0,
            trending_mixed: 0.0,
            trending_local: 0.0,
            trending_global: 0.0,
            reposted: 0,
            claims_in_channel: 0,
            title: None,
            author: None,
            description: None,
            media_type: None,
            tags: vec![],
            languages: vec![],
            duration: None,
            is_controlling: false,
            last_take_over_height: 1,
            channel_join: None,
            censor_type: claimsearch_core::types::CensorType::None,
            censoring_channel_hash: None,
        };
        let doc = claimsearch_core::codec::DocumentCodec::to_index(&record);
        ok(backend.bulk(cx, &[claimsearch_backend::response::BulkAction::Upsert(Box::new(doc))]).await);
    }

    fn doc_by_claim_id<'a>(docs: &'a [IndexedDocument], claim_id: &str) -> &'a IndexedDocument {
        docs.iter().find(|d| d.claim_id == claim_id).expect("claim present")
    }

    #[test]
    fn blocking_a_stream_tags_censor_type_two() {
        block_on(|cx| async move {
            let backend = MemoryBackend::new();
            seed(&backend, &cx, 1, None).await;

            let config = EngineConfig::default();
            let applier = CensorshipApplier::new(&backend, &config);
            let mut blocked_streams = CensorList::new();
            blocked_streams.insert([1u8; 20], [9u8; 20]);
            let lists = FilterLists { blocked_streams, ..Default::default() };
            ok(applier.apply(&cx, &lists).await);

            let mget = ok(backend.mget(&cx, &[claimsearch_core::codec::hash_to_hex(&[1u8; 20])], &[]).await);
            let doc = doc_by_claim_id(&mget.found, &claimsearch_core::codec::hash_to_hex(&[1u8; 20]));
            assert_eq!(doc.censor_type, 2);
            assert_eq!(doc.censoring_channel_hash.as_deref(), Some(claimsearch_core::codec::hash_to_hex(&[9u8; 20]).as_str()));
        });
    }

    #[test]
    fn blocking_never_downgrades_an_already_blocked_claim() {
        block_on(|cx| async move {
            let backend = MemoryBackend::new();
            seed(&backend, &cx, 2, None).await;
            let config = EngineConfig::default();
            let applier = CensorshipApplier::new(&backend, &config);

            let mut blocked = CensorList::new();
            blocked.insert([2u8; 20], [9u8; 20]);
            ok(applier.apply(&cx, &FilterLists { blocked_streams: blocked.clone(), ..Default::default() }).await);

            let mut filtered = CensorList::new();
            filtered.insert([2u8; 20], [8u8; 20]);
            ok(applier.apply(&cx, &FilterLists { filtered_streams: filtered, ..Default::default() }).await);

            let mget = ok(backend.mget(&cx, &[claimsearch_core::codec::hash_to_hex(&[2u8; 20])], &[]).await);
            let doc = doc_by_claim_id(&mget.found, &claimsearch_core::codec::hash_to_hex(&[2u8; 20]));
            assert_eq!(doc.censor_type, 2, "blocked claim must not be downgraded to filtered");
        });
    }

    #[test]
    fn blocking_a_channel_tags_both_the_channel_and_its_claims() {
        block_on(|cx| async move {
            let backend = MemoryBackend::new();
            let channel_hash = [3u8; 20];
            seed(&backend, &cx, 3, None).await; // the channel claim itself
            seed(&backend, &cx, 4, Some(channel_hash)).await; // a claim in that channel

            let config = EngineConfig::default();
            let applier = CensorshipApplier::new(&backend, &config);
            let mut blocked_channels = CensorList::new();
            blocked_channels.insert(channel_hash, [9u8; 20]);
            ok(applier.apply(&cx, &FilterLists { blocked_channels, ..Default::default() }).await);

            let channel_claim_id = claimsearch_core::codec::hash_to_hex(&[3u8; 20]);
            let member_claim_id = claimsearch_core::codec::hash_to_hex(&[4u8; 20]);
            let mget = ok(backend.mget(&cx, &[channel_claim_id.clone(), member_claim_id.clone()], &[]).await);
            assert_eq!(doc_by_claim_id(&mget.found, &channel_claim_id).censor_type, 2);
            assert_eq!(doc_by_claim_id(&mget.found, &member_claim_id).censor_type, 2);
        });
    }
}
