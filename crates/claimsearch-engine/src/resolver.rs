//! `Resolver`: turns a parsed URL into a resolved claim document,
//! grounded in `SearchIndex.resolve_url`/`resolve_channel_id`/
//! `resolve_stream`/`get_many`/`_get_referenced_rows` (`elastic_search.py`).
//!
//! Two bounded caches — channel lookups and stream lookups — sit in
//! front of the backend, keyed exactly as the original does (spec.md
//! §4.5): `"cid:" + channelSegmentString` for channels,
//! `(channelId or "") + streamSegmentString` for streams. The original
//! runs its event loop cooperatively single-threaded, so a plain dict
//! sufficed; this crate's `Resolver` can be called from multiple tasks
//! at once, so both caches sit behind `std::sync::RwLock` (spec.md §5
//! Open Question).

use std::num::NonZeroUsize;
use std::sync::RwLock;

use asupersync::{Cx, Outcome};
use lru::LruCache;
use tracing::debug;

use claimsearch_backend::backend::IndexBackend;
use claimsearch_core::document::IndexedDocument;
use claimsearch_core::error::ClaimSearchError;
use claimsearch_query::compiler::QueryCompiler;
use claimsearch_query::options::SearchOptions;

use crate::config::EngineConfig;
use crate::url::{ParsedUrl, UrlSegment};

/// Mirrors `writer::propagate!`/`censorship::propagate!`.
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

pub struct Resolver<'a, B: IndexBackend> {
    backend: &'a B,
    channel_cache: RwLock<LruCache<String, String>>,
    stream_cache: RwLock<LruCache<String, IndexedDocument>>,
}

impl<'a, B: IndexBackend> Resolver<'a, B> {
    #[must_use]
    pub fn new(backend: &'a B, config: &EngineConfig) -> Self {
        let channel_size = NonZeroUsize::new(config.channel_cache_size.max(1)).expect("cache size is at least 1");
        let stream_size = NonZeroUsize::new(config.stream_cache_size.max(1)).expect("cache size is at least 1");
        Self {
            backend,
            channel_cache: RwLock::new(LruCache::new(channel_size)),
            stream_cache: RwLock::new(LruCache::new(stream_size)),
        }
    }

    /// Resolves a single parsed URL end to end.
    ///
    /// # Errors
    /// Returns [`ClaimSearchError::ChannelNotFound`]/`StreamNotFound` if
    /// the channel or stream segment has no match.
    pub async fn resolve_url(&self, cx: &Cx, url: &ParsedUrl) -> Outcome<IndexedDocument, ClaimSearchError> {
        let channel_id = match &url.channel {
            Some(segment) => match propagate!(self.resolve_channel_id(cx, segment).await) {
                Some(id) => Some(id),
                None => return Outcome::Err(ClaimSearchError::ChannelNotFound(segment.raw.clone())),
            },
            None => None,
        };

        if let Some(stream_segment) = &url.stream {
            let resolved = propagate!(self.resolve_stream(cx, stream_segment, channel_id.as_deref()).await);
            return match resolved {
                Some(doc) => Outcome::Ok(doc),
                None => Outcome::Err(ClaimSearchError::StreamNotFound(stream_segment.raw.clone())),
            };
        }

        // Channel-only URL: the result is the channel claim itself.
        let channel_id = channel_id.expect("a channel-only url always had a channel segment");
        let mut found = propagate!(self.get_many(cx, std::slice::from_ref(&channel_id)).await);
        match found.pop() {
            Some(doc) => Outcome::Ok(doc),
            None => Outcome::Err(ClaimSearchError::ChannelNotFound(channel_id)),
        }
    }

    /// `resolve_channel_id`: resolves a channel segment to a claim id,
    /// using the full-id fast path, the `"cid:" + raw` cache, and
    /// (falling through to the backend) `is_controlling=true` when
    /// `name` is the only qualifier, else `order_by=['^creation_height']`
    /// (spec.md §4.5).
    pub async fn resolve_channel_id(
        &self,
        cx: &Cx,
        segment: &UrlSegment,
    ) -> Outcome<Option<String>, ClaimSearchError> {
        let cache_key = format!("cid:{}", segment.raw);
        if let Some(cached) = self.channel_cache.write().expect("channel cache lock poisoned").get(&cache_key) {
            debug!(target: "claimsearch::resolver", key = %cache_key, "channel cache hit");
            return Outcome::Ok(Some(cached.clone()));
        }
        debug!(target: "claimsearch::resolver", key = %cache_key, "channel cache miss");

        if let Some(full_id) = segment.full_claim_id() {
            self.channel_cache
                .write()
                .expect("channel cache lock poisoned")
                .put(cache_key, full_id.to_owned());
            return Outcome::Ok(Some(full_id.to_owned()));
        }

        let mut options = segment.base_options();
        if segment.is_name_only() {
            options.is_controlling = Some(true);
        } else {
            options.order_by = vec![claimsearch_query::options::OrderByField {
                field: "creation_height".to_owned(),
                ascending: true,
            }];
        }
        options.limit = Some(1);

        let query = QueryCompiler::compile(&options);
        let response = propagate!(self.backend.search(cx, &query).await);
        let Some(hit) = response.hits.into_iter().next() else {
            return Outcome::Ok(None);
        };
        let channel_id = hit.doc.claim_id;
        self.channel_cache
            .write()
            .expect("channel cache lock poisoned")
            .put(cache_key, channel_id.clone());
        Outcome::Ok(Some(channel_id))
    }

    /// `resolve_stream`: resolves a stream segment, optionally scoped to
    /// `channel_id`. When a channel is present and only `name` is given,
    /// approximates "controlling claim in channel" by sorting on
    /// `effective_amount` then `^height`; otherwise sorts by
    /// `^channel_join` (spec.md §4.5).
    pub async fn resolve_stream(
        &self,
        cx: &Cx,
        segment: &UrlSegment,
        channel_id: Option<&str>,
    ) -> Outcome<Option<IndexedDocument>, ClaimSearchError> {
        if let Some(full_id) = segment.full_claim_id() {
            let mut found = propagate!(self.get_many(cx, std::slice::from_ref(&full_id.to_owned())).await);
            return Outcome::Ok(found.pop());
        }

        let cache_key = format!("{}{}", channel_id.unwrap_or(""), segment.raw);
        if let Some(cached) = self.stream_cache.write().expect("stream cache lock poisoned").get(&cache_key) {
            debug!(target: "claimsearch::resolver", key = %cache_key, "stream cache hit");
            return Outcome::Ok(Some(cached.clone()));
        }
        debug!(target: "claimsearch::resolver", key = %cache_key, "stream cache miss");

        let mut options = segment.base_options();
        if let Some(channel_id) = channel_id {
            if segment.is_name_only() {
                options.order_by = vec![
                    claimsearch_query::options::OrderByField { field: "effective_amount".to_owned(), ascending: false },
                    claimsearch_query::options::OrderByField { field: "height".to_owned(), ascending: true },
                ];
            } else {
                options.order_by = vec![claimsearch_query::options::OrderByField {
                    field: "channel_join".to_owned(),
                    ascending: true,
                }];
            }
            options.channel_ids = Some(vec![channel_id.to_owned()]);
            options.signature_predicate = Some(claimsearch_query::options::SignaturePredicate::ValidityOnly(true));
        } else if segment.is_name_only() {
            options.is_controlling = Some(true);
        }
        options.limit = Some(1);

        let query = QueryCompiler::compile(&options);
        let response = propagate!(self.backend.search(cx, &query).await);
        let Some(hit) = response.hits.into_iter().next() else {
            return Outcome::Ok(None);
        };
        self.stream_cache
            .write()
            .expect("stream cache lock poisoned")
            .put(cache_key, hit.doc.clone());
        Outcome::Ok(Some(hit.doc))
    }

    /// `get_many`: multi-get by claim id, through the search cache. The
    /// original keys this by its single `search_cache`; this crate
    /// reuses `stream_cache` for the same purpose (spec.md §4.5 does
    /// not distinguish a third cache).
    pub async fn get_many(
        &self,
        cx: &Cx,
        claim_ids: &[String],
    ) -> Outcome<Vec<IndexedDocument>, ClaimSearchError> {
        let mut found = Vec::with_capacity(claim_ids.len());
        let mut missing = Vec::new();
        {
            let mut cache = self.stream_cache.write().expect("stream cache lock poisoned");
            for id in claim_ids {
                match cache.get(id) {
                    Some(doc) => found.push(doc.clone()),
                    None => missing.push(id.clone()),
                }
            }
        }
        if missing.is_empty() {
            return Outcome::Ok(found);
        }

        let response = propagate!(self.backend.mget(cx, &missing, &["description".to_owned(), "title".to_owned()]).await);
        {
            let mut cache = self.stream_cache.write().expect("stream cache lock poisoned");
            for doc in &response.found {
                cache.put(doc.claim_id.clone(), doc.clone());
            }
        }
        found.extend(response.found);
        Outcome::Ok(found)
    }

    /// `_get_referenced_rows`: given a page of resolved/searched
    /// documents, fetches the channels and reposts those documents
    /// reference, in the order the client-side inflation step depends
    /// on — channels before reposts (spec.md §4.6, and explicit in the
    /// original's own comment).
    pub async fn get_referenced_rows(
        &self,
        cx: &Cx,
        docs: &[IndexedDocument],
    ) -> Outcome<Vec<IndexedDocument>, ClaimSearchError> {
        let mut repost_ids: Vec<String> = docs.iter().filter_map(|d| d.reposted_claim_id.clone()).collect();
        repost_ids.sort();
        repost_ids.dedup();

        let mut channel_ids: Vec<String> = docs.iter().filter_map(|d| d.channel_id.clone()).collect();
        channel_ids.extend(docs.iter().filter_map(|d| d.censoring_channel_hash.clone()));

        let reposted_docs = if repost_ids.is_empty() {
            Vec::new()
        } else {
            let reposted = propagate!(self.get_many(cx, &repost_ids).await);
            channel_ids.extend(reposted.iter().filter_map(|d| d.channel_id.clone()));
            reposted
        };

        channel_ids.sort();
        channel_ids.dedup();
        let channel_docs = if channel_ids.is_empty() {
            Vec::new()
        } else {
            propagate!(self.get_many(cx, &channel_ids).await)
        };

        // channels must come first for client side inflation to work properly
        let mut combined = channel_docs;
        combined.extend(reposted_docs);
        Outcome::Ok(combined)
    }

    /// Clears both caches; called by `IndexWriter::flush` after a
    /// successful write (spec.md §4.3, §4.5).
    pub fn clear_caches(&self) {
        self.channel_cache.write().expect("channel cache lock poisoned").clear();
        self.stream_cache.write().expect("stream cache lock poisoned").clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use asupersync::runtime::RuntimeBuilder;
    use claimsearch_backend::memory::MemoryBackend;
    use claimsearch_backend::response::BulkAction;
    use claimsearch_core::codec::DocumentCodec;
    use claimsearch_core::document::ClaimRecord;
    use claimsearch_core::types::{CensorType, ClaimType, StreamType};

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

    fn record(claim_byte: u8, name: &str, channel: Option<[u8; 20]>, is_controlling: bool) -> ClaimRecord {
        ClaimRecord {
            claim_hash: [claim_byte; 20],
            claim_name: name.to_owned(),
            short_url: format!("lbry://{name}"),
            canonical_url: format!("lbry://{name}"),
            channel_hash: channel,
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
            claim_type: if channel.is_none() && name.starts_with('@') { ClaimType::Channel } else { ClaimType::Stream },
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
            is_controlling,
            last_take_over_height: 1,
            channel_join: None,
            censor_type: CensorType::None,
            censoring_channel_hash: None,
        }
    }

    async fn seed(backend: &MemoryBackend, cx: &Cx, records: Vec<ClaimRecord>) {
        let actions: Vec<BulkAction> =
            records.iter().map(|r| BulkAction::Upsert(Box::new(DocumentCodec::to_index(r)))).collect();
        ok(backend.bulk(cx, &actions).await);
        ok(backend.refresh(cx).await);
    }

    #[test]
    fn resolves_a_controlling_channel_by_name() {
        block_on(|cx| async move {
            let backend = MemoryBackend::new();
            seed(&backend, &cx, vec![record(1, "@alice", None, true)]).await;

            let config = EngineConfig::default();
            let resolver = Resolver::new(&backend, &config);
            let url = crate::url::parse("@alice").unwrap();
            let doc = ok(resolver.resolve_url(&cx, &url).await);
            assert_eq!(doc.claim_name, "@alice");
        });
    }

    #[test]
    fn resolves_a_stream_within_a_channel() {
        block_on(|cx| async move {
            let backend = MemoryBackend::new();
            let channel_hash = [2u8; 20];
            seed(
                &backend,
                &cx,
                vec![record(2, "@bob", None, true), record(3, "song", Some(channel_hash), false)],
            )
            .await;

            let config = EngineConfig::default();
            let resolver = Resolver::new(&backend, &config);
            let url = crate::url::parse("@bob/song").unwrap();
            let doc = ok(resolver.resolve_url(&cx, &url).await);
            assert_eq!(doc.claim_name, "song");
        });
    }

    #[test]
    fn missing_channel_is_an_error() {
        block_on(|cx| async move {
            let backend = MemoryBackend::new();
            let config = EngineConfig::default();
            let resolver = Resolver::new(&backend, &config);
            let url = crate::url::parse("@nobody").unwrap();
            let result = resolver.resolve_url(&cx, &url).await;
            assert!(matches!(result, Outcome::Err(ClaimSearchError::ChannelNotFound(_))));
        });
    }

    #[test]
    fn get_referenced_rows_orders_channels_before_reposts() {
        block_on(|cx| async move {
            let backend = MemoryBackend::new();
            let channel_hash = [5u8; 20];
            let original = record(6, "original", Some(channel_hash), false);
            let mut repost = record(7, "repost-of-original", Some(channel_hash), false);
            repost.reposted_claim_hash = Some([6u8; 20]);
            seed(&backend, &cx, vec![record(5, "@carl", None, true), original, repost]).await;

            let config = EngineConfig::default();
            let resolver = Resolver::new(&backend, &config);
            let repost_doc = DocumentCodec::to_index(&record(7, "repost-of-original", Some(channel_hash), false));
            let referenced = ok(resolver.get_referenced_rows(&cx, std::slice::from_ref(&repost_doc)).await);
            // channels must come first for client side inflation to work properly
            assert!(!referenced.is_empty());
            assert_eq!(referenced[0].claim_name, "@carl");
        });
    }
}
