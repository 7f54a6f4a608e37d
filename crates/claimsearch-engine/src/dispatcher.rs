//! `SessionDispatcher`: the per-request entry point tying `Resolver`,
//! `QueryCompiler`, and [`crate::censor_policy::Censor`] together.
//! Grounded in `SearchIndex.session_query`/`resolve`/`search`
//! (`elastic_search.py` lines ~142-284).

use asupersync::{Cx, Outcome};
use tracing::{debug, warn};

use claimsearch_backend::backend::IndexBackend;
use claimsearch_core::document::IndexedDocument;
use claimsearch_core::error::ClaimSearchError;
use claimsearch_query::compiler::QueryCompiler;
use claimsearch_query::options::{RangeClause, RangeField, RangeOp, RangeValue, SearchOptions};

use crate::censor_policy::{Censor, CensorContext};
use crate::resolver::Resolver;
use crate::url::{self, ParsedUrl};

/// Mirrors `writer::propagate!`.
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

/// One URL's outcome from [`SessionDispatcher::resolve`]: either the
/// document it resolved to, or the error that replaced it (including a
/// censored result, which is reported as [`ClaimSearchError::Censored`]
/// rather than returned — spec.md §4.6).
#[derive(Debug, Clone)]
pub enum ResolveOutcome {
    Found(Box<IndexedDocument>),
    Err(ClaimSearchError),
}

/// The bundle a `resolve`/`search` session query produces: the primary
/// results (errors substituted for censored/missing urls on the resolve
/// path), the reference-expansion set (channels before reposts), and a
/// tally of anything the [`Censor`] policy hid.
#[derive(Debug, Clone)]
pub struct ResolveResponse {
    pub results: Vec<ResolveOutcome>,
    pub references: Vec<IndexedDocument>,
    pub censored_count: usize,
}

#[derive(Debug, Clone)]
pub struct SearchResponse {
    pub hits: Vec<IndexedDocument>,
    pub references: Vec<IndexedDocument>,
    pub offset: u32,
    pub total: u64,
    pub censored_count: usize,
}

/// Ties a [`Resolver`] and the backend it shares together to answer one
/// session's `resolve`/`search` request. One dispatcher per backend;
/// cheap to construct per request since it borrows rather than owns.
pub struct SessionDispatcher<'a, B: IndexBackend> {
    backend: &'a B,
    resolver: &'a Resolver<'a, B>,
}

impl<'a, B: IndexBackend> SessionDispatcher<'a, B> {
    #[must_use]
    pub fn new(backend: &'a B, resolver: &'a Resolver<'a, B>) -> Self {
        Self { backend, resolver }
    }

    /// Resolves each `lbry://...` url in order. A url that fails to
    /// parse or whose channel/stream segment has no match becomes an
    /// error entry rather than aborting the whole batch — per-url
    /// failure is a value, not an exception (spec.md §7).
    ///
    /// A resolved document whose `censor_type` trips the [`Censor`]
    /// policy is likewise replaced with a
    /// [`ClaimSearchError::Censored`] entry, but still counts toward
    /// the reference-expansion set (the original's `total_referenced`
    /// is built from the raw, pre-censorship results).
    pub async fn resolve(&self, cx: &Cx, urls: &[String]) -> Outcome<ResolveResponse, ClaimSearchError> {
        let mut censor = Censor::new(CensorContext::Resolve);
        let mut raw_found = Vec::new();
        let mut results = Vec::with_capacity(urls.len());

        for raw_url in urls {
            let parsed = match url::parse(raw_url) {
                Ok(parsed) => parsed,
                Err(err) => {
                    results.push(ResolveOutcome::Err(ClaimSearchError::UrlParse {
                        url: raw_url.clone(),
                        reason: err.reason,
                    }));
                    continue;
                }
            };
            match self.resolver.resolve_url(cx, &parsed).await {
                Outcome::Ok(doc) => {
                    raw_found.push(doc.clone());
                    if let Some(channel_hash) = censor.censor(&doc) {
                        warn!(target: "claimsearch::dispatcher", url = %raw_url, channel_hash = %channel_hash, "resolve hid a censored claim");
                        results.push(ResolveOutcome::Err(ClaimSearchError::Censored {
                            censoring_channel_hash: channel_hash,
                        }));
                    } else {
                        results.push(ResolveOutcome::Found(Box::new(doc)));
                    }
                }
                Outcome::Err(err) => results.push(ResolveOutcome::Err(err)),
                Outcome::Cancelled(reason) => return Outcome::Cancelled(reason),
                Outcome::Panicked(payload) => return Outcome::Panicked(payload),
            }
        }

        let references = propagate!(self.resolver.get_referenced_rows(cx, &raw_found).await);
        Outcome::Ok(ResolveResponse { results, references, censored_count: censor.censored_count() })
    }

    /// Compiles `options`, issues the search, and runs the [`Censor`]
    /// policy over the hits. If anything was censored, reruns the same
    /// predicate restricted to `censor_type <= 0` purely for telemetry
    /// (the original's pre-censorship view) — that second result set is
    /// never shown to the caller, only folded into reference expansion
    /// alongside the primary hits (spec.md §4.6).
    pub async fn search(&self, cx: &Cx, options: &SearchOptions) -> Outcome<SearchResponse, ClaimSearchError> {
        let query = QueryCompiler::compile(options);
        let response = propagate!(self.backend.search(cx, &query).await);
        let offset = options.offset.unwrap_or(0);

        let raw_hits = claimsearch_backend::response::flatten_collapsed_hits(response.hits);
        let mut censor = Censor::new(CensorContext::Search);
        let mut reference_seed = raw_hits.clone();
        let hits = censor.apply(raw_hits);

        if censor.is_censored() {
            debug!(
                target: "claimsearch::dispatcher",
                censored = censor.censored_count(),
                "search hid censored hits, rerunning predicate uncensored for telemetry"
            );
            let mut uncensored_options = options.clone();
            uncensored_options.ranges.push(RangeClause {
                field: RangeField::CensorType,
                op: RangeOp::Lte,
                value: RangeValue::Int(0),
            });
            let uncensored_query = QueryCompiler::compile(&uncensored_options);
            let uncensored = propagate!(self.backend.search(cx, &uncensored_query).await);
            reference_seed = claimsearch_backend::response::flatten_collapsed_hits(uncensored.hits);
        }

        let references = propagate!(self.resolver.get_referenced_rows(cx, &reference_seed).await);
        Outcome::Ok(SearchResponse {
            hits,
            references,
            offset,
            total: response.total,
            censored_count: censor.censored_count(),
        })
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

    use crate::config::EngineConfig;

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

    fn record(claim_byte: u8, name: &str, censor_type: CensorType, censoring_channel_hash: Option<[u8; 20]>) -> ClaimRecord {
        ClaimRecord {
            claim_hash: [claim_byte; 20],
            claim_name: name.to_owned(),
            short_url: format!("lbry://{name}"),
            canonical_url: format!("lbry://{name}"),
            channel_hash: None,
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
            claim_type: if name.starts_with('@') { ClaimType::Channel } else { ClaimType::Stream },
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
            is_controlling: true,
            last_take_over_height: 1,
            channel_join: None,
            censor_type,
            censoring_channel_hash,
        }
    }

    async fn seed(backend: &MemoryBackend, cx: &Cx, records: Vec<ClaimRecord>) {
        let actions: Vec<BulkAction> =
            records.iter().map(|r| BulkAction::Upsert(Box::new(DocumentCodec::to_index(r)))).collect();
        ok(backend.bulk(cx, &actions).await);
        ok(backend.refresh(cx).await);
    }

    #[test]
    fn resolve_two_urls_one_censored_reports_one_censored_item() {
        block_on(|cx| async move {
            let backend = MemoryBackend::new();
            seed(
                &backend,
                &cx,
                vec![
                    record(1, "@clean", CensorType::None, None),
                    record(2, "@blocked", CensorType::Blocked, Some([9u8; 20])),
                ],
            )
            .await;

            let config = EngineConfig::default();
            let resolver = Resolver::new(&backend, &config);
            let dispatcher = SessionDispatcher::new(&backend, &resolver);

            let urls = vec!["@clean".to_owned(), "@blocked".to_owned()];
            let response = ok(dispatcher.resolve(&cx, &urls).await);

            assert_eq!(response.censored_count, 1);
            assert_eq!(response.results.len(), 2);
            assert!(matches!(response.results[0], ResolveOutcome::Found(_)));
            assert!(matches!(response.results[1], ResolveOutcome::Err(ClaimSearchError::Censored { .. })));
        });
    }

    #[test]
    fn resolve_an_unparsable_url_is_an_error_entry_not_a_panic() {
        block_on(|cx| async move {
            let backend = MemoryBackend::new();
            let config = EngineConfig::default();
            let resolver = Resolver::new(&backend, &config);
            let dispatcher = SessionDispatcher::new(&backend, &resolver);

            let urls = vec![String::new()];
            let response = ok(dispatcher.resolve(&cx, &urls).await);
            assert!(matches!(response.results[0], ResolveOutcome::Err(ClaimSearchError::UrlParse { .. })));
        });
    }

    #[test]
    fn search_hides_censored_hits_but_still_expands_references() {
        block_on(|cx| async move {
            let backend = MemoryBackend::new();
            seed(
                &backend,
                &cx,
                vec![
                    record(3, "clean-stream", CensorType::None, None),
                    record(4, "blocked-stream", CensorType::Blocked, Some([9u8; 20])),
                ],
            )
            .await;

            let config = EngineConfig::default();
            let resolver = Resolver::new(&backend, &config);
            let dispatcher = SessionDispatcher::new(&backend, &resolver);

            let options = SearchOptions { limit: Some(10), ..SearchOptions::default() };
            let response = ok(dispatcher.search(&cx, &options).await);

            assert_eq!(response.censored_count, 1);
            assert!(response.hits.iter().all(|hit| hit.censor_type == 0));
        });
    }
}
