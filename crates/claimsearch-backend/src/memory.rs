//! [`MemoryBackend`]: an in-process [`IndexBackend`] fake.
//!
//! Sufficient for this crate's own test suite and for local development;
//! it evaluates the compiled [`BackendQuery`] directly against an
//! in-memory map rather than shipping it over the wire, so it does not
//! need the real mapping/analyzer settings `ensure_index` is handed (it
//! just records that the index was created).

use std::sync::RwLock;

use asupersync::{Cx, Outcome};
use indexmap::IndexMap;
use serde_json::Value;

use claimsearch_core::document::IndexedDocument;
use claimsearch_core::error::ClaimSearchError;
use claimsearch_query::backend_query::{BackendQuery, BoolClause, Clause, ClauseValue, RangeOp, SortOrder};

use crate::backend::{IndexBackend, KeyedField, UpdateByQuery, UpdateByQueryResult};
use crate::response::{
    BulkAction, BulkItemResult, BulkResult, ClusterHealthStatus, MultiGetResponse, SearchHit,
    SearchResponse,
};
use crate::settings::IndexSettings;

#[derive(Default)]
struct State {
    docs: IndexMap<String, IndexedDocument>,
    index_created: bool,
}

/// An in-memory `IndexBackend`. Always reports cluster health as green
/// and never fails a bulk item — it exists to exercise the compiler,
/// the writer, the censorship applier, and the resolver end-to-end in
/// tests, not to model backend failure modes.
#[derive(Default)]
pub struct MemoryBackend {
    state: RwLock<State>,
}

impl MemoryBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Test/debug helper: the number of documents currently stored.
    #[must_use]
    pub fn doc_count(&self) -> usize {
        self.state.read().expect("memory backend lock poisoned").docs.len()
    }
}

fn doc_to_json(doc: &IndexedDocument) -> Value {
    serde_json::to_value(doc).expect("IndexedDocument always serializes")
}

fn field_value<'a>(doc_json: &'a Value, field: &str) -> Option<&'a Value> {
    let base = field.strip_suffix(".keyword").unwrap_or(field);
    doc_json.get(base)
}

fn value_contains(v: &Value, cv: &ClauseValue) -> bool {
    match v {
        Value::Array(items) => items.iter().any(|item| scalar_eq(item, cv)),
        other => scalar_eq(other, cv),
    }
}

fn scalar_eq(v: &Value, cv: &ClauseValue) -> bool {
    match cv {
        ClauseValue::Str(s) => v.as_str().is_some_and(|x| x == s),
        ClauseValue::Int(i) => v.as_i64().is_some_and(|x| x == *i) || v.as_u64().is_some_and(|x| i64::try_from(x) == Ok(*i)),
        ClauseValue::Float(f) => v.as_f64().is_some_and(|x| (x - f).abs() < f64::EPSILON),
        ClauseValue::Bool(b) => v.as_bool().is_some_and(|x| x == *b),
    }
}

fn as_f64(v: &Value) -> Option<f64> {
    v.as_f64()
}

fn range_ok(v: &Value, op: RangeOp, cv: &ClauseValue) -> bool {
    let target = match cv {
        ClauseValue::Int(i) => *i as f64,
        ClauseValue::Float(f) => *f,
        _ => return false,
    };
    let Some(actual) = as_f64(v) else { return false };
    match op {
        RangeOp::Lt => actual < target,
        RangeOp::Lte => actual <= target,
        RangeOp::Gt => actual > target,
        RangeOp::Gte => actual >= target,
    }
}

fn matches_clause(doc_json: &Value, clause: &Clause) -> bool {
    match clause {
        Clause::Term { field, value } => field_value(doc_json, field).is_some_and(|v| value_contains(v, value)),
        Clause::Terms { field, values } => {
            field_value(doc_json, field).is_some_and(|v| values.iter().any(|cv| value_contains(v, cv)))
        }
        Clause::Prefix { field, value } => field_value(doc_json, field)
            .and_then(Value::as_str)
            .is_some_and(|s| s.starts_with(value.as_str())),
        Clause::Range { field, op, value } => field_value(doc_json, field).is_some_and(|v| range_ok(v, *op, value)),
        Clause::Exists { field } => field_value(doc_json, field).is_some_and(|v| !v.is_null()),
        Clause::SimpleQueryString { query, fields } => {
            let query_lower = query.to_lowercase();
            let terms: Vec<&str> = query_lower.split_whitespace().collect();
            fields.iter().any(|(f, _weight)| {
                field_value(doc_json, f)
                    .and_then(Value::as_str)
                    .is_some_and(|s| {
                        let s_lower = s.to_lowercase();
                        terms.iter().any(|t| s_lower.contains(t))
                    })
            })
        }
        Clause::Not(inner) => !matches_clause(doc_json, inner),
    }
}

fn matches_bool(doc_json: &Value, bool_clause: &BoolClause) -> bool {
    let must_ok = bool_clause.must.iter().all(|c| matches_clause(doc_json, c));
    let must_not_ok = bool_clause.must_not.iter().all(|c| !matches_clause(doc_json, c));
    let should_ok = if bool_clause.should.is_empty() {
        true
    } else {
        let min = bool_clause.minimum_should_match.unwrap_or(1) as usize;
        let satisfied = bool_clause.should.iter().filter(|c| matches_clause(doc_json, c)).count();
        satisfied >= min
    };
    must_ok && must_not_ok && should_ok
}

fn compare_by_sort(a: &IndexedDocument, b: &IndexedDocument, query: &BackendQuery) -> std::cmp::Ordering {
    let a_json = doc_to_json(a);
    let b_json = doc_to_json(b);
    for sort_field in &query.sort {
        let av = field_value(&a_json, &sort_field.field);
        let bv = field_value(&b_json, &sort_field.field);
        let ordering = match (av, bv) {
            (Some(av), Some(bv)) => match (as_f64(av), as_f64(bv)) {
                (Some(af), Some(bf)) => af.partial_cmp(&bf).unwrap_or(std::cmp::Ordering::Equal),
                _ => av.as_str().unwrap_or_default().cmp(bv.as_str().unwrap_or_default()),
            },
            _ => std::cmp::Ordering::Equal,
        };
        let ordering = if sort_field.order == SortOrder::Asc { ordering } else { ordering.reverse() };
        if ordering != std::cmp::Ordering::Equal {
            return ordering;
        }
    }
    std::cmp::Ordering::Equal
}

fn apply_source_excludes(mut doc: IndexedDocument, excludes: &[String]) -> IndexedDocument {
    if excludes.iter().any(|f| f == "description") {
        doc.description = None;
    }
    if excludes.iter().any(|f| f == "title") {
        doc.title = None;
    }
    doc
}

impl IndexBackend for MemoryBackend {
    async fn cluster_health(&self, _cx: &Cx) -> Outcome<ClusterHealthStatus, ClaimSearchError> {
        Outcome::Ok(ClusterHealthStatus::Green)
    }

    async fn ensure_index(&self, _cx: &Cx, _settings: &IndexSettings) -> Outcome<(), ClaimSearchError> {
        self.state.write().expect("lock poisoned").index_created = true;
        Outcome::Ok(())
    }

    async fn delete_index(&self, _cx: &Cx) -> Outcome<(), ClaimSearchError> {
        let mut state = self.state.write().expect("lock poisoned");
        state.docs.clear();
        state.index_created = false;
        Outcome::Ok(())
    }

    async fn refresh(&self, _cx: &Cx) -> Outcome<(), ClaimSearchError> {
        Outcome::Ok(())
    }

    async fn flush(&self, _cx: &Cx) -> Outcome<(), ClaimSearchError> {
        Outcome::Ok(())
    }

    async fn bulk(&self, _cx: &Cx, actions: &[BulkAction]) -> Outcome<BulkResult, ClaimSearchError> {
        let mut state = self.state.write().expect("lock poisoned");
        let mut items = Vec::with_capacity(actions.len());
        for action in actions {
            match action {
                BulkAction::Upsert(doc) => {
                    items.push(BulkItemResult { claim_id: doc.claim_id.clone(), error: None });
                    state.docs.insert(doc.claim_id.clone(), (**doc).clone());
                }
                BulkAction::Delete { claim_id } => {
                    items.push(BulkItemResult { claim_id: claim_id.clone(), error: None });
                    state.docs.shift_remove(claim_id);
                }
            }
        }
        Outcome::Ok(BulkResult { items })
    }

    async fn search(&self, _cx: &Cx, query: &BackendQuery) -> Outcome<SearchResponse, ClaimSearchError> {
        let state = self.state.read().expect("lock poisoned");
        let mut matched: Vec<IndexedDocument> = state
            .docs
            .values()
            .filter(|doc| matches_bool(&doc_to_json(doc), &query.query))
            .cloned()
            .collect();
        matched.sort_by(|a, b| compare_by_sort(a, b, query));
        let total = matched.len() as u64;

        let hits: Vec<SearchHit> = if let Some(collapse) = &query.collapse {
            let mut groups: IndexMap<String, Vec<IndexedDocument>> = IndexMap::new();
            for doc in matched {
                let key = field_value(&doc_to_json(&doc), &collapse.field)
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_owned();
                groups.entry(key).or_default().push(doc);
            }
            groups
                .into_values()
                .map(|mut members| {
                    members.truncate(collapse.inner_hits.size as usize);
                    let inner = members
                        .into_iter()
                        .map(|doc| SearchHit {
                            doc: apply_source_excludes(doc, &query.source_excludes),
                            inner_hits: None,
                        })
                        .collect::<Vec<_>>();
                    let placeholder = inner[0].doc.clone();
                    SearchHit { doc: placeholder, inner_hits: Some(inner) }
                })
                .collect()
        } else {
            matched
                .into_iter()
                .map(|doc| SearchHit { doc: apply_source_excludes(doc, &query.source_excludes), inner_hits: None })
                .collect()
        };

        let from = query.from.unwrap_or(0) as usize;
        let size = query.size.map_or(hits.len(), |s| s as usize);
        let page: Vec<SearchHit> = hits.into_iter().skip(from).take(size).collect();

        Outcome::Ok(SearchResponse { hits: page, total })
    }

    async fn mget(
        &self,
        _cx: &Cx,
        claim_ids: &[String],
        source_excludes: &[String],
    ) -> Outcome<MultiGetResponse, ClaimSearchError> {
        let state = self.state.read().expect("lock poisoned");
        let found = claim_ids
            .iter()
            .filter_map(|id| state.docs.get(id).cloned())
            .map(|doc| apply_source_excludes(doc, source_excludes))
            .collect();
        Outcome::Ok(MultiGetResponse { found })
    }

    async fn update_by_query(
        &self,
        _cx: &Cx,
        spec: &UpdateByQuery,
    ) -> Outcome<UpdateByQueryResult, ClaimSearchError> {
        let mut state = self.state.write().expect("lock poisoned");
        let mut updated = 0u64;
        for doc in state.docs.values_mut() {
            let key = match spec.keyed_field {
                KeyedField::ClaimId => doc.claim_id.clone(),
                KeyedField::ChannelId => match &doc.channel_id {
                    Some(c) => c.clone(),
                    None => continue,
                },
            };
            let Some(channel) = spec.key_to_censoring_channel.get(&key) else { continue };
            if doc.censor_type >= spec.target_censor_type {
                continue;
            }
            doc.censor_type = spec.target_censor_type;
            doc.censoring_channel_hash = Some(channel.clone());
            updated += 1;
        }
        Outcome::Ok(UpdateByQueryResult { updated })
    }

    async fn delete_by_query_height_greater_than(&self, _cx: &Cx, height: u32) -> Outcome<u64, ClaimSearchError> {
        let mut state = self.state.write().expect("lock poisoned");
        let before = state.docs.len();
        state.docs.retain(|_, doc| doc.height <= height);
        Outcome::Ok((before - state.docs.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use asupersync::runtime::RuntimeBuilder;
    use claimsearch_query::backend_query::{BoolClause, SortField};

    fn block_on<F, Fut, T>(f: F) -> T
    where
        F: FnOnce(Cx) -> Fut,
        Fut: std::future::Future<Output = T>,
    {
        let cx = Cx::for_testing();
        let rt = RuntimeBuilder::current_thread().build().expect("build runtime");
        rt.block_on(f(cx))
    }

    fn ok<T, E>(outcome: Outcome<T, E>) -> T {
        match outcome {
            Outcome::Ok(val) => val,
            _ => panic!("unexpected outcome"),
        }
    }

    fn doc(claim_id: &str, height: u32) -> IndexedDocument {
        IndexedDocument {
            claim_id: claim_id.to_owned(),
            claim_name: "name".into(),
            normalized: "name".into(),
            short_url: String::new(),
            canonical_url: String::new(),
            channel_id: None,
            reposted_claim_id: None,
            signature: None,
            signature_digest: None,
            signature_valid: false,
            public_key_bytes: None,
            public_key_hash: None,
            height,
            creation_height: 0,
            activation_height: 0,
            expiration_height: 0,
            tx_position: 0,
            tx_id: "00".repeat(32),
            tx_nout: 0,
            timestamp: 0,
            creation_timestamp: 0,
            release_time: None,
            amount: 0,
            effective_amount: 0,
            support_amount: 0,
            fee_amount: None,
            fee_currency: None,
            claim_type: 1,
            stream_type: 0,
            trending_group: 0,
            trending_mixed: 0.0,
            trending_local: 0.0,
            trending_global: 0.0,
            reposted: 0,
            claims_in_channel: 0,
            title: Some("t".into()),
            author: None,
            description: Some("d".into()),
            media_type: None,
            tags: vec![],
            languages: vec![],
            duration: None,
            is_controlling: false,
            last_take_over_height: 0,
            channel_join: None,
            censor_type: 0,
            censoring_channel_hash: None,
        }
    }

    #[test]
    fn bulk_upsert_then_search_finds_it() {
        let response = block_on(|cx| async move {
            let backend = MemoryBackend::new();
            let actions = vec![BulkAction::Upsert(Box::new(doc("a", 10)))];
            ok(backend.bulk(&cx, &actions).await);

            let query = BackendQuery {
                source_excludes: vec!["description".into(), "title".into()],
                query: BoolClause::default(),
                sort: vec![],
                size: None,
                from: None,
                collapse: None,
            };
            ok(backend.search(&cx, &query).await)
        });
        assert_eq!(response.total, 1);
        assert!(response.hits[0].doc.description.is_none());
        assert!(response.hits[0].doc.title.is_none());
    }

    #[test]
    fn sort_by_height_ascending() {
        let response = block_on(|cx| async move {
            let backend = MemoryBackend::new();
            ok(backend
                .bulk(
                    &cx,
                    &[
                        BulkAction::Upsert(Box::new(doc("a", 30))),
                        BulkAction::Upsert(Box::new(doc("b", 10))),
                        BulkAction::Upsert(Box::new(doc("c", 20))),
                    ],
                )
                .await);

            let query = BackendQuery {
                source_excludes: vec![],
                query: BoolClause::default(),
                sort: vec![SortField { field: "height".into(), order: SortOrder::Asc }],
                size: None,
                from: None,
                collapse: None,
            };
            ok(backend.search(&cx, &query).await)
        });
        let ids: Vec<&str> = response.hits.iter().map(|h| h.doc.claim_id.as_str()).collect();
        assert_eq!(ids, vec!["b", "c", "a"]);
    }

    #[test]
    fn delete_above_height_removes_matching_docs() {
        let (removed, remaining) = block_on(|cx| async move {
            let backend = MemoryBackend::new();
            ok(backend
                .bulk(&cx, &[BulkAction::Upsert(Box::new(doc("a", 10))), BulkAction::Upsert(Box::new(doc("b", 50)))])
                .await);
            let removed = ok(backend.delete_by_query_height_greater_than(&cx, 20).await);
            (removed, backend.doc_count())
        });
        assert_eq!(removed, 1);
        assert_eq!(remaining, 1);
    }
}
