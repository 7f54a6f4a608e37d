//! `QueryCompiler`: translates a [`SearchOptions`] predicate into a
//! [`BackendQuery`]. Pure, total, stateless — see spec.md §4.2.

use claimsearch_core::name::normalize_name;
use claimsearch_core::tags::clean_tags;
use claimsearch_core::types::{ClaimType, StreamType};

use crate::backend_query::{
    BackendQuery, BoolClause, Clause, ClauseValue, Collapse, InnerHits, RangeOp as BqRangeOp,
    SortField, SortOrder,
};
use crate::options::{
    ClaimTypeOption, OrderByField, RangeField, RangeOp, RangeValue, SearchOptions,
    SignaturePredicate,
};

/// Fields whose exact-match/sort form lives under a `.keyword` subfield
/// rather than the analyzed root field (spec.md §4.2 "Name policy").
const TEXT_FIELDS: &[&str] = &[
    "normalized",
    "claim_name",
    "title",
    "author",
    "description",
    "media_type",
    "claim_id",
    "channel_id",
    "reposted_claim_id",
    "tx_id",
    "canonical_url",
    "short_url",
    "public_key_hash",
    "fee_currency",
];

/// Simple-query-string field weights for the `text` option.
const TEXT_SEARCH_FIELDS: &[(&str, f32)] = &[
    ("claim_name", 4.0),
    ("channel_name", 8.0),
    ("title", 1.0),
    ("description", 0.5),
    ("author", 1.0),
    ("tags", 0.5),
];

fn keyword_field(field: &str) -> String {
    if TEXT_FIELDS.contains(&field) {
        format!("{field}.keyword")
    } else {
        field.to_owned()
    }
}

fn range_op(op: RangeOp) -> BqRangeOp {
    match op {
        RangeOp::Lt => BqRangeOp::Lt,
        RangeOp::Lte => BqRangeOp::Lte,
        RangeOp::Gt => BqRangeOp::Gt,
        RangeOp::Gte => BqRangeOp::Gte,
    }
}

fn range_clause_value(field: RangeField, value: RangeValue) -> ClauseValue {
    // fee_amount is stored as integer millis; the caller supplies the
    // decimal user value and the compiler performs the *1000 rewrite
    // (spec.md §3 Economics, §4.2, boundary behavior in §8).
    if matches!(field, RangeField::FeeAmount) {
        let millis = match value {
            RangeValue::Int(i) => i * 1000,
            RangeValue::Float(f) => (f * 1000.0).round() as i64,
        };
        return ClauseValue::Int(millis);
    }
    match value {
        RangeValue::Int(i) => ClauseValue::Int(i),
        RangeValue::Float(f) => ClauseValue::Float(f),
    }
}

/// Pure function: `SearchOptions -> BackendQuery`.
pub struct QueryCompiler;

impl QueryCompiler {
    #[must_use]
    pub fn compile(options: &SearchOptions) -> BackendQuery {
        // `amount_order` is a rewrite applied before anything else reads
        // limit/order_by/offset (spec.md §4.2, boundary behavior §8).
        let (effective_limit, effective_order_by, effective_offset) =
            if let Some(amount_order) = options.amount_order {
                (Some(1), vec![OrderByField { field: "effective_amount".to_owned(), ascending: false }], Some((amount_order - 1).max(0) as u32))
            } else {
                (options.limit, options.order_by.clone(), options.offset)
            };

        let mut bool_clause = BoolClause::default();

        if let Some(name) = &options.name {
            bool_clause.must.push(Clause::Term {
                field: "normalized.keyword".to_owned(),
                value: normalize_name(name).into(),
            });
        }

        if let Some(claim_id) = &options.claim_id {
            bool_clause.must.push(claim_id_clause(claim_id));
        }

        // `is_controlling=false` is meaningless (only the positive
        // assertion matters) and is dropped, per spec.md §4.2.
        if options.is_controlling == Some(true) {
            bool_clause.must.push(Clause::Term {
                field: "is_controlling".to_owned(),
                value: true.into(),
            });
        }

        if let Some(values) = non_empty(&options.claim_ids) {
            bool_clause.must.push(terms_clause("claim_id.keyword", values));
        }
        if let Some(values) = non_empty(&options.channel_ids) {
            bool_clause.must.push(terms_clause("channel_id.keyword", values));
        }
        if let Some(values) = non_empty(&options.not_channel_ids) {
            bool_clause.must_not.push(terms_clause("channel_id.keyword", values));
        }
        if let Some(values) = non_empty(&options.media_types) {
            bool_clause.must.push(terms_clause("media_type", values));
        }
        if let Some(values) = non_empty(&options.stream_types) {
            let codes = values
                .iter()
                .filter_map(|v| StreamType::from_name(v))
                .map(|t| ClauseValue::Int(i64::from(t.code())))
                .collect();
            bool_clause.must.push(Clause::Terms { field: "stream_type".to_owned(), values: codes });
        }
        if let Some(values) = non_empty(&options.any_tags) {
            bool_clause.must.push(terms_clause("tags.keyword", clean_tags(&values)));
        }
        if let Some(values) = non_empty(&options.all_tags) {
            for v in clean_tags(&values) {
                bool_clause.must.push(Clause::Term { field: "tags.keyword".to_owned(), value: v.into() });
            }
        }
        if let Some(values) = non_empty(&options.not_tags) {
            bool_clause.must_not.push(terms_clause("tags.keyword", clean_tags(&values)));
        }
        // Only one `any_languages` branch is reachable; a second,
        // equivalent branch in the original logic was dead code and is
        // not reproduced here. The reachable branch is tag-cleaned
        // (spec.md §9), same as `any_tags`/`all_tags`/`not_tags`.
        if let Some(values) = non_empty(&options.any_languages) {
            bool_clause.must.push(terms_clause("languages", clean_tags(&values)));
        }
        if let Some(values) = non_empty(&options.all_languages) {
            for v in values {
                bool_clause.must.push(Clause::Term { field: "languages".to_owned(), value: v.clone().into() });
            }
        }
        if let Some(values) = non_empty(&options.not_claim_id) {
            bool_clause.must_not.push(terms_clause("claim_id.keyword", values));
        }

        match &options.claim_type {
            Some(ClaimTypeOption::Single(name)) => {
                if let Some(code) = ClaimType::from_name(name) {
                    bool_clause.must.push(Clause::Term {
                        field: "claim_type".to_owned(),
                        value: ClauseValue::Int(i64::from(code.code())),
                    });
                }
            }
            Some(ClaimTypeOption::Many(names)) => {
                let codes: Vec<ClauseValue> = names
                    .iter()
                    .filter_map(|n| ClaimType::from_name(n))
                    .map(|t| ClauseValue::Int(i64::from(t.code())))
                    .collect();
                if !codes.is_empty() {
                    bool_clause.must.push(Clause::Terms { field: "claim_type".to_owned(), values: codes });
                }
            }
            None => {}
        }

        if let Some(public_key_id) = &options.public_key_id {
            if let Ok(hash) = claimsearch_core::base58::public_key_id_to_hash(public_key_id) {
                bool_clause.must.push(Clause::Term {
                    field: "public_key_hash".to_owned(),
                    value: claimsearch_core::codec::hash_to_hex(&hash).into(),
                });
            }
        }

        for range in &options.ranges {
            bool_clause.must.push(Clause::Range {
                field: range.field.index_field_name().to_owned(),
                op: range_op(range.op),
                value: range_clause_value(range.field, range.value),
            });
        }

        // Signature-validity disjunction, modeled as the explicit variant
        // from spec.md §9 rather than an ad-hoc two-boolean combination.
        // This is also where the original's deliberately-skipped
        // `signature_valid` clause inside the main option loop gets
        // re-handled exactly once (spec.md §9 Open Question).
        match options.signature_predicate {
            Some(SignaturePredicate::HasSignature) => {
                bool_clause.must.push(Clause::Exists { field: "signature_digest".to_owned() });
            }
            Some(SignaturePredicate::HasSignatureWithValidity(valid)) => {
                bool_clause.must.push(Clause::Exists { field: "signature_digest".to_owned() });
                bool_clause.must.push(Clause::Term {
                    field: "signature_valid".to_owned(),
                    value: valid.into(),
                });
            }
            Some(SignaturePredicate::ValidityOnly(valid)) => {
                bool_clause.should.push(Clause::Not(Box::new(Clause::Exists {
                    field: "signature_digest".to_owned(),
                })));
                bool_clause.should.push(Clause::Term {
                    field: "signature_valid".to_owned(),
                    value: valid.into(),
                });
                bool_clause.minimum_should_match = Some(1);
            }
            None => {}
        }

        if let Some(text) = &options.text {
            bool_clause.must.push(Clause::SimpleQueryString {
                query: text.clone(),
                fields: TEXT_SEARCH_FIELDS.iter().map(|(f, w)| ((*f).to_owned(), *w)).collect(),
            });
        }

        let collapse = options.limit_claims_per_channel.map(|cap| {
            let sort = build_sort(&effective_order_by);
            Collapse {
                field: "channel_id.keyword".to_owned(),
                inner_hits: InnerHits { size: cap, sort },
            }
        });

        let sort = build_sort(&effective_order_by);

        BackendQuery {
            source_excludes: BackendQuery::source_excludes_default(),
            query: bool_clause,
            sort,
            size: effective_limit,
            from: effective_offset,
            collapse,
        }
    }
}

fn build_sort(order_by: &[OrderByField]) -> Vec<SortField> {
    order_by
        .iter()
        // `trending_group` sort components are silently skipped
        // (spec.md §4.2).
        .filter(|f| f.field != "trending_group")
        .map(|f| SortField {
            field: keyword_field(&f.field),
            order: if f.ascending { SortOrder::Asc } else { SortOrder::Desc },
        })
        .collect()
}

fn non_empty(values: &Option<Vec<String>>) -> Option<Vec<String>> {
    // Empty lists (and, by construction, `None` elements, since the
    // typed option surface has no `Option<String>` elements to begin
    // with) are dropped rather than materialized as empty-terms clauses
    // (spec.md §4.2, boundary behavior in §8).
    values.as_ref().filter(|v| !v.is_empty()).cloned()
}

fn terms_clause(field: &str, values: Vec<String>) -> Clause {
    Clause::Terms {
        field: field.to_owned(),
        values: values.into_iter().map(ClauseValue::Str).collect(),
    }
}

fn claim_id_clause(claim_id: &str) -> Clause {
    let is_hex = claim_id.chars().all(|c| c.is_ascii_hexdigit());
    if is_hex && claim_id.len() < 20 {
        Clause::Prefix { field: "claim_id".to_owned(), value: claim_id.to_owned() }
    } else {
        Clause::Term { field: "claim_id.keyword".to_owned(), value: claim_id.to_owned().into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::{ClaimTypeOption, RangeClause, RangeField, RangeOp, RangeValue};

    // ── idempotence & fixed response shape ──────────────────────────

    #[test]
    fn compiling_twice_yields_equal_query() {
        let mut opts = SearchOptions::new();
        opts.name = Some("Foo Bar".to_owned());
        opts.limit = Some(10);
        let a = QueryCompiler::compile(&opts);
        let b = QueryCompiler::compile(&opts);
        assert_eq!(a, b);
    }

    #[test]
    fn every_query_excludes_description_and_title() {
        let query = QueryCompiler::compile(&SearchOptions::new());
        assert_eq!(query.source_excludes, vec!["description", "title"]);
    }

    // ── scenario 3 from spec.md §8 ───────────────────────────────────

    #[test]
    fn scenario_name_and_claim_type_and_order_by() {
        let mut opts = SearchOptions::new();
        opts.name = Some("Foo Bar".to_owned());
        opts.claim_type = Some(ClaimTypeOption::Single("stream".to_owned()));
        opts.order_by = vec![OrderByField::parse("^height")];
        opts.limit = Some(10);

        let query = QueryCompiler::compile(&opts);

        assert!(query.query.must.contains(&Clause::Term {
            field: "normalized.keyword".to_owned(),
            value: ClauseValue::Str("foobar".to_owned()),
        }));
        assert!(query.query.must.contains(&Clause::Term {
            field: "claim_type".to_owned(),
            value: ClauseValue::Int(1),
        }));
        assert_eq!(
            query.sort,
            vec![SortField { field: "height".to_owned(), order: SortOrder::Asc }]
        );
        assert_eq!(query.size, Some(10));
    }

    // ── scenario 4 from spec.md §8 ───────────────────────────────────

    #[test]
    fn scenario_text_with_signature_validity_requested_has_no_should_group() {
        let mut opts = SearchOptions::new();
        opts.text = Some("music".to_owned());
        opts.signature_predicate = Some(SignaturePredicate::HasSignatureWithValidity(true));
        opts.limit = Some(5);

        let query = QueryCompiler::compile(&opts);

        assert!(query.query.should.is_empty());
        assert!(query.query.must.iter().any(|c| matches!(c, Clause::SimpleQueryString { .. })));
        assert!(query
            .query
            .must
            .contains(&Clause::Exists { field: "signature_digest".to_owned() }));
        assert!(query.query.must.contains(&Clause::Term {
            field: "signature_valid".to_owned(),
            value: ClauseValue::Bool(true),
        }));
    }

    #[test]
    fn validity_only_emits_should_group_with_minimum_should_match() {
        let mut opts = SearchOptions::new();
        opts.signature_predicate = Some(SignaturePredicate::ValidityOnly(true));
        let query = QueryCompiler::compile(&opts);

        assert_eq!(query.query.should.len(), 2);
        assert_eq!(query.query.minimum_should_match, Some(1));
        assert!(query
            .query
            .should
            .contains(&Clause::Not(Box::new(Clause::Exists { field: "signature_digest".to_owned() }))));
    }

    // ── boundary behaviors from spec.md §8 ───────────────────────────

    #[test]
    fn claim_id_exactly_40_hex_chars_is_exact_term() {
        let id = "a".repeat(40);
        match claim_id_clause(&id) {
            Clause::Term { field, .. } => assert_eq!(field, "claim_id.keyword"),
            other => panic!("expected exact term, got {other:?}"),
        }
    }

    #[test]
    fn claim_id_between_20_and_39_hex_chars_is_exact_term() {
        let id = "a".repeat(25);
        match claim_id_clause(&id) {
            Clause::Term { field, value } => {
                assert_eq!(field, "claim_id.keyword");
                assert_eq!(value, ClauseValue::Str(id));
            }
            other => panic!("expected exact term, got {other:?}"),
        }
    }

    #[test]
    fn claim_id_under_20_hex_chars_is_prefix() {
        let id = "a".repeat(19);
        match claim_id_clause(&id) {
            Clause::Prefix { field, value } => {
                assert_eq!(field, "claim_id");
                assert_eq!(value, id);
            }
            other => panic!("expected prefix, got {other:?}"),
        }
    }

    #[test]
    fn fee_amount_range_multiplies_by_one_thousand() {
        let mut opts = SearchOptions::new();
        opts.ranges.push(RangeClause {
            field: RangeField::FeeAmount,
            op: RangeOp::Gt,
            value: RangeValue::Float(1.5),
        });
        let query = QueryCompiler::compile(&opts);
        assert!(query.query.must.contains(&Clause::Range {
            field: "fee_amount".to_owned(),
            op: BqRangeOp::Gt,
            value: ClauseValue::Int(1500),
        }));
    }

    #[test]
    fn amount_order_rewrites_limit_order_and_offset() {
        let mut opts = SearchOptions::new();
        opts.amount_order = Some(3);
        let query = QueryCompiler::compile(&opts);
        assert_eq!(query.size, Some(1));
        assert_eq!(query.from, Some(2));
        assert_eq!(
            query.sort,
            vec![SortField { field: "effective_amount".to_owned(), order: SortOrder::Desc }]
        );
    }

    #[test]
    fn order_by_ascending_caret_vs_descending_default() {
        let mut opts = SearchOptions::new();
        opts.order_by = vec![OrderByField::parse("^height")];
        let ascending = QueryCompiler::compile(&opts);
        assert_eq!(ascending.sort[0].order, SortOrder::Asc);

        let mut opts2 = SearchOptions::new();
        opts2.order_by = vec![OrderByField::parse("height")];
        let descending = QueryCompiler::compile(&opts2);
        assert_eq!(descending.sort[0].order, SortOrder::Desc);
    }

    #[test]
    fn any_tags_are_cleaned_before_clause_building() {
        let mut opts = SearchOptions::new();
        opts.any_tags = Some(vec![" Rust ".to_owned(), "rust".to_owned(), "WASM".to_owned()]);
        let query = QueryCompiler::compile(&opts);
        assert!(query.query.must.contains(&Clause::Terms {
            field: "tags.keyword".to_owned(),
            values: vec![ClauseValue::Str("rust".to_owned()), ClauseValue::Str("wasm".to_owned())],
        }));
    }

    #[test]
    fn any_languages_are_cleaned_before_clause_building() {
        let mut opts = SearchOptions::new();
        opts.any_languages = Some(vec![" EN ".to_owned(), "en".to_owned()]);
        let query = QueryCompiler::compile(&opts);
        assert!(query.query.must.contains(&Clause::Terms {
            field: "languages".to_owned(),
            values: vec![ClauseValue::Str("en".to_owned())],
        }));
    }

    #[test]
    fn empty_in_lists_are_dropped_not_materialized() {
        let mut opts = SearchOptions::new();
        opts.claim_ids = Some(vec![]);
        let query = QueryCompiler::compile(&opts);
        assert!(query.query.must.is_empty());
    }

    #[test]
    fn is_controlling_false_is_dropped() {
        let mut opts = SearchOptions::new();
        opts.is_controlling = Some(false);
        let query = QueryCompiler::compile(&opts);
        assert!(query.query.must.is_empty());
    }

    #[test]
    fn is_controlling_true_is_kept() {
        let mut opts = SearchOptions::new();
        opts.is_controlling = Some(true);
        let query = QueryCompiler::compile(&opts);
        assert!(query.query.must.contains(&Clause::Term {
            field: "is_controlling".to_owned(),
            value: ClauseValue::Bool(true),
        }));
    }

    #[test]
    fn trending_group_order_by_is_silently_skipped() {
        let mut opts = SearchOptions::new();
        opts.order_by = vec![OrderByField::parse("trending_group"), OrderByField::parse("^height")];
        let query = QueryCompiler::compile(&opts);
        assert_eq!(query.sort.len(), 1);
        assert_eq!(query.sort[0].field, "height");
    }

    #[test]
    fn limit_claims_per_channel_sets_collapse_with_matching_inner_sort() {
        let mut opts = SearchOptions::new();
        opts.limit_claims_per_channel = Some(1);
        opts.order_by = vec![OrderByField::parse("^height")];
        let query = QueryCompiler::compile(&opts);
        let collapse = query.collapse.unwrap();
        assert_eq!(collapse.field, "channel_id.keyword");
        assert_eq!(collapse.inner_hits.size, 1);
        assert_eq!(collapse.inner_hits.sort, query.sort);
    }

    #[test]
    fn public_key_id_rekeys_to_public_key_hash() {
        let mut payload = vec![0u8];
        payload.extend_from_slice(&[9u8; 20]);
        let encoded = bs58::encode(&payload).with_check().into_string();

        let mut opts = SearchOptions::new();
        opts.public_key_id = Some(encoded);
        let query = QueryCompiler::compile(&opts);
        assert!(query.query.must.iter().any(|c| matches!(c, Clause::Term { field, .. } if field == "public_key_hash")));
    }
}
