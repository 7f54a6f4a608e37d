//! The backend query IR `QueryCompiler::compile` produces.
//!
//! This is the typed stand-in for a backend query object with shape
//! `{_source: {excludes: [...]}, query: {bool: {...}}, sort: [...],
//! size?, from?, collapse?}`. A concrete `IndexBackend` implementation
//! is responsible for rendering this into whatever wire format its
//! actual backend speaks.

use serde::{Deserialize, Serialize};

/// A scalar value carried by a term/terms/range clause.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ClauseValue {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl From<&str> for ClauseValue {
    fn from(s: &str) -> Self {
        Self::Str(s.to_owned())
    }
}
impl From<String> for ClauseValue {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}
impl From<i64> for ClauseValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}
impl From<f64> for ClauseValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}
impl From<bool> for ClauseValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

/// The comparison operator for a range clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RangeOp {
    Lt,
    Lte,
    Gt,
    Gte,
}

/// A single query clause. Clauses compose into the boolean query via
/// `BoolClause::must`/`must_not`/`should`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Clause {
    /// Exact-match on a single value.
    Term { field: String, value: ClauseValue },
    /// Exact-match against any of several values.
    Terms { field: String, values: Vec<ClauseValue> },
    /// Prefix match (used for partial `claim_id` lookups).
    Prefix { field: String, value: String },
    /// Range comparison.
    Range { field: String, op: RangeOp, value: ClauseValue },
    /// Field-presence check.
    Exists { field: String },
    /// Weighted full-text query over several fields.
    SimpleQueryString { query: String, fields: Vec<(String, f32)> },
    /// Logical negation of a nested clause, for use inside a `should`
    /// group (e.g. "NOT exists signature_digest").
    Not(Box<Clause>),
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortOrder {
    Asc,
    Desc,
}

/// One entry in the compiled sort list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SortField {
    pub field: String,
    pub order: SortOrder,
}

/// Per-group result cap plus the sort inner_hits should use, for
/// `limit_claims_per_channel`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InnerHits {
    pub size: u32,
    pub sort: Vec<SortField>,
}

/// Collapse-by-field clause, used by `limit_claims_per_channel`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Collapse {
    pub field: String,
    pub inner_hits: InnerHits,
}

/// The boolean clause container: `must` (AND), `must_not` (AND NOT), and
/// `should` (OR, gated by `minimum_should_match`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BoolClause {
    pub must: Vec<Clause>,
    pub must_not: Vec<Clause>,
    pub should: Vec<Clause>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum_should_match: Option<u32>,
}

impl BoolClause {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.must.is_empty() && self.must_not.is_empty() && self.should.is_empty()
    }
}

/// The fully compiled query, ready to hand to an `IndexBackend`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendQuery {
    /// Source fields to exclude from the response — always
    /// `["description", "title"]` (these are large fields not needed
    /// for the list view and are only fetched by `getMany` when a
    /// client actually opens a claim).
    pub source_excludes: Vec<String>,
    pub query: BoolClause,
    pub sort: Vec<SortField>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collapse: Option<Collapse>,
}

impl BackendQuery {
    /// The fixed response-shaping fields every compiled query carries,
    /// regardless of input.
    #[must_use]
    pub fn source_excludes_default() -> Vec<String> {
        vec!["description".to_owned(), "title".to_owned()]
    }
}
