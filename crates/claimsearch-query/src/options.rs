//! The typed predicate surface `QueryCompiler::compile` accepts.
//!
//! A struct of typed, named fields enumerating every recognized search
//! option, rather than a dynamic string-keyed map: an unrecognized
//! option is a compile error in the caller's code, not a
//! silently-ignored map entry.

/// A field eligible for a range comparison (Economics, Blockchain
/// position, and trending groups).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RangeField {
    Height,
    CreationHeight,
    ActivationHeight,
    ExpirationHeight,
    TxPosition,
    Timestamp,
    CreationTimestamp,
    ReleaseTime,
    Amount,
    EffectiveAmount,
    SupportAmount,
    FeeAmount,
    TrendingGroup,
    TrendingMixed,
    TrendingLocal,
    TrendingGlobal,
    /// Not itself a search option — exists so `SessionDispatcher` can
    /// express "rerun this predicate restricted to uncensored claims" as
    /// an ordinary `RangeClause` (`censor_type <= 0`) instead of new
    /// compiler-side special-casing.
    CensorType,
}

impl RangeField {
    #[must_use]
    pub const fn index_field_name(self) -> &'static str {
        match self {
            Self::Height => "height",
            Self::CreationHeight => "creation_height",
            Self::ActivationHeight => "activation_height",
            Self::ExpirationHeight => "expiration_height",
            Self::TxPosition => "tx_position",
            Self::Timestamp => "timestamp",
            Self::CreationTimestamp => "creation_timestamp",
            Self::ReleaseTime => "release_time",
            Self::Amount => "amount",
            Self::EffectiveAmount => "effective_amount",
            Self::SupportAmount => "support_amount",
            Self::FeeAmount => "fee_amount",
            Self::TrendingGroup => "trending_group",
            Self::TrendingMixed => "trending_mixed",
            Self::TrendingLocal => "trending_local",
            Self::TrendingGlobal => "trending_global",
            Self::CensorType => "censor_type",
        }
    }
}

/// The comparison operator for a range option.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeOp {
    Lt,
    Lte,
    Gt,
    Gte,
}

/// A numeric value supplied to a range clause, before the `fee_amount *
/// 1000` rewrite the compiler applies.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RangeValue {
    Int(i64),
    Float(f64),
}

/// An explicit `{field, op, value}` triple, replacing the original's
/// fragile `"<1.5"`-style string convention. Parsing such strings at
/// the boundary (if a caller still has them) is the job of
/// `crate::range::parse_range_string`, which produces one of these.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RangeClause {
    pub field: RangeField,
    pub op: RangeOp,
    pub value: RangeValue,
}

/// `claim_type` may be given as a single name or a list of names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClaimTypeOption {
    Single(String),
    Many(Vec<String>),
}

/// One entry of `order_by`: a field name plus direction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderByField {
    pub field: String,
    pub ascending: bool,
}

impl OrderByField {
    /// Parses the `^field` (ascending) / `field` (descending) convention.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        raw.strip_prefix('^').map_or_else(
            || Self { field: raw.to_owned(), ascending: false },
            |rest| Self { field: rest.to_owned(), ascending: true },
        )
    }
}

/// The signature-validity predicate (`has_channel_signature` /
/// `signature_valid`), modeled as an explicit variant rather than an
/// ad-hoc should-clause assembled from two independent booleans.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignaturePredicate {
    /// `has_channel_signature=true` alone: require `exists
    /// signature_digest`.
    HasSignature,
    /// `has_channel_signature=true` AND `signature_valid=V`: require
    /// `exists signature_digest` AND `signature_valid == V`.
    HasSignatureWithValidity(bool),
    /// `signature_valid=V` alone (no `has_channel_signature`): require
    /// "either unsigned, or signed with validity == V".
    ValidityOnly(bool),
}

/// Every recognized search option, typed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchOptions {
    pub name: Option<String>,
    pub claim_id: Option<String>,
    pub claim_ids: Option<Vec<String>>,
    pub channel_ids: Option<Vec<String>>,
    pub not_channel_ids: Option<Vec<String>>,
    pub media_types: Option<Vec<String>>,
    pub stream_types: Option<Vec<String>>,
    pub any_tags: Option<Vec<String>>,
    pub all_tags: Option<Vec<String>>,
    pub not_tags: Option<Vec<String>>,
    pub any_languages: Option<Vec<String>>,
    pub all_languages: Option<Vec<String>>,
    pub not_claim_id: Option<Vec<String>>,
    pub claim_type: Option<ClaimTypeOption>,
    pub public_key_id: Option<String>,
    pub ranges: Vec<RangeClause>,
    pub amount_order: Option<i64>,
    pub signature_predicate: Option<SignaturePredicate>,
    pub is_controlling: Option<bool>,
    pub text: Option<String>,
    pub limit_claims_per_channel: Option<u32>,
    pub order_by: Vec<OrderByField>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

impl SearchOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}
