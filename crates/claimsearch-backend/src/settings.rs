//! Index layout: the settings/mappings the backend is created with.

use serde::{Deserialize, Serialize};

/// Analyzer definition: whitespace tokenizer, lowercase filter, porter
/// stem filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyzerSettings {
    pub tokenizer: String,
    pub filters: Vec<String>,
}

impl Default for AnalyzerSettings {
    fn default() -> Self {
        Self {
            tokenizer: "whitespace".to_owned(),
            filters: vec!["lowercase".to_owned(), "porter_stem".to_owned()],
        }
    }
}

/// `claim_id`'s mapping: text with a `keyword` subfield (capped at 256
/// chars) plus an edge-prefix index over 1-10 characters, enabling the
/// prefix matches `QueryCompiler` emits for partial claim ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimIdMapping {
    pub keyword_ignore_above: u32,
    pub index_prefixes_min_chars: u32,
    pub index_prefixes_max_chars: u32,
}

impl Default for ClaimIdMapping {
    fn default() -> Self {
        Self { keyword_ignore_above: 256, index_prefixes_min_chars: 1, index_prefixes_max_chars: 10 }
    }
}

/// The index-creation body an `IndexBackend` implementation should send
/// on `ensure_index`. All other fields fall through to dynamic mapping;
/// only the ones with a correctness-relevant shape are listed
/// explicitly here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexSettings {
    pub index_name: String,
    /// Manual refresh only — the backend never auto-refreshes.
    pub refresh_interval_disabled: bool,
    pub number_of_shards: u32,
    pub number_of_replicas: u32,
    pub analyzer: AnalyzerSettings,
    pub claim_id_mapping: ClaimIdMapping,
    /// `height` is mapped as an integer.
    pub height_is_integer: bool,
    /// `claim_type` and `censor_type` are mapped as single bytes.
    pub byte_fields: Vec<String>,
    /// `trending_mixed` is mapped as a float.
    pub float_fields: Vec<String>,
}

impl IndexSettings {
    /// Builds the canonical claims-index settings for the given prefix,
    /// matching the original indexer's `start()`.
    #[must_use]
    pub fn claims_index(prefix: &str) -> Self {
        Self {
            index_name: format!("{prefix}claims"),
            refresh_interval_disabled: true,
            number_of_shards: 1,
            number_of_replicas: 0,
            analyzer: AnalyzerSettings::default(),
            claim_id_mapping: ClaimIdMapping::default(),
            height_is_integer: true,
            byte_fields: vec!["claim_type".to_owned(), "censor_type".to_owned()],
            float_fields: vec!["trending_mixed".to_owned()],
        }
    }
}
