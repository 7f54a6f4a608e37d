//! The claim document, in its two shapes: the indexer's binary
//! representation (`ClaimRecord`) and the backend's hex/string-keyed
//! representation (`IndexedDocument`). `crate::codec` converts between
//! them.

use serde::{Deserialize, Serialize};

use crate::types::{CensorType, ClaimType, StreamType};

/// A 20-byte hash: claim id, channel id, repost id, or censoring-channel
/// reference, in their natural (non-reversed) byte order.
pub type Hash20 = [u8; 20];

/// The packed 36-byte txo pointer: 32 bytes of transaction hash followed
/// by a little-endian u32 output index, both in their natural byte order
/// (not the reversed hex form used in the index).
pub type TxoHash = [u8; 36];

/// The claim as produced by the blockchain indexer, before it is shaped
/// for the search backend. Field grouping follows the data model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimRecord {
    // Identity
    pub claim_hash: Hash20,
    pub claim_name: String,
    pub short_url: String,
    pub canonical_url: String,

    // Lineage
    pub channel_hash: Option<Hash20>,
    pub reposted_claim_hash: Option<Hash20>,
    pub signature: Option<Vec<u8>>,
    pub signature_digest: Option<Vec<u8>>,
    pub signature_valid: bool,
    pub public_key_bytes: Option<Vec<u8>>,
    pub public_key_hash: Option<Hash20>,

    // Blockchain position
    pub height: u32,
    pub creation_height: u32,
    pub activation_height: u32,
    pub expiration_height: u32,
    pub tx_position: u32,
    pub txo_hash: TxoHash,
    pub timestamp: i64,
    pub creation_timestamp: i64,
    pub release_time: Option<i64>,

    // Economics
    pub amount: u64,
    pub effective_amount: u64,
    pub support_amount: u64,
    /// Integer thousandths of the user's currency unit, or `None` if the
    /// claim carries no fee.
    pub fee_amount: Option<i64>,
    pub fee_currency: Option<String>,

    // Type
    pub claim_type: ClaimType,
    pub stream_type: StreamType,

    // Grouping/ranking
    pub trending_group: i32,
    pub trending_mixed: f32,
    pub trending_local: f32,
    pub trending_global: f32,
    pub reposted: u32,
    pub claims_in_channel: u32,

    // Content
    pub title: Option<String>,
    pub author: Option<String>,
    pub description: Option<String>,
    pub media_type: Option<String>,
    pub tags: Vec<String>,
    pub languages: Vec<String>,
    pub duration: Option<u32>,

    // Control-plane
    pub is_controlling: bool,
    pub last_take_over_height: u32,
    pub channel_join: Option<u32>,
    pub censor_type: CensorType,
    pub censoring_channel_hash: Option<Hash20>,
}

/// The same claim, hex/string-keyed as it lives in the search backend.
///
/// Field names match the backend mapping exactly: `claim_id` (not
/// `claim_hash`), `tx_id`/`tx_nout` (not `txo_hash`), etc. Every hash
/// field is lowercase hex of the *reversed* bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexedDocument {
    pub claim_id: String,
    pub claim_name: String,
    pub normalized: String,
    pub short_url: String,
    pub canonical_url: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reposted_claim_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature_digest: Option<String>,
    pub signature_valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_key_bytes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_key_hash: Option<String>,

    pub height: u32,
    pub creation_height: u32,
    pub activation_height: u32,
    pub expiration_height: u32,
    pub tx_position: u32,
    pub tx_id: String,
    pub tx_nout: u32,
    pub timestamp: i64,
    pub creation_timestamp: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub release_time: Option<i64>,

    pub amount: u64,
    pub effective_amount: u64,
    pub support_amount: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fee_amount: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fee_currency: Option<String>,

    pub claim_type: u8,
    pub stream_type: u8,

    pub trending_group: i32,
    pub trending_mixed: f32,
    pub trending_local: f32,
    pub trending_global: f32,
    pub reposted: u32,
    pub claims_in_channel: u32,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,
    pub tags: Vec<String>,
    pub languages: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<u32>,

    pub is_controlling: bool,
    pub last_take_over_height: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel_join: Option<u32>,
    pub censor_type: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub censoring_channel_hash: Option<String>,
}

/// A single change destined for the ingest queue (`IndexWriter`).
#[derive(Debug, Clone)]
pub enum DocChange {
    Upsert(Box<ClaimRecord>),
    Delete { claim_id: Hash20 },
}
