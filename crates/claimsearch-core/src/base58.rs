//! Base58Check decoding for the `public_key_id` search option.

use crate::document::Hash20;

#[derive(Debug, thiserror::Error)]
pub enum Base58Error {
    #[error("invalid base58check: {0}")]
    Decode(String),
    #[error("decoded public key id is too short: expected at least 21 bytes, got {0}")]
    TooShort(usize),
}

/// Decodes a Base58Check-encoded `public_key_id` and extracts the middle
/// 20 bytes (skipping the one-byte version prefix), matching the
/// reference indexer's `Base58.decode(pubkey_id)[1:21]`.
pub fn public_key_id_to_hash(id: &str) -> Result<Hash20, Base58Error> {
    let decoded = bs58::decode(id)
        .with_check(None)
        .into_vec()
        .map_err(|e| Base58Error::Decode(e.to_string()))?;
    if decoded.len() < 21 {
        return Err(Base58Error::TooShort(decoded.len()));
    }
    let mut hash = [0u8; 20];
    hash.copy_from_slice(&decoded[1..21]);
    Ok(hash)
}
