//! Claim document model, binary/index codec, and shared domain types for
//! the claim search engine.

pub mod base58;
pub mod codec;
pub mod document;
pub mod error;
pub mod name;
pub mod tags;
pub mod types;

pub use codec::DocumentCodec;
pub use document::{ClaimRecord, DocChange, Hash20, IndexedDocument, TxoHash};
pub use error::{ClaimSearchError, ClaimSearchResult};
pub use types::{CensorType, ClaimType, StreamType};
