//! Small enumerated domain types shared by the codec and the query compiler.

use serde::{Deserialize, Serialize};

/// The kind of claim a document represents.
///
/// Numeric values match the wire/index convention used by the reference
/// indexer: 0 is reserved for "unknown/unset" (the codec's default for a
/// record whose `claim_type` byte was never populated), 1-4 are the
/// recognized kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum ClaimType {
    Unknown = 0,
    Stream = 1,
    Channel = 2,
    Repost = 3,
    Collaboration = 4,
}

impl ClaimType {
    #[must_use]
    pub const fn code(self) -> u8 {
        self as u8
    }

    #[must_use]
    pub const fn from_code(code: u8) -> Self {
        match code {
            1 => Self::Stream,
            2 => Self::Channel,
            3 => Self::Repost,
            4 => Self::Collaboration,
            _ => Self::Unknown,
        }
    }

    /// Parses the caller-facing string form used in `claim_type` search options.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "stream" => Some(Self::Stream),
            "channel" => Some(Self::Channel),
            "repost" => Some(Self::Repost),
            "collaboration" => Some(Self::Collaboration),
            _ => None,
        }
    }
}

/// The media kind of a stream claim.
///
/// 0 is "unknown/unset", matching the codec's default for a missing
/// `stream_type` byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum StreamType {
    Unknown = 0,
    Video = 1,
    Audio = 2,
    Image = 3,
    Document = 4,
    Binary = 5,
    Model = 6,
}

impl StreamType {
    #[must_use]
    pub const fn code(self) -> u8 {
        self as u8
    }

    #[must_use]
    pub const fn from_code(code: u8) -> Self {
        match code {
            1 => Self::Video,
            2 => Self::Audio,
            3 => Self::Image,
            4 => Self::Document,
            5 => Self::Binary,
            6 => Self::Model,
            _ => Self::Unknown,
        }
    }

    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "video" => Some(Self::Video),
            "audio" => Some(Self::Audio),
            "image" => Some(Self::Image),
            "document" => Some(Self::Document),
            "binary" => Some(Self::Binary),
            "model" => Some(Self::Model),
            _ => None,
        }
    }
}

/// Severity of administrative action against a claim.
///
/// Monotone: blocking (2) dominates filtering (1); a document is never
/// downgraded once tagged (enforced by the `censor_type < N` update
/// predicate in `CensorshipApplier`, not by this type).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum CensorType {
    None = 0,
    Filtered = 1,
    Blocked = 2,
}

impl CensorType {
    #[must_use]
    pub const fn code(self) -> u8 {
        self as u8
    }

    #[must_use]
    pub const fn from_code(code: u8) -> Self {
        match code {
            1 => Self::Filtered,
            2 => Self::Blocked,
            _ => Self::None,
        }
    }
}
