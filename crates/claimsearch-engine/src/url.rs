//! Claim URL parsing: `lbry://@channel#claimid:seq$amount_order/stream#claimid:seq$amount_order`.
//!
//! A URL carries zero or one channel segment (prefixed `@`) and zero or
//! one stream segment, each optionally qualified with a partial/full
//! claim id (`#...`), a creation-order sequence number (`:N`), or an
//! amount-order number (`$N`) — spec.md §4.5 "URL shape". `original_source/`
//! (the reference `elastic_search.py`) does not ship `lbry/schema/url.py`,
//! so the exact grammar here — one regex per segment, delimiters in any
//! order, each at most once — is this crate's own choice; see
//! `DESIGN.md` "Open Question Decisions" for the rationale behind how a
//! `sequence` qualifier compiles (the compiler itself has no `sequence`
//! option — spec.md §4.2's table only special-cases `amount_order`).

use std::sync::OnceLock;

use regex::Regex;

use claimsearch_query::options::{OrderByField, SearchOptions};

/// One `name[#claim_id][:sequence][$amount_order]` segment.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UrlSegment {
    pub name: Option<String>,
    pub claim_id: Option<String>,
    pub sequence: Option<i64>,
    pub amount_order: Option<i64>,
    /// The full segment text, used as the Resolver's stream-cache key
    /// component (spec.md §4.5 `(channelId or "") + streamSegmentString`).
    pub raw: String,
}

impl UrlSegment {
    /// True iff `name` is the only attribute present — the boundary this
    /// crate's resolver logic branches on throughout spec.md §4.5.
    #[must_use]
    pub fn is_name_only(&self) -> bool {
        self.name.is_some() && self.claim_id.is_none() && self.sequence.is_none() && self.amount_order.is_none()
    }

    /// Whether this segment's claim id is a full 40-character hex claim
    /// id (spec.md §8 boundary behavior), eligible for a direct `getMany`
    /// lookup rather than a search.
    #[must_use]
    pub fn full_claim_id(&self) -> Option<&str> {
        self.claim_id.as_deref().filter(|id| id.len() == 40 && id.chars().all(|c| c.is_ascii_hexdigit()))
    }

    /// Builds the base predicate for this segment: `name` and `claim_id`
    /// verbatim, plus the `sequence` rewrite (limit=1, order by creation
    /// height ascending, offset = sequence-1 — symmetric with how
    /// `amount_order` rewrites in `QueryCompiler`, see `DESIGN.md`).
    /// Callers (`Resolver::resolve_channel_id`/`resolve_stream`) layer
    /// additional options (`is_controlling`, `order_by`, `channel_id`,
    /// `signature_valid`) on top per spec.md §4.5.
    #[must_use]
    pub fn base_options(&self) -> SearchOptions {
        let mut opts = SearchOptions::new();
        opts.name = self.name.clone();
        opts.claim_id = self.claim_id.clone();
        if let Some(amount_order) = self.amount_order {
            opts.amount_order = Some(amount_order);
        }
        if let Some(sequence) = self.sequence {
            opts.limit = Some(1);
            opts.offset = Some((sequence - 1).max(0) as u32);
            opts.order_by = vec![OrderByField { field: "creation_height".to_owned(), ascending: true }];
        }
        opts
    }
}

/// A parsed resolve URL: an optional channel segment and an optional
/// stream segment.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParsedUrl {
    pub channel: Option<UrlSegment>,
    pub stream: Option<UrlSegment>,
}

impl ParsedUrl {
    #[must_use]
    pub fn has_channel(&self) -> bool {
        self.channel.is_some()
    }

    #[must_use]
    pub fn has_stream(&self) -> bool {
        self.stream.is_some()
    }
}

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
#[error("failed to parse url {url:?}: {reason}")]
pub struct UrlParseError {
    pub url: String,
    pub reason: String,
}

fn segment_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?x)
            ^
            (?P<name>[^\#:\$]*)
            (?:\#(?P<claim_id>[0-9a-fA-F]*))?
            (?::(?P<sequence>-?\d+))?
            (?:\$(?P<amount_order>-?\d+))?
            $
        ")
        .expect("segment regex is a valid, compile-time-fixed pattern")
    })
}

fn parse_segment(raw: &str, is_channel: bool) -> Result<UrlSegment, String> {
    if raw.is_empty() {
        return Err("empty segment".to_owned());
    }
    let captures = segment_regex().captures(raw).ok_or_else(|| format!("malformed segment {raw:?}"))?;

    let name_capture = captures.name("name").map(|m| m.as_str()).unwrap_or_default();
    let claim_id = captures.name("claim_id").map(|m| m.as_str().to_owned()).filter(|s| !s.is_empty());
    let sequence = captures
        .name("sequence")
        .map(|m| m.as_str().parse::<i64>().map_err(|_| format!("bad sequence in {raw:?}")))
        .transpose()?;
    let amount_order = captures
        .name("amount_order")
        .map(|m| m.as_str().parse::<i64>().map_err(|_| format!("bad amount_order in {raw:?}")))
        .transpose()?;

    let name = if name_capture.is_empty() {
        None
    } else if is_channel {
        Some(format!("@{name_capture}"))
    } else {
        Some(name_capture.to_owned())
    };

    if name.is_none() && claim_id.is_none() {
        return Err(format!("segment {raw:?} has neither name nor claim id"));
    }

    Ok(UrlSegment { name, claim_id, sequence, amount_order, raw: raw.to_owned() })
}

/// Parses a resolve URL into its channel/stream segments.
///
/// # Errors
/// Returns [`UrlParseError`] on malformed input — per spec.md §7, this is
/// a carried value, not a panic or exception, so a single malformed URL
/// in a multi-URL resolve never aborts the batch.
pub fn parse(raw_url: &str) -> Result<ParsedUrl, UrlParseError> {
    let wrap_err = |reason: String| UrlParseError { url: raw_url.to_owned(), reason };

    let body = raw_url.strip_prefix("lbry://").unwrap_or(raw_url);
    if body.is_empty() {
        return Err(wrap_err("url is empty".to_owned()));
    }

    let (channel_part, stream_part) = match body.split_once('/') {
        Some((c, s)) => (Some(c), Some(s)),
        None => (None, Some(body)),
    };

    let mut channel_part = channel_part;
    let mut stream_part = stream_part;

    // A bare channel URL ("@alice", no trailing slash) has no stream part.
    if channel_part.is_none() {
        if let Some(s) = stream_part {
            if s.starts_with('@') {
                channel_part = Some(s);
                stream_part = None;
            }
        }
    }

    let channel = channel_part
        .map(|c| {
            let stripped = c.strip_prefix('@').ok_or_else(|| format!("channel segment {c:?} must start with @"))?;
            parse_segment(stripped, true)
        })
        .transpose()
        .map_err(wrap_err)?;

    let stream = stream_part
        .filter(|s| !s.is_empty())
        .map(|s| parse_segment(s, false))
        .transpose()
        .map_err(wrap_err)?;

    if channel.is_none() && stream.is_none() {
        return Err(wrap_err("url has neither a channel nor a stream segment".to_owned()));
    }

    Ok(ParsedUrl { channel, stream })
}
