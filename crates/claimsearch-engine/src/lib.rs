//! The engine crate: wires `claimsearch-core`'s document model and
//! `claimsearch-query`'s compiler to an `claimsearch-backend::IndexBackend`,
//! and provides the ingest (`IndexWriter`, `CensorshipApplier`) and
//! query (`Resolver`, `SessionDispatcher`) halves of the running
//! service.

pub mod censor_policy;
pub mod censorship;
pub mod config;
pub mod dispatcher;
pub mod resolver;
pub mod url;
pub mod writer;

pub use censor_policy::{Censor, CensorContext, CensoredItem};
pub use censorship::{CensorList, CensorshipApplier, FilterLists};
pub use config::EngineConfig;
pub use dispatcher::{ResolveOutcome, ResolveResponse, SearchResponse, SessionDispatcher};
pub use resolver::Resolver;
pub use url::{ParsedUrl, UrlParseError, UrlSegment};
pub use writer::{IndexWriter, WriterHandle};
