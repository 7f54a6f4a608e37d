//! The `IndexBackend` seam: the trait abstracting an external
//! search/index store, the request/response shapes it speaks, and an
//! in-memory fake implementation.

pub mod backend;
pub mod memory;
pub mod response;
pub mod settings;

pub use backend::{IndexBackend, KeyedField, UpdateByQuery, UpdateByQueryResult};
pub use memory::MemoryBackend;
pub use response::{
    BulkAction, BulkItemResult, BulkResult, ClusterHealthStatus, MultiGetResponse, SearchHit,
    SearchResponse, flatten_collapsed_hits,
};
pub use settings::{AnalyzerSettings, ClaimIdMapping, IndexSettings};
