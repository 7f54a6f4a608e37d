//! Process-wide engine configuration, loaded from environment variables.
//!
//! Mirrors the knobs the reference indexer hardcodes in
//! `SearchIndex.__init__`/`start()` (index prefix, sync timeout, cache
//! sizes, cluster-health retry granularity) plus the update-by-query
//! slice count from spec.md §6, following the teacher's
//! `mcp-agent-mail-core::config` pattern: grouped fields, `env_*` helpers,
//! and a process-wide cache behind a `OnceLock`.

use std::env;
use std::sync::OnceLock;

/// Engine-wide configuration. Cheap to clone (all scalar/`String` fields).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    // Index naming
    /// Prepended to `"claims"` to form the index name, e.g. `"testnet_"`.
    pub index_prefix: String,

    // IndexWriter
    /// Bulk-stream timeout, in seconds. Rarely hit except on a fresh import.
    pub sync_timeout_secs: u64,
    /// How long `IndexWriter::start` sleeps between cluster-health polls
    /// while waiting for at least yellow status.
    pub cluster_health_poll_secs: u64,

    // Resolver caches
    pub channel_cache_size: usize,
    pub stream_cache_size: usize,

    // CensorshipApplier
    /// Parallelization slice count passed to each `update_by_query` call.
    pub update_by_query_slices: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            index_prefix: String::new(),
            sync_timeout_secs: 600,
            cluster_health_poll_secs: 1,
            channel_cache_size: 65536,
            stream_cache_size: 65536,
            update_by_query_slices: 32,
        }
    }
}

impl EngineConfig {
    /// Parses configuration from environment variables, falling back to
    /// [`EngineConfig::default`] for anything unset or unparseable.
    #[must_use]
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            index_prefix: env_value("CLAIMSEARCH_INDEX_PREFIX").unwrap_or(default.index_prefix),
            sync_timeout_secs: env_u64("CLAIMSEARCH_SYNC_TIMEOUT_SECS", default.sync_timeout_secs),
            cluster_health_poll_secs: env_u64(
                "CLAIMSEARCH_CLUSTER_HEALTH_POLL_SECS",
                default.cluster_health_poll_secs,
            ),
            channel_cache_size: env_usize("CLAIMSEARCH_CHANNEL_CACHE_SIZE", default.channel_cache_size),
            stream_cache_size: env_usize("CLAIMSEARCH_STREAM_CACHE_SIZE", default.stream_cache_size),
            update_by_query_slices: env_u32(
                "CLAIMSEARCH_UPDATE_BY_QUERY_SLICES",
                default.update_by_query_slices,
            ),
        }
    }

    /// Returns a clone of the process-wide cached configuration, parsing
    /// the environment on first call only.
    #[must_use]
    pub fn global() -> Self {
        static CACHE: OnceLock<EngineConfig> = OnceLock::new();
        CACHE.get_or_init(Self::from_env).clone()
    }
}

fn env_value(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.is_empty())
}

fn env_u64(key: &str, default: u64) -> u64 {
    env_value(key).and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_u32(key: &str, default: u32) -> u32 {
    env_value(key).and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_usize(key: &str, default: usize) -> usize {
    env_value(key).and_then(|v| v.parse().ok()).unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_matches_spec_documented_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.index_prefix, "");
        assert_eq!(config.sync_timeout_secs, 600);
        assert_eq!(config.channel_cache_size, 65536);
        assert_eq!(config.stream_cache_size, 65536);
        assert_eq!(config.cluster_health_poll_secs, 1);
        assert_eq!(config.update_by_query_slices, 32);
    }

    #[test]
    fn from_env_falls_back_to_defaults_when_unset() {
        // A key nothing else in the suite touches: naturally unset, no
        // need to mutate process env (and thus no `unsafe`) to prove it.
        assert_eq!(
            env_u64("CLAIMSEARCH_SYNC_TIMEOUT_SECS_TEST_UNSET_PROBE", 42),
            42
        );
    }
}
