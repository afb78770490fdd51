//! Engine-wide tunables. There is no process environment in an embedded
//! library (spec.md §6: "Environment variables: none required"), so unlike
//! the teacher's `ServerConfig::from_env`/`from_cli`, this is constructed
//! directly by the host and passed to `Engine::create` by value.

#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Safety cap on variable-length relationship patterns (`*n..m`) with no
    /// declared upper bound. spec.md §9 recommends 15; no ceiling is
    /// documented in the original.
    pub max_variable_length: u32,
    /// Bucket count for the property-key cache's fixed-size open hash table.
    pub property_key_cache_slots: usize,
    /// Default PageRank damping factor when a query omits it.
    pub pagerank_default_damping: f64,
    /// Default PageRank iteration cap when a query omits it.
    pub pagerank_default_iterations: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            max_variable_length: 15,
            property_key_cache_slots: 1024,
            pagerank_default_damping: 0.85,
            pagerank_default_iterations: 20,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_original_constants() {
        let cfg = EngineConfig::default();
        assert_eq!(cfg.max_variable_length, 15);
        assert_eq!(cfg.property_key_cache_slots, 1024);
        assert_eq!(cfg.pagerank_default_damping, 0.85);
        assert_eq!(cfg.pagerank_default_iterations, 20);
    }
}
