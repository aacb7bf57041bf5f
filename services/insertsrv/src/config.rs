use serde::Deserialize;
use siridb_routing::ClassifyConfig;

/// Insert pipeline configuration (spec.md §6 "Configuration").
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct InsertConfig {
    pub insert_timeout_ms: u64,
    pub ts_min: i64,
    pub ts_max: i64,
    pub pool_count: u16,
    /// Which pool id this node owns locally — its sub-batch is written
    /// straight to the registry/storage collaborators instead of going
    /// out over the transport (spec.md §4.4 "Local pool processing").
    pub local_pool_id: u16,
}

impl InsertConfig {
    pub fn classify_config(&self) -> ClassifyConfig {
        ClassifyConfig {
            ts_min: self.ts_min,
            ts_max: self.ts_max,
        }
    }
}

impl Default for InsertConfig {
    fn default() -> Self {
        Self {
            insert_timeout_ms: 15_000,
            ts_min: 0,
            ts_max: 4_102_444_800,
            pool_count: 1,
            local_pool_id: 0,
        }
    }
}
