use rustc_hash::FxHasher;
use siridb_model::PoolId;
use std::hash::Hasher;

/// Pure, deterministic, side-effect-free `series_name -> pool_id` mapping
/// (spec.md §4.3).
///
/// Open Question (spec.md §9) resolved: the "stable hashing scheme" is
/// `FxHasher` (already a workspace dependency used elsewhere for small-key
/// hashing), seeded with a fixed constant so the mapping is stable across
/// process restarts — required since spec.md §3 invariants demand a series
/// name hash to exactly one pool "at any instant", and in practice across
/// the life of the cluster.
#[derive(Debug, Clone, Copy)]
pub struct PoolRouter {
    pool_count: u16,
}

/// Seed mixed into every hash so the router's output doesn't collide with
/// `FxHasher`'s use elsewhere in the process for unrelated keys.
const SEED: u64 = 0x5111_D13D_B001_0001;

impl PoolRouter {
    /// `pool_count` must be non-zero — a cluster always has at least one
    /// pool.
    pub fn new(pool_count: u16) -> Self {
        assert!(pool_count > 0, "pool_count must be non-zero");
        Self { pool_count }
    }

    pub fn pool_count(&self) -> u16 {
        self.pool_count
    }

    /// Route a non-empty series name to its owning pool.
    ///
    /// Never fails for a non-empty name (spec.md §4.3); empty names are
    /// rejected upstream by the classifier before routing is ever
    /// attempted.
    pub fn pool_of(&self, series_name: &[u8]) -> PoolId {
        let mut hasher = FxHasher::default();
        hasher.write_u64(SEED);
        hasher.write(series_name);
        (hasher.finish() % self.pool_count as u64) as PoolId
    }
}
