//! Remote-pool transport seam (spec.md §6 `transport.send`).
//!
//! The production transport is the cluster's inter-node TCP link; out of
//! scope here (spec.md §1). This module defines the trait the dispatcher
//! depends on plus an in-process stand-in for tests, the way
//! `comsrv`'s protocol backends sit behind a single connection trait.

use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Outcome of forwarding one sub-batch to a remote pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    Ack { points_written: u64 },
    PeerError { reason: String },
    /// The peer replied, but the reply itself couldn't be trusted: unknown
    /// reply type, truncated body, or a correlation id that doesn't match
    /// the request (spec.md §7 tier 3).
    GarbledReply { reason: String },
}

/// Fans a pool's sub-batch out to its owning peer.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    async fn send(&self, pool_id: u16, body: Vec<u8>, points: u64) -> anyhow::Result<SendOutcome>;
}

/// In-process transport for tests and demos: every pool either acks
/// immediately, or — if configured to — stalls past the dispatcher's
/// timeout, or returns a peer error.
#[derive(Debug, Default)]
pub struct InProcessTransport {
    stalled_pools: dashmap::DashSet<u16>,
    failing_pools: dashmap::DashMap<u16, String>,
    garbled_pools: dashmap::DashMap<u16, String>,
    sends_observed: AtomicU64,
}

impl InProcessTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make sends to `pool_id` never resolve inside the dispatcher's
    /// timeout window (spec.md §8 scenario 6).
    pub fn stall(&self, pool_id: u16) {
        self.stalled_pools.insert(pool_id);
    }

    pub fn fail(&self, pool_id: u16, reason: impl Into<String>) {
        self.failing_pools.insert(pool_id, reason.into());
    }

    /// Make sends to `pool_id` come back with an untrustworthy reply
    /// (spec.md §7 tier 3) instead of a clean ack or peer error.
    pub fn garble(&self, pool_id: u16, reason: impl Into<String>) {
        self.garbled_pools.insert(pool_id, reason.into());
    }

    pub fn sends_observed(&self) -> u64 {
        self.sends_observed.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl Transport for InProcessTransport {
    async fn send(&self, pool_id: u16, _body: Vec<u8>, points: u64) -> anyhow::Result<SendOutcome> {
        self.sends_observed.fetch_add(1, Ordering::Relaxed);

        if self.stalled_pools.contains(&pool_id) {
            // Outlives any sane test timeout; the dispatcher's own timer
            // is what actually cuts this short.
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }

        if let Some(reason) = self.garbled_pools.get(&pool_id) {
            return Ok(SendOutcome::GarbledReply {
                reason: reason.clone(),
            });
        }

        if let Some(reason) = self.failing_pools.get(&pool_id) {
            return Ok(SendOutcome::PeerError {
                reason: reason.clone(),
            });
        }

        Ok(SendOutcome::Ack {
            points_written: points,
        })
    }
}
