//! In-memory registry and storage implementations.
//!
//! Stand in for the production series dictionary and shard storage engine
//! in tests and demos, the way `voltage_rtdb::MemoryRtdb` stands in for
//! `RedisRtdb`.

use crate::error::{Result, RtdbError};
use crate::traits::{SeriesHandle, SeriesRegistry, Storage, ValueType};
use async_trait::async_trait;
use dashmap::DashMap;
use siridb_model::{Point, Value};
use std::sync::atomic::{AtomicU64, Ordering};

/// Lock-free in-memory series registry.
pub struct MemoryRegistry {
    by_name: DashMap<Vec<u8>, (SeriesHandle, ValueType)>,
    by_handle: DashMap<SeriesHandle, ValueType>,
    next_id: AtomicU64,
}

impl MemoryRegistry {
    pub fn new() -> Self {
        Self {
            by_name: DashMap::new(),
            by_handle: DashMap::new(),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

impl Default for MemoryRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SeriesRegistry for MemoryRegistry {
    async fn get_or_create(
        &self,
        name: &[u8],
        inferred_value_type: ValueType,
    ) -> Result<SeriesHandle> {
        if let Some(entry) = self.by_name.get(name) {
            return Ok(entry.0);
        }

        // entry() makes the get-or-insert atomic across concurrent callers
        // racing to create the same series name.
        let entry = self.by_name.entry(name.to_vec()).or_insert_with(|| {
            let id = self.next_id.fetch_add(1, Ordering::Relaxed);
            let handle = SeriesHandle(id);
            self.by_handle.insert(handle, inferred_value_type);
            (handle, inferred_value_type)
        });
        Ok(entry.0)
    }

    async fn value_type(&self, handle: SeriesHandle) -> Option<ValueType> {
        self.by_handle.get(&handle).map(|v| *v)
    }
}

/// In-memory append sink, recording every `(timestamp, value)` written per
/// handle in submission order for test assertions.
#[derive(Default)]
pub struct MemoryStorage {
    points: DashMap<SeriesHandle, Vec<Point>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn points_for(&self, handle: SeriesHandle) -> Vec<Point> {
        self.points.get(&handle).map(|e| e.clone()).unwrap_or_default()
    }

    pub fn total_points(&self) -> usize {
        self.points.iter().map(|e| e.value().len()).sum()
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn append(&self, handle: SeriesHandle, point: &Point) -> Result<()> {
        self.points.entry(handle).or_default().push(point.clone());
        Ok(())
    }
}

/// A `Storage` that always fails, for exercising dispatch error paths.
pub struct FailingStorage {
    pub reason: String,
}

#[async_trait]
impl Storage for FailingStorage {
    async fn append(&self, _handle: SeriesHandle, _point: &Point) -> Result<()> {
        Err(RtdbError::Other(anyhow::anyhow!(self.reason.clone())))
    }
}
