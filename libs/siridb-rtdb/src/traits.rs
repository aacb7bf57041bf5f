//! Trait definitions for the series registry and storage collaborators.
//!
//! These correspond to spec.md §1's external collaborators (ii) and the
//! storage engine; the insert core only ever talks to them through these
//! traits.

use crate::error::Result;
use async_trait::async_trait;
use siridb_model::{Point, Value};
use std::fmt;

/// A series' inferred value type, fixed at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    Integer,
    Float,
    String,
}

impl ValueType {
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Int(_) => ValueType::Integer,
            Value::Float(_) => ValueType::Float,
            Value::Raw(_) => ValueType::String,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ValueType::Integer => "integer",
            ValueType::Float => "float",
            ValueType::String => "string",
        }
    }
}

/// Opaque handle into the series registry/storage engine. Cheap to copy
/// and pass around a job's lifetime; the concrete meaning (row id, file
/// offset, ...) is entirely up to the storage collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SeriesHandle(pub u64);

impl fmt::Display for SeriesHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "series#{}", self.0)
    }
}

/// Get-or-create series lookup, consulted only on the local-pool dispatch
/// path (spec.md §4.4).
#[async_trait]
pub trait SeriesRegistry: Send + Sync + 'static {
    /// Look up `name`, creating it with `inferred_value_type` if it doesn't
    /// exist yet. The collaborator must serialize concurrent creations of
    /// the same name (spec.md §5 "Shared resources").
    async fn get_or_create(&self, name: &[u8], inferred_value_type: ValueType)
        -> Result<SeriesHandle>;

    /// The value type a series was created with, if it exists.
    async fn value_type(&self, handle: SeriesHandle) -> Option<ValueType>;
}

/// Append interface into the on-disk shard storage engine (out of scope
/// per spec.md §1 — this crate only defines the seam).
#[async_trait]
pub trait Storage: Send + Sync + 'static {
    async fn append(&self, handle: SeriesHandle, point: &Point) -> Result<()>;
}
