//! Series registry and storage collaborator traits, plus in-memory
//! implementations for tests and demos.

pub mod error;
pub mod memory_impl;
pub mod traits;

pub use error::RtdbError;
pub use memory_impl::{FailingStorage, MemoryRegistry, MemoryStorage};
pub use traits::{SeriesHandle, SeriesRegistry, Storage, ValueType};
