//! Shared error types for the insert pipeline.
//!
//! Variant names and `Display` text for `ClassifyError` and `WireError`
//! are chosen to match the wire error codes enumerated in the insert
//! protocol's external interface spec verbatim, since client libraries
//! parse the prose.

use thiserror::Error;

/// Errors raised by the wire codec (decoder/encoder).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WireError {
    #[error("MALFORMED: truncated input")]
    TruncatedInput,

    #[error("MALFORMED: unknown tag byte 0x{0:02X}")]
    UnknownTag(u8),

    #[error("MALFORMED: nested structure underflow")]
    StructureUnderflow,
}

/// Errors raised by the batch classifier (spec.md §4.2, §6).
///
/// Fatal for the whole insert request: on any of these, classification
/// aborts and zero outbound packages are produced.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClassifyError {
    #[error("EXPECTING_MAP_OR_ARRAY")]
    ExpectingMapOrArray,

    #[error("EXPECTING_SERIES_NAME_AND_POINTS")]
    ExpectingSeriesNameAndPoints,

    #[error("EXPECTING_ARRAY_OF_POINTS")]
    ExpectingArrayOfPoints,

    #[error("EXPECTING_AT_LEAST_ONE_POINT")]
    ExpectingAtLeastOnePoint,

    #[error("EXPECTING_INTEGER_TS")]
    ExpectingIntegerTs,

    #[error("TIMESTAMP_OUT_OF_RANGE")]
    TimestampOutOfRange,

    #[error("UNSUPPORTED_VALUE")]
    UnsupportedValue,

    #[error(transparent)]
    Wire(#[from] WireError),
}

/// A single pool's dispatch failure, named so the aggregated error reply
/// can list which pools failed (spec.md §7).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PoolFailure {
    #[error("send to pool {pool_id} failed: {reason}")]
    SendFailed { pool_id: u16, reason: String },

    #[error("pool {pool_id} returned an error: {reason}")]
    PeerError { pool_id: u16, reason: String },

    #[error("local storage append failed for pool {pool_id}: {reason}")]
    StorageFailed { pool_id: u16, reason: String },

    #[error("pool {pool_id} timed out")]
    Timeout { pool_id: u16 },

    #[error("pool {pool_id} sent a malformed reply: {reason}")]
    ProtocolError { pool_id: u16, reason: String },
}

impl PoolFailure {
    pub fn pool_id(&self) -> u16 {
        match self {
            PoolFailure::SendFailed { pool_id, .. }
            | PoolFailure::PeerError { pool_id, .. }
            | PoolFailure::StorageFailed { pool_id, .. }
            | PoolFailure::Timeout { pool_id }
            | PoolFailure::ProtocolError { pool_id, .. } => *pool_id,
        }
    }
}

/// Top-level error for the insert dispatcher.
#[derive(Error, Debug)]
pub enum InsertError {
    #[error("classification failed: {0}")]
    Classify(#[from] ClassifyError),

    /// Partial success: some pools acknowledged, some failed. Carries the
    /// point count that *did* succeed so the response packager can report
    /// it (spec.md §4.4 "Completion").
    #[error("insert failed on {} pool(s)", .failures.len())]
    PartialFailure {
        failures: Vec<PoolFailure>,
        successful_points: u64,
    },

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}
