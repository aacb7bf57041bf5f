//! Error types for the series registry and storage collaborators.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RtdbError {
    #[error("series type mismatch for {name}: series is {existing}, point is {incoming}")]
    TypeMismatch {
        name: String,
        existing: &'static str,
        incoming: &'static str,
    },

    #[error("unknown series handle {0:?}")]
    UnknownHandle(crate::SeriesHandle),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, RtdbError>;
