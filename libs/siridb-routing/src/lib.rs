//! Pool routing and batch classification (spec.md §4.2–4.3).

pub mod classifier;
pub mod router;

pub use classifier::{classify, ClassifyConfig, ClassifyOutcome};
pub use router::PoolRouter;
