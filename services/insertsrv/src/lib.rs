//! Insert dispatcher service: classification, fan-out, outcome
//! aggregation, and reply packaging for the SiriDB insert pipeline
//! (spec.md §4.4–4.5).

pub mod config;
pub mod dispatcher;
pub mod job;
pub mod response;
pub mod transport;

pub use config::InsertConfig;
pub use dispatcher::InsertDispatcher;
pub use job::{InsertOutcome, Job, JobState};
pub use transport::{InProcessTransport, SendOutcome, Transport};
