//! Insert job state machine (spec.md §4.4, design note §9).
//!
//! CLASSIFIED is implicit — a `Job` only exists once classification has
//! already succeeded. From there: FANOUT while pools are outstanding,
//! REPLIED the instant either every pool has reported in or the timer
//! fires (whichever comes first, guarded so it only happens once),
//! RELEASED when the dispatcher has taken the reply and torn the entry
//! down.

use siridb_errors::PoolFailure;
use std::collections::HashSet;
use std::sync::Mutex;
use tokio::sync::oneshot;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Fanout,
    Replied,
    Released,
}

/// What the dispatcher hands to the response packager once a job settles.
#[derive(Debug, Clone)]
pub struct InsertOutcome {
    pub successful_points: u64,
    pub failures: Vec<PoolFailure>,
}

struct JobInner {
    state: JobState,
    pending_pools: HashSet<u16>,
    successful_points: u64,
    failures: Vec<PoolFailure>,
    reply_tx: Option<oneshot::Sender<InsertOutcome>>,
}

/// One in-flight insert request, tracked in the dispatcher's job registry
/// by request id (spec.md §9: "prefer a registry keyed by request id" over
/// weak back-pointers from the transport).
pub struct Job {
    pub request_id: u16,
    inner: Mutex<JobInner>,
}

impl Job {
    /// Creates a job already in FANOUT, owning one reply slot per pool
    /// named in `pending_pools`. Returns the job plus the receiver that
    /// resolves exactly once, whenever the job settles.
    pub fn new(request_id: u16, pending_pools: HashSet<u16>) -> (Self, oneshot::Receiver<InsertOutcome>) {
        let (tx, rx) = oneshot::channel();
        let job = Self {
            request_id,
            inner: Mutex::new(JobInner {
                state: JobState::Fanout,
                pending_pools,
                successful_points: 0,
                failures: Vec::new(),
                reply_tx: Some(tx),
            }),
        };
        (job, rx)
    }

    pub fn state(&self) -> JobState {
        self.inner.lock().unwrap().state
    }

    /// Reads the job's current totals, regardless of whether the one-shot
    /// reply channel has already been consumed. Safe to call any time
    /// after the job has left FANOUT.
    pub fn snapshot(&self) -> InsertOutcome {
        let inner = self.inner.lock().unwrap();
        InsertOutcome {
            successful_points: inner.successful_points,
            failures: inner.failures.clone(),
        }
    }

    /// A pool acknowledged its sub-batch. Ignored if the pool already
    /// settled (it shouldn't) or the job already left FANOUT (a late
    /// reply after timeout) — spec.md §3 "a timed-out in-flight request
    /// releases its buffers exactly once even if a late reply arrives".
    pub fn record_success(&self, pool_id: u16, points_written: u64) {
        let mut inner = self.inner.lock().unwrap();
        if inner.state != JobState::Fanout || !inner.pending_pools.remove(&pool_id) {
            warn!(request_id = self.request_id, pool_id, "dropping late pool reply");
            return;
        }
        inner.successful_points += points_written;
        Self::maybe_complete(&mut inner);
    }

    pub fn record_failure(&self, pool_id: u16, failure: PoolFailure) {
        let mut inner = self.inner.lock().unwrap();
        if inner.state != JobState::Fanout || !inner.pending_pools.remove(&pool_id) {
            warn!(request_id = self.request_id, pool_id, "dropping late pool failure");
            return;
        }
        inner.failures.push(failure);
        Self::maybe_complete(&mut inner);
    }

    /// The job's timer fired. Any pools still pending are recorded as
    /// timeouts and the job settles immediately. A no-op if the job
    /// already settled on its own.
    pub fn fire_timeout(&self) {
        let mut inner = self.inner.lock().unwrap();
        if inner.state != JobState::Fanout {
            return;
        }
        for pool_id in inner.pending_pools.drain().collect::<Vec<_>>() {
            inner.failures.push(PoolFailure::Timeout { pool_id });
        }
        Self::complete(&mut inner);
    }

    fn maybe_complete(inner: &mut JobInner) {
        if inner.pending_pools.is_empty() {
            Self::complete(inner);
        }
    }

    fn complete(inner: &mut JobInner) {
        inner.state = JobState::Replied;
        if let Some(tx) = inner.reply_tx.take() {
            let _ = tx.send(InsertOutcome {
                successful_points: inner.successful_points,
                failures: inner.failures.clone(),
            });
        }
    }

    /// Tears the job down after its single reply has been sent. Idempotent:
    /// calling it twice never double-releases anything, since there's
    /// nothing left to release after the first call.
    pub fn release(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.state = JobState::Released;
    }
}
