//! Insert dispatcher (spec.md §4.4): classifies a client payload, writes
//! the local pool's points straight to storage, fans the rest out over
//! the transport, and packages a single reply once every pool has
//! reported in or the timer fires — whichever comes first.

use crate::config::InsertConfig;
use crate::job::{InsertOutcome, Job};
use crate::response;
use crate::transport::{SendOutcome, Transport};
use bytes::Bytes;
use dashmap::DashMap;
use siridb_errors::{InsertError, PoolFailure};
use siridb_model::{Point, PoolId, Value};
use siridb_routing::{classify, PoolRouter};
use siridb_rtdb::{SeriesRegistry, Storage, ValueType};
use siridb_wire::{Decoder, Token};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// Owns the collaborators the dispatcher talks to and the registry of
/// in-flight jobs, keyed by request id (design note §9).
pub struct InsertDispatcher<R, S, T> {
    registry: Arc<R>,
    storage: Arc<S>,
    transport: Arc<T>,
    router: PoolRouter,
    config: InsertConfig,
    jobs: DashMap<u16, Arc<Job>>,
}

impl<R, S, T> InsertDispatcher<R, S, T>
where
    R: SeriesRegistry,
    S: Storage,
    T: Transport,
{
    pub fn new(registry: Arc<R>, storage: Arc<S>, transport: Arc<T>, config: InsertConfig) -> Self {
        let router = PoolRouter::new(config.pool_count);
        Self {
            registry,
            storage,
            transport,
            router,
            config,
            jobs: DashMap::new(),
        }
    }

    /// Processes one client-submitted insert payload end to end, returning
    /// the wire-encoded reply. Never fails — every path (classification
    /// error, partial pool failure, internal error) resolves to a reply
    /// package, per spec.md §7.
    #[instrument(skip(self, payload), fields(request_id))]
    pub async fn process_insert(&self, request_id: u16, payload: &[u8]) -> Vec<u8> {
        match self.try_process_insert(request_id, payload).await {
            Ok(points) => response::success_reply(points),
            Err(InsertError::Classify(err)) => {
                info!(%err, "classification failed, zero outbound packages");
                response::error_reply(&err.to_string())
            }
            Err(InsertError::PartialFailure {
                failures,
                successful_points,
            }) => response::reply_for_outcome(&InsertOutcome {
                successful_points,
                failures,
            }),
            Err(InsertError::Internal(err)) => {
                warn!(%err, "internal error while processing insert");
                response::error_reply(&format!("internal error: {err}"))
            }
        }
    }

    async fn try_process_insert(&self, request_id: u16, payload: &[u8]) -> Result<u64, InsertError> {
        let outcome = classify(payload, &self.router, &self.config.classify_config())?;

        if outcome.sub_batches.is_empty() {
            return Ok(0);
        }

        let pending_pools: HashSet<u16> = outcome.sub_batches.keys().copied().collect();
        let (job, reply_rx) = Job::new(request_id, pending_pools);
        let job = Arc::new(job);
        self.jobs.insert(request_id, job.clone());

        for (pool_id, body) in outcome.sub_batches {
            if pool_id == self.config.local_pool_id {
                debug!(pool_id, "sub-batch routed to local pool");
                self.process_local_pool(&job, pool_id, &body).await;
            } else {
                let points = outcome.points_per_pool.get(&pool_id).copied().unwrap_or(0);
                debug!(pool_id, points, "sub-batch routed to remote pool");
                self.spawn_remote_pool(job.clone(), pool_id, body, points);
            }
        }

        let deadline = Duration::from_millis(self.config.insert_timeout_ms);
        tokio::select! {
            _ = reply_rx => {}
            _ = tokio::time::sleep(deadline) => {
                warn!(request_id, "insert timed out, settling with whatever has reported in");
                job.fire_timeout();
            }
        }

        let outcome = job.snapshot();
        self.jobs.remove(&request_id);
        job.release();

        if outcome.failures.is_empty() {
            Ok(outcome.successful_points)
        } else {
            Err(InsertError::PartialFailure {
                failures: outcome.failures,
                successful_points: outcome.successful_points,
            })
        }
    }

    async fn process_local_pool(&self, job: &Arc<Job>, pool_id: PoolId, body: &[u8]) {
        match self.append_local_batch(body).await {
            Ok(appended) => job.record_success(pool_id, appended),
            Err(err) => {
                warn!(pool_id, %err, "local storage append failed");
                job.record_failure(
                    pool_id,
                    PoolFailure::StorageFailed {
                        pool_id,
                        reason: err.to_string(),
                    },
                );
            }
        }
    }

    fn spawn_remote_pool(&self, job: Arc<Job>, pool_id: PoolId, body: Vec<u8>, points: u64) {
        let transport = self.transport.clone();
        tokio::spawn(async move {
            match transport.send(pool_id, body, points).await {
                Ok(SendOutcome::Ack { points_written }) => {
                    job.record_success(pool_id, points_written);
                }
                Ok(SendOutcome::PeerError { reason }) => {
                    job.record_failure(pool_id, PoolFailure::PeerError { pool_id, reason });
                }
                Ok(SendOutcome::GarbledReply { reason }) => {
                    warn!(pool_id, %reason, "peer sent an untrustworthy reply");
                    job.record_failure(pool_id, PoolFailure::ProtocolError { pool_id, reason });
                }
                Err(err) => {
                    job.record_failure(
                        pool_id,
                        PoolFailure::SendFailed {
                            pool_id,
                            reason: err.to_string(),
                        },
                    );
                }
            }
        });
    }

    /// Decodes a finished sub-batch map (the same shape the classifier
    /// just produced — the redundant decode is deliberate, spec.md §4.4)
    /// and writes each point through the registry/storage collaborators.
    async fn append_local_batch(&self, body: &[u8]) -> anyhow::Result<u64> {
        let mut decoder = Decoder::new(body);
        let mut appended = 0u64;

        match decoder.next()? {
            Token::MapOpen => {}
            other => anyhow::bail!("local sub-batch did not start with MAP_OPEN, got {}", other.name()),
        }

        loop {
            let series_name = match decoder.next()? {
                Token::MapClose => break,
                Token::Raw(name) => name,
                other => anyhow::bail!("expected series name, got {}", other.name()),
            };

            match decoder.next()? {
                Token::ArrayOpen => {}
                other => anyhow::bail!("expected ARRAY_OPEN, got {}", other.name()),
            }

            let mut handle = None;
            loop {
                match decoder.next()? {
                    Token::ArrayClose => break,
                    Token::Array(2) => {
                        let timestamp = match decoder.next()? {
                            Token::Int(v) => v,
                            other => anyhow::bail!("expected timestamp, got {}", other.name()),
                        };
                        let value = match decoder.next()? {
                            Token::Int(v) => Value::Int(v),
                            Token::Double(v) => Value::Float(v),
                            Token::Raw(v) => Value::Raw(Bytes::copy_from_slice(v)),
                            other => anyhow::bail!("expected value, got {}", other.name()),
                        };

                        let incoming_type = ValueType::of(&value);
                        let handle = match handle {
                            Some(h) => h,
                            None => {
                                let h = self.registry.get_or_create(series_name, incoming_type).await?;
                                handle = Some(h);
                                h
                            }
                        };

                        if let Some(existing_type) = self.registry.value_type(handle).await {
                            if existing_type != incoming_type {
                                return Err(siridb_rtdb::RtdbError::TypeMismatch {
                                    name: String::from_utf8_lossy(series_name).into_owned(),
                                    existing: existing_type.name(),
                                    incoming: incoming_type.name(),
                                }
                                .into());
                            }
                        }

                        self.storage.append(handle, &Point::new(timestamp, value)).await?;
                        appended += 1;
                    }
                    other => anyhow::bail!("expected point ARRAY2, got {}", other.name()),
                }
            }
        }

        Ok(appended)
    }
}
