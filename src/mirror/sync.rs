//! Mirror Sync Worker
//!
//! One detached task drains a bounded FIFO of mirror jobs, so writes for the
//! same callsign reach the remote in commit order. Enqueueing never blocks
//! and never fails the caller: when the queue is full the job is dropped and
//! recorded as a `MIRROR_QUEUE_FULL` failure, leaving `reconcile` to report
//! the drift. Each remote call is bounded by the configured timeout and its
//! failure lands in a bounded recent-failure log.

use std::collections::{HashSet, VecDeque};
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};
use utoipa::ToSchema;

use super::reconcile::{self, ReconcileReport};
use super::{MirrorError, MirrorRange, MirrorRecord, MirrorRow, MirrorStore, decode_rows};
use crate::config::MirrorConfig;
use crate::flight::Flight;

/// One failed mirror call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MirrorFailure {
    /// `upsert`, `delete` or `enqueue`
    pub op: String,
    /// Callsign the call was for
    pub tag: String,
    pub code: String,
    pub message: String,
    pub at: DateTime<Utc>,
}

/// Result of pushing every local flight to the mirror
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResyncSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
}

enum MirrorJob {
    Upsert(Flight),
    Delete(String),
    Resync(Vec<Flight>, oneshot::Sender<ResyncSummary>),
    Barrier(oneshot::Sender<()>),
}

struct FailureLog {
    entries: Mutex<VecDeque<MirrorFailure>>,
    capacity: usize,
}

impl FailureLog {
    fn new(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    fn record(&self, op: &str, tag: &str, err: &MirrorError) {
        if self.capacity == 0 {
            return;
        }
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        if entries.len() >= self.capacity {
            entries.pop_front();
        }
        entries.push_back(MirrorFailure {
            op: op.to_string(),
            tag: tag.to_string(),
            code: err.code().to_string(),
            message: err.to_string(),
            at: Utc::now(),
        });
    }

    fn snapshot(&self) -> Vec<MirrorFailure> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.iter().cloned().collect()
    }
}

/// Handle to the mirror worker. Cheap to share behind an `Arc`.
pub struct MirrorSync {
    store: Arc<dyn MirrorStore>,
    tx: mpsc::Sender<MirrorJob>,
    failures: Arc<FailureLog>,
    timeout: Duration,
    search_count: usize,
}

impl MirrorSync {
    /// Start the worker on the current tokio runtime.
    pub fn spawn(store: Arc<dyn MirrorStore>, config: &MirrorConfig) -> Self {
        let (tx, rx) = mpsc::channel(config.queue_capacity.max(1));
        let failures = Arc::new(FailureLog::new(config.failure_log_capacity));
        let timeout = Duration::from_millis(config.timeout_ms);

        let worker = Worker {
            store: store.clone(),
            failures: failures.clone(),
            timeout,
        };
        tokio::spawn(worker.run(rx));

        info!(
            backend = store.name(),
            timeout_ms = config.timeout_ms,
            queue_capacity = config.queue_capacity,
            "Mirror sync worker started"
        );

        Self {
            store,
            tx,
            failures,
            timeout,
            search_count: config.search_count,
        }
    }

    pub fn backend(&self) -> &'static str {
        self.store.name()
    }

    /// Queue a write of the flight's current state under its callsign.
    pub fn mirror_upsert(&self, flight: &Flight) {
        self.enqueue(MirrorJob::Upsert(flight.clone()), "upsert", &flight.callsign);
    }

    /// Queue removal of the callsign's entry.
    pub fn mirror_delete(&self, callsign: &str) {
        self.enqueue(MirrorJob::Delete(callsign.to_string()), "delete", callsign);
    }

    /// Wait until every job queued before this call has been attempted.
    pub async fn flush(&self) {
        let (done_tx, done_rx) = oneshot::channel();
        if self.tx.send(MirrorJob::Barrier(done_tx)).await.is_ok() {
            let _ = done_rx.await;
        }
    }

    /// Push every given flight through the worker queue.
    pub async fn resync_all(&self, flights: &[Flight]) -> ResyncSummary {
        let (done_tx, done_rx) = oneshot::channel();
        if self
            .tx
            .send(MirrorJob::Resync(flights.to_vec(), done_tx))
            .await
            .is_err()
        {
            return ResyncSummary {
                total: flights.len(),
                succeeded: 0,
                failed: flights.len(),
            };
        }
        done_rx.await.unwrap_or(ResyncSummary {
            total: flights.len(),
            succeeded: 0,
            failed: flights.len(),
        })
    }

    /// Current mirror contents, decoded. Entries that are not flights are
    /// dropped.
    ///
    /// Reads `search_count` keys per call until a short page comes back. A
    /// page that yields no unseen key also ends the scan.
    pub async fn mirror_rows(&self) -> Result<Vec<MirrorRow>, MirrorError> {
        let count = self.search_count.max(1);
        let mut range = MirrorRange::first(count);
        let mut seen = HashSet::new();
        let mut raw = Vec::new();

        loop {
            let page = bounded(self.timeout, self.store.get_range(range)).await?;
            let short = page.len() < count;
            let before = raw.len();
            raw.extend(page.into_iter().filter(|(tag, _)| seen.insert(tag.clone())));
            if short || raw.len() == before {
                break;
            }
            range.no += count;
        }

        debug!(keys = raw.len(), "Mirror scanned");
        Ok(decode_rows(raw))
    }

    /// Compare `local` with what the mirror currently holds.
    pub async fn reconcile(&self, local: &[Flight]) -> Result<ReconcileReport, MirrorError> {
        let rows = self.mirror_rows().await?;
        let report = reconcile::compare(local, &rows, self.recent_failures());
        info!(
            local = report.local_count,
            mirror = report.mirror_count,
            matches = report.matches,
            discrepancies = report.discrepancies.len(),
            "Mirror reconciled"
        );
        Ok(report)
    }

    /// Oldest first
    pub fn recent_failures(&self) -> Vec<MirrorFailure> {
        self.failures.snapshot()
    }

    fn enqueue(&self, job: MirrorJob, op: &str, tag: &str) {
        match self.tx.try_send(job) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                let err = MirrorError::QueueFull(self.tx.max_capacity());
                warn!(op, tag, code = err.code(), "Mirror queue full, dropping job");
                self.failures.record(op, tag, &err);
            }
            Err(TrySendError::Closed(_)) => {
                warn!(op, tag, "Mirror worker is gone, dropping mirror job");
            }
        }
    }
}

async fn bounded<T>(
    timeout: Duration,
    call: impl Future<Output = Result<T, MirrorError>>,
) -> Result<T, MirrorError> {
    match tokio::time::timeout(timeout, call).await {
        Ok(result) => result,
        Err(_) => Err(MirrorError::Timeout(timeout.as_millis() as u64)),
    }
}

struct Worker {
    store: Arc<dyn MirrorStore>,
    failures: Arc<FailureLog>,
    timeout: Duration,
}

impl Worker {
    async fn run(self, mut rx: mpsc::Receiver<MirrorJob>) {
        while let Some(job) = rx.recv().await {
            match job {
                MirrorJob::Upsert(flight) => {
                    let _ = self.upsert(&flight).await;
                }
                MirrorJob::Delete(callsign) => self.delete(&callsign).await,
                MirrorJob::Resync(flights, done) => {
                    let mut summary = ResyncSummary {
                        total: flights.len(),
                        ..Default::default()
                    };
                    for flight in &flights {
                        if self.upsert(flight).await {
                            summary.succeeded += 1;
                        } else {
                            summary.failed += 1;
                        }
                    }
                    info!(
                        total = summary.total,
                        succeeded = summary.succeeded,
                        failed = summary.failed,
                        "Mirror resync finished"
                    );
                    let _ = done.send(summary);
                }
                MirrorJob::Barrier(done) => {
                    let _ = done.send(());
                }
            }
        }
        debug!("Mirror sync worker stopped");
    }

    async fn upsert(&self, flight: &Flight) -> bool {
        let record = MirrorRecord::from_flight(flight, Utc::now());
        let value = match serde_json::to_string(&record) {
            Ok(v) => v,
            Err(e) => {
                self.fail("upsert", &flight.callsign, MirrorError::from(e));
                return false;
            }
        };

        match bounded(self.timeout, self.store.put(&flight.callsign, &value)).await {
            Ok(()) => {
                debug!(callsign = %flight.callsign, "Mirrored flight");
                true
            }
            Err(e) => {
                self.fail("upsert", &flight.callsign, e);
                false
            }
        }
    }

    async fn delete(&self, callsign: &str) {
        match bounded(self.timeout, self.store.delete(callsign)).await {
            Ok(()) => debug!(callsign, "Removed flight from mirror"),
            Err(e) => self.fail("delete", callsign, e),
        }
    }

    fn fail(&self, op: &str, tag: &str, err: MirrorError) {
        warn!(op, tag, code = err.code(), error = %err, "Mirror call failed");
        self.failures.record(op, tag, &err);
    }
}
