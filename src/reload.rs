//! Reload coordinator: serialised full re-ingestion with an atomic
//! swap of the visible aggregate.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::{error, info, warn};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::config::IngestionConfig;
use crate::error::{ServiceError, ServiceResult};
use crate::ingest::{ChunkSource, IngestionReport, WorkerPool};
use crate::store::{AggregateStore, StoreHandle};

/// Lifecycle of the most recent reload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReloadState {
    /// No reload has run yet
    Idle,
    /// A reload is in flight
    Running,
    /// The last reload committed its aggregate
    Completed,
    /// The last reload aborted; the prior aggregate is untouched
    Failed,
}

/// Outcome summary returned to the reload trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReloadSummary {
    /// Terminal state of the run
    pub status: ReloadState,
    /// Valid readings folded into the new aggregate
    pub records_processed: u64,
    /// Rows skipped as malformed or cityless
    pub malformed_count: u64,
}

/// Observer notified when a reload finishes. `success` is true only
/// when the new aggregate was committed; the query layer uses this to
/// sequence its wholesale cache invalidation.
pub trait ReloadObserver: Send + Sync {
    /// Called after every reload attempt, on the reloading thread.
    fn on_reload_completed(&self, success: bool);
}

/// Serialises reloads and guarantees atomic visibility of the swap from
/// the old to the new aggregate.
///
/// At most one reload is in flight; a request arriving while one runs
/// is rejected with [`ServiceError::ReloadInProgress`] rather than
/// queued. The new aggregate is built into a fresh
/// [`AggregateStore`] off to the side, so readers keep the previous,
/// fully valid aggregate for the entire duration; a failed run is
/// discarded without any visible effect.
pub struct ReloadCoordinator {
    store: Arc<StoreHandle>,
    config: IngestionConfig,
    running: AtomicBool,
    state: Mutex<ReloadState>,
    observers: Mutex<Vec<Arc<dyn ReloadObserver>>>,
}

impl ReloadCoordinator {
    /// Create a coordinator over the visible store slot.
    pub fn new(store: Arc<StoreHandle>, config: IngestionConfig) -> Self {
        Self {
            store,
            config,
            running: AtomicBool::new(false),
            state: Mutex::new(ReloadState::Idle),
            observers: Mutex::new(Vec::new()),
        }
    }

    /// Register an observer for reload completion.
    pub fn subscribe(&self, observer: Arc<dyn ReloadObserver>) {
        self.observers.lock().push(observer);
    }

    /// State of the most recent reload.
    pub fn state(&self) -> ReloadState {
        *self.state.lock()
    }

    /// Run a full re-ingestion of `source_path`, replacing the entire
    /// visible aggregate on success.
    pub fn run_ingestion(&self, source_path: &Path) -> ServiceResult<ReloadSummary> {
        if self
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            warn!("rejecting reload request: another reload is in flight");
            return Err(ServiceError::ReloadInProgress);
        }
        *self.state.lock() = ReloadState::Running;
        info!("starting reload from {}", source_path.display());

        let outcome = self.ingest_into_fresh_store(source_path);
        let result = match outcome {
            Ok((fresh, report)) => {
                self.store.swap(fresh);
                *self.state.lock() = ReloadState::Completed;
                info!(
                    "reload committed: {} records processed, {} malformed rows skipped",
                    report.records_processed, report.malformed_count
                );
                self.notify(true);
                Ok(ReloadSummary {
                    status: ReloadState::Completed,
                    records_processed: report.records_processed,
                    malformed_count: report.malformed_count,
                })
            }
            Err(err) => {
                *self.state.lock() = ReloadState::Failed;
                error!("reload failed, previous aggregate left intact: {}", err);
                self.notify(false);
                Err(err)
            }
        };

        self.running.store(false, Ordering::SeqCst);
        result
    }

    fn ingest_into_fresh_store(
        &self,
        source_path: &Path,
    ) -> ServiceResult<(Arc<AggregateStore>, IngestionReport)> {
        let file = File::open(source_path)?;
        let source = ChunkSource::new(BufReader::new(file), self.config.chunk_size);
        let fresh = Arc::new(AggregateStore::new());
        let report = WorkerPool::new(self.config.clone()).run(source, &fresh)?;
        Ok((fresh, report))
    }

    fn notify(&self, success: bool) {
        let observers: Vec<_> = self.observers.lock().iter().map(Arc::clone).collect();
        for observer in observers {
            observer.on_reload_completed(success);
        }
    }
}
