//! Worker pool: parallel parse/fold of chunks with bounded buffering.

use std::collections::HashMap;
use std::io::BufRead;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, SyncSender};
use std::thread;

use log::{debug, trace, warn};
use parking_lot::Mutex;

use crate::config::IngestionConfig;
use crate::error::{ServiceError, ServiceResult};
use crate::ingest::chunker::{Chunk, ChunkSource};
use crate::ingest::parser;
use crate::models::CityAggregates;
use crate::store::AggregateStore;

/// Counters reported by one ingestion run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestionReport {
    /// Valid readings folded into the aggregate
    pub records_processed: u64,
    /// Rows skipped: parse failures plus blank-city readings
    pub malformed_count: u64,
}

/// Fixed-size pool of worker threads draining a chunk source.
///
/// The calling thread acts as the single reader: it pulls chunks
/// sequentially and feeds a bounded queue sized by `queue_capacity`, so
/// a fast reader blocks instead of buffering the file (backpressure).
/// Workers pull chunks from the queue under mutual exclusion, fold each
/// chunk into a private partial aggregate without any locking, and only
/// synchronise on the short per-city merge into the shared store.
pub struct WorkerPool {
    config: IngestionConfig,
}

impl WorkerPool {
    /// Create a pool description; threads are spawned per run.
    pub fn new(config: IngestionConfig) -> Self {
        Self { config }
    }

    /// Drain `source` through `pool_size` workers, merging every
    /// chunk-local partial aggregate into `store`.
    ///
    /// Row-level failures are swallowed and counted; a stream-level read
    /// failure trips the abort flag, stops the pool and fails the run.
    /// Chunks may complete in any order; because merging only adds,
    /// the final aggregate is independent of scheduling.
    pub fn run<R>(
        &self,
        mut source: ChunkSource<R>,
        store: &AggregateStore,
    ) -> ServiceResult<IngestionReport>
    where
        R: BufRead + Send,
    {
        let (sender, receiver) = mpsc::sync_channel::<Chunk>(self.config.queue_capacity);
        let receiver = Mutex::new(receiver);
        let abort = AtomicBool::new(false);
        let records = AtomicU64::new(0);
        let malformed = AtomicU64::new(0);

        let read_result = thread::scope(|scope| {
            let receiver = &receiver;
            let abort = &abort;
            let records = &records;
            let malformed = &malformed;

            for worker_id in 0..self.config.pool_size {
                scope.spawn(move || {
                    worker_loop(worker_id, receiver, store, records, malformed, abort)
                });
            }

            // The reader runs on the calling thread: stream reads stay
            // strictly sequential and ordered.
            let result = feed_queue(&mut source, &sender, abort);
            // Closing the queue lets idle workers exit their recv loop.
            drop(sender);
            result
        });

        read_result?;
        Ok(IngestionReport {
            records_processed: records.load(Ordering::SeqCst),
            malformed_count: malformed.load(Ordering::SeqCst),
        })
    }
}

/// Pull chunks off the source and push them into the bounded queue,
/// blocking when the queue is full.
fn feed_queue<R: BufRead>(
    source: &mut ChunkSource<R>,
    sender: &SyncSender<Chunk>,
    abort: &AtomicBool,
) -> ServiceResult<()> {
    loop {
        match source.next_chunk() {
            Ok(Some(chunk)) => {
                if sender.send(chunk).is_err() {
                    warn!("chunk queue closed before end of input");
                    return Err(ServiceError::QueueClosed);
                }
            }
            Ok(None) => return Ok(()),
            Err(err) => {
                abort.store(true, Ordering::SeqCst);
                return Err(err);
            }
        }
    }
}

fn worker_loop(
    worker_id: usize,
    receiver: &Mutex<Receiver<Chunk>>,
    store: &AggregateStore,
    records: &AtomicU64,
    malformed: &AtomicU64,
    abort: &AtomicBool,
) {
    loop {
        if abort.load(Ordering::SeqCst) {
            debug!("worker {} stopping: run aborted", worker_id);
            return;
        }

        // Holding the lock across recv keeps queue access exclusive;
        // other workers park on the mutex instead of the channel.
        let next = receiver.lock().recv();
        let Ok(chunk) = next else {
            trace!("worker {} stopping: queue drained", worker_id);
            return;
        };

        let lines = chunk.len();
        let (folded, valid, skipped) = fold_chunk(&chunk);
        records.fetch_add(valid, Ordering::SeqCst);
        malformed.fetch_add(skipped, Ordering::SeqCst);

        for (city, partial) in &folded {
            store.merge_city(city, partial);
        }
        trace!(
            "worker {} merged chunk: {} lines, {} valid, {} skipped",
            worker_id,
            lines,
            valid,
            skipped
        );
    }
}

/// Fold one chunk into a chunk-local aggregate. Private to the calling
/// worker, so no locking is involved. Returns the partial aggregate and
/// the (valid, skipped) row counts.
fn fold_chunk(chunk: &Chunk) -> (HashMap<String, CityAggregates>, u64, u64) {
    let mut folded: HashMap<String, CityAggregates> = HashMap::new();
    let mut valid = 0;
    let mut skipped = 0;

    for line in chunk {
        if line.trim().is_empty() {
            continue;
        }
        match parser::parse_line(line) {
            Ok(reading) if reading.city.is_empty() => {
                // A reading with no city contributes nothing.
                skipped += 1;
            }
            Ok(reading) => {
                folded
                    .entry(reading.city.clone())
                    .or_default()
                    .entry(reading.year())
                    .or_default()
                    .add_sample(reading.temperature);
                valid += 1;
            }
            Err(err) => {
                skipped += 1;
                debug!("skipping malformed row: {}", err);
            }
        }
    }

    (folded, valid, skipped)
}
