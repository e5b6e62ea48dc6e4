//! Walk coordinator - orchestrates the parallel bucket enumeration
//!
//! The coordinator is responsible for:
//! - Validating the configuration
//! - Setting up the counters, pending queue, and channels
//! - Seeding the start prefix and spawning the worker pool
//! - Forwarding records from the workers to the output stream
//! - Watching the counters and closing the stream on quiescence

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, info};

use crate::client::ObjectStoreClient;
use crate::config::ListConfig;
use crate::error::WalkerError;
use crate::walker::counters::WorkCounters;
use crate::walker::fetcher::PageFetcher;
use crate::walker::queue::PendingQueue;
use crate::walker::worker::worker_loop;
use crate::walker::{ListEvent, ObjectStream};

/// Delimiter used for hierarchical listing.
const DELIMITER: &str = "/";

/// How often the monitor re-checks the quiescence predicate.
const MONITOR_POLL: Duration = Duration::from_millis(5);

/// Statistics collected during a walk
#[derive(Debug, Default)]
pub struct WalkStats {
    pub prefixes_walked: AtomicU64,
    pub objects_emitted: AtomicU64,
    pub pages_fetched: AtomicU64,
    pub retries: AtomicU64,
}

impl WalkStats {
    pub fn record_prefix(&self) {
        self.prefixes_walked.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_object(&self) {
        self.objects_emitted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_page(&self) {
        self.pages_fetched.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_retry(&self) {
        self.retries.fetch_add(1, Ordering::Relaxed);
    }

    pub fn prefixes_walked(&self) -> u64 {
        self.prefixes_walked.load(Ordering::Relaxed)
    }

    pub fn objects_emitted(&self) -> u64 {
        self.objects_emitted.load(Ordering::Relaxed)
    }

    pub fn pages_fetched(&self) -> u64 {
        self.pages_fetched.load(Ordering::Relaxed)
    }

    pub fn retries(&self) -> u64 {
        self.retries.load(Ordering::Relaxed)
    }
}

/// Coordinates the parallel bucket enumeration.
///
/// Must be started from within a tokio runtime.
pub struct BucketWalker {
    client: Arc<dyn ObjectStoreClient>,
    config: ListConfig,
    shutdown: Arc<AtomicBool>,
    stats: Arc<WalkStats>,
}

impl BucketWalker {
    /// Create a walker over the given client and configuration.
    pub fn new(client: Arc<dyn ObjectStoreClient>, config: ListConfig) -> Self {
        Self {
            client,
            config,
            shutdown: Arc::new(AtomicBool::new(false)),
            stats: Arc::new(WalkStats::default()),
        }
    }

    /// Get a clone of the shutdown flag (for signal handlers).
    ///
    /// Storing `true` cancels the walk: workers stop at their next receive,
    /// the fetchers stop between pages, and the stream closes after a single
    /// [`WalkerError::Cancelled`] sentinel.
    pub fn shutdown_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.shutdown)
    }

    /// Get a handle to the run statistics.
    pub fn stats(&self) -> Arc<WalkStats> {
        Arc::clone(&self.stats)
    }

    /// Start the walk and return the lazy stream of results.
    ///
    /// Each element is either a discovered [`ObjectRecord`] or a terminal
    /// error sentinel; the stream closes once the bucket subtree has been
    /// fully visited. A configuration error surfaces as the first and only
    /// element, mirroring the engine's other fatal paths.
    ///
    /// [`ObjectRecord`]: crate::client::ObjectRecord
    pub fn start(self) -> ObjectStream {
        let (output_tx, output_rx) = mpsc::channel(self.config.record_buffer.max(1));

        match self.config.validate() {
            Ok(()) => self.spawn_engine(output_tx),
            Err(error) => {
                // Capacity is at least 1, so the sentinel always fits.
                let _ = output_tx.try_send(Err(WalkerError::Config(error)));
            }
        }

        ReceiverStream::new(output_rx)
    }

    fn spawn_engine(self, output_tx: mpsc::Sender<ListEvent>) {
        let start_prefix = self.config.start_prefix();
        let start_time = Instant::now();

        info!(
            bucket = %self.config.bucket,
            prefix = %start_prefix,
            workers = self.config.concurrency,
            "starting bucket walk"
        );

        let counters = Arc::new(WorkCounters::new());
        let queue = PendingQueue::spawn();
        let (record_tx, record_rx) = mpsc::channel::<ListEvent>(self.config.record_buffer);

        let fetcher = Arc::new(PageFetcher::new(
            Arc::clone(&self.client),
            self.config.bucket.clone(),
            Some(DELIMITER.to_string()),
            self.config.retry_policy.clone(),
            Arc::clone(&self.shutdown),
            Arc::clone(&self.stats),
        ));

        // Seed before anything can observe the counters: the start prefix is
        // counted first, then handed off.
        let ingress = queue.sender();
        counters.add_prefixes(1);
        let _ = ingress.send(start_prefix);

        for id in 0..self.config.concurrency {
            tokio::spawn(worker_loop(
                id,
                Arc::clone(&fetcher),
                queue.receiver(),
                ingress.clone(),
                record_tx.clone(),
                Arc::clone(&counters),
                Arc::clone(&self.shutdown),
                Arc::clone(&self.stats),
            ));
        }

        // Workers hold the only remaining senders; once they exit, the
        // record channel drains to empty and the forwarder follows them out.
        drop(record_tx);
        drop(ingress);
        drop(queue);

        // One sentinel at most: set by whichever path surfaces an error.
        let sentinel_sent = Arc::new(AtomicBool::new(false));

        // Raised by the monitor only when the walk reached quiescence, so
        // the forwarder can tell a finished walk from a cancelled one.
        let completed = Arc::new(AtomicBool::new(false));

        tokio::spawn(forward_records(
            record_rx,
            output_tx,
            Arc::clone(&counters),
            Arc::clone(&self.shutdown),
            Arc::clone(&sentinel_sent),
            Arc::clone(&completed),
            Arc::clone(&self.stats),
        ));

        tokio::spawn(monitor_loop(
            counters,
            self.shutdown,
            completed,
            self.stats,
            start_time,
        ));
    }
}

/// Move records from the worker egress to the output stream, decrementing
/// the in-flight counter once per forwarded record. Owns the only output
/// sender, so the stream closes exactly when this task exits.
async fn forward_records(
    mut record_rx: mpsc::Receiver<ListEvent>,
    output_tx: mpsc::Sender<ListEvent>,
    counters: Arc<WorkCounters>,
    shutdown: Arc<AtomicBool>,
    sentinel_sent: Arc<AtomicBool>,
    completed: Arc<AtomicBool>,
    stats: Arc<WalkStats>,
) {
    while let Some(event) = record_rx.recv().await {
        match event {
            Ok(record) => {
                if output_tx.send(Ok(record)).await.is_err() {
                    // The consumer dropped the stream. Stop the engine so the
                    // workers unwind instead of filling channels forever.
                    debug!("output stream abandoned, cancelling walk");
                    shutdown.store(true, Ordering::SeqCst);
                    break;
                }
                counters.finish_object();
                stats.record_object();
            }
            Err(error) => {
                // Terminal sentinel from a worker. Forward exactly one.
                if !sentinel_sent.swap(true, Ordering::SeqCst) {
                    let _ = output_tx.send(Err(error)).await;
                }
                shutdown.store(true, Ordering::SeqCst);
                break;
            }
        }
    }

    // A walk that stopped before reaching quiescence was cancelled; report
    // that after the drained records, unless a sentinel already went out.
    if shutdown.load(Ordering::SeqCst)
        && !completed.load(Ordering::SeqCst)
        && !sentinel_sent.swap(true, Ordering::SeqCst)
    {
        let _ = output_tx.send(Err(WalkerError::Cancelled)).await;
    }
}

/// Poll the quiescence predicate; stop the engine when all work is done or
/// the shutdown flag is raised externally.
async fn monitor_loop(
    counters: Arc<WorkCounters>,
    shutdown: Arc<AtomicBool>,
    completed: Arc<AtomicBool>,
    stats: Arc<WalkStats>,
    start_time: Instant,
) {
    loop {
        if shutdown.load(Ordering::Relaxed) {
            break;
        }

        if counters.is_quiescent() {
            completed.store(true, Ordering::SeqCst);
            break;
        }

        tokio::time::sleep(MONITOR_POLL).await;
    }

    shutdown.store(true, Ordering::SeqCst);

    let (pending, in_flight) = counters.snapshot();
    info!(
        prefixes = stats.prefixes_walked(),
        objects = stats.objects_emitted(),
        pages = stats.pages_fetched(),
        retries = stats.retries(),
        pending_prefixes = pending,
        in_flight_objects = in_flight,
        completed = completed.load(Ordering::SeqCst),
        duration_ms = start_time.elapsed().as_millis() as u64,
        "bucket walk finished"
    );
}
