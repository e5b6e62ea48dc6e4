//! Worker task logic
//!
//! Each worker pulls one prefix at a time from the dispatch channel, drives
//! the page fetcher over that prefix to exhaustion, and for every page:
//!
//! 1. increments the work counters (BEFORE anything leaves the worker),
//! 2. pushes newly discovered child prefixes onto the queue ingress,
//! 3. forwards object records to the record channel.
//!
//! After the last page it decrements the prefix counter. The counter-first
//! ordering is what makes a quiescent observation authoritative: work that
//! has not been counted has not been handed off yet.
//!
//! Workers never exit on their own; they poll the shutdown flag between
//! receive attempts and are stopped by the coordinator once the walk
//! terminates.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, trace, warn};

use crate::error::{Result, WalkerError};
use crate::walker::coordinator::WalkStats;
use crate::walker::counters::WorkCounters;
use crate::walker::fetcher::PageFetcher;
use crate::walker::queue::PrefixSender;
use crate::walker::ListEvent;

/// How long a worker waits for a prefix before re-checking shutdown.
const RECV_POLL: Duration = Duration::from_millis(50);

/// Main worker loop.
#[allow(clippy::too_many_arguments)]
pub(crate) async fn worker_loop(
    id: usize,
    fetcher: Arc<PageFetcher>,
    dispatch: async_channel::Receiver<String>,
    ingress: PrefixSender,
    records: tokio::sync::mpsc::Sender<ListEvent>,
    counters: Arc<WorkCounters>,
    shutdown: Arc<AtomicBool>,
    stats: Arc<WalkStats>,
) {
    debug!(worker = id, "worker starting");

    loop {
        if shutdown.load(Ordering::Relaxed) {
            break;
        }

        let prefix = match tokio::time::timeout(RECV_POLL, dispatch.recv()).await {
            Ok(Ok(prefix)) => prefix,
            Ok(Err(_)) => break, // queue pump gone, engine is tearing down
            Err(_) => continue,  // timeout, poll shutdown again
        };

        trace!(worker = id, prefix = %prefix, "walking prefix");

        match walk_prefix(&prefix, &fetcher, &ingress, &records, &counters, &stats).await {
            Ok(()) => counters.finish_prefix(),
            Err(WalkerError::Cancelled) => break,
            Err(error) => {
                warn!(worker = id, prefix = %prefix, error = %error, "prefix walk failed");
                // Surface the failure as the terminal sentinel and stop the
                // engine. The prefix counter stays raised on purpose: the
                // monitor terminates via the shutdown flag, not quiescence.
                let _ = records.send(Err(error)).await;
                shutdown.store(true, Ordering::SeqCst);
                break;
            }
        }
    }

    debug!(worker = id, "worker exited");
}

/// Paginate one prefix to exhaustion.
async fn walk_prefix(
    prefix: &str,
    fetcher: &PageFetcher,
    ingress: &PrefixSender,
    records: &tokio::sync::mpsc::Sender<ListEvent>,
    counters: &WorkCounters,
    stats: &WalkStats,
) -> Result<()> {
    let mut token: Option<String> = None;

    loop {
        let mut page = fetcher.fetch_page(prefix, token.as_deref()).await?;

        // Records without a key cannot be acted on by a consumer.
        page.contents.retain(|record| !record.key.is_empty());

        // Count before hand-off.
        counters.add_prefixes(page.common_prefixes.len() as u64);
        counters.add_objects(page.contents.len() as u64);

        for child in std::mem::take(&mut page.common_prefixes) {
            ingress
                .send(child)
                .map_err(|_| WalkerError::ChannelClosed)?;
        }

        for record in std::mem::take(&mut page.contents) {
            // A closed record channel means the forwarder is gone, which
            // only happens when the engine is shutting down.
            records
                .send(Ok(record))
                .await
                .map_err(|_| WalkerError::Cancelled)?;
        }

        if !page.is_truncated {
            break;
        }
        // The fetcher validated that a truncated page carries a token.
        token = page.next_continuation_token;
    }

    stats.record_prefix();
    Ok(())
}
