//! Pending-prefix queue
//!
//! Workers must never block while pushing newly discovered prefixes: a
//! blocked worker still holds an un-decremented prefix count, and with every
//! worker blocked the engine would deadlock. The queue therefore decouples
//! an unbounded ingress from a bounded dispatch egress with a pump task that
//! owns a private FIFO buffer:
//!
//! ```text
//!  workers ──(unbounded mpsc)──▶ pump [VecDeque] ──(bounded mpmc)──▶ workers
//! ```
//!
//! The dispatch side uses `async_channel` so every worker can receive from
//! the same egress; its capacity is 1 so buffered prefixes live in the pump,
//! not in the channel.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

/// Statistics for the pending queue
#[derive(Debug, Default)]
pub struct QueueStats {
    /// Prefixes accepted at the ingress
    pub enqueued: AtomicU64,

    /// Prefixes handed to a worker
    pub dispatched: AtomicU64,

    /// Largest buffer depth observed by the pump
    pub high_water: AtomicU64,
}

impl QueueStats {
    pub fn enqueued(&self) -> u64 {
        self.enqueued.load(Ordering::Relaxed)
    }

    pub fn dispatched(&self) -> u64 {
        self.dispatched.load(Ordering::Relaxed)
    }

    pub fn high_water(&self) -> u64 {
        self.high_water.load(Ordering::Relaxed)
    }
}

/// Handle for pushing prefixes onto the queue ingress. Never blocks.
#[derive(Clone)]
pub struct PrefixSender {
    tx: mpsc::UnboundedSender<String>,
}

impl PrefixSender {
    /// Push a prefix. Fails only if the pump has exited.
    pub fn send(&self, prefix: String) -> Result<(), ()> {
        self.tx.send(prefix).map_err(|_| ())
    }
}

/// Unbounded FIFO buffer of prefixes awaiting a worker.
pub struct PendingQueue {
    ingress: PrefixSender,
    dispatch: async_channel::Receiver<String>,
    stats: Arc<QueueStats>,
    #[allow(dead_code)]
    pump: JoinHandle<()>,
}

impl PendingQueue {
    /// Spawn the pump task and return the queue handles.
    pub fn spawn() -> Self {
        let (ingress_tx, ingress_rx) = mpsc::unbounded_channel();
        let (dispatch_tx, dispatch_rx) = async_channel::bounded(1);
        let stats = Arc::new(QueueStats::default());

        let pump = tokio::spawn(pump_loop(ingress_rx, dispatch_tx, Arc::clone(&stats)));

        Self {
            ingress: PrefixSender { tx: ingress_tx },
            dispatch: dispatch_rx,
            stats,
            pump,
        }
    }

    /// Get an ingress handle (clone for each worker).
    pub fn sender(&self) -> PrefixSender {
        self.ingress.clone()
    }

    /// Get a dispatch receiver (clone for each worker).
    pub fn receiver(&self) -> async_channel::Receiver<String> {
        self.dispatch.clone()
    }

    /// Get queue statistics.
    pub fn stats(&self) -> Arc<QueueStats> {
        Arc::clone(&self.stats)
    }
}

/// The pump: drain the ingress into the buffer tail, offer the buffer head
/// to the dispatch egress. Exits once every ingress sender is gone (and the
/// buffer is flushed) or every dispatch receiver is gone.
async fn pump_loop(
    mut ingress: mpsc::UnboundedReceiver<String>,
    dispatch: async_channel::Sender<String>,
    stats: Arc<QueueStats>,
) {
    let mut buffer: VecDeque<String> = VecDeque::new();

    loop {
        if buffer.is_empty() {
            match ingress.recv().await {
                Some(prefix) => {
                    stats.enqueued.fetch_add(1, Ordering::Relaxed);
                    buffer.push_back(prefix);
                }
                None => break,
            }
        } else {
            stats
                .high_water
                .fetch_max(buffer.len() as u64, Ordering::Relaxed);

            // The send future owns its message, so offer a clone of the head
            // and pop only once the send actually completes.
            let head = buffer.front().cloned().expect("buffer is non-empty");

            tokio::select! {
                received = ingress.recv() => match received {
                    Some(prefix) => {
                        stats.enqueued.fetch_add(1, Ordering::Relaxed);
                        buffer.push_back(prefix);
                    }
                    None => break,
                },
                sent = dispatch.send(head) => match sent {
                    Ok(()) => {
                        buffer.pop_front();
                        stats.dispatched.fetch_add(1, Ordering::Relaxed);
                    }
                    Err(_) => return, // every worker is gone
                },
            }
        }
    }

    // Ingress closed; flush whatever is buffered to any remaining workers.
    while let Some(prefix) = buffer.pop_front() {
        if dispatch.send(prefix).await.is_err() {
            return;
        }
        stats.dispatched.fetch_add(1, Ordering::Relaxed);
    }

    debug!(
        enqueued = stats.enqueued(),
        dispatched = stats.dispatched(),
        high_water = stats.high_water(),
        "queue pump exited"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_fifo_order() {
        let queue = PendingQueue::spawn();
        let sender = queue.sender();
        let receiver = queue.receiver();

        sender.send("a/".into()).unwrap();
        sender.send("b/".into()).unwrap();
        sender.send("c/".into()).unwrap();

        assert_eq!(receiver.recv().await.unwrap(), "a/");
        assert_eq!(receiver.recv().await.unwrap(), "b/");
        assert_eq!(receiver.recv().await.unwrap(), "c/");
    }

    #[tokio::test]
    async fn test_ingress_never_blocks() {
        let queue = PendingQueue::spawn();
        let sender = queue.sender();

        // No worker is receiving; all sends must still complete immediately.
        for i in 0..10_000 {
            sender.send(format!("prefix-{i}/")).unwrap();
        }

        let receiver = queue.receiver();
        assert_eq!(receiver.recv().await.unwrap(), "prefix-0/");
    }

    #[tokio::test]
    async fn test_buffer_flushed_after_ingress_closes() {
        let queue = PendingQueue::spawn();
        let sender = queue.sender();
        let receiver = queue.receiver();

        sender.send("a/".into()).unwrap();
        sender.send("b/".into()).unwrap();
        drop(sender);

        // Drop the queue's own ingress handle, closing it. (Fields elided
        // with `..` in a destructuring pattern live until end of scope, so
        // the ingress must be bound and dropped explicitly.)
        let stats = queue.stats();
        let PendingQueue { pump, ingress, .. } = queue;
        drop(ingress);

        assert_eq!(receiver.recv().await.unwrap(), "a/");
        assert_eq!(receiver.recv().await.unwrap(), "b/");

        // With all senders gone and the buffer flushed, the pump exits.
        drop(receiver);
        tokio::time::timeout(Duration::from_secs(1), pump)
            .await
            .expect("pump did not exit")
            .unwrap();
        assert_eq!(stats.dispatched(), 2);
    }

    #[tokio::test]
    async fn test_pump_exits_when_workers_gone() {
        let queue = PendingQueue::spawn();
        let sender = queue.sender();
        sender.send("a/".into()).unwrap();

        // Drop every dispatch receiver; the pump must notice and exit even
        // though the ingress is still open.
        let PendingQueue { dispatch, pump, .. } = queue;
        drop(dispatch);

        sender.send("b/".into()).unwrap();
        tokio::time::timeout(Duration::from_secs(1), pump)
            .await
            .expect("pump did not exit")
            .unwrap();
    }
}
