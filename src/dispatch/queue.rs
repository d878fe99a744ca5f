use crate::core::QueueEntry;
use crate::error::{SimError, SimResult};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Counters shared by both ends of the dispatch queue
#[derive(Debug, Default)]
pub struct QueueStats {
    pub enqueued: AtomicU64,
    pub dequeued: AtomicU64,
}

impl QueueStats {
    /// Entries waiting for the sender
    pub fn depth(&self) -> u64 {
        let dequeued = self.dequeued.load(Ordering::Relaxed);
        self.enqueued.load(Ordering::Relaxed).saturating_sub(dequeued)
    }
}

/// Create the fan-in queue between playback streams and the transport sender
///
/// The queue is unbounded: producers never wait on a slow remote, only the
/// backlog grows.
pub fn dispatch_queue() -> (DispatchSender, DispatchReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    let stats = Arc::new(QueueStats::default());
    (
        DispatchSender {
            tx,
            stats: stats.clone(),
        },
        DispatchReceiver { rx, stats },
    )
}

/// Producer handle, one clone per playback stream
#[derive(Clone)]
pub struct DispatchSender {
    tx: mpsc::UnboundedSender<QueueEntry>,
    stats: Arc<QueueStats>,
}

impl DispatchSender {
    /// Append an entry without waiting
    ///
    /// Fails only once the receiving end has been dropped.
    pub fn enqueue(&self, entry: QueueEntry) -> SimResult<()> {
        self.stats.enqueued.fetch_add(1, Ordering::Relaxed);
        self.tx.send(entry).map_err(|_| SimError::QueueClosed)
    }
}

/// Consumer handle, owned by the transport sender
pub struct DispatchReceiver {
    rx: mpsc::UnboundedReceiver<QueueEntry>,
    stats: Arc<QueueStats>,
}

impl DispatchReceiver {
    /// Wait for the next entry in arrival order
    ///
    /// Returns `None` once every sender is gone and the queue is drained.
    pub async fn dequeue(&mut self) -> Option<QueueEntry> {
        let entry = self.rx.recv().await?;
        self.stats.dequeued.fetch_add(1, Ordering::Relaxed);
        Some(entry)
    }

    pub fn depth(&self) -> u64 {
        self.stats.depth()
    }
}
