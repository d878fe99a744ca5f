use crate::dispatch::DispatchReceiver;
use crate::shutdown::ShutdownListener;
use crate::transport::interface::{Transport, VehicleReport};
use tracing::{debug, info, warn};

/// Delivery counters kept by the sender
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SenderStats {
    pub sent: u64,
    pub failed: u64,
}

/// Sole consumer of the dispatch queue
///
/// Entries are forwarded one at a time in arrival order. A failed send is
/// logged and counted, then the next entry is tried.
pub struct TransportSender {
    transport: Box<dyn Transport>,
    destination: String,
    stats: SenderStats,
}

impl TransportSender {
    pub fn new(transport: Box<dyn Transport>, destination: &str) -> Self {
        Self {
            transport,
            destination: destination.to_string(),
            stats: SenderStats::default(),
        }
    }

    /// Drain `queue` until shutdown or until every producer is gone
    pub async fn run(&mut self, mut queue: DispatchReceiver, mut shutdown: ShutdownListener) -> SenderStats {
        info!("Sending to {} via {}", self.destination, self.transport.name());

        loop {
            let entry = tokio::select! {
                biased;
                _ = shutdown.recv() => break,
                entry = queue.dequeue() => match entry {
                    Some(entry) => entry,
                    None => {
                        debug!("All playback streams finished");
                        break;
                    }
                },
            };

            let report = VehicleReport::from(&entry);
            debug!(
                "Sending {} @ {} (queue depth {})",
                entry.vehicle_id,
                entry.iso_timestamp(),
                queue.depth()
            );

            // In-flight sends are abandoned on shutdown
            let result = tokio::select! {
                biased;
                _ = shutdown.recv() => break,
                result = self.transport.send(&self.destination, std::slice::from_ref(&report)) => result,
            };

            match result {
                Ok(()) => self.stats.sent += 1,
                Err(e) => {
                    self.stats.failed += 1;
                    warn!("Failed to send {} to {}: {}", entry.vehicle_id, self.destination, e);
                }
            }
        }

        if shutdown.is_shutdown() {
            info!("Transport sender stopped, {} entries left in queue", queue.depth());
        }
        info!("Sent {} reports, {} failed", self.stats.sent, self.stats.failed);
        self.stats
    }
}
