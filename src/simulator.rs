//! Wires playback streams, the dispatch queue and the transport sender together

use crate::dispatch::{dispatch_queue, DispatchSender};
use crate::error::{SimError, SimResult};
use crate::playback::{PlaybackConfig, PlaybackStream};
use crate::shutdown::Shutdown;
use crate::transport::{JsonRpcTransport, LogTransport, SenderStats, Transport, TransportSender};
use reqwest::Url;
use std::path::PathBuf;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Service the reports are addressed to on the node
pub const DEFAULT_SERVICE: &str = "jlr.com/backend/logging/report";

/// Default HTTP request timeout in seconds
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

/// Validated settings for one simulator run
#[derive(Debug, Clone)]
pub struct SimulatorConfig {
    pub node_url: Url,
    pub service_name: String,
    pub sources: Vec<PathBuf>,
    pub playback: PlaybackConfig,
    /// Log reports instead of sending them
    pub dry_run: bool,
    pub request_timeout: Duration,
}

impl SimulatorConfig {
    pub fn validate(&self) -> SimResult<()> {
        self.playback.validate()?;

        if !matches!(self.node_url.scheme(), "http" | "https") {
            return Err(SimError::config(format!(
                "node URL must be http or https, got {}",
                self.node_url
            )));
        }
        if self.sources.is_empty() {
            return Err(SimError::config("at least one data file is required"));
        }
        if self.service_name.trim().is_empty() {
            return Err(SimError::config("service name must not be empty"));
        }
        Ok(())
    }
}

/// Device simulator: one playback stream per source, one shared sender
pub struct Simulator {
    config: SimulatorConfig,
    shutdown: Shutdown,
}

impl Simulator {
    pub fn new(config: SimulatorConfig) -> SimResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            shutdown: Shutdown::new(),
        })
    }

    pub fn config(&self) -> &SimulatorConfig {
        &self.config
    }

    /// Handle used to stop the run from outside, e.g. on a signal
    pub fn shutdown(&self) -> Shutdown {
        self.shutdown.clone()
    }

    /// Transport selected by the configuration
    pub fn build_transport(&self) -> SimResult<Box<dyn Transport>> {
        if self.config.dry_run {
            return Ok(Box::new(LogTransport::new("dry-run")));
        }
        let transport = JsonRpcTransport::new(self.config.node_url.clone(), self.config.request_timeout)?;
        Ok(Box::new(transport))
    }

    /// Play every source and drain the queue until done or shut down
    pub async fn run(&self, transport: Box<dyn Transport>) -> SimResult<SenderStats> {
        let (queue, receiver) = dispatch_queue();

        let streams = self.spawn_streams(queue).await;
        if streams.is_empty() {
            warn!("No data file could be opened, nothing to send");
        }

        let mut sender = TransportSender::new(transport, &self.config.service_name);
        let stats = sender.run(receiver, self.shutdown.listener()).await;

        // Looping streams only stop on shutdown
        if !self.shutdown.is_triggered() {
            debug!("Stopping remaining playback streams");
            self.shutdown.trigger();
        }
        for handle in streams {
            if let Err(e) = handle.await {
                error!("Playback task panicked: {}", e);
            }
        }

        Ok(stats)
    }

    /// Open each source and start a stream for the ones that opened
    ///
    /// Takes the producer handle by value so the queue closes once the last
    /// stream finishes.
    async fn spawn_streams(&self, queue: DispatchSender) -> Vec<JoinHandle<()>> {
        let mut handles = Vec::with_capacity(self.config.sources.len());

        for path in &self.config.sources {
            let mut stream = match PlaybackStream::open(path, &self.config.playback).await {
                Ok(stream) => stream,
                Err(e) => {
                    warn!("Failed to open file {}. Skipped. ({})", path.display(), e);
                    continue;
                }
            };

            let queue = queue.clone();
            let mut shutdown = self.shutdown.listener();
            handles.push(tokio::spawn(async move {
                match stream.run(&queue, &mut shutdown).await {
                    Ok(summary) => info!(
                        "{}: finished, {} records sent over {} passes",
                        summary.vehicle_id, summary.emitted, summary.passes
                    ),
                    Err(SimError::QueueClosed) => {
                        debug!("{}: dispatch queue closed", stream.vehicle_id())
                    }
                    Err(e) => error!("{}: playback stopped: {}", stream.vehicle_id(), e),
                }
            }));
        }

        handles
    }
}
