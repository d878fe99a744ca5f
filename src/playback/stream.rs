use crate::core::{QueueEntry, Sample};
use crate::dispatch::DispatchSender;
use crate::error::{SimError, SimResult};
use crate::input::{vehicle_id_from_path, TraceReader};
use crate::playback::{PlaybackConfig, PlaybackState, TimeReprojector};
use crate::shutdown::ShutdownListener;
use chrono::Utc;
use std::path::Path;
use std::time::Duration;
use tokio::fs::File;
use tokio::io::{AsyncBufRead, AsyncSeek, BufReader};
use tokio::time::Instant;
use tracing::{debug, info};

/// Delay before the first record of a looped pass
const LOOP_GRACE: Duration = Duration::from_secs(1);

/// What a stream did before it stopped
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamSummary {
    pub vehicle_id: String,
    pub emitted: u64,
    /// Number of times the end of the source was reached
    pub passes: u64,
}

/// Replays one trajectory source as one simulated vehicle
///
/// The stream owns its reader and scheduling state outright; the only thing
/// it shares with other streams is the dispatch queue it feeds.
pub struct PlaybackStream<R> {
    vehicle_id: String,
    config: PlaybackConfig,
    trace: TraceReader<R>,
    reprojector: TimeReprojector,
    state: PlaybackState,
    emitted: u64,
    passes: u64,
}

impl PlaybackStream<BufReader<File>> {
    /// Open a trajectory file, naming the vehicle after the file
    pub async fn open(path: &Path, config: &PlaybackConfig) -> SimResult<Self> {
        let trace = TraceReader::open(path).await?;
        Ok(Self::new(vehicle_id_from_path(path), trace, config))
    }
}

impl<R> PlaybackStream<R>
where
    R: AsyncBufRead + AsyncSeek + Unpin,
{
    pub fn new(vehicle_id: String, trace: TraceReader<R>, config: &PlaybackConfig) -> Self {
        Self {
            vehicle_id,
            config: config.clone(),
            trace,
            reprojector: TimeReprojector::new(config),
            state: PlaybackState::Initializing,
            emitted: 0,
            passes: 0,
        }
    }

    pub fn vehicle_id(&self) -> &str {
        &self.vehicle_id
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn summary(&self) -> StreamSummary {
        StreamSummary {
            vehicle_id: self.vehicle_id.clone(),
            emitted: self.emitted,
            passes: self.passes,
        }
    }

    /// Play the source into `queue` until it is exhausted or shutdown fires
    ///
    /// A looping stream only returns on shutdown, on a malformed record or
    /// when the queue's consumer has gone away.
    pub async fn run(
        &mut self,
        queue: &DispatchSender,
        shutdown: &mut ShutdownListener,
    ) -> SimResult<StreamSummary> {
        let result = self.play(queue, shutdown).await;
        self.state = PlaybackState::Finished;
        result.map(|()| self.summary())
    }

    async fn play(&mut self, queue: &DispatchSender, shutdown: &mut ShutdownListener) -> SimResult<()> {
        info!("Will send for {}", self.vehicle_id);

        let Some(mut sample) = self.trace.next_sample().await? else {
            info!("{}: source is empty", self.vehicle_id);
            return Ok(());
        };
        let mut due = self.reprojector.begin_pass(
            sample.timestamp,
            Utc::now().timestamp(),
            Instant::now(),
            Duration::ZERO,
        );
        self.state = PlaybackState::Streaming;
        debug!("{}: timestamp offset {}s", self.vehicle_id, self.reprojector.offset_secs());

        loop {
            let wait = due.saturating_duration_since(Instant::now());
            if !wait.is_zero() {
                debug!("Will sleep {} for {:.3} seconds.", self.vehicle_id, wait.as_secs_f64());
            }
            if !shutdown.sleep_until(due).await {
                debug!("{}: stopped by shutdown", self.vehicle_id);
                return Ok(());
            }

            self.emit(queue, &sample)?;

            match self.trace.next_sample().await? {
                Some(next) => {
                    due = self.reprojector.next_due(next.timestamp, Instant::now());
                    sample = next;
                }
                None => {
                    self.passes += 1;
                    if !self.config.loop_playback {
                        info!("{}: done with file after {} records", self.vehicle_id, self.emitted);
                        return Ok(());
                    }

                    self.state = PlaybackState::LoopRestart;
                    info!("{}: looping data file", self.vehicle_id);
                    self.trace.rewind().await?;

                    let Some(first) = self.trace.next_sample().await? else {
                        info!("{}: source emptied while looping", self.vehicle_id);
                        return Ok(());
                    };
                    due = self.reprojector.begin_pass(
                        first.timestamp,
                        Utc::now().timestamp(),
                        Instant::now(),
                        LOOP_GRACE,
                    );
                    sample = first;
                    self.state = PlaybackState::Streaming;
                }
            }
        }
    }

    fn emit(&mut self, queue: &DispatchSender, sample: &Sample) -> SimResult<()> {
        let timestamp = self.reprojector.emission_time(sample.timestamp).ok_or_else(|| {
            SimError::malformed(
                self.trace.line_no(),
                format!("timestamp {} out of range", sample.timestamp),
            )
        })?;

        queue.enqueue(QueueEntry::new(&self.vehicle_id, timestamp, sample))?;
        self.emitted += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::{dispatch_queue, DispatchReceiver};
    use crate::shutdown::Shutdown;
    use std::io::Cursor;

    type MemoryStream = PlaybackStream<Cursor<Vec<u8>>>;

    fn stream(vehicle: &str, text: &str, config: PlaybackConfig) -> MemoryStream {
        let trace = TraceReader::new(Cursor::new(text.as_bytes().to_vec()));
        PlaybackStream::new(vehicle.to_string(), trace, &config)
    }

    fn config(speedup: f64, loop_playback: bool, rebase_to_now: bool) -> PlaybackConfig {
        PlaybackConfig {
            speedup,
            loop_playback,
            rebase_to_now,
        }
    }

    /// Drain `count` entries, noting the virtual time each arrived at
    async fn collect(rx: &mut DispatchReceiver, start: Instant, count: usize) -> Vec<(Duration, QueueEntry)> {
        let mut out = Vec::new();
        for _ in 0..count {
            let entry = rx.dequeue().await.expect("queue closed early");
            out.push((start.elapsed(), entry));
        }
        out
    }

    #[tokio::test(start_paused = true)]
    async fn test_two_records_at_five_times_speed() {
        let shutdown = Shutdown::new();
        let (tx, mut rx) = dispatch_queue();
        let mut s = stream(
            "abboip",
            "10.0 20.0 0 1000\n10.0 20.1 0 1005\n",
            config(5.0, false, false),
        );

        let start = Instant::now();
        let handle = tokio::spawn(async move {
            let mut listener = shutdown.listener();
            let summary = s.run(&tx, &mut listener).await;
            (summary, s.state())
        });

        let got = collect(&mut rx, start, 2).await;
        assert_eq!(got[0].0, Duration::ZERO);
        assert_eq!((got[0].1.lat, got[0].1.lon), (10.0, 20.0));
        assert_eq!(got[0].1.timestamp.timestamp(), 1000);

        assert_eq!(got[1].0, Duration::from_secs(1));
        assert_eq!((got[1].1.lat, got[1].1.lon), (10.0, 20.1));
        assert_eq!(got[1].1.timestamp.timestamp(), 1005);

        let (summary, state) = handle.await.unwrap();
        let summary = summary.unwrap();
        assert_eq!(summary.emitted, 2);
        assert_eq!(summary.passes, 1);
        assert_eq!(state, PlaybackState::Finished);

        // Stream is done and its sender dropped: nothing else arrives
        assert!(rx.dequeue().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_gaps_follow_recorded_deltas() {
        let shutdown = Shutdown::new();
        let (tx, mut rx) = dispatch_queue();
        let mut s = stream(
            "gaps",
            "1.0 1.0 0 100\n1.0 1.0 0 104\n1.0 1.0 1 104\n1.0 1.0 0 110\n",
            config(2.0, false, false),
        );

        let start = Instant::now();
        let mut listener = shutdown.listener();
        tokio::spawn(async move { s.run(&tx, &mut listener).await });

        let times: Vec<Duration> = collect(&mut rx, start, 4).await.into_iter().map(|(t, _)| t).collect();
        assert_eq!(
            times,
            vec![
                Duration::ZERO,
                Duration::from_secs(2),
                Duration::from_secs(2),
                Duration::from_secs(5),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_loop_restarts_after_grace_delay() {
        let shutdown = Shutdown::new();
        let (tx, mut rx) = dispatch_queue();
        let mut s = stream(
            "looper",
            "10.0 20.0 0 1000\n10.0 20.1 0 1005\n",
            config(1.0, true, false),
        );

        let start = Instant::now();
        let mut listener = shutdown.listener();
        let handle = tokio::spawn(async move { s.run(&tx, &mut listener).await });

        let got = collect(&mut rx, start, 5).await;
        let times: Vec<u64> = got.iter().map(|(t, _)| t.as_secs()).collect();
        assert_eq!(times, vec![0, 5, 6, 11, 12]);

        let lons: Vec<f64> = got.iter().map(|(_, e)| e.lon).collect();
        assert_eq!(lons, vec![20.0, 20.1, 20.0, 20.1, 20.0]);

        shutdown.trigger();
        let summary = handle.await.unwrap().unwrap();
        assert_eq!(summary.passes, 2);
        assert!(summary.emitted >= 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_line_loop_does_not_spin() {
        let shutdown = Shutdown::new();
        let (tx, mut rx) = dispatch_queue();
        let mut s = stream("single", "10.0 20.0 0 1000\n", config(100.0, true, false));

        let start = Instant::now();
        let mut listener = shutdown.listener();
        tokio::spawn(async move { s.run(&tx, &mut listener).await });

        let times: Vec<u64> = collect(&mut rx, start, 3).await.iter().map(|(t, _)| t.as_secs()).collect();
        assert_eq!(times, vec![0, 1, 2]);
        shutdown.trigger();
    }

    #[tokio::test(start_paused = true)]
    async fn test_rebase_stamps_first_record_with_now() {
        let shutdown = Shutdown::new();
        let (tx, mut rx) = dispatch_queue();
        let mut s = stream(
            "rebased",
            "10.0 20.0 0 1000\n10.0 20.1 0 1030\n",
            config(10.0, false, true),
        );

        let before = Utc::now().timestamp();
        let mut listener = shutdown.listener();
        tokio::spawn(async move { s.run(&tx, &mut listener).await });

        let first = rx.dequeue().await.unwrap();
        let second = rx.dequeue().await.unwrap();
        let after = Utc::now().timestamp();

        let first_ts = first.timestamp.timestamp();
        assert!(first_ts >= before && first_ts <= after);
        assert_eq!(second.timestamp.timestamp() - first_ts, 30);
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_source_emits_nothing() {
        let shutdown = Shutdown::new();
        let (tx, mut rx) = dispatch_queue();
        let mut s = stream("empty", "\n\n", config(1.0, true, false));

        let mut listener = shutdown.listener();
        let summary = s.run(&tx, &mut listener).await.unwrap();
        drop(tx);

        assert_eq!(summary.emitted, 0);
        assert_eq!(s.state(), PlaybackState::Finished);
        assert!(rx.dequeue().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_malformed_line_ends_only_that_stream() {
        let shutdown = Shutdown::new();
        let (tx, mut rx) = dispatch_queue();
        let mut broken = stream(
            "broken",
            "10.0 20.0 0 1000\n1.0 2.0 abc\n10.0 20.0 0 1002\n",
            config(1.0, false, false),
        );
        let mut healthy = stream(
            "healthy",
            "30.0 40.0 0 1000\n30.0 40.0 0 1003\n30.0 40.0 0 1006\n",
            config(1.0, false, false),
        );

        let broken_tx = tx.clone();
        let mut broken_listener = shutdown.listener();
        let broken_handle = tokio::spawn(async move { broken.run(&broken_tx, &mut broken_listener).await });
        let mut healthy_listener = shutdown.listener();
        let healthy_handle = tokio::spawn(async move { healthy.run(&tx, &mut healthy_listener).await });

        let mut seen = Vec::new();
        while let Some(entry) = rx.dequeue().await {
            seen.push(entry.vehicle_id);
        }

        match broken_handle.await.unwrap() {
            Err(SimError::MalformedRecord { line, .. }) => assert_eq!(line, 2),
            other => panic!("expected malformed record, got {other:?}"),
        }
        assert_eq!(healthy_handle.await.unwrap().unwrap().emitted, 3);

        assert_eq!(seen.iter().filter(|v| *v == "broken").count(), 1);
        assert_eq!(seen.iter().filter(|v| *v == "healthy").count(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_stops_pending_emission() {
        let shutdown = Shutdown::new();
        let (tx, mut rx) = dispatch_queue();
        let mut s = stream(
            "sleepy",
            "10.0 20.0 0 1000\n10.0 20.0 0 90000\n",
            config(1.0, false, false),
        );

        let mut listener = shutdown.listener();
        let handle = tokio::spawn(async move { s.run(&tx, &mut listener).await });

        assert!(rx.dequeue().await.is_some());
        shutdown.trigger();

        let summary = handle.await.unwrap().unwrap();
        assert_eq!(summary.emitted, 1);
        assert!(rx.dequeue().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_closed_queue_stops_stream() {
        let shutdown = Shutdown::new();
        let (tx, rx) = dispatch_queue();
        drop(rx);
        let mut s = stream("orphan", "10.0 20.0 0 1000\n", config(1.0, true, false));

        let mut listener = shutdown.listener();
        assert!(matches!(s.run(&tx, &mut listener).await, Err(SimError::QueueClosed)));
    }
}
