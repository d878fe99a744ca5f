pub mod reprojector;
pub mod stream;

pub use reprojector::TimeReprojector;
pub use stream::PlaybackStream;

use crate::error::{SimError, SimResult};

/// Lifecycle of a playback stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Initializing,
    Streaming,
    LoopRestart,
    Finished,
}

/// Playback configuration shared by every stream
#[derive(Debug, Clone)]
pub struct PlaybackConfig {
    pub speedup: f64,  // 1.0 = recorded pace, 2.0 = twice as fast
    pub loop_playback: bool,
    /// Shift timestamps so the first record is stamped with the current time
    pub rebase_to_now: bool,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            speedup: 1.0,
            loop_playback: false,
            rebase_to_now: false,
        }
    }
}

impl PlaybackConfig {
    pub fn validate(&self) -> SimResult<()> {
        if !self.speedup.is_finite() || self.speedup <= 0.0 {
            return Err(SimError::config(format!(
                "speedup must be a positive number, got {}",
                self.speedup
            )));
        }
        Ok(())
    }
}
