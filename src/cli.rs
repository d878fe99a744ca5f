use crate::error::{SimError, SimResult};
use crate::playback::PlaybackConfig;
use crate::simulator::{SimulatorConfig, DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_SERVICE};
use clap::Parser;
use reqwest::Url;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Parser)]
#[command(
    name = "fleet-replay",
    version,
    about = "Replay recorded vehicle trajectories to a telemetry node",
    allow_negative_numbers = true
)]
pub struct Cli {
    /// URL of the node to send to
    #[arg(value_name = "URL")]
    pub node_url: String,

    /// One or more trajectory files, named new_[ID].txt; ID is used as the vehicle id
    #[arg(value_name = "FILE", required = true)]
    pub files: Vec<PathBuf>,

    /// Loop the data set once exhausted instead of exiting
    #[arg(short = 'l', long = "loop")]
    pub loop_data: bool,

    /// Adjust timestamps to start at the current system time
    #[arg(short = 'a', long = "adjust")]
    pub adjust_ts: bool,

    /// Accelerate or slow down the period between sends; higher is faster
    #[arg(short = 's', long, default_value_t = 1.0)]
    pub speedup: f64,

    /// Service name reports are addressed to
    #[arg(long, default_value = DEFAULT_SERVICE)]
    pub service: String,

    /// Log reports instead of sending them
    #[arg(long)]
    pub dry_run: bool,

    /// HTTP request timeout in seconds
    #[arg(long, value_name = "SECS", default_value_t = DEFAULT_REQUEST_TIMEOUT_SECS)]
    pub timeout: u64,
}

impl Cli {
    /// Turn parsed arguments into a validated configuration
    pub fn into_config(self) -> SimResult<SimulatorConfig> {
        let node_url = Url::parse(&self.node_url)
            .map_err(|e| SimError::config(format!("invalid node URL {:?}: {}", self.node_url, e)))?;

        let config = SimulatorConfig {
            node_url,
            service_name: self.service,
            sources: self.files,
            playback: PlaybackConfig {
                speedup: self.speedup,
                loop_playback: self.loop_data,
                rebase_to_now: self.adjust_ts,
            },
            dry_run: self.dry_run,
            request_timeout: Duration::from_secs(self.timeout),
        };
        config.validate()?;
        Ok(config)
    }
}
