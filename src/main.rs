mod cli;
mod core;
mod dispatch;
mod error;
mod input;
mod playback;
mod shutdown;
mod simulator;
mod transport;

use anyhow::{Context, Result};
use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use simulator::{Simulator, SimulatorConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    // Initialize logging, RUST_LOG overrides the default level
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = match cli::Cli::parse().into_config() {
        Ok(config) => config,
        Err(e) => cli::Cli::command().error(ErrorKind::ValueValidation, e).exit(),
    };

    let rt = tokio::runtime::Runtime::new().context("Failed to create Tokio runtime")?;
    rt.block_on(run(config))
}

async fn run(config: SimulatorConfig) -> Result<()> {
    let simulator = Simulator::new(config)?;

    let config = simulator.config();
    info!("Fleet replay device simulator");
    info!("Node:              {}", config.node_url);
    info!("Service:           {}", config.service_name);
    info!("File(s):           {:?}", config.sources);
    info!("Loop data:         {}", config.playback.loop_playback);
    info!("Speedup:           {}", config.playback.speedup);
    info!("Adjust time stamp: {}", config.playback.rebase_to_now);
    if config.dry_run {
        info!("Dry run, nothing will be sent");
    }

    let transport = simulator
        .build_transport()
        .context("Failed to set up transport")?;

    let trigger = simulator.shutdown();
    tokio::spawn(async move {
        shutdown::wait_for_signal().await;
        trigger.trigger();
    });

    let stats = simulator.run(transport).await?;
    info!(
        "Device simulator finished ({} sent, {} failed)",
        stats.sent, stats.failed
    );
    Ok(())
}
