use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;

use beaconwatch_fork::{Containment, ForkDetector, DEFAULT_MAX_DEPTH};

use crate::config_file;

#[derive(Debug, Parser)]
#[command(about = "Periodically reconstruct node chains and report forks")]
pub struct Opts {
    #[clap(long)]
    config: PathBuf,

    /// Slots between reconstruction runs.
    #[clap(long, default_value_t = 64)]
    interval_slots: u64,

    /// Blocks to walk back from each node's head.
    #[clap(long, default_value_t = DEFAULT_MAX_DEPTH)]
    max_depth: usize,

    /// Per-request timeout in seconds.
    #[clap(long, default_value_t = 5)]
    request_timeout: u64,

    /// Use structural suffix containment instead of the substring check
    /// when nesting lagging chains.
    #[clap(long)]
    structural: bool,

    /// Run a single reconstruction and exit.
    #[clap(long)]
    once: bool,
}

pub async fn run(opts: &Opts) -> Result<()> {
    let config = config_file::read_config(&opts.config)?;
    let containment = if opts.structural {
        Containment::Structural
    } else {
        Containment::Substring
    };
    let detector = ForkDetector::new(
        Duration::from_secs(opts.request_timeout),
        opts.max_depth,
        containment,
    );
    let pause = Duration::from_secs(opts.interval_slots * config.seconds_per_slot);

    loop {
        match detector.run_once(&config.nodes).await {
            Ok(report) => println!("{}", report),
            Err(err) => log::error!("fork detection run failed: {:#}", err),
        }
        if opts.once {
            return Ok(());
        }
        log::info!(
            "next reconstruction in {} slots ({}s)",
            opts.interval_slots,
            pause.as_secs()
        );
        tokio::time::sleep(pause).await;
    }
}
