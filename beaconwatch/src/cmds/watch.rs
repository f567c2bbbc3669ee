use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Result};
use clap::Parser;

use beaconwatch_monitor::metrics::availability::{
    ConsensusAvailabilityAction, ExecutionAvailabilityAction,
};
use beaconwatch_monitor::metrics::blobs::BlobsAction;
use beaconwatch_monitor::metrics::checkpoints::CheckpointsAction;
use beaconwatch_monitor::metrics::heads::HeadsAction;
use beaconwatch_monitor::metrics::peers::PeersAction;
use beaconwatch_monitor::metrics::validators::ValidatorsAction;
use beaconwatch_monitor::metrics::MetricSettings;
use beaconwatch_monitor::{MonitorAction, MonitorInterval, TestnetMonitor};

use beaconwatch_client::Node;

use crate::config_file;
use crate::slot_clock::SystemSlotClock;

#[derive(Debug, Parser)]
#[command(about = "Continuously monitor a fleet of testnet nodes")]
pub struct Opts {
    #[clap(long)]
    config: PathBuf,

    /// Fan-out rounds per metric collection before giving up.
    #[clap(long, default_value_t = 3)]
    max_retries: usize,

    /// Per-request timeout in seconds.
    #[clap(long, default_value_t = 1)]
    request_timeout: u64,

    /// Seconds to wait before the first collection, giving nodes time to
    /// come up.
    #[clap(long, default_value_t = 10)]
    delay: u64,

    /// Fan-out rounds a consensus metric may take to converge.
    #[clap(long, default_value_t = 3)]
    max_retries_for_consensus: usize,

    /// Metric to run and its cadence, as `metric:interval`. Repeatable.
    /// Metrics: heads, checkpoints, blobs, peers, execution-availability,
    /// consensus-availability, validators. Intervals: slot, epoch, once.
    #[clap(long = "monitor")]
    monitors: Vec<String>,
}

const DEFAULT_MONITORS: &[&str] = &["heads:slot", "checkpoints:epoch"];

fn parse_interval(text: &str) -> Result<MonitorInterval> {
    match text {
        "slot" => Ok(MonitorInterval::EverySlot),
        "epoch" => Ok(MonitorInterval::EveryEpoch),
        "once" => Ok(MonitorInterval::Once),
        other => bail!("unknown monitor interval: {}", other),
    }
}

fn build_action(
    spec: &str,
    nodes: &[Node],
    settings: &MetricSettings,
) -> Result<Box<dyn MonitorAction>> {
    let Some((metric, interval)) = spec.split_once(':') else {
        bail!("monitor spec must look like metric:interval, got: {}", spec);
    };
    let interval = parse_interval(interval)?;
    let nodes = nodes.to_vec();
    let action: Box<dyn MonitorAction> = match metric {
        "heads" => Box::new(HeadsAction::new(nodes, settings, interval)),
        "checkpoints" => Box::new(CheckpointsAction::new(nodes, settings, interval)),
        "blobs" => Box::new(BlobsAction::new(nodes, settings, interval)),
        "peers" => Box::new(PeersAction::new(nodes, settings, interval)),
        "execution-availability" => {
            Box::new(ExecutionAvailabilityAction::new(nodes, settings, interval))
        }
        "consensus-availability" => {
            Box::new(ConsensusAvailabilityAction::new(nodes, settings, interval))
        }
        "validators" => Box::new(ValidatorsAction::new(nodes, settings, interval)),
        other => bail!("unknown monitor metric: {}", other),
    };
    Ok(action)
}

pub async fn run(opts: &Opts) -> Result<()> {
    let config = config_file::read_config(&opts.config)?;
    log::info!(
        "watching {} nodes, genesis_time={} seconds_per_slot={} slots_per_epoch={}",
        config.nodes.len(),
        config.genesis_time,
        config.seconds_per_slot,
        config.slots_per_epoch
    );

    let settings = MetricSettings {
        max_retries: opts.max_retries,
        timeout: Duration::from_secs(opts.request_timeout),
        max_retries_for_consensus: opts.max_retries_for_consensus,
    };

    let specs: Vec<String> = if opts.monitors.is_empty() {
        DEFAULT_MONITORS.iter().map(|s| s.to_string()).collect()
    } else {
        opts.monitors.clone()
    };

    let clock = Arc::new(SystemSlotClock::new(
        config.genesis_time,
        config.seconds_per_slot,
    ));
    let mut monitor = TestnetMonitor::new(clock, config.slots_per_epoch);
    for spec in &specs {
        let action = build_action(spec, &config.nodes, &settings)?;
        log::info!("registered monitor {}", spec);
        monitor.add_action(action);
    }

    if opts.delay > 0 {
        log::info!("waiting {}s before first collection", opts.delay);
        tokio::time::sleep(Duration::from_secs(opts.delay)).await;
    }

    monitor.run().await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> MetricSettings {
        MetricSettings {
            max_retries: 3,
            timeout: Duration::from_secs(1),
            max_retries_for_consensus: 3,
        }
    }

    #[test]
    fn test_build_action_accepts_every_metric() {
        for spec in [
            "heads:slot",
            "checkpoints:epoch",
            "blobs:slot",
            "peers:epoch",
            "execution-availability:slot",
            "consensus-availability:slot",
            "validators:once",
        ] {
            assert!(build_action(spec, &[], &settings()).is_ok(), "{}", spec);
        }
    }

    #[test]
    fn test_build_action_rejects_bad_specs() {
        for spec in ["heads", "heads:hourly", "latency:slot"] {
            assert!(build_action(spec, &[], &settings()).is_err(), "{}", spec);
        }
    }
}
