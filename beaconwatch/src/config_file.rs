use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use beaconwatch_client::Node;

fn default_seconds_per_slot() -> u64 {
    12
}

fn default_slots_per_epoch() -> u64 {
    32
}

/// Testnet description: timing parameters plus the node fleet.
#[derive(Debug, Deserialize, Serialize)]
pub struct TestnetConfig {
    pub genesis_time: u64,
    #[serde(default = "default_seconds_per_slot")]
    pub seconds_per_slot: u64,
    #[serde(default = "default_slots_per_epoch")]
    pub slots_per_epoch: u64,
    pub nodes: Vec<Node>,
}

pub fn read_config(path: &Path) -> Result<TestnetConfig> {
    let file = fs::File::open(path)
        .with_context(|| format!("Failed to open config file {}", path.display()))?;
    let config: TestnetConfig = serde_json::from_reader(file)
        .with_context(|| format!("Failed to parse config file {}", path.display()))?;
    Ok(config)
}
