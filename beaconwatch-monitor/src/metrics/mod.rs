//! Concrete metric bindings: small query+parser pairs plugged into the two
//! monitors, plus their scheduler actions. No new algorithms live here.

pub mod availability;
pub mod blobs;
pub mod checkpoints;
pub mod heads;
pub mod peers;
pub mod validators;

use std::time::Duration;

use beaconwatch_client::Node;

/// Retry/timeout knobs shared by every metric action.
#[derive(Debug, Clone)]
pub struct MetricSettings {
    pub max_retries: usize,
    pub timeout: Duration,
    pub max_retries_for_consensus: usize,
}

/// Looks up the full node descriptors for a list of bucketed node names.
pub(crate) fn nodes_by_name<'a>(nodes: &'a [Node], names: &[String]) -> Vec<&'a Node> {
    names
        .iter()
        .filter_map(|name| nodes.iter().find(|node| &node.name == name))
        .collect()
}
