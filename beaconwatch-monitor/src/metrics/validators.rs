//! One-shot validator census: asks nodes in order until one serves its
//! validator set, then reports the count and per-validator status.

use anyhow::Result;
use async_trait::async_trait;
use serde_json::json;

use beaconwatch_client::beacon::{validators_from_response, BeaconApi};
use beaconwatch_client::Node;

use crate::metrics::MetricSettings;
use crate::testnet_monitor::{MonitorAction, MonitorInterval};

/// Queries nodes in order, returning the first valid census as a JSON line
/// tagged with the answering node. `None` when no node answered validly.
pub async fn validator_census(api: &BeaconApi, nodes: &[Node]) -> Option<String> {
    for node in nodes {
        let response = match api.get_validators(node).await {
            Ok(response) => response,
            Err(err) => {
                log::debug!("{}: validator query failed: {}", node.name, err);
                continue;
            }
        };
        let Some(validators) = validators_from_response(&response) else {
            log::debug!("{}: invalid validator response", node.name);
            continue;
        };
        let rendered: Vec<String> = validators
            .iter()
            .map(|v| format!("({}){}", v.status, v.pubkey))
            .collect();
        return Some(
            json!({
                "client": node.name,
                "validators_count": validators.len(),
                "validators": rendered,
            })
            .to_string(),
        );
    }
    None
}

pub struct ValidatorsAction {
    api: BeaconApi,
    nodes: Vec<Node>,
    interval: MonitorInterval,
}

impl ValidatorsAction {
    pub fn new(nodes: Vec<Node>, settings: &MetricSettings, interval: MonitorInterval) -> Self {
        Self {
            api: BeaconApi::new(settings.timeout),
            nodes,
            interval,
        }
    }
}

#[async_trait]
impl MonitorAction for ValidatorsAction {
    fn name(&self) -> &str {
        "validators"
    }

    fn interval(&self) -> MonitorInterval {
        self.interval
    }

    async fn perform(&mut self) -> Result<()> {
        match validator_census(&self.api, &self.nodes).await {
            Some(report) => log::info!("validator-census:\n{}", report),
            None => log::warn!("validator-census: no node served a validator set"),
        }
        Ok(())
    }
}
