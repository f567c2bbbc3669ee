//! Head-block metric: does every node report the same chain head?

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;

use beaconwatch_client::beacon::{block_from_response, BeaconApi};
use beaconwatch_client::{decode_graffiti, truncate_root, Node, TransportError};

use crate::metrics::MetricSettings;
use crate::testnet_monitor::{MonitorAction, MonitorInterval};
use crate::{ConsensusMetricMonitor, ConsensusSnapshot, MetricQuery};

/// A node's head view. The full state root is the comparison key; it is
/// only truncated when rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Head {
    pub slot: u64,
    pub state_root: String,
    pub graffiti: String,
}

pub struct HeadsQuery {
    api: BeaconApi,
}

impl HeadsQuery {
    pub fn new(settings: &MetricSettings) -> Self {
        Self {
            api: BeaconApi::new(settings.timeout),
        }
    }
}

#[async_trait]
impl MetricQuery for HeadsQuery {
    type Value = Head;

    async fn perform_request(&self, node: &Node) -> Result<Value, TransportError> {
        self.api.get_block(node, "head").await
    }

    fn parse(&self, response: &Value) -> Option<Head> {
        let block = block_from_response(response)?;
        Some(Head {
            slot: block.slot,
            state_root: block.state_root,
            graffiti: decode_graffiti(&block.graffiti),
        })
    }
}

pub fn report(consensus: &ConsensusSnapshot<Head>) -> String {
    let mut out = format!("num_forks: {}\n", consensus.num_forks());
    for (head, nodes) in &consensus.groups {
        out += &format!(
            "({}, {}, {:?}): {:?}\n",
            head.slot,
            truncate_root(&head.state_root),
            head.graffiti,
            nodes
        );
    }
    out + &consensus.snapshot.failure_report()
}

pub struct HeadsAction {
    monitor: ConsensusMetricMonitor<HeadsQuery>,
    nodes: Vec<Node>,
    interval: MonitorInterval,
}

impl HeadsAction {
    pub fn new(nodes: Vec<Node>, settings: &MetricSettings, interval: MonitorInterval) -> Self {
        Self {
            monitor: ConsensusMetricMonitor::new(
                HeadsQuery::new(settings),
                settings.max_retries_for_consensus,
            ),
            nodes,
            interval,
        }
    }
}

#[async_trait]
impl MonitorAction for HeadsAction {
    fn name(&self) -> &str {
        "head_slots"
    }

    fn interval(&self) -> MonitorInterval {
        self.interval
    }

    async fn perform(&mut self) -> Result<()> {
        let consensus = self.monitor.collect(&self.nodes).await;
        log::info!("heads:\n{}", report(&consensus));
        Ok(())
    }
}
