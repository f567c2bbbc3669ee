//! Blob-sidecar metric: agreement on the head block's first sidecar.

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;

use beaconwatch_client::beacon::{blob_sidecar_from_response, BeaconApi, BlobSidecar};
use beaconwatch_client::{truncate_root, Node, TransportError};

use crate::metrics::MetricSettings;
use crate::testnet_monitor::{MonitorAction, MonitorInterval};
use crate::{ConsensusMetricMonitor, ConsensusSnapshot, MetricQuery};

pub struct BlobsQuery {
    api: BeaconApi,
}

impl BlobsQuery {
    pub fn new(settings: &MetricSettings) -> Self {
        Self {
            api: BeaconApi::new(settings.timeout),
        }
    }
}

#[async_trait]
impl MetricQuery for BlobsQuery {
    type Value = BlobSidecar;

    async fn perform_request(&self, node: &Node) -> Result<Value, TransportError> {
        self.api.get_blob_sidecars(node).await
    }

    fn parse(&self, response: &Value) -> Option<BlobSidecar> {
        blob_sidecar_from_response(response)
    }
}

pub fn report(consensus: &ConsensusSnapshot<BlobSidecar>) -> String {
    let mut out = format!("num_blob_forks: {}\n", consensus.num_forks());
    for (sidecar, nodes) in &consensus.groups {
        out += &format!(
            "({}, {}, {}): {:?}\n",
            sidecar.slot,
            truncate_root(&sidecar.block_root),
            sidecar.proposer_index,
            nodes
        );
    }
    out + &consensus.snapshot.failure_report()
}

pub struct BlobsAction {
    monitor: ConsensusMetricMonitor<BlobsQuery>,
    nodes: Vec<Node>,
    interval: MonitorInterval,
}

impl BlobsAction {
    pub fn new(nodes: Vec<Node>, settings: &MetricSettings, interval: MonitorInterval) -> Self {
        Self {
            monitor: ConsensusMetricMonitor::new(
                BlobsQuery::new(settings),
                settings.max_retries_for_consensus,
            ),
            nodes,
            interval,
        }
    }
}

#[async_trait]
impl MonitorAction for BlobsAction {
    fn name(&self) -> &str {
        "blob-monitor"
    }

    fn interval(&self) -> MonitorInterval {
        self.interval
    }

    async fn perform(&mut self) -> Result<()> {
        let consensus = self.monitor.collect(&self.nodes).await;
        log::info!("blob-info:\n{}", report(&consensus));
        Ok(())
    }
}
