//! Finality-checkpoint metric: finalized / current-justified /
//! previous-justified agreement across the fleet.

use anyhow::Result;
use async_trait::async_trait;
use serde_json::{json, Value};

use beaconwatch_client::beacon::{
    finality_checkpoints_from_response, BeaconApi, Checkpoint, FinalityCheckpoints,
};
use beaconwatch_client::{truncate_root, Node, TransportError};

use crate::metrics::{nodes_by_name, MetricSettings};
use crate::testnet_monitor::{MonitorAction, MonitorInterval};
use crate::{ConsensusMetricMonitor, ConsensusSnapshot, MetricQuery};

pub struct CheckpointsQuery {
    api: BeaconApi,
}

impl CheckpointsQuery {
    pub fn new(settings: &MetricSettings) -> Self {
        Self {
            api: BeaconApi::new(settings.timeout),
        }
    }
}

#[async_trait]
impl MetricQuery for CheckpointsQuery {
    type Value = FinalityCheckpoints;

    async fn perform_request(&self, node: &Node) -> Result<Value, TransportError> {
        self.api.get_finality_checkpoints(node).await
    }

    fn parse(&self, response: &Value) -> Option<FinalityCheckpoints> {
        finality_checkpoints_from_response(response)
    }
}

fn checkpoint_json(checkpoint: &Checkpoint) -> Value {
    json!([checkpoint.epoch, truncate_root(&checkpoint.root)])
}

fn bucket_json(nodes: &[Node], names: &[String]) -> Value {
    let entries: Vec<Value> = nodes_by_name(nodes, names)
        .iter()
        .map(|node| {
            json!({
                "container": node.name,
                "ip": node.ip_address,
                "consensus": node.consensus_client,
            })
        })
        .collect();
    Value::Array(entries)
}

/// One JSON line tagged `checkpoints`, grouping finalization data by the
/// distinct checkpoint triples observed.
pub fn report(consensus: &ConsensusSnapshot<FinalityCheckpoints>, nodes: &[Node]) -> String {
    let finalization_data: Vec<Value> = consensus
        .groups
        .iter()
        .map(|(checkpoints, group_nodes)| {
            json!({
                "finalized": checkpoint_json(&checkpoints.finalized),
                "current_justified": checkpoint_json(&checkpoints.current_justified),
                "previous_justified": checkpoint_json(&checkpoints.previous_justified),
                "clients": group_nodes,
            })
        })
        .collect();

    let snapshot = &consensus.snapshot;
    json!({
        "checkpoints": {
            "finalization_data": finalization_data,
            "unreachable_connection_error": bucket_json(nodes, &snapshot.connection_error_nodes),
            "invalid_response": bucket_json(nodes, &snapshot.invalid_response_nodes),
            "unreachable_unknown_reason": bucket_json(nodes, &snapshot.unknown_error_nodes),
            "timeout": bucket_json(nodes, &snapshot.timeout_nodes),
        }
    })
    .to_string()
}

pub struct CheckpointsAction {
    monitor: ConsensusMetricMonitor<CheckpointsQuery>,
    nodes: Vec<Node>,
    interval: MonitorInterval,
}

impl CheckpointsAction {
    pub fn new(nodes: Vec<Node>, settings: &MetricSettings, interval: MonitorInterval) -> Self {
        Self {
            monitor: ConsensusMetricMonitor::new(
                CheckpointsQuery::new(settings),
                settings.max_retries_for_consensus,
            ),
            nodes,
            interval,
        }
    }
}

#[async_trait]
impl MonitorAction for CheckpointsAction {
    fn name(&self) -> &str {
        "checkpoints"
    }

    fn interval(&self) -> MonitorInterval {
        self.interval
    }

    async fn perform(&mut self) -> Result<()> {
        let consensus = self.monitor.collect(&self.nodes).await;
        log::info!("checkpoints:\n{}", report(&consensus, &self.nodes));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MonitorSnapshot;

    fn checkpoints(epoch: u64, root: &str) -> FinalityCheckpoints {
        let checkpoint = Checkpoint {
            epoch,
            root: root.to_string(),
        };
        FinalityCheckpoints {
            finalized: checkpoint.clone(),
            current_justified: checkpoint.clone(),
            previous_justified: checkpoint,
        }
    }

    #[test]
    fn test_report_groups_by_checkpoint_triple() {
        let mut snapshot = MonitorSnapshot::new();
        snapshot
            .results
            .push(("a".to_string(), checkpoints(3, "0x01")));
        snapshot
            .results
            .push(("b".to_string(), checkpoints(3, "0x01")));
        let consensus = ConsensusSnapshot::from_snapshot(snapshot);

        let nodes = vec![];
        let report = report(&consensus, &nodes);
        let parsed: Value = serde_json::from_str(&report).unwrap();
        let data = &parsed["checkpoints"]["finalization_data"];
        assert_eq!(data.as_array().unwrap().len(), 1);
        assert_eq!(data[0]["clients"], json!(["a", "b"]));
    }
}
