//! Head-availability probes: can each node serve its chain head at all?
//! One probe for the execution layer (JSON-RPC) and one for the consensus
//! layer (beacon API), both reporting machine-readable JSON lines.

use anyhow::Result;
use async_trait::async_trait;
use serde_json::{json, Value};

use beaconwatch_client::beacon::{block_from_response, BeaconApi};
use beaconwatch_client::execution::{latest_block_hash_from_response, ExecutionApi};
use beaconwatch_client::{Node, TransportError};

use crate::metrics::{nodes_by_name, MetricSettings};
use crate::testnet_monitor::{MonitorAction, MonitorInterval};
use crate::{ClientMetricMonitor, MetricQuery, MonitorSnapshot};

pub struct ExecutionHeadQuery {
    api: ExecutionApi,
}

#[async_trait]
impl MetricQuery for ExecutionHeadQuery {
    type Value = String;

    async fn perform_request(&self, node: &Node) -> Result<Value, TransportError> {
        self.api.get_latest_block(node).await
    }

    fn parse(&self, response: &Value) -> Option<String> {
        latest_block_hash_from_response(response)
    }
}

pub struct ConsensusHeadQuery {
    api: BeaconApi,
}

#[async_trait]
impl MetricQuery for ConsensusHeadQuery {
    type Value = u64;

    async fn perform_request(&self, node: &Node) -> Result<Value, TransportError> {
        self.api.get_block(node, "head").await
    }

    fn parse(&self, response: &Value) -> Option<u64> {
        Some(block_from_response(response)?.slot)
    }
}

enum Layer {
    Execution,
    Consensus,
}

impl Layer {
    fn tag(&self) -> &'static str {
        match self {
            Layer::Execution => "execution_availability",
            Layer::Consensus => "consensus_availability",
        }
    }

    fn client_key(&self) -> &'static str {
        match self {
            Layer::Execution => "execution",
            Layer::Consensus => "consensus",
        }
    }

    fn client_of(&self, node: &Node) -> String {
        match self {
            Layer::Execution => node.execution_client.clone(),
            Layer::Consensus => node.consensus_client.clone(),
        }
    }
}

fn bucket_json(layer: &Layer, nodes: &[Node], names: &[String]) -> Value {
    let entries: Vec<Value> = nodes_by_name(nodes, names)
        .iter()
        .map(|node| {
            json!({
                "container": node.name,
                "ip": node.ip_address,
                layer.client_key(): layer.client_of(node),
            })
        })
        .collect();
    Value::Array(entries)
}

fn availability_report<V>(layer: &Layer, snapshot: &MonitorSnapshot<V>, nodes: &[Node]) -> String {
    let available: Vec<String> = snapshot
        .results
        .iter()
        .map(|(name, _)| name.clone())
        .collect();
    json!({
        layer.tag(): {
            "available": bucket_json(layer, nodes, &available),
            "unreachable_connection_error": bucket_json(layer, nodes, &snapshot.connection_error_nodes),
            "invalid_response": bucket_json(layer, nodes, &snapshot.invalid_response_nodes),
            "unreachable_unknown_reason": bucket_json(layer, nodes, &snapshot.unknown_error_nodes),
            "timeout": bucket_json(layer, nodes, &snapshot.timeout_nodes),
        }
    })
    .to_string()
}

pub struct ExecutionAvailabilityAction {
    monitor: ClientMetricMonitor<ExecutionHeadQuery>,
    nodes: Vec<Node>,
    interval: MonitorInterval,
}

impl ExecutionAvailabilityAction {
    pub fn new(nodes: Vec<Node>, settings: &MetricSettings, interval: MonitorInterval) -> Self {
        Self {
            monitor: ClientMetricMonitor::new(
                ExecutionHeadQuery {
                    api: ExecutionApi::new(settings.timeout),
                },
                settings.max_retries,
            ),
            nodes,
            interval,
        }
    }
}

#[async_trait]
impl MonitorAction for ExecutionAvailabilityAction {
    fn name(&self) -> &str {
        "head-hash-execution"
    }

    fn interval(&self) -> MonitorInterval {
        self.interval
    }

    async fn perform(&mut self) -> Result<()> {
        let snapshot = self.monitor.collect(&self.nodes).await;
        log::info!(
            "{}",
            availability_report(&Layer::Execution, &snapshot, &self.nodes)
        );
        Ok(())
    }
}

pub struct ConsensusAvailabilityAction {
    monitor: ClientMetricMonitor<ConsensusHeadQuery>,
    nodes: Vec<Node>,
    interval: MonitorInterval,
}

impl ConsensusAvailabilityAction {
    pub fn new(nodes: Vec<Node>, settings: &MetricSettings, interval: MonitorInterval) -> Self {
        Self {
            monitor: ClientMetricMonitor::new(
                ConsensusHeadQuery {
                    api: BeaconApi::new(settings.timeout),
                },
                settings.max_retries,
            ),
            nodes,
            interval,
        }
    }
}

#[async_trait]
impl MonitorAction for ConsensusAvailabilityAction {
    fn name(&self) -> &str {
        "head-slot-consensus"
    }

    fn interval(&self) -> MonitorInterval {
        self.interval
    }

    async fn perform(&mut self) -> Result<()> {
        let snapshot = self.monitor.collect(&self.nodes).await;
        log::info!(
            "{}",
            availability_report(&Layer::Consensus, &snapshot, &self.nodes)
        );
        Ok(())
    }
}
