//! Peering summary: who is connected to whom, with peer ids resolved back
//! to node names via each node's identity query.

use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;

use beaconwatch_client::beacon::{
    peer_id_from_identity_response, peers_from_response, BeaconApi, PeerEntry,
};
use beaconwatch_client::{Node, TransportError};

use crate::metrics::MetricSettings;
use crate::testnet_monitor::{MonitorAction, MonitorInterval};
use crate::{ClientMetricMonitor, MetricQuery};

pub struct PeersQuery {
    api: BeaconApi,
}

#[async_trait]
impl MetricQuery for PeersQuery {
    type Value = Vec<PeerEntry>;

    async fn perform_request(&self, node: &Node) -> Result<Value, TransportError> {
        self.api.get_peers(node).await
    }

    fn parse(&self, response: &Value) -> Option<Vec<PeerEntry>> {
        peers_from_response(response)
    }
}

pub struct IdentityQuery {
    api: BeaconApi,
}

#[async_trait]
impl MetricQuery for IdentityQuery {
    type Value = String;

    async fn perform_request(&self, node: &Node) -> Result<Value, TransportError> {
        self.api.get_identity(node).await
    }

    fn parse(&self, response: &Value) -> Option<String> {
        peer_id_from_identity_response(response)
    }
}

/// Collects each node's connected peers and identity, then renders an
/// inbound/outbound summary with peer ids mapped to node names where the
/// identity query resolved them.
pub struct PeeringSummary {
    peers_monitor: ClientMetricMonitor<PeersQuery>,
    identity_monitor: ClientMetricMonitor<IdentityQuery>,
}

impl PeeringSummary {
    pub fn new(settings: &MetricSettings) -> Self {
        Self {
            peers_monitor: ClientMetricMonitor::new(
                PeersQuery {
                    api: BeaconApi::new(settings.timeout),
                },
                settings.max_retries,
            ),
            identity_monitor: ClientMetricMonitor::new(
                IdentityQuery {
                    api: BeaconApi::new(settings.timeout),
                },
                settings.max_retries,
            ),
        }
    }

    pub async fn run(&self, nodes: &[Node]) -> String {
        let peers = self.peers_monitor.collect(nodes).await;
        let identities = self.identity_monitor.collect(nodes).await;

        let peer_id_to_node: HashMap<&str, &str> = identities
            .results
            .iter()
            .map(|(node, peer_id)| (peer_id.as_str(), node.as_str()))
            .collect();

        summarize(nodes, &peers.results, &peer_id_to_node)
    }
}

fn summarize(
    nodes: &[Node],
    peers_per_node: &[(String, Vec<PeerEntry>)],
    peer_id_to_node: &HashMap<&str, &str>,
) -> String {
    let mut out = String::new();
    for node in nodes {
        let Some((_, peers)) = peers_per_node.iter().find(|(name, _)| name == &node.name)
        else {
            // nodes that did not answer both queries are omitted
            continue;
        };
        let mut inbound: Vec<&str> = Vec::new();
        let mut outbound: Vec<&str> = Vec::new();
        for peer in peers {
            let name = peer_id_to_node
                .get(peer.peer_id.as_str())
                .copied()
                .unwrap_or(peer.peer_id.as_str());
            match peer.direction.as_str() {
                "inbound" => inbound.push(name),
                "outbound" => outbound.push(name),
                _ => {}
            }
        }
        out += &format!("{}:\n\tinbound: {:?}\n\toutbound: {:?}\n", node.name, inbound, outbound);
    }
    out
}

pub struct PeersAction {
    summary: PeeringSummary,
    nodes: Vec<Node>,
    interval: MonitorInterval,
}

impl PeersAction {
    pub fn new(nodes: Vec<Node>, settings: &MetricSettings, interval: MonitorInterval) -> Self {
        Self {
            summary: PeeringSummary::new(settings),
            nodes,
            interval,
        }
    }
}

#[async_trait]
impl MonitorAction for PeersAction {
    fn name(&self) -> &str {
        "peer-monitor"
    }

    fn interval(&self) -> MonitorInterval {
        self.interval
    }

    async fn perform(&mut self) -> Result<()> {
        log::info!("peering-info:\n{}", self.summary.run(&self.nodes).await);
        Ok(())
    }
}
