use std::time::Duration;

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use serde_json::Value;

use beaconwatch_client::beacon::{block_from_response, BeaconApi};
use beaconwatch_client::{Node, ZERO_ROOT};

/// Step budget per node walk; deep histories cost one request per step.
pub const DEFAULT_MAX_DEPTH: usize = 10;

/// Concurrent node walks in flight at once.
const WALK_POOL_SIZE: usize = 5;

/// This client's block-by-root endpoint is slow enough to stall a whole
/// reconstruction run, so it is excluded from walking.
const SLOW_CLIENT_TAG: &str = "teku";

/// One step of a backward walk: the parent pointer and slot taken from a
/// fetched block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainStep {
    pub parent_root: String,
    pub slot: u64,
}

/// A node's reconstructed history, newest to oldest. Valid only for the
/// reconstruction run that collected it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainRecord {
    pub node: String,
    pub steps: Vec<ChainStep>,
}

/// Per-step block fetch the walker depends on.
#[async_trait]
pub trait BlockSource: Send + Sync {
    async fn fetch_block(&self, node: &Node, block_id: &str) -> beaconwatch_client::Result<Value>;
}

#[async_trait]
impl BlockSource for BeaconApi {
    async fn fetch_block(&self, node: &Node, block_id: &str) -> beaconwatch_client::Result<Value> {
        self.get_block(node, block_id).await
    }
}

/// Walks chains backward via repeated parent-root lookups.
pub struct ChainWalker<S: BlockSource = BeaconApi> {
    source: S,
    max_depth: usize,
}

impl ChainWalker<BeaconApi> {
    pub fn new(timeout: Duration, max_depth: usize) -> Self {
        Self::with_source(BeaconApi::new(timeout), max_depth)
    }
}

impl<S: BlockSource> ChainWalker<S> {
    pub fn with_source(source: S, max_depth: usize) -> Self {
        Self { source, max_depth }
    }

    /// Walks one node back from its head. Each step depends on the previous
    /// step's parent root, so the walk is strictly sequential.
    ///
    /// Returns `None` for skipped nodes and on any mid-walk failure: a
    /// truncated history cannot be compared safely, so the whole partial
    /// record is discarded rather than returned.
    pub async fn walk_node(&self, node: &Node) -> Option<ChainRecord> {
        if node.consensus_client.contains(SLOW_CLIENT_TAG) {
            log::debug!("{}: skipping slow client for chain walk", node.name);
            return None;
        }

        let mut steps = Vec::new();
        let mut block_id = "head".to_string();
        for _ in 0..self.max_depth {
            let response = match self.source.fetch_block(node, &block_id).await {
                Ok(response) => response,
                Err(err) => {
                    log::debug!("{}: chain walk aborted: {}", node.name, err);
                    return None;
                }
            };
            let Some(block) = block_from_response(&response) else {
                log::debug!("{}: chain walk got invalid block body", node.name);
                return None;
            };
            steps.push(ChainStep {
                parent_root: block.parent_root.clone(),
                slot: block.slot,
            });
            if block.parent_root == ZERO_ROOT || block.slot == 0 {
                break;
            }
            block_id = block.parent_root;
        }
        Some(ChainRecord {
            node: node.name.clone(),
            steps,
        })
    }

    /// Walks all nodes through a bounded pool and returns the usable
    /// records sorted by node name, so downstream alias assignment is
    /// deterministic.
    pub async fn walk_all(&self, nodes: &[Node]) -> Vec<ChainRecord> {
        let mut records: Vec<ChainRecord> = stream::iter(nodes)
            .map(|node| self.walk_node(node))
            .buffer_unordered(WALK_POOL_SIZE)
            .filter_map(|record| async move { record })
            .collect()
            .await;
        records.sort_by(|a, b| a.node.cmp(&b.node));
        records
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::HashMap;
    use std::sync::Mutex;

    use serde_json::json;

    use beaconwatch_client::TransportError;

    fn node(name: &str, consensus_client: &str) -> Node {
        Node {
            name: name.to_string(),
            ip_address: "10.0.20.9".to_string(),
            consensus_client: consensus_client.to_string(),
            execution_client: "geth".to_string(),
            beacon_api_port: 5052,
            execution_rpc_port: 8545,
        }
    }

    fn block_body(slot: u64, parent_root: &str) -> Value {
        json!({
            "data": {
                "message": {
                    "slot": slot.to_string(),
                    "parent_root": parent_root,
                    "state_root": "0xst",
                    "body": { "graffiti": "0x00" }
                }
            }
        })
    }

    /// Serves canned blocks by requested id and counts fetches. Unknown ids
    /// come back as null bodies, which parse as invalid.
    struct ScriptedSource {
        blocks: HashMap<String, beaconwatch_client::Result<Value>>,
        fetches: Mutex<usize>,
    }

    impl ScriptedSource {
        fn new(blocks: Vec<(&str, beaconwatch_client::Result<Value>)>) -> Self {
            Self {
                blocks: blocks
                    .into_iter()
                    .map(|(id, outcome)| (id.to_string(), outcome))
                    .collect(),
                fetches: Mutex::new(0),
            }
        }

        fn fetch_count(&self) -> usize {
            *self.fetches.lock().unwrap()
        }
    }

    #[async_trait]
    impl BlockSource for ScriptedSource {
        async fn fetch_block(
            &self,
            _node: &Node,
            block_id: &str,
        ) -> beaconwatch_client::Result<Value> {
            *self.fetches.lock().unwrap() += 1;
            match self.blocks.get(block_id) {
                Some(Ok(value)) => Ok(value.clone()),
                Some(Err(TransportError::Timeout)) => Err(TransportError::Timeout),
                Some(Err(err)) => Err(TransportError::Unknown(err.to_string())),
                None => Ok(Value::Null),
            }
        }
    }

    #[tokio::test]
    async fn test_slow_client_is_skipped_without_any_request() {
        let source = ScriptedSource::new(vec![("head", Ok(block_body(3, "0xaa")))]);
        let walker = ChainWalker::with_source(source, DEFAULT_MAX_DEPTH);
        let record = walker.walk_node(&node("teku-geth-0", "teku")).await;
        assert!(record.is_none());
        assert_eq!(walker.source.fetch_count(), 0);
    }

    #[tokio::test]
    async fn test_mid_walk_failure_discards_partial_record() {
        // head resolves, its parent times out: the collected step must not
        // survive as a truncated record
        let source = ScriptedSource::new(vec![
            ("head", Ok(block_body(5, "0xbb"))),
            ("0xbb", Err(TransportError::Timeout)),
        ]);
        let walker = ChainWalker::with_source(source, DEFAULT_MAX_DEPTH);
        assert!(walker.walk_node(&node("a", "prysm")).await.is_none());
        assert_eq!(walker.source.fetch_count(), 2);
    }

    #[tokio::test]
    async fn test_invalid_body_mid_walk_discards_partial_record() {
        let source = ScriptedSource::new(vec![
            ("head", Ok(block_body(5, "0xbb"))),
            ("0xbb", Ok(json!({ "code": 404, "message": "not found" }))),
        ]);
        let walker = ChainWalker::with_source(source, DEFAULT_MAX_DEPTH);
        assert!(walker.walk_node(&node("a", "prysm")).await.is_none());
    }

    #[tokio::test]
    async fn test_walk_terminates_at_zero_root() {
        let source = ScriptedSource::new(vec![
            ("head", Ok(block_body(2, "0xbb"))),
            ("0xbb", Ok(block_body(1, ZERO_ROOT))),
        ]);
        let walker = ChainWalker::with_source(source, DEFAULT_MAX_DEPTH);
        let record = walker.walk_node(&node("a", "prysm")).await.unwrap();
        // the terminal step is recorded, then the walk stops
        assert_eq!(record.steps.len(), 2);
        assert_eq!(record.steps[1].parent_root, ZERO_ROOT);
        assert_eq!(walker.source.fetch_count(), 2);
    }

    #[tokio::test]
    async fn test_walk_terminates_at_slot_zero() {
        let source = ScriptedSource::new(vec![
            ("head", Ok(block_body(1, "0xaa"))),
            ("0xaa", Ok(block_body(0, "0x99"))),
        ]);
        let walker = ChainWalker::with_source(source, DEFAULT_MAX_DEPTH);
        let record = walker.walk_node(&node("a", "prysm")).await.unwrap();
        assert_eq!(record.steps.len(), 2);
        assert_eq!(record.steps[1].slot, 0);
        assert_eq!(walker.source.fetch_count(), 2);
    }

    #[tokio::test]
    async fn test_walk_stops_at_depth_budget() {
        let source = ScriptedSource::new(vec![
            ("head", Ok(block_body(9, "0xb1"))),
            ("0xb1", Ok(block_body(8, "0xb2"))),
            ("0xb2", Ok(block_body(7, "0xb3"))),
        ]);
        let walker = ChainWalker::with_source(source, 2);
        let record = walker.walk_node(&node("a", "prysm")).await.unwrap();
        assert_eq!(
            record.steps,
            vec![
                ChainStep {
                    parent_root: "0xb1".to_string(),
                    slot: 9
                },
                ChainStep {
                    parent_root: "0xb2".to_string(),
                    slot: 8
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_walk_all_excludes_failed_nodes_and_sorts() {
        let source = ScriptedSource::new(vec![("head", Ok(block_body(1, ZERO_ROOT)))]);
        let walker = ChainWalker::with_source(source, DEFAULT_MAX_DEPTH);
        let nodes = vec![
            node("b", "prysm"),
            node("teku-geth-0", "teku"),
            node("a", "lighthouse"),
        ];
        let records = walker.walk_all(&nodes).await;
        let names: Vec<&str> = records.iter().map(|r| r.node.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
    }
}
