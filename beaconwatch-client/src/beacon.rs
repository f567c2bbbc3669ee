//! Beacon API requests and their typed extractors.
//!
//! Each request returns the raw JSON body; the `*_from_response` extractors
//! pull the domain fields out and return `None` for anything malformed, so
//! callers can classify bad bodies as invalid responses rather than
//! transport failures.

use std::time::Duration;

use serde_json::Value;

use crate::{Node, Result};

/// Read-only beacon API client shared across all monitored nodes.
#[derive(Clone)]
pub struct BeaconApi {
    http: reqwest::Client,
    timeout: Duration,
}

impl BeaconApi {
    pub fn new(timeout: Duration) -> Self {
        Self {
            http: reqwest::Client::new(),
            timeout,
        }
    }

    async fn get_json(&self, url: String) -> Result<Value> {
        let response = self.http.get(&url).timeout(self.timeout).send().await?;
        let body = response.text().await?;
        // Some clients have been seen returning non-JSON bodies under load;
        // surface those as a null value so the parser rejects them.
        Ok(serde_json::from_str(&body).unwrap_or(Value::Null))
    }

    /// `GET /eth/v2/beacon/blocks/{block_id}` where `block_id` is `head`,
    /// a slot number, or a block root.
    pub async fn get_block(&self, node: &Node, block_id: &str) -> Result<Value> {
        self.get_json(format!(
            "{}/eth/v2/beacon/blocks/{}",
            node.beacon_api_url(),
            block_id
        ))
        .await
    }

    pub async fn get_finality_checkpoints(&self, node: &Node) -> Result<Value> {
        self.get_json(format!(
            "{}/eth/v1/beacon/states/head/finality_checkpoints",
            node.beacon_api_url()
        ))
        .await
    }

    pub async fn get_peers(&self, node: &Node) -> Result<Value> {
        self.get_json(format!(
            "{}/eth/v1/node/peers?state=connected",
            node.beacon_api_url()
        ))
        .await
    }

    pub async fn get_identity(&self, node: &Node) -> Result<Value> {
        self.get_json(format!("{}/eth/v1/node/identity", node.beacon_api_url()))
            .await
    }

    pub async fn get_blob_sidecars(&self, node: &Node) -> Result<Value> {
        self.get_json(format!(
            "{}/eth/v1/beacon/blob_sidecars/head",
            node.beacon_api_url()
        ))
        .await
    }

    pub async fn get_validators(&self, node: &Node) -> Result<Value> {
        self.get_json(format!(
            "{}/eth/v1/beacon/states/head/validators",
            node.beacon_api_url()
        ))
        .await
    }
}

/// A node's view of its head (or any fetched) block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BeaconBlock {
    pub slot: u64,
    pub parent_root: String,
    pub state_root: String,
    /// Raw hex graffiti as returned by the API.
    pub graffiti: String,
}

/// An (epoch, root) checkpoint pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Checkpoint {
    pub epoch: u64,
    pub root: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinalityCheckpoints {
    pub finalized: Checkpoint,
    pub current_justified: Checkpoint,
    pub previous_justified: Checkpoint,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerEntry {
    pub peer_id: String,
    pub state: String,
    pub direction: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobSidecar {
    pub slot: u64,
    pub block_root: String,
    pub proposer_index: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatorStatus {
    pub pubkey: String,
    pub status: String,
}

fn field_u64(value: &Value) -> Option<u64> {
    // Beacon API integers are decimal strings.
    value.as_str()?.parse().ok()
}

fn field_string(value: &Value) -> Option<String> {
    value.as_str().map(str::to_string)
}

pub fn block_from_response(response: &Value) -> Option<BeaconBlock> {
    let message = response.get("data")?.get("message")?;
    Some(BeaconBlock {
        slot: field_u64(message.get("slot")?)?,
        parent_root: field_string(message.get("parent_root")?)?,
        state_root: field_string(message.get("state_root")?)?,
        graffiti: field_string(message.get("body")?.get("graffiti")?)?,
    })
}

fn checkpoint_from_value(value: &Value) -> Option<Checkpoint> {
    Some(Checkpoint {
        epoch: field_u64(value.get("epoch")?)?,
        root: field_string(value.get("root")?)?,
    })
}

pub fn finality_checkpoints_from_response(response: &Value) -> Option<FinalityCheckpoints> {
    let data = response.get("data")?;
    Some(FinalityCheckpoints {
        finalized: checkpoint_from_value(data.get("finalized")?)?,
        current_justified: checkpoint_from_value(data.get("current_justified")?)?,
        previous_justified: checkpoint_from_value(data.get("previous_justified")?)?,
    })
}

pub fn peers_from_response(response: &Value) -> Option<Vec<PeerEntry>> {
    let data = response.get("data")?.as_array()?;
    let mut peers = Vec::with_capacity(data.len());
    for peer in data {
        peers.push(PeerEntry {
            peer_id: field_string(peer.get("peer_id")?)?,
            state: field_string(peer.get("state")?)?,
            direction: field_string(peer.get("direction")?)?,
        });
    }
    Some(peers)
}

pub fn peer_id_from_identity_response(response: &Value) -> Option<String> {
    field_string(response.get("data")?.get("peer_id")?)
}

/// Extracts the head blob sidecar; `None` when the node has no sidecars for
/// the head block.
pub fn blob_sidecar_from_response(response: &Value) -> Option<BlobSidecar> {
    let sidecar = response.get("data")?.as_array()?.first()?;
    Some(BlobSidecar {
        slot: field_u64(sidecar.get("slot")?)?,
        block_root: field_string(sidecar.get("block_root")?)?,
        proposer_index: field_u64(sidecar.get("proposer_index")?)?,
    })
}

pub fn validators_from_response(response: &Value) -> Option<Vec<ValidatorStatus>> {
    let data = response.get("data")?.as_array()?;
    let mut validators = Vec::with_capacity(data.len());
    for entry in data {
        validators.push(ValidatorStatus {
            pubkey: field_string(entry.get("validator")?.get("pubkey")?)?,
            status: field_string(entry.get("status")?)?,
        });
    }
    Some(validators)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_block_from_response() {
        let response = json!({
            "data": {
                "message": {
                    "slot": "42",
                    "parent_root": "0xaa",
                    "state_root": "0xbb",
                    "body": { "graffiti": "0x6c69676874686f757365" }
                }
            }
        });
        let block = block_from_response(&response).unwrap();
        assert_eq!(block.slot, 42);
        assert_eq!(block.parent_root, "0xaa");
        assert_eq!(block.state_root, "0xbb");
    }

    #[test]
    fn test_block_from_error_response() {
        let response = json!({ "code": 404, "message": "block not found" });
        assert!(block_from_response(&response).is_none());
        assert!(block_from_response(&Value::Null).is_none());
    }

    #[test]
    fn test_finality_checkpoints_from_response() {
        let response = json!({
            "data": {
                "finalized": { "epoch": "3", "root": "0x01" },
                "current_justified": { "epoch": "4", "root": "0x02" },
                "previous_justified": { "epoch": "3", "root": "0x01" }
            }
        });
        let checkpoints = finality_checkpoints_from_response(&response).unwrap();
        assert_eq!(checkpoints.finalized.epoch, 3);
        assert_eq!(checkpoints.current_justified.root, "0x02");
    }

    #[test]
    fn test_peers_from_response() {
        let response = json!({
            "data": [
                { "peer_id": "16Uiu2HAm1", "state": "connected", "direction": "inbound" },
                { "peer_id": "16Uiu2HAm2", "state": "connected", "direction": "outbound" }
            ]
        });
        let peers = peers_from_response(&response).unwrap();
        assert_eq!(peers.len(), 2);
        assert_eq!(peers[1].direction, "outbound");
    }

    #[test]
    fn test_validators_from_response() {
        let response = json!({
            "data": [
                {
                    "index": "1",
                    "status": "active_ongoing",
                    "validator": { "pubkey": "0x93247f" }
                }
            ]
        });
        let validators = validators_from_response(&response).unwrap();
        assert_eq!(validators[0].status, "active_ongoing");
        assert_eq!(validators[0].pubkey, "0x93247f");
    }
}
