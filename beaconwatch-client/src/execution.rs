//! Execution-layer JSON-RPC requests.

use std::time::Duration;

use serde_json::{json, Value};

use crate::{Node, Result};

/// Minimal execution JSON-RPC client; only the head-availability probe
/// needs it.
#[derive(Clone)]
pub struct ExecutionApi {
    http: reqwest::Client,
    timeout: Duration,
}

impl ExecutionApi {
    pub fn new(timeout: Duration) -> Self {
        Self {
            http: reqwest::Client::new(),
            timeout,
        }
    }

    /// `eth_getBlockByNumber("latest", false)`.
    pub async fn get_latest_block(&self, node: &Node) -> Result<Value> {
        let payload = json!({
            "jsonrpc": "2.0",
            "method": "eth_getBlockByNumber",
            "params": ["latest", false],
            "id": 1,
        });
        let response = self
            .http
            .post(node.execution_rpc_url())
            .timeout(self.timeout)
            .json(&payload)
            .send()
            .await?;
        let body = response.text().await?;
        Ok(serde_json::from_str(&body).unwrap_or(Value::Null))
    }
}

pub fn latest_block_hash_from_response(response: &Value) -> Option<String> {
    response
        .get("result")?
        .get("hash")?
        .as_str()
        .map(str::to_string)
}
