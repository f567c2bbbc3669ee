use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{json, Value};

use beaconwatch_client::{Node, TransportError};
use beaconwatch_monitor::MetricQuery;

pub fn node(name: &str) -> Node {
    Node {
        name: name.to_string(),
        ip_address: "10.0.20.4".to_string(),
        consensus_client: "prysm".to_string(),
        execution_client: "geth".to_string(),
        beacon_api_port: 5052,
        execution_rpc_port: 8545,
    }
}

#[derive(Clone)]
pub enum Outcome {
    Value(u64),
    Timeout,
    ConnectionError,
    UnknownError,
    Invalid,
}

/// A query whose per-node outcomes are scripted round by round; the last
/// entry repeats once the script runs out.
pub struct ScriptedQuery {
    script: HashMap<String, Vec<Outcome>>,
    calls: Mutex<HashMap<String, usize>>,
}

impl ScriptedQuery {
    pub fn new(script: Vec<(&str, Vec<Outcome>)>) -> Self {
        Self {
            script: script
                .into_iter()
                .map(|(name, outcomes)| (name.to_string(), outcomes))
                .collect(),
            calls: Mutex::new(HashMap::new()),
        }
    }

    pub fn calls_for(&self, node: &str) -> usize {
        *self.calls.lock().unwrap().get(node).unwrap_or(&0)
    }
}

#[async_trait]
impl MetricQuery for ScriptedQuery {
    type Value = u64;

    async fn perform_request(&self, node: &Node) -> Result<Value, TransportError> {
        let round = {
            let mut calls = self.calls.lock().unwrap();
            let counter = calls.entry(node.name.clone()).or_insert(0);
            let round = *counter;
            *counter += 1;
            round
        };
        let outcomes = &self.script[&node.name];
        let outcome = outcomes
            .get(round)
            .or_else(|| outcomes.last())
            .expect("empty script");
        match outcome {
            Outcome::Value(v) => Ok(json!({ "value": v })),
            Outcome::Timeout => Err(TransportError::Timeout),
            Outcome::ConnectionError => {
                Err(TransportError::Connection("connection refused".to_string()))
            }
            Outcome::UnknownError => Err(TransportError::Unknown("broken pipe".to_string())),
            Outcome::Invalid => Ok(json!({ "code": 500, "message": "error" })),
        }
    }

    fn parse(&self, response: &Value) -> Option<u64> {
        response.get("value")?.as_u64()
    }
}
