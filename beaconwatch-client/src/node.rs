use serde::{Deserialize, Serialize};

fn default_beacon_api_port() -> u16 {
    5052
}

fn default_execution_rpc_port() -> u16 {
    8545
}

/// A monitored client process: one consensus-layer node paired with its
/// execution-layer node, reachable over the testnet network.
///
/// Owned by the testnet configuration; the monitors and the fork engine
/// only ever read these fields and identify a node by `name`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub name: String,
    pub ip_address: String,
    pub consensus_client: String,
    pub execution_client: String,
    #[serde(default = "default_beacon_api_port")]
    pub beacon_api_port: u16,
    #[serde(default = "default_execution_rpc_port")]
    pub execution_rpc_port: u16,
}

impl Node {
    pub fn beacon_api_url(&self) -> String {
        format!("http://{}:{}", self.ip_address, self.beacon_api_port)
    }

    pub fn execution_rpc_url(&self) -> String {
        format!("http://{}:{}", self.ip_address, self.execution_rpc_port)
    }
}
