use async_trait::async_trait;
use serde_json::Value;

use beaconwatch_client::{Node, TransportError};

/// The query/parse capability pair a metric supplies to a monitor.
///
/// `perform_request` issues one request to one node and surfaces transport
/// failures through the closed [`TransportError`] taxonomy; `parse` turns a
/// raw response into the metric value, returning `None` for anything
/// invalid. Monitors never touch wire bytes themselves.
#[async_trait]
pub trait MetricQuery: Send + Sync {
    type Value: Clone + PartialEq + std::fmt::Debug + Send + Sync;

    async fn perform_request(&self, node: &Node) -> Result<Value, TransportError>;

    fn parse(&self, response: &Value) -> Option<Self::Value>;
}
