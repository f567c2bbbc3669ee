use futures::future::join_all;

use beaconwatch_client::{Node, TransportError};

use crate::query::MetricQuery;
use crate::snapshot::MonitorSnapshot;

/// Fans one query out to every node and retries whole rounds until all
/// nodes answer cleanly or the budget runs out.
///
/// Each round queries every node concurrently and joins before anything is
/// classified; round N+1 never starts before round N completes. The final
/// snapshot is whatever the last round produced — failure is surfaced as
/// bucket membership, never as an error.
pub struct ClientMetricMonitor<Q: MetricQuery> {
    query: Q,
    max_retries: usize,
}

impl<Q: MetricQuery> ClientMetricMonitor<Q> {
    pub fn new(query: Q, max_retries: usize) -> Self {
        Self { query, max_retries }
    }

    pub fn query(&self) -> &Q {
        &self.query
    }

    /// One fan-out-then-classify pass over all nodes.
    pub async fn query_round(&self, nodes: &[Node]) -> MonitorSnapshot<Q::Value> {
        let outcomes = join_all(nodes.iter().map(|node| async {
            (node.name.clone(), self.query.perform_request(node).await)
        }))
        .await;

        let mut snapshot = MonitorSnapshot::new();
        for (name, outcome) in outcomes {
            match outcome {
                Ok(response) => match self.query.parse(&response) {
                    Some(value) => snapshot.results.push((name, value)),
                    None => snapshot.invalid_response_nodes.push(name),
                },
                Err(TransportError::Timeout) => {
                    log::debug!("{}: request timed out", name);
                    snapshot.timeout_nodes.push(name);
                }
                Err(TransportError::Connection(reason)) => {
                    log::debug!("{}: unreachable: {}", name, reason);
                    snapshot.connection_error_nodes.push(name);
                }
                Err(TransportError::Unknown(reason)) => {
                    log::debug!("{}: unknown transport error: {}", name, reason);
                    snapshot.unknown_error_nodes.push(name);
                }
            }
        }
        snapshot
    }

    /// Runs up to `max_retries` rounds, stopping early once a round has no
    /// failures at all.
    pub async fn collect(&self, nodes: &[Node]) -> MonitorSnapshot<Q::Value> {
        let mut snapshot = MonitorSnapshot::new();
        for attempt in 0..self.max_retries.max(1) {
            snapshot = self.query_round(nodes).await;
            if snapshot.all_healthy() {
                break;
            }
            log::debug!(
                "round {} had failures, {} attempts remain",
                attempt + 1,
                self.max_retries.max(1) - attempt - 1
            );
        }
        snapshot
    }

    /// Collect and render the default report.
    pub async fn run(&self, nodes: &[Node]) -> String {
        self.collect(nodes).await.report()
    }
}
