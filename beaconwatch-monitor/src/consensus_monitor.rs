use beaconwatch_client::Node;

use crate::client_monitor::ClientMetricMonitor;
use crate::query::MetricQuery;
use crate::snapshot::{ConsensusSnapshot, MonitorSnapshot};

/// Extends the fan-out monitor with agreement detection.
///
/// After each round the results are partitioned into value groups; rounds
/// are retried up to `max_retries_for_consensus` times until exactly one
/// group remains with no unreachable or invalid nodes. On exhaustion the
/// last round's grouping is returned as-is — a prolonged disagreement is
/// data for the caller, not an error.
pub struct ConsensusMetricMonitor<Q: MetricQuery> {
    monitor: ClientMetricMonitor<Q>,
    max_retries_for_consensus: usize,
}

impl<Q: MetricQuery> ConsensusMetricMonitor<Q> {
    pub fn new(query: Q, max_retries_for_consensus: usize) -> Self {
        Self {
            // retries happen at the consensus level, one fan-out per round
            monitor: ClientMetricMonitor::new(query, 1),
            max_retries_for_consensus,
        }
    }

    pub fn query(&self) -> &Q {
        self.monitor.query()
    }

    pub async fn collect(&self, nodes: &[Node]) -> ConsensusSnapshot<Q::Value> {
        let mut consensus = ConsensusSnapshot::from_snapshot(MonitorSnapshot::new());
        for attempt in 0..self.max_retries_for_consensus.max(1) {
            let snapshot = self.monitor.query_round(nodes).await;
            consensus = ConsensusSnapshot::from_snapshot(snapshot);
            if consensus.reached_consensus() {
                break;
            }
            log::debug!(
                "no consensus after round {} ({} groups)",
                attempt + 1,
                consensus.groups.len()
            );
        }
        if consensus.reached_consensus() && !consensus.is_healthy() {
            // agreement among the nodes that answered, but not a clean round
            log::warn!(
                "consensus reached with degraded nodes:\n{}",
                consensus.snapshot.failure_report()
            );
        }
        consensus
    }

    /// Collect and render the default report, prefixed with the fork count.
    pub async fn run(&self, nodes: &[Node]) -> String {
        let consensus = self.collect(nodes).await;
        format!("num_forks: {}\n{}", consensus.num_forks(), consensus.report())
    }
}
