use std::time::Duration;

use anyhow::Result;

use beaconwatch_client::Node;

use crate::analysis::{analyze, Containment};
use crate::report::render_report;
use crate::walker::ChainWalker;

/// One-shot fork reconstruction over a node set: walk, analyze, report.
pub struct ForkDetector {
    walker: ChainWalker,
    containment: Containment,
}

impl ForkDetector {
    pub fn new(timeout: Duration, max_depth: usize, containment: Containment) -> Self {
        Self {
            walker: ChainWalker::new(timeout, max_depth),
            containment,
        }
    }

    /// Runs one reconstruction cycle and returns the rendered report.
    ///
    /// The only error case is a run where no node produced any usable
    /// chain data; per-node failures are silently excluded upstream.
    pub async fn run_once(&self, nodes: &[Node]) -> Result<String> {
        let records = self.walker.walk_all(nodes).await;
        if records.is_empty() {
            log::warn!("FAIL: No data retrieved");
            anyhow::bail!("no chain data retrieved from any node");
        }
        let analysis = analyze(&records, self.containment);
        Ok(render_report(&analysis))
    }
}
