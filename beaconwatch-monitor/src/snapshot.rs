use std::fmt::Debug;

/// The classified outcome of one fan-out round.
///
/// Every queried node lands in exactly one place: `results` or one of the
/// four failure buckets. Buckets are rebuilt from scratch each round, never
/// merged across rounds.
#[derive(Debug, Clone)]
pub struct MonitorSnapshot<V> {
    /// Parsed value per node, in node order.
    pub results: Vec<(String, V)>,
    pub timeout_nodes: Vec<String>,
    pub connection_error_nodes: Vec<String>,
    pub unknown_error_nodes: Vec<String>,
    pub invalid_response_nodes: Vec<String>,
}

impl<V> MonitorSnapshot<V> {
    pub fn new() -> Self {
        Self {
            results: Vec::new(),
            timeout_nodes: Vec::new(),
            connection_error_nodes: Vec::new(),
            unknown_error_nodes: Vec::new(),
            invalid_response_nodes: Vec::new(),
        }
    }

    /// True when the round produced no failures of any kind.
    pub fn all_healthy(&self) -> bool {
        self.timeout_nodes.is_empty()
            && self.connection_error_nodes.is_empty()
            && self.unknown_error_nodes.is_empty()
            && self.invalid_response_nodes.is_empty()
    }

    pub fn value_for(&self, node: &str) -> Option<&V> {
        self.results
            .iter()
            .find(|(name, _)| name == node)
            .map(|(_, value)| value)
    }

    /// One line per non-empty failure bucket; empty buckets are omitted.
    pub fn failure_report(&self) -> String {
        let mut out = String::new();
        if !self.timeout_nodes.is_empty() {
            out += &format!("Timeout Clients: {:?}\n", self.timeout_nodes);
        }
        if !self.connection_error_nodes.is_empty() {
            out += &format!("Unreachable Clients: {:?}\n", self.connection_error_nodes);
        }
        if !self.unknown_error_nodes.is_empty() {
            out += &format!("Unknown Error Clients: {:?}\n", self.unknown_error_nodes);
        }
        if !self.invalid_response_nodes.is_empty() {
            out += &format!("Invalid Response Clients: {:?}\n", self.invalid_response_nodes);
        }
        out
    }
}

impl<V> Default for MonitorSnapshot<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Debug> MonitorSnapshot<V> {
    /// Per-node values followed by the non-empty failure buckets.
    pub fn report(&self) -> String {
        let mut out = String::new();
        for (node, value) in &self.results {
            out += &format!("{}: {:?}\n", node, value);
        }
        out + &self.failure_report()
    }
}

/// A [`MonitorSnapshot`] with its results partitioned into groups of nodes
/// that returned the same value. One group means the fleet agrees.
#[derive(Debug, Clone)]
pub struct ConsensusSnapshot<V> {
    /// Distinct values with their supporting nodes, in first-seen order.
    pub groups: Vec<(V, Vec<String>)>,
    pub snapshot: MonitorSnapshot<V>,
}

impl<V: Clone + PartialEq> ConsensusSnapshot<V> {
    pub fn from_snapshot(snapshot: MonitorSnapshot<V>) -> Self {
        let mut groups: Vec<(V, Vec<String>)> = Vec::new();
        for (node, value) in &snapshot.results {
            match groups.iter_mut().find(|(v, _)| v == value) {
                Some((_, nodes)) => nodes.push(node.clone()),
                None => groups.push((value.clone(), vec![node.clone()])),
            }
        }
        Self { groups, snapshot }
    }

    /// The disagreement-detection check: exactly one value group, with no
    /// unreachable or invalid-response nodes. Timeouts and unknown errors
    /// are tolerated here.
    pub fn reached_consensus(&self) -> bool {
        self.groups.len() == 1
            && self.snapshot.connection_error_nodes.is_empty()
            && self.snapshot.invalid_response_nodes.is_empty()
    }

    /// The stricter health-gating check: consensus with every failure
    /// bucket empty.
    pub fn is_healthy(&self) -> bool {
        self.reached_consensus() && self.snapshot.all_healthy()
    }

    pub fn num_forks(&self) -> usize {
        self.groups.len().saturating_sub(1)
    }
}

impl<V: Clone + PartialEq + Debug> ConsensusSnapshot<V> {
    /// Each distinct value with its supporting nodes, then the buckets.
    pub fn report(&self) -> String {
        let mut out = String::new();
        for (value, nodes) in &self.groups {
            out += &format!("{:?}: {:?}\n", value, nodes);
        }
        out + &self.snapshot.failure_report()
    }
}
