//! Metric monitors for a fleet of test nodes.
//!
//! A monitor fans a single query out to every node concurrently, classifies
//! each outcome into a [`MonitorSnapshot`], and retries whole rounds under a
//! fixed budget. The consensus variant additionally groups results by value
//! to decide whether every healthy node agrees. Failures are never fatal:
//! they end up as bucket membership in the snapshot.

mod client_monitor;
mod consensus_monitor;
mod query;
mod snapshot;

pub mod metrics;
pub mod testnet_monitor;

pub use client_monitor::ClientMetricMonitor;
pub use consensus_monitor::ConsensusMetricMonitor;
pub use query::MetricQuery;
pub use snapshot::{ConsensusSnapshot, MonitorSnapshot};
pub use testnet_monitor::{MonitorAction, MonitorInterval, SlotClock, TestnetMonitor};
