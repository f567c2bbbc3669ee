//! Chain/fork reconstruction: walks every node's chain backward from its
//! head, then cross-analyzes the collected histories to tell genuine forks
//! apart from nodes that are merely lagging.
//!
//! The walker is the only part that talks to the network; the analysis is
//! pure and operates on the [`ChainRecord`]s of a single run.

mod analysis;
mod detector;
mod report;
mod walker;

pub use analysis::{analyze, ChainAnalysis, Containment, ForkBranch, ForkTree, HashAliases};
pub use detector::ForkDetector;
pub use report::render_report;
pub use walker::{BlockSource, ChainRecord, ChainStep, ChainWalker, DEFAULT_MAX_DEPTH};
