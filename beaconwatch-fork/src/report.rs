//! Labeled text report for one reconstruction run, meant for human
//! inspection mid-experiment.

use crate::analysis::{leading_token, ChainAnalysis, ForkBranch};

const SEPARATOR: &str =
    "====================================================================================";

fn render_syncing(out: &mut String, branch: &ForkBranch, level: &str, analysis: &ChainAnalysis) {
    out.push_str(&format!(
        "SYNCING {} latest parent hash: {} {:?}\n",
        level,
        leading_token(&branch.signature),
        analysis.nodes_for(&branch.signature)
    ));
    if let Some(child) = &branch.descendant {
        render_syncing(out, child, &format!("{}--", level), analysis);
    }
}

/// Renders the full report: skipped slots, the hash alias mapping, the
/// distinct chains, then each root chain with its lagging descendants.
pub fn render_report(analysis: &ChainAnalysis) -> String {
    let mut out = String::new();

    out.push_str("Clients and their skipped slots\n");
    for (node, slots) in &analysis.skipped_slots {
        out.push_str(&format!("SKIPPED_SLOTS: {} {:?}\n", node, slots));
    }

    out.push_str("Mapping from old hash to new hash\n");
    for (root, alias) in analysis.aliases.iter() {
        out.push_str(&format!("HASH_MAPPING: {}: {}\n", root, alias));
    }
    out.push_str(SEPARATOR);
    out.push('\n');

    out.push_str(
        "Clients with matching chains, chains are in order and the right most hash is the root hash\n",
    );
    for (signature, nodes) in &analysis.groups {
        out.push_str(&format!("POTENTIAL_FORKS: ({:?}, {:?})\n", signature, nodes));
    }
    out.push_str(SEPARATOR);
    out.push('\n');

    out.push_str(&format!("num_forks: {}\n", analysis.num_forks()));
    for root in &analysis.tree.roots {
        let nodes = analysis.nodes_for(&root.signature);
        out.push_str(&format!("UNIQUE CHAIN {:?} {}\n", nodes, root.signature));
        let skipped = nodes
            .first()
            .map(|node| analysis.skipped_slots_for(node))
            .unwrap_or(&[]);
        out.push_str(&format!("SKIPPED SLOTS {:?}\n", skipped));
        if let Some(descendant) = &root.descendant {
            render_syncing(&mut out, descendant, "--------", analysis);
        }
    }

    out
}
