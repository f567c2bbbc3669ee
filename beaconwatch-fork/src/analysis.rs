//! Pure cross-node analysis of the chain records collected by one
//! reconstruction run: skipped slots, hash aliasing, chain signatures, and
//! the fork tree separating real forks from lagging nodes.

use std::collections::HashMap;

use crate::walker::ChainRecord;

/// First-seen-order bijection from parent roots to small integers, used to
/// render compact, comparable chain signatures.
///
/// Scoped to a single run: built fresh from that run's records and passed
/// explicitly, never shared.
#[derive(Debug, Clone, Default)]
pub struct HashAliases {
    by_root: HashMap<String, u64>,
    order: Vec<String>,
}

impl HashAliases {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the alias for `root`, assigning the next integer on first
    /// sight. Aliases start at 1.
    pub fn alias(&mut self, root: &str) -> u64 {
        if let Some(&alias) = self.by_root.get(root) {
            return alias;
        }
        let alias = self.order.len() as u64 + 1;
        self.by_root.insert(root.to_string(), alias);
        self.order.push(root.to_string());
        alias
    }

    /// (root, alias) pairs in assignment order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.order
            .iter()
            .enumerate()
            .map(|(index, root)| (root.as_str(), index as u64 + 1))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// How one signature is judged to be an ancestor-chain of another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Containment {
    /// The historical behavior: A descends from B when A's leading
    /// `" alias-slot "` token occurs anywhere in B's signature text. Small
    /// reused alias integers make textual coincidences possible.
    #[default]
    Substring,
    /// Structural check: A descends from B when A's token sequence
    /// (newest first) is a proper suffix of B's.
    Structural,
}

/// A distinct chain view and, when some group of nodes lags behind it, the
/// chain of successively-shorter views nested beneath it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForkBranch {
    pub signature: String,
    pub descendant: Option<Box<ForkBranch>>,
}

/// The distinct chain views of one run, organized as roots (genuinely
/// divergent chains) each with its nested lagging descendants.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ForkTree {
    pub roots: Vec<ForkBranch>,
}

/// Everything the cross-node analysis derives from one run's records.
#[derive(Debug, Clone)]
pub struct ChainAnalysis {
    pub highest_slot: u64,
    /// Per node, slots in `[1, highest_slot)` with no block in its record.
    pub skipped_slots: Vec<(String, Vec<u64>)>,
    pub aliases: HashAliases,
    /// Per node, its rendered chain signature.
    pub signatures: Vec<(String, String)>,
    /// Nodes grouped by identical signature, first-seen order.
    pub groups: Vec<(String, Vec<String>)>,
    pub tree: ForkTree,
}

impl ChainAnalysis {
    pub fn num_forks(&self) -> usize {
        self.tree.roots.len().saturating_sub(1)
    }

    pub fn nodes_for(&self, signature: &str) -> &[String] {
        self.groups
            .iter()
            .find(|(sig, _)| sig == signature)
            .map(|(_, nodes)| nodes.as_slice())
            .unwrap_or(&[])
    }

    pub fn skipped_slots_for(&self, node: &str) -> &[u64] {
        self.skipped_slots
            .iter()
            .find(|(name, _)| name == node)
            .map(|(_, slots)| slots.as_slice())
            .unwrap_or(&[])
    }
}

fn highest_slot(records: &[ChainRecord]) -> u64 {
    records
        .iter()
        .flat_map(|record| record.steps.iter().map(|step| step.slot))
        .max()
        .unwrap_or(0)
}

fn skipped_slots(record: &ChainRecord, highest: u64) -> Vec<u64> {
    (1..highest)
        .filter(|slot| !record.steps.iter().any(|step| step.slot == *slot))
        .collect()
}

/// Renders a record as its canonical comparison key: space-joined
/// `alias-slot` tokens in record order, with leading and trailing spaces so
/// token boundaries survive substring tests.
fn signature(record: &ChainRecord, aliases: &mut HashAliases) -> String {
    let mut out = String::new();
    for step in &record.steps {
        out += &format!(" {}-{}", aliases.alias(&step.parent_root), step.slot);
    }
    out + " "
}

/// The most recent `" alias-slot "` token of a signature, surrounding
/// spaces included.
pub(crate) fn leading_token(signature: &str) -> &str {
    let Some(start) = signature.find(' ') else {
        // no token boundaries at all (including the empty string)
        return signature;
    };
    let end = signature[start + 1..]
        .find(' ')
        .map(|offset| start + 1 + offset + 1)
        .unwrap_or(signature.len());
    &signature[start..end]
}

fn is_descendant_of(descendant: &str, ancestor: &str, mode: Containment) -> bool {
    match mode {
        Containment::Substring => ancestor.contains(leading_token(descendant)),
        Containment::Structural => {
            let descendant_tokens: Vec<&str> = descendant.split_whitespace().collect();
            let ancestor_tokens: Vec<&str> = ancestor.split_whitespace().collect();
            descendant_tokens.len() < ancestor_tokens.len()
                && ancestor_tokens.ends_with(&descendant_tokens)
        }
    }
}

/// Classifies the distinct signatures of a run into roots and nested
/// lagging descendants.
///
/// Signatures are visited shortest first so a chain's descendants are
/// resolved before the chain itself is linked under a longer one.
pub fn build_fork_tree(signatures: &[String], mode: Containment) -> ForkTree {
    let mut sorted: Vec<&String> = signatures.iter().collect();
    sorted.sort_by_key(|signature| signature.len());

    // signature -> the branch describing its (already-resolved) descendant
    let mut descendants: HashMap<String, ForkBranch> = HashMap::new();
    let mut root_signatures: Vec<&String> = Vec::new();

    for c1 in &sorted {
        let mut is_root = true;
        for c2 in &sorted {
            if c1 != c2 && is_descendant_of(c1, c2, mode) {
                is_root = false;
                let branch = ForkBranch {
                    signature: (*c1).clone(),
                    descendant: descendants.get(c1.as_str()).cloned().map(Box::new),
                };
                descendants.insert((*c2).clone(), branch);
            }
        }
        if is_root {
            root_signatures.push(c1);
        }
    }

    ForkTree {
        roots: root_signatures
            .into_iter()
            .map(|signature| ForkBranch {
                signature: signature.clone(),
                descendant: descendants.get(signature.as_str()).cloned().map(Box::new),
            })
            .collect(),
    }
}

/// Runs the full cross-node analysis over one run's records.
///
/// Deterministic in record order: the same records always produce the same
/// alias assignment, signatures, and grouping.
pub fn analyze(records: &[ChainRecord], mode: Containment) -> ChainAnalysis {
    let highest = highest_slot(records);

    let skipped: Vec<(String, Vec<u64>)> = records
        .iter()
        .map(|record| (record.node.clone(), skipped_slots(record, highest)))
        .collect();

    let mut aliases = HashAliases::new();
    let signatures: Vec<(String, String)> = records
        .iter()
        .map(|record| (record.node.clone(), signature(record, &mut aliases)))
        .collect();

    let mut groups: Vec<(String, Vec<String>)> = Vec::new();
    for (node, sig) in &signatures {
        match groups.iter_mut().find(|(existing, _)| existing == sig) {
            Some((_, nodes)) => nodes.push(node.clone()),
            None => groups.push((sig.clone(), vec![node.clone()])),
        }
    }

    let distinct: Vec<String> = groups.iter().map(|(sig, _)| sig.clone()).collect();
    let tree = build_fork_tree(&distinct, mode);

    ChainAnalysis {
        highest_slot: highest,
        skipped_slots: skipped,
        aliases,
        signatures,
        groups,
        tree,
    }
}
