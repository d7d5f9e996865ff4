//! # Signature Index
//!
//! Groups the nodes of a snapshot by [`SignatureId`]. Nodes with the same
//! interface fall into the same group regardless of their names, which makes
//! the index the basis of name-agnostic reports and diffs.

use crate::hasher::SignatureId;
use crate::signature::Signature;
use crate::snapshot::NodeRecord;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

// =============================================================================
// SIGNATURE GROUPS
// =============================================================================

/// All nodes sharing one signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SignatureGroup {
    /// Group identifier.
    pub id: SignatureId,
    /// The shared signature.
    pub signature: Signature,
    /// Number of nodes in the group.
    pub count: usize,
    /// First few node names, in snapshot order.
    pub examples: Vec<String>,
}

/// Snapshot nodes grouped by signature identifier.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SignatureIndex {
    groups: BTreeMap<SignatureId, SignatureGroup>,
}

impl SignatureIndex {
    /// Group `nodes` by signature, keeping up to `max_examples` names per
    /// group.
    #[must_use]
    pub fn build(nodes: &[NodeRecord], max_examples: usize) -> Self {
        let mut groups: BTreeMap<SignatureId, SignatureGroup> = BTreeMap::new();

        for node in nodes {
            let signature = node.signature();
            let id = signature.id();
            let group = groups.entry(id.clone()).or_insert_with(|| SignatureGroup {
                id,
                signature,
                count: 0,
                examples: Vec::new(),
            });
            group.count = group.count.saturating_add(1);
            if group.examples.len() < max_examples {
                group.examples.push(node.fq_name.clone());
            }
        }

        Self { groups }
    }

    /// Number of distinct signatures.
    #[must_use]
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// True if the index holds no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// One group by id.
    #[must_use]
    pub fn get(&self, id: &SignatureId) -> Option<&SignatureGroup> {
        self.groups.get(id)
    }

    /// Node count of a signature (0 when absent).
    #[must_use]
    pub fn count(&self, id: &SignatureId) -> usize {
        self.groups.get(id).map_or(0, |g| g.count)
    }

    /// Signature ids in ascending order.
    pub fn ids(&self) -> impl Iterator<Item = &SignatureId> {
        self.groups.keys()
    }

    /// Groups in ascending id order.
    pub fn groups(&self) -> impl Iterator<Item = &SignatureGroup> {
        self.groups.values()
    }

    /// Groups sorted by size (largest first), ties by id.
    #[must_use]
    pub fn groups_by_size(&self) -> Vec<&SignatureGroup> {
        let mut sorted: Vec<&SignatureGroup> = self.groups.values().collect();
        sorted.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.id.cmp(&b.id)));
        sorted
    }

    /// Token set of every group's signature.
    #[must_use]
    pub fn token_sets(&self, include_types: bool) -> BTreeMap<SignatureId, BTreeSet<String>> {
        self.groups
            .iter()
            .map(|(id, group)| (id.clone(), group.signature.token_set(include_types)))
            .collect()
    }
}

// =============================================================================
// TOPIC INDEX
// =============================================================================

/// Nodes publishing and subscribing one topic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TopicEntry {
    /// Fully-qualified names of publishing nodes.
    pub publishers: Vec<String>,
    /// Fully-qualified names of subscribing nodes.
    pub subscribers: Vec<String>,
}

/// Topic → publishing/subscribing nodes, skipping `ignored` topics.
#[must_use]
pub fn topic_index(nodes: &[NodeRecord], ignored: &BTreeSet<String>) -> BTreeMap<String, TopicEntry> {
    let mut index: BTreeMap<String, TopicEntry> = BTreeMap::new();
    for node in nodes {
        for topic in node.interface.publishers.keys() {
            if ignored.contains(topic) {
                continue;
            }
            index
                .entry(topic.clone())
                .or_default()
                .publishers
                .push(node.fq_name.clone());
        }
        for topic in node.interface.subscribers.keys() {
            if ignored.contains(topic) {
                continue;
            }
            index
                .entry(topic.clone())
                .or_default()
                .subscribers
                .push(node.fq_name.clone());
        }
    }
    index
}

// =============================================================================
// TESTS
// =============================================================================
