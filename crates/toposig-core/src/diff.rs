//! # Snapshot Diff
//!
//! Topology-first comparison of two snapshots that ignores node names:
//!
//! - **signature multiset**: signatures whose node count changed,
//! - **topic counts**: topics whose publisher/subscriber counts changed.

use crate::hasher::SignatureId;
use crate::index::{SignatureIndex, topic_index};
use crate::snapshot::NodeRecord;
use crate::types::ToposigError;
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeSet;

// =============================================================================
// SIGNATURE COUNT CHANGES
// =============================================================================

/// A signature whose node count differs between snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SignatureCountChange {
    pub id: SignatureId,
    pub old_count: usize,
    pub new_count: usize,
}

impl SignatureCountChange {
    /// Absolute count difference.
    #[must_use]
    pub fn magnitude(&self) -> usize {
        self.old_count.abs_diff(self.new_count)
    }
}

/// Ids present in either index whose counts differ, in ascending id order.
#[must_use]
pub fn changed_ids(old: &SignatureIndex, new: &SignatureIndex) -> Vec<SignatureId> {
    let all: BTreeSet<&SignatureId> = old.ids().chain(new.ids()).collect();
    all.into_iter()
        .filter(|id| old.count(id) != new.count(id))
        .cloned()
        .collect()
}

/// Signature count changes, largest change first, ties by id.
#[must_use]
pub fn signature_count_changes(old: &SignatureIndex, new: &SignatureIndex) -> Vec<SignatureCountChange> {
    let mut changes: Vec<SignatureCountChange> = changed_ids(old, new)
        .into_iter()
        .map(|id| SignatureCountChange {
            old_count: old.count(&id),
            new_count: new.count(&id),
            id,
        })
        .collect();
    changes.sort_by(|a, b| b.magnitude().cmp(&a.magnitude()).then_with(|| a.id.cmp(&b.id)));
    changes
}

// =============================================================================
// TOPIC COUNT CHANGES
// =============================================================================

/// A topic whose publisher or subscriber count differs between snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TopicCountChange {
    pub topic: String,
    pub old_publishers: usize,
    pub old_subscribers: usize,
    pub new_publishers: usize,
    pub new_subscribers: usize,
}

impl TopicCountChange {
    /// Sum of absolute publisher and subscriber count differences.
    #[must_use]
    pub fn magnitude(&self) -> usize {
        self.old_publishers
            .abs_diff(self.new_publishers)
            .saturating_add(self.old_subscribers.abs_diff(self.new_subscribers))
    }
}

/// Compile an optional topic filter.
pub fn compile_filter(pattern: Option<&str>) -> Result<Option<Regex>, ToposigError> {
    match pattern {
        None | Some("") => Ok(None),
        Some(p) => Regex::new(p)
            .map(Some)
            .map_err(|e| ToposigError::InvalidPattern(format!("{}: {}", p, e))),
    }
}

/// Topic count changes, largest change first, ties by topic.
///
/// With a filter, only topics it matches are compared.
#[must_use]
pub fn topic_count_changes(
    old: &[NodeRecord],
    new: &[NodeRecord],
    filter: Option<&Regex>,
) -> Vec<TopicCountChange> {
    let none = BTreeSet::new();
    let old_index = topic_index(old, &none);
    let new_index = topic_index(new, &none);

    let topics: BTreeSet<&String> = old_index.keys().chain(new_index.keys()).collect();
    let mut changes: Vec<TopicCountChange> = topics
        .into_iter()
        .filter(|topic| filter.is_none_or(|re| re.is_match(topic)))
        .filter_map(|topic| {
            let (old_publishers, old_subscribers) = old_index
                .get(topic)
                .map_or((0, 0), |e| (e.publishers.len(), e.subscribers.len()));
            let (new_publishers, new_subscribers) = new_index
                .get(topic)
                .map_or((0, 0), |e| (e.publishers.len(), e.subscribers.len()));

            if (old_publishers, old_subscribers) == (new_publishers, new_subscribers) {
                return None;
            }
            Some(TopicCountChange {
                topic: topic.clone(),
                old_publishers,
                old_subscribers,
                new_publishers,
                new_subscribers,
            })
        })
        .collect();

    changes.sort_by(|a, b| {
        b.magnitude()
            .cmp(&a.magnitude())
            .then_with(|| a.topic.cmp(&b.topic))
    });
    changes
}

// =============================================================================
// SNAPSHOT DIFF
// =============================================================================

/// Name-agnostic diff of two snapshots.
#[derive(Debug, Clone, Serialize)]
pub struct SnapshotDiff {
    pub old_index: SignatureIndex,
    pub new_index: SignatureIndex,
    pub signature_changes: Vec<SignatureCountChange>,
    pub topic_changes: Vec<TopicCountChange>,
}

impl SnapshotDiff {
    /// Compare two node lists, keeping `max_examples` names per signature.
    pub fn compute(
        old: &[NodeRecord],
        new: &[NodeRecord],
        topic_filter: Option<&str>,
        max_examples: usize,
    ) -> Result<Self, ToposigError> {
        let filter = compile_filter(topic_filter)?;
        let old_index = SignatureIndex::build(old, max_examples);
        let new_index = SignatureIndex::build(new, max_examples);
        let signature_changes = signature_count_changes(&old_index, &new_index);
        let topic_changes = topic_count_changes(old, new, filter.as_ref());

        Ok(Self {
            old_index,
            new_index,
            signature_changes,
            topic_changes,
        })
    }

    /// True if neither signatures nor topic counts changed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.signature_changes.is_empty() && self.topic_changes.is_empty()
    }
}

// =============================================================================
// TESTS
// =============================================================================
