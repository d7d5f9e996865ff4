//! # Near-Match Search
//!
//! Finds signatures that are similar but not identical across two snapshots.
//! Useful when node names differ but topology should match: for every
//! signature whose node count changed, the closest *different* signature of
//! the other snapshot is located by token-set Jaccard similarity.

use crate::diff::changed_ids;
use crate::hasher::SignatureId;
use crate::index::SignatureIndex;
use crate::similarity::jaccard;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Token sets keyed by signature id.
pub type TokenSets = BTreeMap<SignatureId, BTreeSet<String>>;

/// A signature paired with its closest different counterpart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NearMatch {
    /// Jaccard similarity of the two token sets.
    pub similarity: f64,
    /// Signature on the searching side.
    pub source: SignatureId,
    /// Closest signature on the other side.
    pub target: SignatureId,
    /// Tokens of `source` missing from `target`, sorted.
    pub removed: Vec<String>,
    /// Tokens of `target` missing from `source`, sorted.
    pub added: Vec<String>,
}

/// Closest target to `source_items`, skipping `source_id` itself.
///
/// Ties keep the lowest target id.
#[must_use]
pub fn best_match(
    source_id: &SignatureId,
    source_items: &BTreeSet<String>,
    targets: &TokenSets,
) -> Option<(SignatureId, f64)> {
    let mut best: Option<(&SignatureId, f64)> = None;
    for (target_id, target_items) in targets {
        if target_id == source_id {
            continue;
        }
        let score = jaccard(source_items, target_items);
        if best.is_none_or(|(_, best_score)| score > best_score) {
            best = Some((target_id, score));
        }
    }
    best.map(|(id, score)| (id.clone(), score))
}

fn sorted_difference(a: &BTreeSet<String>, b: &BTreeSet<String>) -> Vec<String> {
    a.difference(b).cloned().collect()
}

/// Near matches from `sources` into `targets` for the given ids.
///
/// Pairs below `min_similarity` are dropped; the rest are sorted by
/// similarity (highest first), then source id, then target id.
#[must_use]
pub fn near_matches(
    ids: &[SignatureId],
    sources: &TokenSets,
    targets: &TokenSets,
    min_similarity: f64,
) -> Vec<NearMatch> {
    let mut pairs: Vec<NearMatch> = ids
        .iter()
        .filter_map(|id| {
            let items = sources.get(id)?;
            let (target, similarity) = best_match(id, items, targets)?;
            if similarity < min_similarity {
                return None;
            }
            let target_items = targets.get(&target)?;
            Some(NearMatch {
                similarity,
                removed: sorted_difference(items, target_items),
                added: sorted_difference(target_items, items),
                source: id.clone(),
                target,
            })
        })
        .collect();

    pairs.sort_by(|a, b| {
        b.similarity
            .total_cmp(&a.similarity)
            .then_with(|| a.source.cmp(&b.source))
            .then_with(|| a.target.cmp(&b.target))
    });
    pairs
}

// =============================================================================
// SIMILARITY REPORT
// =============================================================================

/// Near matches in both directions between two snapshots.
#[derive(Debug, Clone, Serialize)]
pub struct SimilarityReport {
    pub old_index: SignatureIndex,
    pub new_index: SignatureIndex,
    pub include_types: bool,
    pub min_similarity: f64,
    /// Number of signatures whose node count changed.
    pub changed: usize,
    /// Old signatures that most closely match a different new signature.
    pub old_to_new: Vec<NearMatch>,
    /// New signatures that most closely match a different old signature.
    pub new_to_old: Vec<NearMatch>,
}

impl SimilarityReport {
    /// Search near matches between two indexes.
    #[must_use]
    pub fn compute(
        old_index: SignatureIndex,
        new_index: SignatureIndex,
        include_types: bool,
        min_similarity: f64,
    ) -> Self {
        let old_sets = old_index.token_sets(include_types);
        let new_sets = new_index.token_sets(include_types);
        let changed = changed_ids(&old_index, &new_index);

        let old_to_new = near_matches(&changed, &old_sets, &new_sets, min_similarity);
        let new_to_old = near_matches(&changed, &new_sets, &old_sets, min_similarity);

        Self {
            old_index,
            new_index,
            include_types,
            min_similarity,
            changed: changed.len(),
            old_to_new,
            new_to_old,
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    #![allow(clippy::float_arithmetic, clippy::float_cmp, clippy::unwrap_used)]

    use super::*;
    use crate::snapshot::NodeRecord;
    use crate::types::NodeDescription;

    fn planner(extra_sub: Option<&str>) -> NodeDescription {
        let mut node = NodeDescription::new()
            .with_publisher("/path", ["nav_msgs/msg/Path"])
            .with_subscriber("/odom", ["nav_msgs/msg/Odometry"])
            .with_subscriber("/map", ["nav_msgs/msg/OccupancyGrid"]);
        if let Some(topic) = extra_sub {
            node = node.with_subscriber(topic, ["sensor_msgs/msg/PointCloud2"]);
        }
        node
    }

    fn index(nodes: Vec<NodeDescription>) -> SignatureIndex {
        let records: Vec<NodeRecord> = nodes
            .into_iter()
            .enumerate()
            .map(|(i, iface)| NodeRecord::new(format!("n{}", i), "/", iface))
            .collect();
        SignatureIndex::build(&records, 8)
    }

    #[test]
    fn finds_closest_changed_signature() {
        let old = index(vec![planner(None)]);
        let new = index(vec![planner(Some("/points"))]);

        let report = SimilarityReport::compute(old, new, false, 0.5);
        assert_eq!(report.changed, 2);
        assert_eq!(report.old_to_new.len(), 1);
        assert_eq!(report.new_to_old.len(), 1);

        let pair = &report.old_to_new[0];
        assert!((pair.similarity - 0.75).abs() < 1e-9);
        assert!(pair.removed.is_empty());
        assert_eq!(pair.added, vec!["S|/points"]);

        let back = &report.new_to_old[0];
        assert_eq!(back.removed, vec!["S|/points"]);
    }

    #[test]
    fn threshold_filters_pairs() {
        let old = index(vec![planner(None)]);
        let new = index(vec![planner(Some("/points"))]);
        let report = SimilarityReport::compute(old, new, false, 0.9);
        assert!(report.old_to_new.is_empty());
        assert!(report.new_to_old.is_empty());
    }

    #[test]
    fn unchanged_snapshots_have_no_pairs() {
        let old = index(vec![planner(None)]);
        let new = index(vec![planner(None)]);
        let report = SimilarityReport::compute(old, new, true, 0.0);
        assert_eq!(report.changed, 0);
        assert!(report.old_to_new.is_empty());
    }

    #[test]
    fn best_match_skips_self_and_prefers_lowest_id_on_tie() {
        let a: BTreeSet<String> = ["x".to_string()].into_iter().collect();
        let id_a = "aaaaaaaaaaaa".parse::<SignatureId>().unwrap();
        let id_b = "bbbbbbbbbbbb".parse::<SignatureId>().unwrap();
        let id_c = "cccccccccccc".parse::<SignatureId>().unwrap();

        let mut targets = TokenSets::new();
        targets.insert(id_a.clone(), a.clone());
        targets.insert(id_c.clone(), a.clone());
        targets.insert(id_b.clone(), a.clone());

        let (best, score) = best_match(&id_a, &a, &targets).unwrap();
        assert_eq!(best, id_b);
        assert_eq!(score, 1.0);
    }

    #[test]
    fn best_match_without_candidates() {
        let id = "aaaaaaaaaaaa".parse::<SignatureId>().unwrap();
        let mut targets = TokenSets::new();
        targets.insert(id.clone(), BTreeSet::new());
        assert!(best_match(&id, &BTreeSet::new(), &targets).is_none());
    }
}
