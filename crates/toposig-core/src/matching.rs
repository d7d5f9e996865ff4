//! # Name-Agnostic Node Matching
//!
//! Pairs the nodes of two snapshots even when nodes or topics were renamed,
//! then reports endpoint and edge changes for the matched pairs.
//!
//! Matching runs in stages, each only over nodes still unmatched:
//!
//! 1. **Same name**: identical fully-qualified names pair immediately.
//! 2. **Exact signature**: a signature held by exactly one old and one new
//!    node pairs them.
//! 3. **Normalized signature**: as above, but endpoint names are reduced to
//!    their last path segment first, which absorbs namespace moves.
//! 4. **Similarity**: mutual best match by Jaccard similarity of
//!    direction-aware type tokens, above `min_similarity` and ahead of the
//!    runner-up by at least `min_margin`.

use crate::canonical::canonicalize;
use crate::signature::Signature;
use crate::similarity::jaccard;
use crate::snapshot::NodeRecord;
use crate::types::{EndpointKind, EndpointMap, NodeDescription};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

// =============================================================================
// NAME NORMALIZATION & TOKENS
// =============================================================================

/// Last path segment of a topic, service or node name.
///
/// `/perception/obstacle/points` → `points`; trailing slashes are ignored.
#[must_use]
pub fn basename(name: &str) -> &str {
    let trimmed = name.trim_end_matches('/');
    trimmed.rsplit('/').next().unwrap_or(trimmed)
}

/// Signature with endpoint names reduced to basenames and ignored topics
/// dropped.
///
/// Endpoints that collapse onto the same basename merge their type sets.
#[must_use]
pub fn normalized_signature(node: &NodeDescription, ignored: &BTreeSet<String>) -> Signature {
    let normalize = |map: &EndpointMap| {
        canonicalize(
            map.iter()
                .filter(|(name, _)| !ignored.contains(*name))
                .map(|(name, types)| (basename(name), types)),
        )
    };
    Signature::from_parts(
        normalize(&node.publishers),
        normalize(&node.subscribers),
        normalize(&node.services),
        normalize(&node.clients),
    )
}

/// Direction-aware message/service type tokens (`PT:`, `ST:`, `SVT:`,
/// `CLT:`). Endpoint names play no part.
#[must_use]
pub fn type_tokens(node: &NodeDescription) -> BTreeSet<String> {
    let prefixed = [
        ("PT", &node.publishers),
        ("ST", &node.subscribers),
        ("SVT", &node.services),
        ("CLT", &node.clients),
    ];

    let mut tokens = BTreeSet::new();
    for (prefix, map) in prefixed {
        for ty in map.values().flatten() {
            tokens.insert(format!("{}:{}", prefix, ty));
        }
    }
    tokens
}

/// Endpoint tokens over full names and basenames (`P:/a/b:T` and `P_B:b:T`).
///
/// Ignored topics are skipped for publishers and subscribers.
#[must_use]
pub fn endpoint_tokens(node: &NodeDescription, ignored: &BTreeSet<String>) -> BTreeSet<String> {
    let prefixed = [
        ("P", &node.publishers, true),
        ("S", &node.subscribers, true),
        ("SV", &node.services, false),
        ("CL", &node.clients, false),
    ];

    let mut tokens = BTreeSet::new();
    for (prefix, map, filter_ignored) in prefixed {
        for (name, types) in map {
            if filter_ignored && ignored.contains(name) {
                continue;
            }
            let base = basename(name);
            if types.is_empty() {
                tokens.insert(format!("{}:{}", prefix, name));
                tokens.insert(format!("{}_B:{}", prefix, base));
            }
            for ty in types {
                tokens.insert(format!("{}:{}:{}", prefix, name, ty));
                tokens.insert(format!("{}_B:{}:{}", prefix, base, ty));
            }
        }
    }
    tokens
}

// =============================================================================
// MATCHING
// =============================================================================

/// Matching thresholds and filters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchOptions {
    /// Topics excluded from normalization, tokens, diffs and edges.
    pub ignored_topics: BTreeSet<String>,
    /// Minimum similarity for the similarity stage.
    pub min_similarity: f64,
    /// Minimum lead of the best candidate over the runner-up.
    pub min_margin: f64,
}

impl Default for MatchOptions {
    fn default() -> Self {
        Self {
            ignored_topics: ["/parameter_events".to_string()].into_iter().collect(),
            min_similarity: 0.70,
            min_margin: 0.10,
        }
    }
}

/// Stage that produced a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStage {
    SameName,
    ExactSignature,
    NormalizedSignature,
    Similarity,
}

/// One matched pair with its supporting score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchEvidence {
    pub old: String,
    pub new: String,
    pub score: f64,
    pub stage: MatchStage,
}

impl MatchEvidence {
    /// True if the pair has different names.
    #[must_use]
    pub fn is_rename(&self) -> bool {
        self.old != self.new
    }
}

/// Result of matching two node lists.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NodeMatching {
    /// Old fully-qualified name → new fully-qualified name.
    pub mapping: BTreeMap<String, String>,
    /// Evidence per matched pair, in match order.
    pub evidence: Vec<MatchEvidence>,
    /// New names already taken, kept in step with `mapping`.
    #[serde(skip)]
    matched_new: BTreeSet<String>,
}

impl NodeMatching {
    /// True if `new` is already the target of some old node.
    #[must_use]
    pub fn is_new_matched(&self, new: &str) -> bool {
        self.matched_new.contains(new)
    }

    fn record(&mut self, old: &str, new: &str, score: f64, stage: MatchStage) {
        self.mapping.insert(old.to_string(), new.to_string());
        self.matched_new.insert(new.to_string());
        self.evidence.push(MatchEvidence {
            old: old.to_string(),
            new: new.to_string(),
            score,
            stage,
        });
    }

    /// Pair old/new nodes holding a key that exactly one node on each side
    /// holds.
    fn pair_unique_keys<K: Ord>(
        &mut self,
        old: &BTreeMap<K, Vec<&str>>,
        new: &BTreeMap<K, Vec<&str>>,
        stage: MatchStage,
        score: impl Fn(&str, &str) -> f64,
    ) {
        for (key, olds) in old {
            let Some(news) = new.get(key) else { continue };
            let ([old_fq], [new_fq]) = (olds.as_slice(), news.as_slice()) else {
                continue;
            };
            let (old_fq, new_fq) = (*old_fq, *new_fq);
            if self.mapping.contains_key(old_fq) || self.is_new_matched(new_fq) {
                continue;
            }
            let s = score(old_fq, new_fq);
            self.record(old_fq, new_fq, s, stage);
        }
    }
}

fn by_name(nodes: &[NodeRecord]) -> BTreeMap<&str, &NodeDescription> {
    nodes
        .iter()
        .map(|n| (n.fq_name.as_str(), &n.interface))
        .collect()
}

fn group_by<'a, K: Ord>(
    nodes: &BTreeMap<&'a str, &NodeDescription>,
    key: impl Fn(&NodeDescription) -> K,
) -> BTreeMap<K, Vec<&'a str>> {
    let mut groups: BTreeMap<K, Vec<&'a str>> = BTreeMap::new();
    for (fq, node) in nodes {
        groups.entry(key(node)).or_default().push(*fq);
    }
    groups
}

/// Best and runner-up scores of one old node against remaining new nodes.
struct Ranked<'a> {
    best: Option<&'a str>,
    best_score: f64,
    second_score: f64,
}

#[allow(clippy::float_arithmetic)]
fn rank<'a>(tokens: &BTreeSet<String>, candidates: &[(&'a str, BTreeSet<String>)]) -> Ranked<'a> {
    let mut ranked = Ranked {
        best: None,
        best_score: -1.0,
        second_score: -1.0,
    };
    for (fq, other) in candidates {
        let s = jaccard(tokens, other);
        if s > ranked.best_score {
            ranked.second_score = ranked.best_score;
            ranked.best_score = s;
            ranked.best = Some(*fq);
        } else if s > ranked.second_score {
            ranked.second_score = s;
        }
    }
    ranked
}

/// Match old nodes to new nodes by name, signature and interface similarity.
#[must_use]
#[allow(clippy::float_arithmetic)]
pub fn match_nodes(old: &[NodeRecord], new: &[NodeRecord], options: &MatchOptions) -> NodeMatching {
    let old_by_fq = by_name(old);
    let new_by_fq = by_name(new);
    let mut matching = NodeMatching::default();

    // Same fully-qualified name.
    for (fq, old_node) in &old_by_fq {
        if let Some(new_node) = new_by_fq.get(fq) {
            let s = jaccard(&type_tokens(old_node), &type_tokens(new_node));
            matching.record(fq, fq, s, MatchStage::SameName);
        }
    }

    // Unique exact signature.
    let exact = |n: &NodeDescription| Signature::from_node(n).id();
    matching.pair_unique_keys(
        &group_by(&old_by_fq, exact),
        &group_by(&new_by_fq, exact),
        MatchStage::ExactSignature,
        |_, _| 1.0,
    );

    // Unique normalized signature.
    let ignored = &options.ignored_topics;
    let normalized = |n: &NodeDescription| normalized_signature(n, ignored).id();
    matching.pair_unique_keys(
        &group_by(&old_by_fq, normalized),
        &group_by(&new_by_fq, normalized),
        MatchStage::NormalizedSignature,
        |o, n| match (old_by_fq.get(o), new_by_fq.get(n)) {
            (Some(a), Some(b)) => jaccard(&endpoint_tokens(a, ignored), &endpoint_tokens(b, ignored)),
            _ => 0.0,
        },
    );

    // Mutual best match over type tokens.
    let remaining_old: Vec<(&str, BTreeSet<String>)> = old_by_fq
        .iter()
        .filter(|(fq, _)| !matching.mapping.contains_key(**fq))
        .map(|(fq, node)| (*fq, type_tokens(node)))
        .collect();
    let remaining_new: Vec<(&str, BTreeSet<String>)> = new_by_fq
        .iter()
        .filter(|(fq, _)| !matching.is_new_matched(fq))
        .map(|(fq, node)| (*fq, type_tokens(node)))
        .collect();

    let new_best: BTreeMap<&str, Option<&str>> = remaining_new
        .iter()
        .map(|(fq, tokens)| (*fq, rank(tokens, &remaining_old).best))
        .collect();

    let mut candidates: Vec<(f64, &str, &str)> = Vec::new();
    for (old_fq, tokens) in &remaining_old {
        let ranked = rank(tokens, &remaining_new);
        let Some(new_fq) = ranked.best else { continue };
        if ranked.best_score < options.min_similarity {
            continue;
        }
        let second = ranked.second_score.max(0.0);
        if ranked.best_score - second < options.min_margin {
            continue;
        }
        if new_best.get(new_fq).copied().flatten() != Some(*old_fq) {
            continue;
        }
        candidates.push((ranked.best_score, *old_fq, new_fq));
    }

    candidates.sort_by(|a, b| b.0.total_cmp(&a.0));
    for (score, old_fq, new_fq) in candidates {
        if matching.mapping.contains_key(old_fq) || matching.is_new_matched(new_fq) {
            continue;
        }
        matching.record(old_fq, new_fq, score, MatchStage::Similarity);
    }

    matching
}

// =============================================================================
// ENDPOINT & EDGE DIFFS
// =============================================================================

/// Endpoint differences of one category between two matched nodes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EndpointDiff {
    /// Full names only present before (no equivalent basename+types after).
    pub removed: BTreeSet<String>,
    /// Full names only present after.
    pub added: BTreeSet<String>,
    /// Basenames present on both sides with different type sets.
    pub type_changed: BTreeSet<String>,
}

impl EndpointDiff {
    /// True if nothing changed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.removed.is_empty() && self.added.is_empty() && self.type_changed.is_empty()
    }
}

type NormalizedKey<'a> = (&'a str, BTreeSet<&'a str>);
type NormalizedEndpoints<'a> = BTreeMap<NormalizedKey<'a>, BTreeSet<&'a str>>;

fn normalize_endpoints<'a>(map: &'a EndpointMap, ignored: &BTreeSet<String>) -> NormalizedEndpoints<'a> {
    let mut out = NormalizedEndpoints::new();
    for (name, types) in map {
        if ignored.contains(name) {
            continue;
        }
        let key = (basename(name), types.iter().map(String::as_str).collect());
        out.entry(key).or_default().insert(name.as_str());
    }
    out
}

/// Full names under keys of `from` that `other` lacks.
fn names_missing_from(from: &NormalizedEndpoints<'_>, other: &NormalizedEndpoints<'_>) -> BTreeSet<String> {
    from.iter()
        .filter(|(key, _)| !other.contains_key(*key))
        .flat_map(|(_, names)| names.iter().map(|n| (*n).to_string()))
        .collect()
}

fn type_sets_by_base<'a>(endpoints: &'a NormalizedEndpoints<'a>) -> BTreeMap<&'a str, BTreeSet<&'a BTreeSet<&'a str>>> {
    let mut out: BTreeMap<&'a str, BTreeSet<&'a BTreeSet<&'a str>>> = BTreeMap::new();
    for (base, types) in endpoints.keys() {
        out.entry(*base).or_default().insert(types);
    }
    out
}

/// Compare two endpoint maps by basename + type set, so pure namespace moves
/// do not show up as changes.
#[must_use]
pub fn diff_endpoints(before: &EndpointMap, after: &EndpointMap, ignored: &BTreeSet<String>) -> EndpointDiff {
    let a = normalize_endpoints(before, ignored);
    let b = normalize_endpoints(after, ignored);

    let b_bases = type_sets_by_base(&b);
    let type_changed = type_sets_by_base(&a)
        .into_iter()
        .filter(|(base, types)| b_bases.get(base).is_some_and(|other| other != types))
        .map(|(base, _)| base.to_string())
        .collect();

    EndpointDiff {
        removed: names_missing_from(&a, &b),
        added: names_missing_from(&b, &a),
        type_changed,
    }
}

/// A publisher → subscriber connection over one topic.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Edge {
    pub publisher: String,
    pub subscriber: String,
    pub topic: String,
}

/// All publisher → subscriber edges of a node list.
#[must_use]
pub fn edge_set(nodes: &[NodeRecord], ignored: &BTreeSet<String>) -> BTreeSet<Edge> {
    let mut publishers: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
    let mut subscribers: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
    for node in nodes {
        for topic in node.interface.publishers.keys().filter(|t| !ignored.contains(*t)) {
            publishers.entry(topic.as_str()).or_default().insert(node.fq_name.as_str());
        }
        for topic in node.interface.subscribers.keys().filter(|t| !ignored.contains(*t)) {
            subscribers.entry(topic.as_str()).or_default().insert(node.fq_name.as_str());
        }
    }

    let mut edges = BTreeSet::new();
    for (topic, pubs) in &publishers {
        let Some(subs) = subscribers.get(topic) else { continue };
        for publisher in pubs {
            for subscriber in subs {
                edges.insert(Edge {
                    publisher: (*publisher).to_string(),
                    subscriber: (*subscriber).to_string(),
                    topic: (*topic).to_string(),
                });
            }
        }
    }
    edges
}

/// Rename edge endpoints through `mapping`; unmapped names pass through.
#[must_use]
pub fn remap_edges(edges: &BTreeSet<Edge>, mapping: &BTreeMap<String, String>) -> BTreeSet<Edge> {
    let rename = |fq: &String| mapping.get(fq).unwrap_or(fq).clone();
    edges
        .iter()
        .map(|e| Edge {
            publisher: rename(&e.publisher),
            subscriber: rename(&e.subscriber),
            topic: e.topic.clone(),
        })
        .collect()
}

// =============================================================================
// TOPOLOGY DIFF
// =============================================================================

/// A matched pair whose endpoints differ.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeChange {
    pub old: String,
    pub new: String,
    /// Non-empty diffs per category.
    pub diffs: BTreeMap<EndpointKind, EndpointDiff>,
}

/// Name-agnostic node-level and edge-level diff of two node lists.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopologyDiff {
    pub matching: NodeMatching,
    /// New nodes without an old counterpart.
    pub added_nodes: Vec<String>,
    /// Old nodes without a new counterpart.
    pub removed_nodes: Vec<String>,
    /// Matched pairs with endpoint changes, by old name.
    pub changed_nodes: Vec<NodeChange>,
    pub added_edges: Vec<Edge>,
    pub removed_edges: Vec<Edge>,
}

impl TopologyDiff {
    /// Match and diff two node lists.
    #[must_use]
    pub fn compute(old: &[NodeRecord], new: &[NodeRecord], options: &MatchOptions) -> Self {
        let matching = match_nodes(old, new, options);
        let ignored = &options.ignored_topics;
        let old_by_fq = by_name(old);
        let new_by_fq = by_name(new);

        let removed_nodes = old_by_fq
            .keys()
            .filter(|fq| !matching.mapping.contains_key(**fq))
            .map(|fq| (*fq).to_string())
            .collect();
        let added_nodes = new_by_fq
            .keys()
            .filter(|fq| !matching.is_new_matched(fq))
            .map(|fq| (*fq).to_string())
            .collect();

        let mut changed_nodes = Vec::new();
        for (old_fq, new_fq) in &matching.mapping {
            let (Some(before), Some(after)) =
                (old_by_fq.get(old_fq.as_str()), new_by_fq.get(new_fq.as_str()))
            else {
                continue;
            };
            let diffs: BTreeMap<EndpointKind, EndpointDiff> = EndpointKind::ALL
                .iter()
                .map(|kind| (*kind, diff_endpoints(before.endpoints(*kind), after.endpoints(*kind), ignored)))
                .filter(|(_, diff)| !diff.is_empty())
                .collect();
            if !diffs.is_empty() {
                changed_nodes.push(NodeChange {
                    old: old_fq.clone(),
                    new: new_fq.clone(),
                    diffs,
                });
            }
        }

        let old_edges = remap_edges(&edge_set(old, ignored), &matching.mapping);
        let new_edges = edge_set(new, ignored);
        let removed_edges = old_edges.difference(&new_edges).cloned().collect();
        let added_edges = new_edges.difference(&old_edges).cloned().collect();

        Self {
            matching,
            added_nodes,
            removed_nodes,
            changed_nodes,
            added_edges,
            removed_edges,
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
