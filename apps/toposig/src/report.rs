//! # Markdown Reports
//!
//! Pure renderers from analysis results to Markdown text. Nothing here reads
//! files or logs; the command layer loads snapshots and decides where the
//! text goes.

use crate::config::ReportConfig;
use std::fmt::Display;
use toposig_core::{
    CanonicalEndpoints, EndpointKind, GraphSnapshot, NearMatch, NodeRecord, Signature,
    SignatureGroup, SignatureId, SignatureIndex, SimilarityReport, SnapshotDiff, TopologyDiff,
    UNKNOWN_TYPE, topic_index,
};

/// Topics listed per direction for one signature in a diff.
const DIFF_TOPICS_PER_SIGNATURE: usize = 20;

/// Matched pairs listed in the matching summary.
const MAX_MATCH_SUMMARY: usize = 50;

/// Added or removed node names listed.
const MAX_NODE_LIST: usize = 100;

/// Changed nodes and edges listed per section.
const MAX_CHANGE_LIST: usize = 80;

// =============================================================================
// INPUT
// =============================================================================

/// A parsed snapshot and the path it was read from.
#[derive(Debug, Clone)]
pub struct LoadedSnapshot {
    pub source: String,
    pub snapshot: GraphSnapshot,
}

impl LoadedSnapshot {
    #[must_use]
    pub fn nodes(&self) -> &[NodeRecord] {
        &self.snapshot.nodes
    }
}

// =============================================================================
// DOCUMENT BUILDER
// =============================================================================

#[derive(Default)]
struct Doc {
    lines: Vec<String>,
}

impl Doc {
    fn line(&mut self, text: impl Into<String>) {
        self.lines.push(text.into());
    }

    fn heading(&mut self, text: impl Display) {
        self.lines.push(format!("{}\n", text));
    }

    fn blank(&mut self) {
        self.lines.push(String::new());
    }

    fn truncated(&mut self, shown: usize, total: usize, what: &str) {
        if total > shown {
            self.line(format!("(Truncated: showing {}/{} {})", shown, total, what));
            self.blank();
        }
    }

    fn filters(&mut self, config: &ReportConfig) {
        for substring in &config.ignored_node_substrings {
            self.line(format!("- Filter: ignored nodes containing '{}'", substring));
        }
        for topic in &config.ignored_topics {
            self.line(format!("- Filter: ignored topic '{}'", topic));
        }
    }

    fn endpoints(&mut self, title: &str, endpoints: &CanonicalEndpoints, limit: usize) {
        if endpoints.is_empty() {
            return;
        }
        self.line(format!("- {}:", title));
        for ep in endpoints.iter().take(limit) {
            let types = if ep.is_untyped() {
                UNKNOWN_TYPE.to_string()
            } else {
                ep.types().join(", ")
            };
            self.line(format!("  - {} :: {}", ep.name(), types));
        }
    }

    fn category_counts(&mut self, sig: &Signature) {
        let counts: Vec<String> = EndpointKind::ALL
            .iter()
            .map(|kind| format!("{}: {}", kind.canonical_key(), sig.endpoints(*kind).len()))
            .collect();
        self.line(format!("- {}", counts.join("  ")));
    }

    fn finish(self) -> String {
        let mut text = self.lines.join("\n");
        text.push('\n');
        text
    }
}

fn join_limited(items: &[String], limit: usize) -> String {
    let shown: Vec<&str> = items.iter().take(limit).map(String::as_str).collect();
    if items.len() > limit {
        format!("{}, ... (+{})", shown.join(", "), items.len() - limit)
    } else {
        shown.join(", ")
    }
}

// =============================================================================
// IDS
// =============================================================================

/// One block per node: identifier, name, then its typed tokens.
#[must_use]
pub fn render_ids<'a>(nodes: impl IntoIterator<Item = &'a NodeRecord>) -> String {
    let mut doc = Doc::default();
    for node in nodes {
        let sig = node.signature();
        doc.line(format!("{}  {}", sig.id(), node.fq_name));
        for token in sig.tokens(true) {
            doc.line(format!("  {}", token));
        }
    }
    doc.finish()
}

// =============================================================================
// SIGNATURE REPORT
// =============================================================================

/// Signature groups and topic index of one snapshot.
#[must_use]
pub fn render_signature_report(input: &LoadedSnapshot, config: &ReportConfig) -> String {
    let index = SignatureIndex::build(input.nodes(), config.examples_per_group());
    let groups = index.groups_by_size();
    let shown = config.group_limit().min(groups.len());

    let mut doc = Doc::default();
    doc.heading("# Topology Report");
    doc.line(format!("- Source: {}", input.source));
    doc.line(format!("- Timestamp: {}", input.snapshot.timestamp_or_empty()));
    doc.line(format!("- Nodes (processed): {}", input.snapshot.node_count()));
    doc.filters(config);
    doc.line(format!("- Signature groups: {}", groups.len()));
    let duplicates = &input.snapshot.duplicates;
    doc.line(format!("- Duplicate node names: {}", duplicates.len()));
    if !duplicates.is_empty() {
        doc.line("  - Examples:");
        for name in duplicates.iter().take(config.max_nodes_per_group) {
            doc.line(format!("    - {}", name));
        }
    }
    doc.blank();

    doc.heading("## Signature Groups (name-agnostic)");
    for group in groups.iter().take(shown) {
        render_group(&mut doc, group, config);
    }
    doc.truncated(shown, groups.len(), "signature groups");

    doc.heading("## Topic Index (publishers/subscribers counts)");
    let topics = topic_index(input.nodes(), &config.ignored_topic_set());
    for (topic, entry) in topics.iter().take(config.max_topics) {
        doc.line(format!(
            "- {}: pubs={} subs={}",
            topic,
            entry.publishers.len(),
            entry.subscribers.len()
        ));
    }
    if topics.len() > config.max_topics {
        doc.blank();
        doc.truncated(config.max_topics, topics.len(), "topics");
    }
    doc.finish()
}

fn render_group(doc: &mut Doc, group: &SignatureGroup, config: &ReportConfig) {
    doc.line(format!("### {} (count={})", group.id, group.count));
    if !group.examples.is_empty() {
        doc.line(format!("- example nodes: {}", group.examples.join(", ")));
    }
    doc.category_counts(&group.signature);
    doc.endpoints("publish topics", group.signature.publishers(), config.max_topics_per_group);
    doc.endpoints("subscribe topics", group.signature.subscribers(), config.max_topics_per_group);
    doc.blank();
}

// =============================================================================
// COUNT DIFF
// =============================================================================

/// Signature and topic count differences between two snapshots.
#[must_use]
pub fn render_diff(
    old: &LoadedSnapshot,
    new: &LoadedSnapshot,
    diff: &SnapshotDiff,
    config: &ReportConfig,
) -> String {
    let mut doc = Doc::default();
    doc.heading("# Topology Diff");
    doc.line(format!("- Old: {}", old.source));
    doc.line(format!("- New: {}", new.source));
    doc.line(format!("- Old timestamp: {}", old.snapshot.timestamp_or_empty()));
    doc.line(format!("- New timestamp: {}", new.snapshot.timestamp_or_empty()));
    doc.line(format!("- Old nodes: {}", old.snapshot.node_count()));
    doc.line(format!("- New nodes: {}", new.snapshot.node_count()));
    doc.line(format!("- Signature diffs: {}", diff.signature_changes.len()));
    doc.line(format!("- Topic pub/sub diffs: {}", diff.topic_changes.len()));
    doc.blank();

    doc.heading("## Signature (node-level) differences");
    if diff.signature_changes.is_empty() {
        doc.line("No signature count differences detected.");
    }
    for change in diff.signature_changes.iter().take(config.max_sig_changes) {
        doc.line(format!("### {}: {} -> {}", change.id, change.old_count, change.new_count));
        let old_group = diff.old_index.get(&change.id);
        let new_group = diff.new_index.get(&change.id);
        if let Some(group) = old_group {
            doc.line(format!("- old examples: {}", join_limited(&group.examples, config.max_diff_examples)));
        }
        if let Some(group) = new_group {
            doc.line(format!("- new examples: {}", join_limited(&group.examples, config.max_diff_examples)));
        }
        if let Some(group) = new_group.or(old_group) {
            doc.category_counts(&group.signature);
            doc.endpoints("publish topics", group.signature.publishers(), DIFF_TOPICS_PER_SIGNATURE);
            doc.endpoints("subscribe topics", group.signature.subscribers(), DIFF_TOPICS_PER_SIGNATURE);
        }
        doc.blank();
    }
    doc.truncated(
        config.max_sig_changes.min(diff.signature_changes.len()),
        diff.signature_changes.len(),
        "signature diffs",
    );

    doc.heading("## Topic pub/sub count differences");
    if diff.topic_changes.is_empty() {
        doc.line("No topic pub/sub count differences detected.");
    }
    for change in diff.topic_changes.iter().take(config.max_topics) {
        doc.line(format!(
            "- {}: pubs {}->{}, subs {}->{}",
            change.topic,
            change.old_publishers,
            change.new_publishers,
            change.old_subscribers,
            change.new_subscribers
        ));
    }
    if diff.topic_changes.len() > config.max_topics {
        doc.blank();
        doc.truncated(config.max_topics, diff.topic_changes.len(), "topic diffs");
    }
    doc.finish()
}

// =============================================================================
// NEAR MATCHES
// =============================================================================

/// Near-match pairs in both directions.
#[must_use]
pub fn render_similarity(
    old: &LoadedSnapshot,
    new: &LoadedSnapshot,
    report: &SimilarityReport,
    config: &ReportConfig,
) -> String {
    let mut doc = Doc::default();
    doc.heading("# Topology Similarity Report");
    doc.line(format!("- Old: {}", old.source));
    doc.line(format!("- New: {}", new.source));
    doc.line(format!("- Old timestamp: {}", old.snapshot.timestamp_or_empty()));
    doc.line(format!("- New timestamp: {}", new.snapshot.timestamp_or_empty()));
    doc.line(format!("- include_types: {}", report.include_types));
    doc.line(format!("- min_similarity: {}", report.min_similarity));
    doc.line(format!("- signatures changed: {}", report.changed));
    doc.blank();

    let sides = [
        (
            "## Old signatures that most closely match a different new signature",
            &report.old_to_new,
            (("old", &report.old_index), ("new", &report.new_index)),
        ),
        (
            "## New signatures that most closely match a different old signature",
            &report.new_to_old,
            (("new", &report.new_index), ("old", &report.old_index)),
        ),
    ];
    for (title, pairs, (source, target)) in sides {
        doc.heading(title);
        if pairs.is_empty() {
            doc.line("No near-matches found above threshold.");
            doc.blank();
            continue;
        }
        for pair in pairs.iter().take(config.max_pairs) {
            render_pair(&mut doc, pair, source, target, config);
        }
        doc.truncated(config.max_pairs, pairs.len(), "pairs");
    }
    doc.finish()
}

fn render_pair(
    doc: &mut Doc,
    pair: &NearMatch,
    (source_label, source_index): (&str, &SignatureIndex),
    (target_label, target_index): (&str, &SignatureIndex),
    config: &ReportConfig,
) {
    let examples = |index: &SignatureIndex, id: &SignatureId| {
        index
            .get(id)
            .map(|g| join_limited(&g.examples, config.max_similar_examples))
            .unwrap_or_default()
    };

    doc.line(format!(
        "### sim={:.3}  {}:{} (count={})  ~  {}:{} (count={})",
        pair.similarity,
        source_label,
        pair.source,
        source_index.count(&pair.source),
        target_label,
        pair.target,
        target_index.count(&pair.target)
    ));
    doc.line(format!("- {} examples: {}", source_label, examples(source_index, &pair.source)));
    doc.line(format!("- {} examples: {}", target_label, examples(target_index, &pair.target)));
    if !pair.removed.is_empty() {
        doc.line(format!(
            "- removed from {} -> {} (up to {}):",
            source_label, target_label, config.max_diff_items
        ));
        for token in pair.removed.iter().take(config.max_diff_items) {
            doc.line(format!("  - {}", token));
        }
    }
    if !pair.added.is_empty() {
        doc.line(format!(
            "- added in {} vs {} (up to {}):",
            target_label, source_label, config.max_diff_items
        ));
        for token in pair.added.iter().take(config.max_diff_items) {
            doc.line(format!("  - {}", token));
        }
    }
    doc.blank();
}

// =============================================================================
// NODE MATCHING
// =============================================================================

/// Name-agnostic node-level and edge-level diff.
#[must_use]
pub fn render_topology_diff(
    old: &LoadedSnapshot,
    new: &LoadedSnapshot,
    diff: &TopologyDiff,
    config: &ReportConfig,
) -> String {
    let mut doc = Doc::default();
    doc.heading("# Topology Diff (name-agnostic)");
    doc.line(format!("- Old: {}", old.source));
    doc.line(format!("- New: {}", new.source));
    doc.line(format!("- Old timestamp: {}", old.snapshot.timestamp_or_empty()));
    doc.line(format!("- New timestamp: {}", new.snapshot.timestamp_or_empty()));
    doc.line(format!("- Old nodes: {}", old.snapshot.node_count()));
    doc.line(format!("- New nodes: {}", new.snapshot.node_count()));
    doc.filters(config);
    doc.line(format!("- Matched node pairs: {}", diff.matching.mapping.len()));
    doc.line(format!("- Added nodes (unmatched): {}", diff.added_nodes.len()));
    doc.line(format!("- Removed nodes (unmatched): {}", diff.removed_nodes.len()));
    doc.blank();

    doc.heading("## Matching summary");
    let mut evidence: Vec<_> = diff.matching.evidence.iter().collect();
    evidence.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| a.old.cmp(&b.old))
            .then_with(|| a.new.cmp(&b.new))
    });
    for e in evidence.iter().take(MAX_MATCH_SUMMARY) {
        let suffix = if e.is_rename() { ", renamed" } else { "" };
        doc.line(format!("- {} -> {} (sim={:.2}{})", e.old, e.new, e.score, suffix));
    }
    more(&mut doc, evidence.len(), MAX_MATCH_SUMMARY, "matched pairs");
    doc.blank();

    for (title, names) in [
        ("## Added nodes (unmatched)", &diff.added_nodes),
        ("## Removed nodes (unmatched)", &diff.removed_nodes),
    ] {
        if names.is_empty() {
            continue;
        }
        doc.heading(title);
        for name in names.iter().take(MAX_NODE_LIST) {
            doc.line(format!("- {}", name));
        }
        more(&mut doc, names.len(), MAX_NODE_LIST, "");
        doc.blank();
    }

    if !diff.changed_nodes.is_empty() {
        doc.heading("## Changed nodes (matched but endpoints differ)");
        for change in diff.changed_nodes.iter().take(MAX_CHANGE_LIST) {
            doc.line(format!("### {} -> {}", change.old, change.new));
            for (kind, endpoint_diff) in &change.diffs {
                doc.line(format!("- {}:", kind));
                for name in &endpoint_diff.removed {
                    doc.line(format!("  - removed: {}", name));
                }
                for name in &endpoint_diff.added {
                    doc.line(format!("  - added: {}", name));
                }
                for name in &endpoint_diff.type_changed {
                    doc.line(format!("  - type-changed: {}", name));
                }
            }
            doc.blank();
        }
        more(&mut doc, diff.changed_nodes.len(), MAX_CHANGE_LIST, "changed matched nodes");
        doc.blank();
    }

    doc.heading("## Edge-level changes (pub -> sub on topic)");
    doc.line(format!("- Added edges: {}", diff.added_edges.len()));
    doc.line(format!("- Removed edges: {}", diff.removed_edges.len()));
    doc.blank();
    for (sign, edges, what) in [
        ("+", &diff.added_edges, "added edges"),
        ("-", &diff.removed_edges, "removed edges"),
    ] {
        for edge in edges.iter().take(MAX_CHANGE_LIST) {
            doc.line(format!("- {} {} -> {} : {}", sign, edge.publisher, edge.subscriber, edge.topic));
        }
        more(&mut doc, edges.len(), MAX_CHANGE_LIST, what);
        doc.blank();
    }
    doc.finish()
}

fn more(doc: &mut Doc, total: usize, shown: usize, what: &str) {
    if total > shown {
        let what = if what.is_empty() { "more".to_string() } else { format!("more {}", what) };
        doc.line(format!("- ... {} {}", total - shown, what));
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use toposig_core::NodeDescription;

    fn loaded(source: &str, nodes: Vec<NodeRecord>) -> LoadedSnapshot {
        LoadedSnapshot {
            source: source.to_string(),
            snapshot: GraphSnapshot::from_nodes(nodes),
        }
    }

    #[test]
    fn ids_list_tokens_under_each_node() {
        let node = NodeRecord::new(
            "odom_pub",
            "/",
            NodeDescription::new().with_publisher("odom", ["nav_msgs/Odometry"]),
        );
        let text = render_ids([&node]);
        assert_eq!(text, "5fa635efc3cc  /odom_pub\n  P|odom|nav_msgs/Odometry\n");
    }

    #[test]
    fn untyped_endpoints_render_as_unknown() {
        let input = loaded(
            "snap.json",
            vec![NodeRecord::new("n", "/", NodeDescription::new().with_publisher("/tf", Vec::<String>::new()))],
        );
        let text = render_signature_report(&input, &ReportConfig::default());
        assert!(text.contains("  - /tf :: <unknown>"));
        assert!(text.contains("- pubs: 1  subs: 0  srvs: 0  clis: 0"));
    }

    #[test]
    fn join_limited_marks_overflow() {
        let items: Vec<String> = ["a", "b", "c"].iter().map(|s| (*s).to_string()).collect();
        assert_eq!(join_limited(&items, 5), "a, b, c");
        assert_eq!(join_limited(&items, 2), "a, b, ... (+1)");
    }
}
