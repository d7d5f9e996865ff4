//! # CLI Command Implementations
//!
//! This module contains the actual implementations of CLI commands.

use crate::config::ReportConfig;
use crate::report::{
    LoadedSnapshot, render_diff, render_ids, render_signature_report, render_similarity,
    render_topology_diff,
};
use serde::Serialize;
use std::path::{Path, PathBuf};
use toposig_core::{
    GraphSnapshot, NodeRecord, SignatureIndex, SimilarityReport, SnapshotDiff, ToposigError,
    TopologyDiff, topic_index,
};

// =============================================================================
// FILE HANDLING
// =============================================================================

/// Maximum snapshot file size (256 MB).
const MAX_SNAPSHOT_FILE_SIZE: u64 = 256 * 1024 * 1024;

/// Validate file size before reading.
fn validate_file_size(path: &Path, max_size: u64) -> Result<(), ToposigError> {
    let metadata = std::fs::metadata(path)
        .map_err(|e| ToposigError::IoError(format!("Cannot read file metadata: {}", e)))?;

    if metadata.len() > max_size {
        return Err(ToposigError::InvalidSnapshot(format!(
            "File size {} bytes exceeds maximum allowed {} bytes",
            metadata.len(),
            max_size
        )));
    }
    Ok(())
}

/// Resolve an input path and make sure it is a regular file.
fn validate_file_path(path: &Path) -> Result<PathBuf, ToposigError> {
    let canonical = path.canonicalize().map_err(|e| {
        ToposigError::IoError(format!("Invalid file path '{}': {}", path.display(), e))
    })?;

    if !canonical.is_file() {
        return Err(ToposigError::IoError(format!(
            "Path '{}' is not a regular file",
            path.display()
        )));
    }

    Ok(canonical)
}

/// Resolve an output path whose parent directory must exist.
fn validate_output_path(path: &Path) -> Result<PathBuf, ToposigError> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let canonical_parent = parent.canonicalize().map_err(|e| {
        ToposigError::IoError(format!(
            "Invalid output directory '{}': {}",
            parent.display(),
            e
        ))
    })?;

    if !canonical_parent.is_dir() {
        return Err(ToposigError::IoError(format!(
            "Output directory '{}' is not a valid directory",
            parent.display()
        )));
    }

    let filename = path
        .file_name()
        .ok_or_else(|| ToposigError::IoError("Output path has no filename".to_string()))?;

    Ok(canonical_parent.join(filename))
}

/// Read, parse and filter one snapshot file.
pub fn load_snapshot(path: &Path, config: &ReportConfig) -> Result<LoadedSnapshot, ToposigError> {
    let path = validate_file_path(path)?;
    validate_file_size(&path, MAX_SNAPSHOT_FILE_SIZE)?;

    let bytes = std::fs::read(&path)
        .map_err(|e| ToposigError::IoError(format!("Cannot read '{}': {}", path.display(), e)))?;
    let parsed = GraphSnapshot::from_json(&bytes)?;
    let snapshot = parsed.without_nodes_matching(&config.ignored_node_substrings);

    tracing::info!(
        path = %path.display(),
        nodes = snapshot.node_count(),
        dropped = parsed.node_count().saturating_sub(snapshot.node_count()),
        "Loaded snapshot"
    );

    Ok(LoadedSnapshot {
        source: path.display().to_string(),
        snapshot,
    })
}

/// Print `text` or write it to `out`.
fn emit(text: &str, out: Option<&Path>) -> Result<(), ToposigError> {
    match out {
        Some(out) => {
            let out = validate_output_path(out)?;
            std::fs::write(&out, text).map_err(|e| {
                ToposigError::IoError(format!("Cannot write '{}': {}", out.display(), e))
            })?;
            tracing::info!(path = %out.display(), bytes = text.len(), "Wrote report");
        }
        None => print!("{}", text),
    }
    Ok(())
}

fn emit_json<T: Serialize>(value: &T, out: Option<&Path>) -> Result<(), ToposigError> {
    let mut text = serde_json::to_string_pretty(value).unwrap_or_default();
    text.push('\n');
    emit(&text, out)
}

// =============================================================================
// ID COMMAND
// =============================================================================

#[derive(Serialize)]
struct NodeIdJson<'a> {
    fq_name: &'a str,
    id: String,
    tokens: Vec<String>,
}

/// Print signature identifier and tokens per node.
pub fn cmd_id(
    config: &ReportConfig,
    json_mode: bool,
    snapshot: &Path,
    node: Option<&str>,
) -> Result<(), ToposigError> {
    let input = load_snapshot(snapshot, config)?;
    let nodes: Vec<&NodeRecord> = input
        .nodes()
        .iter()
        .filter(|n| node.is_none_or(|fq| n.fq_name == fq))
        .collect();

    if let (Some(fq), true) = (node, nodes.is_empty()) {
        return Err(ToposigError::InvalidSnapshot(format!(
            "Node '{}' not found in '{}'",
            fq, input.source
        )));
    }

    if json_mode {
        let output: Vec<NodeIdJson<'_>> = nodes
            .iter()
            .map(|n| {
                let sig = n.signature();
                NodeIdJson {
                    fq_name: &n.fq_name,
                    id: sig.id().to_string(),
                    tokens: sig.tokens(true).collect(),
                }
            })
            .collect();
        return emit_json(&output, None);
    }

    emit(&render_ids(nodes), None)
}

// =============================================================================
// REPORT COMMAND
// =============================================================================

/// Signature groups and topic index of one snapshot.
pub fn cmd_report(
    config: &ReportConfig,
    json_mode: bool,
    snapshot: &Path,
    out: Option<&Path>,
) -> Result<(), ToposigError> {
    let input = load_snapshot(snapshot, config)?;

    if json_mode {
        let index = SignatureIndex::build(input.nodes(), config.examples_per_group());
        let output = serde_json::json!({
            "source": input.source,
            "timestamp": input.snapshot.timestamp,
            "node_count": input.snapshot.node_count(),
            "duplicates": input.snapshot.duplicates,
            "groups": index.groups_by_size(),
            "topics": topic_index(input.nodes(), &config.ignored_topic_set()),
        });
        return emit_json(&output, out);
    }

    emit(&render_signature_report(&input, config), out)
}

// =============================================================================
// DIFF COMMAND
// =============================================================================

/// Signature and topic count differences between two snapshots.
pub fn cmd_diff(
    config: &ReportConfig,
    json_mode: bool,
    old: &Path,
    new: &Path,
    topic_filter: Option<&str>,
    out: Option<&Path>,
) -> Result<(), ToposigError> {
    let old = load_snapshot(old, config)?;
    let new = load_snapshot(new, config)?;
    let diff = SnapshotDiff::compute(old.nodes(), new.nodes(), topic_filter, config.max_diff_examples)?;

    tracing::info!(
        signature_changes = diff.signature_changes.len(),
        topic_changes = diff.topic_changes.len(),
        "Computed count diff"
    );

    if json_mode {
        let output = serde_json::json!({
            "old": old.source,
            "new": new.source,
            "signature_changes": diff.signature_changes,
            "topic_changes": diff.topic_changes,
        });
        return emit_json(&output, out);
    }

    emit(&render_diff(&old, &new, &diff, config), out)
}

// =============================================================================
// SIMILAR COMMAND
// =============================================================================

/// Near-match pairs between signatures whose counts changed.
pub fn cmd_similar(
    config: &ReportConfig,
    json_mode: bool,
    old: &Path,
    new: &Path,
    include_types: bool,
    min_similarity: Option<f64>,
    out: Option<&Path>,
) -> Result<(), ToposigError> {
    let min_similarity = config.similar_threshold(min_similarity)?;
    let old = load_snapshot(old, config)?;
    let new = load_snapshot(new, config)?;

    let report = SimilarityReport::compute(
        SignatureIndex::build(old.nodes(), config.max_similar_examples),
        SignatureIndex::build(new.nodes(), config.max_similar_examples),
        include_types,
        min_similarity,
    );

    tracing::info!(
        changed = report.changed,
        old_to_new = report.old_to_new.len(),
        new_to_old = report.new_to_old.len(),
        "Computed near matches"
    );

    if json_mode {
        let output = serde_json::json!({
            "old": old.source,
            "new": new.source,
            "include_types": report.include_types,
            "min_similarity": report.min_similarity,
            "changed": report.changed,
            "old_to_new": report.old_to_new,
            "new_to_old": report.new_to_old,
        });
        return emit_json(&output, out);
    }

    emit(&render_similarity(&old, &new, &report, config), out)
}

// =============================================================================
// MATCH COMMAND
// =============================================================================

/// Name-agnostic node matching with endpoint and edge changes.
pub fn cmd_match(
    config: &ReportConfig,
    json_mode: bool,
    old: &Path,
    new: &Path,
    min_similarity: Option<f64>,
    min_margin: Option<f64>,
    out: Option<&Path>,
) -> Result<(), ToposigError> {
    let options = config.match_options(min_similarity, min_margin)?;
    let old = load_snapshot(old, config)?;
    let new = load_snapshot(new, config)?;

    let diff = TopologyDiff::compute(old.nodes(), new.nodes(), &options);

    tracing::info!(
        matched = diff.matching.mapping.len(),
        added = diff.added_nodes.len(),
        removed = diff.removed_nodes.len(),
        changed = diff.changed_nodes.len(),
        "Matched nodes"
    );

    if json_mode {
        return emit_json(&diff, out);
    }

    emit(&render_topology_diff(&old, &new, &diff, config), out)
}
