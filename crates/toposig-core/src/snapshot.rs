//! # Graph Snapshots
//!
//! In-memory view of a communication-graph snapshot: a list of node records,
//! each carrying a fully-qualified name and a [`NodeDescription`].
//!
//! The JSON shape is the one written by the external graph snapshot tool.
//! Unknown fields are ignored; missing categories deserialize as empty.

use crate::signature::Signature;
use crate::types::{NodeDescription, ToposigError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// =============================================================================
// NODE RECORD
// =============================================================================

/// One node of a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NodeRecord {
    /// Node name without namespace.
    #[serde(default)]
    pub name: String,
    /// Node namespace.
    #[serde(default)]
    pub namespace: String,
    /// Fully-qualified node name.
    #[serde(default)]
    pub fq_name: String,
    /// The node's endpoint interface.
    #[serde(flatten)]
    pub interface: NodeDescription,
}

impl NodeRecord {
    /// Create a record, deriving `fq_name` from name and namespace.
    #[must_use]
    pub fn new(name: impl Into<String>, namespace: impl Into<String>, interface: NodeDescription) -> Self {
        let name = name.into();
        let namespace = namespace.into();
        let fq_name = fq_name(&name, &namespace);
        Self {
            name,
            namespace,
            fq_name,
            interface,
        }
    }

    /// Signature of this node's interface.
    #[must_use]
    pub fn signature(&self) -> Signature {
        Signature::from_node(&self.interface)
    }
}

/// Fully-qualified node name.
///
/// Absolute names pass through; otherwise the namespace is normalized to a
/// leading `/` with no trailing `/` and joined with the name.
#[must_use]
pub fn fq_name(name: &str, namespace: &str) -> String {
    if name.starts_with('/') {
        return name.to_string();
    }
    let ns = namespace.trim_end_matches('/');
    if ns.is_empty() {
        return format!("/{}", name);
    }
    if ns.starts_with('/') {
        format!("{}/{}", ns, name)
    } else {
        format!("/{}/{}", ns, name)
    }
}

// =============================================================================
// GRAPH SNAPSHOT
// =============================================================================

/// A full graph snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GraphSnapshot {
    /// Capture time as written by the snapshot tool.
    #[serde(default)]
    pub timestamp: Option<String>,
    /// Node records.
    #[serde(default)]
    pub nodes: Vec<NodeRecord>,
    /// Fully-qualified names that occurred more than once.
    #[serde(default)]
    pub duplicates: Vec<String>,
    /// Per-node introspection errors.
    #[serde(default)]
    pub errors: BTreeMap<String, String>,
}

impl GraphSnapshot {
    /// Build a snapshot from node records.
    #[must_use]
    pub fn from_nodes(nodes: Vec<NodeRecord>) -> Self {
        Self {
            nodes,
            ..Self::default()
        }
    }

    /// Parse snapshot JSON.
    ///
    /// Records without `fq_name` get one derived from name and namespace.
    pub fn from_json(bytes: &[u8]) -> Result<Self, ToposigError> {
        let mut snapshot: Self =
            serde_json::from_slice(bytes).map_err(|e| ToposigError::InvalidSnapshot(e.to_string()))?;
        for node in &mut snapshot.nodes {
            if node.fq_name.is_empty() {
                node.fq_name = fq_name(&node.name, &node.namespace);
            }
        }
        Ok(snapshot)
    }

    /// Copy of this snapshot without the nodes whose fully-qualified name
    /// contains any of `substrings`.
    #[must_use]
    pub fn without_nodes_matching(&self, substrings: &[String]) -> Self {
        let nodes = self
            .nodes
            .iter()
            .filter(|node| !substrings.iter().any(|s| node.fq_name.contains(s.as_str())))
            .cloned()
            .collect();
        Self {
            nodes,
            ..self.clone()
        }
    }

    /// Number of node records.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Timestamp, or an empty string when absent.
    #[must_use]
    pub fn timestamp_or_empty(&self) -> &str {
        self.timestamp.as_deref().unwrap_or("")
    }
}

// =============================================================================
// TESTS
// =============================================================================
