//! # Report Configuration
//!
//! Limits and thresholds for the report commands.
//!
//! Values are layered: built-in defaults, then an optional TOML file passed
//! with `--config`, then command-line flags. Every key in the file is
//! optional:
//!
//! ```toml
//! ignored_topics = ["/parameter_events", "/rosout"]
//! ignored_node_substrings = ["transform_listener"]
//! similar_min_similarity = 0.85
//! match_min_similarity = 0.70
//! min_margin = 0.10
//! max_groups = 50
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;
use toposig_core::{MatchOptions, ToposigError, validate_threshold};

// =============================================================================
// DEFAULTS
// =============================================================================

/// Topic published by every node; ignored unless configured otherwise.
pub const DEFAULT_IGNORED_TOPIC: &str = "/parameter_events";

/// Substring of helper node names dropped before analysis.
pub const DEFAULT_IGNORED_NODE_SUBSTRING: &str = "transform_listener";

// =============================================================================
// REPORT CONFIG
// =============================================================================

/// Settings shared by all report commands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReportConfig {
    /// Topics left out of topic indexes, matching and edges.
    pub ignored_topics: Vec<String>,
    /// Nodes whose fully-qualified name contains one of these are dropped.
    pub ignored_node_substrings: Vec<String>,
    /// Threshold for near-match pairs (`similar`).
    pub similar_min_similarity: f64,
    /// Threshold for the similarity stage of node matching (`match`).
    pub match_min_similarity: f64,
    /// Required lead over the runner-up in node matching.
    pub min_margin: f64,
    /// Signature groups listed in `report`; 0 lists all.
    pub max_groups: usize,
    /// Example node names per group (at least one is kept).
    pub max_nodes_per_group: usize,
    /// Topics listed per direction in a group.
    pub max_topics_per_group: usize,
    /// Topics listed in the topic index.
    pub max_topics: usize,
    /// Signature changes listed in `diff`.
    pub max_sig_changes: usize,
    /// Example node names per signature change in `diff`.
    pub max_diff_examples: usize,
    /// Near-match pairs listed per direction in `similar`.
    pub max_pairs: usize,
    /// Added/removed tokens listed per near-match pair.
    pub max_diff_items: usize,
    /// Example node names per near-match pair.
    pub max_similar_examples: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            ignored_topics: vec![DEFAULT_IGNORED_TOPIC.to_string()],
            ignored_node_substrings: vec![DEFAULT_IGNORED_NODE_SUBSTRING.to_string()],
            similar_min_similarity: 0.85,
            match_min_similarity: 0.70,
            min_margin: 0.10,
            max_groups: 50,
            max_nodes_per_group: 10,
            max_topics_per_group: 30,
            max_topics: 200,
            max_sig_changes: 80,
            max_diff_examples: 6,
            max_pairs: 60,
            max_diff_items: 25,
            max_similar_examples: 8,
        }
    }
}

impl ReportConfig {
    /// Parse configuration from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ToposigError> {
        let config: Self =
            toml::from_str(content).map_err(|e| ToposigError::ConfigError(e.to_string()))?;
        config.validate()
    }

    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ToposigError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ToposigError::IoError(format!("Cannot read config '{}': {}", path.display(), e))
        })?;
        Self::from_toml(&content)
    }

    /// Defaults, or the given file if any.
    pub fn load(path: Option<&Path>) -> Result<Self, ToposigError> {
        match path {
            Some(path) => {
                let config = Self::from_file(path)?;
                tracing::debug!(path = %path.display(), "Loaded report configuration");
                Ok(config)
            }
            None => Ok(Self::default()),
        }
    }

    /// Check every threshold lies in [0, 1].
    pub fn validate(self) -> Result<Self, ToposigError> {
        validate_threshold("similar_min_similarity", self.similar_min_similarity)?;
        validate_threshold("match_min_similarity", self.match_min_similarity)?;
        validate_threshold("min_margin", self.min_margin)?;
        Ok(self)
    }

    /// Signature groups to list; `max_groups = 0` lists all of them.
    #[must_use]
    pub fn group_limit(&self) -> usize {
        match self.max_groups {
            0 => usize::MAX,
            n => n,
        }
    }

    /// Example node names kept per group, never fewer than one.
    #[must_use]
    pub fn examples_per_group(&self) -> usize {
        self.max_nodes_per_group.max(1)
    }

    /// Ignored topics as a set.
    #[must_use]
    pub fn ignored_topic_set(&self) -> BTreeSet<String> {
        self.ignored_topics.iter().cloned().collect()
    }

    /// Node matching options, with optional command-line overrides.
    pub fn match_options(
        &self,
        min_similarity: Option<f64>,
        min_margin: Option<f64>,
    ) -> Result<MatchOptions, ToposigError> {
        Ok(MatchOptions {
            ignored_topics: self.ignored_topic_set(),
            min_similarity: validate_threshold(
                "min_similarity",
                min_similarity.unwrap_or(self.match_min_similarity),
            )?,
            min_margin: validate_threshold("min_margin", min_margin.unwrap_or(self.min_margin))?,
        })
    }

    /// Near-match threshold, with an optional command-line override.
    pub fn similar_threshold(&self, min_similarity: Option<f64>) -> Result<f64, ToposigError> {
        validate_threshold(
            "min_similarity",
            min_similarity.unwrap_or(self.similar_min_similarity),
        )
    }
}

// =============================================================================
// TESTS
// =============================================================================
