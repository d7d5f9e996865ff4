//! # Core Type Definitions
//!
//! This module contains the input-side types of the signature engine:
//! - Endpoint categories (`EndpointKind`)
//! - The node interface description (`NodeDescription`, `EndpointMap`)
//! - Error types (`ToposigError`)
//!
//! ## Determinism Guarantees
//!
//! All maps in this module are `BTreeMap`s, so iteration order never depends
//! on hashing state. The engine still canonicalizes explicitly and does not
//! rely on that order for correctness.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

// =============================================================================
// ENDPOINT CATEGORIES
// =============================================================================

/// The four endpoint categories of a node interface.
///
/// Declaration order is the canonical category order used by tokens and
/// reports: publishers, subscribers, services, clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndpointKind {
    Publisher,
    Subscriber,
    Service,
    Client,
}

impl EndpointKind {
    /// All categories in canonical order.
    pub const ALL: [EndpointKind; 4] = [
        EndpointKind::Publisher,
        EndpointKind::Subscriber,
        EndpointKind::Service,
        EndpointKind::Client,
    ];

    /// Prefix used in endpoint tokens (`P|/odom`).
    #[must_use]
    pub const fn token_prefix(self) -> &'static str {
        match self {
            Self::Publisher => "P",
            Self::Subscriber => "S",
            Self::Service => "SV",
            Self::Client => "C",
        }
    }

    /// Key of this category in the canonical serialization.
    #[must_use]
    pub const fn canonical_key(self) -> &'static str {
        match self {
            Self::Publisher => "pubs",
            Self::Subscriber => "subs",
            Self::Service => "srvs",
            Self::Client => "clis",
        }
    }

    /// Field name of this category in a node description.
    #[must_use]
    pub const fn field_name(self) -> &'static str {
        match self {
            Self::Publisher => "publishers",
            Self::Subscriber => "subscribers",
            Self::Service => "services",
            Self::Client => "clients",
        }
    }
}

impl fmt::Display for EndpointKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.field_name())
    }
}

// =============================================================================
// NODE DESCRIPTION
// =============================================================================

/// Mapping from endpoint name to the type names seen on it.
///
/// Type lists are raw input: they may be empty, unordered, or contain
/// duplicates.
pub type EndpointMap = BTreeMap<String, Vec<String>>;

/// The interface of one communication node.
///
/// Every category is optional on the wire; absent categories and `null` type
/// lists deserialize as empty.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NodeDescription {
    /// Topics this node publishes.
    #[serde(default, deserialize_with = "lenient_endpoint_map")]
    pub publishers: EndpointMap,
    /// Topics this node subscribes to.
    #[serde(default, deserialize_with = "lenient_endpoint_map")]
    pub subscribers: EndpointMap,
    /// Services this node serves.
    #[serde(default, deserialize_with = "lenient_endpoint_map")]
    pub services: EndpointMap,
    /// Services this node calls.
    #[serde(default, deserialize_with = "lenient_endpoint_map")]
    pub clients: EndpointMap,
}

impl NodeDescription {
    /// Create an empty description.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an endpoint to the given category, replacing any previous entry
    /// with the same name.
    #[must_use]
    pub fn with_endpoint<N, I, T>(mut self, kind: EndpointKind, name: N, types: I) -> Self
    where
        N: Into<String>,
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.endpoints_mut(kind)
            .insert(name.into(), types.into_iter().map(Into::into).collect());
        self
    }

    /// Shorthand for `with_endpoint(EndpointKind::Publisher, ..)`.
    #[must_use]
    pub fn with_publisher<N, I, T>(self, name: N, types: I) -> Self
    where
        N: Into<String>,
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.with_endpoint(EndpointKind::Publisher, name, types)
    }

    /// Shorthand for `with_endpoint(EndpointKind::Subscriber, ..)`.
    #[must_use]
    pub fn with_subscriber<N, I, T>(self, name: N, types: I) -> Self
    where
        N: Into<String>,
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.with_endpoint(EndpointKind::Subscriber, name, types)
    }

    /// Shorthand for `with_endpoint(EndpointKind::Service, ..)`.
    #[must_use]
    pub fn with_service<N, I, T>(self, name: N, types: I) -> Self
    where
        N: Into<String>,
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.with_endpoint(EndpointKind::Service, name, types)
    }

    /// Shorthand for `with_endpoint(EndpointKind::Client, ..)`.
    #[must_use]
    pub fn with_client<N, I, T>(self, name: N, types: I) -> Self
    where
        N: Into<String>,
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.with_endpoint(EndpointKind::Client, name, types)
    }

    /// The raw endpoint map of one category.
    #[must_use]
    pub fn endpoints(&self, kind: EndpointKind) -> &EndpointMap {
        match kind {
            EndpointKind::Publisher => &self.publishers,
            EndpointKind::Subscriber => &self.subscribers,
            EndpointKind::Service => &self.services,
            EndpointKind::Client => &self.clients,
        }
    }

    fn endpoints_mut(&mut self, kind: EndpointKind) -> &mut EndpointMap {
        match kind {
            EndpointKind::Publisher => &mut self.publishers,
            EndpointKind::Subscriber => &mut self.subscribers,
            EndpointKind::Service => &mut self.services,
            EndpointKind::Client => &mut self.clients,
        }
    }

    /// Total number of endpoints across all categories.
    #[must_use]
    pub fn endpoint_count(&self) -> usize {
        EndpointKind::ALL
            .iter()
            .map(|kind| self.endpoints(*kind).len())
            .sum()
    }
}

/// Accepts a missing/`null` map and `null` type lists.
fn lenient_endpoint_map<'de, D>(deserializer: D) -> Result<EndpointMap, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<BTreeMap<String, Option<Vec<String>>>> = Option::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .map(|(name, types)| (name, types.unwrap_or_default()))
        .collect())
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors raised at the boundaries around the signature engine.
///
/// The signature path itself (canonicalize, build, hash, tokenize, score) is
/// total and never returns an error.
#[derive(Debug, Error)]
pub enum ToposigError {
    /// A graph snapshot could not be parsed.
    #[error("Invalid snapshot: {0}")]
    InvalidSnapshot(String),

    /// A string is not a 12-character lower-case hex signature id.
    #[error("Invalid signature id: {0}")]
    InvalidSignatureId(String),

    /// A user-supplied regular expression did not compile.
    #[error("Invalid pattern: {0}")]
    InvalidPattern(String),

    /// A similarity or margin threshold lies outside [0, 1].
    #[error("Invalid threshold: {0}")]
    InvalidThreshold(String),

    /// A configuration file could not be parsed.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    IoError(String),
}

// =============================================================================
// TESTS
// =============================================================================
