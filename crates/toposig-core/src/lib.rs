//! # toposig-core
//!
//! The deterministic signature engine for communication-graph snapshots.
//!
//! A node's interface (publishers, subscribers, services, clients) is reduced
//! to a canonical [`Signature`], fingerprinted with a short SHA-256 based
//! [`SignatureId`], and compared with other nodes through token sets and the
//! Jaccard index.
//!
//! ## Layers
//!
//! - `canonical`, `signature`, `hasher`, `tokens`, `similarity`: the pure
//!   signature path. Total functions, no I/O, no errors.
//! - `snapshot`, `index`, `diff`, `similar`, `matching`: snapshot-level
//!   analysis built on top of signatures.
//!
//! ## Architectural Constraints
//!
//! - Same input, same output: no clocks, no randomness, no hash-order
//!   dependence. Every collection that reaches an output is a `BTreeMap`,
//!   a `BTreeSet` or an explicitly sorted `Vec`.
//! - No async, no network, no filesystem access. Callers pass bytes in.
//! - All values are immutable once built and safe to share across threads.

// =============================================================================
// MODULES
// =============================================================================

pub mod canonical;
pub mod diff;
pub mod hasher;
pub mod index;
pub mod matching;
pub mod signature;
pub mod similar;
pub mod similarity;
pub mod snapshot;
pub mod tokens;
pub mod types;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{EndpointKind, EndpointMap, NodeDescription, ToposigError};

// =============================================================================
// RE-EXPORTS: Signature Engine
// =============================================================================

pub use canonical::{CanonicalEndpoint, CanonicalEndpoints, canonicalize};
pub use hasher::{
    SIGNATURE_ID_LEN, SignatureId, canonical_bytes, canonical_json, full_digest, signature_id,
};
pub use signature::Signature;
pub use similarity::{jaccard, validate_threshold};
pub use tokens::{TOKEN_SEPARATOR, Tokens, UNKNOWN_TYPE, endpoint_token};

// =============================================================================
// RE-EXPORTS: Snapshot Analysis
// =============================================================================

pub use diff::{SignatureCountChange, SnapshotDiff, TopicCountChange, compile_filter};
pub use index::{SignatureGroup, SignatureIndex, TopicEntry, topic_index};
pub use matching::{
    Edge, EndpointDiff, MatchEvidence, MatchOptions, MatchStage, NodeChange, NodeMatching,
    TopologyDiff, basename, match_nodes,
};
pub use similar::{NearMatch, SimilarityReport, best_match};
pub use snapshot::{GraphSnapshot, NodeRecord, fq_name};
