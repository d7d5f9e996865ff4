//! # Signature Builder
//!
//! Applies the canonicalizer to all four endpoint categories of a node and
//! assembles the results into one immutable [`Signature`] value.
//!
//! A `Signature` has no identity beyond its value: structurally equal node
//! descriptions always produce equal signatures, whatever order their maps
//! were built in.

use crate::canonical::{CanonicalEndpoints, canonicalize};
use crate::hasher::{SignatureId, signature_id};
use crate::tokens::Tokens;
use crate::types::{EndpointKind, NodeDescription};
use serde::Serialize;
use std::collections::BTreeSet;

/// The canonical, order-independent interface of one node.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
pub struct Signature {
    publishers: CanonicalEndpoints,
    subscribers: CanonicalEndpoints,
    services: CanonicalEndpoints,
    clients: CanonicalEndpoints,
}

impl Signature {
    /// Build the signature of a node description.
    #[must_use]
    pub fn from_node(node: &NodeDescription) -> Self {
        Self {
            publishers: canonicalize(&node.publishers),
            subscribers: canonicalize(&node.subscribers),
            services: canonicalize(&node.services),
            clients: canonicalize(&node.clients),
        }
    }

    /// Assemble a signature from already-canonical category lists.
    #[must_use]
    pub fn from_parts(
        publishers: CanonicalEndpoints,
        subscribers: CanonicalEndpoints,
        services: CanonicalEndpoints,
        clients: CanonicalEndpoints,
    ) -> Self {
        Self {
            publishers,
            subscribers,
            services,
            clients,
        }
    }

    /// Canonical publishers.
    #[must_use]
    pub fn publishers(&self) -> &CanonicalEndpoints {
        &self.publishers
    }

    /// Canonical subscribers.
    #[must_use]
    pub fn subscribers(&self) -> &CanonicalEndpoints {
        &self.subscribers
    }

    /// Canonical services.
    #[must_use]
    pub fn services(&self) -> &CanonicalEndpoints {
        &self.services
    }

    /// Canonical clients.
    #[must_use]
    pub fn clients(&self) -> &CanonicalEndpoints {
        &self.clients
    }

    /// Canonical endpoints of one category.
    #[must_use]
    pub fn endpoints(&self, kind: EndpointKind) -> &CanonicalEndpoints {
        match kind {
            EndpointKind::Publisher => &self.publishers,
            EndpointKind::Subscriber => &self.subscribers,
            EndpointKind::Service => &self.services,
            EndpointKind::Client => &self.clients,
        }
    }

    /// Total number of endpoints.
    #[must_use]
    pub fn endpoint_count(&self) -> usize {
        EndpointKind::ALL
            .iter()
            .map(|kind| self.endpoints(*kind).len())
            .sum()
    }

    /// True for a node with no endpoints at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.endpoint_count() == 0
    }

    /// Short content-derived identifier of this signature.
    #[must_use]
    pub fn id(&self) -> SignatureId {
        signature_id(self)
    }

    /// Lazy token sequence of this signature.
    #[must_use]
    pub fn tokens(&self, include_types: bool) -> Tokens<'_> {
        Tokens::new(self, include_types)
    }

    /// The token sequence collected into a set, ready for [`crate::jaccard`].
    #[must_use]
    pub fn token_set(&self, include_types: bool) -> BTreeSet<String> {
        self.tokens(include_types).collect()
    }
}

impl From<&NodeDescription> for Signature {
    fn from(node: &NodeDescription) -> Self {
        Self::from_node(node)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> NodeDescription {
        NodeDescription::new()
            .with_publisher("/odom", ["nav_msgs/Odometry"])
            .with_subscriber("/cmd_vel", ["geometry_msgs/Twist"])
            .with_service("/reset", ["std_srvs/Trigger"])
            .with_client("/get_map", ["nav_msgs/GetMap"])
    }

    #[test]
    fn categories_are_independent() {
        let sig = Signature::from_node(&sample());

        assert_eq!(sig.publishers().len(), 1);
        assert_eq!(sig.subscribers().len(), 1);
        assert_eq!(sig.services().len(), 1);
        assert_eq!(sig.clients().len(), 1);
        assert_eq!(sig.endpoint_count(), 4);
        assert!(sig.publishers().get("/cmd_vel").is_none());
    }

    #[test]
    fn empty_node_has_empty_signature() {
        let sig = Signature::from_node(&NodeDescription::new());
        assert!(sig.is_empty());
        assert_eq!(sig, Signature::default());
    }

    #[test]
    fn insertion_order_does_not_matter() {
        let a = NodeDescription::new()
            .with_publisher("/b", ["y", "x"])
            .with_publisher("/a", ["x"]);
        let b = NodeDescription::new()
            .with_publisher("/a", ["x", "x"])
            .with_publisher("/b", ["x", "y"]);

        assert_eq!(Signature::from_node(&a), Signature::from_node(&b));
    }

    #[test]
    fn moving_endpoint_between_categories_changes_signature() {
        let publisher = NodeDescription::new().with_publisher("/a", ["x"]);
        let subscriber = NodeDescription::new().with_subscriber("/a", ["x"]);

        assert_ne!(
            Signature::from_node(&publisher),
            Signature::from_node(&subscriber)
        );
    }

    #[test]
    fn signature_is_a_value_type() {
        use std::collections::HashSet;

        let mut seen = HashSet::new();
        seen.insert(Signature::from_node(&sample()));
        seen.insert(Signature::from(&sample()));
        assert_eq!(seen.len(), 1);
    }

    #[test]
    fn from_parts_matches_from_node() {
        let node = sample();
        let sig = Signature::from_node(&node);
        let rebuilt = Signature::from_parts(
            sig.publishers().clone(),
            sig.subscribers().clone(),
            sig.services().clone(),
            sig.clients().clone(),
        );
        assert_eq!(sig, rebuilt);
    }

    #[test]
    fn deserialized_parts_match_canonical_signature() {
        let json = r#"[{"name":"/b","types":["y","x","x"]},{"name":"/a","types":[]}]"#;
        let publishers: CanonicalEndpoints = serde_json::from_str(json).expect("parse");
        let sig = Signature::from_parts(
            publishers,
            CanonicalEndpoints::empty(),
            CanonicalEndpoints::empty(),
            CanonicalEndpoints::empty(),
        );

        let node = NodeDescription::new()
            .with_publisher("/b", ["y", "x", "x"])
            .with_publisher("/a", Vec::<String>::new());
        assert_eq!(sig, Signature::from_node(&node));
        assert_eq!(sig.id(), Signature::from_node(&node).id());
    }
}
