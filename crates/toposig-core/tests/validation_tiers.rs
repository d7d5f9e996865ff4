//! # Validation Tier Tests (T0-T5)
//!
//! If ANY tier fails, fingerprints are not comparable across runs.
//!
//! ## Tiers
//! - T0: Canonicalization
//! - T1: Signature Construction
//! - T2: Identifier Derivation
//! - T3: Tokens & Similarity
//! - T4: Snapshot Analysis
//! - T5: Concurrent Use

use std::collections::{BTreeSet, HashMap};
use toposig_core::{
    EndpointKind, GraphSnapshot, NodeDescription, Signature, SignatureId, canonicalize, jaccard,
    signature_id,
};

fn odom_publisher() -> NodeDescription {
    NodeDescription::new().with_publisher("odom", ["nav_msgs/Odometry"])
}

// =============================================================================
// TIER T0: CANONICALIZATION
// =============================================================================

mod t0_canonicalization {
    use super::*;

    /// T0.1: Key order, type order and duplicates do not matter.
    #[test]
    fn order_and_duplicates_ignored() {
        let a = canonicalize([("b", vec!["y", "x"]), ("a", vec!["x"])]);
        let b = canonicalize([("a", vec!["x", "x"]), ("b", vec!["x", "y"])]);

        assert_eq!(a, b);
        let flat: Vec<(&str, Vec<&str>)> = a
            .iter()
            .map(|ep| (ep.name(), ep.types().iter().map(String::as_str).collect()))
            .collect();
        assert_eq!(flat, vec![("a", vec!["x"]), ("b", vec!["x", "y"])]);
    }

    /// T0.2: Absent and empty mappings canonicalize to the empty sequence.
    #[test]
    fn empty_mapping() {
        let none: Vec<(String, Vec<String>)> = Vec::new();
        assert!(canonicalize(none).is_empty());
    }

    /// T0.3: Untyped endpoints are kept with an empty type list.
    #[test]
    fn untyped_endpoint_kept() {
        let canonical = canonicalize([("/tf", Vec::<String>::new())]);
        assert_eq!(canonical.len(), 1);
        assert!(canonical.as_slice()[0].is_untyped());
    }

    /// T0.4: Hash-ordered input canonicalizes like sorted input.
    #[test]
    fn hash_map_input() {
        let mut map: HashMap<String, Vec<String>> = HashMap::new();
        for i in 0..32 {
            map.insert(format!("/topic_{:02}", i), vec![format!("t/T{}", i % 3)]);
        }
        let sorted: Vec<(String, Vec<String>)> = {
            let mut v: Vec<_> = map.clone().into_iter().collect();
            v.sort();
            v
        };
        assert_eq!(canonicalize(map), canonicalize(sorted));
    }
}

// =============================================================================
// TIER T1: SIGNATURE CONSTRUCTION
// =============================================================================

mod t1_signature {
    use super::*;

    /// T1.1: Construction order of the description does not matter.
    #[test]
    fn construction_order_irrelevant() {
        let a = NodeDescription::new()
            .with_publisher("/b", ["t/B"])
            .with_publisher("/a", ["t/A"]);
        let b = NodeDescription::new()
            .with_publisher("/a", ["t/A"])
            .with_publisher("/b", ["t/B"]);
        assert_eq!(Signature::from_node(&a), Signature::from_node(&b));
    }

    /// T1.2: Moving an endpoint between categories changes the signature.
    #[test]
    fn category_move_detected() {
        let as_pub = NodeDescription::new().with_publisher("/x", ["t/X"]);
        let as_sub = NodeDescription::new().with_subscriber("/x", ["t/X"]);
        assert_ne!(Signature::from_node(&as_pub), Signature::from_node(&as_sub));
        assert_ne!(signature_id(&Signature::from_node(&as_pub)), signature_id(&Signature::from_node(&as_sub)));
    }

    /// T1.3: The empty description yields the empty signature.
    #[test]
    fn empty_description() {
        let sig = Signature::from_node(&NodeDescription::new());
        assert!(sig.is_empty());
        assert_eq!(sig, Signature::default());
        for kind in EndpointKind::ALL {
            assert!(sig.endpoints(kind).is_empty());
        }
    }
}

// =============================================================================
// TIER T2: IDENTIFIER DERIVATION
// =============================================================================

mod t2_identifier {
    use super::*;

    /// T2.1: Reference identifiers are stable.
    #[test]
    fn reference_identifiers() {
        assert_eq!(Signature::default().id().as_str(), "04eba8d0407f");
        assert_eq!(Signature::from_node(&odom_publisher()).id().as_str(), "5fa635efc3cc");
    }

    /// T2.2: Identifiers round-trip through their string form.
    #[test]
    fn identifier_parses_back() {
        let id = Signature::from_node(&odom_publisher()).id();
        let parsed: SignatureId = id.to_string().parse().expect("parse");
        assert_eq!(parsed, id);
    }

    /// T2.3: Each single-element perturbation changes the identifier.
    #[test]
    fn perturbations_change_identifier() {
        let base = NodeDescription::new()
            .with_publisher("/odom", ["nav_msgs/Odometry"])
            .with_subscriber("/cmd_vel", ["geometry_msgs/Twist"]);
        let base_id = Signature::from_node(&base).id();

        let variants = [
            base.clone().with_publisher("/odom", ["nav_msgs/OdometryV2"]),
            base.clone().with_service("/reset", ["std_srvs/Trigger"]),
            NodeDescription::new().with_publisher("/odom", ["nav_msgs/Odometry"]),
            NodeDescription::new()
                .with_publisher("/odom", ["nav_msgs/Odometry"])
                .with_client("/cmd_vel", ["geometry_msgs/Twist"]),
        ];
        for variant in &variants {
            assert_ne!(Signature::from_node(variant).id(), base_id);
        }
    }
}

// =============================================================================
// TIER T3: TOKENS & SIMILARITY
// =============================================================================

mod t3_tokens_similarity {
    use super::*;

    /// T3.1: Token grammar with and without types.
    #[test]
    fn token_grammar() {
        let sig = Signature::from_node(&odom_publisher());
        assert_eq!(sig.tokens(true).collect::<Vec<_>>(), vec!["P|odom|nav_msgs/Odometry"]);
        assert_eq!(sig.tokens(false).collect::<Vec<_>>(), vec!["P|odom"]);
    }

    /// T3.2: Category order is publishers, subscribers, services, clients.
    #[test]
    fn token_category_order() {
        let node = NodeDescription::new()
            .with_client("/c", ["t/C"])
            .with_service("/s", Vec::<String>::new())
            .with_subscriber("/b", ["t/B2", "t/B1"])
            .with_publisher("/a", ["t/A"]);
        let tokens: Vec<String> = Signature::from_node(&node).tokens(true).collect();
        assert_eq!(
            tokens,
            vec!["P|/a|t/A", "S|/b|t/B1,t/B2", "SV|/s|<unknown>", "C|/c|t/C"]
        );
    }

    /// T3.3: Jaccard boundary values.
    #[test]
    #[allow(clippy::float_arithmetic, clippy::float_cmp)]
    fn jaccard_boundaries() {
        let set = |items: &[&str]| items.iter().map(|s| (*s).to_string()).collect::<BTreeSet<_>>();
        assert_eq!(jaccard(&set(&[]), &set(&[])), 1.0);
        assert_eq!(jaccard(&set(&["a"]), &set(&[])), 0.0);
        assert!((jaccard(&set(&["a", "b"]), &set(&["b", "c"])) - 1.0 / 3.0).abs() < 1e-12);
    }

    /// T3.4: End-to-end: reordered input matches, an extra subscriber does not.
    #[test]
    fn end_to_end_scenario() {
        let first: HashMap<&str, Vec<&str>> =
            [("/odom", vec!["nav_msgs/Odometry"]), ("/tf", vec!["tf2_msgs/TFMessage"])]
                .into_iter()
                .collect();
        let second: Vec<(&str, Vec<&str>)> =
            vec![("/tf", vec!["tf2_msgs/TFMessage"]), ("/odom", vec!["nav_msgs/Odometry"])];

        let describe = |pairs: Vec<(&str, Vec<&str>)>| {
            pairs
                .into_iter()
                .fold(NodeDescription::new(), |node, (name, types)| node.with_publisher(name, types))
        };
        let a = describe(first.into_iter().collect());
        let b = describe(second);
        let c = b.clone().with_subscriber("/scan", ["sensor_msgs/LaserScan"]);

        let (sa, sb, sc) = (Signature::from_node(&a), Signature::from_node(&b), Signature::from_node(&c));
        assert_eq!(sa.id(), sb.id());
        assert_ne!(sa.id(), sc.id());

        for include_types in [false, true] {
            let score = jaccard(&sa.token_set(include_types), &sc.token_set(include_types));
            assert!(score < 1.0);
            assert!(score > 0.0);
        }
    }
}

// =============================================================================
// TIER T4: SNAPSHOT ANALYSIS
// =============================================================================

mod t4_snapshot_analysis {
    use super::*;
    use toposig_core::{MatchOptions, SignatureIndex, SimilarityReport, SnapshotDiff, TopologyDiff};

    const OLD: &str = r#"{
        "timestamp": "2025-01-01T00:00:00Z",
        "nodes": [
            {"name": "talker", "namespace": "/", "publishers": {"/chatter": ["std_msgs/msg/String"]}},
            {"name": "listener_a", "namespace": "/", "subscribers": {"/chatter": ["std_msgs/msg/String"]}},
            {"name": "listener_b", "namespace": "/", "subscribers": {"/chatter": ["std_msgs/msg/String"]}}
        ]
    }"#;

    const NEW: &str = r#"{
        "timestamp": "2025-01-02T00:00:00Z",
        "nodes": [
            {"name": "talker", "namespace": "/demo", "publishers": {"/chatter": ["std_msgs/msg/String"]}},
            {"name": "listener_a", "namespace": "/", "subscribers": {
                "/chatter": ["std_msgs/msg/String"],
                "/rosout": ["rcl_interfaces/msg/Log"]
            }},
            {"name": "listener_b", "namespace": "/", "subscribers": {"/chatter": ["std_msgs/msg/String"]}}
        ]
    }"#;

    fn load(json: &str) -> GraphSnapshot {
        GraphSnapshot::from_json(json.as_bytes()).expect("snapshot")
    }

    /// T4.1: Grouping counts nodes per signature.
    #[test]
    fn index_groups_nodes() {
        let index = SignatureIndex::build(&load(OLD).nodes, 10);
        assert_eq!(index.len(), 2);
        let sizes: Vec<usize> = index.groups_by_size().iter().map(|g| g.count).collect();
        assert_eq!(sizes, vec![2, 1]);
    }

    /// T4.2: Count diff reports the split listener group.
    #[test]
    fn diff_reports_count_changes() {
        let diff = SnapshotDiff::compute(&load(OLD).nodes, &load(NEW).nodes, None, 6).expect("diff");
        assert_eq!(diff.signature_changes.len(), 2);
        assert_eq!(diff.signature_changes[0].magnitude(), 1);
        assert!(diff.topic_changes.iter().any(|c| c.topic == "/rosout"));
    }

    /// T4.3: Near-match search pairs the grown listener with its old group.
    #[test]
    fn similar_pairs_grown_listener() {
        let old = SignatureIndex::build(&load(OLD).nodes, 10);
        let new = SignatureIndex::build(&load(NEW).nodes, 10);
        let report = SimilarityReport::compute(old, new, true, 0.4);
        assert!(!report.new_to_old.is_empty());
        assert_eq!(report.new_to_old[0].removed, vec!["S|/rosout|rcl_interfaces/msg/Log"]);
    }

    /// T4.4: Name-agnostic matching follows the namespace move.
    #[test]
    fn match_follows_namespace_move() {
        let diff = TopologyDiff::compute(&load(OLD).nodes, &load(NEW).nodes, &MatchOptions::default());
        assert_eq!(
            diff.matching.mapping.get("/talker").map(String::as_str),
            Some("/demo/talker")
        );
        assert!(diff.added_nodes.is_empty());
        assert!(diff.removed_nodes.is_empty());
        assert!(diff.removed_edges.is_empty());
        assert_eq!(diff.changed_nodes.len(), 1);
        assert_eq!(diff.changed_nodes[0].old, "/listener_a");
    }
}

// =============================================================================
// TIER T5: CONCURRENT USE
// =============================================================================

mod t5_concurrency {
    use super::*;

    /// T5.1: Identifiers computed on many threads agree with sequential ones.
    #[test]
    fn parallel_identifiers_agree() {
        let nodes: Vec<NodeDescription> = (0..64)
            .map(|i| {
                NodeDescription::new()
                    .with_publisher(format!("/out_{}", i % 7), ["t/Out"])
                    .with_subscriber(format!("/in_{}", i % 5), ["t/In"])
            })
            .collect();
        let sequential: Vec<SignatureId> = nodes.iter().map(|n| Signature::from_node(n).id()).collect();

        let parallel: Vec<SignatureId> = std::thread::scope(|scope| {
            let handles: Vec<_> = nodes
                .chunks(8)
                .map(|chunk| scope.spawn(move || chunk.iter().map(|n| Signature::from_node(n).id()).collect::<Vec<_>>()))
                .collect();
            handles
                .into_iter()
                .flat_map(|h| h.join().expect("worker"))
                .collect()
        });

        assert_eq!(parallel, sequential);
    }

    /// T5.2: A shared signature can be tokenized from several threads at once.
    #[test]
    fn shared_signature_tokens() {
        let sig = Signature::from_node(&odom_publisher());
        let sets: Vec<BTreeSet<String>> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..4).map(|_| scope.spawn(|| sig.token_set(true))).collect();
            handles.into_iter().map(|h| h.join().expect("worker")).collect()
        });
        assert!(sets.windows(2).all(|w| w[0] == w[1]));
    }
}
