//! # Similarity Scorer
//!
//! Jaccard index between two sets: `|A ∩ B| / |A ∪ B|`.
//!
//! Two empty sets score 1.0 (two nodes with no endpoints are identical in
//! this dimension); exactly one empty set scores 0.0.

use crate::types::ToposigError;
use std::collections::BTreeSet;

/// Jaccard similarity of two sets, in `[0.0, 1.0]`.
///
/// Commutative. Works for any ordered element type, not only tokens.
#[must_use]
#[allow(clippy::float_arithmetic)]
pub fn jaccard<T: Ord>(a: &BTreeSet<T>, b: &BTreeSet<T>) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    let intersection = a.intersection(b).count();
    let union = a.len() + b.len() - intersection;
    intersection as f64 / union as f64
}

/// Check that a similarity or margin threshold lies in `[0.0, 1.0]`.
pub fn validate_threshold(name: &str, value: f64) -> Result<f64, ToposigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(ToposigError::InvalidThreshold(format!(
            "{} must be within [0, 1], got {}",
            name, value
        )))
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    #![allow(clippy::float_arithmetic, clippy::float_cmp)]

    use super::*;

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn both_empty_is_fully_similar() {
        assert_eq!(jaccard(&set(&[]), &set(&[])), 1.0);
    }

    #[test]
    fn one_empty_is_dissimilar() {
        assert_eq!(jaccard(&set(&["a"]), &set(&[])), 0.0);
        assert_eq!(jaccard(&set(&[]), &set(&["a"])), 0.0);
    }

    #[test]
    fn partial_overlap() {
        let score = jaccard(&set(&["a", "b"]), &set(&["b", "c"]));
        assert!((score - 1.0 / 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn identical_and_disjoint() {
        assert_eq!(jaccard(&set(&["a", "b"]), &set(&["b", "a"])), 1.0);
        assert_eq!(jaccard(&set(&["a"]), &set(&["b"])), 0.0);
    }

    #[test]
    fn commutative() {
        let a = set(&["x", "y", "z"]);
        let b = set(&["y"]);
        assert_eq!(jaccard(&a, &b), jaccard(&b, &a));
    }

    #[test]
    fn thresholds_outside_unit_interval_rejected() {
        assert!(validate_threshold("min_similarity", 0.85).is_ok());
        assert!(validate_threshold("min_similarity", 0.0).is_ok());
        assert!(validate_threshold("min_similarity", 1.0).is_ok());
        assert!(matches!(
            validate_threshold("min_margin", 1.5),
            Err(ToposigError::InvalidThreshold(_))
        ));
        assert!(validate_threshold("min_margin", f64::NAN).is_err());
    }

    #[test]
    fn works_for_non_string_elements() {
        let a: BTreeSet<u32> = [1, 2, 3, 4].into_iter().collect();
        let b: BTreeSet<u32> = [3, 4].into_iter().collect();
        assert_eq!(jaccard(&a, &b), 0.5);
    }
}
