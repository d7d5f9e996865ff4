//! # Canonicalizer
//!
//! Normalizes one endpoint category (name → collection of type names) into a
//! deterministic ordered form:
//!
//! - every endpoint name appears exactly once,
//! - each type collection is deduplicated and sorted ascending,
//! - endpoints are sorted by name ascending.
//!
//! Input order and duplicate type entries never influence the result, so two
//! canonical lists are equal exactly when the inputs carry the same
//! name → type-set content.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{BTreeMap, BTreeSet};

// =============================================================================
// CANONICAL ENDPOINT
// =============================================================================

/// One endpoint in canonical form: a name and its sorted, unique type names.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct CanonicalEndpoint {
    name: String,
    types: Vec<String>,
}

impl CanonicalEndpoint {
    /// Endpoint name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Type names, sorted ascending with no duplicates.
    #[must_use]
    pub fn types(&self) -> &[String] {
        &self.types
    }

    /// True if no type was reported for this endpoint.
    #[must_use]
    pub fn is_untyped(&self) -> bool {
        self.types.is_empty()
    }
}

// =============================================================================
// CANONICAL ENDPOINT LIST
// =============================================================================

/// A canonical endpoint list, sorted by name.
///
/// Deserialized lists are re-canonicalized, so arbitrary input can never
/// produce an unsorted or duplicated list.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
#[serde(transparent)]
pub struct CanonicalEndpoints(Vec<CanonicalEndpoint>);

impl CanonicalEndpoints {
    /// The empty list.
    #[must_use]
    pub const fn empty() -> Self {
        Self(Vec::new())
    }

    /// Canonicalize any sequence of `(name, types)` pairs.
    ///
    /// A name that occurs more than once has its type sets merged.
    pub fn from_pairs<I, N, T, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (N, T)>,
        N: AsRef<str>,
        T: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut merged: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for (name, types) in pairs {
            let entry = merged.entry(name.as_ref().to_owned()).or_default();
            entry.extend(types.into_iter().map(|t| t.as_ref().to_owned()));
        }

        Self(
            merged
                .into_iter()
                .map(|(name, types)| CanonicalEndpoint {
                    name,
                    types: types.into_iter().collect(),
                })
                .collect(),
        )
    }

    /// Number of endpoints.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True if the list has no endpoints.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate endpoints in canonical order.
    pub fn iter(&self) -> std::slice::Iter<'_, CanonicalEndpoint> {
        self.0.iter()
    }

    /// Endpoints as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[CanonicalEndpoint] {
        &self.0
    }

    /// Look up one endpoint by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&CanonicalEndpoint> {
        self.0
            .binary_search_by(|ep| ep.name.as_str().cmp(name))
            .ok()
            .and_then(|idx| self.0.get(idx))
    }
}

/// Serialized shape of one endpoint, accepted in any order.
#[derive(Deserialize)]
struct RawEndpoint {
    name: String,
    #[serde(default)]
    types: Vec<String>,
}

impl<'de> Deserialize<'de> for CanonicalEndpoints {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Vec::<RawEndpoint>::deserialize(deserializer)?;
        Ok(Self::from_pairs(raw.into_iter().map(|ep| (ep.name, ep.types))))
    }
}

impl<'a> IntoIterator for &'a CanonicalEndpoints {
    type Item = &'a CanonicalEndpoint;
    type IntoIter = std::slice::Iter<'a, CanonicalEndpoint>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Canonicalize one endpoint-category mapping.
///
/// Accepts any mapping shape (`BTreeMap`, `HashMap`, a `Vec` of pairs, an
/// `Option` of those) whose values are collections of type names. An absent
/// or empty mapping yields an empty list.
pub fn canonicalize<I, N, T, S>(mapping: I) -> CanonicalEndpoints
where
    I: IntoIterator<Item = (N, T)>,
    N: AsRef<str>,
    T: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    CanonicalEndpoints::from_pairs(mapping)
}

// =============================================================================
// TESTS
// =============================================================================
