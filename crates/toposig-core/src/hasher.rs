//! # Signature Hasher
//!
//! Derives a short, stable identifier from a [`Signature`]:
//!
//! ```text
//! {"clis":[…],"pubs":[…],"srvs":[…],"subs":[…]}   canonical JSON
//!   → SHA-256
//!   → lower-case hex
//!   → first 12 characters
//! ```
//!
//! The canonical encoding is whitespace-free and sorts object keys at every
//! depth. It is written by [`canonical_json`] instead of `serde_json`'s own
//! serializer because the workspace enables `preserve_order`, which makes
//! `serde_json::Map` iterate in insertion order.
//!
//! The 12-character prefix is a fingerprint, not a unique key. Collisions are
//! possible and no registry of full digests is kept to detect them.

use crate::signature::Signature;
use crate::types::{EndpointKind, ToposigError};
use serde::Serialize;
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

/// Number of hex characters in a [`SignatureId`].
pub const SIGNATURE_ID_LEN: usize = 12;

// =============================================================================
// SIGNATURE ID
// =============================================================================

/// Truncated SHA-256 fingerprint of a signature: 12 lower-case hex chars.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct SignatureId(String);

impl SignatureId {
    /// The identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SignatureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for SignatureId {
    type Err = ToposigError;

    /// Accepts exactly 12 lower-case hex characters.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let well_formed = s.len() == SIGNATURE_ID_LEN
            && s.bytes().all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b));
        if well_formed {
            Ok(Self(s.to_owned()))
        } else {
            Err(ToposigError::InvalidSignatureId(s.to_owned()))
        }
    }
}

impl AsRef<str> for SignatureId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// =============================================================================
// CANONICAL ENCODING
// =============================================================================

/// Nested JSON view of a signature.
///
/// Each category maps to an array of `[name, [type, …]]` pairs in canonical
/// order.
#[must_use]
pub fn signature_value(sig: &Signature) -> Value {
    let mut root = Map::new();
    for kind in EndpointKind::ALL {
        let endpoints = sig
            .endpoints(kind)
            .iter()
            .map(|ep| {
                Value::Array(vec![
                    Value::String(ep.name().to_owned()),
                    Value::Array(ep.types().iter().cloned().map(Value::String).collect()),
                ])
            })
            .collect();
        root.insert(kind.canonical_key().to_owned(), Value::Array(endpoints));
    }
    Value::Object(root)
}

/// Encode a JSON value without whitespace and with object keys sorted
/// recursively.
///
/// Strings use standard JSON escapes; non-ASCII text is emitted as UTF-8.
#[must_use]
pub fn canonical_json(value: &Value) -> String {
    let mut out = String::new();
    write_canonical(value, &mut out);
    out
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Array(items) => {
            out.push('[');
            for (idx, item) in items.iter().enumerate() {
                if idx > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));

            out.push('{');
            for (idx, (key, item)) in entries.into_iter().enumerate() {
                if idx > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String(key.clone()).to_string());
                out.push(':');
                write_canonical(item, out);
            }
            out.push('}');
        }
        // Scalars: serde_json's compact Display.
        scalar => out.push_str(&scalar.to_string()),
    }
}

/// Canonical byte serialization of a signature.
#[must_use]
pub fn canonical_bytes(sig: &Signature) -> Vec<u8> {
    canonical_json(&signature_value(sig)).into_bytes()
}

// =============================================================================
// DIGESTS
// =============================================================================

/// Full 256-bit digest of the canonical serialization.
#[must_use]
pub fn full_digest(sig: &Signature) -> [u8; 32] {
    Sha256::digest(canonical_bytes(sig)).into()
}

/// Compute the identifier of a signature.
#[must_use]
pub fn signature_id(sig: &Signature) -> SignatureId {
    let mut hex = hex::encode(full_digest(sig));
    hex.truncate(SIGNATURE_ID_LEN);
    SignatureId(hex)
}

// =============================================================================
// TESTS
// =============================================================================
