//! # Token Sequencer
//!
//! Renders a [`Signature`] as a lazy sequence of endpoint tokens:
//!
//! ```text
//! <prefix>|<endpoint-name>[|<comma-joined-sorted-types>]
//! ```
//!
//! Prefixes are `P`, `S`, `SV` and `C` for publishers, subscribers, services
//! and clients. Categories are emitted in that order, endpoints in canonical
//! order. With types requested, an endpoint without types renders as
//! [`UNKNOWN_TYPE`].

use crate::canonical::CanonicalEndpoint;
use crate::signature::Signature;
use crate::types::EndpointKind;
use std::iter::FusedIterator;

/// Type suffix for endpoints that report no type.
pub const UNKNOWN_TYPE: &str = "<unknown>";

/// Separator between token fields.
pub const TOKEN_SEPARATOR: char = '|';

/// Render a single endpoint token.
#[must_use]
pub fn endpoint_token(kind: EndpointKind, endpoint: &CanonicalEndpoint, include_types: bool) -> String {
    let mut token = String::with_capacity(endpoint.name().len() + 4);
    token.push_str(kind.token_prefix());
    token.push(TOKEN_SEPARATOR);
    token.push_str(endpoint.name());

    if include_types {
        token.push(TOKEN_SEPARATOR);
        if endpoint.is_untyped() {
            token.push_str(UNKNOWN_TYPE);
        } else {
            token.push_str(&endpoint.types().join(","));
        }
    }
    token
}

/// Lazy token iterator over one signature.
///
/// Borrowing the signature makes the sequence restartable: call
/// [`Signature::tokens`] again to get a fresh pass.
#[derive(Debug, Clone)]
pub struct Tokens<'a> {
    signature: &'a Signature,
    include_types: bool,
    kind: usize,
    endpoint: usize,
    remaining: usize,
}

impl<'a> Tokens<'a> {
    pub(crate) fn new(signature: &'a Signature, include_types: bool) -> Self {
        Self {
            signature,
            include_types,
            kind: 0,
            endpoint: 0,
            remaining: signature.endpoint_count(),
        }
    }
}

impl Iterator for Tokens<'_> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        while let Some(kind) = EndpointKind::ALL.get(self.kind).copied() {
            if let Some(ep) = self.signature.endpoints(kind).as_slice().get(self.endpoint) {
                self.endpoint += 1;
                self.remaining = self.remaining.saturating_sub(1);
                return Some(endpoint_token(kind, ep, self.include_types));
            }
            self.kind += 1;
            self.endpoint = 0;
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for Tokens<'_> {}

impl FusedIterator for Tokens<'_> {}

// =============================================================================
// TESTS
// =============================================================================
