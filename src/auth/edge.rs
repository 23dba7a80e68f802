//! Request-gate verifier, independently implemented on `ring`.
//!
//! Deliberately does not reuse [`super::token`]'s crypto: the gate screens
//! requests before they reach application handlers, and the whole point of
//! keeping two implementations is that neither can silently drift — the
//! conformance suite in `tests/conformance.rs` holds them to byte-identical
//! accept/reject behavior.
//!
//! Verification only. The edge never issues tokens.

use ring::hmac;
use serde_json::Value;

use super::{codec, epoch_ms, Identity};

/// Verifies session tokens for the request gate.
pub struct EdgeVerifier {
    key: hmac::Key,
}

impl EdgeVerifier {
    pub fn new(secret: &[u8]) -> Self {
        Self {
            key: hmac::Key::new(hmac::HMAC_SHA256, secret),
        }
    }

    /// Verify a token against the current wall clock.
    pub fn verify(&self, token: &str) -> Option<Identity> {
        self.verify_at(token, epoch_ms())
    }

    /// Verify a token at an explicit point in time.
    ///
    /// Same contract as `SessionSigner::verify_at`: every failure is the
    /// same opaque `None`, and the MAC check runs in constant time
    /// (`ring::hmac::verify`) over the decoded signature bytes.
    pub fn verify_at(&self, token: &str, now_ms: u64) -> Option<Identity> {
        let mut segments = token.split('.');
        let (Some(header), Some(payload), Some(sig), None) = (
            segments.next(),
            segments.next(),
            segments.next(),
            segments.next(),
        ) else {
            return None;
        };

        let sig = codec::decode(sig).ok()?;
        let mut signing_input = Vec::with_capacity(header.len() + payload.len() + 1);
        signing_input.extend_from_slice(header.as_bytes());
        signing_input.push(b'.');
        signing_input.extend_from_slice(payload.as_bytes());
        hmac::verify(&self.key, &signing_input, &sig).ok()?;

        let claims: Value = serde_json::from_slice(&codec::decode(payload).ok()?).ok()?;
        let exp = claims.get("exp")?.as_u64()?;
        if now_ms > exp {
            return None;
        }
        Identity::parse(claims.get("sub")?.as_str()?)
    }
}
