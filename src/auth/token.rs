//! Session token signer and core verifier (RustCrypto `hmac`/`sha2`).
//!
//! Token layout: `base64url(header) . base64url(payload) . base64url(mac)`
//! where the MAC is HMAC-SHA256 over the first two segments joined by `.`.
//! The header is the fixed `{"alg":"HS256","typ":"JWT"}` object; the payload
//! carries exactly `sub` (identity) and `exp` (epoch milliseconds).
//!
//! Verification collapses every failure — wrong segment count, bad encoding,
//! MAC mismatch, unparseable payload, expiry, foreign subject — into a
//! single opaque `None`. Callers must not learn *why* a token failed.

use std::time::Duration;

use anyhow::Result;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use super::{codec, epoch_ms, Identity};

type HmacSha256 = Hmac<Sha256>;

/// Fixed token header. Serialized field order matters: both verifiers and
/// the conformance vectors assume `{"alg":"HS256","typ":"JWT"}` byte-exact.
#[derive(Debug, Serialize)]
struct Header {
    alg: &'static str,
    typ: &'static str,
}

const HEADER: Header = Header {
    alg: "HS256",
    typ: "JWT",
};

/// Token payload. Field order is part of the wire format (see [`Header`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Token subject; must be a recognized identity.
    pub sub: Identity,
    /// Absolute expiry, epoch milliseconds.
    pub exp: u64,
}

/// Issues and verifies session tokens against the process signing secret.
pub struct SessionSigner {
    secret: Vec<u8>,
}

impl SessionSigner {
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// Issue a token for `subject`, valid for `validity` from now.
    pub fn issue(&self, subject: Identity, validity: Duration) -> Result<String> {
        self.issue_at(subject, epoch_ms() + validity.as_millis() as u64)
    }

    /// Issue a token with an explicit expiry timestamp.
    ///
    /// Deterministic for a fixed (secret, subject, exp) triple — the
    /// conformance vectors rely on byte-identical output.
    pub fn issue_at(&self, subject: Identity, exp_ms: u64) -> Result<String> {
        let header = codec::encode(serde_json::to_vec(&HEADER)?);
        let payload = codec::encode(serde_json::to_vec(&Claims {
            sub: subject,
            exp: exp_ms,
        })?);

        let mut mac = HmacSha256::new_from_slice(&self.secret)?;
        mac.update(header.as_bytes());
        mac.update(b".");
        mac.update(payload.as_bytes());
        let sig = codec::encode(mac.finalize().into_bytes());

        Ok(format!("{header}.{payload}.{sig}"))
    }

    /// Verify a token against the current wall clock.
    pub fn verify(&self, token: &str) -> Option<Identity> {
        self.verify_at(token, epoch_ms())
    }

    /// Verify a token at an explicit point in time.
    ///
    /// Pure function of (token, secret, now): no I/O, safe on any thread.
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

        // Compare decoded MAC bytes, not encoded strings, and do it in
        // constant time (`verify_slice`) before touching the payload.
        let sig = codec::decode(sig).ok()?;
        let mut mac = HmacSha256::new_from_slice(&self.secret).ok()?;
        mac.update(header.as_bytes());
        mac.update(b".");
        mac.update(payload.as_bytes());
        mac.verify_slice(&sig).ok()?;

        let claims: Claims = serde_json::from_slice(&codec::decode(payload).ok()?).ok()?;
        if now_ms > claims.exp {
            return None;
        }
        Some(claims.sub)
    }
}
