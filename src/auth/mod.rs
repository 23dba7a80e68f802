//! Stateless session authentication.
//!
//! A session is a compact three-segment token (`header.payload.signature`,
//! each segment base64url without padding) signed with HMAC-SHA256. Nothing
//! is stored server-side; the token itself proves the identity until its
//! embedded expiry.
//!
//! Two verifier implementations exist on purpose:
//! - [`token::SessionSigner`] — issues tokens and verifies them with the
//!   RustCrypto `hmac`/`sha2` stack (login + session introspection);
//! - [`edge::EdgeVerifier`] — verification only, built on `ring`, used by
//!   the request gate that screens every inbound request.
//!
//! They are one algorithm realized twice. `tests/conformance.rs` runs a
//! shared vector table against both; any divergence there is a security bug,
//! not a style difference.

pub mod codec;
pub mod edge;
pub mod store;
pub mod token;

use std::fmt;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "ha_app_session";

/// Default session lifetime: 7 days.
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Minimum accepted PIN length. Anything shorter is a formatting error
/// (400), rejected before credentials are ever consulted.
pub const MIN_PIN_LEN: usize = 4;

/// A recognized household member.
///
/// The set is closed: only these values may ever appear as a token subject,
/// and tokens naming anything else are invalid regardless of signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Identity {
    Hannes,
    Elvira,
}

impl Identity {
    /// Every recognized identity.
    pub const ALL: [Identity; 2] = [Identity::Hannes, Identity::Elvira];

    /// The wire name of this identity (token `sub` value, login `user` field).
    pub fn as_str(self) -> &'static str {
        match self {
            Identity::Hannes => "hannes",
            Identity::Elvira => "elvira",
        }
    }

    /// Parse a wire name back into an identity. `None` for anything outside
    /// the closed set.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "hannes" => Some(Identity::Hannes),
            "elvira" => Some(Identity::Elvira),
            _ => None,
        }
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Current wall-clock time as epoch milliseconds (the unit token `exp`
/// claims are expressed in).
pub(crate) fn epoch_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
