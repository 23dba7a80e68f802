//! Fixed credential store: one PIN per recognized identity.
//!
//! Loaded once from [`Config`](crate::config::Config) at startup and shared
//! immutably; there is no registration, rotation, or lockout. PIN comparison
//! is constant-time so response timing never narrows down a guess.

use crate::config::Config;

use super::Identity;

/// Holds the PIN for every recognized identity.
pub struct CredentialStore {
    pins: Vec<(Identity, String)>,
}

impl CredentialStore {
    pub fn new(pins: Vec<(Identity, String)>) -> Self {
        Self { pins }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(vec![
            (Identity::Hannes, config.hannes_pin.clone()),
            (Identity::Elvira, config.elvira_pin.clone()),
        ])
    }

    /// True iff `pin` matches the stored PIN for `identity`.
    ///
    /// Constant-time with respect to the stored PIN's bytes. Length is not
    /// hidden; PINs of different length fail fast, which leaks nothing a
    /// caller could not learn from the login form's own length rules.
    pub fn validate_pin(&self, identity: Identity, pin: &str) -> bool {
        self.pins
            .iter()
            .find(|(id, _)| *id == identity)
            .map(|(_, stored)| constant_time_eq(stored.as_bytes(), pin.as_bytes()))
            .unwrap_or(false)
    }
}

/// Constant-time byte equality for equal-length inputs.
pub(crate) fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b) {
        diff |= x ^ y;
    }
    diff == 0
}
