//! Process configuration, loaded once at startup from the environment.
//!
//! Every component reads secrets through the shared [`Config`] value — never
//! straight from `std::env` at request time — so the signer, the edge
//! verifier, and the credential store cannot drift onto different secret
//! sources.

use anyhow::{anyhow, Result};

/// Immutable process-wide configuration.
///
/// All fields are required; [`Config::from_env`] fails naming the first
/// missing variable rather than limping along with a partial setup.
#[derive(Debug, Clone)]
pub struct Config {
    /// HMAC signing secret shared by both verifier implementations.
    pub auth_secret: String,
    /// PIN for the `hannes` identity.
    pub hannes_pin: String,
    /// PIN for the `elvira` identity.
    pub elvira_pin: String,
    /// Base URL of the Home Assistant instance (e.g. `http://ha.local:8123`).
    pub ha_url: String,
    /// Long-lived Home Assistant access token.
    pub ha_token: String,
    /// Latitude for the SMHI point forecast.
    pub smhi_lat: String,
    /// Longitude for the SMHI point forecast.
    pub smhi_lon: String,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary lookup function.
    ///
    /// `from_env` is a thin wrapper over this; tests supply closures instead
    /// of mutating the process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let require = |key: &str| {
            lookup(key)
                .filter(|value| !value.is_empty())
                .ok_or_else(|| anyhow!("missing required environment variable {key}"))
        };

        Ok(Self {
            auth_secret: require("AUTH_SECRET")?,
            hannes_pin: require("HANNES_PIN")?,
            elvira_pin: require("ELVIRA_PIN")?,
            ha_url: require("HA_URL")?.trim_end_matches('/').to_owned(),
            ha_token: require("HA_TOKEN")?,
            smhi_lat: require("SMHI_LAT")?,
            smhi_lon: require("SMHI_LON")?,
        })
    }
}
