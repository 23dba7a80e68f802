//! Home Assistant REST client.
//!
//! Wraps the two endpoints the gateway proxies: `GET /api/states` and
//! `POST /api/services/{domain}/{service}`. Every request carries the
//! long-lived access token as a bearer header; the token never reaches the
//! browser.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Outbound request timeout for Home Assistant calls.
const HA_TIMEOUT_SECS: u64 = 10;

/// One entity state as reported by Home Assistant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HaState {
    pub entity_id: String,
    pub state: String,
    #[serde(default)]
    pub attributes: Value,
    #[serde(default)]
    pub last_changed: String,
    #[serde(default)]
    pub last_updated: String,
}

/// HTTP client for the local Home Assistant instance.
pub struct HaClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

impl HaClient {
    pub fn new(base_url: String, token: String) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(HA_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            http,
            base_url,
            token,
        })
    }

    /// Fetch all entity states.
    pub async fn states(&self) -> Result<Vec<HaState>> {
        let url = format!("{}/api/states", self.base_url);
        let resp = self
            .http
            .get(&url)
            .bearer_auth(&self.token)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("Home Assistant returned {status}: {body}");
        }

        Ok(resp.json().await?)
    }

    /// Invoke a service, e.g. `light.turn_on`, with the given payload.
    pub async fn call_service(&self, domain: &str, service: &str, payload: &Value) -> Result<Value> {
        let url = format!("{}/api/services/{domain}/{service}", self.base_url);
        let resp = self
            .http
            .post(&url)
            .bearer_auth(&self.token)
            .json(payload)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("Home Assistant returned {status}: {body}");
        }

        Ok(resp.json().await?)
    }
}
