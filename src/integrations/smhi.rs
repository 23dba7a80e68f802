//! SMHI point-forecast fetch.
//!
//! Pulls the pmp3g forecast for the configured coordinates and reduces the
//! first time-series entry to the four values the dashboard cares about:
//! temperature, wind speed, median precipitation, and mean cloud cover.

use anyhow::{anyhow, Result};
use serde::Serialize;
use serde_json::Value;

const SMHI_BASE: &str =
    "https://opendata-download-metfcst.smhi.se/api/category/pmp3g/version/2/geotype/point";

/// Outbound request timeout for forecast fetches.
const SMHI_TIMEOUT_SECS: u64 = 10;

/// Current conditions extracted from the first forecast time step.
///
/// Individual parameters are optional: SMHI occasionally omits one, and a
/// partial reading is still worth rendering.
#[derive(Debug, Clone, Serialize)]
pub struct WeatherNow {
    pub temp: Option<f64>,
    pub wind: Option<f64>,
    pub precip: Option<f64>,
    pub cloud: Option<f64>,
    #[serde(rename = "validTime")]
    pub valid_time: String,
}

/// HTTP client for the SMHI open-data forecast API.
pub struct SmhiClient {
    http: reqwest::Client,
    base_url: String,
    lat: String,
    lon: String,
}

impl SmhiClient {
    pub fn new(lat: String, lon: String) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(SMHI_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            http,
            base_url: SMHI_BASE.to_owned(),
            lat,
            lon,
        })
    }

    /// Override the API base URL (tests point this at a mock server).
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    /// Fetch the forecast and reduce it to current conditions.
    pub async fn current(&self) -> Result<WeatherNow> {
        let url = format!(
            "{}/lon/{}/lat/{}/data.json",
            self.base_url, self.lon, self.lat
        );
        let resp = self.http.get(&url).send().await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("SMHI returned {status}: {body}");
        }

        let forecast: Value = resp.json().await?;
        extract_now(&forecast)
    }
}

/// Reduce a raw SMHI forecast document to [`WeatherNow`].
fn extract_now(forecast: &Value) -> Result<WeatherNow> {
    let step = forecast
        .get("timeSeries")
        .and_then(|series| series.get(0))
        .ok_or_else(|| anyhow!("SMHI forecast has no timeSeries"))?;

    let parameter = |name: &str| -> Option<f64> {
        step.get("parameters")?
            .as_array()?
            .iter()
            .find(|p| p.get("name").and_then(Value::as_str) == Some(name))?
            .get("values")?
            .get(0)?
            .as_f64()
    };

    Ok(WeatherNow {
        temp: parameter("t"),
        wind: parameter("ws"),
        precip: parameter("pmedian"),
        cloud: parameter("tcc_mean"),
        valid_time: step
            .get("validTime")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_owned(),
    })
}
