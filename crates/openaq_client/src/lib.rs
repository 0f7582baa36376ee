//! OpenAQ API client.
//!
//! Fetches the latest pollutant measurements from monitoring stations near
//! a coordinate via `api.openaq.org` and maps them to the shared
//! `RawMeasurements` format. Stations rarely report every parameter, so
//! every field comes back optional; default substitution happens in the
//! aggregator, not here.

use common::{Error, RawMeasurements};
use serde::Deserialize;
use tracing::debug;

pub const DEFAULT_BASE_URL: &str = "https://api.openaq.org/v2";

/// OpenAQ client with connection pooling and a request timeout.
#[derive(Debug, Clone)]
pub struct OpenAqClient {
    client: reqwest::Client,
    base_url: String,
    radius_m: u32,
}

// ── OpenAQ response types ─────────────────────────────────────────────

/// Response from `/latest?coordinates={lat},{lon}&radius={r}`.
#[derive(Debug, Deserialize)]
pub struct LatestResponse {
    #[serde(default)]
    pub results: Vec<StationResult>,
}

/// Latest readings reported by one station.
#[derive(Debug, Deserialize)]
pub struct StationResult {
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub measurements: Vec<Measurement>,
}

#[derive(Debug, Deserialize)]
pub struct Measurement {
    pub parameter: String,
    pub value: f64,
    #[serde(default)]
    pub unit: Option<String>,
}

// ── Implementation ────────────────────────────────────────────────────

impl OpenAqClient {
    pub fn new(base_url: impl Into<String>, radius_m: u32, timeout: std::time::Duration) -> Self {
        let client = reqwest::Client::builder()
            .user_agent("airqualify/0.1 (air quality backend)")
            .pool_max_idle_per_host(4)
            .timeout(timeout)
            .build()
            .expect("failed to build OpenAQ HTTP client");

        Self {
            client,
            base_url: base_url.into(),
            radius_m,
        }
    }

    /// Fetch the latest pollutant readings near a coordinate.
    pub async fn latest_measurements(&self, lat: f64, lon: f64) -> Result<RawMeasurements, Error> {
        let url = format!(
            "{}/latest?coordinates={},{}&radius={}",
            self.base_url, lat, lon, self.radius_m
        );

        debug!("Fetching OpenAQ latest: {}", url);

        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::OpenAq(format!("HTTP error for ({lat},{lon}): {e}")))?;

        let status = resp.status().as_u16();
        if status != 200 {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::OpenAq(format!(
                "OpenAQ returned {} for ({},{}): {}",
                status,
                lat,
                lon,
                clip_body(&body)
            )));
        }

        let data: LatestResponse = resp
            .json()
            .await
            .map_err(|e| Error::OpenAq(format!("JSON parse error for ({lat},{lon}): {e}")))?;

        debug!(
            "OpenAQ returned {} stations near ({},{})",
            data.results.len(),
            lat,
            lon
        );

        Ok(extract_readings(&data))
    }
}

const ERROR_BODY_LIMIT: usize = 500;

/// Clip an upstream error body for the error message without splitting a
/// UTF-8 character.
fn clip_body(body: &str) -> &str {
    let mut end = body.len().min(ERROR_BODY_LIMIT);
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    &body[..end]
}

/// Map the nearest station's measurement list onto the shared pollutant
/// fields. OpenAQ names ozone `o3`; everything else matches our field
/// names directly.
pub fn extract_readings(resp: &LatestResponse) -> RawMeasurements {
    let mut readings = RawMeasurements::default();

    let Some(station) = resp.results.first() else {
        return readings;
    };

    for m in &station.measurements {
        let slot = match m.parameter.as_str() {
            "pm10" => &mut readings.pm10,
            "pm25" => &mut readings.pm25,
            "no2" => &mut readings.no2,
            "so2" => &mut readings.so2,
            "co" => &mut readings.co,
            "o3" => &mut readings.ozone,
            _ => continue,
        };
        if slot.is_none() {
            *slot = Some(m.value);
        }
    }

    readings
}
