//! Open-Meteo forecast client.
//!
//! Fetches hourly weather conditions for a coordinate. The prediction
//! pipeline only records whether this fetch succeeded; the readings never
//! enter the feature vector.

use common::{Error, WeatherSnapshot};
use serde::Deserialize;
use tracing::debug;

pub const DEFAULT_BASE_URL: &str = "https://api.open-meteo.com/v1";

const HOURLY_PARAMS: &str = "temperature_2m,relative_humidity_2m,wind_speed_10m";

/// Open-Meteo client with connection pooling and a request timeout.
#[derive(Debug, Clone)]
pub struct OpenMeteoClient {
    client: reqwest::Client,
    base_url: String,
}

// ── Open-Meteo response types ─────────────────────────────────────────

/// Response from `/forecast?latitude=..&longitude=..&hourly=..`.
#[derive(Debug, Deserialize)]
pub struct ForecastResponse {
    #[serde(default)]
    pub hourly: Option<HourlySeries>,
}

#[derive(Debug, Deserialize)]
pub struct HourlySeries {
    #[serde(default)]
    pub temperature_2m: Vec<f64>,
    #[serde(default)]
    pub relative_humidity_2m: Vec<f64>,
    #[serde(default)]
    pub wind_speed_10m: Vec<f64>,
}

// ── Implementation ────────────────────────────────────────────────────

impl OpenMeteoClient {
    pub fn new(base_url: impl Into<String>, timeout: std::time::Duration) -> Self {
        let client = reqwest::Client::builder()
            .user_agent("airqualify/0.1 (air quality backend)")
            .pool_max_idle_per_host(4)
            .timeout(timeout)
            .build()
            .expect("failed to build Open-Meteo HTTP client");

        Self {
            client,
            base_url: base_url.into(),
        }
    }

    /// Fetch current conditions for a coordinate (first hour of the
    /// hourly forecast).
    pub async fn current_weather(&self, lat: f64, lon: f64) -> Result<WeatherSnapshot, Error> {
        let url = format!(
            "{}/forecast?latitude={}&longitude={}&hourly={}",
            self.base_url, lat, lon, HOURLY_PARAMS
        );

        debug!("Fetching Open-Meteo forecast: {}", url);

        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::OpenMeteo(format!("HTTP error for ({lat},{lon}): {e}")))?;

        let status = resp.status().as_u16();
        if status != 200 {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::OpenMeteo(format!(
                "Open-Meteo returned {} for ({},{}): {}",
                status,
                lat,
                lon,
                clip_body(&body)
            )));
        }

        let data: ForecastResponse = resp
            .json()
            .await
            .map_err(|e| Error::OpenMeteo(format!("JSON parse error for ({lat},{lon}): {e}")))?;

        Ok(snapshot_from_response(&data))
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

/// Take the first hour of each series as the current conditions.
pub fn snapshot_from_response(resp: &ForecastResponse) -> WeatherSnapshot {
    let Some(hourly) = &resp.hourly else {
        return WeatherSnapshot::default();
    };

    WeatherSnapshot {
        temperature_c: hourly.temperature_2m.first().copied(),
        humidity_pct: hourly.relative_humidity_2m.first().copied(),
        wind_speed_ms: hourly.wind_speed_10m.first().copied(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_response() -> &'static str {
        r#"{
            "latitude": 40.71,
            "longitude": -74.0,
            "hourly": {
                "time": ["2026-08-25T00:00", "2026-08-25T01:00"],
                "temperature_2m": [21.4, 20.9],
                "relative_humidity_2m": [63.0, 66.0],
                "wind_speed_10m": [3.2, 2.8]
            }
        }"#
    }

    #[test]
    fn test_deserialize_forecast_response() {
        let parsed: ForecastResponse =
            serde_json::from_str(sample_response()).expect("response should deserialize");
        let hourly = parsed.hourly.as_ref().expect("hourly present");
        assert_eq!(hourly.temperature_2m.len(), 2);
    }

    #[test]
    fn test_snapshot_takes_first_hour() {
        let parsed: ForecastResponse = serde_json::from_str(sample_response()).unwrap();
        let snap = snapshot_from_response(&parsed);
        assert_eq!(snap.temperature_c, Some(21.4));
        assert_eq!(snap.humidity_pct, Some(63.0));
        assert_eq!(snap.wind_speed_ms, Some(3.2));
    }

    #[test]
    fn test_snapshot_tolerates_missing_hourly() {
        let parsed: ForecastResponse = serde_json::from_str(r#"{"latitude": 1.0}"#).unwrap();
        let snap = snapshot_from_response(&parsed);
        assert_eq!(snap.temperature_c, None);
    }

    #[test]
    fn test_clip_body_respects_char_boundaries() {
        // 200 three-byte chars (600 bytes); byte 500 lands mid-character.
        let body = "€".repeat(200);
        let clipped = clip_body(&body);
        assert_eq!(clipped.len(), 498);

        assert_eq!(clip_body(""), "");
        let ascii = "x".repeat(600);
        assert_eq!(clip_body(&ascii).len(), 500);
    }
}
