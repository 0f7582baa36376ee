//! Domain types shared across the service.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

// ── Location ──────────────────────────────────────────────────────────

/// A geographic point, as supplied by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub lat: f64,
    pub lon: f64,
}

/// Round a coordinate to 4 decimal places (~11 m), collapsing `-0.0`
/// into `0.0` so equal points always produce equal keys.
fn canonical_coord(v: f64) -> f64 {
    (v * 1e4).round() / 1e4 + 0.0
}

impl Location {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Reject non-finite or out-of-range coordinates.
    pub fn validate(&self) -> crate::Result<()> {
        if !self.lat.is_finite() || !(-90.0..=90.0).contains(&self.lat) {
            return Err(crate::Error::Validation(format!(
                "lat must be a number in [-90, 90], got {}",
                self.lat
            )));
        }
        if !self.lon.is_finite() || !(-180.0..=180.0).contains(&self.lon) {
            return Err(crate::Error::Validation(format!(
                "lon must be a number in [-180, 180], got {}",
                self.lon
            )));
        }
        Ok(())
    }

    /// Canonical cache/history key. Coordinates are normalized to a fixed
    /// precision before concatenation so `40.71280001` and `40.7128` hit
    /// the same entry.
    pub fn key(&self) -> String {
        format!(
            "{:.4}:{:.4}",
            canonical_coord(self.lat),
            canonical_coord(self.lon)
        )
    }
}

// ── Measurements ──────────────────────────────────────────────────────

/// Pollutant readings as they come back from a provider; any field may be
/// missing when the nearest station does not report that parameter.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RawMeasurements {
    pub pm10: Option<f64>,
    pub pm25: Option<f64>,
    pub no2: Option<f64>,
    pub so2: Option<f64>,
    pub co: Option<f64>,
    pub ozone: Option<f64>,
}

/// A complete pollutant measurement set, defaults substituted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MeasurementSet {
    pub pm10: f64,
    pub pm25: f64,
    pub no2: f64,
    pub so2: f64,
    pub co: f64,
    pub ozone: f64,
}

impl MeasurementSet {
    /// Fallback values used whenever a provider reading is missing.
    pub const DEFAULTS: MeasurementSet = MeasurementSet {
        pm10: 10.0,
        pm25: 10.0,
        no2: 5.0,
        so2: 5.0,
        co: 0.2,
        ozone: 10.0,
    };

    /// Fill in defaults for any reading the provider did not supply.
    pub fn from_partial(raw: &RawMeasurements) -> Self {
        Self {
            pm10: raw.pm10.unwrap_or(Self::DEFAULTS.pm10),
            pm25: raw.pm25.unwrap_or(Self::DEFAULTS.pm25),
            no2: raw.no2.unwrap_or(Self::DEFAULTS.no2),
            so2: raw.so2.unwrap_or(Self::DEFAULTS.so2),
            co: raw.co.unwrap_or(Self::DEFAULTS.co),
            ozone: raw.ozone.unwrap_or(Self::DEFAULTS.ozone),
        }
    }

    /// Model input in the fixed order the model was trained with:
    /// `[pm10, pm25, no2, so2, co, ozone]`.
    pub fn feature_vector(&self) -> [f32; 6] {
        [
            self.pm10 as f32,
            self.pm25 as f32,
            self.no2 as f32,
            self.so2 as f32,
            self.co as f32,
            self.ozone as f32,
        ]
    }
}

/// Weather conditions from the forecast provider. Recorded as a source
/// status signal only; none of these fields reach the feature vector.
#[derive(Debug, Clone, Copy, Default)]
pub struct WeatherSnapshot {
    pub temperature_c: Option<f64>,
    pub humidity_pct: Option<f64>,
    pub wind_speed_ms: Option<f64>,
}

// ── Prediction results ────────────────────────────────────────────────

/// Per-provider fetch outcome attached to every prediction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceStatus {
    pub name: String,
    pub ok: bool,
}

/// A full prediction response. Immutable once built; stored verbatim in
/// the result cache.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionResult {
    pub location: Location,
    pub ts: DateTime<Utc>,
    pub aqi: f64,
    pub alert: String,
    #[serde(flatten)]
    pub measurements: MeasurementSet,
    pub sources: Vec<SourceStatus>,
    /// True only when served from the result cache.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub cached: bool,
}

/// One day's observation in a location's rolling history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub date: NaiveDate,
    pub aqi: f64,
    #[serde(flatten)]
    pub measurements: MeasurementSet,
}

/// Coarse alert-path classification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertStatus {
    pub alert: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}
