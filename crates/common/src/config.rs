//! Service configuration schema.

use serde::Deserialize;

/// Full service configuration. Loaded by the binary from defaults,
/// optional `config.toml`, and environment overrides.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// HTTP listen port.
    pub port: u16,
    /// Path to the regression model coefficients file.
    pub model_path: String,
    /// OpenAQ API base URL.
    pub openaq_base_url: String,
    /// Open-Meteo API base URL.
    pub open_meteo_base_url: String,
    /// Station search radius around the requested point, in meters.
    pub search_radius_m: u32,
    /// Per-provider fetch budget; a timeout counts as provider failure.
    pub provider_timeout_secs: u64,
    /// Result cache TTL.
    pub cache_ttl_secs: u64,
    /// History series TTL, reset on every write.
    pub history_ttl_secs: u64,
    /// Maximum entries retained per location history.
    pub history_max_entries: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            model_path: "model/aqi_model.json".to_string(),
            openaq_base_url: "https://api.openaq.org/v2".to_string(),
            open_meteo_base_url: "https://api.open-meteo.com/v1".to_string(),
            search_radius_m: 5_000,
            provider_timeout_secs: 10,
            cache_ttl_secs: 60,
            history_ttl_secs: 24 * 60 * 60,
            history_max_entries: 30,
        }
    }
}
