//! Configuration loader — merges env vars, .env file, and config.toml.

use common::{AppConfig, Error};
use std::path::Path;

fn parse_positive_u64(raw: &str, env_name: &str) -> Result<u64, Error> {
    let parsed = raw
        .trim()
        .parse::<u64>()
        .map_err(|_| Error::Config(format!("{env_name} must be an integer > 0")))?;
    if parsed == 0 {
        return Err(Error::Config(format!("{env_name} must be an integer > 0")));
    }
    Ok(parsed)
}

fn parse_positive_u32(raw: &str, env_name: &str) -> Result<u32, Error> {
    let parsed = parse_positive_u64(raw, env_name)?;
    u32::try_from(parsed)
        .map_err(|_| Error::Config(format!("{env_name} must be at most {}", u32::MAX)))
}

fn validate_config(config: &AppConfig) -> Result<(), Error> {
    let mut issues: Vec<String> = Vec::new();

    if config.model_path.trim().is_empty() {
        issues.push("model_path must not be empty".into());
    }
    if config.openaq_base_url.trim().is_empty() {
        issues.push("openaq_base_url must not be empty".into());
    }
    if config.open_meteo_base_url.trim().is_empty() {
        issues.push("open_meteo_base_url must not be empty".into());
    }
    if config.search_radius_m == 0 {
        issues.push("search_radius_m must be > 0".into());
    }
    if config.provider_timeout_secs == 0 {
        issues.push("provider_timeout_secs must be > 0".into());
    }
    if config.cache_ttl_secs == 0 {
        issues.push("cache_ttl_secs must be > 0".into());
    }
    if config.history_ttl_secs == 0 {
        issues.push("history_ttl_secs must be > 0".into());
    }
    if config.history_max_entries == 0 {
        issues.push("history_max_entries must be > 0".into());
    }

    if issues.is_empty() {
        Ok(())
    } else {
        Err(Error::Config(format!(
            "Invalid config:\n - {}",
            issues.join("\n - ")
        )))
    }
}

/// Load service configuration from environment and optional config file.
pub fn load_config() -> Result<AppConfig, Error> {
    // 1. Load .env file if present.
    if let Err(e) = dotenvy::dotenv() {
        tracing::debug!("No .env file loaded: {}", e);
    }

    // 2. Start with defaults.
    let mut config = AppConfig::default();

    // 3. Try loading config.toml if it exists.
    let config_path = Path::new("config.toml");
    if config_path.exists() {
        let contents = std::fs::read_to_string(config_path)
            .map_err(|e| Error::Config(format!("Failed to read config.toml: {}", e)))?;
        config = toml::from_str(&contents)
            .map_err(|e| Error::Config(format!("Failed to parse config.toml: {}", e)))?;
    }

    // 4. Override with environment variables (highest priority).
    if let Ok(port) = std::env::var("PORT") {
        config.port = port
            .trim()
            .parse::<u16>()
            .map_err(|_| Error::Config("PORT must be an integer in [1, 65535]".into()))?;
    }
    if let Ok(path) = std::env::var("AQ_MODEL_PATH") {
        config.model_path = path;
    }
    if let Ok(url) = std::env::var("OPENAQ_BASE_URL") {
        config.openaq_base_url = url;
    }
    if let Ok(url) = std::env::var("OPEN_METEO_BASE_URL") {
        config.open_meteo_base_url = url;
    }
    if let Ok(raw) = std::env::var("AQ_SEARCH_RADIUS_M") {
        config.search_radius_m = parse_positive_u32(&raw, "AQ_SEARCH_RADIUS_M")?;
    }
    if let Ok(raw) = std::env::var("AQ_PROVIDER_TIMEOUT_SECS") {
        config.provider_timeout_secs = parse_positive_u64(&raw, "AQ_PROVIDER_TIMEOUT_SECS")?;
    }
    if let Ok(raw) = std::env::var("AQ_CACHE_TTL_SECS") {
        config.cache_ttl_secs = parse_positive_u64(&raw, "AQ_CACHE_TTL_SECS")?;
    }
    if let Ok(raw) = std::env::var("AQ_HISTORY_TTL_SECS") {
        config.history_ttl_secs = parse_positive_u64(&raw, "AQ_HISTORY_TTL_SECS")?;
    }
    if let Ok(raw) = std::env::var("AQ_HISTORY_MAX_ENTRIES") {
        config.history_max_entries = parse_positive_u64(&raw, "AQ_HISTORY_MAX_ENTRIES")? as usize;
    }

    // 5. Validate.
    validate_config(&config)?;

    Ok(config)
}
