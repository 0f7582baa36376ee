//! Air-quality prediction backend.
//!
//! Single-binary Tokio application that:
//! 1. Loads configuration and kicks off the one-time model load
//! 2. Serves `POST /predict`, `GET /predict/history`, `GET /alerts`
//! 3. Aggregates OpenAQ and Open-Meteo per request, with defaults on
//!    provider failure
//! 4. Memoizes results for 60 s and keeps a 30-entry rolling history
//!    per location

mod config;
mod routes;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::routing::{get, post};
use axum::Router;
use clap::Parser;
use tracing::{error, info};

use open_meteo_client::OpenMeteoClient;
use openaq_client::OpenAqClient;
use prediction::{load_model, DataAggregator, ModelHandle, PredictionService, SystemClock};
use routes::AppState;

/// Air quality prediction backend
#[derive(Parser)]
#[command(name = "airqualify", about = "Air quality prediction backend")]
struct Cli {
    /// Just load the model file, report the outcome, then exit.
    #[arg(long)]
    check_model: bool,
}

#[tokio::main]
async fn main() {
    // Initialize logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "airqualify=info,prediction=info,openaq_client=info,open_meteo_client=info".into()
            }),
        )
        .with_target(true)
        .init();

    let cli = Cli::parse();

    // Load configuration.
    let cfg = match config::load_config() {
        Ok(c) => c,
        Err(e) => {
            error!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    let model_path = PathBuf::from(&cfg.model_path);

    // ── Check-model mode ─────────────────────────────────────────────
    if cli.check_model {
        match load_model(&model_path) {
            Ok(_) => {
                info!("✅ Model at {} loads cleanly", model_path.display());
            }
            Err(e) => {
                error!("❌ Model check failed: {}", e);
                std::process::exit(1);
            }
        }
        return;
    }

    info!("🌫️  Air-quality backend starting up...");
    info!(
        "Providers: OpenAQ at {} (radius {} m), Open-Meteo at {}, timeout {}s",
        cfg.openaq_base_url, cfg.search_radius_m, cfg.open_meteo_base_url,
        cfg.provider_timeout_secs,
    );
    info!(
        "Caching: results {}s, history {}s / {} entries",
        cfg.cache_ttl_secs, cfg.history_ttl_secs, cfg.history_max_entries,
    );

    // One-time asynchronous model load. Requests that arrive before it
    // completes get an explicit not-ready error, never a fallback AQI.
    let model = ModelHandle::new();
    {
        let model = model.clone();
        let path = model_path.clone();
        tokio::task::spawn_blocking(move || match load_model(&path) {
            Ok(loaded) => {
                model.set_ready(loaded);
                info!("✅ Model loaded successfully from {}", path.display());
            }
            Err(e) => {
                error!("Model load failed: {}", e);
                model.set_failed(e.to_string());
            }
        });
    }

    let provider_timeout = Duration::from_secs(cfg.provider_timeout_secs);
    let aggregator = DataAggregator::new(
        OpenAqClient::new(&cfg.openaq_base_url, cfg.search_radius_m, provider_timeout),
        OpenMeteoClient::new(&cfg.open_meteo_base_url, provider_timeout),
        provider_timeout,
    );
    let service = PredictionService::new(
        aggregator,
        model,
        Arc::new(SystemClock),
        chrono::Duration::seconds(cfg.cache_ttl_secs as i64),
        chrono::Duration::seconds(cfg.history_ttl_secs as i64),
        cfg.history_max_entries,
    );
    let state = Arc::new(AppState { service });

    let app = Router::new()
        .route("/", get(routes::root))
        .route("/predict", post(routes::predict))
        .route("/predict/history", get(routes::history))
        .route("/alerts", get(routes::alerts))
        .with_state(state);

    let addr = format!("0.0.0.0:{}", cfg.port);
    info!("🚀 Air-quality backend listening on {}", addr);

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(l) => l,
        Err(e) => {
            error!("Failed to bind {}: {}", addr, e);
            std::process::exit(1);
        }
    };

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!("Server error: {}", e);
    }

    info!("Air-quality backend shut down.");
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
    } else {
        info!("Shutdown signal received");
    }
}
