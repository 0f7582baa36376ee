//! HTTP surface — thin routing over the prediction service.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use common::{Error, Location};
use open_meteo_client::OpenMeteoClient;
use openaq_client::OpenAqClient;
use prediction::PredictionService;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

pub type Service = PredictionService<OpenAqClient, OpenMeteoClient>;

pub struct AppState {
    pub service: Service,
}

/// Coordinates as they arrive from a JSON body or query string; both
/// fields optional so missing input maps to a 400 rather than a
/// deserialization rejection.
#[derive(Debug, Default, Clone, Copy, Deserialize)]
pub struct CoordParams {
    pub lat: Option<f64>,
    pub lon: Option<f64>,
}

/// Body coordinates win; query params are the fallback variant.
fn resolve_location(body: CoordParams, query: CoordParams) -> Option<Location> {
    let lat = body.lat.or(query.lat)?;
    let lon = body.lon.or(query.lon)?;
    Some(Location::new(lat, lon))
}

fn internal_error(err: &Error) -> (StatusCode, Json<Value>) {
    match err {
        Error::Validation(msg) => (StatusCode::BAD_REQUEST, Json(json!({ "error": msg }))),
        _ => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "internal_error", "details": err.to_string() })),
        ),
    }
}

pub async fn root() -> &'static str {
    "Air-Qualify Backend is running"
}

/// `POST /predict` — body `{lat, lon}`, query params accepted as a
/// fallback.
pub async fn predict(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CoordParams>,
    body: Option<Json<CoordParams>>,
) -> (StatusCode, Json<Value>) {
    let body = body.map(|Json(b)| b).unwrap_or_default();
    let Some(location) = resolve_location(body, query) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "lat & lon required" })),
        );
    };

    match state.service.predict(location).await {
        Ok(result) => match serde_json::to_value(&result) {
            Ok(value) => (StatusCode::OK, Json(value)),
            Err(e) => internal_error(&Error::Json(e)),
        },
        Err(e) => internal_error(&e),
    }
}

/// `GET /predict/history?lat=&lon=`
pub async fn history(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CoordParams>,
) -> (StatusCode, Json<Value>) {
    let Some(location) = resolve_location(CoordParams::default(), query) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "lat/lon required" })),
        );
    };

    match state.service.history(location) {
        Ok(entries) => match serde_json::to_value(&entries) {
            Ok(value) => (StatusCode::OK, Json(value)),
            Err(e) => internal_error(&Error::Json(e)),
        },
        Err(e) => internal_error(&e),
    }
}

/// `GET /alerts?lat=&lon=` — coarse classification of a prediction; any
/// downstream failure collapses into a single alert_fail code.
pub async fn alerts(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CoordParams>,
) -> (StatusCode, Json<Value>) {
    let Some(location) = resolve_location(CoordParams::default(), query) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "lat/lon required" })),
        );
    };

    match state.service.alert(location).await {
        Ok(status) => match serde_json::to_value(&status) {
            Ok(value) => (StatusCode::OK, Json(value)),
            Err(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "alert_fail" })),
            ),
        },
        Err(Error::Validation(msg)) => (StatusCode::BAD_REQUEST, Json(json!({ "error": msg }))),
        Err(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "alert_fail" })),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_body_takes_precedence_over_query() {
        let body = CoordParams {
            lat: Some(1.0),
            lon: Some(2.0),
        };
        let query = CoordParams {
            lat: Some(9.0),
            lon: Some(9.0),
        };
        let loc = resolve_location(body, query).unwrap();
        assert_eq!((loc.lat, loc.lon), (1.0, 2.0));
    }

    #[test]
    fn test_query_fallback_per_field() {
        let body = CoordParams {
            lat: Some(1.0),
            lon: None,
        };
        let query = CoordParams {
            lat: None,
            lon: Some(2.0),
        };
        let loc = resolve_location(body, query).unwrap();
        assert_eq!((loc.lat, loc.lon), (1.0, 2.0));
    }

    #[tokio::test]
    async fn test_liveness_banner() {
        assert_eq!(root().await, "Air-Qualify Backend is running");
    }

    #[test]
    fn test_missing_either_coordinate_is_none() {
        assert!(resolve_location(CoordParams::default(), CoordParams::default()).is_none());
        let only_lat = CoordParams {
            lat: Some(1.0),
            lon: None,
        };
        assert!(resolve_location(only_lat, CoordParams::default()).is_none());
    }
}
