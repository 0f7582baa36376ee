//! Unified error type for the air-quality service.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("OpenAQ API error: {0}")]
    OpenAq(String),

    #[error("Open-Meteo API error: {0}")]
    OpenMeteo(String),

    #[error("Model not loaded")]
    ModelNotReady,

    #[error("Model failed to load: {0}")]
    ModelLoad(String),

    #[error("Inference error: {0}")]
    Inference(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}
