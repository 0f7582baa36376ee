//! Model loading and the inference seam.
//!
//! The model loads asynchronously at startup; until that finishes, every
//! prediction must fail with an explicit not-ready error rather than a
//! fallback AQI. Readiness is an explicit state checked on every call.

use common::{Error, Result};
use parking_lot::RwLock;
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;

/// An opaque AQI regressor. Input is the fixed-order feature vector
/// `[pm10, pm25, no2, so2, co, ozone]` as 32-bit floats.
pub trait AqiModel: Send + Sync {
    fn predict(&self, features: &[f32; 6]) -> Result<f64>;
}

enum ModelState {
    Loading,
    Ready(Arc<dyn AqiModel>),
    Failed(String),
}

/// Shared handle to the one-time-loaded model. Cheap to clone; the
/// loader task flips the state while request handlers read it.
#[derive(Clone)]
pub struct ModelHandle {
    state: Arc<RwLock<ModelState>>,
}

impl ModelHandle {
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(ModelState::Loading)),
        }
    }

    pub fn set_ready(&self, model: Arc<dyn AqiModel>) {
        *self.state.write() = ModelState::Ready(model);
    }

    pub fn set_failed(&self, reason: String) {
        *self.state.write() = ModelState::Failed(reason);
    }

    /// The loaded model, or the error describing why inference cannot
    /// run yet.
    pub fn ready(&self) -> Result<Arc<dyn AqiModel>> {
        match &*self.state.read() {
            ModelState::Ready(model) => Ok(Arc::clone(model)),
            ModelState::Loading => Err(Error::ModelNotReady),
            ModelState::Failed(reason) => Err(Error::ModelLoad(reason.clone())),
        }
    }
}

impl Default for ModelHandle {
    fn default() -> Self {
        Self::new()
    }
}

// ── Shipped model ─────────────────────────────────────────────────────

/// Linear regression over the six pollutant features, exported from
/// training as a JSON coefficients file.
#[derive(Debug, Clone, Deserialize)]
pub struct LinearModel {
    pub intercept: f64,
    pub weights: [f64; 6],
}

impl AqiModel for LinearModel {
    fn predict(&self, features: &[f32; 6]) -> Result<f64> {
        let mut aqi = self.intercept;
        for (w, x) in self.weights.iter().zip(features.iter()) {
            aqi += w * f64::from(*x);
        }
        if !aqi.is_finite() {
            return Err(Error::Inference(format!(
                "model produced a non-finite AQI from {features:?}"
            )));
        }
        Ok(aqi)
    }
}

/// Read and parse the coefficients file.
pub fn load_model(path: &Path) -> Result<Arc<dyn AqiModel>> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| Error::ModelLoad(format!("{}: {}", path.display(), e)))?;
    let model: LinearModel = serde_json::from_str(&contents)
        .map_err(|e| Error::ModelLoad(format!("{}: {}", path.display(), e)))?;
    Ok(Arc::new(model))
}
