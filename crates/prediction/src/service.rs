//! Prediction orchestration.
//!
//! Request flow: cache lookup → per-key single-flight gate → re-check
//! cache → aggregate providers → model readiness check → infer → fine
//! classify → cache store → history append. Nothing is cached or
//! recorded when the compute path fails. The alert path runs the same
//! prediction locally and applies only the coarse table.

use crate::aggregate::{DataAggregator, PollutantSource, WeatherSource};
use crate::cache::TtlCache;
use crate::classify;
use crate::clock::Clock;
use crate::history::HistoryStore;
use crate::model::ModelHandle;
use chrono::Duration;
use common::{AlertStatus, HistoryEntry, Location, PredictionResult, Result};
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

pub struct PredictionService<P, W> {
    aggregator: DataAggregator<P, W>,
    model: ModelHandle,
    clock: Arc<dyn Clock>,
    cache: TtlCache<PredictionResult>,
    history: HistoryStore,
    result_ttl: Duration,
    // One gate per in-flight key so concurrent misses share a single
    // compute instead of racing the providers and the cache.
    inflight: DashMap<String, Arc<Mutex<()>>>,
}

impl<P: PollutantSource, W: WeatherSource> PredictionService<P, W> {
    pub fn new(
        aggregator: DataAggregator<P, W>,
        model: ModelHandle,
        clock: Arc<dyn Clock>,
        result_ttl: Duration,
        history_ttl: Duration,
        history_max_entries: usize,
    ) -> Self {
        Self {
            aggregator,
            model,
            clock: clock.clone(),
            cache: TtlCache::new(clock.clone()),
            history: HistoryStore::new(clock, history_ttl, history_max_entries),
            result_ttl,
            inflight: DashMap::new(),
        }
    }

    /// Full prediction for a location, memoized for `result_ttl`.
    pub async fn predict(&self, location: Location) -> Result<PredictionResult> {
        location.validate()?;
        let key = location.key();

        if let Some(hit) = self.cache_hit(&key) {
            return Ok(hit);
        }

        let gate = {
            let entry = self.inflight.entry(key.clone()).or_default();
            Arc::clone(entry.value())
        };
        let guard = gate.lock().await;

        // Another request may have computed while we waited on the gate.
        let result = match self.cache_hit(&key) {
            Some(hit) => Ok(hit),
            None => self.compute(&location, &key).await,
        };

        drop(guard);
        drop(gate);
        // Drop the gate only when no other request still holds it, so
        // waiters queued behind a failed compute keep serializing with
        // newcomers instead of racing them on a fresh mutex.
        self.inflight
            .remove_if(&key, |_, gate| Arc::strong_count(gate) == 1);
        result
    }

    /// Rolling history for a location (empty if unknown or expired).
    pub fn history(&self, location: Location) -> Result<Vec<HistoryEntry>> {
        location.validate()?;
        Ok(self.history.get(&location.key()))
    }

    /// Coarse classification of a fresh-or-cached prediction.
    pub async fn alert(&self, location: Location) -> Result<AlertStatus> {
        let prediction = self.predict(location).await?;
        Ok(classify::coarse_alert(prediction.aqi))
    }

    fn cache_hit(&self, key: &str) -> Option<PredictionResult> {
        let mut hit = self.cache.get(key)?;
        debug!("Cache hit for {}", key);
        hit.cached = true;
        Some(hit)
    }

    async fn compute(&self, location: &Location, key: &str) -> Result<PredictionResult> {
        let (measurements, sources) = self.aggregator.fetch(location.lat, location.lon).await;

        // Readiness is checked after aggregation so the sources list in
        // logs reflects real provider health even while loading.
        let model = self.model.ready()?;
        let aqi = model.predict(&measurements.feature_vector())?;

        let now = self.clock.now();
        let result = PredictionResult {
            location: *location,
            ts: now,
            aqi,
            alert: classify::fine_alert(aqi).to_string(),
            measurements,
            sources,
            cached: false,
        };

        self.cache
            .set(key.to_string(), result.clone(), self.result_ttl);
        self.history.append(
            key,
            HistoryEntry {
                date: now.date_naive(),
                aqi,
                measurements,
            },
        );

        info!(
            "Prediction for {}: aqi={:.1}, sources ok: {}",
            key,
            aqi,
            result
                .sources
                .iter()
                .filter(|s| s.ok)
                .map(|s| s.name.as_str())
                .collect::<Vec<_>>()
                .join(",")
        );

        Ok(result)
    }
}
