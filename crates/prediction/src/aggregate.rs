//! Upstream data aggregation.
//!
//! Fetches pollutant readings and weather conditions concurrently.
//! Either provider failing — transport error, bad payload, or timeout —
//! is absorbed here: the failure is logged, reported through the source
//! status list, and any missing measurement falls back to the fixed
//! defaults. `fetch` never fails outward.

use common::{MeasurementSet, RawMeasurements, Result, SourceStatus, WeatherSnapshot};
use std::future::Future;
use std::time::Duration;
use tokio::time::timeout;
use tracing::warn;

/// Seam over the pollutant provider so tests can substitute fakes.
pub trait PollutantSource: Send + Sync {
    fn name(&self) -> &'static str;
    fn latest(&self, lat: f64, lon: f64) -> impl Future<Output = Result<RawMeasurements>> + Send;
}

/// Seam over the weather provider. Weather is fetched for its status
/// signal only; the snapshot never reaches the feature vector.
pub trait WeatherSource: Send + Sync {
    fn name(&self) -> &'static str;
    fn current(&self, lat: f64, lon: f64) -> impl Future<Output = Result<WeatherSnapshot>> + Send;
}

impl PollutantSource for openaq_client::OpenAqClient {
    fn name(&self) -> &'static str {
        "OpenAQ"
    }

    fn latest(&self, lat: f64, lon: f64) -> impl Future<Output = Result<RawMeasurements>> + Send {
        self.latest_measurements(lat, lon)
    }
}

impl WeatherSource for open_meteo_client::OpenMeteoClient {
    fn name(&self) -> &'static str {
        "Weather"
    }

    fn current(&self, lat: f64, lon: f64) -> impl Future<Output = Result<WeatherSnapshot>> + Send {
        self.current_weather(lat, lon)
    }
}

pub struct DataAggregator<P, W> {
    pollutants: P,
    weather: W,
    fetch_timeout: Duration,
}

impl<P: PollutantSource, W: WeatherSource> DataAggregator<P, W> {
    pub fn new(pollutants: P, weather: W, fetch_timeout: Duration) -> Self {
        Self {
            pollutants,
            weather,
            fetch_timeout,
        }
    }

    /// Fetch both providers concurrently and merge into a complete
    /// measurement set plus per-provider statuses.
    pub async fn fetch(&self, lat: f64, lon: f64) -> (MeasurementSet, Vec<SourceStatus>) {
        let (pollutants, weather) = tokio::join!(
            timeout(self.fetch_timeout, self.pollutants.latest(lat, lon)),
            timeout(self.fetch_timeout, self.weather.current(lat, lon)),
        );

        let readings = match pollutants {
            Ok(Ok(readings)) => Some(readings),
            Ok(Err(e)) => {
                warn!("{} fetch failed for ({},{}): {}", self.pollutants.name(), lat, lon, e);
                None
            }
            Err(_) => {
                warn!(
                    "{} fetch timed out after {:?} for ({},{})",
                    self.pollutants.name(),
                    self.fetch_timeout,
                    lat,
                    lon
                );
                None
            }
        };

        let weather_ok = match weather {
            Ok(Ok(_)) => true,
            Ok(Err(e)) => {
                warn!("{} fetch failed for ({},{}): {}", self.weather.name(), lat, lon, e);
                false
            }
            Err(_) => {
                warn!(
                    "{} fetch timed out after {:?} for ({},{})",
                    self.weather.name(),
                    self.fetch_timeout,
                    lat,
                    lon
                );
                false
            }
        };

        let sources = vec![
            SourceStatus {
                name: self.pollutants.name().to_string(),
                ok: readings.is_some(),
            },
            SourceStatus {
                name: self.weather.name().to_string(),
                ok: weather_ok,
            },
        ];

        let measurements = MeasurementSet::from_partial(&readings.unwrap_or_default());
        (measurements, sources)
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use common::Error;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Pollutant source that returns fixed readings, counts calls, and
    /// tracks how many of them overlapped.
    pub struct StaticPollutants {
        pub readings: RawMeasurements,
        pub calls: Arc<AtomicUsize>,
        pub delay: Duration,
        in_flight: Arc<AtomicUsize>,
        pub max_in_flight: Arc<AtomicUsize>,
    }

    impl StaticPollutants {
        pub fn new(readings: RawMeasurements) -> Self {
            Self {
                readings,
                calls: Arc::new(AtomicUsize::new(0)),
                delay: Duration::ZERO,
                in_flight: Arc::new(AtomicUsize::new(0)),
                max_in_flight: Arc::new(AtomicUsize::new(0)),
            }
        }
    }

    impl PollutantSource for StaticPollutants {
        fn name(&self) -> &'static str {
            "OpenAQ"
        }

        fn latest(
            &self,
            _lat: f64,
            _lon: f64,
        ) -> impl Future<Output = Result<RawMeasurements>> + Send {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let readings = self.readings;
            let delay = self.delay;
            let in_flight = Arc::clone(&self.in_flight);
            let max_in_flight = Arc::clone(&self.max_in_flight);
            async move {
                let current = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                max_in_flight.fetch_max(current, Ordering::SeqCst);
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                in_flight.fetch_sub(1, Ordering::SeqCst);
                Ok(readings)
            }
        }
    }

    pub struct FailingPollutants;

    impl PollutantSource for FailingPollutants {
        fn name(&self) -> &'static str {
            "OpenAQ"
        }

        fn latest(
            &self,
            _lat: f64,
            _lon: f64,
        ) -> impl Future<Output = Result<RawMeasurements>> + Send {
            async { Err(Error::OpenAq("connection refused".to_string())) }
        }
    }

    pub struct StaticWeather;

    impl WeatherSource for StaticWeather {
        fn name(&self) -> &'static str {
            "Weather"
        }

        fn current(
            &self,
            _lat: f64,
            _lon: f64,
        ) -> impl Future<Output = Result<WeatherSnapshot>> + Send {
            async {
                Ok(WeatherSnapshot {
                    temperature_c: Some(20.0),
                    humidity_pct: Some(60.0),
                    wind_speed_ms: Some(3.0),
                })
            }
        }
    }

    pub struct FailingWeather;

    impl WeatherSource for FailingWeather {
        fn name(&self) -> &'static str {
            "Weather"
        }

        fn current(
            &self,
            _lat: f64,
            _lon: f64,
        ) -> impl Future<Output = Result<WeatherSnapshot>> + Send {
            async { Err(Error::OpenMeteo("HTTP 502".to_string())) }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;

    #[tokio::test]
    async fn test_both_providers_fail_yields_defaults() {
        let agg = DataAggregator::new(FailingPollutants, FailingWeather, Duration::from_secs(5));
        let (measurements, sources) = agg.fetch(40.7, -74.0).await;

        assert_eq!(measurements, MeasurementSet::DEFAULTS);
        assert_eq!(sources.len(), 2);
        assert_eq!(sources[0].name, "OpenAQ");
        assert!(!sources[0].ok);
        assert_eq!(sources[1].name, "Weather");
        assert!(!sources[1].ok);
    }

    #[tokio::test]
    async fn test_partial_readings_fill_defaults() {
        let pollutants = StaticPollutants::new(RawMeasurements {
            pm10: Some(33.0),
            ozone: Some(17.5),
            ..Default::default()
        });
        let agg = DataAggregator::new(pollutants, StaticWeather, Duration::from_secs(5));
        let (measurements, sources) = agg.fetch(40.7, -74.0).await;

        assert_eq!(measurements.pm10, 33.0);
        assert_eq!(measurements.ozone, 17.5);
        assert_eq!(measurements.pm25, 10.0);
        assert_eq!(measurements.co, 0.2);
        assert!(sources.iter().all(|s| s.ok));
    }

    #[tokio::test]
    async fn test_weather_failure_is_status_only() {
        let pollutants = StaticPollutants::new(RawMeasurements {
            pm25: Some(8.0),
            ..Default::default()
        });
        let agg = DataAggregator::new(pollutants, FailingWeather, Duration::from_secs(5));
        let (measurements, sources) = agg.fetch(40.7, -74.0).await;

        // Pollutant data is unaffected by the weather provider failing.
        assert_eq!(measurements.pm25, 8.0);
        assert!(sources[0].ok);
        assert!(!sources[1].ok);
    }

    #[tokio::test]
    async fn test_slow_provider_counts_as_failed() {
        let mut pollutants = StaticPollutants::new(RawMeasurements {
            pm25: Some(8.0),
            ..Default::default()
        });
        pollutants.delay = Duration::from_millis(200);
        let agg = DataAggregator::new(pollutants, StaticWeather, Duration::from_millis(20));
        let (measurements, sources) = agg.fetch(40.7, -74.0).await;

        assert_eq!(measurements, MeasurementSet::DEFAULTS);
        assert!(!sources[0].ok);
        assert!(sources[1].ok);
    }
}
