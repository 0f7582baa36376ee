//! The aggregation-cache-history pipeline behind the prediction endpoints.
//!
//! Composition, leaf-first: an injectable [`clock::Clock`] feeds the
//! TTL-governed [`cache::TtlCache`] and [`history::HistoryStore`];
//! [`aggregate::DataAggregator`] joins the two upstream providers and
//! absorbs their failures; [`model::ModelHandle`] gates inference on
//! load completion; [`classify`] maps AQI to alert tiers; and
//! [`service::PredictionService`] orchestrates the whole flow with
//! per-key single-flight deduplication.

pub mod aggregate;
pub mod cache;
pub mod classify;
pub mod clock;
pub mod history;
pub mod model;
pub mod service;

pub use aggregate::{DataAggregator, PollutantSource, WeatherSource};
pub use cache::TtlCache;
pub use clock::{Clock, SystemClock};
pub use history::HistoryStore;
pub use model::{load_model, AqiModel, ModelHandle};
pub use service::PredictionService;
