//! Bounded rolling history per location.
//!
//! Each location key owns an insertion-ordered series capped at a fixed
//! length; appending past the cap drops the oldest entries. The TTL
//! covers the whole series and resets on every write, so a location's
//! history vanishes 24 h after its *last* prediction, not per entry.

use crate::clock::Clock;
use chrono::{DateTime, Duration, Utc};
use common::HistoryEntry;
use dashmap::DashMap;
use std::sync::Arc;

struct HistorySeries {
    entries: Vec<HistoryEntry>,
    expires_at: DateTime<Utc>,
}

pub struct HistoryStore {
    series: DashMap<String, HistorySeries>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
    max_entries: usize,
}

impl HistoryStore {
    pub fn new(clock: Arc<dyn Clock>, ttl: Duration, max_entries: usize) -> Self {
        Self {
            series: DashMap::new(),
            clock,
            ttl,
            max_entries,
        }
    }

    /// Append an observation, trim to the newest `max_entries`, and push
    /// the series deadline out to `ttl` from now.
    pub fn append(&self, key: &str, entry: HistoryEntry) {
        let now = self.clock.now();
        let mut series = self
            .series
            .entry(key.to_string())
            .or_insert_with(|| HistorySeries {
                entries: Vec::new(),
                expires_at: now + self.ttl,
            });

        // A series that already lapsed starts over rather than resurrecting.
        if series.expires_at <= now {
            series.entries.clear();
        }

        series.entries.push(entry);
        if series.entries.len() > self.max_entries {
            let excess = series.entries.len() - self.max_entries;
            series.entries.drain(..excess);
        }
        series.expires_at = now + self.ttl;
    }

    /// All retained entries for a location, oldest first. Expired or
    /// never-written keys both read as empty.
    pub fn get(&self, key: &str) -> Vec<HistoryEntry> {
        let now = self.clock.now();

        let expired = match self.series.get(key) {
            Some(series) => {
                if series.expires_at > now {
                    return series.entries.clone();
                }
                true
            }
            None => false,
        };

        if expired {
            self.series.remove_if(key, |_, s| s.expires_at <= now);
        }
        Vec::new()
    }
}
