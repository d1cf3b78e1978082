// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of gridreplay.
//
// Licensed under the Creative Commons Attribution-NonCommercial-NoDerivatives 4.0 International
// (CC BY-NC-ND 4.0). You may use and share this file for non-commercial purposes only and you may not
// create derivatives. See <https://creativecommons.org/licenses/by-nc-nd/4.0/>.
//
// This software is provided "AS IS", without warranty of any kind.
//
// For commercial licensing, please contact: info@solare.cz

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use gridreplay_types::{Reading, TimeRange};
use parking_lot::RwLock;

/// Per-sensor count of readings ingested/discarded, logged once per `ingest`
/// call at `warn` when any discard occurred (§4.1 "single aggregate
/// warning").
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IngestReport {
    pub ingested: usize,
    pub discarded_duplicate: usize,
    pub discarded_nan: usize,
}

/// In-memory, per-sensor, time-ordered reading tables (§4.1). Many concurrent
/// readers, rare writers — a `parking_lot::RwLock` per the ambient
/// concurrency note in §5.
#[derive(Debug, Default)]
pub struct ReadingStore {
    series: RwLock<HashMap<String, Vec<Reading>>>,
}

impl ReadingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append-and-sort, re-sorting only the affected sensor ids. Duplicate
    /// timestamps within a sensor are last-writer-wins; NaN values are
    /// rejected silently.
    pub fn ingest(&self, readings: Vec<Reading>) -> IngestReport {
        let mut report = IngestReport::default();
        let mut touched: Vec<String> = Vec::new();
        let mut series = self.series.write();

        for reading in readings {
            if reading.value.is_nan() {
                report.discarded_nan += 1;
                continue;
            }
            let bucket = series.entry(reading.sensor_id.clone()).or_default();
            if !touched.contains(&reading.sensor_id) {
                touched.push(reading.sensor_id.clone());
            }
            bucket.push(reading);
        }

        for sensor_id in &touched {
            if let Some(bucket) = series.get_mut(sensor_id) {
                bucket.sort_by_key(|r| r.timestamp);
                let before = bucket.len();
                // `Vec::dedup_by` keeps the first of a run of equal
                // elements; we want last-writer-wins, so dedup manually,
                // dropping the previously retained element whenever the
                // next one shares its timestamp.
                let mut deduped: Vec<_> = Vec::with_capacity(bucket.len());
                for reading in bucket.drain(..) {
                    if deduped.last().is_some_and(|r: &Reading| r.timestamp == reading.timestamp) {
                        deduped.pop();
                    }
                    deduped.push(reading);
                }
                report.discarded_duplicate += before - deduped.len();
                *bucket = deduped;
            }
        }
        report.ingested = touched.len();

        if report.discarded_duplicate > 0 || report.discarded_nan > 0 {
            tracing::warn!(
                discarded_duplicate = report.discarded_duplicate,
                discarded_nan = report.discarded_nan,
                "ingest discarded invalid readings"
            );
        }
        report
    }

    /// Readings with `start <= ts < end`, empty if the sensor is unknown or
    /// has none in range. O(log N + k) via binary search over the sorted
    /// per-sensor vector.
    pub fn range(&self, sensor_id: &str, start: DateTime<Utc>, end: DateTime<Utc>) -> Vec<Reading> {
        let series = self.series.read();
        let Some(bucket) = series.get(sensor_id) else {
            return Vec::new();
        };
        let lo = bucket.partition_point(|r| r.timestamp < start);
        let hi = bucket.partition_point(|r| r.timestamp < end);
        bucket[lo..hi].to_vec()
    }

    /// The reading with the largest `ts <= t`, `None` if `t` precedes the
    /// first reading or the sensor is unknown.
    pub fn at(&self, sensor_id: &str, t: DateTime<Utc>) -> Option<Reading> {
        let series = self.series.read();
        let bucket = series.get(sensor_id)?;
        let idx = bucket.partition_point(|r| r.timestamp <= t);
        idx.checked_sub(1).map(|i| bucket[i].clone())
    }

    pub fn count(&self, sensor_id: &str) -> usize {
        self.series.read().get(sensor_id).map_or(0, Vec::len)
    }

    /// The union interval across all sensors, `None` if the store is empty.
    pub fn global_range(&self) -> Option<TimeRange> {
        let series = self.series.read();
        let mut range: Option<TimeRange> = None;
        for bucket in series.values() {
            let (Some(first), Some(last)) = (bucket.first(), bucket.last()) else {
                continue;
            };
            // the store's readings are inclusive points; expose the union as
            // a half-open range whose end is just past the last sample so
            // `range()` queries against it include the final reading.
            let this = TimeRange::new(first.timestamp, last.timestamp + chrono::Duration::seconds(1));
            range = Some(match range {
                Some(r) => r.union(&this),
                None => this,
            });
        }
        range
    }
}
