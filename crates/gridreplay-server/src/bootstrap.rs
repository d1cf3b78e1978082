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

//! Ambient loader & bootstrap (§2.1): hands the engine *something* to
//! replay so `cargo run`/integration tests are runnable end-to-end. Not a
//! feature of this system — real CSV/SQL ingestion is explicitly out of
//! scope; this module either reads a `SqliteDataSource` fixture or falls
//! back to a small synthetic demo dataset.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};
use gridreplay_store::{DataSource, ReadingStore, SensorCatalog, SqliteDataSource};
use gridreplay_types::{Reading, Sensor, SensorType, TimeRange};

use crate::config::ServerConfig;
use crate::error::StartupError;

pub struct Bootstrapped {
    pub store: Arc<ReadingStore>,
    pub catalog: Arc<SensorCatalog>,
    pub named_ranges: HashMap<String, TimeRange>,
}

pub fn bootstrap(config: &ServerConfig) -> Result<Bootstrapped, StartupError> {
    let (sensors, readings) = match &config.fixture.sqlite_path {
        Some(path) => {
            tracing::info!(path, "loading fixture dataset from sqlite");
            let source = SqliteDataSource::new(path);
            let sensors = source.sensors().unwrap_or_default();
            let readings = source.readings().unwrap_or_default();
            (sensors, readings)
        }
        None => {
            tracing::info!("no fixture configured, seeding synthetic demo dataset");
            demo_dataset()
        }
    };

    if sensors.is_empty() {
        return Err(StartupError::NoSensors);
    }

    let mut catalog = SensorCatalog::new();
    for sensor in sensors {
        catalog.register(sensor);
    }

    let store = ReadingStore::new();
    let report = store.ingest(readings);
    tracing::info!(
        ingested = report.ingested,
        discarded_duplicate = report.discarded_duplicate,
        discarded_nan = report.discarded_nan,
        "fixture ingestion complete"
    );

    let mut named_ranges = config.sources.clone();
    if !named_ranges.contains_key("all") {
        if let Some(range) = store.global_range() {
            named_ranges.insert("all".to_owned(), range);
        }
    }

    Ok(Bootstrapped {
        store: Arc::new(store),
        catalog: Arc::new(catalog),
        named_ranges,
    })
}

/// A day of hourly synthetic readings across every sensor role the engine
/// knows how to wire up, so a fresh checkout has something to replay without
/// a real fixture database on disk.
fn demo_dataset() -> (Vec<Sensor>, Vec<Reading>) {
    let sensors = vec![
        Sensor::new("grid", "Grid power", SensorType::GridPower, "W"),
        Sensor::new("pv", "PV power", SensorType::PvPower, "W"),
        Sensor::new(
            "hp_consumption",
            "Heat pump consumption",
            SensorType::HeatPumpConsumption,
            "W",
        ),
        Sensor::new(
            "hp_production",
            "Heat pump production",
            SensorType::HeatPumpProduction,
            "W",
        ),
        Sensor::new("indoor", "Indoor temperature", SensorType::IndoorTemperature, "C"),
        Sensor::new("outdoor", "Outdoor temperature", SensorType::OutdoorTemperature, "C"),
        Sensor::new("spot", "Spot price", SensorType::SpotPrice, "PLN/kWh"),
    ];

    let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let mut readings = Vec::new();
    for hour in 0..48 {
        let t = start + Duration::hours(hour);
        let phase = (hour % 24) as f64;
        let solar = ((phase - 12.0).abs() < 6.0)
            .then(|| (1.0 - (phase - 12.0).abs() / 6.0) * 4000.0)
            .unwrap_or(0.0);
        let load = 800.0 + 400.0 * (phase / 24.0 * std::f64::consts::TAU).sin().abs();
        let grid = load - solar;
        let outdoor = -2.0 + 6.0 * (phase / 24.0 * std::f64::consts::TAU).sin();
        let spot = match phase as u32 {
            0..=5 => 0.20,
            6..=16 => 0.40,
            17..=21 => 1.00,
            _ => 0.30,
        };

        readings.push(Reading::new(t, "grid", grid, "W", SensorType::GridPower));
        readings.push(Reading::new(t, "pv", solar, "W", SensorType::PvPower));
        readings.push(Reading::new(t, "hp_consumption", load * 0.3, "W", SensorType::HeatPumpConsumption));
        readings.push(Reading::new(t, "hp_production", load * 0.9, "W", SensorType::HeatPumpProduction));
        readings.push(Reading::new(t, "indoor", 21.0, "C", SensorType::IndoorTemperature));
        readings.push(Reading::new(t, "outdoor", outdoor, "C", SensorType::OutdoorTemperature));
        readings.push(Reading::new(t, "spot", spot, "PLN/kWh", SensorType::SpotPrice));
    }

    (sensors, readings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo_dataset_bootstraps_cleanly() {
        let config = ServerConfig::default();
        let result = bootstrap(&config).unwrap();
        assert!(result.catalog.len() > 0);
        assert!(result.named_ranges.contains_key("all"));
    }
}
