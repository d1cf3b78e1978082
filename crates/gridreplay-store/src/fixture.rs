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

//! Not a feature of this system — loaders that turn CSV/SQL/R-script output
//! into readings are explicitly out of scope (§1). This module exists only
//! so the binary and its tests have *something* that hands the store a
//! finished set of readings (§2.1 ambient bootstrap). Swapping in a real
//! ingestion pipeline later is a matter of implementing `DataSource`, not
//! restructuring the engine.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{TimeZone, Utc};
use gridreplay_types::{Reading, Sensor, SensorType};
use rusqlite::Connection;

/// Abstraction over "something that can hand the store a finished set of
/// readings and sensors", so the replay binary isn't wedded to one on-disk
/// format.
pub trait DataSource: Send + Sync {
    fn sensors(&self) -> Result<Vec<Sensor>>;
    fn readings(&self) -> Result<Vec<Reading>>;
}

/// A `DataSource` backed by a small SQLite fixture database. Expected
/// schema:
/// ```sql
/// CREATE TABLE sensors (id TEXT PRIMARY KEY, name TEXT, type TEXT, unit TEXT);
/// CREATE TABLE readings (sensor_id TEXT, ts INTEGER, value REAL);
/// ```
#[derive(Debug, Clone)]
pub struct SqliteDataSource {
    db_path: PathBuf,
}

impl SqliteDataSource {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Self {
        Self {
            db_path: db_path.as_ref().to_path_buf(),
        }
    }

    fn connect(&self) -> Result<Connection> {
        Connection::open(&self.db_path)
            .with_context(|| format!("failed to open fixture database at {}", self.db_path.display()))
    }
}

fn parse_sensor_type(tag: &str) -> SensorType {
    match tag {
        "grid_power" => SensorType::GridPower,
        "pv_power" => SensorType::PvPower,
        "heat_pump_consumption" => SensorType::HeatPumpConsumption,
        "heat_pump_production" => SensorType::HeatPumpProduction,
        "indoor_temperature" => SensorType::IndoorTemperature,
        "outdoor_temperature" => SensorType::OutdoorTemperature,
        "dhw_tank_temperature" => SensorType::DhwTankTemperature,
        "spot_price" => SensorType::SpotPrice,
        "generic_temperature" => SensorType::GenericTemperature,
        _ => SensorType::GenericPower,
    }
}

impl DataSource for SqliteDataSource {
    fn sensors(&self) -> Result<Vec<Sensor>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare("SELECT id, name, type, unit FROM sensors")?;
        let sensors = stmt
            .query_map([], |row| {
                Ok(Sensor::new(
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    parse_sensor_type(&row.get::<_, String>(2)?),
                    row.get::<_, String>(3)?,
                ))
            })?
            .filter_map(std::result::Result::ok)
            .collect();
        Ok(sensors)
    }

    fn readings(&self) -> Result<Vec<Reading>> {
        let conn = self.connect()?;
        let catalog: Vec<Sensor> = self.sensors()?;

        let mut stmt = conn.prepare("SELECT sensor_id, ts, value FROM readings ORDER BY ts ASC")?;
        let readings = stmt
            .query_map([], |row| {
                let sensor_id: String = row.get(0)?;
                let ts: i64 = row.get(1)?;
                let value: f64 = row.get(2)?;
                Ok((sensor_id, ts, value))
            })?
            .filter_map(std::result::Result::ok)
            .filter_map(|(sensor_id, ts, value)| {
                let sensor = catalog.iter().find(|s| s.id == sensor_id)?;
                let timestamp = Utc.timestamp_opt(ts, 0).single()?;
                Some(Reading::new(
                    timestamp,
                    sensor_id,
                    value,
                    sensor.unit.clone(),
                    sensor.sensor_type,
                ))
            })
            .collect();
        Ok(readings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture_db() -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fixture.db");
        let conn = Connection::open(&path).unwrap();
        conn.execute_batch(
            "CREATE TABLE sensors (id TEXT PRIMARY KEY, name TEXT, type TEXT, unit TEXT);
             CREATE TABLE readings (sensor_id TEXT, ts INTEGER, value REAL);
             INSERT INTO sensors VALUES ('grid', 'Grid', 'grid_power', 'W');
             INSERT INTO readings VALUES ('grid', 1700000000, 123.0);",
        )
        .unwrap();
        (dir, path)
    }

    #[test]
    fn loads_sensors_and_readings() {
        let (_dir, path) = fixture_db();
        let source = SqliteDataSource::new(&path);
        let sensors = source.sensors().unwrap();
        assert_eq!(sensors.len(), 1);
        let readings = source.readings().unwrap();
        assert_eq!(readings.len(), 1);
        assert_eq!(readings[0].value, 123.0);
    }
}
