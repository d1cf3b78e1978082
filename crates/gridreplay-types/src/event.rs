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

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::battery::BatterySnapshot;
use crate::command::PvConfig;
use crate::sensor::Sensor;
use crate::summary::{ArbitrageDayRecord, SummaryAccumulators};
use crate::time_range::TimeRange;

/// Every outbound envelope the engine/bus can publish (§6, §9 design note:
/// "the engine publishes `EngineEvent::{...}`; the bus serializes each to
/// JSON once and fans out"). One enum, one `serde_json::to_string` call per
/// event, no polymorphic dispatch in the hot path.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum EngineEvent {
    #[serde(rename = "data:loaded")]
    DataLoaded {
        sensors: Vec<Sensor>,
        time_range: TimeRange,
        pv: PvConfig,
    },
    #[serde(rename = "sim:state")]
    SimState {
        time: DateTime<Utc>,
        speed: f64,
        running: bool,
    },
    #[serde(rename = "sensor:reading")]
    SensorReading {
        sensor_id: String,
        value: f64,
        unit: String,
        timestamp: DateTime<Utc>,
    },
    #[serde(rename = "summary:update")]
    SummaryUpdate(SummaryAccumulators),
    #[serde(rename = "battery:update")]
    BatteryUpdate {
        battery_power_w: f64,
        adjusted_grid_w: f64,
        soc_percent: f64,
        timestamp: DateTime<Utc>,
    },
    #[serde(rename = "battery:summary")]
    BatterySummary(BatterySnapshot),
    #[serde(rename = "arbitrage:day_log")]
    ArbitrageDayLog { records: Vec<ArbitrageDayRecord> },
    #[serde(rename = "prediction:comparison")]
    PredictionComparison {
        actual_power_w: f64,
        predicted_power_w: f64,
        actual_temp_c: Option<f64>,
        predicted_temp_c: Option<f64>,
        has_actual_temp: bool,
    },
}
