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

use crate::battery::BatteryMode;
use crate::sim::InsulationLevel;

/// A single PV array, informational only — no solar-position physics is
/// modeled here, generation always comes from the `pv_power` sensor (§3.1).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PvArrayConfig {
    pub name: String,
    pub peak_wp: f64,
    pub azimuth: f64,
    pub tilt: f64,
    pub enabled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct PvConfig {
    pub enabled: bool,
    #[serde(default)]
    pub arrays: Vec<PvArrayConfig>,
}

/// Every inbound envelope the session bus recognizes, keyed on the wire by
/// `type` with the fields below flattened into `payload` (§6). Anything that
/// doesn't match one of these variants fails to deserialize and is logged and
/// dropped at the bus boundary rather than reaching the engine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum ClientCommand {
    #[serde(rename = "sim:start")]
    SimStart,
    #[serde(rename = "sim:pause")]
    SimPause,
    #[serde(rename = "sim:set_speed")]
    SimSetSpeed { speed: f64 },
    #[serde(rename = "sim:seek")]
    SimSeek { timestamp: DateTime<Utc> },
    #[serde(rename = "sim:set_source")]
    SimSetSource { source: String },
    #[serde(rename = "sim:set_prediction")]
    SimSetPrediction { enabled: bool },
    #[serde(rename = "battery:config")]
    BatteryConfig {
        enabled: bool,
        capacity_kwh: f64,
        max_power_w: f64,
        discharge_to_percent: f64,
        charge_to_percent: f64,
        degradation_cycles: f64,
        #[serde(default)]
        mode: BatteryMode,
    },
    #[serde(rename = "pv:config")]
    PvConfig {
        enabled: bool,
        #[serde(default)]
        arrays: Vec<PvArrayConfig>,
    },
    #[serde(rename = "config:update")]
    ConfigUpdate {
        export_coefficient: f64,
        price_threshold_pln: f64,
        temp_offset_c: f64,
        fixed_tariff_pln: f64,
        distribution_fee_pln: f64,
        net_metering_ratio: f64,
        insulation_level: InsulationLevel,
    },
}
