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

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Dispatch policy a configured battery runs under.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum BatteryMode {
    #[default]
    SelfConsumption,
    Arbitrage,
}

/// Battery configuration. `None` on the engine side means "no battery
/// installed" (Idle mode, command always 0).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BatteryConfig {
    pub capacity_kwh: f64,
    pub max_power_w: f64,
    /// Discharge floor, as a SoC percentage in `[0, 100]`.
    pub discharge_to_percent: f64,
    /// Charge ceiling, as a SoC percentage in `[0, 100]`.
    pub charge_to_percent: f64,
    /// Equivalent full cycles at which effective capacity reaches 80%.
    pub degradation_cycles: f64,
    #[serde(default)]
    pub mode: BatteryMode,
}

impl Default for BatteryConfig {
    fn default() -> Self {
        Self {
            capacity_kwh: 10.0,
            max_power_w: 3000.0,
            discharge_to_percent: 10.0,
            charge_to_percent: 90.0,
            degradation_cycles: 6000.0,
            mode: BatteryMode::default(),
        }
    }
}

/// One planned arbitrage charge/discharge window for the current calendar
/// day, produced by the daily planner (§4.3).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ArbitragePlan {
    pub charge_start: chrono::DateTime<chrono::Utc>,
    pub charge_end: chrono::DateTime<chrono::Utc>,
    pub discharge_start: chrono::DateTime<chrono::Utc>,
    pub discharge_end: chrono::DateTime<chrono::Utc>,
    pub planned_kwh: f64,
}

/// Mutable battery state: stored energy, cycle counter, and residence-time
/// histograms. Fully reset on any reconfiguration or seek-to-start.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct BatteryState {
    pub stored_energy_wh: f64,
    pub equivalent_full_cycles: f64,
    /// seconds spent at each integer SoC percentage (0..=100)
    pub time_at_soc_pct_sec: BTreeMap<i32, f64>,
    /// seconds spent in each signed-power bucket, rounded to nearest kW
    pub time_at_power_kw_sec: BTreeMap<i32, f64>,
    /// `YYYY-MM` -> { soc_pct -> seconds }
    pub month_soc_seconds: BTreeMap<String, BTreeMap<i32, f64>>,
    #[serde(skip)]
    pub arbitrage_plan: Option<ArbitragePlan>,
    #[serde(skip)]
    pub last_planned_day: Option<chrono::NaiveDate>,
}

/// Point-in-time battery summary for the `battery:summary` event and client
/// bootstrap, derived from `BatteryState` plus the configured capacity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BatterySnapshot {
    pub soc_percent: f64,
    pub cycles: f64,
    pub effective_capacity_kwh: f64,
    pub degradation_pct: f64,
    pub time_at_power_sec: BTreeMap<i32, f64>,
    pub time_at_soc_pct_sec: BTreeMap<i32, f64>,
    pub month_soc_seconds: BTreeMap<String, BTreeMap<i32, f64>>,
}
