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

/// Running totals bucketed by "today"/"month"/"all-time", plus cost
/// breakdowns under the three strategies compared by the dashboard.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct EnergyBucket {
    pub grid_import_kwh: f64,
    pub grid_export_kwh: f64,
    pub pv_production_kwh: f64,
    pub heat_pump_electrical_kwh: f64,
    pub heat_pump_thermal_kwh: f64,
    pub self_consumption_kwh: f64,
    pub home_demand_kwh: f64,
    pub battery_savings_kwh: f64,
    pub battery_savings_pln: f64,
    pub cost_raw_pln: f64,
    pub cost_self_consumption_pln: f64,
    pub cost_arbitrage_pln: f64,
    pub cheap_export_kwh: f64,
    pub cheap_export_revenue_pln: f64,
}

/// The full set of accumulators streamed in `summary:update`, plus the
/// current spot price for convenience.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct SummaryAccumulators {
    pub today: EnergyBucket,
    pub month: EnergyBucket,
    pub all_time: EnergyBucket,
    pub current_spot_price_pln: f64,
}

/// One completed calendar day of arbitrage activity (§3, §4.3).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ArbitrageDayRecord {
    pub date: chrono::NaiveDate,
    pub charge_start: DateTime<Utc>,
    pub charge_end: DateTime<Utc>,
    pub charge_kwh: f64,
    pub discharge_start: DateTime<Utc>,
    pub discharge_end: DateTime<Utc>,
    pub discharge_kwh: f64,
    pub gap_minutes: f64,
    pub cycles_delta: f64,
    pub earnings_pln: f64,
}
