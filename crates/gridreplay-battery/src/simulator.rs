// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of gridreplay.

//! The battery dispatch state machine (§4.3). A pure, synchronous
//! `step`/`reconfigure` surface with no I/O and no channels, reacting to the
//! instantaneous replayed reading rather than a forecast block.

use chrono::{DateTime, NaiveDate, Utc};
use gridreplay_store::ReadingStore;
use gridreplay_types::{ArbitrageDayRecord, BatteryConfig, BatteryMode, BatterySnapshot, BatteryState};

use crate::economics::per_direction_efficiency;
use crate::planner;

/// Outcome of one `BatterySimulator::step` call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BatteryStepOutcome {
    /// Positive = discharging to loads, negative = charging from surplus.
    pub battery_power_w: f64,
    pub adjusted_grid_w: f64,
    pub soc_percent: f64,
}

#[derive(Debug)]
pub struct BatterySimulator {
    config: Option<BatteryConfig>,
    state: BatteryState,
    spot_sensor_id: Option<String>,
    current_day: Option<NaiveDate>,
    day_charge_kwh: f64,
    day_discharge_kwh: f64,
    day_cycles_start: f64,
    pending_day_log: Option<ArbitrageDayRecord>,
}

impl BatterySimulator {
    pub fn new(spot_sensor_id: Option<String>) -> Self {
        Self {
            config: None,
            state: BatteryState::default(),
            spot_sensor_id,
            current_day: None,
            day_charge_kwh: 0.0,
            day_discharge_kwh: 0.0,
            day_cycles_start: 0.0,
            pending_day_log: None,
        }
    }

    pub fn config(&self) -> Option<&BatteryConfig> {
        self.config.as_ref()
    }

    pub fn state(&self) -> &BatteryState {
        &self.state
    }

    /// A reconfiguration is never applied mid-step; it clears battery state
    /// and triggers a seek-to-start (§4.3 Failure semantics). The start SoC
    /// is the midpoint of the configured floor/ceiling.
    pub fn reconfigure(&mut self, config: Option<BatteryConfig>) {
        self.state = BatteryState::default();
        self.current_day = None;
        self.day_charge_kwh = 0.0;
        self.day_discharge_kwh = 0.0;
        self.day_cycles_start = 0.0;
        self.pending_day_log = None;
        if let Some(cfg) = &config {
            let start_soc_pct = (cfg.discharge_to_percent + cfg.charge_to_percent) / 2.0;
            self.state.stored_energy_wh = start_soc_pct / 100.0 * cfg.capacity_kwh * 1000.0;
        }
        self.config = config;
    }

    fn effective_capacity_kwh(&self, config: &BatteryConfig) -> f64 {
        let fraction_consumed = (self.state.equivalent_full_cycles / config.degradation_cycles).min(1.0);
        config.capacity_kwh * (1.0 - 0.2 * fraction_consumed)
    }

    pub fn soc_percent(&self) -> f64 {
        let Some(config) = &self.config else {
            return 0.0;
        };
        let effective_wh = self.effective_capacity_kwh(config) * 1000.0;
        if effective_wh <= 0.0 {
            return 0.0;
        }
        (self.state.stored_energy_wh / effective_wh * 100.0).clamp(0.0, 100.0)
    }

    pub fn snapshot(&self) -> BatterySnapshot {
        let (effective_capacity_kwh, degradation_pct) = match &self.config {
            Some(cfg) => {
                let effective = self.effective_capacity_kwh(cfg);
                (effective, (1.0 - effective / cfg.capacity_kwh) * 100.0)
            }
            None => (0.0, 0.0),
        };
        BatterySnapshot {
            soc_percent: self.soc_percent(),
            cycles: self.state.equivalent_full_cycles,
            effective_capacity_kwh,
            degradation_pct,
            time_at_power_sec: self.state.time_at_power_kw_sec.clone(),
            time_at_soc_pct_sec: self.state.time_at_soc_pct_sec.clone(),
            month_soc_seconds: self.state.month_soc_seconds.clone(),
        }
    }

    /// Advance the battery by `dt_secs` given the current raw net grid power
    /// and spot price. Returns the dispatch outcome; a completed arbitrage
    /// day, if any, is available afterwards via `take_day_log`.
    pub fn step(
        &mut self,
        t: DateTime<Utc>,
        dt_secs: f64,
        raw_grid_w: f64,
        spot_price_pln: f64,
        store: &ReadingStore,
    ) -> BatteryStepOutcome {
        let Some(config) = self.config.clone() else {
            return BatteryStepOutcome {
                battery_power_w: 0.0,
                adjusted_grid_w: raw_grid_w,
                soc_percent: 0.0,
            };
        };

        self.roll_day_if_needed(t, &config, store);

        let capacity_wh = config.capacity_kwh * 1000.0;
        let floor_wh = config.discharge_to_percent / 100.0 * capacity_wh;
        let ceiling_wh = config.charge_to_percent / 100.0 * capacity_wh;
        let eta = per_direction_efficiency();

        let mut desired_w = match raw_grid_w.partial_cmp(&0.0) {
            Some(std::cmp::Ordering::Less) => raw_grid_w.clamp(-config.max_power_w, 0.0),
            Some(std::cmp::Ordering::Greater) => raw_grid_w.clamp(0.0, config.max_power_w),
            _ => 0.0,
        };

        if config.mode == BatteryMode::Arbitrage {
            if let Some(plan) = &self.state.arbitrage_plan {
                if t >= plan.charge_start && t < plan.charge_end {
                    desired_w = -config.max_power_w;
                } else if t >= plan.discharge_start && t < plan.discharge_end {
                    desired_w = config.max_power_w;
                }
            }
        }

        let hours = dt_secs / 3600.0;
        let command_w = if desired_w < 0.0 {
            let max_absorbable_wh = ((ceiling_wh - self.state.stored_energy_wh) / eta).max(0.0);
            let max_absorbable_w = if hours > 0.0 { max_absorbable_wh / hours } else { 0.0 };
            desired_w.max(-max_absorbable_w)
        } else if desired_w > 0.0 {
            let max_deliverable_wh = ((self.state.stored_energy_wh - floor_wh) * eta).max(0.0);
            let max_deliverable_w = if hours > 0.0 { max_deliverable_wh / hours } else { 0.0 };
            desired_w.min(max_deliverable_w)
        } else {
            0.0
        };

        let external_energy_wh = command_w.abs() * hours;
        let stored_delta_wh = if command_w < 0.0 {
            external_energy_wh * eta
        } else if command_w > 0.0 {
            -(external_energy_wh / eta)
        } else {
            0.0
        };
        self.state.stored_energy_wh = (self.state.stored_energy_wh + stored_delta_wh).clamp(floor_wh, ceiling_wh);

        let cycles_delta = stored_delta_wh.abs() / (2.0 * capacity_wh);
        self.state.equivalent_full_cycles += cycles_delta;

        if command_w < 0.0 {
            self.day_charge_kwh += external_energy_wh / 1000.0;
        } else if command_w > 0.0 {
            self.day_discharge_kwh += external_energy_wh / 1000.0;
        }

        let soc_pct_bucket = self.soc_percent().round() as i32;
        *self.state.time_at_soc_pct_sec.entry(soc_pct_bucket).or_insert(0.0) += dt_secs;
        let power_kw_bucket = (command_w / 1000.0).round() as i32;
        *self.state.time_at_power_kw_sec.entry(power_kw_bucket).or_insert(0.0) += dt_secs;
        self.state
            .month_soc_seconds
            .entry(t.format("%Y-%m").to_string())
            .or_default()
            .entry(soc_pct_bucket)
            .and_modify(|s| *s += dt_secs)
            .or_insert(dt_secs);

        let _ = spot_price_pln;
        BatteryStepOutcome {
            battery_power_w: command_w,
            adjusted_grid_w: raw_grid_w - command_w,
            soc_percent: self.soc_percent(),
        }
    }

    fn roll_day_if_needed(&mut self, t: DateTime<Utc>, config: &BatteryConfig, store: &ReadingStore) {
        let day = t.date_naive();
        if self.current_day == Some(day) {
            return;
        }

        if let (Some(prev_day), Some(plan)) = (self.current_day, self.state.arbitrage_plan.clone()) {
            let gap_minutes = (plan.discharge_start - plan.charge_end).num_seconds() as f64 / 60.0;
            let cycles_delta = self.state.equivalent_full_cycles - self.day_cycles_start;
            let charge_mid = plan.charge_start + (plan.charge_end - plan.charge_start) / 2;
            let discharge_mid = plan.discharge_start + (plan.discharge_end - plan.discharge_start) / 2;
            let charge_price = store
                .at(self.spot_sensor_id.as_deref().unwrap_or(""), charge_mid)
                .map(|r| r.value)
                .unwrap_or(0.0);
            let discharge_price = store
                .at(self.spot_sensor_id.as_deref().unwrap_or(""), discharge_mid)
                .map(|r| r.value)
                .unwrap_or(0.0);
            let earnings_pln =
                self.day_discharge_kwh * discharge_price - self.day_charge_kwh * charge_price;

            self.pending_day_log = Some(ArbitrageDayRecord {
                date: prev_day,
                charge_start: plan.charge_start,
                charge_end: plan.charge_end,
                charge_kwh: self.day_charge_kwh,
                discharge_start: plan.discharge_start,
                discharge_end: plan.discharge_end,
                discharge_kwh: self.day_discharge_kwh,
                gap_minutes,
                cycles_delta,
                earnings_pln,
            });
        }

        self.day_charge_kwh = 0.0;
        self.day_discharge_kwh = 0.0;
        self.day_cycles_start = self.state.equivalent_full_cycles;
        self.current_day = Some(day);
        self.state.arbitrage_plan = None;

        if config.mode == BatteryMode::Arbitrage {
            if let Some(sensor_id) = &self.spot_sensor_id {
                self.state.arbitrage_plan = planner::plan_day(t, store, sensor_id, config);
                self.state.last_planned_day = Some(day);
            }
        }
    }

    /// Drain the arbitrage day log produced by the most recent step, if any
    /// (§4.4-8: "any pending ArbitrageDayLog").
    pub fn take_day_log(&mut self) -> Option<ArbitrageDayRecord> {
        self.pending_day_log.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use gridreplay_types::BatteryConfig;

    fn ts(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 1, h, m, 0).unwrap()
    }

    #[test]
    fn idle_without_config_passes_grid_through() {
        let mut sim = BatterySimulator::new(None);
        let store = ReadingStore::new();
        let outcome = sim.step(ts(12, 0), 3600.0, -2000.0, 0.3, &store);
        assert_eq!(outcome.battery_power_w, 0.0);
        assert_eq!(outcome.adjusted_grid_w, -2000.0);
    }

    #[test]
    fn self_consumption_absorbs_export_within_efficiency() {
        let mut sim = BatterySimulator::new(None);
        sim.reconfigure(Some(BatteryConfig {
            capacity_kwh: 10.0,
            max_power_w: 3000.0,
            discharge_to_percent: 10.0,
            charge_to_percent: 90.0,
            ..Default::default()
        }));
        let before_wh = sim.state().stored_energy_wh;
        let store = ReadingStore::new();
        let outcome = sim.step(ts(12, 0), 3600.0, -2000.0, 0.3, &store);
        assert!((outcome.adjusted_grid_w).abs() < 1e-6);
        let stored_delta_kwh = (sim.state().stored_energy_wh - before_wh) / 1000.0;
        let expected = 2.0 * crate::economics::per_direction_efficiency();
        assert!((stored_delta_kwh - expected).abs() < 1e-6, "{stored_delta_kwh} vs {expected}");
    }

    #[test]
    fn soc_never_crosses_bounds() {
        let mut sim = BatterySimulator::new(None);
        sim.reconfigure(Some(BatteryConfig {
            capacity_kwh: 1.0,
            max_power_w: 50_000.0,
            discharge_to_percent: 10.0,
            charge_to_percent: 90.0,
            ..Default::default()
        }));
        let store = ReadingStore::new();
        for _ in 0..10 {
            sim.step(ts(12, 0), 3600.0, -50_000.0, 0.3, &store);
        }
        assert!(sim.soc_percent() <= 90.0 + 1e-6);
        for _ in 0..10 {
            sim.step(ts(12, 0), 3600.0, 50_000.0, 0.3, &store);
        }
        assert!(sim.soc_percent() >= 10.0 - 1e-6);
    }

    #[test]
    fn cycles_are_monotonically_non_decreasing() {
        let mut sim = BatterySimulator::new(None);
        sim.reconfigure(Some(BatteryConfig::default()));
        let store = ReadingStore::new();
        let mut last = sim.state().equivalent_full_cycles;
        for grid in [-500.0, 500.0, -200.0, 1000.0] {
            sim.step(ts(12, 0), 60.0, grid, 0.3, &store);
            let now = sim.state().equivalent_full_cycles;
            assert!(now >= last);
            last = now;
        }
    }
}
