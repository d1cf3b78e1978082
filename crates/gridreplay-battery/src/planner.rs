// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of gridreplay.

//! The arbitrage day planner (§4.3): once per simulated calendar day, look
//! ahead 24h of spot prices and pick a cheap charge window and an expensive
//! discharge window. O(log N + 24) via the store's point-in-time lookup,
//! sampled once per hour — planning happens once a day, not once a step
//! (§9 design note).

use chrono::{DateTime, Duration, Utc};
use gridreplay_store::ReadingStore;
use gridreplay_types::{ArbitragePlan, BatteryConfig};

use crate::economics::per_direction_efficiency;

const LOOKAHEAD_HOURS: i64 = 24;

/// Average spot price over an hourly-sampled window `[start_idx, start_idx + len)`.
fn window_avg(prices: &[f64], start_idx: usize, len: usize) -> f64 {
    let window = &prices[start_idx..start_idx + len];
    window.iter().sum::<f64>() / window.len() as f64
}

/// Plan one calendar day's charge/discharge windows, or `None` if no
/// profitable plan exists (no price data, or every candidate pair nets a
/// loss net of round-trip efficiency).
pub fn plan_day(
    now: DateTime<Utc>,
    store: &ReadingStore,
    spot_sensor_id: &str,
    config: &BatteryConfig,
) -> Option<ArbitragePlan> {
    let hourly_prices: Vec<f64> = (0..LOOKAHEAD_HOURS)
        .map(|h| {
            store
                .at(spot_sensor_id, now + Duration::hours(h))
                .map(|r| r.value)
        })
        .collect::<Option<Vec<_>>>()?;

    let headroom_kwh =
        ((config.charge_to_percent - config.discharge_to_percent) / 100.0 * config.capacity_kwh).max(0.0);
    if headroom_kwh <= 0.0 {
        return None;
    }
    let max_power_kw = (config.max_power_w / 1000.0).max(0.001);
    let window_hours = (headroom_kwh / max_power_kw).ceil().clamp(1.0, LOOKAHEAD_HOURS as f64) as usize;
    if window_hours >= hourly_prices.len() {
        return None;
    }

    let planned_kwh = (window_hours as f64 * max_power_kw).min(headroom_kwh);

    let charge_start_idx = (0..=hourly_prices.len() - window_hours)
        .min_by(|&a, &b| {
            window_avg(&hourly_prices, a, window_hours)
                .total_cmp(&window_avg(&hourly_prices, b, window_hours))
        })?;
    let charge_end_idx = charge_start_idx + window_hours;
    let charge_avg = window_avg(&hourly_prices, charge_start_idx, window_hours);

    if charge_end_idx + window_hours > hourly_prices.len() {
        return None;
    }
    let discharge_start_idx = (charge_end_idx..=hourly_prices.len() - window_hours)
        .max_by(|&a, &b| {
            window_avg(&hourly_prices, a, window_hours)
                .total_cmp(&window_avg(&hourly_prices, b, window_hours))
        })?;
    let discharge_avg = window_avg(&hourly_prices, discharge_start_idx, window_hours);

    let eta = per_direction_efficiency();
    let expected_profit =
        planned_kwh * discharge_avg * eta - planned_kwh * charge_avg / eta;
    if expected_profit <= 0.0 {
        return None;
    }

    let charge_start = now + Duration::hours(charge_start_idx as i64);
    let charge_end = now + Duration::hours(charge_end_idx as i64);
    let discharge_start = now + Duration::hours(discharge_start_idx as i64);
    let discharge_end = now + Duration::hours((discharge_start_idx + window_hours) as i64);

    Some(ArbitragePlan {
        charge_start,
        charge_end,
        discharge_start,
        discharge_end,
        planned_kwh,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use gridreplay_types::{Reading, SensorType};

    fn hourly_price_store(prices: [f64; 24], day_start: DateTime<Utc>) -> ReadingStore {
        let store = ReadingStore::new();
        let readings = prices
            .iter()
            .enumerate()
            .map(|(h, p)| Reading::new(day_start + Duration::hours(h as i64), "spot", *p, "PLN/kWh", SensorType::SpotPrice))
            .collect();
        store.ingest(readings);
        store
    }

    #[test]
    fn plans_cheap_charge_before_expensive_discharge() {
        let day_start = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let mut prices = [0.40_f64; 24];
        for p in prices.iter_mut().take(6).skip(1) {
            *p = 0.20;
        }
        for p in prices.iter_mut().take(22).skip(17) {
            *p = 1.00;
        }
        let store = hourly_price_store(prices, day_start);
        let config = BatteryConfig {
            capacity_kwh: 10.0,
            max_power_w: 3000.0,
            discharge_to_percent: 10.0,
            charge_to_percent: 90.0,
            ..Default::default()
        };
        let plan = plan_day(day_start, &store, "spot", &config).expect("should find a profitable plan");
        assert!(plan.charge_start >= day_start + Duration::hours(1));
        assert!(plan.charge_end <= day_start + Duration::hours(6));
        assert!(plan.discharge_start >= day_start + Duration::hours(17));
        assert!(plan.discharge_end <= day_start + Duration::hours(22));
        assert!(plan.discharge_start >= plan.charge_end);
    }

    #[test]
    fn no_plan_without_price_data() {
        let day_start = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let store = ReadingStore::new();
        let config = BatteryConfig::default();
        assert!(plan_day(day_start, &store, "spot", &config).is_none());
    }
}
