// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of gridreplay.

//! Prediction-mode heat-pump model (§4.4.1): a linear power predictor fitted
//! externally, plus a one-pole RC analogue for indoor temperature.

use gridreplay_types::InsulationLevel;

/// Linear fit coefficients. Fitted externally (R analytics, out of scope);
/// held here as defaults since no loader currently supplies them.
pub const DEFAULT_COEFF_A: f64 = -180.0;
pub const DEFAULT_COEFF_B: f64 = 400.0;
pub const DEFAULT_RATED_W: f64 = 3000.0;

/// Setpoint the predictor holds the home to. Neither §3's data model nor
/// §6's wire contract names a field for this, so it is fixed rather than
/// configurable (see DESIGN.md).
pub const DEFAULT_TARGET_INDOOR_C: f64 = 21.0;

/// `hp_power_W = a * delta_t + b`, `delta_t = target_indoor - (outdoor + offset)`.
pub fn predict_hp_power_w(outdoor_c: f64, temp_offset_c: f64, target_indoor_c: f64) -> f64 {
    let delta_t = target_indoor_c - (outdoor_c + temp_offset_c);
    (DEFAULT_COEFF_A * delta_t + DEFAULT_COEFF_B).clamp(0.0, DEFAULT_RATED_W)
}

/// One-pole lag of the predicted indoor temperature toward the setpoint,
/// parameterized by the insulation-level time constant (short = poor,
/// long = good — a well-insulated home changes temperature slowly).
pub fn predict_indoor_temp_c(previous_c: f64, target_indoor_c: f64, insulation: InsulationLevel, dt_secs: f64) -> f64 {
    let tau = insulation.time_constant_secs();
    let alpha = dt_secs / (tau + dt_secs);
    previous_c + alpha * (target_indoor_c - previous_c)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn colder_outside_raises_predicted_power() {
        let mild = predict_hp_power_w(10.0, 0.0, DEFAULT_TARGET_INDOOR_C);
        let cold = predict_hp_power_w(-10.0, 0.0, DEFAULT_TARGET_INDOOR_C);
        assert!(cold > mild);
    }

    #[test]
    fn power_never_goes_negative_or_above_rated() {
        let very_mild = predict_hp_power_w(40.0, 0.0, DEFAULT_TARGET_INDOOR_C);
        assert_eq!(very_mild, 0.0);
        let very_cold = predict_hp_power_w(-40.0, 0.0, DEFAULT_TARGET_INDOOR_C);
        assert_eq!(very_cold, DEFAULT_RATED_W);
    }

    #[test]
    fn indoor_temp_converges_toward_target() {
        let mut t = 15.0;
        for _ in 0..5000 {
            t = predict_indoor_temp_c(t, DEFAULT_TARGET_INDOOR_C, InsulationLevel::Average, 60.0);
        }
        assert!((t - DEFAULT_TARGET_INDOOR_C).abs() < 0.1);
    }

    #[test]
    fn poor_insulation_reacts_faster_than_good() {
        let poor = predict_indoor_temp_c(15.0, DEFAULT_TARGET_INDOOR_C, InsulationLevel::Poor, 3600.0);
        let good = predict_indoor_temp_c(15.0, DEFAULT_TARGET_INDOOR_C, InsulationLevel::Good, 3600.0);
        assert!(poor > good);
    }
}
