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

use serde::{Deserialize, Serialize};

/// Coarse thermal-mass tag parameterizing the one-pole RC time constant used
/// by the prediction-mode indoor-temperature model (§4.4.1).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum InsulationLevel {
    Poor,
    #[default]
    Average,
    Good,
}

impl InsulationLevel {
    /// Thermal time constant in seconds for the one-pole RC analogue.
    pub fn time_constant_secs(&self) -> f64 {
        match self {
            InsulationLevel::Poor => 2. * 3600.,
            InsulationLevel::Average => 6. * 3600.,
            InsulationLevel::Good => 18. * 3600.,
        }
    }
}

/// Tunable configuration knobs reconfigurable at runtime via `config:update`
/// without resetting the simulation (§4.4 Control contract).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SimulationConfig {
    #[serde(default = "default_export_coefficient")]
    pub export_coefficient: f64,
    #[serde(default = "default_price_threshold_pln")]
    pub price_threshold_pln: f64,
    #[serde(default)]
    pub temp_offset_c: f64,
    #[serde(default = "default_fixed_tariff_pln")]
    pub fixed_tariff_pln: f64,
    #[serde(default = "default_distribution_fee_pln")]
    pub distribution_fee_pln: f64,
    #[serde(default = "default_net_metering_ratio")]
    pub net_metering_ratio: f64,
    #[serde(default)]
    pub insulation_level: InsulationLevel,
}

fn default_export_coefficient() -> f64 {
    1.0
}
fn default_price_threshold_pln() -> f64 {
    0.30
}
fn default_fixed_tariff_pln() -> f64 {
    0.75
}
fn default_distribution_fee_pln() -> f64 {
    0.20
}
fn default_net_metering_ratio() -> f64 {
    0.8
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            export_coefficient: default_export_coefficient(),
            price_threshold_pln: default_price_threshold_pln(),
            temp_offset_c: 0.0,
            fixed_tariff_pln: default_fixed_tariff_pln(),
            distribution_fee_pln: default_distribution_fee_pln(),
            net_metering_ratio: default_net_metering_ratio(),
            insulation_level: InsulationLevel::default(),
        }
    }
}
