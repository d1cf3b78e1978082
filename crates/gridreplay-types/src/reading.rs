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

use crate::sensor::SensorType;

/// A single (timestamp, sensor id, value) sample. Immutable once ingested;
/// within a sensor's series readings are kept strictly sorted by `timestamp`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub timestamp: DateTime<Utc>,
    pub sensor_id: String,
    pub value: f64,
    pub unit: String,
    pub sensor_type: SensorType,
}

impl Reading {
    pub fn new(
        timestamp: DateTime<Utc>,
        sensor_id: impl Into<String>,
        value: f64,
        unit: impl Into<String>,
        sensor_type: SensorType,
    ) -> Self {
        Self {
            timestamp,
            sensor_id: sensor_id.into(),
            value,
            unit: unit.into(),
            sensor_type,
        }
    }
}
