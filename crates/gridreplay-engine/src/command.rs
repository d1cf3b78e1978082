// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of gridreplay.

//! The engine's own command vocabulary — the validated counterpart of the
//! wire `ClientCommand` envelope (§4.4 ambient note). Translating an
//! untyped `ClientCommand` into one of these, or discarding it, is the
//! session bus's job; the engine never sees malformed input.

use chrono::{DateTime, Utc};
use gridreplay_types::{BatteryConfig, PvConfig, SimulationConfig};

#[derive(Debug, Clone, PartialEq)]
pub enum EngineCommand {
    Start,
    Pause,
    SetSpeed(f64),
    Seek(DateTime<Utc>),
    SetSource(String),
    SetPrediction(bool),
    SetBattery(Option<BatteryConfig>),
    SetPv(PvConfig),
    SetConfig(SimulationConfig),
}
