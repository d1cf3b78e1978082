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

//! Exercises the full wire-to-engine path: JSON text -> `ClientCommand` ->
//! `translate` -> `EngineCommand` -> `Engine::apply`, the same sequence
//! `gridreplay_bus::ws::handle_socket` runs per inbound frame (§6, §4.4).

use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{TimeZone, Utc};
use gridreplay_bus::translate;
use gridreplay_engine::{Engine, EngineCommand, EngineConfig};
use gridreplay_store::{ReadingStore, SensorCatalog};
use gridreplay_types::{ClientCommand, Reading, Sensor, SensorType};

fn fixture() -> (Arc<ReadingStore>, Arc<SensorCatalog>) {
    let store = ReadingStore::new();
    let t0 = Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap();
    store.ingest(vec![Reading::new(t0, "grid", 100.0, "W", SensorType::GridPower)]);
    let mut catalog = SensorCatalog::new();
    catalog.register(Sensor::new("grid", "Grid", SensorType::GridPower, "W"));
    (Arc::new(store), Arc::new(catalog))
}

/// Scenario 5: an unrecognized `type` fails to deserialize into
/// `ClientCommand` and is dropped before it ever reaches the engine.
#[test]
fn unknown_command_type_fails_to_deserialize() {
    let malformed = r#"{"type":"sim:bogus","payload":{}}"#;
    let result = serde_json::from_str::<ClientCommand>(malformed);
    assert!(result.is_err(), "an unrecognized type should not parse into ClientCommand");
}

/// A well-formed command is deserialized, translated, and observably applied.
#[test]
fn sim_start_command_translates_and_runs_the_clock() {
    let (store, catalog) = fixture();
    let (mut engine, _handle) = Engine::new(store, catalog, EngineConfig::default());

    let wire = r#"{"type":"sim:start","payload":null}"#;
    let command: ClientCommand = serde_json::from_str(wire).expect("sim:start should parse");
    engine.apply(translate(command));

    let before = engine.sim_state_event();
    engine.tick(StdDuration::from_secs(1));
    let after = engine.sim_state_event();
    assert_ne!(before, after, "ticking a running engine should change sim state");
}

/// `sim:set_speed` round-trips through the wire envelope into the exact
/// clamped `EngineCommand` the engine itself expects.
#[test]
fn sim_set_speed_round_trips_through_the_wire() {
    let wire = r#"{"type":"sim:set_speed","payload":{"speed":7200.0}}"#;
    let command: ClientCommand = serde_json::from_str(wire).unwrap();
    assert_eq!(translate(command), EngineCommand::SetSpeed(7200.0));
}
