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

//! Scenario 6 (§8): a client that never reads must lag rather than ever
//! block the broadcaster, and the engine keeps advancing regardless of what
//! any individual subscriber does (§4.5 Backpressure, §9 design note).

use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{TimeZone, Utc};
use gridreplay_engine::{Engine, EngineCommand, EngineConfig};
use gridreplay_store::{ReadingStore, SensorCatalog};
use gridreplay_types::{EngineEvent, Reading, Sensor, SensorType};
use tokio::sync::broadcast::error::TryRecvError;

#[test]
fn slow_client_lags_without_stalling_the_engine() {
    let store = ReadingStore::new();
    let t0 = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
    store.ingest(vec![
        Reading::new(t0, "grid", 100.0, "W", SensorType::GridPower),
        Reading::new(t0 + chrono::Duration::hours(100), "grid", 100.0, "W", SensorType::GridPower),
    ]);
    let mut catalog = SensorCatalog::new();
    catalog.register(Sensor::new("grid", "Grid", SensorType::GridPower, "W"));

    let mut config = EngineConfig::default();
    config.event_buffer_capacity = 4;

    let (mut engine, handle) = Engine::new(Arc::new(store), Arc::new(catalog), config);

    // client A reads continuously; client B never reads.
    let mut client_a = handle.subscribe();
    let client_b = handle.subscribe();

    engine.apply(EngineCommand::Start);
    for _ in 0..20 {
        engine.tick(StdDuration::from_secs(1));
    }

    let initial_t = engine.sim_state_event();
    engine.tick(StdDuration::from_secs(1));
    let advanced_t = engine.sim_state_event();
    assert_ne!(initial_t, advanced_t, "engine must keep advancing regardless of a stalled subscriber");

    let mut last_sim_state = None;
    while let Ok(event) = client_a.try_recv() {
        if let EngineEvent::SimState { time, .. } = event {
            last_sim_state = Some(time);
        }
    }
    assert!(last_sim_state.is_some(), "the actively-reading client should still observe sim state");

    match client_b.try_recv() {
        Err(TryRecvError::Lagged(skipped)) => assert!(skipped > 0),
        other => panic!("expected the idle client to report a lag, got {other:?}"),
    }
}
