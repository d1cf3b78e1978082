// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of gridreplay.

use gridreplay_engine::EngineHandle;

/// Axum application state: the one thing every handler needs is a way to
/// reach the engine.
#[derive(Clone)]
pub struct BusState {
    pub engine: EngineHandle,
    /// Capacity of each client's bounded outbound queue (§4.5 Backpressure).
    pub outbound_buffer_capacity: usize,
}

impl BusState {
    pub fn new(engine: EngineHandle, outbound_buffer_capacity: usize) -> Self {
        Self { engine, outbound_buffer_capacity }
    }
}
