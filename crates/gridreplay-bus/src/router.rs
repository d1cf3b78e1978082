// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of gridreplay.

//! Route table (§6 ambient note): `/healthz` liveness probe plus the single
//! `/ws` duplex upgrade are the entire HTTP surface. No auth, no dashboard
//! routes.

use axum::Router;
use axum::http::StatusCode;
use axum::routing::get;
use tower_http::cors::CorsLayer;

use crate::state::BusState;
use crate::ws::ws_handler;

pub fn build_router(state: BusState) -> Router {
    Router::new()
        .route("/healthz", get(health_handler))
        .route("/ws", get(ws_handler))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health_handler() -> StatusCode {
    StatusCode::OK
}
