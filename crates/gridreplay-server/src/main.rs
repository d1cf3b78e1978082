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

mod bootstrap;
mod config;
mod error;

use std::path::PathBuf;

use clap::Parser;
use gridreplay_bus::BusState;
use gridreplay_engine::Engine;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::FmtSubscriber;

use crate::config::ServerConfig;
use crate::error::StartupError;

#[derive(Debug, Parser)]
#[command(name = "gridreplay-server")]
struct Cli {
    /// Path to a TOML configuration file. Missing file falls back to
    /// defaults (§1.1 ambient note).
    #[arg(long, default_value = "gridreplay.toml")]
    config: PathBuf,
}

fn main() -> Result<(), StartupError> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let cli = Cli::parse();
    let config = ServerConfig::load(&cli.config)?;
    let bootstrapped = bootstrap::bootstrap(&config)?;

    info!(sensors = bootstrapped.catalog.len(), ranges = bootstrapped.named_ranges.len(), "bootstrap complete");

    let mut engine_config = config.to_engine_config();
    engine_config.named_ranges = bootstrapped.named_ranges.clone();
    let outbound_buffer_capacity = config.server.outbound_buffer_capacity;
    let bind_addr = config.bind_addr();

    let (engine, handle) = Engine::new(bootstrapped.store, bootstrapped.catalog, engine_config);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .expect("failed to create tokio runtime");

    runtime.block_on(async move {
        let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);

        let tick_interval = engine.tick_interval();
        let engine_task = tokio::task::spawn_blocking(move || engine.run(shutdown_rx));

        let listener = TcpListener::bind(&bind_addr)
            .await
            .map_err(StartupError::Bind)?;
        info!(addr = %bind_addr, tick_interval_ms = tick_interval.as_millis(), "listening");

        let router = gridreplay_bus::build_router(BusState::new(handle, outbound_buffer_capacity));

        let mut shutdown_signal = shutdown_tx.subscribe();
        let serve_result = axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                let ctrl_c = async {
                    let _ = tokio::signal::ctrl_c().await;
                };
                tokio::select! {
                    _ = ctrl_c => {
                        info!("ctrl-c received, shutting down");
                        let _ = shutdown_tx.send(true);
                    }
                    _ = shutdown_signal.changed() => {}
                }
            })
            .await;

        if let Err(error) = serve_result {
            warn!(%error, "http server exited with error");
        }
        let _ = engine_task.await;
        Ok(())
    })
}
