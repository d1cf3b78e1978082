// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of gridreplay.

//! The virtual-clock engine (§4.4): a pace-controlled replay loop over owned
//! state. `tick` is a pure, synchronous advance function so it can be driven
//! either by `run`'s real sleep loop or directly in tests. Global mutable
//! simulation state is confined to this module (§9 design note); every other
//! task observes it only through `EngineEvent`s.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration as StdDuration, Instant};

use chrono::{DateTime, Duration, Utc};
use tokio::sync::{broadcast, mpsc, oneshot};

use gridreplay_battery::BatterySimulator;
use gridreplay_store::{ReadingStore, SensorCatalog};
use gridreplay_types::{
    BatteryMode, EnergyBucket, EngineEvent, PvConfig, Sensor, SensorType, SimulationConfig,
    SummaryAccumulators, TimeRange,
};

use crate::command::EngineCommand;

/// Startup configuration for the engine (§3.1's `ServerConfig`-equivalent,
/// the subset the engine itself owns).
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub tick_interval: StdDuration,
    pub event_buffer_capacity: usize,
    pub default_speed: f64,
    pub named_ranges: HashMap<String, TimeRange>,
    pub default_source: String,
    pub battery: Option<gridreplay_types::BatteryConfig>,
    pub pv: PvConfig,
    pub sim: SimulationConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tick_interval: StdDuration::from_millis(100),
            event_buffer_capacity: 256,
            default_speed: 3600.0,
            named_ranges: HashMap::new(),
            default_source: "all".to_string(),
            battery: None,
            pv: PvConfig::default(),
            sim: SimulationConfig::default(),
        }
    }
}

/// Cloneable front door to the engine task: send commands in, subscribe to
/// events out.
#[derive(Clone)]
pub struct EngineHandle {
    commands: mpsc::UnboundedSender<EngineCommand>,
    events: broadcast::Sender<EngineEvent>,
    snapshots: mpsc::UnboundedSender<oneshot::Sender<(EngineEvent, EngineEvent)>>,
}

impl EngineHandle {
    pub fn send(&self, command: EngineCommand) {
        if self.commands.send(command).is_err() {
            tracing::warn!("engine command channel closed, dropping command");
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.events.subscribe()
    }

    /// Request the current `(DataLoaded, SimState)` pair so a freshly
    /// connected client can boot with consistent state (§4.5: "on new-client
    /// connect, the bus immediately sends a DataLoaded snapshot ... and a
    /// SimState snapshot").
    pub async fn request_snapshot(&self) -> Option<(EngineEvent, EngineEvent)> {
        let (tx, rx) = oneshot::channel();
        self.snapshots.send(tx).ok()?;
        rx.await.ok()
    }
}

pub struct Engine {
    store: Arc<ReadingStore>,
    catalog: Arc<SensorCatalog>,
    command_rx: mpsc::UnboundedReceiver<EngineCommand>,
    snapshot_rx: mpsc::UnboundedReceiver<oneshot::Sender<(EngineEvent, EngineEvent)>>,
    events: broadcast::Sender<EngineEvent>,

    tick_interval: StdDuration,
    named_ranges: HashMap<String, TimeRange>,

    range: TimeRange,
    t: DateTime<Utc>,
    speed: f64,
    running: bool,
    prediction_enabled: bool,
    sim: SimulationConfig,
    pv: PvConfig,
    battery: BatterySimulator,

    summary: SummaryAccumulators,
    today_date: chrono::NaiveDate,
    month_tag: String,
    last_values: HashMap<String, f64>,
    predicted_indoor_c: Option<f64>,
    last_summary_publish: Instant,
    last_battery_summary_publish: Instant,

    grid_sensor: Option<String>,
    pv_sensor: Option<String>,
    hp_consumption_sensor: Option<String>,
    hp_production_sensor: Option<String>,
    outdoor_sensor: Option<String>,
    indoor_sensor: Option<String>,
    spot_sensor: Option<String>,
}

fn slot_id(catalog: &SensorCatalog, kind: SensorType) -> Option<String> {
    catalog.slot(kind).map(|s: &Sensor| s.id.clone())
}

fn accumulate(bucket: &mut EnergyBucket, delta: &EnergyBucket) {
    bucket.grid_import_kwh += delta.grid_import_kwh;
    bucket.grid_export_kwh += delta.grid_export_kwh;
    bucket.pv_production_kwh += delta.pv_production_kwh;
    bucket.heat_pump_electrical_kwh += delta.heat_pump_electrical_kwh;
    bucket.heat_pump_thermal_kwh += delta.heat_pump_thermal_kwh;
    bucket.self_consumption_kwh += delta.self_consumption_kwh;
    bucket.home_demand_kwh += delta.home_demand_kwh;
    bucket.battery_savings_kwh += delta.battery_savings_kwh;
    bucket.battery_savings_pln += delta.battery_savings_pln;
    bucket.cost_raw_pln += delta.cost_raw_pln;
    bucket.cost_self_consumption_pln += delta.cost_self_consumption_pln;
    bucket.cost_arbitrage_pln += delta.cost_arbitrage_pln;
    bucket.cheap_export_kwh += delta.cheap_export_kwh;
    bucket.cheap_export_revenue_pln += delta.cheap_export_revenue_pln;
}

impl Engine {
    pub fn new(store: Arc<ReadingStore>, catalog: Arc<SensorCatalog>, config: EngineConfig) -> (Engine, EngineHandle) {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (snapshot_tx, snapshot_rx) = mpsc::unbounded_channel();
        let (events, _) = broadcast::channel(config.event_buffer_capacity.max(1));

        let range = config
            .named_ranges
            .get(&config.default_source)
            .copied()
            .or_else(|| store.global_range())
            .unwrap_or_else(|| TimeRange::new(Utc::now(), Utc::now()));

        let spot_sensor = slot_id(&catalog, SensorType::SpotPrice);
        let battery = BatterySimulator::new(spot_sensor.clone());

        let mut engine = Engine {
            store,
            catalog: catalog.clone(),
            command_rx,
            snapshot_rx,
            events: events.clone(),
            tick_interval: config.tick_interval,
            named_ranges: config.named_ranges,
            range,
            t: range.start,
            speed: config.default_speed.clamp(1.0, 86400.0),
            running: false,
            prediction_enabled: false,
            sim: config.sim,
            pv: config.pv,
            battery,
            summary: SummaryAccumulators::default(),
            today_date: range.start.date_naive(),
            month_tag: range.start.format("%Y-%m").to_string(),
            last_values: HashMap::new(),
            predicted_indoor_c: None,
            last_summary_publish: Instant::now(),
            last_battery_summary_publish: Instant::now(),
            grid_sensor: slot_id(&catalog, SensorType::GridPower),
            pv_sensor: slot_id(&catalog, SensorType::PvPower),
            hp_consumption_sensor: slot_id(&catalog, SensorType::HeatPumpConsumption),
            hp_production_sensor: slot_id(&catalog, SensorType::HeatPumpProduction),
            outdoor_sensor: slot_id(&catalog, SensorType::OutdoorTemperature),
            indoor_sensor: slot_id(&catalog, SensorType::IndoorTemperature),
            spot_sensor,
        };
        engine.battery.reconfigure(config.battery);

        let handle = EngineHandle { commands: command_tx, events, snapshots: snapshot_tx };
        (engine, handle)
    }

    pub fn tick_interval(&self) -> StdDuration {
        self.tick_interval
    }

    /// Announce the initial bootstrap state to any subscriber connecting
    /// before the first tick (§4.5: new clients get `data:loaded`+`sim:state`
    /// from the bus; this is the data the bus reads to build it).
    pub fn data_loaded_event(&self) -> EngineEvent {
        EngineEvent::DataLoaded {
            sensors: self.catalog.all().cloned().collect(),
            time_range: self.range,
            pv: self.pv.clone(),
        }
    }

    pub fn sim_state_event(&self) -> EngineEvent {
        EngineEvent::SimState { time: self.t, speed: self.speed, running: self.running }
    }

    /// Blocking replay loop; intended to run inside `spawn_blocking` (§4.4
    /// ambient note). Exits when `shutdown` is signalled.
    pub fn run(mut self, mut shutdown: tokio::sync::watch::Receiver<bool>) {
        loop {
            std::thread::sleep(self.tick_interval);
            if *shutdown.borrow() {
                tracing::info!("engine shutting down");
                break;
            }
            self.drain_commands();
            self.tick(self.tick_interval);
        }
    }

    fn drain_commands(&mut self) {
        while let Ok(command) = self.command_rx.try_recv() {
            self.apply(command);
        }
        while let Ok(reply) = self.snapshot_rx.try_recv() {
            let _ = reply.send((self.data_loaded_event(), self.sim_state_event()));
        }
    }

    pub fn apply(&mut self, command: EngineCommand) {
        match command {
            EngineCommand::Start => {
                self.running = true;
                tracing::info!("simulation started");
            }
            EngineCommand::Pause => {
                self.running = false;
                tracing::info!("simulation paused");
            }
            EngineCommand::SetSpeed(speed) => {
                self.speed = speed.clamp(1.0, 86400.0);
            }
            EngineCommand::Seek(ts) => {
                self.seek_reset(ts);
            }
            EngineCommand::SetSource(tag) => {
                if let Some(range) = self.named_ranges.get(&tag).copied() {
                    self.range = range;
                    self.full_reset(range.start);
                } else {
                    tracing::warn!(source = %tag, "unknown time-range source, ignoring");
                }
            }
            EngineCommand::SetPrediction(enabled) => {
                self.prediction_enabled = enabled;
                self.full_reset(self.range.start);
            }
            EngineCommand::SetBattery(config) => {
                self.battery.reconfigure(config);
                self.full_reset(self.range.start);
            }
            EngineCommand::SetPv(config) => {
                self.pv = config;
                self.full_reset(self.range.start);
            }
            EngineCommand::SetConfig(config) => {
                self.sim = config;
            }
        }
    }

    /// `seek(ts)`: clamp to range, reset today/month buckets and battery
    /// state, clear the per-day arbitrage plan. `all_time` is deliberately
    /// left untouched (I4: accumulators are monotonically non-decreasing).
    fn seek_reset(&mut self, new_time: DateTime<Utc>) {
        self.t = self.range.clamp(new_time);
        self.summary.today = EnergyBucket::default();
        self.summary.month = EnergyBucket::default();
        let battery_config = self.battery.config().cloned();
        self.battery.reconfigure(battery_config);
        self.last_values.clear();
        self.predicted_indoor_c = None;
        self.today_date = self.t.date_naive();
        self.month_tag = self.t.format("%Y-%m").to_string();
        let _ = self.events.send(self.sim_state_event());
        let _ = self.events.send(EngineEvent::SummaryUpdate(self.summary.clone()));
    }

    /// Full reset used by `set_battery`/`set_time_range`/`set_prediction`/
    /// `set_pv`: same as `seek_reset` but also clears `all_time`, since each
    /// of these changes the policy the whole history is evaluated under.
    fn full_reset(&mut self, new_time: DateTime<Utc>) {
        self.summary = SummaryAccumulators::default();
        self.seek_reset(new_time);
    }

    fn reading_value(&self, sensor_id: Option<&str>, t: DateTime<Utc>) -> Option<f64> {
        self.store.at(sensor_id?, t).map(|r| r.value)
    }

    /// One replay step. No-op (beyond consuming the interval) while paused.
    pub fn tick(&mut self, dt_wall: StdDuration) {
        if !self.running {
            return;
        }

        let remaining_secs = (self.range.end - self.t).num_milliseconds() as f64 / 1000.0;
        let dt_sim_secs = (self.speed * dt_wall.as_secs_f64()).min(remaining_secs.max(0.0));
        if dt_sim_secs <= 0.0 {
            self.running = false;
            return;
        }
        let new_t = self.t + Duration::milliseconds((dt_sim_secs * 1000.0) as i64);

        let raw_grid_w = self.reading_value(self.grid_sensor.as_deref(), new_t).unwrap_or(0.0);
        let pv_w = self.reading_value(self.pv_sensor.as_deref(), new_t).unwrap_or(0.0);
        let hp_actual_w = self.reading_value(self.hp_consumption_sensor.as_deref(), new_t);
        let hp_thermal_w = self.reading_value(self.hp_production_sensor.as_deref(), new_t).unwrap_or(0.0);
        let outdoor_c = self.reading_value(self.outdoor_sensor.as_deref(), new_t);
        let indoor_actual_c = self
            .indoor_sensor
            .as_deref()
            .and_then(|id| self.store.at(id, new_t))
            .map(|r| r.value);
        let spot_price = self
            .reading_value(self.spot_sensor.as_deref(), new_t)
            .unwrap_or(self.summary.current_spot_price_pln);

        let mut effective_grid_w = raw_grid_w;
        if self.prediction_enabled {
            if let Some(outdoor_c) = outdoor_c {
                let predicted_power_w = crate::prediction::predict_hp_power_w(
                    outdoor_c,
                    self.sim.temp_offset_c,
                    crate::prediction::DEFAULT_TARGET_INDOOR_C,
                );
                let previous_indoor = self
                    .predicted_indoor_c
                    .or(indoor_actual_c)
                    .unwrap_or(crate::prediction::DEFAULT_TARGET_INDOOR_C);
                let predicted_indoor_c = crate::prediction::predict_indoor_temp_c(
                    previous_indoor,
                    crate::prediction::DEFAULT_TARGET_INDOOR_C,
                    self.sim.insulation_level,
                    dt_sim_secs,
                );
                self.predicted_indoor_c = Some(predicted_indoor_c);

                effective_grid_w += predicted_power_w - hp_actual_w.unwrap_or(0.0);

                let _ = self.events.send(EngineEvent::PredictionComparison {
                    actual_power_w: hp_actual_w.unwrap_or(0.0),
                    predicted_power_w,
                    actual_temp_c: indoor_actual_c,
                    predicted_temp_c: Some(predicted_indoor_c),
                    has_actual_temp: indoor_actual_c.is_some(),
                });
            }
        }

        let outcome = self.battery.step(new_t, dt_sim_secs, effective_grid_w, spot_price, &self.store);

        self.update_summary(
            new_t,
            dt_sim_secs,
            raw_grid_w,
            pv_w,
            hp_actual_w.unwrap_or(0.0),
            hp_thermal_w,
            spot_price,
            outcome.battery_power_w,
            outcome.adjusted_grid_w,
        );

        self.t = new_t;

        for sensor in self.catalog.all() {
            if let Some(reading) = self.store.at(&sensor.id, new_t) {
                let changed = self.last_values.get(&sensor.id).is_none_or(|&v| v != reading.value);
                if changed {
                    self.last_values.insert(sensor.id.clone(), reading.value);
                    let _ = self.events.send(EngineEvent::SensorReading {
                        sensor_id: sensor.id.clone(),
                        value: reading.value,
                        unit: reading.unit.clone(),
                        timestamp: new_t,
                    });
                }
            }
        }

        let _ = self.events.send(self.sim_state_event());

        if self.last_summary_publish.elapsed() >= StdDuration::from_secs(1) {
            let _ = self.events.send(EngineEvent::SummaryUpdate(self.summary.clone()));
            self.last_summary_publish = Instant::now();
        }

        if self.battery.config().is_some() && self.last_battery_summary_publish.elapsed() >= StdDuration::from_secs(1) {
            let _ = self.events.send(EngineEvent::BatterySummary(self.battery.snapshot()));
            self.last_battery_summary_publish = Instant::now();
        }

        let _ = self.events.send(EngineEvent::BatteryUpdate {
            battery_power_w: outcome.battery_power_w,
            adjusted_grid_w: outcome.adjusted_grid_w,
            soc_percent: outcome.soc_percent,
            timestamp: new_t,
        });

        if let Some(record) = self.battery.take_day_log() {
            let _ = self.events.send(EngineEvent::ArbitrageDayLog { records: vec![record] });
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn update_summary(
        &mut self,
        new_t: DateTime<Utc>,
        dt_secs: f64,
        raw_grid_w: f64,
        pv_w: f64,
        hp_w: f64,
        hp_thermal_w: f64,
        spot_price: f64,
        battery_power_w: f64,
        adjusted_grid_w: f64,
    ) {
        let day = new_t.date_naive();
        if day != self.today_date {
            self.summary.today = EnergyBucket::default();
            self.today_date = day;
        }
        let month_tag = new_t.format("%Y-%m").to_string();
        if month_tag != self.month_tag {
            self.summary.month = EnergyBucket::default();
            self.month_tag = month_tag;
        }

        let hours = dt_secs / 3600.0;
        let export_w = (-adjusted_grid_w).max(0.0);
        let self_consumption_w = (pv_w.max(0.0) - export_w).max(0.0);
        let home_demand_w = pv_w.max(0.0) + adjusted_grid_w;

        let raw_cost_delta = cost_delta(raw_grid_w, hours, spot_price, &self.sim);
        let adjusted_cost_delta = cost_delta(adjusted_grid_w, hours, spot_price, &self.sim);

        let mut delta = EnergyBucket {
            grid_import_kwh: adjusted_grid_w.max(0.0) * hours / 1000.0,
            grid_export_kwh: export_w * hours / 1000.0,
            pv_production_kwh: pv_w.max(0.0) * hours / 1000.0,
            heat_pump_electrical_kwh: hp_w.max(0.0) * hours / 1000.0,
            heat_pump_thermal_kwh: hp_thermal_w.max(0.0) * hours / 1000.0,
            self_consumption_kwh: self_consumption_w * hours / 1000.0,
            home_demand_kwh: home_demand_w * hours / 1000.0,
            battery_savings_kwh: battery_power_w.abs() * hours / 1000.0,
            battery_savings_pln: battery_power_w.abs() * hours / 1000.0 * spot_price,
            cost_raw_pln: raw_cost_delta,
            cost_self_consumption_pln: raw_cost_delta,
            cost_arbitrage_pln: raw_cost_delta,
            cheap_export_kwh: 0.0,
            cheap_export_revenue_pln: 0.0,
        };

        match self.battery.config().map(|c| c.mode) {
            Some(BatteryMode::SelfConsumption) => delta.cost_self_consumption_pln = adjusted_cost_delta,
            Some(BatteryMode::Arbitrage) => delta.cost_arbitrage_pln = adjusted_cost_delta,
            None => {}
        }

        if spot_price <= self.sim.price_threshold_pln {
            let export_kwh = export_w * hours / 1000.0;
            delta.cheap_export_kwh = export_kwh;
            delta.cheap_export_revenue_pln = export_kwh * spot_price * self.sim.net_metering_ratio;
        }

        accumulate(&mut self.summary.today, &delta);
        accumulate(&mut self.summary.month, &delta);
        accumulate(&mut self.summary.all_time, &delta);
        self.summary.current_spot_price_pln = spot_price;
    }
}

/// Cost delta over `hours` of `grid_w` (positive = import): import costed via
/// `spot * export_coefficient + distribution_fee`, export credited via
/// `spot * net_metering_ratio` (§4.4-7).
fn cost_delta(grid_w: f64, hours: f64, spot_price: f64, sim: &SimulationConfig) -> f64 {
    if grid_w >= 0.0 {
        let kwh = grid_w * hours / 1000.0;
        kwh * (spot_price * sim.export_coefficient + sim.distribution_fee_pln)
    } else {
        let kwh = -grid_w * hours / 1000.0;
        -(kwh * spot_price * sim.net_metering_ratio)
    }
}
