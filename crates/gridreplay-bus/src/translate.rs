// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of gridreplay.

//! Translate a deserialized `ClientCommand` into the engine's own
//! `EngineCommand` vocabulary (§4.4 ambient note). The session bus, not the
//! engine, is responsible for this boundary — the engine never sees
//! malformed input, only already-validated commands.

use gridreplay_engine::EngineCommand;
use gridreplay_types::{BatteryConfig, ClientCommand};

pub fn translate(command: ClientCommand) -> EngineCommand {
    match command {
        ClientCommand::SimStart => EngineCommand::Start,
        ClientCommand::SimPause => EngineCommand::Pause,
        ClientCommand::SimSetSpeed { speed } => EngineCommand::SetSpeed(speed),
        ClientCommand::SimSeek { timestamp } => EngineCommand::Seek(timestamp),
        ClientCommand::SimSetSource { source } => EngineCommand::SetSource(source),
        ClientCommand::SimSetPrediction { enabled } => EngineCommand::SetPrediction(enabled),
        ClientCommand::BatteryConfig {
            enabled,
            capacity_kwh,
            max_power_w,
            discharge_to_percent,
            charge_to_percent,
            degradation_cycles,
            mode,
        } => EngineCommand::SetBattery(enabled.then_some(BatteryConfig {
            capacity_kwh,
            max_power_w,
            discharge_to_percent,
            charge_to_percent,
            degradation_cycles,
            mode,
        })),
        ClientCommand::PvConfig { enabled, arrays } => {
            EngineCommand::SetPv(gridreplay_types::PvConfig { enabled, arrays })
        }
        ClientCommand::ConfigUpdate {
            export_coefficient,
            price_threshold_pln,
            temp_offset_c,
            fixed_tariff_pln,
            distribution_fee_pln,
            net_metering_ratio,
            insulation_level,
        } => EngineCommand::SetConfig(gridreplay_types::SimulationConfig {
            export_coefficient,
            price_threshold_pln,
            temp_offset_c,
            fixed_tariff_pln,
            distribution_fee_pln,
            net_metering_ratio,
            insulation_level,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn battery_config_disabled_becomes_nil_battery() {
        let cmd = ClientCommand::BatteryConfig {
            enabled: false,
            capacity_kwh: 10.0,
            max_power_w: 3000.0,
            discharge_to_percent: 10.0,
            charge_to_percent: 90.0,
            degradation_cycles: 6000.0,
            mode: gridreplay_types::BatteryMode::SelfConsumption,
        };
        assert_eq!(translate(cmd), EngineCommand::SetBattery(None));
    }

    #[test]
    fn sim_set_speed_translates_directly() {
        let cmd = ClientCommand::SimSetSpeed { speed: 7200.0 };
        assert_eq!(translate(cmd), EngineCommand::SetSpeed(7200.0));
    }
}
