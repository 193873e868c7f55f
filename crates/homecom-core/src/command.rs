// ── Command API ──
//
// All write operations flow through a unified `Command` enum. Each
// variant maps to exactly one `PUT {path} {"value": ...}` against the
// device's resource tree; `Coordinator::execute` issues the write and
// then requests an out-of-cycle refresh so the next snapshot reflects
// the change without waiting for the timer.

use serde_json::{Value, json};

use homecom_api::endpoints::{ac, boiler};

/// HVAC operation modes accepted by rac devices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "camelCase")]
pub enum HvacMode {
    Auto,
    Heat,
    Cool,
    Dry,
    FanOnly,
}

/// Fan speeds accepted by rac devices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "camelCase")]
pub enum FanSpeed {
    Auto,
    Quiet,
    Low,
    Mid,
    High,
}

/// Extra-hot-water charge control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "camelCase")]
pub enum ChargeMode {
    Start,
    Stop,
}

/// All write operations against a device.
#[derive(Debug, Clone)]
pub enum Command {
    // ── Air conditioner (rac) ────────────────────────────────────────
    SetPower(bool),
    SetHvacMode(HvacMode),
    SetTemperature(f64),
    SetFanSpeed(FanSpeed),
    /// Horizontal louver position; options come from `allowedValues`.
    SetSwingHorizontal(String),
    /// Vertical louver position; options come from `allowedValues`.
    SetSwingVertical(String),
    SetEco(bool),
    SetBoost(bool),
    SetAirPurification(bool),
    SetProgramEnabled(bool),
    SetActiveProgram(String),
    /// Auto-off timer, minutes from now.
    SetTimerOn(u32),
    /// Auto-on timer, minutes from now.
    SetTimerOff(u32),

    // ── Boiler / heat pump (k30, k40, icom, wddw2) ───────────────────
    SetDhwOperationMode {
        circuit: String,
        mode: String,
    },
    SetDhwTemperatureLevel {
        circuit: String,
        level: String,
    },
    SetDhwTempLevelSetpoint {
        circuit: String,
        level: String,
        temperature: f64,
    },
    SetDhwCharge {
        circuit: String,
        mode: ChargeMode,
    },
    SetDhwChargeDuration {
        circuit: String,
        minutes: u32,
    },
    SetHcOperationMode {
        circuit: String,
        mode: String,
    },
    SetHcRoomSetpoint {
        circuit: String,
        temperature: f64,
    },
    SetHcSummerWinterMode {
        circuit: String,
        mode: String,
    },
    SetHcHeatCoolMode {
        circuit: String,
        mode: String,
    },
    SetAwayMode(bool),
    SetHolidayMode(String),
    SetVentilationMode {
        zone: String,
        mode: String,
    },
}

impl Command {
    /// The resource path and `value` body for this command.
    pub(crate) fn request(&self) -> (String, Value) {
        match self {
            Self::SetPower(on) => (ac::CONTROL.into(), on_off(*on)),
            Self::SetHvacMode(mode) => (ac::OPERATION_MODE.into(), json!(mode.to_string())),
            Self::SetTemperature(temperature) => {
                (ac::TEMPERATURE_SETPOINT.into(), json!(temperature))
            }
            Self::SetFanSpeed(speed) => (ac::FAN_SPEED.into(), json!(speed.to_string())),
            Self::SetSwingHorizontal(position) => {
                (ac::AIRFLOW_HORIZONTAL.into(), json!(position))
            }
            Self::SetSwingVertical(position) => (ac::AIRFLOW_VERTICAL.into(), json!(position)),
            Self::SetEco(on) => (ac::ECO_MODE.into(), on_off(*on)),
            Self::SetBoost(on) => (ac::FULL_POWER_MODE.into(), on_off(*on)),
            Self::SetAirPurification(on) => (ac::AIR_PURIFICATION_MODE.into(), on_off(*on)),
            Self::SetProgramEnabled(on) => (ac::PROGRAM_ENABLED.into(), on_off(*on)),
            Self::SetActiveProgram(program) => (ac::ACTIVE_PROGRAM.into(), json!(program)),
            Self::SetTimerOn(minutes) => (ac::TIMERS_ON.into(), json!(minutes)),
            Self::SetTimerOff(minutes) => (ac::TIMERS_OFF.into(), json!(minutes)),

            Self::SetDhwOperationMode { circuit, mode } => {
                (boiler::dhw_operation_mode(circuit), json!(mode))
            }
            Self::SetDhwTemperatureLevel { circuit, level } => {
                (boiler::dhw_temperature_level(circuit), json!(level))
            }
            Self::SetDhwTempLevelSetpoint {
                circuit,
                level,
                temperature,
            } => (
                boiler::dhw_temp_level_setpoint(circuit, level),
                json!(temperature),
            ),
            Self::SetDhwCharge { circuit, mode } => {
                (boiler::dhw_charge(circuit), json!(mode.to_string()))
            }
            Self::SetDhwChargeDuration { circuit, minutes } => {
                (boiler::dhw_charge_duration(circuit), json!(minutes))
            }
            Self::SetHcOperationMode { circuit, mode } => {
                (boiler::hc_operation_mode(circuit), json!(mode))
            }
            Self::SetHcRoomSetpoint {
                circuit,
                temperature,
            } => (boiler::hc_manual_room_setpoint(circuit), json!(temperature)),
            Self::SetHcSummerWinterMode { circuit, mode } => {
                (boiler::hc_suwi_mode(circuit), json!(mode))
            }
            Self::SetHcHeatCoolMode { circuit, mode } => {
                (boiler::hc_heatcool_mode(circuit), json!(mode))
            }
            Self::SetAwayMode(on) => (boiler::AWAY_MODE.into(), on_off(*on)),
            Self::SetHolidayMode(mode) => (boiler::HOLIDAY_MODE.into(), json!(mode)),
            Self::SetVentilationMode { zone, mode } => {
                (boiler::ventilation_mode(zone), json!(mode))
            }
        }
    }
}

fn on_off(on: bool) -> Value {
    json!(if on { "on" } else { "off" })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_strings_are_camel_case() {
        assert_eq!(HvacMode::FanOnly.to_string(), "fanOnly");
        assert_eq!(HvacMode::Auto.to_string(), "auto");
        assert_eq!(FanSpeed::Mid.to_string(), "mid");
        assert_eq!(ChargeMode::Start.to_string(), "start");
    }

    #[test]
    fn rac_commands_map_to_air_conditioning_paths() {
        let (path, value) = Command::SetPower(true).request();
        assert_eq!(path, "/airConditioning/acControl");
        assert_eq!(value, serde_json::json!("on"));

        let (path, value) = Command::SetTemperature(21.5).request();
        assert_eq!(path, "/airConditioning/temperatureSetpoint");
        assert_eq!(value, serde_json::json!(21.5));
    }

    #[test]
    fn circuit_commands_interpolate_the_circuit_id() {
        let (path, value) = Command::SetDhwTempLevelSetpoint {
            circuit: "dhw1".into(),
            level: "high".into(),
            temperature: 55.0,
        }
        .request();
        assert_eq!(path, "/dhwCircuits/dhw1/tempLevel/high");
        assert_eq!(value, serde_json::json!(55.0));

        let (path, _) = Command::SetVentilationMode {
            zone: "zone1".into(),
            mode: "demand".into(),
        }
        .request();
        assert_eq!(path, "/ventilation/zone1/operationMode");
    }
}
