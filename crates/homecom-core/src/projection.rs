// ── Field projection tables ──
//
// One static table per device type replaces the zoo of per-field entity
// subclasses: each row names a display key, the host platform it belongs
// to, where in the snapshot the value lives, and how to render it. A
// single generic entity (`entity::ProjectedEntity`) reads these rows.
// The tables are validated once at startup against the device-type
// schema instead of re-parsing id strings on every read.

use crate::error::CoreError;
use crate::model::{DeviceSnapshot, RefField, UNKNOWN};
use homecom_api::DeviceType;

/// Host entity platform a projection surfaces on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum Platform {
    Climate,
    Sensor,
    Switch,
    Select,
    WaterHeater,
    Fan,
    Text,
}

/// Where in the snapshot a projected value lives.
///
/// The circuit-scoped variants (`Dhw`, `Hc`, `Ventilation`) expand to
/// one entity per circuit at entity-build time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    /// Standard-function reference by id suffix (rac).
    Standard(&'static str),
    /// Advanced-function reference by id suffix (rac).
    Advanced(&'static str),
    /// Switch-program reference by id suffix (rac).
    SwitchProgram(&'static str),
    /// Per-DHW-circuit field.
    Dhw(&'static str),
    /// Per-heating-circuit field.
    Hc(&'static str),
    /// Per-ventilation-zone field.
    Ventilation(&'static str),
    /// Heat-source telemetry field.
    HeatSource(&'static str),
    OutdoorTemp,
    HolidayMode,
    AwayMode,
    PowerLimitation,
    Firmware,
    Notifications,
}

/// How a resolved field becomes a display state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Render {
    /// The value alone.
    Value,
    /// Value and unit concatenated (`"21C"`).
    ValueWithUnit,
    /// An on/off state ("on" means active).
    OnOff,
    /// Value plus the `allowedValues` option list.
    Options,
    /// All notifications joined as `"{dcd}-{ccd}"` lines.
    NotificationJoin,
    /// The temp-level setpoint named by the circuit's current operation
    /// mode (wddw2 temperature display).
    TempLevelOfMode,
}

/// One row of the projection table.
#[derive(Debug)]
pub struct FieldProjection {
    pub key: &'static str,
    pub platform: Platform,
    pub source: Source,
    pub render: Render,
}

/// The resolved display state of one projection against one snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectedState {
    pub state: String,
    pub options: Vec<String>,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl ProjectedState {
    /// On/off interpretation for switch platforms.
    pub fn is_on(&self) -> bool {
        self.state == "on"
    }
}

const fn row(
    key: &'static str,
    platform: Platform,
    source: Source,
    render: Render,
) -> FieldProjection {
    FieldProjection {
        key,
        platform,
        source,
        render,
    }
}

const RAC: &[FieldProjection] = &[
    row("power", Platform::Climate, Source::Standard("acControl"), Render::OnOff),
    row("hvac_mode", Platform::Climate, Source::Standard("operationMode"), Render::Value),
    row("target_temperature", Platform::Climate, Source::Standard("temperatureSetpoint"), Render::Value),
    row("current_temperature", Platform::Climate, Source::Standard("roomTemperature"), Render::Value),
    row("fan_mode", Platform::Climate, Source::Standard("fanSpeed"), Render::Options),
    row("airflow_horizontal", Platform::Select, Source::Standard("airFlowHorizontal"), Render::Options),
    row("airflow_vertical", Platform::Select, Source::Standard("airFlowVertical"), Render::Options),
    row("program", Platform::Select, Source::SwitchProgram("activeProgram"), Render::Options),
    row("program_enabled", Platform::Switch, Source::SwitchProgram("enabled"), Render::OnOff),
    row("eco_mode", Platform::Switch, Source::Advanced("ecoMode"), Render::OnOff),
    row("boost_mode", Platform::Switch, Source::Advanced("fullPowerMode"), Render::OnOff),
    row("plasmacluster", Platform::Switch, Source::Advanced("airPurificationMode"), Render::OnOff),
    row("notifications", Platform::Sensor, Source::Notifications, Render::NotificationJoin),
    row("firmware", Platform::Sensor, Source::Firmware, Render::Value),
];

const BOILER: &[FieldProjection] = &[
    row("hc_operation_mode", Platform::Select, Source::Hc("operationMode"), Render::Options),
    row("hc_suwi_mode", Platform::Select, Source::Hc("currentSuWiMode"), Render::Options),
    row("hc_heatcool_mode", Platform::Select, Source::Hc("heatCoolMode"), Render::Options),
    row("hc_room_setpoint", Platform::Climate, Source::Hc("currentRoomSetpoint"), Render::Value),
    row("hc_manual_room_setpoint", Platform::Text, Source::Hc("manualRoomSetpoint"), Render::Value),
    row("hc_room_temperature", Platform::Sensor, Source::Hc("roomTemp"), Render::Value),
    row("hc_humidity", Platform::Sensor, Source::Hc("actualHumidity"), Render::Value),
    row("dhw_operation_mode", Platform::WaterHeater, Source::Dhw("operationMode"), Render::Options),
    row("dhw_temperature", Platform::Sensor, Source::Dhw("actualTemp"), Render::ValueWithUnit),
    row("dhw_temperature_level", Platform::Select, Source::Dhw("currentTemperatureLevel"), Render::Options),
    row("dhw_charge", Platform::Switch, Source::Dhw("charge"), Render::OnOff),
    row("dhw_charge_remaining", Platform::Sensor, Source::Dhw("chargeRemainingTime"), Render::Value),
    row("dhw_single_charge_setpoint", Platform::Sensor, Source::Dhw("singleChargeSetpoint"), Render::Value),
    row("ventilation_mode", Platform::Fan, Source::Ventilation("operationMode"), Render::Options),
    row("ventilation_fan_level", Platform::Sensor, Source::Ventilation("exhaustFanLevel"), Render::Value),
    row("heat_source", Platform::Sensor, Source::HeatSource("pumpType"), Render::Value),
    row("heat_source_return_temperature", Platform::Sensor, Source::HeatSource("returnTemperature"), Render::ValueWithUnit),
    row("heat_source_supply_temperature", Platform::Sensor, Source::HeatSource("actualSupplyTemperature"), Render::ValueWithUnit),
    row("heat_source_modulation", Platform::Sensor, Source::HeatSource("actualModulation"), Render::ValueWithUnit),
    row("outdoor_temperature", Platform::Sensor, Source::OutdoorTemp, Render::ValueWithUnit),
    row("holiday_mode", Platform::Select, Source::HolidayMode, Render::Options),
    row("away_mode", Platform::Select, Source::AwayMode, Render::Options),
    row("power_limitation", Platform::Sensor, Source::PowerLimitation, Render::Value),
    row("notifications", Platform::Sensor, Source::Notifications, Render::NotificationJoin),
    row("firmware", Platform::Sensor, Source::Firmware, Render::Value),
];

const HOT_WATER: &[FieldProjection] = &[
    row("dhw_operation_mode", Platform::WaterHeater, Source::Dhw("operationMode"), Render::Options),
    row("dhw_temperature", Platform::Sensor, Source::Dhw("operationMode"), Render::TempLevelOfMode),
    row("dhw_fan_speed", Platform::Sensor, Source::Dhw("fanSpeed"), Render::Value),
    row("dhw_water_flow", Platform::Sensor, Source::Dhw("waterFlow"), Render::Value),
    row("dhw_inlet_temperature", Platform::Sensor, Source::Dhw("inletTemperature"), Render::Value),
    row("dhw_outlet_temperature", Platform::Sensor, Source::Dhw("outletTemperature"), Render::Value),
    row("dhw_airbox_temperature", Platform::Sensor, Source::Dhw("airBoxTemperature"), Render::Value),
    row("dhw_starts", Platform::Sensor, Source::Dhw("nbStarts"), Render::Value),
    row("notifications", Platform::Sensor, Source::Notifications, Render::NotificationJoin),
    row("firmware", Platform::Sensor, Source::Firmware, Render::Value),
];

const GENERIC: &[FieldProjection] = &[
    row("notifications", Platform::Sensor, Source::Notifications, Render::NotificationJoin),
    row("firmware", Platform::Sensor, Source::Firmware, Render::Value),
];

/// The projection table for a device type.
pub fn projections(device_type: DeviceType) -> &'static [FieldProjection] {
    match device_type {
        DeviceType::Rac => RAC,
        DeviceType::K30 | DeviceType::K40 | DeviceType::Icom => BOILER,
        DeviceType::Wddw2 => HOT_WATER,
        DeviceType::Generic => GENERIC,
    }
}

/// Resolve one projection against a snapshot.
///
/// Total: unknown circuits, absent fields and empty data all render the
/// `"unknown"` sentinel (or an empty join) instead of failing.
pub fn read(
    snapshot: &DeviceSnapshot,
    projection: &FieldProjection,
    circuit: Option<&str>,
) -> ProjectedState {
    let field = resolve(snapshot, projection.source, circuit);

    let state = match projection.render {
        Render::Value | Render::OnOff | Render::Options => field.display(),
        Render::ValueWithUnit => field.display_with_unit(),
        Render::NotificationJoin => snapshot.notifications_display(),
        Render::TempLevelOfMode => temp_level_of_mode(snapshot, circuit),
    };

    let options = match projection.render {
        Render::Options => field.allowed_values.clone(),
        _ => Vec::new(),
    };

    ProjectedState {
        state,
        options,
        min: field.min,
        max: field.max,
    }
}

fn resolve(snapshot: &DeviceSnapshot, source: Source, circuit: Option<&str>) -> RefField {
    match source {
        Source::Standard(key) => snapshot.standard(key),
        Source::Advanced(key) => snapshot.advanced(key),
        Source::SwitchProgram(key) => snapshot.switch_program(key),
        Source::Dhw(key) => circuit
            .and_then(|c| snapshot.dhw_circuit(c))
            .map(|c| c.field(key))
            .unwrap_or_default(),
        Source::Hc(key) => circuit
            .and_then(|c| snapshot.heating_circuit(c))
            .map(|c| c.field(key))
            .unwrap_or_default(),
        Source::Ventilation(key) => circuit
            .and_then(|c| snapshot.ventilation_zone(c))
            .map(|c| c.field(key))
            .unwrap_or_default(),
        Source::HeatSource(key) => snapshot
            .heat_sources()
            .map(|h| h.field(key))
            .unwrap_or_default(),
        Source::OutdoorTemp => snapshot.outdoor_temp(),
        Source::HolidayMode => snapshot.holiday_mode(),
        Source::AwayMode => snapshot.away_mode(),
        Source::PowerLimitation => snapshot.power_limitation(),
        Source::Firmware => RefField {
            value: snapshot.firmware.clone(),
            ..RefField::unknown()
        },
        Source::Notifications => RefField::unknown(),
    }
}

/// The wddw2 temperature display: the setpoint of the temp level named
/// by the circuit's current operation mode.
fn temp_level_of_mode(snapshot: &DeviceSnapshot, circuit: Option<&str>) -> String {
    let Some(circuit) = circuit.and_then(|c| snapshot.dhw_circuit(c)) else {
        return UNKNOWN.to_owned();
    };
    let mode = circuit.field("operationMode");
    let level = mode
        .value
        .as_str()
        .map(|m| circuit.temp_level(m))
        .unwrap_or_default();
    level.display_with_unit()
}

// ── Startup validation ──────────────────────────────────────────────

/// Check one device type's table: unique keys and sources that exist in
/// that device type's snapshot shape.
pub fn validate(device_type: DeviceType) -> Result<(), CoreError> {
    let table = projections(device_type);
    let mut seen = std::collections::BTreeSet::new();

    for projection in table {
        if !seen.insert(projection.key) {
            return Err(invalid(device_type, projection.key, "duplicate key"));
        }
        if !source_legal(device_type, projection.source) {
            return Err(invalid(device_type, projection.key, "source not in schema"));
        }
        if projection.render == Render::TempLevelOfMode
            && !matches!(projection.source, Source::Dhw(_))
        {
            return Err(invalid(
                device_type,
                projection.key,
                "TempLevelOfMode requires a DHW source",
            ));
        }
    }

    Ok(())
}

/// Validate every device type's table; run once at entry setup.
pub fn validate_all() -> Result<(), CoreError> {
    for device_type in [
        DeviceType::Rac,
        DeviceType::K30,
        DeviceType::K40,
        DeviceType::Icom,
        DeviceType::Wddw2,
        DeviceType::Generic,
    ] {
        validate(device_type)?;
    }
    Ok(())
}

fn source_legal(device_type: DeviceType, source: Source) -> bool {
    match source {
        Source::Firmware | Source::Notifications => true,
        Source::Standard(_) | Source::Advanced(_) | Source::SwitchProgram(_) => {
            device_type == DeviceType::Rac
        }
        Source::Dhw(_) => matches!(
            device_type,
            DeviceType::K30 | DeviceType::K40 | DeviceType::Icom | DeviceType::Wddw2
        ),
        Source::Hc(_)
        | Source::Ventilation(_)
        | Source::HeatSource(_)
        | Source::OutdoorTemp
        | Source::HolidayMode
        | Source::AwayMode
        | Source::PowerLimitation => matches!(
            device_type,
            DeviceType::K30 | DeviceType::K40 | DeviceType::Icom
        ),
    }
}

fn invalid(device_type: DeviceType, key: &str, reason: &str) -> CoreError {
    CoreError::InvalidProjection {
        message: format!("{device_type}/{key}: {reason}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use homecom_api::Device;

    #[test]
    fn all_tables_validate() {
        validate_all().expect("projection tables should be consistent");
    }

    #[test]
    fn read_is_total_on_empty_snapshots() {
        for device_type in [
            DeviceType::Rac,
            DeviceType::K40,
            DeviceType::Wddw2,
            DeviceType::Generic,
        ] {
            let snapshot = DeviceSnapshot::empty(Device {
                device_id: "1".into(),
                device_type,
            });
            for projection in projections(device_type) {
                // Missing circuits and fields must render sentinels,
                // never panic.
                let state = read(&snapshot, projection, Some("dhw1"));
                assert!(!state.state.is_empty() || projection.render == Render::NotificationJoin);
            }
        }
    }

    #[test]
    fn notifications_render_empty_join_on_no_entries() {
        let snapshot = DeviceSnapshot::empty(Device {
            device_id: "1".into(),
            device_type: DeviceType::Generic,
        });
        let projection = &projections(DeviceType::Generic)[0];
        assert_eq!(read(&snapshot, projection, None).state, "");
    }
}
