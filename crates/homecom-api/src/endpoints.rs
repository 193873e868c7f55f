// Gateway resource paths and OAuth endpoint defaults.
//
// All state reads and command writes go through
// `GET|PUT {base}/gateways/{device_id}/resource{path}`. The path constants
// below are the resource tree as exposed by current gateway firmware;
// `homecom-core` decides which subset applies to each device type.

/// Production base URL of the vendor's gateway API.
pub const DEFAULT_BASE_URL: &str =
    "https://pointt-api.bosch-thermotechnology.com/pointt-api/api/v1";

/// Production OAuth token endpoint (SingleKey ID).
pub const DEFAULT_TOKEN_URL: &str = "https://singlekey-id.com/auth/connect/token";

/// OAuth client id registered for the HomeCom Easy mobile app.
pub const OAUTH_CLIENT_ID: &str = "762162AC-BoschHomeCom-Easy";

/// Redirect URI used by the authorization-code flow.
pub const OAUTH_REDIRECT_URI: &str = "com.bosch.tt.dashtt.pointt://app/login";

/// Common resources, present on every device type.
pub mod common {
    pub const FIRMWARE: &str = "/gateway/versionFirmware";
    pub const NOTIFICATIONS: &str = "/notifications";
}

/// Residential air-conditioning (rac) resources.
pub mod ac {
    pub const STANDARD_FUNCTIONS: &str = "/airConditioning/standardFunctions";
    pub const ADVANCED_FUNCTIONS: &str = "/airConditioning/advancedFunctions";
    pub const SWITCH_PROGRAMS: &str = "/airConditioning/switchPrograms";

    pub const CONTROL: &str = "/airConditioning/acControl";
    pub const OPERATION_MODE: &str = "/airConditioning/operationMode";
    pub const TEMPERATURE_SETPOINT: &str = "/airConditioning/temperatureSetpoint";
    pub const FAN_SPEED: &str = "/airConditioning/fanSpeed";
    pub const AIRFLOW_HORIZONTAL: &str = "/airConditioning/airFlowHorizontal";
    pub const AIRFLOW_VERTICAL: &str = "/airConditioning/airFlowVertical";
    pub const ECO_MODE: &str = "/airConditioning/ecoMode";
    pub const FULL_POWER_MODE: &str = "/airConditioning/fullPowerMode";
    pub const AIR_PURIFICATION_MODE: &str = "/airConditioning/airPurificationMode";
    pub const PROGRAM_ENABLED: &str = "/airConditioning/switchPrograms/enabled";
    pub const ACTIVE_PROGRAM: &str = "/airConditioning/switchPrograms/activeProgram";
    pub const TIMERS_ON: &str = "/airConditioning/timersOn";
    pub const TIMERS_OFF: &str = "/airConditioning/timersOff";
}

/// Boiler / heat-pump (k30, k40, icom) resources.
pub mod boiler {
    pub const DHW_CIRCUITS: &str = "/dhwCircuits";
    pub const HEATING_CIRCUITS: &str = "/heatingCircuits";
    pub const HEAT_SOURCES: &str = "/heatSources";
    pub const VENTILATION: &str = "/ventilation";
    pub const OUTDOOR_TEMP: &str = "/system/sensors/temperatures/outdoor_t1";
    pub const HOLIDAY_MODE: &str = "/system/holidayModes";
    pub const AWAY_MODE: &str = "/system/awayMode/enabled";
    pub const POWER_LIMITATION: &str = "/system/powerLimitation";

    /// `PUT /dhwCircuits/{circuit}/operationMode`
    pub fn dhw_operation_mode(circuit: &str) -> String {
        format!("/dhwCircuits/{circuit}/operationMode")
    }

    /// `PUT /dhwCircuits/{circuit}/currentTemperatureLevel`
    pub fn dhw_temperature_level(circuit: &str) -> String {
        format!("/dhwCircuits/{circuit}/currentTemperatureLevel")
    }

    /// `PUT /dhwCircuits/{circuit}/tempLevel/{level}`
    pub fn dhw_temp_level_setpoint(circuit: &str, level: &str) -> String {
        format!("/dhwCircuits/{circuit}/tempLevel/{level}")
    }

    /// `PUT /dhwCircuits/{circuit}/charge`
    pub fn dhw_charge(circuit: &str) -> String {
        format!("/dhwCircuits/{circuit}/charge")
    }

    /// `PUT /dhwCircuits/{circuit}/chargeDuration`
    pub fn dhw_charge_duration(circuit: &str) -> String {
        format!("/dhwCircuits/{circuit}/chargeDuration")
    }

    /// `PUT /heatingCircuits/{circuit}/operationMode`
    pub fn hc_operation_mode(circuit: &str) -> String {
        format!("/heatingCircuits/{circuit}/operationMode")
    }

    /// `PUT /heatingCircuits/{circuit}/manualRoomSetpoint`
    pub fn hc_manual_room_setpoint(circuit: &str) -> String {
        format!("/heatingCircuits/{circuit}/manualRoomSetpoint")
    }

    /// `PUT /heatingCircuits/{circuit}/suWiSwitchMode`
    pub fn hc_suwi_mode(circuit: &str) -> String {
        format!("/heatingCircuits/{circuit}/suWiSwitchMode")
    }

    /// `PUT /heatingCircuits/{circuit}/heatCoolMode`
    pub fn hc_heatcool_mode(circuit: &str) -> String {
        format!("/heatingCircuits/{circuit}/heatCoolMode")
    }

    /// `PUT /ventilation/{zone}/operationMode`
    pub fn ventilation_mode(zone: &str) -> String {
        format!("/ventilation/{zone}/operationMode")
    }
}
