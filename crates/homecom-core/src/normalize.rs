// ── Pure normalization of raw endpoint payloads ──
//
// The single mapping step between the vendor's heterogeneous envelopes
// and the per-device-type snapshot data. No I/O, deterministic, and
// total: absent or malformed payloads produce defaults, never errors,
// so one flaky endpoint can't take the whole device down.

use serde_json::Value;

use homecom_api::{DeviceType, Notification, Reference, ResourcePayload};

use crate::model::{
    AcData, BoilerData, Circuit, FieldValue, HeatSources, HotWaterData, RefField, RefMap,
    SnapshotData,
};

/// The raw bodies fetched during one poll cycle. Fields the device type's
/// fetch plan doesn't cover simply stay `None`.
#[derive(Debug, Default)]
pub struct RawBundle {
    pub standard_functions: Option<ResourcePayload>,
    pub advanced_functions: Option<ResourcePayload>,
    pub switch_programs: Option<ResourcePayload>,
    pub holiday_mode: Option<ResourcePayload>,
    pub away_mode: Option<ResourcePayload>,
    pub power_limitation: Option<ResourcePayload>,
    pub outdoor_temp: Option<ResourcePayload>,
    pub heat_sources: Option<ResourcePayload>,
    pub dhw_circuits: Option<ResourcePayload>,
    pub heating_circuits: Option<ResourcePayload>,
    pub ventilation: Option<ResourcePayload>,
}

/// Map one cycle's raw bodies onto the device-type-specific data shape.
pub fn normalize(device_type: DeviceType, raw: &RawBundle) -> SnapshotData {
    match device_type {
        DeviceType::Rac => SnapshotData::Ac(AcData {
            standard_functions: reference_map(raw.standard_functions.as_ref()),
            advanced_functions: reference_map(raw.advanced_functions.as_ref()),
            switch_programs: reference_map(raw.switch_programs.as_ref()),
        }),
        DeviceType::K30 | DeviceType::K40 | DeviceType::Icom => SnapshotData::Boiler(BoilerData {
            holiday_mode: single_field(raw.holiday_mode.as_ref()),
            away_mode: single_field(raw.away_mode.as_ref()),
            power_limitation: single_field(raw.power_limitation.as_ref()),
            outdoor_temp: single_field(raw.outdoor_temp.as_ref()),
            heat_sources: raw
                .heat_sources
                .as_ref()
                .map(|p| HeatSources::from_references(p.references()))
                .unwrap_or_default(),
            dhw_circuits: circuits(raw.dhw_circuits.as_ref()),
            heating_circuits: circuits(raw.heating_circuits.as_ref()),
            ventilation: circuits(raw.ventilation.as_ref()),
        }),
        DeviceType::Wddw2 => SnapshotData::HotWater(HotWaterData {
            dhw_circuits: circuits(raw.dhw_circuits.as_ref()),
        }),
        DeviceType::Generic => SnapshotData::Generic,
    }
}

/// Normalize a firmware payload to its version value.
pub fn normalize_firmware(payload: Option<&ResourcePayload>) -> FieldValue {
    payload.map_or(FieldValue::Unknown, |p| {
        FieldValue::from_json(p.value.as_ref())
    })
}

/// Normalize a notifications payload to its entries, dropping anything
/// that isn't an object.
pub fn normalize_notifications(payload: Option<&ResourcePayload>) -> Vec<Notification> {
    payload
        .map(|p| {
            p.values()
                .iter()
                .filter(|v| v.is_object())
                .map(|v| serde_json::from_value(v.clone()).unwrap_or_default())
                .collect()
        })
        .unwrap_or_default()
}

/// Flat reference list keyed by id suffix. Entries without an id are
/// dropped — there is nothing to key them on.
fn reference_map(payload: Option<&ResourcePayload>) -> RefMap {
    let mut map = RefMap::new();
    for raw in payload.map(ResourcePayload::references).unwrap_or_default() {
        let Ok(reference) = serde_json::from_value::<Reference>(raw.clone()) else {
            continue;
        };
        let suffix = reference.id_suffix();
        if suffix.is_empty() {
            continue;
        }
        map.insert(suffix.to_owned(), RefField::from_reference(&reference));
    }
    map
}

/// Circuit list; entries without a usable id are dropped.
fn circuits(payload: Option<&ResourcePayload>) -> Vec<Circuit> {
    payload
        .map(ResourcePayload::references)
        .unwrap_or_default()
        .iter()
        .filter_map(Circuit::from_raw)
        .collect()
}

/// A payload whose body *is* one reference object (outdoor temperature,
/// away mode). Falls back to the first entry of a `values` list, which is
/// how holiday mode reports its state.
fn single_field(payload: Option<&ResourcePayload>) -> RefField {
    let Some(payload) = payload else {
        return RefField::unknown();
    };

    let mut field = RefField {
        value: FieldValue::from_json(payload.value.as_ref()),
        unit: payload.unit_of_measure.clone(),
        min: payload.min_value,
        max: payload.max_value,
        allowed_values: payload
            .allowed_values
            .as_deref()
            .unwrap_or_default()
            .iter()
            .filter_map(|v| match v {
                Value::String(s) => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .collect(),
    };

    if field.value.is_unknown() {
        if let Some(first) = payload.values().first() {
            field.value = FieldValue::from_json(Some(first));
        }
    }

    field
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(value: Value) -> ResourcePayload {
        serde_json::from_value(value).expect("payload should deserialize")
    }

    #[test]
    fn normalize_never_fails_on_empty_bundles() {
        let raw = RawBundle::default();
        for device_type in [
            DeviceType::Rac,
            DeviceType::K30,
            DeviceType::K40,
            DeviceType::Icom,
            DeviceType::Wddw2,
            DeviceType::Generic,
        ] {
            // Must produce the right (empty) shape, not panic or error.
            match (device_type, normalize(device_type, &raw)) {
                (DeviceType::Rac, SnapshotData::Ac(ac)) => {
                    assert!(ac.standard_functions.is_empty());
                }
                (DeviceType::K30 | DeviceType::K40 | DeviceType::Icom, SnapshotData::Boiler(b)) => {
                    assert!(b.dhw_circuits.is_empty());
                    assert!(b.outdoor_temp.value.is_unknown());
                }
                (DeviceType::Wddw2, SnapshotData::HotWater(w)) => {
                    assert!(w.dhw_circuits.is_empty());
                }
                (DeviceType::Generic, SnapshotData::Generic) => {}
                (device_type, data) => panic!("wrong shape for {device_type}: {data:?}"),
            }
        }
    }

    #[test]
    fn setpoint_reference_keeps_value_and_bounds() {
        let raw = RawBundle {
            standard_functions: Some(payload(json!({
                "references": [
                    {"id": "/airConditioning/ac1/temperatureSetpoint", "value": 21,
                     "minValue": 16, "maxValue": 30},
                ]
            }))),
            ..RawBundle::default()
        };

        let SnapshotData::Ac(ac) = normalize(DeviceType::Rac, &raw) else {
            panic!("expected Ac data");
        };
        let setpoint = &ac.standard_functions["temperatureSetpoint"];
        assert_eq!(setpoint.value, FieldValue::Number(21.0));
        assert_eq!((setpoint.min, setpoint.max), (Some(16.0), Some(30.0)));
    }

    #[test]
    fn malformed_references_are_dropped_not_fatal() {
        let raw = RawBundle {
            standard_functions: Some(payload(json!({
                "references": [
                    "not-an-object",
                    {"value": 1},
                    {"id": "/airConditioning/fanSpeed", "value": "auto"},
                ]
            }))),
            ..RawBundle::default()
        };

        let SnapshotData::Ac(ac) = normalize(DeviceType::Rac, &raw) else {
            panic!("expected Ac data");
        };
        assert_eq!(ac.standard_functions.len(), 1);
        assert_eq!(ac.standard_functions["fanSpeed"].display(), "auto");
    }

    #[test]
    fn boiler_bundle_normalizes_all_sections() {
        let raw = RawBundle {
            outdoor_temp: Some(payload(json!({
                "id": "/system/sensors/temperatures/outdoor_t1",
                "value": 7.5, "unitOfMeasure": "C",
            }))),
            away_mode: Some(payload(json!({"value": "off", "allowedValues": ["on", "off"]}))),
            holiday_mode: Some(payload(json!({"values": ["hm1"], "allowedValues": ["off", "hm1"]}))),
            dhw_circuits: Some(payload(json!({
                "references": [
                    {"id": "/dhwCircuits/dhw1",
                     "operationMode": {"value": "eco", "allowedValues": ["eco", "high"]}},
                ]
            }))),
            heating_circuits: Some(payload(json!({
                "references": [
                    {"id": "/heatingCircuits/hc1",
                     "roomTemp": {"value": 21.5, "unitOfMeasure": "C"}},
                ]
            }))),
            ..RawBundle::default()
        };

        let SnapshotData::Boiler(boiler) = normalize(DeviceType::K40, &raw) else {
            panic!("expected Boiler data");
        };
        assert_eq!(boiler.outdoor_temp.display_with_unit(), "7.5C");
        assert_eq!(boiler.away_mode.display(), "off");
        assert_eq!(boiler.holiday_mode.display(), "hm1");
        assert_eq!(boiler.dhw_circuits[0].short_id(), "dhw1");
        assert_eq!(boiler.heating_circuits[0].field("roomTemp").display(), "21.5");
        // Sections the bundle didn't cover stay empty, not errors.
        assert!(boiler.ventilation.is_empty());
        assert!(boiler.power_limitation.value.is_unknown());
    }

    #[test]
    fn firmware_and_notifications_normalize() {
        let firmware = payload(json!({"id": "/gateway/versionFirmware", "value": "4.13.0"}));
        assert_eq!(
            normalize_firmware(Some(&firmware)),
            FieldValue::Text("4.13.0".into())
        );
        assert_eq!(normalize_firmware(None), FieldValue::Unknown);

        let notifications = payload(json!({"values": [
            {"dcd": "E1", "ccd": "02"},
            "garbage",
        ]}));
        let parsed = normalize_notifications(Some(&notifications));
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].dcd.as_deref(), Some("E1"));
    }
}
