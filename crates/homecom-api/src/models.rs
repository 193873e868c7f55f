// Wire types for the gateway API.
//
// The cloud API wraps every readable/writable parameter in a generic
// reference object `{id, value, allowedValues, unitOfMeasure, ...}` and
// every endpoint returns one of a handful of envelope shapes. These types
// deserialize all of them leniently: gateway firmware revisions omit fields
// inconsistently, so everything optional stays optional here and
// `homecom-core` fills defaults during normalization.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The kind of physical unit behind a gateway.
///
/// Discovered from the device-list endpoint; unrecognized type strings
/// map to [`Generic`](Self::Generic) so new hardware still gets basic
/// firmware/notification support.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum DeviceType {
    /// Residential air conditioner.
    Rac,
    /// Boiler (older generation).
    K30,
    /// Boiler / heat pump.
    K40,
    /// Heat-pump gateway module.
    Icom,
    /// Heat-pump water heater.
    Wddw2,
    /// Anything the device list reports that we don't model yet.
    #[serde(other)]
    Generic,
}

/// One physical unit, as listed by `GET /gateways`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    pub device_id: String,
    pub device_type: DeviceType,
}

/// Generic reference object describing one parameter.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Reference {
    pub id: String,
    pub value: Option<Value>,
    pub unit_of_measure: Option<String>,
    pub min_value: Option<f64>,
    pub max_value: Option<f64>,
    pub allowed_values: Option<Vec<Value>>,
}

impl Reference {
    /// The last segment of the hierarchical id path
    /// (`"/dhwCircuits/dhw1/operationMode"` → `"operationMode"`).
    pub fn id_suffix(&self) -> &str {
        self.id.rsplit('/').next().unwrap_or(self.id.as_str())
    }
}

/// Lenient envelope covering every resource endpoint response shape:
/// a bare reference object, `{"references": [...]}` or `{"values": [...]}`.
///
/// Entries in `references` stay untyped `Value`s because circuit endpoints
/// return nested objects (a circuit id plus one reference object per field)
/// rather than flat references.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResourcePayload {
    pub id: Option<String>,
    pub value: Option<Value>,
    pub unit_of_measure: Option<String>,
    pub min_value: Option<f64>,
    pub max_value: Option<f64>,
    pub allowed_values: Option<Vec<Value>>,
    pub references: Option<Vec<Value>>,
    pub values: Option<Vec<Value>>,
}

impl ResourcePayload {
    /// The `references` list, or empty if this payload has none.
    pub fn references(&self) -> &[Value] {
        self.references.as_deref().unwrap_or_default()
    }

    /// The `values` list, or empty if this payload has none.
    pub fn values(&self) -> &[Value] {
        self.values.as_deref().unwrap_or_default()
    }
}

/// One notification entry from `GET /notifications`.
///
/// `dcd`/`ccd` are the vendor's diagnostic/cause code pair; displays join
/// them as `"{dcd}-{ccd}"`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Notification {
    pub dcd: Option<String>,
    pub ccd: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

/// Response body of the OAuth token endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default)]
    pub expires_in: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn device_type_unknown_maps_to_generic() {
        let device: Device =
            serde_json::from_value(json!({"deviceId": "123", "deviceType": "frobnicator"}))
                .expect("device should deserialize");
        assert_eq!(device.device_type, DeviceType::Generic);
    }

    #[test]
    fn reference_id_suffix() {
        let reference = Reference {
            id: "/dhwCircuits/dhw1/operationMode".into(),
            ..Reference::default()
        };
        assert_eq!(reference.id_suffix(), "operationMode");
    }

    #[test]
    fn payload_accepts_bare_reference() {
        let payload: ResourcePayload =
            serde_json::from_value(json!({"id": "/gateway/versionFirmware", "value": "1.2.0"}))
                .expect("payload should deserialize");
        assert_eq!(payload.value, Some(json!("1.2.0")));
        assert!(payload.references().is_empty());
    }

    #[test]
    fn payload_accepts_reference_list() {
        let payload: ResourcePayload = serde_json::from_value(json!({
            "references": [
                {"id": "/airConditioning/temperatureSetpoint", "value": 21,
                 "minValue": 16, "maxValue": 30}
            ]
        }))
        .expect("payload should deserialize");
        assert_eq!(payload.references().len(), 1);
    }
}
