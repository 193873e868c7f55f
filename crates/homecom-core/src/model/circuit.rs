use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

use super::field::{FieldValue, RefField};

/// One DHW circuit, heating circuit or ventilation zone.
///
/// Circuit endpoints return entries keyed by a hierarchical id
/// (`"/dhwCircuits/dhw1"`) whose remaining keys are each a reference
/// object. `tempLevel` is the one nested map (per-mode setpoints) and is
/// kept separately.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Circuit {
    pub id: String,
    pub fields: BTreeMap<String, RefField>,
    pub temp_levels: BTreeMap<String, RefField>,
}

impl Circuit {
    /// Parse one raw circuit entry. Entries without a string `id` are
    /// dropped by the normalizer (`None` here).
    pub fn from_raw(raw: &Value) -> Option<Self> {
        let map = raw.as_object()?;
        let id = map.get("id")?.as_str()?.to_owned();

        let mut fields = BTreeMap::new();
        let mut temp_levels = BTreeMap::new();

        for (key, value) in map {
            if key == "id" {
                continue;
            }
            if key == "tempLevel" {
                if let Some(levels) = value.as_object() {
                    for (level, entry) in levels {
                        temp_levels.insert(level.clone(), RefField::from_value(entry));
                    }
                }
                continue;
            }
            if value.is_object() {
                fields.insert(key.clone(), RefField::from_value(value));
            }
        }

        Some(Self {
            id,
            fields,
            temp_levels,
        })
    }

    /// The last id segment (`"/dhwCircuits/dhw1"` → `"dhw1"`).
    pub fn short_id(&self) -> &str {
        self.id.rsplit('/').next().unwrap_or(self.id.as_str())
    }

    /// Total lookup: missing fields come back unknown.
    pub fn field(&self, key: &str) -> RefField {
        self.fields.get(key).cloned().unwrap_or_default()
    }

    /// Total lookup into the per-mode setpoint map.
    pub fn temp_level(&self, level: &str) -> RefField {
        self.temp_levels.get(level).cloned().unwrap_or_default()
    }
}

/// Aggregated heat-source telemetry for boiler devices.
///
/// Plain parameters live in `fields`; `starts` and `consumption` arrive
/// as lists of single-key objects (`[{"ch": 120}, {"dhw": 45}, ...]`) and
/// are flattened into maps.
#[derive(Debug, Clone, Default, Serialize)]
pub struct HeatSources {
    pub fields: BTreeMap<String, RefField>,
    pub starts: BTreeMap<String, FieldValue>,
    pub consumption: BTreeMap<String, FieldValue>,
}

impl HeatSources {
    pub fn from_references(references: &[Value]) -> Self {
        let mut out = Self::default();

        for raw in references {
            let Some(map) = raw.as_object() else { continue };
            let suffix = map
                .get("id")
                .and_then(Value::as_str)
                .map(|id| id.rsplit('/').next().unwrap_or(id))
                .unwrap_or_default();

            match suffix {
                "" => {}
                "starts" => flatten_values(map.get("values"), &mut out.starts),
                "consumption" => flatten_values(map.get("values"), &mut out.consumption),
                _ => {
                    out.fields
                        .insert(suffix.to_owned(), RefField::from_value(raw));
                }
            }
        }

        out
    }

    /// Total lookup: missing parameters come back unknown.
    pub fn field(&self, key: &str) -> RefField {
        self.fields.get(key).cloned().unwrap_or_default()
    }

    pub fn start_count(&self, key: &str) -> FieldValue {
        self.starts.get(key).cloned().unwrap_or_default()
    }

    pub fn consumption_of(&self, key: &str) -> FieldValue {
        self.consumption.get(key).cloned().unwrap_or_default()
    }
}

fn flatten_values(values: Option<&Value>, into: &mut BTreeMap<String, FieldValue>) {
    let Some(list) = values.and_then(Value::as_array) else {
        return;
    };
    for entry in list {
        let Some(map) = entry.as_object() else { continue };
        for (key, value) in map {
            into.insert(key.clone(), FieldValue::from_json(Some(value)));
        }
    }
}
