use std::fmt;

use serde::Serialize;
use serde_json::Value;

use homecom_api::Reference;

/// The display sentinel for absent or malformed vendor data.
pub const UNKNOWN: &str = "unknown";

/// A normalized parameter value.
///
/// The vendor API mixes numbers and strings freely across firmware
/// revisions; anything else (null, objects, missing) collapses to
/// [`Unknown`](Self::Unknown), which displays as the literal `"unknown"`.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub enum FieldValue {
    Number(f64),
    Text(String),
    #[default]
    Unknown,
}

impl FieldValue {
    pub fn from_json(value: Option<&Value>) -> Self {
        match value {
            Some(Value::Number(n)) => n.as_f64().map_or(Self::Unknown, Self::Number),
            Some(Value::String(s)) => Self::Text(s.clone()),
            Some(Value::Bool(b)) => Self::Text(b.to_string()),
            _ => Self::Unknown,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown)
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // Integral setpoints display without a trailing ".0" so that
            // `21` renders as "21", matching the vendor app.
            Self::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => {
                write!(f, "{}", *n as i64)
            }
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
            Self::Unknown => f.write_str(UNKNOWN),
        }
    }
}

/// A normalized reference object: one readable/writable parameter.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RefField {
    pub value: FieldValue,
    pub unit: Option<String>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub allowed_values: Vec<String>,
}

impl RefField {
    /// The total-lookup fallback: unknown value, no bounds, no options.
    pub fn unknown() -> Self {
        Self::default()
    }

    /// Normalize a typed wire reference.
    pub fn from_reference(reference: &Reference) -> Self {
        Self {
            value: FieldValue::from_json(reference.value.as_ref()),
            unit: reference.unit_of_measure.clone(),
            min: reference.min_value,
            max: reference.max_value,
            allowed_values: allowed_to_strings(reference.allowed_values.as_deref()),
        }
    }

    /// Normalize a raw JSON object of the reference shape. Non-objects
    /// and objects without usable fields yield the unknown field.
    pub fn from_value(raw: &Value) -> Self {
        let Some(map) = raw.as_object() else {
            return Self::unknown();
        };
        Self {
            value: FieldValue::from_json(map.get("value")),
            unit: map
                .get("unitOfMeasure")
                .and_then(Value::as_str)
                .map(str::to_owned),
            min: map.get("minValue").and_then(Value::as_f64),
            max: map.get("maxValue").and_then(Value::as_f64),
            allowed_values: allowed_to_strings(
                map.get("allowedValues").and_then(Value::as_array).map(Vec::as_slice),
            ),
        }
    }

    /// The displayed state: the value alone.
    pub fn display(&self) -> String {
        self.value.to_string()
    }

    /// Value and unit concatenated, e.g. `"21C"`. A missing unit renders
    /// as the sentinel, matching the vendor app's raw display.
    pub fn display_with_unit(&self) -> String {
        format!("{}{}", self.value, self.unit.as_deref().unwrap_or(UNKNOWN))
    }
}

fn allowed_to_strings(values: Option<&[Value]>) -> Vec<String> {
    values
        .unwrap_or_default()
        .iter()
        .filter_map(|v| match v {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn integral_number_displays_without_fraction() {
        assert_eq!(FieldValue::Number(21.0).to_string(), "21");
        assert_eq!(FieldValue::Number(21.5).to_string(), "21.5");
    }

    #[test]
    fn missing_value_displays_sentinel() {
        assert_eq!(FieldValue::Unknown.to_string(), "unknown");
        assert_eq!(FieldValue::from_json(None), FieldValue::Unknown);
        assert_eq!(FieldValue::from_json(Some(&Value::Null)), FieldValue::Unknown);
    }

    #[test]
    fn from_value_reads_reference_shape() {
        let field = RefField::from_value(&json!({
            "id": "/dhwCircuits/dhw1/actualTemp",
            "value": 48.5,
            "unitOfMeasure": "C",
            "minValue": 30,
            "maxValue": 60,
        }));
        assert_eq!(field.value, FieldValue::Number(48.5));
        assert_eq!(field.display_with_unit(), "48.5C");
        assert_eq!(field.min, Some(30.0));
        assert_eq!(field.max, Some(60.0));
    }

    #[test]
    fn from_value_tolerates_non_objects() {
        assert!(RefField::from_value(&json!(null)).value.is_unknown());
        assert!(RefField::from_value(&json!("loose")).value.is_unknown());
        assert!(RefField::from_value(&json!(["list"])).value.is_unknown());
    }

    #[test]
    fn allowed_values_keep_strings_and_numbers() {
        let field = RefField::from_value(&json!({
            "value": "eco",
            "allowedValues": ["eco", "low", "high", 5, null],
        }));
        assert_eq!(field.allowed_values, vec!["eco", "low", "high", "5"]);
    }
}
