//! Configuration value model.
//!
//! `ConfigValue` is the closed set of storable values. `null` has no variant:
//! it is reserved to mean "not set" and is rejected at every conversion from
//! `serde_json::Value`, at any depth.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use std::collections::BTreeMap;
use std::fmt;

/// String-keyed mapping of configuration values.
pub type ConfigMap = BTreeMap<String, ConfigValue>;

/// A storable configuration value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Value", into = "Value")]
pub enum ConfigValue {
    Bool(bool),
    Number(Number),
    String(String),
    List(Vec<ConfigValue>),
    Map(ConfigMap),
}

impl ConfigValue {
    /// Empty map value.
    pub fn empty_map() -> Self {
        ConfigValue::Map(ConfigMap::new())
    }

    /// Build a number value from a float. Non-finite floats have no JSON form.
    pub fn from_f64(value: f64) -> Option<Self> {
        Number::from_f64(value).map(ConfigValue::Number)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ConfigValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ConfigValue::Number(n) => n.as_f64(),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ConfigValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&ConfigMap> {
        match self {
            ConfigValue::Map(m) => Some(m),
            _ => None,
        }
    }

    /// Whether the value is a list or map (serialized as JSON text by the primary store).
    pub fn is_structured(&self) -> bool {
        matches!(self, ConfigValue::List(_) | ConfigValue::Map(_))
    }

    /// Kind name used in diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            ConfigValue::Bool(_) => "bool",
            ConfigValue::Number(_) => "number",
            ConfigValue::String(_) => "string",
            ConfigValue::List(_) => "list",
            ConfigValue::Map(_) => "map",
        }
    }
}

impl TryFrom<Value> for ConfigValue {
    type Error = ConfigError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Null => Err(ConfigError::invalid_value(
                "null is not a storable config value",
            )),
            Value::Bool(b) => Ok(ConfigValue::Bool(b)),
            Value::Number(n) => Ok(ConfigValue::Number(n)),
            Value::String(s) => Ok(ConfigValue::String(s)),
            Value::Array(items) => items
                .into_iter()
                .map(ConfigValue::try_from)
                .collect::<Result<Vec<_>, _>>()
                .map(ConfigValue::List),
            Value::Object(map) => map
                .into_iter()
                .map(|(k, v)| ConfigValue::try_from(v).map(|v| (k, v)))
                .collect::<Result<ConfigMap, _>>()
                .map(ConfigValue::Map),
        }
    }
}

impl From<ConfigValue> for Value {
    fn from(value: ConfigValue) -> Self {
        match value {
            ConfigValue::Bool(b) => Value::Bool(b),
            ConfigValue::Number(n) => Value::Number(n),
            ConfigValue::String(s) => Value::String(s),
            ConfigValue::List(items) => Value::Array(items.into_iter().map(Value::from).collect()),
            ConfigValue::Map(map) => {
                Value::Object(map.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

impl From<bool> for ConfigValue {
    fn from(value: bool) -> Self {
        ConfigValue::Bool(value)
    }
}

impl From<i64> for ConfigValue {
    fn from(value: i64) -> Self {
        ConfigValue::Number(value.into())
    }
}

impl From<i32> for ConfigValue {
    fn from(value: i32) -> Self {
        ConfigValue::Number(value.into())
    }
}

impl From<u64> for ConfigValue {
    fn from(value: u64) -> Self {
        ConfigValue::Number(value.into())
    }
}

impl From<&str> for ConfigValue {
    fn from(value: &str) -> Self {
        ConfigValue::String(value.to_string())
    }
}

impl From<String> for ConfigValue {
    fn from(value: String) -> Self {
        ConfigValue::String(value)
    }
}

impl From<Vec<ConfigValue>> for ConfigValue {
    fn from(value: Vec<ConfigValue>) -> Self {
        ConfigValue::List(value)
    }
}

impl From<ConfigMap> for ConfigValue {
    fn from(value: ConfigMap) -> Self {
        ConfigValue::Map(value)
    }
}

impl fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigValue::String(s) => write!(f, "{}", s),
            other => write!(f, "{}", Value::from(other.clone())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn rejects_top_level_null() {
        assert!(ConfigValue::try_from(Value::Null).is_err());
    }

    #[test]
    fn rejects_nested_null() {
        assert!(ConfigValue::try_from(json!({"a": {"b": null}})).is_err());
        assert!(ConfigValue::try_from(json!([1, null])).is_err());
    }

    #[test]
    fn converts_nested_structures() {
        let value = ConfigValue::try_from(json!({"media": {"volume": 1, "tags": ["a"]}})).unwrap();
        let media = value.as_map().unwrap()["media"].as_map().unwrap();
        assert_eq!(media["volume"], ConfigValue::from(1));
        assert_eq!(media["tags"], ConfigValue::List(vec!["a".into()]));
        assert!(value.is_structured());
    }

    #[test]
    fn deserialize_goes_through_null_check() {
        let parsed: Result<ConfigValue, _> = serde_json::from_str("null");
        assert!(parsed.is_err());
        let parsed: ConfigValue = serde_json::from_str("0.5").unwrap();
        assert_eq!(parsed.as_f64(), Some(0.5));
    }

    #[test]
    fn serializes_as_plain_json() {
        let value = ConfigValue::try_from(json!({"x": [true, "s", 2]})).unwrap();
        assert_eq!(serde_json::to_string(&value).unwrap(), r#"{"x":[true,"s",2]}"#);
    }

    #[test]
    fn non_finite_floats_have_no_value() {
        assert!(ConfigValue::from_f64(f64::NAN).is_none());
        assert_eq!(ConfigValue::from_f64(1.5).unwrap().as_f64(), Some(1.5));
    }

    #[test]
    fn display_leaves_strings_unquoted() {
        assert_eq!(ConfigValue::from("abc").to_string(), "abc");
        assert_eq!(ConfigValue::from(true).to_string(), "true");
    }
}
