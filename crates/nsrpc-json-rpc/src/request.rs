use serde::de::{self, Deserializer};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::types::{JsonRpcVersion, RequestId};

/// Parameters of a call envelope
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Params {
    /// Positional parameters as an array
    Positional(Vec<Value>),
    /// Named parameters as an object
    Named(Map<String, Value>),
    /// No `params` member at all
    #[default]
    Absent,
}

impl Params {
    /// Get a parameter by name (named params only)
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Params::Named(map) => map.get(key),
            _ => None,
        }
    }

    /// Get a parameter by index (positional params only)
    pub fn get_index(&self, index: usize) -> Option<&Value> {
        match self {
            Params::Positional(vec) => vec.get(index),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Params::Named(map) => map.is_empty(),
            Params::Positional(vec) => vec.is_empty(),
            Params::Absent => true,
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Params::Absent)
    }

    pub fn to_value(&self) -> Option<Value> {
        match self {
            Params::Named(map) => Some(Value::Object(map.clone())),
            Params::Positional(vec) => Some(Value::Array(vec.clone())),
            Params::Absent => None,
        }
    }
}

impl From<Map<String, Value>> for Params {
    fn from(map: Map<String, Value>) -> Self {
        Params::Named(map)
    }
}

impl From<Vec<Value>> for Params {
    fn from(vec: Vec<Value>) -> Self {
        Params::Positional(vec)
    }
}

impl Serialize for Params {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Params::Positional(vec) => vec.serialize(serializer),
            Params::Named(map) => map.serialize(serializer),
            Params::Absent => serializer.serialize_none(),
        }
    }
}

impl<'de> Deserialize<'de> for Params {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Value::deserialize(deserializer)? {
            Value::Array(vec) => Ok(Params::Positional(vec)),
            Value::Object(map) => Ok(Params::Named(map)),
            other => Err(de::Error::custom(format!(
                "params must be an array or an object, got {}",
                other
            ))),
        }
    }
}

/// A decoded call unit: a request when `id` is present, a notification otherwise
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(rename = "jsonrpc")]
    pub version: JsonRpcVersion,
    pub method: String,
    #[serde(default, skip_serializing_if = "Params::is_absent")]
    pub params: Params,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RequestId>,
}

impl Envelope {
    pub fn request(id: impl Into<RequestId>, method: impl Into<String>, params: Params) -> Self {
        Self {
            version: JsonRpcVersion::V2_0,
            method: method.into(),
            params,
            id: Some(id.into()),
        }
    }

    pub fn notification(method: impl Into<String>, params: Params) -> Self {
        Self {
            version: JsonRpcVersion::V2_0,
            method: method.into(),
            params,
            id: None,
        }
    }

    /// Decode an already structurally validated entry
    pub fn from_value(value: &Value) -> Result<Self, serde_json::Error> {
        Self::deserialize(value)
    }

    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }

    /// Get a parameter by name (if params are an object)
    pub fn get_param(&self, name: &str) -> Option<&Value> {
        self.params.get(name)
    }

    /// Get a parameter by index (if params are an array)
    pub fn get_param_index(&self, index: usize) -> Option<&Value> {
        self.params.get_index(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{from_str, json, to_string};

    #[test]
    fn test_request_serialization() {
        let request = Envelope::request(1, "test_method", Params::Absent);

        let json = to_string(&request).unwrap();
        assert_eq!(json, r#"{"jsonrpc":"2.0","method":"test_method","id":1}"#);

        let parsed: Envelope = from_str(&json).unwrap();
        assert_eq!(parsed.id, Some(RequestId::Number(1)));
        assert_eq!(parsed.method, "test_method");
        assert!(parsed.params.is_absent());
    }

    #[test]
    fn test_named_params() {
        let value = json!({
            "jsonrpc": "2.0",
            "method": "subtract",
            "params": {"subtrahend": 23, "minuend": 42},
            "id": 3
        });
        let envelope = Envelope::from_value(&value).unwrap();

        assert_eq!(envelope.get_param("minuend"), Some(&json!(42)));
        assert_eq!(envelope.get_param("missing"), None);
        assert_eq!(envelope.get_param_index(0), None);
    }

    #[test]
    fn test_positional_params() {
        let value = json!({"jsonrpc": "2.0", "method": "sum", "params": [1, 2, 4], "id": "1"});
        let envelope = Envelope::from_value(&value).unwrap();

        assert_eq!(envelope.get_param_index(2), Some(&json!(4)));
        assert_eq!(envelope.get_param_index(3), None);
        assert_eq!(envelope.id, Some(RequestId::from("1")));
    }

    #[test]
    fn test_notification_has_no_id() {
        let value = json!({"jsonrpc": "2.0", "method": "update", "params": [1, 2, 3, 4, 5]});
        let envelope = Envelope::from_value(&value).unwrap();
        assert!(envelope.is_notification());

        let json = to_string(&envelope).unwrap();
        assert!(!json.contains("\"id\""));
    }

    #[test]
    fn test_scalar_params_rejected() {
        let value = json!({"jsonrpc": "2.0", "method": "foobar", "params": "bar"});
        assert!(Envelope::from_value(&value).is_err());
    }
}
