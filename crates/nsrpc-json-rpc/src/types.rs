use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A uniquely identifying ID for a JSON-RPC request.
/// Can be a string or an integer, but never null.
///
/// Integers above `i64::MAX` keep their exact value in `Unsigned`, so a reply
/// always echoes the id the client sent.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum RequestId {
    String(String),
    Number(i64),
    Unsigned(u64),
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestId::String(s) => write!(f, "{}", s),
            RequestId::Number(n) => write!(f, "{}", n),
            RequestId::Unsigned(n) => write!(f, "{}", n),
        }
    }
}

impl<'de> Deserialize<'de> for RequestId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Self::from_value(&value).ok_or_else(|| {
            serde::de::Error::custom(format!("Invalid request id: {}", value))
        })
    }
}

impl From<i64> for RequestId {
    fn from(n: i64) -> Self {
        RequestId::Number(n)
    }
}

impl From<&str> for RequestId {
    fn from(s: &str) -> Self {
        RequestId::String(s.to_string())
    }
}

impl From<String> for RequestId {
    fn from(s: String) -> Self {
        RequestId::String(s)
    }
}

impl RequestId {
    /// Read an id from an arbitrary JSON value.
    ///
    /// Strings and integral numbers in the `i64`/`u64` range are accepted,
    /// including integral floats such as `1.0` or `1e0`. Everything else
    /// (null, fractions, out-of-range numbers, containers, booleans) yields
    /// `None`; a value is never rounded or saturated into a different id.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(RequestId::String(s.clone())),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Some(RequestId::Number(i))
                } else if let Some(u) = n.as_u64() {
                    Some(RequestId::Unsigned(u))
                } else {
                    n.as_f64().and_then(Self::from_integral_float)
                }
            }
            _ => None,
        }
    }

    fn from_integral_float(f: f64) -> Option<Self> {
        // 2^63 and 2^64 are exact in f64; the ranges are half-open
        const I64_BOUND: f64 = 9_223_372_036_854_775_808.0;
        const U64_BOUND: f64 = 18_446_744_073_709_551_616.0;

        if !f.is_finite() || f.fract() != 0.0 {
            return None;
        }
        if (-I64_BOUND..I64_BOUND).contains(&f) {
            Some(RequestId::Number(f as i64))
        } else if (0.0..U64_BOUND).contains(&f) {
            Some(RequestId::Unsigned(f as u64))
        } else {
            None
        }
    }

    /// Salvage the `id` member of a (possibly malformed) entry
    pub fn salvage(entry: &Value) -> Option<Self> {
        entry.get("id").and_then(Self::from_value)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            RequestId::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            RequestId::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self {
            RequestId::Number(n) => u64::try_from(*n).ok(),
            RequestId::Unsigned(n) => Some(*n),
            _ => None,
        }
    }
}

/// JSON-RPC version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JsonRpcVersion {
    #[default]
    V2_0,
}

impl JsonRpcVersion {
    pub fn as_str(&self) -> &'static str {
        match self {
            JsonRpcVersion::V2_0 => crate::JSONRPC_VERSION,
        }
    }
}

impl fmt::Display for JsonRpcVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Serialize for JsonRpcVersion {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for JsonRpcVersion {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        match s.as_str() {
            "2.0" => Ok(JsonRpcVersion::V2_0),
            _ => Err(serde::de::Error::custom(format!(
                "Invalid JSON-RPC version: {}",
                s
            ))),
        }
    }
}
