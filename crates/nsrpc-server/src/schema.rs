//! Schema construction and compilation
//!
//! Builds the protocol envelope schema and the default per-method input/output
//! schemas derived from declared parameter types. Validation itself is
//! delegated to the `jsonschema` crate (draft 7, matching the `definitions`,
//! `items`-as-array and `additionalItems` keywords used below).

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::config::ConfigError;

/// JSON type of a declared method parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    Integer,
    /// Any JSON number; floating point parameters use this
    Number,
    String,
    Boolean,
    Array,
    Object,
    /// No type constraint
    Any,
}

impl ParamType {
    pub fn to_schema(self) -> Value {
        match self {
            ParamType::Integer => json!({"type": "integer"}),
            ParamType::Number => json!({"type": "number"}),
            ParamType::String => json!({"type": "string"}),
            ParamType::Boolean => json!({"type": "boolean"}),
            ParamType::Array => json!({"type": "array"}),
            ParamType::Object => json!({"type": "object"}),
            ParamType::Any => json!({}),
        }
    }
}

/// One declared parameter: name, type and whether callers may omit it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub param_type: ParamType,
    pub optional: bool,
}

impl ParamSpec {
    pub fn required(name: impl Into<String>, param_type: ParamType) -> Self {
        Self {
            name: name.into(),
            param_type,
            optional: false,
        }
    }

    pub fn optional(name: impl Into<String>, param_type: ParamType) -> Self {
        Self {
            name: name.into(),
            param_type,
            optional: true,
        }
    }
}

/// Structural schema every call envelope must satisfy.
///
/// Integer ids are limited to what a reply can echo exactly.
pub fn envelope_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "jsonrpc": {"const": "2.0"},
            "method": {"type": "string"},
            "params": {"oneOf": [{"type": "object"}, {"type": "array"}]},
            "id": {
                "oneOf": [
                    {"type": "integer", "minimum": i64::MIN, "maximum": u64::MAX},
                    {"type": "string"}
                ]
            }
        },
        "required": ["jsonrpc", "method"]
    })
}

/// Input schema accepting params either positionally or by name.
///
/// Positional params are checked item by item against the declared types with
/// no extra items allowed. Named params must match the declared properties,
/// with non-optional parameters required and unknown keys rejected.
pub fn derive_default_input_schema(params: &[ParamSpec]) -> Value {
    let items: Vec<Value> = params.iter().map(|p| p.param_type.to_schema()).collect();
    let properties: Map<String, Value> = params
        .iter()
        .map(|p| (p.name.clone(), p.param_type.to_schema()))
        .collect();
    let required: Vec<Value> = params
        .iter()
        .filter(|p| !p.optional)
        .map(|p| Value::String(p.name.clone()))
        .collect();

    let mut params_as_array = Map::new();
    params_as_array.insert("type".into(), json!("array"));
    if !items.is_empty() {
        params_as_array.insert("items".into(), Value::Array(items));
    }
    params_as_array.insert("additionalItems".into(), json!(false));

    let mut params_as_object = Map::new();
    params_as_object.insert("type".into(), json!("object"));
    if !properties.is_empty() {
        params_as_object.insert("properties".into(), Value::Object(properties));
    }
    params_as_object.insert("additionalProperties".into(), json!(false));
    if !required.is_empty() {
        params_as_object.insert("required".into(), Value::Array(required));
    }

    json!({
        "definitions": {
            "paramsAsArray": params_as_array,
            "paramsAsObject": params_as_object
        },
        "type": "object",
        "properties": {
            "jsonrpc": {"const": "2.0"},
            "method": {"type": "string"},
            "params": {
                "oneOf": [
                    {"$ref": "#/definitions/paramsAsArray"},
                    {"$ref": "#/definitions/paramsAsObject"}
                ]
            },
            "id": {"oneOf": [{"type": "integer"}, {"type": "string"}]}
        },
        "required": ["jsonrpc", "method"]
    })
}

/// Output schema describing any response envelope: success, error, or no reply
pub fn derive_default_output_schema() -> Value {
    json!({
        "oneOf": [
            {
                "type": "object",
                "properties": {
                    "jsonrpc": {"const": "2.0"},
                    "result": {
                        "anyOf": [
                            {"type": "boolean"}, {"type": "number"}, {"type": "integer"},
                            {"type": "string"}, {"type": "array"}, {"type": "object"},
                            {"type": "null"}
                        ]
                    },
                    "id": {"oneOf": [{"type": "integer"}, {"type": "string"}]}
                },
                "required": ["jsonrpc", "result", "id"]
            },
            {
                "type": "object",
                "properties": {
                    "jsonrpc": {"const": "2.0"},
                    "error": {
                        "type": "object",
                        "properties": {
                            "code": {"type": "integer"},
                            "message": {"type": "string"}
                        },
                        "required": ["code", "message"]
                    },
                    "id": {"oneOf": [{"type": "integer"}, {"type": "string"}, {"type": "null"}]}
                },
                "required": ["jsonrpc", "error", "id"]
            },
            {"type": "null"}
        ]
    })
}

/// A schema document together with its compiled validator
pub struct CompiledSchema {
    schema: Value,
    validator: jsonschema::Validator,
}

impl CompiledSchema {
    pub fn compile(schema: Value) -> Result<Self, ConfigError> {
        let validator = jsonschema::draft7::new(&schema).map_err(|err| ConfigError::InvalidSchema {
            location: "<anonymous>".to_string(),
            reason: err.to_string(),
        })?;
        Ok(Self { schema, validator })
    }

    /// Compile, naming the schema's owner in any error
    pub fn compile_for(schema: Value, location: impl Into<String>) -> Result<Self, ConfigError> {
        Self::compile(schema).map_err(|err| match err {
            ConfigError::InvalidSchema { reason, .. } => ConfigError::InvalidSchema {
                location: location.into(),
                reason,
            },
            other => other,
        })
    }

    pub fn schema(&self) -> &Value {
        &self.schema
    }

    pub fn is_valid(&self, instance: &Value) -> bool {
        self.validator.is_valid(instance)
    }

    /// First validation error, for diagnostics
    pub fn first_error(&self, instance: &Value) -> Option<String> {
        self.validator
            .iter_errors(instance)
            .next()
            .map(|err| err.to_string())
    }
}

impl fmt::Debug for CompiledSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledSchema")
            .field("schema", &self.schema)
            .finish_non_exhaustive()
    }
}
