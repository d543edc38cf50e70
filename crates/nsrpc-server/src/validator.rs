//! Request validation against the envelope schema and method input schemas

use std::sync::Arc;

use serde_json::Value;
use tracing::trace;

use crate::config::ConfigError;
use crate::registry::SchemaRegistry;
use crate::schema::{CompiledSchema, envelope_schema};

/// Pure validity checks over decoded entries
#[derive(Debug)]
pub struct RequestValidator {
    envelope: CompiledSchema,
    registry: Arc<SchemaRegistry>,
}

impl RequestValidator {
    pub fn new(registry: Arc<SchemaRegistry>) -> Result<Self, ConfigError> {
        Ok(Self {
            envelope: CompiledSchema::compile_for(envelope_schema(), "request envelope")?,
            registry,
        })
    }

    /// True when the entry is a structurally valid call envelope
    pub fn validate_envelope(&self, entry: &Value) -> bool {
        let valid = self.envelope.is_valid(entry);
        if !valid {
            trace!(
                reason = ?self.envelope.first_error(entry),
                "Entry failed envelope validation"
            );
        }
        valid
    }

    /// True when the whole entry satisfies the method's input schema.
    /// Methods without a registered schema accept anything.
    pub fn validate_params(&self, namespace: &str, method: &str, entry: &Value) -> bool {
        let Some(descriptor) = self.registry.descriptor(namespace, method) else {
            return true;
        };
        let valid = descriptor.input().is_valid(entry);
        if !valid {
            trace!(
                namespace = %namespace,
                method = %method,
                reason = ?descriptor.input().first_error(entry),
                "Entry failed input schema validation"
            );
        }
        valid
    }
}
