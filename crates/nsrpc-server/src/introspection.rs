//! Schema introspection
//!
//! Serves the input and output schema documents of registered methods, as
//! published under `{server_url}schemas/{namespace}/{method}/{kind}-schema.json`.

use std::str::FromStr;
use std::sync::{Arc, OnceLock};

use regex::Regex;
use serde_json::{Value, json};

use crate::registry::SchemaRegistry;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaKind {
    Input,
    Output,
    /// Requested kind is not served; yields an empty schema
    Unknown,
}

impl FromStr for SchemaKind {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "input" => SchemaKind::Input,
            "output" => SchemaKind::Output,
            _ => SchemaKind::Unknown,
        })
    }
}

fn schema_file_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"^(input|output|unknown)-schema\.json$").ok())
        .as_ref()
}

#[derive(Debug, Clone)]
pub struct SchemaProvider {
    registry: Arc<SchemaRegistry>,
}

impl SchemaProvider {
    pub fn new(registry: Arc<SchemaRegistry>) -> Self {
        Self { registry }
    }

    /// Schema document for one method; `{}` when the method or kind is unknown
    pub fn schema(&self, namespace: &str, method: &str, kind: SchemaKind) -> Value {
        let schemas = self.registry.schemas(namespace, method);
        let schema = match kind {
            SchemaKind::Input => schemas.input,
            SchemaKind::Output => schemas.output,
            SchemaKind::Unknown => None,
        };
        schema.cloned().unwrap_or_else(|| json!({}))
    }

    /// Resolve a path of the form `/{namespace}/{method}/{kind}-schema.json`
    pub fn resolve_path(&self, path: &str) -> Value {
        let mut parts = path.trim_matches('/').splitn(3, '/');
        let (Some(namespace), Some(method), Some(file)) = (parts.next(), parts.next(), parts.next()) else {
            return json!({});
        };

        let kind = schema_file_pattern()
            .and_then(|pattern| pattern.captures(file))
            .and_then(|captures| captures.get(1))
            .and_then(|kind| kind.as_str().parse().ok())
            .unwrap_or(SchemaKind::Unknown);

        self.schema(namespace, method, kind)
    }
}
