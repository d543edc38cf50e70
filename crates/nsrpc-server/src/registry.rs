//! Schema registry
//!
//! Holds, per namespace and method, the declared parameters and the compiled
//! input/output schemas. Built once when the server is assembled and shared
//! read-only afterwards.

use std::collections::BTreeMap;

use serde_json::Value;
use tracing::debug;

use crate::config::ConfigError;
use crate::handler::MethodSignature;
use crate::schema::{CompiledSchema, ParamSpec, derive_default_input_schema, derive_default_output_schema};

/// Everything the server knows about one method
#[derive(Debug)]
pub struct MethodDescriptor {
    name: String,
    params: Vec<ParamSpec>,
    input: CompiledSchema,
    output: CompiledSchema,
}

impl MethodDescriptor {
    pub fn from_signature(namespace: &str, signature: MethodSignature) -> Result<Self, ConfigError> {
        let MethodSignature {
            name,
            params,
            input_schema,
            output_schema,
        } = signature;

        let input_schema = input_schema.unwrap_or_else(|| derive_default_input_schema(&params));
        let output_schema = output_schema.unwrap_or_else(derive_default_output_schema);

        let input = CompiledSchema::compile_for(input_schema, format!("{}.{} input", namespace, name))?;
        let output = CompiledSchema::compile_for(output_schema, format!("{}.{} output", namespace, name))?;

        Ok(Self {
            name,
            params,
            input,
            output,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn params(&self) -> &[ParamSpec] {
        &self.params
    }

    pub fn param_names(&self) -> Vec<&str> {
        self.params.iter().map(|p| p.name.as_str()).collect()
    }

    pub fn input(&self) -> &CompiledSchema {
        &self.input
    }

    pub fn output(&self) -> &CompiledSchema {
        &self.output
    }
}

/// Input and output schema documents of a method; both `None` when unknown
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MethodSchemas<'a> {
    pub input: Option<&'a Value>,
    pub output: Option<&'a Value>,
}

impl MethodSchemas<'_> {
    pub fn is_known(&self) -> bool {
        self.input.is_some()
    }
}

/// Per-namespace method table with compiled schemas
#[derive(Debug)]
pub struct SchemaRegistry {
    server_url: String,
    namespaces: BTreeMap<String, BTreeMap<String, MethodDescriptor>>,
}

impl SchemaRegistry {
    pub fn new(server_url: impl Into<String>) -> Self {
        let mut server_url = server_url.into();
        if !server_url.ends_with('/') {
            server_url.push('/');
        }
        Self {
            server_url,
            namespaces: BTreeMap::new(),
        }
    }

    /// Register the methods of one namespace, compiling their schemas
    pub fn register(
        &mut self,
        namespace: &str,
        signatures: impl IntoIterator<Item = MethodSignature>,
    ) -> Result<(), ConfigError> {
        let mut methods = BTreeMap::new();
        for signature in signatures {
            let descriptor = MethodDescriptor::from_signature(namespace, signature)?;
            debug!(
                namespace = %namespace,
                method = %descriptor.name(),
                params = descriptor.params().len(),
                "Registered method"
            );
            methods.insert(descriptor.name().to_string(), descriptor);
        }
        self.namespaces.insert(namespace.to_string(), methods);
        Ok(())
    }

    pub fn server_url(&self) -> &str {
        &self.server_url
    }

    pub fn has_namespace(&self, namespace: &str) -> bool {
        self.namespaces.contains_key(namespace)
    }

    /// Registered namespace names in sorted order
    pub fn namespaces(&self) -> impl Iterator<Item = &str> {
        self.namespaces.keys().map(String::as_str)
    }

    /// Method descriptors of a namespace in sorted order
    pub fn methods(&self, namespace: &str) -> impl Iterator<Item = &MethodDescriptor> {
        self.namespaces
            .get(namespace)
            .into_iter()
            .flat_map(|methods| methods.values())
    }

    pub fn descriptor(&self, namespace: &str, method: &str) -> Option<&MethodDescriptor> {
        self.namespaces.get(namespace)?.get(method)
    }

    /// Declared parameter names in declaration order; empty when unknown
    pub fn param_names(&self, namespace: &str, method: &str) -> Vec<&str> {
        self.descriptor(namespace, method)
            .map(MethodDescriptor::param_names)
            .unwrap_or_default()
    }

    pub fn schemas(&self, namespace: &str, method: &str) -> MethodSchemas<'_> {
        match self.descriptor(namespace, method) {
            Some(descriptor) => MethodSchemas {
                input: Some(descriptor.input().schema()),
                output: Some(descriptor.output().schema()),
            },
            None => MethodSchemas {
                input: None,
                output: None,
            },
        }
    }

    pub fn namespace_url(&self, namespace: &str) -> String {
        format!("{}{}/", self.server_url, namespace)
    }

    pub fn input_schema_url(&self, namespace: &str, method: &str) -> String {
        format!("{}schemas/{}/{}/input-schema.json", self.server_url, namespace, method)
    }

    pub fn output_schema_url(&self, namespace: &str, method: &str) -> String {
        format!("{}schemas/{}/{}/output-schema.json", self.server_url, namespace, method)
    }
}
