//! Server builder
//!
//! Registers handler types, binds namespaces to them and assembles the
//! [`Pipeline`]. Registration problems are collected and reported together
//! by [`ServerBuilder::build`].

use std::sync::Arc;

use tracing::{info, warn};

use crate::catalog::HandlerCatalog;
use crate::config::{ConfigError, DEFAULT_NAMESPACE, ServerConfig, is_valid_namespace};
use crate::dispatch::Dispatcher;
use crate::handler::HandlerType;
use crate::pipeline::Pipeline;
use crate::registry::SchemaRegistry;
use crate::system::{SYSTEM_HANDLER_TYPE, SystemHandler};
use crate::validator::RequestValidator;

/// Builder for request pipelines
pub struct ServerBuilder {
    config: ServerConfig,
    catalog: HandlerCatalog,
    validation_errors: Vec<String>,
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ServerBuilder {
    /// Builder with default configuration and the `system` namespace
    pub fn new() -> Self {
        Self::from_config(ServerConfig::default())
    }

    /// Builder seeded from a loaded configuration
    pub fn from_config(config: ServerConfig) -> Self {
        let mut catalog = HandlerCatalog::new();
        catalog.register::<SystemHandler>(SYSTEM_HANDLER_TYPE);
        Self {
            config,
            catalog,
            validation_errors: Vec::new(),
        }
    }

    /// Base URL for schema and namespace URLs
    pub fn server_url(mut self, url: impl Into<String>) -> Self {
        self.config.server_url = url.into();
        self
    }

    pub fn default_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.config.default_namespace = namespace.into();
        self
    }

    /// TTL used when no successful handler chose one
    pub fn default_cache_ttl(mut self, ttl: u32) -> Self {
        self.config.default_cache_ttl = ttl;
        self
    }

    /// Register handler type `H` under `type_name`
    pub fn handler_type<H: HandlerType>(mut self, type_name: impl Into<String>) -> Self {
        let type_name = type_name.into();
        if self.catalog.register::<H>(type_name.clone()) {
            self.validation_errors
                .push(format!("handler type '{}' is registered more than once", type_name));
        }
        self
    }

    /// Bind `namespace` to a registered (or configured) handler type name
    pub fn namespace(mut self, namespace: impl Into<String>, type_name: impl Into<String>) -> Self {
        let namespace = namespace.into();
        if !is_valid_namespace(&namespace) {
            self.validation_errors
                .push(ConfigError::InvalidNamespace(namespace.clone()).to_string());
        }
        self.config.namespaces.insert(namespace, type_name.into());
        self
    }

    /// Register `H` and bind `namespace` to it in one step
    pub fn handler<H: HandlerType>(self, namespace: impl Into<String>) -> Self {
        let namespace = namespace.into();
        self.handler_type::<H>(namespace.clone())
            .namespace(namespace.clone(), namespace)
    }

    pub fn build(mut self) -> Result<Pipeline, ConfigError> {
        if !self.validation_errors.is_empty() {
            return Err(ConfigError::Validation(self.validation_errors));
        }

        self.config
            .namespaces
            .entry(DEFAULT_NAMESPACE.to_string())
            .or_insert_with(|| SYSTEM_HANDLER_TYPE.to_string());
        self.config.normalize();
        self.config.validate()?;

        let mut registry = SchemaRegistry::new(self.config.server_url.clone());
        for (namespace, type_name) in &self.config.namespaces {
            match self.catalog.get(type_name) {
                Some(factory) => registry.register(namespace, factory.signatures())?,
                None => warn!(
                    namespace = %namespace,
                    handler_type = %type_name,
                    "Namespace is bound to an unregistered handler type; calls will fail"
                ),
            }
        }
        if !self.config.namespaces.contains_key(&self.config.default_namespace) {
            warn!(
                namespace = %self.config.default_namespace,
                "Default namespace has no handler"
            );
        }

        let registry = Arc::new(registry);
        let validator = Arc::new(RequestValidator::new(Arc::clone(&registry))?);
        let dispatcher = Dispatcher::new(
            Arc::clone(&registry),
            Arc::new(self.catalog),
            self.config.namespaces.clone(),
            Arc::clone(&validator),
        );

        info!(
            namespaces = self.config.namespaces.len(),
            default_namespace = %self.config.default_namespace,
            "Server pipeline ready"
        );

        Ok(Pipeline::new(
            registry,
            validator,
            dispatcher,
            self.config.default_namespace,
            self.config.default_cache_ttl,
        ))
    }
}
