//! Call dispatch
//!
//! Runs one valid envelope through handler resolution, method lookup, input
//! validation, binding and invocation, and maps every failure onto a wire
//! error object.

use std::any::Any;
use std::collections::BTreeMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use nsrpc_json_rpc::{Envelope, JsonRpcError, JsonRpcErrorObject, JsonRpcMessage, RequestId, error_codes};
use serde_json::Value;
use tracing::{debug, error, warn};

use crate::binder::ParameterBinder;
use crate::catalog::HandlerCatalog;
use crate::handler::{Args, HandlerContext, HandlerError, NamespaceHandler};
use crate::registry::SchemaRegistry;
use crate::validator::RequestValidator;

/// Result of running one envelope, before notification suppression
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchOutcome {
    Success { result: Value, cache_ttl: u32 },
    Failure(JsonRpcErrorObject),
    /// The result cannot be encoded; the whole response must be replaced
    EncodingFailure(String),
}

/// A dispatched entry together with its id
#[derive(Debug, Clone, PartialEq)]
pub struct Dispatch {
    pub id: Option<RequestId>,
    pub outcome: DispatchOutcome,
}

/// What one entry contributes to the aggregated response
#[derive(Debug, Clone, PartialEq)]
pub enum EntryReply {
    Message(JsonRpcMessage),
    /// Notifications never produce output, whatever the outcome
    Silent,
    EncodingFailure(String),
}

impl Dispatch {
    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }

    /// TTL chosen by the handler when the invocation succeeded
    pub fn cache_ttl(&self) -> Option<u32> {
        match &self.outcome {
            DispatchOutcome::Success { cache_ttl, .. } => Some(*cache_ttl),
            _ => None,
        }
    }

    pub fn into_reply(self) -> EntryReply {
        let Some(id) = self.id else {
            return EntryReply::Silent;
        };
        match self.outcome {
            DispatchOutcome::Success { result, .. } => EntryReply::Message(JsonRpcMessage::success(id, result)),
            DispatchOutcome::Failure(error) => EntryReply::Message(JsonRpcError::new(Some(id), error).into()),
            DispatchOutcome::EncodingFailure(detail) => EntryReply::EncodingFailure(detail),
        }
    }
}

/// Resolves namespaces to handlers and invokes methods on them
#[derive(Debug)]
pub struct Dispatcher {
    registry: Arc<SchemaRegistry>,
    catalog: Arc<HandlerCatalog>,
    namespaces: BTreeMap<String, String>,
    validator: Arc<RequestValidator>,
}

impl Dispatcher {
    pub fn new(
        registry: Arc<SchemaRegistry>,
        catalog: Arc<HandlerCatalog>,
        namespaces: BTreeMap<String, String>,
        validator: Arc<RequestValidator>,
    ) -> Self {
        Self {
            registry,
            catalog,
            namespaces,
            validator,
        }
    }

    /// Create a fresh handler instance for `namespace`
    pub fn resolve(&self, namespace: &str) -> Result<Box<dyn NamespaceHandler>, JsonRpcErrorObject> {
        let Some(type_name) = self.namespaces.get(namespace) else {
            warn!(namespace = %namespace, "No handler registered for namespace");
            return Err(JsonRpcErrorObject::server_error(
                error_codes::NAMESPACE_NOT_FOUND,
                format!("Handler for namespace '{}' was not found", namespace),
            ));
        };
        let Some(factory) = self.catalog.get(type_name) else {
            warn!(
                namespace = %namespace,
                handler_type = %type_name,
                "Namespace maps to a type that is not a registered handler"
            );
            return Err(JsonRpcErrorObject::server_error(
                error_codes::HANDLER_CONTRACT_VIOLATION,
                format!("'{}' does not implement the namespace handler contract", type_name),
            ));
        };
        Ok(factory.create(HandlerContext::new(namespace, Arc::clone(&self.registry))))
    }

    /// Dispatch a structurally valid entry. `entry` is the raw decoded value,
    /// `envelope` its typed form.
    pub async fn dispatch(&self, namespace: &str, entry: &Value, envelope: Envelope) -> Dispatch {
        let id = envelope.id.clone();
        let outcome = self.run(namespace, entry, envelope).await;
        Dispatch { id, outcome }
    }

    async fn run(&self, namespace: &str, entry: &Value, envelope: Envelope) -> DispatchOutcome {
        let mut handler = match self.resolve(namespace) {
            Ok(handler) => handler,
            Err(error) => return DispatchOutcome::Failure(error),
        };

        let method = envelope.method.as_str();
        if !handler.has_method(method) {
            debug!(namespace = %namespace, method = %method, "Method not found");
            return DispatchOutcome::Failure(JsonRpcErrorObject::method_not_found());
        }

        if !self.validator.validate_params(namespace, method, entry) {
            return DispatchOutcome::Failure(JsonRpcErrorObject::invalid_params());
        }

        let params = self
            .registry
            .descriptor(namespace, method)
            .map(|descriptor| descriptor.params())
            .unwrap_or_default();
        let args = match ParameterBinder::bind(params, envelope.params) {
            Ok(args) => args,
            Err(err) => {
                debug!(namespace = %namespace, method = %method, error = %err, "Parameter binding failed");
                return DispatchOutcome::Failure(JsonRpcErrorObject::invalid_params());
            }
        };

        debug!(namespace = %namespace, method = %method, args = args.len(), "Invoking method");
        let invocation = AssertUnwindSafe(handler.invoke(method, Args::new(args)))
            .catch_unwind()
            .await;

        match invocation {
            Ok(Ok(result)) => DispatchOutcome::Success {
                result,
                cache_ttl: handler.cache_ttl(),
            },
            Ok(Err(HandlerError::Encoding(detail))) => {
                warn!(namespace = %namespace, method = %method, detail = %detail, "Result could not be encoded");
                DispatchOutcome::EncodingFailure(detail)
            }
            Ok(Err(err)) => {
                debug!(namespace = %namespace, method = %method, error = %err, "Method returned an error");
                DispatchOutcome::Failure(err.to_error_object())
            }
            Err(panic) => {
                error!(
                    namespace = %namespace,
                    method = %method,
                    panic = %panic_message(panic.as_ref()),
                    "Handler panicked"
                );
                DispatchOutcome::Failure(JsonRpcErrorObject::internal_error())
            }
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
