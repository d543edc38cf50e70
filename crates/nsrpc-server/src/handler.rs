//! Namespace handler contract
//!
//! A namespace handler type exposes a table of named async methods. One
//! instance is created per call entry through [`HandlerType::create`], so
//! handlers may keep per-call state (such as the cache TTL) in `&mut self`.
//!
//! ```rust,no_run
//! use nsrpc_server::prelude::*;
//! use serde_json::json;
//!
//! struct MathHandler {
//!     context: HandlerContext,
//! }
//!
//! impl MathHandler {
//!     fn subtract(&mut self, args: Args) -> MethodFuture<'_> {
//!         Box::pin(async move {
//!             let (minuend, subtrahend): (i64, i64) = args.into_tuple()?;
//!             Ok(json!(minuend - subtrahend))
//!         })
//!     }
//! }
//!
//! impl HandlerType for MathHandler {
//!     fn create(context: HandlerContext) -> Self {
//!         Self { context }
//!     }
//!
//!     fn context(&self) -> &HandlerContext {
//!         &self.context
//!     }
//!
//!     fn methods() -> Vec<Method<Self>> {
//!         vec![
//!             Method::new("subtract", Self::subtract)
//!                 .param("minuend", ParamType::Integer)
//!                 .param("subtrahend", ParamType::Integer),
//!         ]
//!     }
//! }
//! ```

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;
use nsrpc_json_rpc::{JsonRpcErrorObject, error_codes};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

use crate::config::DEFAULT_HANDLER_CACHE_TTL;
use crate::registry::SchemaRegistry;
use crate::schema::{ParamSpec, ParamType};

/// Errors a handler method can raise
#[derive(Debug, Clone, Error, PartialEq)]
pub enum HandlerError {
    #[error("invalid params: {0}")]
    InvalidParams(String),

    #[error("method '{0}' not found")]
    MethodNotFound(String),

    /// Forwarded as a server-range error carrying `data`
    #[error("server error {code}: {data}")]
    Server { code: i64, data: String },

    /// The result cannot be represented as JSON; replaces the whole response
    #[error("JSON encoding error: {0}")]
    Encoding(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl HandlerError {
    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::InvalidParams(message.into())
    }

    pub fn server(code: i64, data: impl Into<String>) -> Self {
        Self::Server {
            code,
            data: data.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// The single mapping from handler failures to wire error objects
    pub fn to_error_object(&self) -> JsonRpcErrorObject {
        match self {
            HandlerError::InvalidParams(_) => JsonRpcErrorObject::invalid_params(),
            HandlerError::MethodNotFound(_) => JsonRpcErrorObject::method_not_found(),
            HandlerError::Server { code, data } => JsonRpcErrorObject::server_error(*code, data.as_str()),
            HandlerError::Encoding(detail) => JsonRpcErrorObject::server_error(
                error_codes::RESPONSE_ENCODING_FAILED,
                format!("JSON encoding error: {}", detail),
            ),
            HandlerError::Internal(_) => JsonRpcErrorObject::internal_error(),
        }
    }
}

pub type HandlerResult<T> = Result<T, HandlerError>;

/// Serialize a handler's return value, flagging unrepresentable results
pub fn to_result<T: Serialize>(value: &T) -> HandlerResult<Value> {
    serde_json::to_value(value).map_err(|err| HandlerError::Encoding(err.to_string()))
}

/// Positional arguments after binding
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Args(Vec<Value>);

impl Args {
    pub fn new(values: Vec<Value>) -> Self {
        Self(values)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[Value] {
        &self.0
    }

    pub fn into_inner(self) -> Vec<Value> {
        self.0
    }

    /// Required argument at `index`
    pub fn get<T: DeserializeOwned>(&self, index: usize) -> HandlerResult<T> {
        let value = self
            .0
            .get(index)
            .ok_or_else(|| HandlerError::invalid_params(format!("missing argument at position {}", index)))?;
        serde_json::from_value(value.clone()).map_err(|err| {
            HandlerError::invalid_params(format!("argument at position {}: {}", index, err))
        })
    }

    /// Optional argument at `index`; absent and `null` both yield `None`
    pub fn get_opt<T: DeserializeOwned>(&self, index: usize) -> HandlerResult<Option<T>> {
        match self.0.get(index) {
            None | Some(Value::Null) => Ok(None),
            Some(_) => self.get(index).map(Some),
        }
    }

    /// All arguments as a tuple (or any type deserializable from an array)
    pub fn into_tuple<T: DeserializeOwned>(self) -> HandlerResult<T> {
        serde_json::from_value(Value::Array(self.0))
            .map_err(|err| HandlerError::invalid_params(err.to_string()))
    }
}

impl From<Vec<Value>> for Args {
    fn from(values: Vec<Value>) -> Self {
        Self(values)
    }
}

/// Per-call state handed to every handler instance
#[derive(Clone)]
pub struct HandlerContext {
    namespace: String,
    cache_ttl: u32,
    registry: Arc<SchemaRegistry>,
}

impl HandlerContext {
    pub fn new(namespace: impl Into<String>, registry: Arc<SchemaRegistry>) -> Self {
        Self {
            namespace: namespace.into(),
            cache_ttl: 0,
            registry,
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Seconds the response may be cached; 0 disables caching
    pub fn cache_ttl(&self) -> u32 {
        self.cache_ttl
    }

    pub fn enable_cache(&mut self, ttl: u32) {
        self.cache_ttl = ttl;
    }

    pub fn enable_default_cache(&mut self) {
        self.cache_ttl = DEFAULT_HANDLER_CACHE_TTL;
    }

    pub fn disable_cache(&mut self) {
        self.cache_ttl = 0;
    }

    /// Registry of every namespace's method schemas
    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }
}

impl fmt::Debug for HandlerContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerContext")
            .field("namespace", &self.namespace)
            .field("cache_ttl", &self.cache_ttl)
            .finish_non_exhaustive()
    }
}

pub type MethodFuture<'a> = BoxFuture<'a, HandlerResult<Value>>;

/// Signature every handler method is written against
pub type MethodFn<H> = for<'a> fn(&'a mut H, Args) -> MethodFuture<'a>;

/// Type-erased description of a method, used to build the schema registry
#[derive(Debug, Clone, PartialEq)]
pub struct MethodSignature {
    pub name: String,
    pub params: Vec<ParamSpec>,
    pub input_schema: Option<Value>,
    pub output_schema: Option<Value>,
}

/// A named method of handler type `H` and its declared parameters
pub struct Method<H> {
    signature: MethodSignature,
    call: MethodFn<H>,
}

impl<H> Method<H> {
    pub fn new(name: impl Into<String>, call: MethodFn<H>) -> Self {
        Self {
            signature: MethodSignature {
                name: name.into(),
                params: Vec::new(),
                input_schema: None,
                output_schema: None,
            },
            call,
        }
    }

    pub fn param(mut self, name: impl Into<String>, param_type: ParamType) -> Self {
        self.signature.params.push(ParamSpec::required(name, param_type));
        self
    }

    /// A parameter callers may omit; it must follow the required ones
    pub fn optional_param(mut self, name: impl Into<String>, param_type: ParamType) -> Self {
        self.signature.params.push(ParamSpec::optional(name, param_type));
        self
    }

    /// Replace the derived input schema
    pub fn input_schema(mut self, schema: Value) -> Self {
        self.signature.input_schema = Some(schema);
        self
    }

    /// Replace the derived output schema
    pub fn output_schema(mut self, schema: Value) -> Self {
        self.signature.output_schema = Some(schema);
        self
    }

    pub fn name(&self) -> &str {
        &self.signature.name
    }

    pub fn signature(&self) -> &MethodSignature {
        &self.signature
    }

    pub(crate) fn into_parts(self) -> (MethodSignature, MethodFn<H>) {
        (self.signature, self.call)
    }
}

/// Contract implemented by each namespace handler type
pub trait HandlerType: Send + Sized + 'static {
    /// Build a fresh instance for one call entry
    fn create(context: HandlerContext) -> Self;

    fn context(&self) -> &HandlerContext;

    /// The callable methods of this namespace
    fn methods() -> Vec<Method<Self>>;
}

/// Object-safe view of a handler instance, used by the dispatcher
#[async_trait]
pub trait NamespaceHandler: Send {
    fn namespace(&self) -> &str;

    fn has_method(&self, method: &str) -> bool;

    /// TTL chosen by the handler so far
    fn cache_ttl(&self) -> u32;

    async fn invoke(&mut self, method: &str, args: Args) -> HandlerResult<Value>;
}
