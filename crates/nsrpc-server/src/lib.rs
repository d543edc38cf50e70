//! # Namespaced JSON-RPC 2.0 Server
//!
//! Transport-agnostic request processing for JSON-RPC 2.0 services grouped
//! into namespaces. A raw request body goes in; a serialized response body
//! and its cache TTL come out.
//!
//! ## Quick Start
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
//!     fn sum(&mut self, args: Args) -> MethodFuture<'_> {
//!         Box::pin(async move {
//!             let (a, b): (i64, i64) = args.into_tuple()?;
//!             self.context.enable_default_cache();
//!             Ok(json!(a + b))
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
//!             Method::new("sum", Self::sum)
//!                 .param("numberA", ParamType::Integer)
//!                 .param("numberB", ParamType::Integer),
//!         ]
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let pipeline = ServerBuilder::new().handler::<MathHandler>("math").build()?;
//!
//!     let body = br#"{"jsonrpc":"2.0","method":"sum","params":[1,2],"id":1}"#;
//!     let output = pipeline.handle(Some("/math/"), body).await;
//!     assert_eq!(output.body_str(), r#"{"jsonrpc":"2.0","result":3,"id":1}"#);
//!     Ok(())
//! }
//! ```
//!
//! ## Pipeline stages
//!
//! 1. Decode the body; malformed JSON yields a parse error with a null id
//! 2. Classify as single entry or batch
//! 3. Validate each entry against the envelope schema
//! 4. Dispatch: resolve the namespace handler, check the method, validate
//!    params against the method's input schema, bind and invoke
//! 5. Aggregate replies in input order, dropping notifications

pub mod binder;
pub mod builder;
pub mod catalog;
pub mod config;
pub mod dispatch;
pub mod handler;
pub mod headers;
pub mod introspection;
pub mod pipeline;
pub mod prelude;
pub mod registry;
pub mod schema;
pub mod system;
pub mod validator;

pub use binder::{BindError, ParameterBinder};
pub use builder::ServerBuilder;
pub use catalog::{HandlerCatalog, HandlerFactory};
pub use config::{ConfigError, ServerConfig};
pub use dispatch::{Dispatch, DispatchOutcome, Dispatcher, EntryReply};
pub use handler::{
    Args, HandlerContext, HandlerError, HandlerResult, HandlerType, Method, MethodFn, MethodFuture,
    MethodSignature, NamespaceHandler, to_result,
};
pub use headers::ResponseHeaders;
pub use introspection::{SchemaKind, SchemaProvider};
pub use pipeline::{Pipeline, PipelineError, PipelineOutput, RequestBody};
pub use registry::{MethodDescriptor, MethodSchemas, SchemaRegistry};
pub use schema::{ParamSpec, ParamType};
pub use system::SystemHandler;

// Re-export the protocol crate
pub use nsrpc_json_rpc;
