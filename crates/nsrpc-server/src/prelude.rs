//! Prelude module for common server imports
//!
//! ```rust
//! use nsrpc_server::prelude::*;
//! ```

// Re-export all protocol prelude items
pub use nsrpc_json_rpc::prelude::*;

// Server core types
pub use crate::{
    HandlerCatalog, Pipeline, PipelineOutput, ResponseHeaders, ServerBuilder, ServerConfig,
};

// Handler contract
pub use crate::{
    Args, HandlerContext, HandlerError, HandlerResult, HandlerType, Method, MethodFuture, ParamType,
    to_result,
};

// Essential async trait for implementations
pub use async_trait::async_trait;

// Common serde types for serialization
pub use serde::{Deserialize, Serialize};

pub use std::sync::Arc;
