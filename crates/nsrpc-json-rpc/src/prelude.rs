//! # JSON-RPC Prelude
//!
//! Convenient re-exports of the most commonly used protocol types.
//!
//! ```rust
//! use nsrpc_json_rpc::prelude::*;
//! ```

pub use crate::error::{JsonRpcError, JsonRpcErrorCode, JsonRpcErrorObject};
pub use crate::request::{Envelope, Params};
pub use crate::response::{JsonRpcMessage, JsonRpcResponse};
pub use crate::types::{JsonRpcVersion, RequestId};

// Standard error codes
pub use crate::error_codes::*;
