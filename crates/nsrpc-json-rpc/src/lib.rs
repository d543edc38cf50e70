//! # JSON-RPC 2.0 Protocol Types
//!
//! Transport-agnostic building blocks for a JSON-RPC 2.0 server: call envelopes,
//! responses and the error taxonomy. No dispatch logic lives here.
//!
//! ## Features
//! - Envelope model with a `Params` sum type (positional, named or absent)
//! - Request/notification distinction fixed at decode time
//! - Responses that serialize field-for-field like the reference wire format
//! - Standard and server-range error codes

pub mod error;
pub mod request;
pub mod response;
pub mod types;
pub mod prelude;

// Re-export main types
pub use error::{JsonRpcError, JsonRpcErrorCode, JsonRpcErrorObject};
pub use request::{Envelope, Params};
pub use response::{JsonRpcMessage, JsonRpcResponse};
pub use types::{JsonRpcVersion, RequestId};

/// JSON-RPC 2.0 version constant
pub const JSONRPC_VERSION: &str = "2.0";

/// JSON-RPC 2.0 error codes
pub mod error_codes {
    pub const PARSE_ERROR: i64 = -32700;
    pub const INVALID_REQUEST: i64 = -32600;
    pub const METHOD_NOT_FOUND: i64 = -32601;
    pub const INVALID_PARAMS: i64 = -32602;
    pub const INTERNAL_ERROR: i64 = -32603;

    /// No handler is registered for the requested namespace
    pub const NAMESPACE_NOT_FOUND: i64 = -32000;
    /// The namespace maps to a type that does not implement the handler contract
    pub const HANDLER_CONTRACT_VIOLATION: i64 = -32001;
    /// The response payload could not be serialized
    pub const RESPONSE_ENCODING_FAILED: i64 = -32002;

    // Server error range: -32099 to -32000
    pub const SERVER_ERROR_START: i64 = -32099;
    pub const SERVER_ERROR_END: i64 = -32000;
}
