//! Request pipeline
//!
//! Raw body in, response body out: decode, classify as single or batch,
//! validate and dispatch every entry, then aggregate and serialize. Entries of
//! a batch run concurrently and their replies keep input order.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use nsrpc_json_rpc::{Envelope, JsonRpcError, JsonRpcMessage, RequestId, error_codes};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::resolve_namespace;
use crate::dispatch::{Dispatcher, EntryReply};
use crate::headers::ResponseHeaders;
use crate::introspection::SchemaProvider;
use crate::registry::SchemaRegistry;
use crate::validator::RequestValidator;

/// Failures that replace the whole response with a single error object
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("body is not valid JSON: {0}")]
    Parse(#[source] serde_json::Error),

    #[error("request is an empty array or object")]
    EmptyRequest,

    #[error("JSON encoding error: {0}")]
    Encoding(String),
}

impl PipelineError {
    pub fn to_response(&self) -> JsonRpcError {
        match self {
            PipelineError::Parse(_) => JsonRpcError::parse_error(),
            PipelineError::EmptyRequest => JsonRpcError::invalid_request(None),
            PipelineError::Encoding(detail) => JsonRpcError::server_error(
                None,
                error_codes::RESPONSE_ENCODING_FAILED,
                format!("JSON encoding error: {}", detail),
            ),
        }
    }
}

/// Decoded body, classified
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    Single(Value),
    Batch(Vec<Value>),
}

impl RequestBody {
    /// Decode and classify a raw body
    pub fn decode(body: &[u8]) -> Result<Self, PipelineError> {
        let value: Value = serde_json::from_slice(body).map_err(PipelineError::Parse)?;
        match value {
            Value::Array(entries) if entries.is_empty() => Err(PipelineError::EmptyRequest),
            Value::Object(map) if map.is_empty() => Err(PipelineError::EmptyRequest),
            Value::Array(entries) => Ok(RequestBody::Batch(entries)),
            other => Ok(RequestBody::Single(other)),
        }
    }

    pub fn is_batch(&self) -> bool {
        matches!(self, RequestBody::Batch(_))
    }

    pub fn entries(&self) -> &[Value] {
        match self {
            RequestBody::Single(entry) => std::slice::from_ref(entry),
            RequestBody::Batch(entries) => entries,
        }
    }
}

#[derive(Serialize)]
#[serde(untagged)]
enum Payload<'a> {
    Single(&'a JsonRpcMessage),
    Batch(&'a [JsonRpcMessage]),
}

/// Serialized response body and the cache TTL that applies to it
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOutput {
    /// Empty when nothing is to be sent back
    pub body: Vec<u8>,
    pub cache_ttl: u32,
}

impl PipelineOutput {
    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }

    pub fn body_str(&self) -> &str {
        std::str::from_utf8(&self.body).unwrap_or_default()
    }

    /// Decoded body, `None` when empty
    pub fn json(&self) -> Option<Value> {
        serde_json::from_slice(&self.body).ok()
    }

    pub fn headers(&self, now: DateTime<Utc>) -> ResponseHeaders {
        ResponseHeaders::for_ttl(self.cache_ttl, now)
    }
}

/// One entry's reply plus the TTL its handler chose
struct EntryResult {
    reply: EntryReply,
    cache_ttl: Option<u32>,
}

/// Complete request pipeline for one server
#[derive(Debug)]
pub struct Pipeline {
    registry: Arc<SchemaRegistry>,
    validator: Arc<RequestValidator>,
    dispatcher: Dispatcher,
    default_namespace: String,
    default_cache_ttl: u32,
}

impl Pipeline {
    pub fn new(
        registry: Arc<SchemaRegistry>,
        validator: Arc<RequestValidator>,
        dispatcher: Dispatcher,
        default_namespace: impl Into<String>,
        default_cache_ttl: u32,
    ) -> Self {
        Self {
            registry,
            validator,
            dispatcher,
            default_namespace: default_namespace.into(),
            default_cache_ttl,
        }
    }

    pub fn registry(&self) -> &Arc<SchemaRegistry> {
        &self.registry
    }

    pub fn schema_provider(&self) -> SchemaProvider {
        SchemaProvider::new(Arc::clone(&self.registry))
    }

    /// Namespace for a path hint such as `/math/`
    pub fn resolve_namespace(&self, hint: Option<&str>) -> String {
        resolve_namespace(hint, &self.default_namespace)
    }

    /// Process one raw request body
    pub async fn handle(&self, namespace_hint: Option<&str>, body: &[u8]) -> PipelineOutput {
        let namespace = self.resolve_namespace(namespace_hint);

        let batch = match RequestBody::decode(body) {
            Ok(batch) => batch,
            Err(err) => {
                debug!(namespace = %namespace, error = %err, "Rejecting request body");
                return self.fail(&err);
            }
        };

        debug!(
            namespace = %namespace,
            batch = batch.is_batch(),
            entries = batch.entries().len(),
            "Processing request"
        );

        let results = join_all(
            batch
                .entries()
                .iter()
                .map(|entry| self.process_entry(&namespace, entry)),
        )
        .await;

        self.aggregate(results, batch.is_batch())
    }

    async fn process_entry(&self, namespace: &str, entry: &Value) -> EntryResult {
        if !self.validator.validate_envelope(entry) {
            let id = RequestId::salvage(entry);
            warn!(id = ?id, "Invalid request entry");
            return EntryResult {
                reply: EntryReply::Message(JsonRpcError::invalid_request(id).into()),
                cache_ttl: None,
            };
        }

        let envelope = match Envelope::from_value(entry) {
            Ok(envelope) => envelope,
            Err(err) => {
                let id = RequestId::salvage(entry);
                warn!(id = ?id, error = %err, "Entry passed the envelope schema but failed to decode");
                return EntryResult {
                    reply: EntryReply::Message(JsonRpcError::invalid_request(id).into()),
                    cache_ttl: None,
                };
            }
        };

        let dispatch = self.dispatcher.dispatch(namespace, entry, envelope).await;
        EntryResult {
            cache_ttl: dispatch.cache_ttl(),
            reply: dispatch.into_reply(),
        }
    }

    fn aggregate(&self, results: Vec<EntryResult>, is_batch: bool) -> PipelineOutput {
        let mut messages = Vec::with_capacity(results.len());
        let mut cache_ttl = None;

        for result in results {
            if let Some(ttl) = result.cache_ttl {
                cache_ttl = Some(ttl);
            }
            match result.reply {
                EntryReply::Message(message) => messages.push(message),
                EntryReply::Silent => {}
                EntryReply::EncodingFailure(detail) => {
                    return self.fail(&PipelineError::Encoding(detail));
                }
            }
        }

        let cache_ttl = cache_ttl.unwrap_or(self.default_cache_ttl);

        let encoded = match messages.as_slice() {
            [] => return PipelineOutput { body: Vec::new(), cache_ttl },
            [single] if !is_batch => serde_json::to_vec(&Payload::Single(single)),
            all => serde_json::to_vec(&Payload::Batch(all)),
        };

        match encoded {
            Ok(body) => PipelineOutput { body, cache_ttl },
            Err(err) => self.fail(&PipelineError::Encoding(err.to_string())),
        }
    }

    /// Whole-response error; never cacheable
    fn fail(&self, err: &PipelineError) -> PipelineOutput {
        if let PipelineError::Encoding(detail) = err {
            warn!(detail = %detail, "Response could not be encoded");
        }
        let body = serde_json::to_vec(&err.to_response()).unwrap_or_default();
        PipelineOutput { body, cache_ttl: 0 }
    }
}
