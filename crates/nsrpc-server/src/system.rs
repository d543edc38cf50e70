//! Built-in `system` namespace
//!
//! Publishes the server's service map so clients can discover every
//! namespace, method and schema URL.

use serde::Serialize;
use serde_json::{Value, json};
use std::collections::BTreeMap;

use crate::handler::{Args, HandlerContext, HandlerType, Method, MethodFuture, to_result};

/// Type name the system handler is registered under
pub const SYSTEM_HANDLER_TYPE: &str = "system";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceEntry {
    pub input_schema: String,
    pub output_schema: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServerConfiguration {
    pub services: BTreeMap<String, BTreeMap<String, ServiceEntry>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigurationReport {
    pub server_configuration: ServerConfiguration,
    pub server_timestamp: i64,
}

pub struct SystemHandler {
    context: HandlerContext,
}

impl SystemHandler {
    /// Build the service map from the registry
    pub fn configuration(&self) -> ServerConfiguration {
        let registry = self.context.registry();
        let services = registry
            .namespaces()
            .map(|namespace| {
                let methods = registry
                    .methods(namespace)
                    .map(|descriptor| {
                        let method = descriptor.name();
                        (
                            method.to_string(),
                            ServiceEntry {
                                input_schema: registry.input_schema_url(namespace, method),
                                output_schema: registry.output_schema_url(namespace, method),
                                url: registry.namespace_url(namespace),
                            },
                        )
                    })
                    .collect();
                (namespace.to_string(), methods)
            })
            .collect();
        ServerConfiguration { services }
    }

    fn get_configuration(&mut self, _args: Args) -> MethodFuture<'_> {
        Box::pin(async move {
            to_result(&ConfigurationReport {
                server_configuration: self.configuration(),
                server_timestamp: chrono::Utc::now().timestamp(),
            })
        })
    }
}

impl HandlerType for SystemHandler {
    fn create(context: HandlerContext) -> Self {
        Self { context }
    }

    fn context(&self) -> &HandlerContext {
        &self.context
    }

    fn methods() -> Vec<Method<Self>> {
        vec![
            Method::new("getConfiguration", Self::get_configuration)
                .input_schema(get_configuration_input_schema())
                .output_schema(get_configuration_output_schema()),
        ]
    }
}

/// `getConfiguration` takes no params and must be called as a request
pub fn get_configuration_input_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "jsonrpc": {"const": "2.0"},
            "method": {"const": "getConfiguration"},
            "id": {"oneOf": [{"type": "integer"}, {"type": "string"}]}
        },
        "required": ["jsonrpc", "method", "id"]
    })
}

pub fn get_configuration_output_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "jsonrpc": {"const": "2.0"},
            "id": {"oneOf": [{"type": "integer"}, {"type": "string"}, {"type": "null"}]},
            "result": {
                "type": "object",
                "properties": {
                    "serverConfiguration": {"$ref": "#/definitions/serverConfiguration"},
                    "serverTimestamp": {"type": "integer"}
                },
                "additionalProperties": false,
                "required": ["serverConfiguration", "serverTimestamp"]
            }
        },
        "required": ["jsonrpc", "id", "result"],
        "definitions": {
            "serverConfiguration": {
                "type": "object",
                "properties": {"services": {"$ref": "#/definitions/services"}},
                "additionalProperties": false,
                "required": ["services"]
            },
            "services": {
                "type": "object",
                "patternProperties": {"^[A-Za-z][A-Za-z0-9]+$": {"$ref": "#/definitions/service"}},
                "additionalProperties": false
            },
            "service": {
                "type": "object",
                "patternProperties": {"^[A-Za-z][A-Za-z0-9_]*$": {"$ref": "#/definitions/method"}},
                "additionalProperties": false
            },
            "method": {
                "type": "object",
                "properties": {
                    "inputSchema": {"type": "string", "format": "uri"},
                    "outputSchema": {"type": "string", "format": "uri"},
                    "url": {"type": "string", "format": "uri"}
                },
                "additionalProperties": false,
                "required": ["url"]
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::MethodSignature;
    use crate::registry::SchemaRegistry;
    use crate::schema::{CompiledSchema, ParamSpec, ParamType};
    use nsrpc_json_rpc::{JsonRpcMessage, RequestId};
    use std::sync::Arc;

    fn registry() -> Arc<SchemaRegistry> {
        let mut registry = SchemaRegistry::new("https://rpc.example.com/");
        let system_signatures: Vec<MethodSignature> = SystemHandler::methods()
            .iter()
            .map(|method| method.signature().clone())
            .collect();
        registry.register("system", system_signatures).unwrap();
        registry
            .register(
                "math",
                vec![MethodSignature {
                    name: "subtract".into(),
                    params: vec![
                        ParamSpec::required("minuend", ParamType::Integer),
                        ParamSpec::required("subtrahend", ParamType::Integer),
                    ],
                    input_schema: None,
                    output_schema: None,
                }],
            )
            .unwrap();
        Arc::new(registry)
    }

    #[test]
    fn test_configuration_lists_every_method() {
        let handler = SystemHandler::create(HandlerContext::new("system", registry()));
        let configuration = handler.configuration();

        assert_eq!(configuration.services.len(), 2);
        assert_eq!(
            configuration.services["math"]["subtract"],
            ServiceEntry {
                input_schema: "https://rpc.example.com/schemas/math/subtract/input-schema.json".into(),
                output_schema: "https://rpc.example.com/schemas/math/subtract/output-schema.json".into(),
                url: "https://rpc.example.com/math/".into(),
            }
        );
        assert!(configuration.services["system"].contains_key("getConfiguration"));
    }

    #[tokio::test]
    async fn test_get_configuration_result_matches_output_schema() {
        let mut handler = SystemHandler::create(HandlerContext::new("system", registry()));
        let result = handler.get_configuration(Args::default()).await.unwrap();

        assert!(result["serverTimestamp"].as_i64().unwrap() > 0);
        assert_eq!(
            result["serverConfiguration"]["services"]["system"]["getConfiguration"]["url"],
            json!("https://rpc.example.com/system/")
        );

        let envelope = serde_json::to_value(JsonRpcMessage::success(RequestId::Number(1), result)).unwrap();
        let schema = CompiledSchema::compile(get_configuration_output_schema()).unwrap();
        assert!(schema.is_valid(&envelope), "{:?}", schema.first_error(&envelope));
    }

    #[test]
    fn test_input_schema_requires_id() {
        let schema = CompiledSchema::compile(get_configuration_input_schema()).unwrap();
        assert!(schema.is_valid(&json!({"jsonrpc": "2.0", "method": "getConfiguration", "id": 1})));
        assert!(!schema.is_valid(&json!({"jsonrpc": "2.0", "method": "getConfiguration"})));
        assert!(!schema.is_valid(&json!({"jsonrpc": "2.0", "method": "other", "id": 1})));
    }
}
