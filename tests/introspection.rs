//! Service discovery through the system namespace and schema documents

mod test_helpers;

use nsrpc_server::{SchemaKind, ServerBuilder};
use serde_json::json;
use test_helpers::{MathHandler, call};

fn discovery_pipeline() -> nsrpc_server::Pipeline {
    ServerBuilder::new()
        .server_url("https://rpc.example.com")
        .handler::<MathHandler>("math")
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_get_configuration_lists_services() {
    let pipeline = discovery_pipeline();
    let reply = call(&pipeline, r#"{"jsonrpc":"2.0","method":"getConfiguration","id":1}"#)
        .await
        .unwrap();

    let services = &reply["result"]["serverConfiguration"]["services"];
    assert_eq!(
        services["math"]["sum"],
        json!({
            "inputSchema": "https://rpc.example.com/schemas/math/sum/input-schema.json",
            "outputSchema": "https://rpc.example.com/schemas/math/sum/output-schema.json",
            "url": "https://rpc.example.com/math/"
        })
    );
    assert_eq!(
        services["system"]["getConfiguration"]["url"],
        json!("https://rpc.example.com/system/")
    );
    assert!(reply["result"]["serverTimestamp"].as_i64().unwrap() > 1_600_000_000);
}

#[tokio::test]
async fn test_get_configuration_as_notification_is_silent() {
    let pipeline = discovery_pipeline();

    // The explicit input schema requires an id
    let output = pipeline
        .handle(None, br#"{"jsonrpc":"2.0","method":"getConfiguration"}"#)
        .await;
    assert!(output.is_empty());
}

#[tokio::test]
async fn test_schema_documents() {
    let pipeline = discovery_pipeline();
    let provider = pipeline.schema_provider();

    let input = provider.resolve_path("/math/sum/input-schema.json");
    assert_eq!(
        input["definitions"]["paramsAsArray"]["items"],
        json!([{"type": "integer"}, {"type": "integer"}])
    );
    assert_eq!(
        input["definitions"]["paramsAsObject"]["required"],
        json!(["numberA", "numberB"])
    );

    let output = provider.schema("system", "getConfiguration", SchemaKind::Output);
    assert_eq!(output["required"], json!(["jsonrpc", "id", "result"]));

    assert_eq!(provider.resolve_path("/math/sum/unknown-schema.json"), json!({}));
    assert_eq!(provider.resolve_path("/math/nothing/input-schema.json"), json!({}));
}

#[tokio::test]
async fn test_optional_params_are_not_required_in_schema() {
    let pipeline = discovery_pipeline();
    let input = pipeline
        .schema_provider()
        .schema("math", "repeat", SchemaKind::Input);
    assert_eq!(input["definitions"]["paramsAsObject"]["required"], json!(["text"]));
}
