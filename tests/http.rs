// Integration tests for the stateless JSON-RPC HTTP transport
//
// Drives the axum router in-process with tower's `oneshot`.

#![cfg(feature = "http_transport")]

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use crypto_binance_provider::binance::BinanceClient;
use crypto_binance_provider::config::CoordinationConfig;
use crypto_binance_provider::market::MarketData;
use crypto_binance_provider::state::Registries;
use crypto_binance_provider::tools::ToolContext;
use crypto_binance_provider::transport::http::handler::AppState;
use crypto_binance_provider::transport::http::router;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

fn app() -> axum::Router {
    // Nothing here reaches the network
    let client =
        BinanceClient::with_base_urls("http://127.0.0.1:9", "http://127.0.0.1:9", Duration::from_secs(1))
            .unwrap();
    let context = ToolContext::new(
        MarketData::new(client, &CoordinationConfig::default()),
        Registries::new(),
        16,
    );
    router(AppState::new(Arc::new(context)))
}

async fn post_mcp(body: String) -> (StatusCode, Option<Value>) {
    let response = app()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/mcp")
                .header("content-type", "application/json")
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = serde_json::from_slice(&bytes).ok();
    (status, value)
}

async fn rpc(method: &str, params: Value) -> (StatusCode, Value) {
    let (status, body) = post_mcp(
        json!({ "jsonrpc": "2.0", "id": 7, "method": method, "params": params }).to_string(),
    )
    .await;
    (status, body.expect("JSON-RPC response body"))
}

#[tokio::test]
async fn test_healthz() {
    let response = app()
        .oneshot(Request::builder().uri("/healthz").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], b"ok");
}

#[tokio::test]
async fn test_tools_catalogue_endpoint() {
    let response = app()
        .oneshot(Request::builder().uri("/tools").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["tools"].as_array().unwrap().len(), 19);
}

#[tokio::test]
async fn test_initialize_and_list() {
    let (status, body) = rpc("initialize", json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], 7);
    assert_eq!(body["result"]["protocolVersion"], "2024-11-05");

    let (status, body) = rpc("tools/list", json!({})).await;
    assert_eq!(status, StatusCode::OK);
    let tools = body["result"]["tools"].as_array().unwrap();
    assert!(tools.iter().any(|t| t["name"] == "schedule_task"));
    assert!(tools.iter().all(|t| t["inputSchema"].is_object()));
}

#[tokio::test]
async fn test_tools_call_local_tool() {
    let (status, body) = rpc("tools/call", json!({ "name": "get_risk_policy" })).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["result"]["isError"], false);
    assert_eq!(body["result"]["structuredContent"]["policy"]["maxLeverage"], 3.0);
    assert_eq!(body["result"]["content"][0]["type"], "text");
}

#[tokio::test]
async fn test_unknown_method() {
    let (status, body) = rpc("resources/list", json!({})).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], -32601);
    assert_eq!(body["id"], 7);
}

#[tokio::test]
async fn test_unknown_tool_is_invalid_params() {
    let (status, body) = rpc("tools/call", json!({ "name": "roll_dice" })).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], -32602);
}

#[tokio::test]
async fn test_malformed_json() {
    let (status, body) = post_mcp("{not json".to_string()).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body.unwrap()["error"]["code"], -32700);
}

#[tokio::test]
async fn test_notification_is_accepted() {
    let (status, body) = post_mcp(
        json!({ "jsonrpc": "2.0", "method": "notifications/initialized" }).to_string(),
    )
    .await;

    assert_eq!(status, StatusCode::ACCEPTED);
    assert!(body.is_none());
}
