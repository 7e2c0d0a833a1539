use async_trait::async_trait;
use barrister::idl::parse;
use barrister::rpc::{Client, Dispatcher, Handler, HttpTransport, RpcError};
use barrister::{LoggingSystem, RpcHttpServer};
use serde_json::{json, Value};
use std::net::TcpListener;
use std::sync::Arc;
use std::time::Duration;

const ECHO_IDL: &str = "interface Echo {\n    say(text string) string\n}\n";

struct EchoHandler;

#[async_trait]
impl Handler for EchoHandler {
    async fn call(&self, _method: &str, params: Vec<Value>) -> Result<Value, RpcError> {
        Ok(params.into_iter().next().unwrap_or(Value::Null))
    }
}

/// Starts a server on a free port and returns its address.
async fn start_server() -> (String, tokio::task::JoinHandle<()>) {
    LoggingSystem::init_for_tests();
    let mut dispatcher = Dispatcher::new(parse(ECHO_IDL).unwrap()).unwrap();
    dispatcher.register("Echo", EchoHandler).unwrap();

    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let bind_addr = format!("127.0.0.1:{}", addr.port());

    let server = RpcHttpServer::new(Arc::new(dispatcher), &bind_addr);
    let handle = tokio::spawn(async move { server.run().await.unwrap() });

    tokio::time::sleep(Duration::from_secs(1)).await;
    (bind_addr, handle)
}

#[tokio::test]
async fn rpc_post_returns_json_response() {
    let (addr, handle) = start_server().await;

    let response = reqwest::Client::new()
        .post(format!("http://{}/rpc", addr))
        .timeout(Duration::from_secs(5))
        .body(json!({"jsonrpc": "2.0", "method": "Echo.say", "params": ["hi"], "id": 1}).to_string())
        .send()
        .await
        .expect("request failed");
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    let body: Value = response.json().await.expect("invalid JSON");
    assert_eq!(body, json!({"jsonrpc": "2.0", "result": "hi", "id": 1}));

    handle.abort();
    let _ = handle.await;
}

#[tokio::test]
async fn notification_gets_no_content() {
    let (addr, handle) = start_server().await;

    let response = reqwest::Client::new()
        .post(format!("http://{}/", addr))
        .timeout(Duration::from_secs(5))
        .body(json!({"jsonrpc": "2.0", "method": "Echo.say", "params": ["hi"]}).to_string())
        .send()
        .await
        .expect("request failed");
    assert_eq!(response.status(), reqwest::StatusCode::NO_CONTENT);

    handle.abort();
    let _ = handle.await;
}

#[tokio::test]
async fn idl_endpoint_serves_json() {
    let (addr, handle) = start_server().await;

    let idl: Value = reqwest::Client::new()
        .get(format!("http://{}/idl", addr))
        .timeout(Duration::from_secs(5))
        .send()
        .await
        .expect("request failed")
        .error_for_status()
        .expect("server returned error status")
        .json()
        .await
        .expect("invalid JSON");
    assert_eq!(idl["interfaces"][0]["name"], "Echo");

    handle.abort();
    let _ = handle.await;
}

#[tokio::test]
async fn http_client_talks_to_server() {
    let (addr, handle) = start_server().await;

    let transport = HttpTransport::with_timeout(&format!("http://{}/rpc", addr), Duration::from_secs(5)).unwrap();
    let client = Client::with_idl(transport, &parse(ECHO_IDL).unwrap()).unwrap();

    let result = client.call("Echo.say", vec![json!("hello")]).await.unwrap();
    assert_eq!(result, json!("hello"));

    client.notify("Echo.say", vec![json!("quiet")]).await.unwrap();

    let results = client
        .batch(vec![
            ("Echo.say".to_string(), vec![json!("a")]),
            ("Echo.say".to_string(), vec![json!("b")]),
        ])
        .await
        .unwrap();
    let values: Vec<Value> = results.into_iter().map(Result::unwrap).collect();
    assert_eq!(values, vec![json!("a"), json!("b")]);

    let idl = client.fetch_idl().await.unwrap();
    assert_eq!(idl.interfaces[0].name, "Echo");

    handle.abort();
    let _ = handle.await;
}

#[tokio::test]
async fn malformed_body_is_parse_error() {
    let (addr, handle) = start_server().await;

    let body: Value = reqwest::Client::new()
        .post(format!("http://{}/rpc", addr))
        .timeout(Duration::from_secs(5))
        .body("{not json")
        .send()
        .await
        .expect("request failed")
        .json()
        .await
        .expect("invalid JSON");
    assert_eq!(body["error"]["code"], json!(-32700));

    handle.abort();
    let _ = handle.await;
}
