//! Server-side tests: dispatch table behavior and the full receive loop
//! over an in-memory duplex stream.

use commit_buddy::config::ServerConfig;
use commit_buddy::handlers;
use commit_buddy::protocol::{JsonRpcRequest, RpcId};
use commit_buddy::registry::ToolRegistry;
use commit_buddy::server::McpServer;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

fn request(id: i64, method: &str, params: serde_json::Value) -> JsonRpcRequest {
    JsonRpcRequest {
        jsonrpc: "2.0".into(),
        id: Some(RpcId::Number(id)),
        method: method.into(),
        params: Some(params),
    }
}

// ---------------------------------------------------------------------------
// Dispatch tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn initialize_reports_capabilities() {
    let registry = ToolRegistry::builtin();
    let req = request(1, "initialize", serde_json::json!({}));

    let response = handlers::dispatch(&req, &registry).await.unwrap();
    let result = response.result.unwrap();

    assert_eq!(result["serverInfo"]["name"], "commit-buddy-server");
    assert!(result["serverInfo"]["version"].is_string());
    assert_eq!(result["capabilities"]["tools"]["count"], 1);
    assert_eq!(response.id, Some(RpcId::Number(1)));
}

#[tokio::test]
async fn tools_list_advertises_the_commit_tool() {
    let registry = ToolRegistry::builtin();
    let req = request(2, "tools/list", serde_json::json!({}));

    let response = handlers::dispatch(&req, &registry).await.unwrap();
    let tools = response.result.unwrap()["tools"].as_array().unwrap().clone();

    assert_eq!(tools.len(), 1);
    assert_eq!(tools[0]["name"], "generate_commit_message");
    assert_eq!(tools[0]["inputSchema"]["required"], serde_json::json!(["diff"]));
}

#[tokio::test]
async fn tools_call_generates_a_message() {
    let registry = ToolRegistry::builtin();
    let req = request(
        3,
        "tools/call",
        serde_json::json!({
            "name": "generate_commit_message",
            "arguments": {"diff": "Implement new login flow"}
        }),
    );

    let response = handlers::dispatch(&req, &registry).await.unwrap();
    let result = response.result.unwrap();

    assert_eq!(
        result["content"][0]["text"],
        "feat: Implement new login flow"
    );
    assert!(result.get("isError").is_none());
}

#[tokio::test]
async fn tools_call_unknown_tool_is_an_error_result() {
    let registry = ToolRegistry::builtin();
    let req = request(
        4,
        "tools/call",
        serde_json::json!({"name": "no_such_tool", "arguments": {}}),
    );

    let response = handlers::dispatch(&req, &registry).await.unwrap();

    // Unknown tool is a modeled error value, not a protocol fault.
    assert!(response.error.is_none());
    let result = response.result.unwrap();
    assert_eq!(result["isError"], true);
    assert_eq!(result["content"][0]["text"], "Unknown tool: no_such_tool");
}

#[tokio::test]
async fn tools_call_missing_diff_defaults_to_empty() {
    let registry = ToolRegistry::builtin();
    let req = request(
        5,
        "tools/call",
        serde_json::json!({"name": "generate_commit_message", "arguments": {}}),
    );

    let response = handlers::dispatch(&req, &registry).await.unwrap();
    let result = response.result.unwrap();
    assert_eq!(result["content"][0]["text"], "chore: ");
}

#[tokio::test]
async fn tools_call_without_params_is_invalid_params() {
    let registry = ToolRegistry::builtin();
    let req = JsonRpcRequest {
        jsonrpc: "2.0".into(),
        id: Some(RpcId::Number(6)),
        method: "tools/call".into(),
        params: None,
    };

    let response = handlers::dispatch(&req, &registry).await.unwrap();
    assert_eq!(response.error.unwrap().code, -32602);
}

#[tokio::test]
async fn unknown_method_is_method_not_found() {
    let registry = ToolRegistry::builtin();
    let req = request(7, "tools/destroy", serde_json::json!({}));

    let response = handlers::dispatch(&req, &registry).await.unwrap();
    let error = response.error.unwrap();
    assert_eq!(error.code, -32601);
    assert!(error.message.contains("tools/destroy"));
}

#[tokio::test]
async fn initialized_notification_has_no_response() {
    let registry = ToolRegistry::builtin();
    let req = JsonRpcRequest {
        jsonrpc: "2.0".into(),
        id: None,
        method: "notifications/initialized".into(),
        params: None,
    };

    assert!(handlers::dispatch(&req, &registry).await.is_none());
}

// ---------------------------------------------------------------------------
// Receive loop tests
// ---------------------------------------------------------------------------

/// Drive a server loop over an in-memory duplex: write `frames` to its
/// inbound side, close it, collect every outbound response line.
async fn run_exchange(config: ServerConfig, frames: Vec<String>) -> Vec<serde_json::Value> {
    let (client_io, server_io) = tokio::io::duplex(64 * 1024);
    let (server_read, server_write) = tokio::io::split(server_io);

    let server = tokio::spawn(async move {
        let mut server = McpServer::new(config);
        server
            .run_loop(BufReader::new(server_read), server_write)
            .await
            .expect("server loop should end cleanly at end-of-stream");
    });

    let (client_read, mut client_write) = tokio::io::split(client_io);
    for frame in frames {
        client_write.write_all(frame.as_bytes()).await.unwrap();
    }
    client_write.shutdown().await.unwrap();

    let mut responses = Vec::new();
    let mut lines = BufReader::new(client_read).lines();
    while let Some(line) = lines.next_line().await.unwrap() {
        responses.push(serde_json::from_str(&line).unwrap());
    }

    server.await.unwrap();
    responses
}

fn frame(value: serde_json::Value) -> String {
    format!("{value}\n")
}

#[tokio::test]
async fn loop_survives_unknown_tool_and_answers_the_next_request() {
    let responses = run_exchange(
        ServerConfig::default(),
        vec![
            frame(serde_json::json!({"jsonrpc":"2.0","id":1,"method":"initialize","params":{}})),
            frame(serde_json::json!({"jsonrpc":"2.0","id":2,"method":"tools/call",
                "params":{"name":"bogus_tool","arguments":{}}})),
            frame(serde_json::json!({"jsonrpc":"2.0","id":3,"method":"tools/call",
                "params":{"name":"generate_commit_message","arguments":{"diff":"Fix crash on null pointer"}}})),
        ],
    )
    .await;

    assert_eq!(responses.len(), 3);
    assert_eq!(responses[1]["id"], 2);
    assert_eq!(responses[1]["result"]["isError"], true);
    assert_eq!(
        responses[1]["result"]["content"][0]["text"],
        "Unknown tool: bogus_tool"
    );
    // The session stays usable after the unknown tool.
    assert_eq!(responses[2]["id"], 3);
    assert_eq!(
        responses[2]["result"]["content"][0]["text"],
        "fix: Fix crash on null pointer"
    );
}

#[tokio::test]
async fn loop_answers_parse_errors_and_continues() {
    let responses = run_exchange(
        ServerConfig::default(),
        vec![
            "this is not json\n".to_string(),
            frame(serde_json::json!({"jsonrpc":"2.0","id":1,"method":"initialize","params":{}})),
        ],
    )
    .await;

    assert_eq!(responses.len(), 2);
    assert_eq!(responses[0]["error"]["code"], -32700);
    assert!(responses[1]["result"]["serverInfo"].is_object());
}

#[tokio::test]
async fn requests_before_initialize_are_rejected() {
    let responses = run_exchange(
        ServerConfig::default(),
        vec![
            frame(serde_json::json!({"jsonrpc":"2.0","id":1,"method":"tools/list","params":{}})),
            frame(serde_json::json!({"jsonrpc":"2.0","id":2,"method":"initialize","params":{}})),
            frame(serde_json::json!({"jsonrpc":"2.0","id":3,"method":"tools/list","params":{}})),
        ],
    )
    .await;

    assert_eq!(responses.len(), 3);
    assert_eq!(responses[0]["error"]["code"], -32600);
    assert!(responses[1]["result"].is_object());
    assert!(responses[2]["result"]["tools"].is_array());
}

#[tokio::test]
async fn wrong_jsonrpc_version_is_invalid_request() {
    let responses = run_exchange(
        ServerConfig::default(),
        vec![frame(
            serde_json::json!({"jsonrpc":"1.0","id":1,"method":"initialize","params":{}}),
        )],
    )
    .await;

    assert_eq!(responses.len(), 1);
    assert_eq!(responses[0]["error"]["code"], -32600);
}

#[tokio::test]
async fn oversized_frame_is_rejected_but_not_fatal() {
    let config = ServerConfig {
        max_message_bytes: 128,
    };
    let big_diff = "x".repeat(4096);
    let responses = run_exchange(
        config,
        vec![
            frame(serde_json::json!({"jsonrpc":"2.0","id":1,"method":"initialize",
                "params":{"padding": big_diff}})),
            frame(serde_json::json!({"jsonrpc":"2.0","id":2,"method":"initialize","params":{}})),
        ],
    )
    .await;

    assert_eq!(responses.len(), 2);
    assert_eq!(responses[0]["error"]["code"], -32700);
    assert!(responses[1]["result"].is_object());
}

#[tokio::test]
async fn empty_input_terminates_cleanly() {
    let responses = run_exchange(ServerConfig::default(), vec![]).await;
    assert!(responses.is_empty());
}
