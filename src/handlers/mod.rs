pub mod generate_commit_message;

use crate::protocol::{
    InitializeParams, JsonRpcError, JsonRpcRequest, JsonRpcResponse, ToolCallParams, ToolResult,
};
use crate::registry::ToolRegistry;

/// Dispatch a JSON-RPC request to the appropriate handler.
///
/// Returns `None` for notifications (no response required).
pub async fn dispatch(req: &JsonRpcRequest, registry: &ToolRegistry) -> Option<JsonRpcResponse> {
    match req.method.as_str() {
        "initialize" => {
            if let Some(params) = &req.params {
                if let Ok(init) = serde_json::from_value::<InitializeParams>(params.clone()) {
                    tracing::debug!(
                        "Initialize from {:?} (protocol {:?})",
                        init.client_info,
                        init.protocol_version
                    );
                }
            }
            let result = serde_json::json!({
                "protocolVersion": "2024-11-05",
                "capabilities": {
                    "tools": {
                        "count": registry.len()
                    }
                },
                "serverInfo": {
                    "name": "commit-buddy-server",
                    "version": env!("CARGO_PKG_VERSION")
                }
            });
            Some(JsonRpcResponse::success(req.id.clone(), result))
        }

        "notifications/initialized" => None,

        "ping" => Some(JsonRpcResponse::success(req.id.clone(), serde_json::json!({}))),

        "tools/list" => {
            let result = serde_json::json!({ "tools": registry.list() });
            Some(JsonRpcResponse::success(req.id.clone(), result))
        }

        "tools/call" => {
            let params: ToolCallParams = match &req.params {
                Some(v) => match serde_json::from_value(v.clone()) {
                    Ok(p) => p,
                    Err(e) => {
                        return Some(JsonRpcResponse::error(
                            req.id.clone(),
                            JsonRpcError::invalid_params(format!(
                                "Invalid tools/call params: {e}"
                            )),
                        ));
                    }
                },
                None => {
                    return Some(JsonRpcResponse::error(
                        req.id.clone(),
                        JsonRpcError::invalid_params("Missing params for tools/call"),
                    ));
                }
            };

            let tool_result = dispatch_tool_call(&params, registry).await;
            let result_json = serde_json::to_value(&tool_result)
                .expect("ToolResult must serialize to JSON Value");
            Some(JsonRpcResponse::success(req.id.clone(), result_json))
        }

        _ => Some(JsonRpcResponse::error(
            req.id.clone(),
            JsonRpcError::method_not_found(&req.method),
        )),
    }
}

/// Resolve a `tools/call` against the registry.
///
/// An unknown tool and a failing handler both come back as error
/// *results*; the session stays usable either way.
async fn dispatch_tool_call(params: &ToolCallParams, registry: &ToolRegistry) -> ToolResult {
    let Some(handler) = registry.get(&params.name) else {
        return ToolResult::error(format!("Unknown tool: {}", params.name));
    };

    match handler(params.arguments.as_ref()) {
        Ok(text) => ToolResult::text(text),
        Err(e) => {
            tracing::warn!(tool = %params.name, "Tool handler failed: {e}");
            ToolResult::error(format!("Error: {e}"))
        }
    }
}
