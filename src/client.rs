//! MCP client session: spawn the server, drive the protocol, extract the
//! commit message.
//!
//! The session is strictly linear and single-shot: one spawned server,
//! one pass through initialize → tools/list → tools/call, one result. At
//! most one request is outstanding at a time, so response correlation by
//! id is a safety check rather than a pipelining mechanism. Every fault is
//! caught at the session boundary; the top-level entry point always
//! returns a usable string.

use std::time::Duration;

use serde::Deserialize;

use crate::classifier::{self, FALLBACK_SUMMARY_CHARS};
use crate::fallback;
use crate::protocol::{codec, JsonRpcRequest, JsonRpcResponse, ProtocolError, RpcId};
use crate::registry::COMMIT_TOOL_NAME;
use crate::transport::{StdioTransport, TransportError};

/// Protocol version offered during `initialize`.
const PROTOCOL_VERSION: &str = "2024-11-05";

/// How one commit-message session is run.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Server executable, resolved via PATH if not absolute.
    pub server_command: String,
    pub server_args: Vec<String>,
    /// Extra environment for the server process.
    pub server_env: Vec<(String, String)>,
    /// Per-request response timeout.
    pub timeout: Duration,
    /// Classify locally when the RPC exchange fails.
    pub fallback: bool,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            server_command: "commit-buddy-server".into(),
            server_args: Vec::new(),
            server_env: Vec::new(),
            timeout: Duration::from_secs(10),
            fallback: true,
        }
    }
}

/// Client-side session faults. These travel as `Err` through the session;
/// business-level outcomes (unknown tool, handler failure) arrive as
/// ordinary error results inside a response and never take this path.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error(transparent)]
    Spawn(#[from] TransportError),
    #[error("Timed out after {0}s waiting for a response")]
    Timeout(u64),
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
    #[error("Server error {code}: {message}")]
    Rpc { code: i32, message: String },
    #[error("Server closed the stream")]
    ServerClosed,
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Client-side session states. The machine is linear: no state is
/// re-entered once left.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Unconnected,
    Initializing,
    Initialized,
    ListingTools,
    ToolsListed,
    CallingTool,
    Completed,
    Failed,
}

/// One client session over one spawned server.
pub struct McpSession {
    transport: StdioTransport,
    timeout: Duration,
    next_id: i64,
    state: SessionState,
}

impl McpSession {
    pub fn new(transport: StdioTransport, timeout: Duration) -> Self {
        Self {
            transport,
            timeout,
            next_id: 1,
            state: SessionState::Unconnected,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    fn advance(&mut self, next: SessionState) {
        tracing::debug!("Session state: {:?} -> {next:?}", self.state);
        self.state = next;
    }

    /// Run the three-step protocol and extract the commit message.
    pub async fn drive(&mut self, diff: &str) -> Result<String, ClientError> {
        self.advance(SessionState::Initializing);
        self.request(
            "initialize",
            serde_json::json!({
                "protocolVersion": PROTOCOL_VERSION,
                "capabilities": {},
                "clientInfo": {
                    "name": "commit-buddy",
                    "version": env!("CARGO_PKG_VERSION")
                }
            }),
        )
        .await?;
        self.advance(SessionState::Initialized);

        // Informational only; the subsequent call does not depend on the
        // listing, but a server that cannot answer it is treated as down.
        self.advance(SessionState::ListingTools);
        let tools = self.request("tools/list", serde_json::json!({})).await?;
        tracing::debug!("Server advertises tools: {tools}");
        self.advance(SessionState::ToolsListed);

        self.advance(SessionState::CallingTool);
        let result = self
            .request(
                "tools/call",
                serde_json::json!({
                    "name": COMMIT_TOOL_NAME,
                    "arguments": {"diff": diff}
                }),
            )
            .await?;
        let message = extract_message(diff, &result);
        self.advance(SessionState::Completed);

        Ok(message)
    }

    pub fn fail(&mut self) {
        self.advance(SessionState::Failed);
    }

    pub async fn close(&mut self) {
        self.transport.close().await;
    }

    /// Send one request and await its response under the session timeout.
    ///
    /// A timeout aborts only this wait; the request is never retried.
    async fn request(
        &mut self,
        method: &str,
        params: serde_json::Value,
    ) -> Result<serde_json::Value, ClientError> {
        let id = self.next_id;
        self.next_id += 1;

        let request = JsonRpcRequest::new(id, method, params);
        let line = codec::encode(&request)?;
        self.transport.send_line(&line).await?;

        let response = tokio::time::timeout(self.timeout, self.await_response(id))
            .await
            .map_err(|_| ClientError::Timeout(self.timeout.as_secs()))??;

        if let Some(err) = response.error {
            return Err(ClientError::Rpc {
                code: err.code,
                message: err.message,
            });
        }
        Ok(response.result.unwrap_or(serde_json::Value::Null))
    }

    /// Read frames until the response correlated with `id` arrives.
    async fn await_response(&mut self, id: i64) -> Result<JsonRpcResponse, ClientError> {
        loop {
            let line = self
                .transport
                .recv_line()
                .await?
                .ok_or(ClientError::ServerClosed)?;
            let response = codec::decode_response(&line)?;
            if response.id == Some(RpcId::Number(id)) {
                return Ok(response);
            }
            tracing::debug!("Skipping frame with unexpected id {:?}", response.id);
        }
    }
}

/// Generate a commit message for `diff`, falling back to local
/// classification on any session fault. Never fails.
pub async fn generate_commit_message(diff: &str, options: &SessionOptions) -> String {
    match run_session(diff, options).await {
        Ok(message) => message,
        Err(err) => {
            tracing::warn!("MCP session failed: {err}");
            fallback::resolve(diff, &err, options.fallback)
        }
    }
}

async fn run_session(diff: &str, options: &SessionOptions) -> Result<String, ClientError> {
    let transport = StdioTransport::spawn(
        &options.server_command,
        &options.server_args,
        &options.server_env,
    )?;
    let mut session = McpSession::new(transport, options.timeout);

    let result = session.drive(diff).await;
    if result.is_err() {
        session.fail();
    }
    // The transport is scoped to this session: released on every exit path.
    session.close().await;
    result
}

// ---------------------------------------------------------------------------
// Result payload extraction
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct TextBlock {
    text: String,
}

/// The result payload shapes the protocol defines. Anything else falls
/// into the unrecognized branch of [`extract_message`].
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ToolPayload {
    /// MCP standard: `{"content":[{"type":"text","text":...}]}`.
    Wrapped { content: Vec<TextBlock> },
    /// Bare block sequence: `[{"text":...}]`.
    Blocks(Vec<TextBlock>),
    /// Flat mapping: `{"text":...}`.
    Flat { text: String },
}

/// Extract the message text from a `tools/call` result.
///
/// Extraction is lenient by design: an unrecognized shape yields a generic
/// derived message rather than a fault.
fn extract_message(diff: &str, result: &serde_json::Value) -> String {
    let text = match serde_json::from_value::<ToolPayload>(result.clone()) {
        Ok(ToolPayload::Wrapped { content }) => content.into_iter().next().map(|b| b.text),
        Ok(ToolPayload::Blocks(blocks)) => blocks.into_iter().next().map(|b| b.text),
        Ok(ToolPayload::Flat { text }) => Some(text),
        Err(_) => None,
    };
    text.unwrap_or_else(|| {
        format!(
            "feat: {}",
            classifier::truncate_chars(diff, FALLBACK_SUMMARY_CHARS)
        )
    })
}
