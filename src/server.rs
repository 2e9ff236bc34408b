use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};

use crate::config::ServerConfig;
use crate::handlers;
use crate::protocol::{codec, JsonRpcError, JsonRpcResponse, ProtocolError};
use crate::registry::ToolRegistry;

/// MCP server that communicates over stdio using newline-delimited JSON-RPC 2.0.
pub struct McpServer {
    config: ServerConfig,
    registry: ToolRegistry,
    initialized: bool,
}

impl McpServer {
    pub fn new(config: ServerConfig) -> Self {
        Self {
            config,
            registry: ToolRegistry::builtin(),
            initialized: false,
        }
    }

    /// Run over the process's stdin/stdout.
    pub async fn run(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        let stdin = tokio::io::stdin();
        let stdout = tokio::io::stdout();
        self.run_loop(BufReader::new(stdin), stdout).await
    }

    /// Receive loop over an arbitrary duplex pair.
    ///
    /// Loops until the inbound side reaches end-of-stream or an
    /// unrecoverable I/O fault occurs. A single bad frame is answered with
    /// a JSON-RPC error response and never terminates the loop.
    pub async fn run_loop<R, W>(
        &mut self,
        mut reader: R,
        mut writer: W,
    ) -> Result<(), Box<dyn std::error::Error>>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut raw = Vec::new();

        loop {
            raw.clear();
            let n = reader.read_until(b'\n', &mut raw).await?;
            if n == 0 {
                break;
            }

            if n > self.config.max_message_bytes {
                tracing::warn!(
                    "Message too large: {n} bytes (limit {})",
                    self.config.max_message_bytes
                );
                write_response(
                    &mut writer,
                    &JsonRpcResponse::error(None, JsonRpcError::parse_error()),
                )
                .await?;
                continue;
            }

            let trimmed = match std::str::from_utf8(&raw) {
                Ok(s) => s.trim(),
                Err(_) => {
                    write_response(
                        &mut writer,
                        &JsonRpcResponse::error(None, JsonRpcError::parse_error()),
                    )
                    .await?;
                    continue;
                }
            };

            if trimmed.is_empty() {
                continue;
            }

            let req = match codec::decode_request(trimmed) {
                Ok(r) => r,
                Err(ProtocolError::BadVersion(v)) => {
                    tracing::warn!("Unsupported jsonrpc version: {v:?}");
                    write_response(
                        &mut writer,
                        &JsonRpcResponse::error(None, JsonRpcError::invalid_request()),
                    )
                    .await?;
                    continue;
                }
                Err(e) => {
                    tracing::warn!("Parse error: {e}");
                    write_response(
                        &mut writer,
                        &JsonRpcResponse::error(None, JsonRpcError::parse_error()),
                    )
                    .await?;
                    continue;
                }
            };

            // Initialization gate: only `initialize` is allowed before handshake completes
            if !self.initialized && req.method != "initialize" {
                if req.id.is_none() {
                    continue;
                }
                write_response(
                    &mut writer,
                    &JsonRpcResponse::error(
                        req.id.clone(),
                        JsonRpcError::invalid_request_with("Server not initialized"),
                    ),
                )
                .await?;
                continue;
            }

            if let Some(resp) = handlers::dispatch(&req, &self.registry).await {
                write_response(&mut writer, &resp).await?;
            }

            if req.method == "initialize" {
                self.initialized = true;
            }
        }

        Ok(())
    }
}

async fn write_response<W>(
    writer: &mut W,
    resp: &JsonRpcResponse,
) -> Result<(), Box<dyn std::error::Error>>
where
    W: AsyncWrite + Unpin,
{
    let line = codec::encode(resp)?;
    writer.write_all(line.as_bytes()).await?;
    writer.flush().await?;
    Ok(())
}
