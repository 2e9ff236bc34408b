//! Child-process stdio transport.
//!
//! Owns the spawned server process and its stdin/stdout pipes, exposing
//! them as two independent unidirectional line channels. The transport is
//! scoped to one client session: opened immediately before the protocol
//! runs, released on every exit path afterwards.

use std::process::Stdio;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};

/// How long to wait for the server to exit after its stdin closes before
/// killing it.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("Failed to spawn server process: {0}")]
    Spawn(#[source] std::io::Error),
    #[error("Server stdio pipes unavailable")]
    MissingPipes,
}

/// Full-duplex byte channel over a spawned server process.
pub struct StdioTransport {
    child: Child,
    stdin: Option<ChildStdin>,
    reader: BufReader<ChildStdout>,
    closed: bool,
}

impl StdioTransport {
    /// Spawn the server process with piped stdin/stdout.
    ///
    /// stderr is inherited so server diagnostics reach the terminal without
    /// ever sharing the protocol stream. The child always receives
    /// `PYTHONUNBUFFERED=1`: the server executable is configurable, and an
    /// interpreter-hosted server must not buffer its frames.
    pub fn spawn(
        command: &str,
        args: &[String],
        envs: &[(String, String)],
    ) -> Result<Self, TransportError> {
        let mut cmd = Command::new(command);
        cmd.args(args)
            .env("PYTHONUNBUFFERED", "1")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);
        for (key, value) in envs {
            cmd.env(key, value);
        }

        let mut child = cmd.spawn().map_err(TransportError::Spawn)?;
        let stdin = child.stdin.take().ok_or(TransportError::MissingPipes)?;
        let stdout = child.stdout.take().ok_or(TransportError::MissingPipes)?;

        Ok(Self {
            child,
            stdin: Some(stdin),
            reader: BufReader::new(stdout),
            closed: false,
        })
    }

    /// Write one newline-terminated frame to the server.
    pub async fn send_line(&mut self, line: &str) -> std::io::Result<()> {
        let stdin = self.stdin.as_mut().ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::BrokenPipe, "transport already closed")
        })?;
        stdin.write_all(line.as_bytes()).await?;
        stdin.flush().await
    }

    /// Read one line from the server. `None` means end-of-stream.
    ///
    /// Partial reads are reassembled by the buffered reader; a frame split
    /// across read bursts comes back whole.
    pub async fn recv_line(&mut self) -> std::io::Result<Option<String>> {
        let mut raw = Vec::new();
        let n = self.reader.read_until(b'\n', &mut raw).await?;
        if n == 0 {
            return Ok(None);
        }
        String::from_utf8(raw).map(Some).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e)
        })
    }

    /// Release the child process: close its stdin, wait out the grace
    /// period, kill if still running. Safe to call more than once.
    pub async fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;

        // Dropping stdin delivers EOF; a well-behaved server exits its loop.
        drop(self.stdin.take());

        match tokio::time::timeout(SHUTDOWN_GRACE, self.child.wait()).await {
            Ok(Ok(status)) => {
                tracing::debug!("Server exited with {status}");
            }
            Ok(Err(e)) => {
                tracing::warn!("Failed to await server exit: {e}");
            }
            Err(_) => {
                tracing::warn!(
                    "Server still running after {}s grace, killing",
                    SHUTDOWN_GRACE.as_secs()
                );
                if let Err(e) = self.child.kill().await {
                    tracing::warn!("Failed to kill server: {e}");
                }
            }
        }
    }
}
