//! Newline-delimited framing for JSON-RPC 2.0 envelopes.
//!
//! One envelope per line, UTF-8, newline-terminated. `serde_json` escapes
//! control characters inside strings, so an encoded envelope can never
//! contain a raw newline; the line boundary is therefore a reliable frame
//! boundary. Reassembly of partial reads is the buffered reader's job
//! (`read_until(b'\n')`); this module only encodes and decodes whole
//! lines.

use serde::Serialize;

use super::request::JsonRpcRequest;
use super::response::JsonRpcResponse;

/// A frame that could not be encoded or decoded as a JSON-RPC 2.0 envelope.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("Malformed JSON: {0}")]
    MalformedJson(#[from] serde_json::Error),
    #[error("Unsupported jsonrpc version: {0:?}")]
    BadVersion(String),
    #[error("Response missing id")]
    MissingId,
    #[error("Response must carry exactly one of result/error")]
    AmbiguousOutcome,
}

/// Encode an envelope as a single newline-terminated line.
pub fn encode<T: Serialize>(envelope: &T) -> Result<String, ProtocolError> {
    let mut line = serde_json::to_string(envelope)?;
    line.push('\n');
    Ok(line)
}

/// Decode one line as a request envelope.
pub fn decode_request(line: &str) -> Result<JsonRpcRequest, ProtocolError> {
    let req: JsonRpcRequest = serde_json::from_str(line.trim())?;
    if req.jsonrpc != "2.0" {
        return Err(ProtocolError::BadVersion(req.jsonrpc));
    }
    Ok(req)
}

/// Decode one line as a response envelope.
///
/// Enforces the JSON-RPC 2.0 response shape: version `"2.0"`, an `id`,
/// and exactly one of `result`/`error`.
pub fn decode_response(line: &str) -> Result<JsonRpcResponse, ProtocolError> {
    let resp: JsonRpcResponse = serde_json::from_str(line.trim())?;
    if resp.jsonrpc != "2.0" {
        return Err(ProtocolError::BadVersion(resp.jsonrpc));
    }
    if resp.id.is_none() {
        return Err(ProtocolError::MissingId);
    }
    if resp.result.is_some() == resp.error.is_some() {
        return Err(ProtocolError::AmbiguousOutcome);
    }
    Ok(resp)
}
