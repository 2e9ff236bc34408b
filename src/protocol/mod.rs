pub mod codec;
pub mod request;
pub mod response;

pub use codec::ProtocolError;
pub use request::{ClientInfo, InitializeParams, JsonRpcRequest, RpcId, ToolCallParams};
pub use response::{JsonRpcError, JsonRpcResponse, ToolResult, ToolResultContent};
