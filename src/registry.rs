//! Tool registry: name → handler + input schema.
//!
//! The registry is static for the lifetime of a server; tools are
//! registered at construction and immutable afterwards. Only one tool is
//! built in today; generalizing this table is an extension point, not a
//! requirement.

use serde::Serialize;

use crate::handlers::generate_commit_message;

/// Name of the built-in commit message tool.
pub const COMMIT_TOOL_NAME: &str = "generate_commit_message";

/// A registered tool as advertised by `tools/list`.
#[derive(Debug, Clone, Serialize)]
pub struct Tool {
    pub name: String,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: serde_json::Value,
}

/// A tool handler: arguments in, result text out.
///
/// Handlers report failures as `Err(String)`; the dispatch boundary turns
/// that into an error result carrying the request id, never a transport
/// fault.
pub type ToolHandler = fn(Option<&serde_json::Value>) -> Result<String, String>;

pub struct ToolRegistry {
    entries: Vec<(Tool, ToolHandler)>,
}

impl ToolRegistry {
    /// Registry with the built-in `generate_commit_message` tool.
    pub fn builtin() -> Self {
        Self {
            entries: vec![(
                Tool {
                    name: COMMIT_TOOL_NAME.into(),
                    description: "Generate a Git commit message from diff".into(),
                    input_schema: serde_json::json!({
                        "type": "object",
                        "properties": {
                            "diff": {"type": "string"}
                        },
                        "required": ["diff"]
                    }),
                },
                generate_commit_message::handle,
            )],
        }
    }

    pub fn list(&self) -> Vec<&Tool> {
        self.entries.iter().map(|(tool, _)| tool).collect()
    }

    pub fn get(&self, name: &str) -> Option<ToolHandler> {
        self.entries
            .iter()
            .find(|(tool, _)| tool.name == name)
            .map(|(_, handler)| *handler)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
