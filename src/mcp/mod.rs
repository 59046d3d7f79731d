/// MCP protocol implementation
///
/// JSON-RPC message types and the stdio server that routes tool calls.

pub mod protocol;
pub mod server;

pub use server::McpServer;
