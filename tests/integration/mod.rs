mod basic_integration;
mod completion_flow;
mod mcp_session;
