//! n8n MCP Server
//!
//! Exposes the n8n workflow automation REST API to AI assistants as a fixed
//! set of Model Context Protocol tools. Implements MCP JSON-RPC over stdio.

pub mod client;
pub mod config;
pub mod dispatch;
pub mod doctor;
pub mod invocation;
pub mod protocol;
pub mod registry;
pub mod server;
pub mod validation;

pub use client::{HttpN8nClient, N8nApi, RemoteError};
pub use config::N8nConfig;
pub use dispatch::{DispatchError, Dispatcher, ResponseEnvelope};
pub use registry::{list_tools, ToolDescriptor, ToolName};
pub use server::McpServer;
