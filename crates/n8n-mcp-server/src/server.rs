//! MCP server loop.
//!
//! Newline-delimited JSON-RPC over any async reader/writer pair; stdio in
//! production, an in-memory duplex in tests.

use log::{debug, error, info, warn};
use serde_json::{json, Value};
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};

use crate::client::N8nApi;
use crate::dispatch::Dispatcher;
use crate::protocol::{
    CallToolParams, CallToolResult, JsonRpcRequest, JsonRpcResponse, INVALID_PARAMS,
    METHOD_NOT_FOUND, PARSE_ERROR,
};
use crate::registry;

/// MCP Protocol version
pub const PROTOCOL_VERSION: &str = "2024-11-05";

/// Server name
pub const SERVER_NAME: &str = "n8n-automation-server";

/// Server version
pub const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Error, Debug)]
pub enum McpError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// n8n MCP Server
pub struct McpServer<C> {
    dispatcher: Dispatcher<C>,
}

impl<C: N8nApi> McpServer<C> {
    pub fn new(client: C) -> Self {
        Self {
            dispatcher: Dispatcher::new(client),
        }
    }

    pub fn dispatcher(&self) -> &Dispatcher<C> {
        &self.dispatcher
    }

    /// Handle initialize request
    fn handle_initialize(&self, _params: Value) -> Value {
        json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": {
                "tools": {}
            },
            "serverInfo": {
                "name": SERVER_NAME,
                "version": SERVER_VERSION
            },
            "instructions": "n8n workflow automation. Recommended workflow:\n\
                1) list_workflows to find workflow ids\n\
                2) get_workflow to inspect nodes and connections\n\
                3) create_workflow / update_workflow to change definitions\n\
                4) activate_workflow, execute_workflow, get_executions to run and monitor\n\
                delete_workflow removes a workflow permanently."
        })
    }

    /// Handle tools/list request
    fn handle_tools_list(&self) -> Value {
        json!({
            "tools": registry::list_tools()
        })
    }

    /// Handle tools/call request
    async fn handle_tools_call(&self, params: Value) -> Result<Value, String> {
        let params: CallToolParams =
            serde_json::from_value(params).map_err(|e| format!("Invalid tools/call params: {}", e))?;

        let envelope = self.dispatcher.dispatch(&params.name, params.arguments).await;
        serde_json::to_value(CallToolResult::from(&envelope)).map_err(|e| e.to_string())
    }

    /// Handle a single JSON-RPC request
    pub async fn handle_request(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        debug!("Handling request: {}", request.method);

        if request.is_notification() {
            debug!("Notification: {}", request.method);
            return None;
        }

        match request.method.as_str() {
            "initialize" => {
                let result = self.handle_initialize(request.params);
                Some(JsonRpcResponse::success(request.id, result))
            }
            "tools/list" => {
                let result = self.handle_tools_list();
                Some(JsonRpcResponse::success(request.id, result))
            }
            "tools/call" => match self.handle_tools_call(request.params).await {
                Ok(result) => Some(JsonRpcResponse::success(request.id, result)),
                Err(e) => Some(JsonRpcResponse::error(request.id, INVALID_PARAMS, &e)),
            },
            "ping" => Some(JsonRpcResponse::success(request.id, json!({}))),
            _ => {
                warn!("Unknown method: {}", request.method);
                Some(JsonRpcResponse::error(
                    request.id,
                    METHOD_NOT_FOUND,
                    &format!("Method not found: {}", request.method),
                ))
            }
        }
    }

    /// Serve requests from `reader` until EOF, writing responses to `writer`.
    pub async fn serve<R, W>(&self, reader: R, mut writer: W) -> Result<(), McpError>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = reader.lines();

        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }

            debug!("Received: {}", line);

            let request: JsonRpcRequest = match serde_json::from_str(&line) {
                Ok(req) => req,
                Err(e) => {
                    error!("Failed to parse request: {}", e);
                    let response = JsonRpcResponse::error(None, PARSE_ERROR, "Parse error");
                    write_response(&mut writer, &response).await?;
                    continue;
                }
            };

            if let Some(response) = self.handle_request(request).await {
                write_response(&mut writer, &response).await?;
            }
        }

        info!("Input closed, shutting down");
        Ok(())
    }

    /// Run the MCP server over stdio
    pub async fn run_stdio(&self) -> Result<(), McpError> {
        let reader = BufReader::new(tokio::io::stdin());
        let stdout = tokio::io::stdout();

        info!("MCP server ready, listening on stdio...");
        self.serve(reader, stdout).await
    }
}

async fn write_response<W>(writer: &mut W, response: &JsonRpcResponse) -> Result<(), McpError>
where
    W: AsyncWrite + Unpin,
{
    let response_json = serde_json::to_string(response)?;
    debug!("Sending: {}", response_json);
    writer.write_all(response_json.as_bytes()).await?;
    writer.write_all(b"\n").await?;
    writer.flush().await?;
    Ok(())
}
