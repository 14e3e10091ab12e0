//! Integration tests for the MCP server.
//!
//! Runs `McpServer<HttpN8nClient>` on an in-process duplex transport against a
//! mockito n8n instance, exercising JSON-RPC framing, tool routing, the real
//! HTTP client and envelope formatting end-to-end.

use mockito::{Matcher, ServerGuard};
use n8n_mcp_server::server::McpError;
use n8n_mcp_server::{HttpN8nClient, McpServer, N8nConfig};
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines, ReadHalf, WriteHalf};
use tokio::io::DuplexStream;

const API_KEY: &str = "test-key";

// ── Test harness ─────────────────────────────────────────────────────

struct TestHarness {
    n8n: ServerGuard,
    writer: WriteHalf<DuplexStream>,
    lines: Lines<BufReader<ReadHalf<DuplexStream>>>,
    server_handle: tokio::task::JoinHandle<Result<(), McpError>>,
    next_id: u64,
}

impl TestHarness {
    async fn new() -> Self {
        let n8n = mockito::Server::new_async().await;
        let config = N8nConfig::new(n8n.url(), API_KEY);
        let server = McpServer::new(HttpN8nClient::new(&config).expect("client setup failed"));

        let (client_io, server_io) = tokio::io::duplex(65536);
        let (server_read, server_write) = tokio::io::split(server_io);
        let server_handle =
            tokio::spawn(async move { server.serve(BufReader::new(server_read), server_write).await });

        let (client_read, writer) = tokio::io::split(client_io);
        Self {
            n8n,
            writer,
            lines: BufReader::new(client_read).lines(),
            server_handle,
            next_id: 0,
        }
    }

    async fn send_raw(&mut self, line: &str) {
        self.writer.write_all(line.as_bytes()).await.unwrap();
        self.writer.write_all(b"\n").await.unwrap();
        self.writer.flush().await.unwrap();
    }

    async fn read_response(&mut self) -> Value {
        let line = self
            .lines
            .next_line()
            .await
            .unwrap()
            .expect("server closed the stream");
        serde_json::from_str(&line).unwrap()
    }

    /// Send a JSON-RPC request and wait for its response.
    async fn request(&mut self, method: &str, params: Value) -> Value {
        self.next_id += 1;
        let request = json!({
            "jsonrpc": "2.0",
            "id": self.next_id,
            "method": method,
            "params": params,
        });
        self.send_raw(&request.to_string()).await;
        let response = self.read_response().await;
        assert_eq!(response["id"], self.next_id);
        response
    }

    /// Call a tool and return `(isError, parsed envelope)`.
    async fn call_tool(&mut self, name: &str, arguments: Value) -> (bool, Value) {
        let response = self
            .request("tools/call", json!({"name": name, "arguments": arguments}))
            .await;
        let result = &response["result"];
        let text = result["content"][0]["text"].as_str().unwrap();
        (
            result["isError"].as_bool().unwrap(),
            serde_json::from_str(text).unwrap(),
        )
    }

    /// Close the client side and wait for the server loop to finish.
    async fn shutdown(self) {
        let TestHarness {
            writer,
            lines,
            server_handle,
            ..
        } = self;
        drop(writer);
        drop(lines);
        server_handle.await.unwrap().unwrap();
    }
}

// ════════════════════════════════════════════════════════════════════════
// Integration tests
// ════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn initialize_then_list_tools() {
    let mut h = TestHarness::new().await;

    let init = h
        .request("initialize", json!({"protocolVersion": "2024-11-05", "capabilities": {}}))
        .await;
    assert_eq!(init["result"]["serverInfo"]["name"], "n8n-automation-server");

    h.send_raw(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#)
        .await;

    let tools = h.request("tools/list", json!({})).await;
    let names: Vec<&str> = tools["result"]["tools"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["name"].as_str().unwrap())
        .collect();
    assert_eq!(
        names,
        vec![
            "create_workflow",
            "list_workflows",
            "get_workflow",
            "activate_workflow",
            "delete_workflow",
            "execute_workflow",
            "get_executions",
            "update_workflow",
        ]
    );

    h.shutdown().await;
}

#[tokio::test]
async fn create_workflow_posts_defaulted_nodes() {
    let mut h = TestHarness::new().await;
    let mock = h
        .n8n
        .mock("POST", "/api/v1/workflows")
        .match_header("x-n8n-api-key", API_KEY)
        .match_body(Matcher::PartialJson(json!({
            "name": "Test",
            "connections": {},
            "settings": {"executionOrder": "v1"},
            "staticData": null,
            "nodes": [{
                "name": "Req",
                "type": "http",
                "typeVersion": 1,
                "position": [250, 300],
                "parameters": {}
            }]
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"id":"abc","name":"Test","active":false}"#)
        .create_async()
        .await;

    let (is_error, envelope) = h
        .call_tool(
            "create_workflow",
            json!({"name": "Test", "nodes": [{"type": "http", "name": "Req", "parameters": {}}]}),
        )
        .await;

    mock.assert_async().await;
    assert!(!is_error);
    assert_eq!(
        envelope,
        json!({
            "success": true,
            "workflow_id": "abc",
            "name": "Test",
            "message": "Workflow created successfully",
        })
    );

    h.shutdown().await;
}

#[tokio::test]
async fn delete_missing_workflow_returns_error_envelope() {
    let mut h = TestHarness::new().await;
    h.n8n
        .mock("DELETE", "/api/v1/workflows/abc")
        .with_status(404)
        .with_header("content-type", "application/json")
        .with_body(r#"{"message":"Not Found"}"#)
        .create_async()
        .await;

    let (is_error, envelope) = h
        .call_tool("delete_workflow", json!({"workflow_id": "abc"}))
        .await;

    assert!(is_error);
    assert_eq!(
        envelope,
        json!({
            "error": true,
            "message": "Request failed with status code 404",
            "details": {"message": "Not Found"},
        })
    );

    // The server keeps serving after a failed call.
    let pong = h.request("ping", Value::Null).await;
    assert_eq!(pong["result"], json!({}));

    h.shutdown().await;
}

#[tokio::test]
async fn list_workflows_filters_and_projects() {
    let mut h = TestHarness::new().await;
    h.n8n
        .mock("GET", "/api/v1/workflows")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "data": [
                    {"id": "1", "name": "A", "active": true, "tags": [], "createdAt": "t", "updatedAt": "t", "nodes": [{}]},
                    {"id": "2", "name": "B", "active": false, "tags": [], "createdAt": "t", "updatedAt": "t", "nodes": []}
                ],
                "nextCursor": null
            })
            .to_string(),
        )
        .expect(2)
        .create_async()
        .await;

    let (_, active_only) = h.call_tool("list_workflows", json!({"active": true})).await;
    assert_eq!(
        active_only,
        json!([{"id": "1", "name": "A", "active": true, "tags": [], "createdAt": "t", "updatedAt": "t"}])
    );

    let (_, all) = h.call_tool("list_workflows", json!({})).await;
    assert_eq!(all.as_array().unwrap().len(), 2);

    h.shutdown().await;
}

#[tokio::test]
async fn update_workflow_reads_then_replaces() {
    let mut h = TestHarness::new().await;
    let stored = json!({
        "id": "abc",
        "name": "Old",
        "active": true,
        "nodes": [{"id": "n1", "name": "Start", "type": "manualTrigger"}],
        "connections": {"Start": {"main": [[]]}},
        "settings": {"executionOrder": "v1"}
    });
    let get = h
        .n8n
        .mock("GET", "/api/v1/workflows/abc")
        .with_status(200)
        .with_body(stored.to_string())
        .create_async()
        .await;
    let put = h
        .n8n
        .mock("PUT", "/api/v1/workflows/abc")
        .match_body(Matcher::Json(json!({
            "id": "abc",
            "name": "New",
            "active": true,
            "nodes": stored["nodes"],
            "connections": stored["connections"],
            "settings": {"executionOrder": "v1"}
        })))
        .with_status(200)
        .with_body(r#"{"id":"abc","name":"New"}"#)
        .create_async()
        .await;

    let (is_error, envelope) = h
        .call_tool("update_workflow", json!({"workflow_id": "abc", "name": "New"}))
        .await;

    get.assert_async().await;
    put.assert_async().await;
    assert!(!is_error);
    assert_eq!(envelope["workflow_id"], "abc");
    assert_eq!(envelope["message"], "Workflow updated successfully");

    h.shutdown().await;
}

#[tokio::test]
async fn get_executions_uses_default_limit() {
    let mut h = TestHarness::new().await;
    let mock = h
        .n8n
        .mock("GET", "/api/v1/executions")
        .match_query(Matcher::UrlEncoded("limit".into(), "10".into()))
        .with_status(200)
        .with_body(r#"{"data":[{"id":"e1","status":"success"}],"nextCursor":null}"#)
        .create_async()
        .await;

    let (is_error, envelope) = h.call_tool("get_executions", json!({})).await;

    mock.assert_async().await;
    assert!(!is_error);
    assert_eq!(envelope, json!([{"id": "e1", "status": "success"}]));

    h.shutdown().await;
}

#[tokio::test]
async fn invalid_arguments_never_reach_n8n() {
    let mut h = TestHarness::new().await;
    let mock = h
        .n8n
        .mock("PATCH", Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let (is_error, envelope) = h
        .call_tool("activate_workflow", json!({"workflow_id": "abc"}))
        .await;

    mock.assert_async().await;
    assert!(is_error);
    assert_eq!(envelope["error"], true);
    assert_eq!(envelope["details"]["kind"], "invalid_arguments");

    h.shutdown().await;
}

#[tokio::test]
async fn parse_errors_keep_the_session_alive() {
    let mut h = TestHarness::new().await;

    h.send_raw("this is not json").await;
    let response = h.read_response().await;
    assert_eq!(response["error"]["code"], -32700);

    let (is_error, envelope) = h.call_tool("unknown_tool", json!({})).await;
    assert!(is_error);
    assert_eq!(envelope["message"], "Unknown operation: unknown_tool");

    h.shutdown().await;
}
