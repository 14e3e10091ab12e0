//! JSON-RPC 2.0 and MCP wire types.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::dispatch::ResponseEnvelope;

/// Invalid JSON was received.
pub const PARSE_ERROR: i32 = -32700;
/// The method does not exist.
pub const METHOD_NOT_FOUND: i32 = -32601;
/// Invalid method parameters.
pub const INVALID_PARAMS: i32 = -32602;

/// JSON-RPC Request
#[derive(Debug, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    pub id: Option<Value>,
    pub method: String,
    #[serde(default)]
    pub params: Value,
}

impl JsonRpcRequest {
    /// Notifications carry no id and never get a response.
    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }
}

/// JSON-RPC Response
#[derive(Debug, Serialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

#[derive(Debug, Serialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl JsonRpcResponse {
    pub fn success(id: Option<Value>, result: Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn error(id: Option<Value>, code: i32, message: &str) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: None,
            error: Some(JsonRpcError {
                code,
                message: message.to_string(),
                data: None,
            }),
        }
    }
}

/// `tools/call` parameters.
#[derive(Debug, Deserialize)]
pub struct CallToolParams {
    pub name: String,
    #[serde(default)]
    pub arguments: Value,
}

/// Content in tool result
#[derive(Debug, Serialize)]
pub struct ToolContent {
    #[serde(rename = "type")]
    pub content_type: String,
    pub text: String,
}

/// `tools/call` result: the envelope as one text block plus the error flag.
#[derive(Debug, Serialize)]
pub struct CallToolResult {
    pub content: Vec<ToolContent>,
    #[serde(rename = "isError")]
    pub is_error: bool,
}

impl From<&ResponseEnvelope> for CallToolResult {
    fn from(envelope: &ResponseEnvelope) -> Self {
        Self {
            content: vec![ToolContent {
                content_type: "text".to_string(),
                text: envelope.to_text(),
            }],
            is_error: envelope.is_error(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_deserialization() {
        let request: JsonRpcRequest = serde_json::from_str(
            r#"{"jsonrpc":"2.0","id":7,"method":"tools/list"}"#,
        )
        .unwrap();
        assert_eq!(request.method, "tools/list");
        assert_eq!(request.id, Some(json!(7)));
        assert!(request.params.is_null());
        assert!(!request.is_notification());
    }

    #[test]
    fn test_notification_has_no_id() {
        let request: JsonRpcRequest = serde_json::from_str(
            r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
        )
        .unwrap();
        assert!(request.is_notification());
    }

    #[test]
    fn test_error_response_serialization() {
        let response = JsonRpcResponse::error(Some(json!(1)), METHOD_NOT_FOUND, "Method not found: x");
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["error"]["code"], -32601);
        assert!(value.get("result").is_none());
        assert!(value["error"].get("data").is_none());
    }

    #[test]
    fn test_call_tool_result_from_error_envelope() {
        let envelope = ResponseEnvelope::Error {
            message: "boom".to_string(),
            details: json!({"status": 500}),
        };
        let value = serde_json::to_value(CallToolResult::from(&envelope)).unwrap();
        assert_eq!(value["isError"], true);
        assert_eq!(value["content"][0]["type"], "text");

        let text: Value =
            serde_json::from_str(value["content"][0]["text"].as_str().unwrap()).unwrap();
        assert_eq!(text, json!({"error": true, "message": "boom", "details": {"status": 500}}));
    }

    #[test]
    fn test_call_tool_params_default_arguments() {
        let params: CallToolParams =
            serde_json::from_value(json!({"name": "list_workflows"})).unwrap();
        assert_eq!(params.name, "list_workflows");
        assert!(params.arguments.is_null());
    }
}
