//! Tool dispatch.
//!
//! `Dispatcher::dispatch` turns a tool name and its raw arguments into exactly
//! one `ResponseEnvelope`. Unknown tools, invalid arguments and n8n failures
//! all end up in the error envelope; nothing propagates past this boundary.

use log::{debug, info, warn};
use serde_json::{json, Map, Number, Value};
use uuid::Uuid;

use crate::client::{N8nApi, RemoteError};
use crate::invocation::{
    ActivateWorkflowArgs, CreateWorkflowArgs, ExecuteWorkflowArgs, GetExecutionsArgs,
    ListWorkflowsArgs, NodeSpec, ToolInvocation, UpdateWorkflowArgs, WorkflowIdArgs,
};
use crate::registry::ToolName;

/// Canvas position given to nodes created without one.
const DEFAULT_NODE_POSITION: [i64; 2] = [250, 300];

/// Type version given to nodes created without one.
const DEFAULT_TYPE_VERSION: i64 = 1;

/// `settings.executionOrder` attached to every created workflow.
const EXECUTION_ORDER: &str = "v1";

/// Fields kept by `list_workflows`.
const WORKFLOW_SUMMARY_FIELDS: [&str; 6] =
    ["id", "name", "active", "tags", "createdAt", "updatedAt"];

/// Reasons a tool call fails.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("Unknown operation: {0}")]
    UnknownTool(String),
    #[error("Invalid arguments for {tool}: {reason}")]
    InvalidArguments { tool: &'static str, reason: String },
    #[error("Unexpected response from n8n: {0}")]
    UnexpectedResponse(String),
    #[error(transparent)]
    Remote(#[from] RemoteError),
}

impl DispatchError {
    /// Payload for the envelope's `details` field.
    pub fn details(&self) -> Value {
        match self {
            DispatchError::UnknownTool(name) => json!({
                "kind": "unknown_tool",
                "tool": name,
                "available": ToolName::ALL.iter().map(|t| t.as_str()).collect::<Vec<_>>(),
            }),
            DispatchError::InvalidArguments { tool, reason } => json!({
                "kind": "invalid_arguments",
                "tool": tool,
                "reason": reason,
            }),
            DispatchError::UnexpectedResponse(message) => json!({
                "kind": "unexpected_response",
                "message": message,
            }),
            DispatchError::Remote(err) => err.details(),
        }
    }

    /// True when the call never reached n8n.
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            DispatchError::UnknownTool(_) | DispatchError::InvalidArguments { .. }
        )
    }
}

/// Uniform result of a tool call.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseEnvelope {
    /// Tool-specific success payload
    Success(Value),
    /// Serialized as `{"error": true, "message": ..., "details": ...}`
    Error { message: String, details: Value },
}

impl ResponseEnvelope {
    pub fn is_error(&self) -> bool {
        matches!(self, ResponseEnvelope::Error { .. })
    }

    pub fn to_value(&self) -> Value {
        match self {
            ResponseEnvelope::Success(value) => value.clone(),
            ResponseEnvelope::Error { message, details } => json!({
                "error": true,
                "message": message,
                "details": details,
            }),
        }
    }

    /// Pretty-printed JSON, as placed in the tool result's text content.
    pub fn to_text(&self) -> String {
        let value = self.to_value();
        serde_json::to_string_pretty(&value).unwrap_or_else(|_| value.to_string())
    }
}

impl From<DispatchError> for ResponseEnvelope {
    fn from(err: DispatchError) -> Self {
        ResponseEnvelope::Error {
            message: err.to_string(),
            details: err.details(),
        }
    }
}

/// Routes tool calls to the n8n API.
pub struct Dispatcher<C> {
    client: C,
}

impl<C: N8nApi> Dispatcher<C> {
    pub fn new(client: C) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// Run one tool call. Always yields an envelope.
    pub async fn dispatch(&self, name: &str, arguments: Value) -> ResponseEnvelope {
        info!("Tool called: {}", name);
        debug!("Arguments for {}: {}", name, arguments);

        match self.try_dispatch(name, arguments).await {
            Ok(value) => ResponseEnvelope::Success(value),
            Err(err) => {
                if err.is_local() {
                    warn!("Rejected {} call: {}", name, err);
                } else {
                    warn!("Tool {} failed: {}", name, err);
                }
                err.into()
            }
        }
    }

    async fn try_dispatch(&self, name: &str, arguments: Value) -> Result<Value, DispatchError> {
        let tool =
            ToolName::from_name(name).ok_or_else(|| DispatchError::UnknownTool(name.to_string()))?;
        let invocation = ToolInvocation::parse(tool, arguments).map_err(|reason| {
            DispatchError::InvalidArguments {
                tool: tool.as_str(),
                reason,
            }
        })?;
        debug!(
            "Dispatching {} (workflow: {})",
            invocation.tool().as_str(),
            invocation.workflow_id().unwrap_or("-")
        );
        self.execute(invocation).await
    }

    /// Run an already validated invocation.
    pub async fn execute(&self, invocation: ToolInvocation) -> Result<Value, DispatchError> {
        match invocation {
            ToolInvocation::CreateWorkflow(args) => self.create_workflow(args).await,
            ToolInvocation::ListWorkflows(args) => self.list_workflows(args).await,
            ToolInvocation::GetWorkflow(args) => self.get_workflow(args).await,
            ToolInvocation::ActivateWorkflow(args) => self.activate_workflow(args).await,
            ToolInvocation::DeleteWorkflow(args) => self.delete_workflow(args).await,
            ToolInvocation::ExecuteWorkflow(args) => self.execute_workflow(args).await,
            ToolInvocation::GetExecutions(args) => self.get_executions(args).await,
            ToolInvocation::UpdateWorkflow(args) => self.update_workflow(args).await,
        }
    }

    async fn create_workflow(&self, args: CreateWorkflowArgs) -> Result<Value, DispatchError> {
        let workflow = build_workflow(args);
        let created = self.client.post("/workflows", &workflow).await?;

        Ok(json!({
            "success": true,
            "workflow_id": created["id"],
            "name": created["name"],
            "message": "Workflow created successfully",
        }))
    }

    async fn list_workflows(&self, args: ListWorkflowsArgs) -> Result<Value, DispatchError> {
        let listing = unwrap_data(self.client.get("/workflows", &[]).await?);
        let Value::Array(workflows) = listing else {
            return Err(DispatchError::UnexpectedResponse(
                "workflow listing is not an array".to_string(),
            ));
        };

        let summaries = workflows
            .iter()
            .filter(|w| match args.active {
                Some(active) => w.get("active") == Some(&Value::Bool(active)),
                None => true,
            })
            .map(summarize_workflow)
            .collect();
        Ok(Value::Array(summaries))
    }

    async fn get_workflow(&self, args: WorkflowIdArgs) -> Result<Value, DispatchError> {
        let workflow = self
            .client
            .get(&workflow_path(&args.workflow_id), &[])
            .await?;
        Ok(workflow)
    }

    async fn activate_workflow(&self, args: ActivateWorkflowArgs) -> Result<Value, DispatchError> {
        let updated = self
            .client
            .patch(
                &workflow_path(&args.workflow_id),
                &json!({ "active": args.active }),
            )
            .await?;

        let verb = if args.active { "activated" } else { "deactivated" };
        Ok(json!({
            "success": true,
            "workflow_id": updated["id"],
            "active": updated["active"],
            "message": format!("Workflow {} successfully", verb),
        }))
    }

    async fn delete_workflow(&self, args: WorkflowIdArgs) -> Result<Value, DispatchError> {
        self.client.delete(&workflow_path(&args.workflow_id)).await?;

        Ok(json!({
            "success": true,
            "workflow_id": args.workflow_id,
            "message": "Workflow deleted successfully",
        }))
    }

    async fn execute_workflow(&self, args: ExecuteWorkflowArgs) -> Result<Value, DispatchError> {
        let path = format!("{}/execute", workflow_path(&args.workflow_id));
        let input = Value::Object(args.data.unwrap_or_default());
        let execution = self.client.post(&path, &input).await?;

        Ok(json!({
            "success": true,
            "execution_id": execution["id"],
            "status": execution["status"],
            "message": "Workflow executed successfully",
        }))
    }

    async fn get_executions(&self, args: GetExecutionsArgs) -> Result<Value, DispatchError> {
        let mut query = vec![("limit", args.effective_limit().to_string())];
        if let Some(workflow_id) = args.workflow_filter() {
            query.push(("workflowId", workflow_id.to_string()));
        }

        let executions = self.client.get("/executions", &query).await?;
        Ok(unwrap_data(executions))
    }

    async fn update_workflow(&self, args: UpdateWorkflowArgs) -> Result<Value, DispatchError> {
        let path = workflow_path(&args.workflow_id);
        let Value::Object(existing) = self.client.get(&path, &[]).await? else {
            return Err(DispatchError::UnexpectedResponse(format!(
                "workflow {} is not a JSON object",
                args.workflow_id
            )));
        };

        let merged = merge_workflow(existing, &args);
        let updated = self.client.put(&path, &Value::Object(merged)).await?;

        Ok(json!({
            "success": true,
            "workflow_id": updated["id"],
            "message": "Workflow updated successfully",
        }))
    }
}

fn workflow_path(workflow_id: &str) -> String {
    format!("/workflows/{}", workflow_id)
}

/// Outbound node: fresh id, defaults for version, position and parameters.
pub fn build_node(node: NodeSpec) -> Value {
    let position = node
        .position
        .unwrap_or_else(|| DEFAULT_NODE_POSITION.map(Number::from));
    json!({
        "id": Uuid::new_v4().to_string(),
        "name": node.name,
        "type": node.node_type,
        "typeVersion": node.type_version.unwrap_or_else(|| Number::from(DEFAULT_TYPE_VERSION)),
        "position": position,
        "parameters": node.parameters.unwrap_or_default(),
    })
}

/// Body of the create call.
pub fn build_workflow(args: CreateWorkflowArgs) -> Value {
    let nodes: Vec<Value> = args.nodes.into_iter().map(build_node).collect();
    json!({
        "name": args.name,
        "nodes": nodes,
        "connections": args.connections.unwrap_or_default(),
        "settings": { "executionOrder": EXECUTION_ORDER },
        "staticData": null,
    })
}

/// Shallow merge of name, nodes and connections over the stored workflow.
///
/// An absent or empty name keeps the stored one.
pub fn merge_workflow(mut existing: Map<String, Value>, args: &UpdateWorkflowArgs) -> Map<String, Value> {
    if let Some(name) = args.name.as_ref().filter(|n| !n.is_empty()) {
        existing.insert("name".to_string(), Value::String(name.clone()));
    }
    if let Some(nodes) = &args.nodes {
        existing.insert("nodes".to_string(), Value::Array(nodes.clone()));
    }
    if let Some(connections) = &args.connections {
        existing.insert("connections".to_string(), Value::Object(connections.clone()));
    }
    existing
}

/// Keep only the summary fields; fields n8n did not send stay absent.
fn summarize_workflow(workflow: &Value) -> Value {
    let summary: Map<String, Value> = WORKFLOW_SUMMARY_FIELDS
        .iter()
        .filter_map(|field| {
            workflow
                .get(*field)
                .map(|value| (field.to_string(), value.clone()))
        })
        .collect();
    Value::Object(summary)
}

/// n8n wraps list results as `{"data": [...], "nextCursor": ...}`.
fn unwrap_data(body: Value) -> Value {
    match body {
        Value::Object(mut map) => match map.get("data") {
            Some(data) if !data.is_null() => map.remove("data").unwrap_or_default(),
            _ => Value::Object(map),
        },
        other => other,
    }
}

// ── Tests ────────────────────────────────────────────────────────────────
