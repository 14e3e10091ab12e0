//! Typed tool arguments.
//!
//! Each tool gets its own argument struct; the raw JSON bundle from
//! `tools/call` is parsed into one `ToolInvocation` variant before anything is
//! sent to n8n, so malformed calls fail locally.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{Map, Number, Value};

use crate::registry::ToolName;
use crate::validation;

/// Executions returned by `get_executions` when no limit is given.
pub const DEFAULT_EXECUTION_LIMIT: u32 = 10;

/// A node as supplied to `create_workflow`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NodeSpec {
    /// Node type (e.g. "n8n-nodes-base.httpRequest")
    #[serde(rename = "type")]
    pub node_type: String,
    /// Display name, unique within the workflow
    pub name: String,
    pub parameters: Option<Map<String, Value>>,
    /// Canvas coordinates `[x, y]`
    pub position: Option<[Number; 2]>,
    #[serde(rename = "typeVersion")]
    pub type_version: Option<Number>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CreateWorkflowArgs {
    pub name: String,
    pub nodes: Vec<NodeSpec>,
    pub connections: Option<Map<String, Value>>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ListWorkflowsArgs {
    /// Keep only workflows whose active flag equals this value
    pub active: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WorkflowIdArgs {
    pub workflow_id: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ActivateWorkflowArgs {
    pub workflow_id: String,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ExecuteWorkflowArgs {
    pub workflow_id: String,
    /// Input data handed to the trigger, `{}` when absent
    pub data: Option<Map<String, Value>>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct GetExecutionsArgs {
    pub workflow_id: Option<String>,
    #[serde(default, deserialize_with = "whole_number")]
    pub limit: Option<u32>,
}

impl GetExecutionsArgs {
    /// Requested limit; absent or zero falls back to the default.
    pub fn effective_limit(&self) -> u32 {
        self.limit
            .filter(|limit| *limit > 0)
            .unwrap_or(DEFAULT_EXECUTION_LIMIT)
    }

    /// Workflow scope, ignoring an empty string.
    pub fn workflow_filter(&self) -> Option<&str> {
        self.workflow_id.as_deref().filter(|id| !id.is_empty())
    }
}

/// Accepts `5` as well as `5.0`; negatives and fractions are rejected.
fn whole_number<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let Some(number) = Option::<Number>::deserialize(deserializer)? else {
        return Ok(None);
    };
    let whole = match (number.as_u64(), number.as_f64()) {
        (Some(n), _) => Some(n),
        (None, Some(f)) if f >= 0.0 && f.fract() == 0.0 && f <= f64::from(u32::MAX) => {
            Some(f as u64)
        }
        _ => None,
    };
    whole
        .and_then(|n| u32::try_from(n).ok())
        .map(Some)
        .ok_or_else(|| {
            serde::de::Error::custom(format!(
                "limit must be a non-negative whole number, got {}",
                number
            ))
        })
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UpdateWorkflowArgs {
    pub workflow_id: String,
    pub name: Option<String>,
    /// Replacement node list, forwarded verbatim
    pub nodes: Option<Vec<Value>>,
    pub connections: Option<Map<String, Value>>,
}

/// One parsed `tools/call` request.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolInvocation {
    CreateWorkflow(CreateWorkflowArgs),
    ListWorkflows(ListWorkflowsArgs),
    GetWorkflow(WorkflowIdArgs),
    ActivateWorkflow(ActivateWorkflowArgs),
    DeleteWorkflow(WorkflowIdArgs),
    ExecuteWorkflow(ExecuteWorkflowArgs),
    GetExecutions(GetExecutionsArgs),
    UpdateWorkflow(UpdateWorkflowArgs),
}

impl ToolInvocation {
    /// Parse and validate the argument bundle for `tool`.
    ///
    /// Absent (`null`) arguments are treated as an empty object. Returns a
    /// user-facing reason on failure.
    pub fn parse(tool: ToolName, arguments: Value) -> Result<Self, String> {
        let arguments = match arguments {
            Value::Null => Value::Object(Map::new()),
            Value::Object(_) => arguments,
            other => {
                return Err(format!(
                    "arguments must be a JSON object, got {}",
                    json_type(&other)
                ))
            }
        };

        let invocation = match tool {
            ToolName::CreateWorkflow => Self::CreateWorkflow(decode(arguments)?),
            ToolName::ListWorkflows => Self::ListWorkflows(decode(arguments)?),
            ToolName::GetWorkflow => Self::GetWorkflow(decode(arguments)?),
            ToolName::ActivateWorkflow => Self::ActivateWorkflow(decode(arguments)?),
            ToolName::DeleteWorkflow => Self::DeleteWorkflow(decode(arguments)?),
            ToolName::ExecuteWorkflow => Self::ExecuteWorkflow(decode(arguments)?),
            ToolName::GetExecutions => Self::GetExecutions(decode(arguments)?),
            ToolName::UpdateWorkflow => Self::UpdateWorkflow(decode(arguments)?),
        };

        if let Some(id) = invocation.workflow_id() {
            validation::validate_workflow_id(id)?;
        }
        Ok(invocation)
    }

    pub fn tool(&self) -> ToolName {
        match self {
            Self::CreateWorkflow(_) => ToolName::CreateWorkflow,
            Self::ListWorkflows(_) => ToolName::ListWorkflows,
            Self::GetWorkflow(_) => ToolName::GetWorkflow,
            Self::ActivateWorkflow(_) => ToolName::ActivateWorkflow,
            Self::DeleteWorkflow(_) => ToolName::DeleteWorkflow,
            Self::ExecuteWorkflow(_) => ToolName::ExecuteWorkflow,
            Self::GetExecutions(_) => ToolName::GetExecutions,
            Self::UpdateWorkflow(_) => ToolName::UpdateWorkflow,
        }
    }

    /// The workflow this call targets, if any.
    pub fn workflow_id(&self) -> Option<&str> {
        match self {
            Self::CreateWorkflow(_) | Self::ListWorkflows(_) => None,
            Self::GetWorkflow(args) | Self::DeleteWorkflow(args) => Some(args.workflow_id.as_str()),
            Self::ActivateWorkflow(args) => Some(args.workflow_id.as_str()),
            Self::ExecuteWorkflow(args) => Some(args.workflow_id.as_str()),
            Self::GetExecutions(args) => args.workflow_filter(),
            Self::UpdateWorkflow(args) => Some(args.workflow_id.as_str()),
        }
    }
}

fn decode<T: DeserializeOwned>(arguments: Value) -> Result<T, String> {
    serde_json::from_value(arguments).map_err(|e| e.to_string())
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
