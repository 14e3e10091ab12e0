//! Fixed table of the tools this server exposes.

use serde::Serialize;
use serde_json::{json, Value};

/// Tool definition as advertised through `tools/list`.
#[derive(Debug, Clone, Serialize)]
pub struct ToolDescriptor {
    pub name: &'static str,
    pub description: &'static str,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

/// Every tool the dispatcher can route to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolName {
    CreateWorkflow,
    ListWorkflows,
    GetWorkflow,
    ActivateWorkflow,
    DeleteWorkflow,
    ExecuteWorkflow,
    GetExecutions,
    UpdateWorkflow,
}

impl ToolName {
    /// All tools, in advertised order.
    pub const ALL: [ToolName; 8] = [
        ToolName::CreateWorkflow,
        ToolName::ListWorkflows,
        ToolName::GetWorkflow,
        ToolName::ActivateWorkflow,
        ToolName::DeleteWorkflow,
        ToolName::ExecuteWorkflow,
        ToolName::GetExecutions,
        ToolName::UpdateWorkflow,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ToolName::CreateWorkflow => "create_workflow",
            ToolName::ListWorkflows => "list_workflows",
            ToolName::GetWorkflow => "get_workflow",
            ToolName::ActivateWorkflow => "activate_workflow",
            ToolName::DeleteWorkflow => "delete_workflow",
            ToolName::ExecuteWorkflow => "execute_workflow",
            ToolName::GetExecutions => "get_executions",
            ToolName::UpdateWorkflow => "update_workflow",
        }
    }

    /// Exact, case-sensitive lookup.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|tool| tool.as_str() == name)
    }

    pub fn descriptor(self) -> ToolDescriptor {
        match self {
            ToolName::CreateWorkflow => ToolDescriptor {
                name: self.as_str(),
                description: "Create a new N8N workflow from a structured definition. Accepts workflow name, trigger type, and node configurations.",
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "name": {
                            "type": "string",
                            "description": "Name of the workflow"
                        },
                        "nodes": {
                            "type": "array",
                            "description": "Array of node configurations",
                            "items": {
                                "type": "object",
                                "properties": {
                                    "type": {
                                        "type": "string",
                                        "description": "Node type (e.g., 'n8n-nodes-base.emailTrigger', 'n8n-nodes-base.httpRequest')"
                                    },
                                    "name": {
                                        "type": "string",
                                        "description": "Display name for the node"
                                    },
                                    "parameters": {
                                        "type": "object",
                                        "description": "Node-specific parameters (default: {})"
                                    },
                                    "position": {
                                        "type": "array",
                                        "description": "X,Y coordinates [x, y] (default: [250, 300])",
                                        "items": { "type": "number" },
                                        "minItems": 2,
                                        "maxItems": 2
                                    },
                                    "typeVersion": {
                                        "type": "number",
                                        "description": "Node type version (default: 1)"
                                    }
                                },
                                "required": ["type", "name"]
                            }
                        },
                        "connections": {
                            "type": "object",
                            "description": "Connections between nodes"
                        }
                    },
                    "required": ["name", "nodes"]
                }),
            },
            ToolName::ListWorkflows => ToolDescriptor {
                name: self.as_str(),
                description: "List all workflows in N8N. Returns workflow IDs, names, active status, and tags.",
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "active": {
                            "type": "boolean",
                            "description": "Filter by active status (optional)"
                        }
                    },
                    "required": []
                }),
            },
            ToolName::GetWorkflow => ToolDescriptor {
                name: self.as_str(),
                description: "Get detailed information about a specific workflow including all nodes and connections.",
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "workflow_id": {
                            "type": "string",
                            "description": "The workflow ID"
                        }
                    },
                    "required": ["workflow_id"]
                }),
            },
            ToolName::ActivateWorkflow => ToolDescriptor {
                name: self.as_str(),
                description: "Activate or deactivate a workflow",
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "workflow_id": {
                            "type": "string",
                            "description": "The workflow ID"
                        },
                        "active": {
                            "type": "boolean",
                            "description": "True to activate, false to deactivate"
                        }
                    },
                    "required": ["workflow_id", "active"]
                }),
            },
            ToolName::DeleteWorkflow => ToolDescriptor {
                name: self.as_str(),
                description: "Delete a workflow permanently",
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "workflow_id": {
                            "type": "string",
                            "description": "The workflow ID to delete"
                        }
                    },
                    "required": ["workflow_id"]
                }),
            },
            ToolName::ExecuteWorkflow => ToolDescriptor {
                name: self.as_str(),
                description: "Manually trigger a workflow execution with optional input data",
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "workflow_id": {
                            "type": "string",
                            "description": "The workflow ID"
                        },
                        "data": {
                            "type": "object",
                            "description": "Optional input data for the workflow"
                        }
                    },
                    "required": ["workflow_id"]
                }),
            },
            ToolName::GetExecutions => ToolDescriptor {
                name: self.as_str(),
                description: "Get execution history for a workflow",
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "workflow_id": {
                            "type": "string",
                            "description": "The workflow ID (optional - omit for all workflows)"
                        },
                        "limit": {
                            "type": "integer",
                            "minimum": 0,
                            "description": "Number of executions to return (default 10)"
                        }
                    },
                    "required": []
                }),
            },
            ToolName::UpdateWorkflow => ToolDescriptor {
                name: self.as_str(),
                description: "Update an existing workflow's nodes, connections, or settings",
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "workflow_id": {
                            "type": "string",
                            "description": "The workflow ID to update"
                        },
                        "name": {
                            "type": "string",
                            "description": "New workflow name (optional)"
                        },
                        "nodes": {
                            "type": "array",
                            "description": "Updated node configurations (optional)"
                        },
                        "connections": {
                            "type": "object",
                            "description": "Updated connections (optional)"
                        }
                    },
                    "required": ["workflow_id"]
                }),
            },
        }
    }
}

/// The complete tool list, in advertised order.
pub fn list_tools() -> Vec<ToolDescriptor> {
    ToolName::ALL.iter().map(|tool| tool.descriptor()).collect()
}
