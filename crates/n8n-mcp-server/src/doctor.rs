//! Connectivity diagnostics for the configured n8n instance.
//!
//! Checks that an API key is configured, that the workflow listing is
//! reachable with it, and optionally that one workflow can be fetched.
//! Provides an actionable fix for each failed check.

use serde_json::Value;

use crate::client::{N8nApi, RemoteError};
use crate::config::{N8nConfig, ENV_API_KEY, ENV_BASE_URL};

#[derive(Debug)]
pub struct DiagnosticResult {
    pub check: String,
    pub passed: bool,
    pub message: String,
    pub fix: Option<String>,
}

impl DiagnosticResult {
    fn pass(check: &str, message: &str) -> Self {
        Self {
            check: check.to_string(),
            passed: true,
            message: message.to_string(),
            fix: None,
        }
    }

    fn fail(check: &str, message: &str, fix: &str) -> Self {
        Self {
            check: check.to_string(),
            passed: false,
            message: message.to_string(),
            fix: Some(fix.to_string()),
        }
    }
}

/// Run all checks against `client`.
pub async fn run_checks<C: N8nApi>(
    config: &N8nConfig,
    client: &C,
    workflow_id: Option<&str>,
) -> Vec<DiagnosticResult> {
    let mut results = vec![check_api_key(config)];

    let connected = match client.get("/workflows", &[]).await {
        Ok(body) => {
            let count = workflow_count(&body);
            results.push(DiagnosticResult::pass(
                "API connection",
                &format!("Connected to {}, found {} workflows", config.base_url, count),
            ));
            true
        }
        Err(err) => {
            results.push(connection_failure(config, &err));
            false
        }
    };

    if let Some(id) = workflow_id {
        if connected {
            results.push(check_workflow(client, id).await);
        } else {
            results.push(DiagnosticResult::fail(
                "Workflow lookup",
                "Skipped (no API connection)",
                "Fix the API connection first",
            ));
        }
    }

    results
}

fn check_api_key(config: &N8nConfig) -> DiagnosticResult {
    if config.has_api_key() {
        DiagnosticResult::pass("API key", "Configured")
    } else {
        DiagnosticResult::fail(
            "API key",
            "No API key configured; requests are sent with an empty key",
            &format!("Set {} or pass --api-key", ENV_API_KEY),
        )
    }
}

fn connection_failure(config: &N8nConfig, err: &RemoteError) -> DiagnosticResult {
    match err.status() {
        Some(401) => DiagnosticResult::fail(
            "API connection",
            &format!("{} (401 Unauthorized)", err),
            &format!(
                "The API key is invalid or expired. Create a new one at {}/settings/api and update {}",
                config.base_url, ENV_API_KEY
            ),
        ),
        Some(status) => DiagnosticResult::fail(
            "API connection",
            &format!("{}: {}", err, err.details()),
            &format!(
                "n8n answered with HTTP {}; check that {} points at the instance root",
                status, ENV_BASE_URL
            ),
        ),
        None => DiagnosticResult::fail(
            "API connection",
            &err.to_string(),
            &format!("Check that {} is reachable: {}", ENV_BASE_URL, config.base_url),
        ),
    }
}

async fn check_workflow<C: N8nApi>(client: &C, workflow_id: &str) -> DiagnosticResult {
    if let Err(e) = crate::validation::validate_workflow_id(workflow_id) {
        return DiagnosticResult::fail("Workflow lookup", &e, "Pass a valid workflow id");
    }

    match client.get(&format!("/workflows/{}", workflow_id), &[]).await {
        Ok(workflow) => {
            let name = workflow["name"].as_str().unwrap_or("<unnamed>");
            let active = workflow["active"].as_bool().unwrap_or(false);
            let nodes = workflow["nodes"].as_array().map_or(0, |n| n.len());
            DiagnosticResult::pass(
                "Workflow lookup",
                &format!("{} (active: {}, nodes: {})", name, active, nodes),
            )
        }
        Err(err) => DiagnosticResult::fail(
            "Workflow lookup",
            &format!("{}: {}", err, err.details()),
            "Use list_workflows to find a valid workflow id",
        ),
    }
}

/// Count workflows in either the paged `{data: [...]}` or bare-array form.
fn workflow_count(body: &Value) -> usize {
    body.get("data")
        .and_then(Value::as_array)
        .or_else(|| body.as_array())
        .map_or(0, |items| items.len())
}

/// Print the report; returns the number of failed checks.
pub fn print_report(results: &[DiagnosticResult]) -> usize {
    println!("n8n-mcp-server doctor");
    println!("=====================");
    println!();

    let mut issues_found = 0;

    for result in results {
        let symbol = if result.passed { "✓" } else { "✗" };
        println!("[{}] {}: {}", symbol, result.check, result.message);

        if !result.passed {
            issues_found += 1;
            if let Some(fix) = &result.fix {
                println!("    → Fix: {}", fix);
            }
        }
    }

    println!();
    if issues_found == 0 {
        println!("All checks passed!");
    } else {
        println!(
            "Found {} issue{}",
            issues_found,
            if issues_found == 1 { "" } else { "s" }
        );
    }

    issues_found
}
