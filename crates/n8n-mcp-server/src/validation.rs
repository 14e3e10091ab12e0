//! Input validation for values that end up in request paths.

/// Validate a workflow id: 1-128 chars, `[a-zA-Z0-9_-]` only.
///
/// Ids are interpolated into `/workflows/{id}`, so separators and query
/// characters must never reach the URL.
pub fn validate_workflow_id(id: &str) -> Result<(), String> {
    if id.is_empty() || id.len() > 128 {
        return Err(format!(
            "Workflow id must be 1-128 characters, got {}",
            id.len()
        ));
    }
    if !id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(
            "Workflow id may only contain alphanumeric characters, hyphens, and underscores"
                .to_string(),
        );
    }
    Ok(())
}
