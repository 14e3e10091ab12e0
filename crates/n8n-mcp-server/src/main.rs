//! n8n MCP Server - Entry Point
//!
//! Runs the MCP server over stdio for integration with Claude Desktop and
//! other MCP clients, or diagnoses the n8n connection.

use anyhow::{bail, Context, Result};
use argh::FromArgs;
use n8n_mcp_server::{doctor, HttpN8nClient, McpServer, N8nConfig};

/// n8n MCP Server - Expose n8n workflows to AI assistants
#[derive(FromArgs)]
struct Args {
    /// path to a YAML config file with base_url and api_key
    #[argh(option, short = 'c')]
    config: Option<String>,

    /// n8n instance address (overrides N8N_URL)
    #[argh(option)]
    n8n_url: Option<String>,

    /// n8n API key (overrides N8N_API_KEY)
    #[argh(option)]
    api_key: Option<String>,

    #[argh(subcommand)]
    command: Option<Command>,
}

#[derive(FromArgs)]
#[argh(subcommand)]
enum Command {
    Serve(ServeArgs),
    Doctor(DoctorArgs),
}

/// Serve MCP over stdio (default)
#[derive(FromArgs)]
#[argh(subcommand, name = "serve")]
struct ServeArgs {}

/// Check connectivity and credentials against the n8n API
#[derive(FromArgs)]
#[argh(subcommand, name = "doctor")]
struct DoctorArgs {
    /// also fetch this workflow and report its name, state and node count
    #[argh(option, short = 'w')]
    workflow_id: Option<String>,
}

fn resolve_config(args: &Args) -> Result<N8nConfig> {
    let config = match &args.config {
        Some(path) => N8nConfig::from_file(path)
            .with_context(|| format!("Failed to load config from {}", path))?
            .with_env(|key| std::env::var(key).ok()),
        None => N8nConfig::from_env(),
    };
    Ok(config.with_overrides(args.n8n_url.clone(), args.api_key.clone()))
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let args: Args = argh::from_env();

    // Initialize logging to stderr (stdout is used for MCP protocol)
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();

    let config = resolve_config(&args)?;
    if !config.has_api_key() {
        log::warn!("N8N_API_KEY is not set; requests will be sent with an empty API key");
    }

    let client = HttpN8nClient::new(&config).context("Failed to build n8n client")?;

    match args.command {
        Some(Command::Doctor(doctor_args)) => {
            let results =
                doctor::run_checks(&config, &client, doctor_args.workflow_id.as_deref()).await;
            let issues = doctor::print_report(&results);
            if issues > 0 {
                bail!("{} check(s) failed", issues);
            }
        }
        Some(Command::Serve(_)) | None => {
            log::info!("Starting n8n MCP server");
            log::info!("n8n API: {}", client.api_url());

            let server = McpServer::new(client);
            server.run_stdio().await?;
        }
    }

    Ok(())
}
