//! MCP server setup and lifecycle.
//!
//! Provides [`run_server`] which starts the stdio-based MCP server,
//! registering all repopulse tools and blocking until the client disconnects.

use std::sync::Arc;

use repopulse_core::PulseError;
use repopulse_github::client::GitHubClient;
use repopulse_github::service::ActivityService;
use rmcp::{model::*, tool_handler, transport::stdio, ServerHandler, ServiceExt};

use crate::tools::PulseServer;

const SERVER_INSTRUCTIONS: &str = "\
repopulse analyzes GitHub repositories. Use these tools to understand who contributes and how:\n\
- list_repos: List repositories of a user\n\
- list_commits: List every commit of a repository\n\
- list_contributors: List contributors with contribution counts\n\
- analyze_activity: Per-author commits, lines added/removed, files modified\n\
- detect_freelancers: Flag short-lived, low-volume, now-dormant contributors";

#[tool_handler]
impl ServerHandler for PulseServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "repopulse".to_string(),
                title: Some("repopulse repository analytics".to_string()),
                version: env!("CARGO_PKG_VERSION").to_string(),
                description: Some(
                    "Contributor activity and freelance-pattern detection for GitHub".to_string(),
                ),
                icons: None,
                website_url: None,
            },
            instructions: Some(SERVER_INSTRUCTIONS.to_string()),
        }
    }
}

/// Start the MCP server on stdio transport.
///
/// This is called by the `repopulse mcp` CLI subcommand. It blocks until
/// the client closes stdin.
///
/// # Errors
///
/// Returns [`PulseError`] if the server fails to initialize or encounters
/// a transport error.
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use repopulse_core::PulseConfig;
/// use repopulse_github::client::GitHubClient;
/// use repopulse_github::service::ActivityService;
///
/// # async fn example() -> Result<(), repopulse_core::PulseError> {
/// let config = PulseConfig::default();
/// let client = GitHubClient::new(&config.resolve_token(None)?, &config.github)?;
/// let service = Arc::new(ActivityService::new(client, &config));
/// repopulse_mcp::server::run_server(service).await?;
/// # Ok(())
/// # }
/// ```
pub async fn run_server(service: Arc<ActivityService<GitHubClient>>) -> Result<(), PulseError> {
    let server = PulseServer::new(service);
    let running = server
        .serve(stdio())
        .await
        .map_err(|e| PulseError::Config(format!("MCP server failed to start: {e}")))?;

    running
        .waiting()
        .await
        .map_err(|e| PulseError::Config(format!("MCP server error: {e}")))?;

    Ok(())
}
