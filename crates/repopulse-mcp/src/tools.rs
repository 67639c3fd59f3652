//! Tool implementations for the repopulse MCP server.
//!
//! Five tools mirror the `/github` routes: `list_repos`, `list_commits`,
//! `list_contributors`, `analyze_activity`, and `detect_freelancers`. Each
//! runs the route against the shared service and returns its JSON body.

use std::sync::Arc;

use repopulse_github::client::GitHubClient;
use repopulse_github::routes::{execute, ApiResponse, Route};
use repopulse_github::service::ActivityService;
use rmcp::{
    handler::server::{tool::ToolRouter, wrapper::Parameters},
    model::*,
    schemars, tool, tool_router, ErrorData as McpError,
};
use serde::Deserialize;

/// MCP server exposing repopulse analytics tools.
#[derive(Clone)]
pub struct PulseServer {
    pub(crate) service: Arc<ActivityService<GitHubClient>>,
    pub(crate) tool_router: ToolRouter<Self>,
}

// --- Parameter structs ---

/// Parameters for the `list_repos` tool.
#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ListReposParams {
    /// Account whose repositories to list (default: authenticated user).
    pub username: Option<String>,
}

/// Parameters for tools scoped to one repository.
#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct RepoParams {
    /// Repository owner.
    pub username: String,
    /// Repository name.
    pub repo: String,
}

/// Parameters for the `detect_freelancers` tool.
#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct DetectFreelancersParams {
    /// Repository owner.
    pub username: String,
    /// Repository name.
    pub repo: String,
    /// Minimum days since last commit (default: 30).
    pub min_inactive_days: Option<u32>,
    /// Maximum total commits (default: 10).
    pub max_commit_count: Option<u32>,
    /// Maximum days between first and last commit (default: 14).
    pub max_activity_span_days: Option<u32>,
}

fn mcp_err(msg: impl Into<String>) -> McpError {
    McpError::internal_error(msg.into(), None)
}

pub(crate) fn into_tool_result(response: ApiResponse) -> Result<CallToolResult, McpError> {
    if !response.is_success() {
        let detail = response.detail().unwrap_or("request failed").to_string();
        return Err(mcp_err(detail));
    }
    let json = serde_json::to_string_pretty(&response.body).map_err(|e| mcp_err(e.to_string()))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}

#[tool_router]
impl PulseServer {
    /// Create a server over `service`.
    pub fn new(service: Arc<ActivityService<GitHubClient>>) -> Self {
        Self {
            service,
            tool_router: Self::tool_router(),
        }
    }

    pub(crate) fn freelancer_route(&self, params: DetectFreelancersParams) -> Route {
        let defaults = self.service.default_criteria();
        let mut criteria = defaults;
        criteria.min_inactive_days = params
            .min_inactive_days
            .unwrap_or(defaults.min_inactive_days);
        criteria.max_commit_count = params.max_commit_count.unwrap_or(defaults.max_commit_count);
        criteria.max_activity_span_days = params
            .max_activity_span_days
            .unwrap_or(defaults.max_activity_span_days);
        Route::Freelancers {
            username: params.username,
            repo: params.repo,
            criteria,
        }
    }

    #[tool(
        name = "list_repos",
        description = "List GitHub repositories for a user (or the authenticated user) with id, name, description, url, language, and star count."
    )]
    pub async fn list_repos(
        &self,
        Parameters(params): Parameters<ListReposParams>,
    ) -> Result<CallToolResult, McpError> {
        let route = Route::Repositories {
            username: params.username.filter(|u| !u.is_empty()),
        };
        into_tool_result(execute(&self.service, route).await)
    }

    #[tool(
        name = "list_commits",
        description = "List every commit of a GitHub repository with sha, message, author name, and ISO-8601 date."
    )]
    pub async fn list_commits(
        &self,
        Parameters(params): Parameters<RepoParams>,
    ) -> Result<CallToolResult, McpError> {
        let route = Route::Commits {
            username: params.username,
            repo: params.repo,
        };
        into_tool_result(execute(&self.service, route).await)
    }

    #[tool(
        name = "list_contributors",
        description = "List contributors of a GitHub repository with login, contribution count, avatar, and profile URL."
    )]
    pub async fn list_contributors(
        &self,
        Parameters(params): Parameters<RepoParams>,
    ) -> Result<CallToolResult, McpError> {
        let route = Route::Contributors {
            username: params.username,
            repo: params.repo,
        };
        into_tool_result(execute(&self.service, route).await)
    }

    #[tool(
        name = "analyze_activity",
        description = "Aggregate per-author activity for a GitHub repository: commit count, lines added and removed, files modified, and last commit date. Issues one detail request per commit, so large histories take a while."
    )]
    pub async fn analyze_activity(
        &self,
        Parameters(params): Parameters<RepoParams>,
    ) -> Result<CallToolResult, McpError> {
        let route = Route::Analysis {
            username: params.username,
            repo: params.repo,
        };
        into_tool_result(execute(&self.service, route).await)
    }

    #[tool(
        name = "detect_freelancers",
        description = "Flag contributors with a freelance pattern: dormant for at least min_inactive_days, at most max_commit_count commits, and all activity within max_activity_span_days. Returns per-author diagnostics plus total and flagged counts."
    )]
    pub async fn detect_freelancers(
        &self,
        Parameters(params): Parameters<DetectFreelancersParams>,
    ) -> Result<CallToolResult, McpError> {
        let route = self.freelancer_route(params);
        into_tool_result(execute(&self.service, route).await)
    }
}
