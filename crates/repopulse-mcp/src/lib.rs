//! MCP server interface exposing repopulse analytics to IDEs and agents.
//!
//! Implements a Model Context Protocol server using rmcp that exposes
//! `list_repos`, `list_commits`, `list_contributors`, `analyze_activity`,
//! and `detect_freelancers` over stdio transport.

pub mod server;
pub mod tools;
