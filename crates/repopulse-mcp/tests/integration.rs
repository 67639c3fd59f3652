use std::sync::Arc;

use repopulse_core::PulseConfig;
use repopulse_github::client::GitHubClient;
use repopulse_github::service::ActivityService;
use repopulse_mcp::tools::PulseServer;
use rmcp::ServerHandler;

fn test_server() -> PulseServer {
    let config = PulseConfig::default();
    let client = GitHubClient::new("test-token", &config.github).unwrap();
    PulseServer::new(Arc::new(ActivityService::new(client, &config)))
}

#[tokio::test]
async fn server_info_is_correct() {
    let server = test_server();
    let info = server.get_info();

    assert_eq!(info.server_info.name, "repopulse");
    assert_eq!(info.server_info.version, env!("CARGO_PKG_VERSION"));
    let instructions = info.instructions.unwrap();
    for tool in [
        "list_repos",
        "list_commits",
        "list_contributors",
        "analyze_activity",
        "detect_freelancers",
    ] {
        assert!(instructions.contains(tool), "instructions missing {tool}");
    }
}

#[tokio::test]
async fn server_advertises_tools_capability() {
    let info = test_server().get_info();
    assert!(info.capabilities.tools.is_some());
}
