use std::collections::BTreeMap;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};
use miette::{IntoDiagnostic, Result};
use tracing_subscriber::EnvFilter;

use repopulse_activity::{
    aggregate_activity, detect_freelancers, AuthorActivitySummary, CommitSource, DetectionResult,
    FreelanceCriteria, LocalRepository,
};
use repopulse_core::{
    CommitSummary, ContributorInfo, OutputFormat, PulseConfig, RepositoryInfo,
};
use repopulse_github::client::GitHubClient;
use repopulse_github::routes::{execute, ApiResponse, Route};
use repopulse_github::service::ActivityService;

#[derive(Parser)]
#[command(
    name = "repopulse",
    version,
    about = "Contributor activity analytics for GitHub repositories",
    long_about = "repopulse measures who works on a repository and how.\n\n\
                   It aggregates per-author commit counts and line churn, and flags\n\
                   contributors whose history looks like a short freelance engagement.\n\n\
                   Examples:\n  \
                     repopulse repos --username octocat          List repositories\n  \
                     repopulse analysis octocat Hello-World      Per-author activity\n  \
                     repopulse freelancers octocat Hello-World   Freelance-pattern detection\n  \
                     repopulse get /github/repos/octocat/Hello-World/commits\n  \
                     repopulse local --path . --analysis all     Analyze a local clone"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Path to configuration file (default: .repopulse.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(
        long,
        global = true,
        default_value = "text",
        long_help = "Output format for command results.\n\n\
                       Formats:\n  \
                         text      Human-readable tables and summaries (default)\n  \
                         json      Machine-readable JSON, same shape as the route bodies\n  \
                         markdown  GitHub-flavored Markdown"
    )]
    format: OutputFormat,

    /// Enable verbose logging
    #[arg(long, short, global = true)]
    verbose: bool,

    /// When to use colors
    #[arg(long, global = true, default_value = "auto")]
    color: ColorChoice,

    /// GitHub token (overrides config and GITHUB_TOKEN / GH_TOKEN)
    #[arg(long, global = true)]
    github_token: Option<String>,
}

#[derive(Subcommand)]
enum Command {
    /// List repositories of a user
    #[command(long_about = "List repositories of a user.\n\n\
        Without --username, lists the repositories of the authenticated user.\n\n\
        Examples:\n  repopulse repos\n  repopulse repos --username octocat")]
    Repos {
        /// Account whose repositories to list
        #[arg(long)]
        username: Option<String>,
    },
    /// List every commit of a repository
    Commits {
        /// Repository owner
        username: String,
        /// Repository name
        repo: String,
    },
    /// List contributors of a repository
    Contributors {
        /// Repository owner
        username: String,
        /// Repository name
        repo: String,
    },
    /// Aggregate per-author activity for a repository
    #[command(long_about = "Aggregate per-author activity for a repository.\n\n\
        Counts commits per author and sums lines added, lines removed, and files\n\
        modified. Issues one detail request per commit, bounded by\n\
        [fetch] detail_concurrency.\n\n\
        Examples:\n  repopulse analysis octocat Hello-World\n  repopulse analysis octocat Hello-World --format json")]
    Analysis {
        /// Repository owner
        username: String,
        /// Repository name
        repo: String,
    },
    /// Flag contributors with a freelance pattern
    #[command(long_about = "Flag contributors with a freelance pattern.\n\n\
        An author is flagged when they have been inactive for at least\n\
        --min-inactive-days, made at most --max-commit-count commits, and all\n\
        their commits fall within --max-activity-span-days.\n\n\
        Examples:\n  repopulse freelancers octocat Hello-World\n  repopulse freelancers octocat Hello-World --max-commit-count 3")]
    Freelancers {
        /// Repository owner
        username: String,
        /// Repository name
        repo: String,

        #[command(flatten)]
        thresholds: ThresholdArgs,
    },
    /// Resolve a /github route target and print its JSON body
    #[command(long_about = "Resolve a /github route target and print its JSON body.\n\n\
        Accepts the same targets as the HTTP surface. Exits non-zero when the\n\
        response status is not 2xx; the body still carries the detail message.\n\n\
        Examples:\n  repopulse get /github/repos?username=octocat\n  repopulse get '/github/repos/octocat/Hello-World/freelancers?max_commit_count=5'")]
    Get {
        /// Request target, e.g. /github/repos/octocat/Hello-World/analysis
        target: String,
    },
    /// Analyze a local git repository
    #[command(long_about = "Analyze a local git repository.\n\n\
        Reads history with libgit2 instead of the GitHub API. No token is needed.\n\n\
        Examples:\n  repopulse local --path .\n  repopulse local --analysis freelancers --min-inactive-days 60")]
    Local {
        /// Repository path (default: current directory)
        #[arg(long, default_value = ".")]
        path: PathBuf,

        /// Branch to walk (default: HEAD)
        #[arg(long)]
        branch: Option<String>,

        /// Analysis type
        #[arg(long, default_value = "all")]
        analysis: LocalAnalysis,

        #[command(flatten)]
        thresholds: ThresholdArgs,
    },
    /// Start the MCP server on stdio
    Mcp,
    /// Create a default .repopulse.toml configuration file
    #[command(long_about = "Create a default .repopulse.toml configuration file.\n\n\
        Generates a commented-out template with all available options.\n\
        Fails if .repopulse.toml already exists.")]
    Init,
    /// Generate shell completion scripts
    #[command(hide = true)]
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Args)]
struct ThresholdArgs {
    /// Minimum days since the last commit (default: [freelance] min_inactive_days)
    #[arg(long)]
    min_inactive_days: Option<u32>,
    /// Maximum total commits (default: [freelance] max_commit_count)
    #[arg(long)]
    max_commit_count: Option<u32>,
    /// Maximum days between first and last commit (default: [freelance] max_activity_span_days)
    #[arg(long)]
    max_activity_span_days: Option<u32>,
}

impl ThresholdArgs {
    fn criteria(&self, config: &PulseConfig) -> FreelanceCriteria {
        let defaults = FreelanceCriteria::from(&config.freelance);
        FreelanceCriteria {
            min_inactive_days: self.min_inactive_days.unwrap_or(defaults.min_inactive_days),
            max_commit_count: self.max_commit_count.unwrap_or(defaults.max_commit_count),
            max_activity_span_days: self
                .max_activity_span_days
                .unwrap_or(defaults.max_activity_span_days),
        }
    }
}

#[derive(Clone, ValueEnum)]
enum LocalAnalysis {
    /// Per-author commit counts and churn
    Activity,
    /// Freelance-pattern detection
    Freelancers,
    /// Run all analyses
    All,
}

#[derive(Clone, PartialEq, Eq, ValueEnum)]
enum ColorChoice {
    /// Auto-detect based on terminal
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

fn print_welcome(use_color: bool) {
    let version = env!("CARGO_PKG_VERSION");
    let (bold, cyan, green, reset) = if use_color {
        ("\x1b[1m", "\x1b[36m", "\x1b[32m", "\x1b[0m")
    } else {
        ("", "", "", "")
    };

    println!("{bold}repopulse{reset} v{version}: contributor activity analytics\n");

    println!("Quick start:");
    println!("  {cyan}repopulse init{reset}                         Create a .repopulse.toml config file");
    println!("  {cyan}repopulse analysis <owner> <repo>{reset}      Per-author activity on GitHub");
    println!("  {cyan}repopulse local --path .{reset}               Analyze a local clone\n");

    println!("All commands:");
    println!("  {green}repos{reset}         List repositories");
    println!("  {green}commits{reset}       List commits of a repository");
    println!("  {green}contributors{reset}  List contributors of a repository");
    println!("  {green}analysis{reset}      Per-author commits and churn");
    println!("  {green}freelancers{reset}   Freelance-pattern detection");
    println!("  {green}get{reset}           Resolve a /github route target");
    println!("  {green}local{reset}         Analyze a local git repository");
    println!("  {green}mcp{reset}           Start MCP server for IDE integration");
    println!("  {green}init{reset}          Create default configuration\n");

    println!("Run 'repopulse <command> --help' for details.");
}

fn init_tracing(verbose: bool) {
    let default = if verbose {
        "warn,repopulse=debug,repopulse_activity=debug,repopulse_github=debug,repopulse_mcp=debug"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn load_config(path: Option<&Path>) -> Result<PulseConfig> {
    let config = match path {
        Some(path) => PulseConfig::from_file(path)?,
        None => {
            let default_path = Path::new(".repopulse.toml");
            if default_path.exists() {
                PulseConfig::from_file(default_path)?
            } else {
                PulseConfig::default()
            }
        }
    };
    Ok(config)
}

fn github_service(
    config: &PulseConfig,
    token: Option<&str>,
) -> Result<ActivityService<GitHubClient>> {
    let token = config.resolve_token(token)?;
    let client = GitHubClient::new(&token, &config.github)?;
    Ok(ActivityService::new(client, config))
}

fn print_json(value: &impl serde::Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value).into_diagnostic()?);
    Ok(())
}

fn print_repositories(repos: &[RepositoryInfo], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => print_json(&repos)?,
        OutputFormat::Markdown => {
            println!("| Repository | Language | Stars | Description |");
            println!("|------------|----------|-------|-------------|");
            for r in repos {
                println!(
                    "| [{}]({}) | {} | {} | {} |",
                    r.full_name,
                    r.url,
                    r.language.as_deref().unwrap_or("-"),
                    r.stars,
                    r.description.as_deref().unwrap_or(""),
                );
            }
        }
        OutputFormat::Text => {
            for r in repos {
                println!(
                    "{:<40} {:>6}  {}",
                    r.full_name,
                    r.stars,
                    r.language.as_deref().unwrap_or("-")
                );
            }
            println!("\n{} repositories", repos.len());
        }
    }
    Ok(())
}

fn print_commits(commits: &[CommitSummary], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => print_json(&commits)?,
        OutputFormat::Markdown => {
            println!("| SHA | Author | Date | Message |");
            println!("|-----|--------|------|---------|");
            for c in commits {
                println!(
                    "| `{}` | {} | {} | {} |",
                    short_sha(&c.sha),
                    c.author.as_deref().unwrap_or("-"),
                    c.date,
                    first_line(&c.message),
                );
            }
        }
        OutputFormat::Text => {
            for c in commits {
                println!(
                    "{}  {:<20} {}  {}",
                    short_sha(&c.sha),
                    c.author.as_deref().unwrap_or("-"),
                    c.date,
                    first_line(&c.message),
                );
            }
            println!("\n{} commits", commits.len());
        }
    }
    Ok(())
}

fn print_contributors(contributors: &[ContributorInfo], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => print_json(&contributors)?,
        OutputFormat::Markdown => {
            println!("| Contributor | Contributions |");
            println!("|-------------|---------------|");
            for c in contributors {
                println!("| [{}]({}) | {} |", c.login, c.profile_url, c.contributions);
            }
        }
        OutputFormat::Text => {
            for c in contributors {
                println!("{:<30} {:>6}", c.login, c.contributions);
            }
            println!("\n{} contributors", contributors.len());
        }
    }
    Ok(())
}

fn print_activity_table(
    contributors: &BTreeMap<String, AuthorActivitySummary>,
    markdown: bool,
) {
    let mut rows: Vec<_> = contributors.iter().collect();
    rows.sort_by(|a, b| b.1.commit_count.cmp(&a.1.commit_count).then(a.0.cmp(b.0)));

    if markdown {
        println!("| Author | Commits | Added | Removed | Files | Last commit |");
        println!("|--------|---------|-------|---------|-------|-------------|");
    } else {
        println!(
            "{:<30} {:>7} {:>9} {:>9} {:>7}  Last commit",
            "Author", "Commits", "Added", "Removed", "Files"
        );
    }
    for (author, s) in rows {
        let last = s
            .last_commit_date
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "-".into());
        if markdown {
            println!(
                "| {} | {} | {} | {} | {} | {} |",
                author, s.commit_count, s.lines_added, s.lines_removed, s.files_modified, last
            );
        } else {
            println!(
                "{:<30} {:>7} {:>9} {:>9} {:>7}  {}",
                author, s.commit_count, s.lines_added, s.lines_removed, s.files_modified, last
            );
        }
    }
}

fn print_detection_table(result: &DetectionResult, criteria: &FreelanceCriteria, markdown: bool) {
    let summary = format!(
        "{} of {} contributors flagged (inactive >= {}d, commits <= {}, span <= {}d)",
        result.freelancers_count,
        result.total_contributors,
        criteria.min_inactive_days,
        criteria.max_commit_count,
        criteria.max_activity_span_days,
    );
    if markdown {
        println!("**{summary}**\n");
    } else {
        println!("{summary}\n");
    }
    if result.freelancers.is_empty() {
        println!("No freelance-pattern contributors detected.");
        return;
    }

    if markdown {
        println!("| Author | Commits | Span (days) | Active days | Inactive (days) | Commits/day |");
        println!("|--------|---------|-------------|-------------|-----------------|-------------|");
    } else {
        println!(
            "{:<30} {:>7} {:>6} {:>7} {:>9} {:>11}",
            "Author", "Commits", "Span", "Active", "Inactive", "Commits/day"
        );
    }
    for (author, f) in &result.freelancers {
        if markdown {
            println!(
                "| {} | {} | {} | {} | {} | {:.2} |",
                author,
                f.commit_count,
                f.activity_span_days,
                f.activity_days_count,
                f.days_since_last_commit,
                f.commit_frequency
            );
        } else {
            println!(
                "{:<30} {:>7} {:>6} {:>7} {:>9} {:>11.2}",
                author,
                f.commit_count,
                f.activity_span_days,
                f.activity_days_count,
                f.days_since_last_commit,
                f.commit_frequency
            );
        }
    }
}

fn short_sha(sha: &str) -> &str {
    sha.get(..7).unwrap_or(sha)
}

fn first_line(message: &str) -> &str {
    message.lines().next().unwrap_or("")
}

/// Print a route response body and fail on a non-2xx status.
fn finish_response(response: ApiResponse) -> Result<()> {
    print_json(&response.body)?;
    if !response.is_success() {
        miette::bail!(
            "request failed with status {}: {}",
            response.status,
            response.detail().unwrap_or("unknown error")
        );
    }
    Ok(())
}

const DEFAULT_CONFIG: &str = r#"# repopulse configuration

[github]
# Personal access token. GITHUB_TOKEN or GH_TOKEN are used when unset.
# token = "ghp_..."
# API root override, e.g. for GitHub Enterprise.
# api_url = "https://github.example.com/api/v3"
# per_page = 100

[fetch]
# Concurrent commit detail requests during activity analysis.
# detail_concurrency = 8
# Whole-request timeout in seconds. 0 disables it.
# request_timeout_secs = 300

[freelance]
# min_inactive_days = 30
# max_commit_count = 10
# max_activity_span_days = 14
"#;

#[tokio::main]
async fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .build(),
        )
    }))
    .into_diagnostic()?;
    human_panic::setup_panic!();

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = load_config(cli.config.as_deref())?;
    let token = cli.github_token.as_deref();

    let use_color = match cli.color {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => std::io::stdout().is_terminal() && std::env::var("NO_COLOR").is_err(),
    };

    tracing::debug!(format = %cli.format, "configuration loaded");

    match cli.command {
        None => print_welcome(use_color),
        Some(Command::Repos { ref username }) => {
            let service = github_service(&config, token)?;
            let repos = service.list_repositories(username.as_deref()).await?;
            print_repositories(&repos, cli.format)?;
        }
        Some(Command::Commits {
            ref username,
            ref repo,
        }) => {
            let service = github_service(&config, token)?;
            let commits = service.list_commits(Some(username.as_str()), repo).await?;
            print_commits(&commits, cli.format)?;
        }
        Some(Command::Contributors {
            ref username,
            ref repo,
        }) => {
            let service = github_service(&config, token)?;
            let contributors = service.list_contributors(Some(username.as_str()), repo).await?;
            print_contributors(&contributors, cli.format)?;
        }
        Some(Command::Analysis {
            ref username,
            ref repo,
        }) => {
            let service = github_service(&config, token)?;
            eprintln!("Analyzing {username}/{repo}...");
            let report = service.analyze_activity(Some(username.as_str()), repo).await?;
            match cli.format {
                OutputFormat::Json => print_json(&report)?,
                OutputFormat::Markdown => {
                    println!("# Contributor Activity: {username}/{repo}\n");
                    print_activity_table(&report.contributors, true);
                }
                OutputFormat::Text => print_activity_table(&report.contributors, false),
            }
        }
        Some(Command::Freelancers {
            ref username,
            ref repo,
            ref thresholds,
        }) => {
            let service = github_service(&config, token)?;
            let criteria = thresholds.criteria(&config);
            let result = service
                .detect_freelancers(Some(username.as_str()), repo, Some(criteria))
                .await?;
            match cli.format {
                OutputFormat::Json => print_json(&result)?,
                OutputFormat::Markdown => {
                    println!("# Freelance Contributors: {username}/{repo}\n");
                    print_detection_table(&result, &criteria, true);
                }
                OutputFormat::Text => print_detection_table(&result, &criteria, false),
            }
        }
        Some(Command::Get { ref target }) => {
            let defaults = FreelanceCriteria::from(&config.freelance);
            let response = match Route::parse(target, &defaults) {
                Ok(route) => {
                    let service = github_service(&config, token)?;
                    execute(&service, route).await
                }
                Err(err) => ApiResponse::rejected(err),
            };
            finish_response(response)?;
        }
        Some(Command::Local {
            ref path,
            ref branch,
            ref analysis,
            ref thresholds,
        }) => {
            let repository = LocalRepository::open(path, branch.clone()).map_err(|e| {
                miette::miette!(
                    help = "Run repopulse from inside a git repository, or specify --path to one",
                    "{e}"
                )
            })?;

            eprintln!("Reading git history at {}...", path.display());
            let commits = repository.list_commits().await?;
            eprintln!("Read {} commits.", commits.len());

            let show_activity = matches!(analysis, LocalAnalysis::All | LocalAnalysis::Activity);
            let show_freelancers =
                matches!(analysis, LocalAnalysis::All | LocalAnalysis::Freelancers);

            let activity = if show_activity {
                Some(aggregate_activity(&repository, &commits, config.fetch.concurrency()).await)
            } else {
                None
            };
            let criteria = thresholds.criteria(&config);
            let detection = show_freelancers
                .then(|| detect_freelancers(&commits, &criteria, Utc::now()));

            match cli.format {
                OutputFormat::Json => {
                    let mut json = serde_json::Map::new();
                    json.insert(
                        "commits_analyzed".into(),
                        serde_json::Value::from(commits.len()),
                    );
                    if let Some(contributors) = &activity {
                        json.insert(
                            "contributors".into(),
                            serde_json::to_value(contributors).into_diagnostic()?,
                        );
                    }
                    if let Some(result) = &detection {
                        json.insert(
                            "freelancers".into(),
                            serde_json::to_value(result).into_diagnostic()?,
                        );
                    }
                    print_json(&serde_json::Value::Object(json))?;
                }
                OutputFormat::Markdown => {
                    println!("# Local Repository Analysis\n");
                    println!("**Commits analyzed:** {}\n", commits.len());
                    if let Some(contributors) = &activity {
                        println!("## Contributor Activity\n");
                        print_activity_table(contributors, true);
                        println!();
                    }
                    if let Some(result) = &detection {
                        println!("## Freelance Contributors\n");
                        print_detection_table(result, &criteria, true);
                    }
                }
                OutputFormat::Text => {
                    if let Some(contributors) = &activity {
                        println!("Contributor activity\n");
                        print_activity_table(contributors, false);
                        println!();
                    }
                    if let Some(result) = &detection {
                        println!("Freelance contributors\n");
                        print_detection_table(result, &criteria, false);
                    }
                }
            }
        }
        Some(Command::Mcp) => {
            let service = github_service(&config, token)?;
            repopulse_mcp::server::run_server(Arc::new(service)).await?;
        }
        Some(Command::Init) => {
            let path = Path::new(".repopulse.toml");
            if path.exists() {
                miette::bail!(".repopulse.toml already exists");
            }
            std::fs::write(path, DEFAULT_CONFIG).into_diagnostic()?;
            println!("Created .repopulse.toml with default configuration");
        }
        Some(Command::Completions { shell }) => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "repopulse", &mut std::io::stdout());
        }
    }

    Ok(())
}
