//! ownerscount command-line tool.
//!
//! Counts the distinct reviewers and approvers of a SIG, working group or
//! committee, and provides subcommands for generating and validating the
//! configuration file.

mod style;

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use comfy_table::{presets::UTF8_FULL, Cell, CellAlignment, ContentArrangement, Table};
use tracing::info;
use tracing_subscriber::EnvFilter;

use ownerscount_core::config::AppConfig;
use ownerscount_core::counter::{plan, repositories, CountReport, OwnersCounter};
use ownerscount_core::git::{GitHubClient, RepoRef, Workspace};
use ownerscount_core::identity::IdentityValidator;
use ownerscount_core::registry::{validate_group_name, Registry};

// ---------------------------------------------------------------------------
// CLI argument definitions
// ---------------------------------------------------------------------------

/// Count the reviewers and approvers of a Kubernetes community group.
#[derive(Parser, Debug)]
#[command(
    name = "ownerscount",
    version,
    about = "Count distinct OWNERS reviewers and approvers for a SIG, WG or committee"
)]
struct Cli {
    /// Path to the TOML configuration file. Defaults apply when it is absent.
    #[arg(short, long, global = true, default_value = "ownerscount.toml")]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error). Overrides the config file;
    /// RUST_LOG overrides both.
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Count the reviewers and approvers of a group.
    Count(CountArgs),

    /// Generate a default configuration file.
    Init {
        /// Output path for the generated config file.
        #[arg(short, long, default_value = "./ownerscount.toml")]
        output: PathBuf,
    },

    /// Validate a configuration file.
    Validate,
}

#[derive(Args, Debug)]
struct CountArgs {
    /// Group directory name, e.g. `sig-node`, `wg-batch`, `committee-steering`.
    group: String,

    /// Path to the group registry (`sigs.yaml`). Overrides `registry.path`.
    #[arg(long)]
    sigs: Option<PathBuf>,

    /// Keep checkouts in this directory and reuse them on later runs.
    /// A temporary directory is used and removed otherwise.
    #[arg(long)]
    checkout_dir: Option<PathBuf>,

    /// Also print every counted account.
    #[arg(long)]
    list: bool,

    /// Print the full report as JSON.
    #[arg(long, conflicts_with = "list")]
    json: bool,
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(&cli);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", style::error(&format!("Error: {:#}", e)));
            ExitCode::FAILURE
        }
    }
}

/// Logs go to stderr so stdout stays parseable.
fn init_tracing(cli: &Cli) {
    let level = cli.log_level.clone().unwrap_or_else(|| {
        AppConfig::load_or_default(&cli.config)
            .map(|c| c.output.log_level)
            .unwrap_or_else(|_| "warn".into())
    });
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Count(args) => cmd_count(&cli.config, args).await,
        Commands::Init { output } => cmd_init(&output),
        Commands::Validate => cmd_validate(&cli.config),
    }
}

// ---------------------------------------------------------------------------
// Subcommand implementations
// ---------------------------------------------------------------------------

async fn cmd_count(config_path: &Path, args: CountArgs) -> Result<()> {
    validate_group_name(&args.group)?;

    let config =
        AppConfig::load_and_resolve(config_path).context("failed to load configuration")?;
    let token = config
        .require_token()
        .context("a GitHub token is required to validate account names")?
        .to_string();

    let registry_path = args.sigs.as_deref().unwrap_or(&config.registry.path);
    let registry = Registry::load(registry_path)
        .with_context(|| format!("failed to load registry {}", registry_path.display()))?;
    let urls = registry.owners_roots(&args.group)?;
    let roots = plan(&urls);
    if roots.is_empty() {
        eprintln!(
            "{}",
            style::warn(&format!("{} declares no usable owners roots", args.group))
        );
    }

    let canonical = RepoRef::from_slug(&config.repos.canonical)
        .context("repos.canonical must be in 'org/repo' format")?;
    let extra = config.repos.fetch_canonical.then_some(&canonical);
    let repos = repositories(&roots, extra);

    let workspace = match &args.checkout_dir {
        Some(dir) => Workspace::at(dir),
        None => Workspace::temporary(),
    }
    .context("failed to set up checkout workspace")?;

    let summary = workspace.prepare(&repos, &config);
    info!(
        cloned = summary.cloned.len(),
        reused = summary.reused.len(),
        failed = summary.failed.len(),
        "workspace ready"
    );
    for (repo, reason) in &summary.failed {
        eprintln!(
            "{}",
            style::warn(&format!("could not check out {}: {}", repo, reason))
        );
    }

    let github = GitHubClient::new(
        &config.github.api_url,
        token,
        Duration::from_secs(config.github.timeout_secs),
    )
    .context("failed to create GitHub client")?;
    let counter = OwnersCounter::new(&config, IdentityValidator::new(github))?;
    let report = counter.run(&roots, workspace.root()).await;

    print_diagnostics(&report);

    if args.json {
        let json = serde_json::to_string_pretty(&report).context("failed to encode report")?;
        println!("{}", json);
        return Ok(());
    }

    println!("Reviewers: {}", report.membership.reviewer_count());
    println!("Approvers: {}", report.membership.approver_count());
    if args.list {
        println!();
        println!("{}", member_table(&report));
    }

    Ok(())
}

fn print_diagnostics(report: &CountReport) {
    for skipped in &report.roots_skipped {
        eprintln!(
            "{}",
            style::warn(&format!("skipped {}: {}", skipped.url, skipped.reason))
        );
    }
    if report.files_skipped > 0 {
        eprintln!(
            "{}",
            style::warn(&format!(
                "{} OWNERS file(s) could not be parsed",
                report.files_skipped
            ))
        );
    }
    for entity in &report.membership.unresolved {
        eprintln!(
            "{}",
            style::warn(&format!(
                "unresolved {} '{}': {}",
                entity.role, entity.entity, entity.reason
            ))
        );
    }
}

/// One row per counted account, marking the roles it holds.
fn member_table(report: &CountReport) -> Table {
    let membership = &report.membership;
    let everyone: BTreeSet<&String> = membership
        .reviewers
        .iter()
        .chain(membership.approvers.iter())
        .collect();

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Account", "Reviewer", "Approver"]);

    let mark = |held: bool| {
        Cell::new(if held { "✓" } else { "" }).set_alignment(CellAlignment::Center)
    };
    for name in everyone {
        table.add_row(vec![
            Cell::new(name),
            mark(membership.reviewers.contains(name)),
            mark(membership.approvers.contains(name)),
        ]);
    }
    table
}

const DEFAULT_CONFIG: &str = r#"# ownerscount configuration
# Every key is optional; the values below are the defaults.

[github]
api_url = "https://api.github.com"
# git_base_url = "https://github.com"
token_env = "GITHUB_TOKEN"
timeout_secs = 30

[registry]
# Path to the community repository's sigs.yaml
path = "sigs.yaml"

[repos]
# Repository whose OWNERS_ALIASES backs every other repository
canonical = "kubernetes/kubernetes"
fetch_canonical = true
clone_depth = 1

[owners]
owners_file = "OWNERS"
aliases_file = "OWNERS_ALIASES"
exclude = ["vendor/**", "**/vendor/**"]

[output]
log_level = "info"
"#;

fn cmd_init(output: &Path) -> Result<()> {
    if output.exists() {
        anyhow::bail!(
            "file already exists: {}. Use a different path or remove the existing file.",
            output.display()
        );
    }

    std::fs::write(output, DEFAULT_CONFIG).context("failed to write config file")?;

    println!(
        "{}",
        style::success(&format!(
            "Default configuration written to {}",
            output.display()
        ))
    );
    println!();
    println!("Next steps:");
    println!("  1. Point registry.path at a checkout of kubernetes/community's sigs.yaml");
    println!("  2. Export GITHUB_TOKEN (or the variable named by github.token_env)");
    println!(
        "  3. Validate with: ownerscount validate --config {}",
        output.display()
    );
    println!(
        "  4. Count a group: ownerscount --config {} count sig-node",
        output.display()
    );

    Ok(())
}

fn cmd_validate(config_path: &Path) -> Result<()> {
    println!(
        "{}",
        style::header(&format!("Validating configuration: {}", config_path.display()))
    );
    println!();

    let mut config =
        AppConfig::load_from_file(config_path).context("failed to parse configuration")?;
    println!("  {}", style::success("TOML structure is valid"));

    config
        .resolve_env_vars()
        .context("failed to resolve environment variables")?;
    println!("  {}", style::success("Environment variable references processed"));

    if let Err(e) = config.validate() {
        println!("  {}", style::error(&format!("Validation error: {}", e)));
        anyhow::bail!("configuration validation failed");
    }
    println!("  {}", style::success("All fields are valid"));

    let registry_state = if config.registry.path.is_file() {
        "found".to_string()
    } else {
        style::warn("not found")
    };

    println!();
    println!("Configuration summary:");
    println!("  GitHub API    : {}", config.github.api_url);
    println!(
        "  GitHub token  : {}",
        if config.github.token.is_some() {
            "set".to_string()
        } else {
            format!("NOT SET ({})", config.github.token_env)
        }
    );
    println!(
        "  Registry      : {} ({})",
        config.registry.path.display(),
        registry_state
    );
    println!("  Canonical repo: {}", config.repos.canonical);
    println!("  Clone depth   : {}", config.repos.clone_depth);
    println!(
        "  Excludes      : {}",
        style::dim(&config.owners.exclude.join(", "))
    );
    println!();
    println!("Configuration is valid.");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use ownerscount_core::resolve::{Membership, Role, UnresolvedEntity};

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_count_args() {
        let cli = Cli::parse_from([
            "ownerscount",
            "--log-level",
            "debug",
            "count",
            "sig-node",
            "--sigs",
            "community/sigs.yaml",
            "--list",
        ]);
        assert_eq!(cli.log_level.as_deref(), Some("debug"));
        assert_eq!(cli.config, PathBuf::from("ownerscount.toml"));
        match cli.command {
            Commands::Count(args) => {
                assert_eq!(args.group, "sig-node");
                assert_eq!(args.sigs, Some(PathBuf::from("community/sigs.yaml")));
                assert!(args.list);
                assert!(!args.json);
                assert!(args.checkout_dir.is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_json_and_list_conflict() {
        let result = Cli::try_parse_from(["ownerscount", "count", "sig-node", "--list", "--json"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_default_config_template_parses_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ownerscount.toml");
        cmd_init(&path).unwrap();

        let config = AppConfig::load_from_file(&path).unwrap();
        let defaults = AppConfig::default();
        assert_eq!(config.github.api_url, defaults.github.api_url);
        assert_eq!(config.github.token_env, defaults.github.token_env);
        assert_eq!(config.repos.canonical, defaults.repos.canonical);
        assert_eq!(config.owners.exclude, defaults.owners.exclude);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_init_refuses_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ownerscount.toml");
        std::fs::write(&path, "# mine").unwrap();
        assert!(cmd_init(&path).is_err());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "# mine");
    }

    #[test]
    fn test_member_table_rows() {
        let report = CountReport {
            membership: Membership {
                reviewers: ["alice", "bob"].iter().map(|s| s.to_string()).collect(),
                approvers: ["bob", "carol"].iter().map(|s| s.to_string()).collect(),
                unresolved: vec![UnresolvedEntity {
                    entity: "ghost".into(),
                    role: Role::Reviewer,
                    reason: "no alias and no such account".into(),
                }],
            },
            ..Default::default()
        };
        let table = member_table(&report);
        assert_eq!(table.row_iter().count(), 3);
        let rendered = table.to_string();
        assert!(rendered.contains("carol"));
        assert!(!rendered.contains("ghost"));
    }
}
