//! memberdesk - review and apply pending changes to membership records.
//!
//! A command line front end over the membership backend: list pending
//! member, billing, invoice and labour changes, inspect what a change would
//! do, approve or decline it, and push member edits as minimal patches.

mod output;

use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde_json::Value;
use tracing::{debug, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use memberdesk_core::changes::ExtractorProfile;
use memberdesk_core::dashboard::{Dashboard, DASHBOARD_REFRESH_INTERVAL};
use memberdesk_core::diff::{compute_diff, DiffSchema};
use memberdesk_core::listing::{list_changes, ChangeSortColumn, ListQuery, DEFAULT_PAGE_SIZE};
use memberdesk_core::models::{ApprovalStatus, ChangeKind, RecordId};
use memberdesk_core::workflow::{ApprovalWorkflow, EditSession};
use memberdesk_core::{ApiClient, Config};

#[derive(Parser)]
#[command(name = "memberdesk")]
#[command(version)]
#[command(about = "Review and apply pending changes to membership records")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List changes of one record family
    Pending(PendingArgs),
    /// Show what a pending change would do
    Review { kind: ChangeKind, id: RecordId },
    /// Approve a pending change
    Approve { kind: ChangeKind, id: RecordId },
    /// Decline a pending change with a reason
    Decline {
        kind: ChangeKind,
        id: RecordId,
        reason: String,
    },
    /// Preview the patch between two member snapshots (offline)
    Diff { original: PathBuf, current: PathBuf },
    /// Load a member, diff it against a JSON file and send the patch
    UpdateMember { id: String, current: PathBuf },
    /// Pending counts and backend health
    Dashboard {
        /// Keep refreshing on an interval
        #[arg(long)]
        watch: bool,
    },
    /// Show or change stored settings
    Config {
        #[arg(long = "backend-url")]
        backend_url: Option<String>,

        #[arg(long)]
        token: Option<String>,
    },
}

#[derive(Args)]
struct PendingArgs {
    /// member, billing, invoice or labour
    kind: ChangeKind,

    /// Match subject id, modifier or changed field names
    #[arg(long, short)]
    search: Option<String>,

    /// pending, approved or declined; "all" shows everything
    #[arg(long, default_value = "pending")]
    status: String,

    /// modified-at, modified-by or subject
    #[arg(long, default_value = "modified-at")]
    sort: ChangeSortColumn,

    /// Sort ascending (newest first otherwise)
    #[arg(long)]
    asc: bool,

    #[arg(long, default_value_t = 1)]
    page: usize,

    #[arg(long = "per-page", default_value_t = DEFAULT_PAGE_SIZE)]
    per_page: usize,
}

impl PendingArgs {
    fn to_query(&self) -> Result<ListQuery> {
        Ok(ListQuery {
            search: self.search.clone().unwrap_or_default(),
            status: parse_status_filter(&self.status)?,
            sort: self.sort,
            ascending: self.asc,
            page: self.page,
            per_page: self.per_page,
        })
    }
}

/// Initialize the tracing subscriber for logging
fn init_tracing() {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    init_tracing();
    let cli = Cli::parse();
    let config = Config::load()?;
    debug!(configured = config.backend_api_url.is_some(), "Configuration loaded");

    match cli.command {
        Commands::Pending(args) => list_pending(&config, args.kind, &args.to_query()?).await,
        Commands::Review { kind, id } => {
            let workflow = load_workflow(&config, kind).await?;
            let changes = workflow.review(&id)?;
            output::print_changes(&changes);
            Ok(())
        }
        Commands::Approve { kind, id } => {
            let mut workflow = load_workflow(&config, kind).await?;
            workflow.approve(&id).await?;
            println!("Approved {} change {}", kind, id);
            Ok(())
        }
        Commands::Decline { kind, id, reason } => {
            let mut workflow = load_workflow(&config, kind).await?;
            workflow.decline(&id, &reason).await?;
            println!("Declined {} change {}", kind, id);
            Ok(())
        }
        Commands::Diff { original, current } => preview_diff(&original, &current),
        Commands::UpdateMember { id, current } => update_member(&config, &id, &current).await,
        Commands::Dashboard { watch } => show_dashboard(&config, watch).await,
        Commands::Config { backend_url, token } => update_config(backend_url, token),
    }
}

fn parse_status_filter(status: &str) -> Result<Option<ApprovalStatus>> {
    if status.trim().eq_ignore_ascii_case("all") {
        return Ok(None);
    }
    status
        .parse::<ApprovalStatus>()
        .map(Some)
        .map_err(anyhow::Error::msg)
}

fn client(config: &Config) -> Result<ApiClient> {
    ApiClient::from_config(config).context("Failed to create API client")
}

async fn load_workflow(config: &Config, kind: ChangeKind) -> Result<ApprovalWorkflow<ApiClient>> {
    let profile = ExtractorProfile::for_kind(kind).with_currency_symbol(config.currency_symbol());
    let mut workflow = ApprovalWorkflow::new(client(config)?, kind).with_profile(profile);
    let count = workflow.refresh().await?;
    info!(kind = %kind, count = count, "Loaded changes");
    Ok(workflow)
}

async fn list_pending(config: &Config, kind: ChangeKind, query: &ListQuery) -> Result<()> {
    let workflow = load_workflow(config, kind).await?;
    let page = list_changes(workflow.queue().records(), kind, query);
    output::print_page(kind, &page);
    Ok(())
}

fn read_json(path: &Path) -> Result<Value> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&contents).with_context(|| format!("Failed to parse {}", path.display()))
}

fn preview_diff(original: &Path, current: &Path) -> Result<()> {
    let original = read_json(original)?;
    let current = read_json(current)?;
    let patch = compute_diff(&original, &current, &DiffSchema::member());
    if !patch.has_changes() {
        println!("No changes detected");
        return Ok(());
    }
    println!("{}", serde_json::to_string_pretty(&patch.into_json())?);
    Ok(())
}

async fn update_member(config: &Config, membership_id: &str, current: &Path) -> Result<()> {
    let current = read_json(current)?;
    let client = client(config)?;
    let mut session = EditSession::member();
    session.load_from(&client, membership_id).await?;
    session.submit(&client, &current).await?;
    println!("Member {} updated", membership_id);
    Ok(())
}

async fn show_dashboard(config: &Config, watch: bool) -> Result<()> {
    let client = client(config)?;
    let mut dashboard = Dashboard::default();

    if !watch {
        let snapshot = dashboard.refresh(&client).await?;
        output::print_dashboard(snapshot);
        return Ok(());
    }

    let mut interval = tokio::time::interval(DASHBOARD_REFRESH_INTERVAL);
    loop {
        tokio::select! {
            _ = interval.tick() => {
                // A failed refresh keeps showing the last snapshot
                if dashboard.refresh(&client).await.is_err() {
                    if let Some(error) = dashboard.last_error() {
                        eprintln!("Refresh failed: {}", error);
                    }
                }
                if let Some(snapshot) = dashboard.snapshot() {
                    output::print_dashboard(snapshot);
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Dashboard watch stopped");
                return Ok(());
            }
        }
    }
}

fn update_config(backend_url: Option<String>, token: Option<String>) -> Result<()> {
    let path = Config::config_path()?;
    // Edit the file itself so environment overrides are not persisted
    let mut config = Config::load_from(&path)?;

    if backend_url.is_none() && token.is_none() {
        output::print_config(&config, &path);
        return Ok(());
    }
    if let Some(url) = backend_url {
        config.backend_api_url = Some(url.trim().to_string());
    }
    if let Some(token) = token {
        config.api_token = Some(token);
    }
    config.save_to(&path)?;
    println!("Saved {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pending_args(args: &[&str]) -> PendingArgs {
        let mut argv = vec!["memberdesk", "pending"];
        argv.extend_from_slice(args);
        match Cli::try_parse_from(argv).expect("arguments should parse").command {
            Commands::Pending(args) => args,
            _ => panic!("expected the pending command"),
        }
    }

    #[test]
    fn test_pending_defaults_match_list_defaults() {
        let args = pending_args(&["member"]);
        assert_eq!(args.kind, ChangeKind::Member);
        assert_eq!(args.to_query().expect("query should build"), ListQuery::default());
    }

    #[test]
    fn test_pending_flags_map_to_query() {
        let args = pending_args(&[
            "billing", "--asc", "--status", "all", "--sort", "subject", "--search", "TSM", "--page", "2",
        ]);
        let query = args.to_query().expect("query should build");
        assert!(query.ascending);
        assert_eq!(query.status, None);
        assert_eq!(query.sort, ChangeSortColumn::Subject);
        assert_eq!(query.search, "TSM");
        assert_eq!(query.page, 2);
    }

    #[test]
    fn test_unknown_status_is_rejected() {
        assert!(pending_args(&["member", "--status", "archived"]).to_query().is_err());
    }
}
