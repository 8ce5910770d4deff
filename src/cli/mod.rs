//! # Command Line Interface
//!
//! Operator and cron-job entry point over [`CdnGateway`]. Credentials come
//! from `CACHEGATE_<PROVIDER>_<KEY>` environment variables (a `.env` file is
//! honoured), runtime settings from an optional config file.

pub mod output;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::config::GatewaySettings;
use crate::credentials::EnvCredentialStore;
use crate::domain::{ProviderKind, PurgeRequest, StatsWindow};
use crate::observability::init_observability;
use crate::services::CdnGateway;
use output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "cachegate")]
#[command(about = "Purge CDN caches and inspect zones across providers")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Settings file (TOML, YAML or JSON)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Provider to use instead of CACHEGATE_PROVIDER
    #[arg(long, global = true, value_parser = parse_provider)]
    pub provider: Option<ProviderKind>,

    /// Output format
    #[arg(short, long, global = true, value_enum, default_value_t = OutputFormat::Table)]
    pub output: OutputFormat,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check the configured credentials against the provider
    Validate,

    /// Purge the whole zone or a list of URLs
    Purge(PurgeArgs),

    /// List zones visible to the configured credentials
    Zones,

    /// Find the zone id serving a domain
    ResolveZone {
        /// Domain or site URL, e.g. https://www.example.com/
        domain: String,
    },

    /// Show cache analytics
    Stats {
        /// Number of days to report, ending now (at most ten years)
        #[arg(long, default_value_t = 7, value_parser = clap::value_parser!(u32).range(1..=3650))]
        days: u32,
    },
}

#[derive(Args, Debug)]
#[command(group(clap::ArgGroup::new("target").required(true).args(["all", "url"])))]
pub struct PurgeArgs {
    /// Purge everything in the zone
    #[arg(long)]
    pub all: bool,

    /// URL to purge; repeat for several
    #[arg(long = "url", value_name = "URL", num_args = 1..)]
    pub url: Vec<String>,

    /// Retry rate-limited or timed-out chunks this many times
    #[arg(long)]
    pub retries: Option<u32>,
}

fn parse_provider(value: &str) -> Result<ProviderKind, String> {
    value.parse::<ProviderKind>().map_err(|e| e.to_string())
}

/// Run CLI commands
pub async fn run_cli() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            eprintln!("Warning: Error loading .env file: {}", e);
        }
    }

    let mut settings = GatewaySettings::load(cli.config.as_deref())
        .context("Failed to load gateway settings")?;
    if cli.verbose {
        settings.observability.log_level = "debug".to_string();
    }
    init_observability(&settings.observability)?;

    if let Commands::Purge(PurgeArgs { retries: Some(retries), .. }) = &cli.command {
        settings.retry.max_retries = *retries;
    }

    let mut gateway = CdnGateway::new(&settings, Arc::new(EnvCredentialStore::new()));
    if let Some(kind) = cli.provider {
        gateway = gateway.with_provider(kind);
    }
    debug!(command = ?cli.command, provider = ?cli.provider, "running command");

    match cli.command {
        Commands::Validate => {
            gateway.validate().await?;
            println!("Credentials are valid");
        }
        Commands::Purge(args) => handle_purge(&gateway, args, cli.output).await?,
        Commands::Zones => {
            let zones = gateway.list_zones().await?;
            output::print_zones(&zones, cli.output)?;
        }
        Commands::ResolveZone { domain } => {
            let zone_id = gateway.resolve_zone(&domain).await?;
            match cli.output {
                OutputFormat::Table => println!("{}", zone_id),
                format => {
                    let body = serde_json::json!({ "domain": domain, "zone_id": zone_id });
                    if format == OutputFormat::Json {
                        output::print_json(&body)?;
                    } else {
                        output::print_yaml(&body)?;
                    }
                }
            }
        }
        Commands::Stats { days } => {
            let window = StatsWindow::last_days(days)?;
            let stats = gateway.get_stats(&window).await?;
            output::print_stats(&stats, cli.output)?;
        }
    }

    Ok(())
}

/// Ctrl-C stops the run between chunks; the partial result is still printed.
async fn handle_purge(
    gateway: &CdnGateway,
    args: PurgeArgs,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let request = if args.all { PurgeRequest::full() } else { PurgeRequest::urls(args.url) };

    let cancel = CancellationToken::new();
    let watcher = cancel.clone();
    let signal_task = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, stopping after the current chunk");
            watcher.cancel();
        }
    });

    let result = gateway.purge_with_cancel(&request, &cancel).await;
    signal_task.abort();

    output::print_purge_result(&result, format)?;
    match result.error() {
        Some(error) => anyhow::bail!("purge failed: {}", error.message),
        None if !result.success() => anyhow::bail!("purge cancelled before any chunk ran"),
        None => Ok(()),
    }
}
