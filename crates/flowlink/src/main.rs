//! flowlink - chat bridge to workflow automation over MCP
//!
//! Main entry point for the flowlink CLI.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;

use commands::{ask, call, probe, status, tools};

// ─────────────────────────────────────────────────────────────────────────────
// CLI Structure
// ─────────────────────────────────────────────────────────────────────────────

/// flowlink - chat bridge to workflow automation over MCP
#[derive(Parser)]
#[command(name = "flowlink")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output as JSON (for scripting)
    #[arg(long, global = true)]
    pub json: bool,

    /// Extra config file, applied over the discovered ones
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Webhook URL of the workflow (overrides config and N8N_WEBHOOK_URL)
    #[arg(long, global = true)]
    pub webhook_url: Option<String>,

    /// Extra MCP host to probe, as host, host:port, or URL
    #[arg(long, global = true)]
    pub host: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show connectivity and session status
    Status(status::StatusArgs),

    /// Probe candidate hosts for a reachable server
    Probe(probe::ProbeArgs),

    /// List tools offered by the MCP server
    Tools(tools::ToolsArgs),

    /// Call a tool directly
    Call(call::CallArgs),

    /// Send a query through the bridge
    Ask(ask::AskArgs),
}

// ─────────────────────────────────────────────────────────────────────────────
// Main
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut loaded = flowlink_config::load_config(None, cli.config.as_deref())?;
    if let Some(url) = cli.webhook_url {
        loaded.config.mcp.webhook_url = Some(url);
    }
    if let Some(host) = cli.host {
        loaded.config.mcp.host_override = Some(host);
    }

    // Initialize tracing: console (human-readable) + rotating JSON file
    let filter = if cli.verbose {
        "flowlink=debug,flowlink_mcp=debug,flowlink_agent=debug,flowlink_config=debug,info"
    } else {
        "flowlink=info,flowlink_mcp=info,flowlink_agent=info,flowlink_config=info,warn"
    };

    let log_dir = flowlink_config::log_dir(&loaded.config).unwrap_or_else(|| PathBuf::from("logs"));
    let mut log_file_error = None;
    let file_appender = if loaded.config.logging.file {
        tracing_appender::rolling::RollingFileAppender::builder()
            .rotation(tracing_appender::rolling::Rotation::DAILY)
            .filename_prefix("flowlink")
            .filename_suffix("log")
            .build(&log_dir)
            .map_err(|e| log_file_error = Some(e))
            .ok()
    } else {
        None
    };
    let (file_layer, _guard) = match file_appender {
        Some(appender) => {
            let (non_blocking, guard) = tracing_appender::non_blocking(appender);
            (Some(non_blocking), Some(guard))
        }
        None => (None, None),
    };

    use tracing_subscriber::prelude::*;
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_writer(std::io::stderr)
                .with_filter(tracing_subscriber::EnvFilter::new(filter)),
        )
        .with(file_layer.map(|writer| {
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(writer)
                .with_filter(tracing_subscriber::EnvFilter::new(
                    "flowlink=trace,flowlink_mcp=trace,flowlink_agent=trace,flowlink_config=trace,info",
                ))
        }))
        .init();

    if let Some(e) = log_file_error {
        tracing::warn!(dir = %log_dir.display(), error = %e, "file logging disabled");
    }
    for warning in &loaded.warnings {
        tracing::warn!("{}", warning);
    }
    if !loaded.env_overrides.is_empty() {
        tracing::debug!(vars = ?loaded.env_overrides, "environment overrides applied");
    }

    // Create context for commands
    let ctx = commands::Context {
        json_output: cli.json,
        verbose: cli.verbose,
        config: loaded.config,
        config_sources: loaded
            .sources
            .iter()
            .filter(|s| s.loaded)
            .map(|s| s.path.clone())
            .collect(),
    };

    // Dispatch to command handlers
    match cli.command {
        Commands::Status(args) => status::run(args, &ctx).await,
        Commands::Probe(args) => probe::run(args, &ctx).await,
        Commands::Tools(args) => tools::run(args, &ctx).await,
        Commands::Call(args) => call::run(args, &ctx).await,
        Commands::Ask(args) => ask::run(args, &ctx).await,
    }
}
