//! Status command - shows reachability and MCP session state.

use anyhow::Result;
use clap::Args;
use console::{Style, style};

use super::Context;

/// Arguments for the status command.
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Run the MCP handshake and load tools before reporting
    #[arg(short, long)]
    pub connect: bool,
}

/// Run the status command.
pub async fn run(args: StatusArgs, ctx: &Context) -> Result<()> {
    let bridge = ctx.bridge()?;

    let outcome = if args.connect {
        bridge.connect().await.map(|()| None)
    } else {
        bridge.probe().await.map(Some)
    };
    let status = bridge.status().await;
    let (base_url, connect_error) = match outcome {
        Ok(probed) => (probed.or_else(|| status.base_url.clone()), None),
        Err(e) => (None, Some(e)),
    };
    let reachable = connect_error.is_none();

    if ctx.json_output {
        let output = serde_json::json!({
            "reachable": reachable,
            "base_url": base_url,
            "error": connect_error.as_ref().map(ToString::to_string),
            "session": status,
            "config_files": ctx.config_sources,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    let green = Style::new().green();
    let red = Style::new().red();
    let dim = Style::new().dim();

    println!();
    println!("{}", style("flowlink Status").bold());
    println!("{}", dim.apply_to("─".repeat(40)));
    println!();

    if reachable {
        println!("  {} {}", dim.apply_to("Server:"), green.apply_to("● reachable"));
    } else {
        println!("  {} {}", dim.apply_to("Server:"), red.apply_to("● unreachable"));
    }
    println!("  {} {}", dim.apply_to("Session:"), status.state);
    if let Some(url) = &base_url {
        println!("  {} {}", dim.apply_to("Base URL:"), url);
    }
    println!("  {} {}", dim.apply_to("Endpoint:"), status.endpoint_path);

    if args.connect && reachable {
        if let Some(server) = &status.server {
            println!("  {} {} {}", dim.apply_to("MCP server:"), server.name, server.version);
        }
        println!("  {} {}", dim.apply_to("Tools:"), status.tool_count);
        if let Some(prefix) = &status.session_id_prefix {
            println!("  {} {}...", dim.apply_to("Session id:"), prefix);
        }
    }
    println!("  {} {}", dim.apply_to("Model:"), status.model);

    if ctx.verbose {
        println!();
        println!("{}", dim.apply_to("─".repeat(40)));
        println!();
        if ctx.config_sources.is_empty() {
            println!("  {} (defaults only)", dim.apply_to("Config:"));
        }
        for path in &ctx.config_sources {
            println!("  {} {}", dim.apply_to("Config:"), path.display());
        }
    }

    if let Some(e) = connect_error {
        println!();
        println!("  {} {}", dim.apply_to("Error:"), e);
        println!();
        println!(
            "  {}",
            dim.apply_to("Check that the workflow server is running, or pass --host")
        );
    }
    println!();

    Ok(())
}
