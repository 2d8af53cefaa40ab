//! Tools command - list the tools the MCP server offers.

use anyhow::Result;
use clap::Args;
use flowlink_mcp::ToolInfo;

use super::Context;

/// Arguments for the tools command.
#[derive(Args, Debug)]
pub struct ToolsArgs {
    /// Show parameters and full input schemas
    #[arg(long)]
    pub full: bool,
}

/// Run the tools command.
pub async fn run(args: ToolsArgs, ctx: &Context) -> Result<()> {
    let bridge = ctx.bridge()?;
    bridge.connect().await?;
    let tools = bridge.tools().await;

    if ctx.json_output {
        print_json(&tools, args.full)?;
    } else {
        print_table(&tools, args.full)?;
    }
    Ok(())
}

fn print_json(tools: &[ToolInfo], full: bool) -> Result<()> {
    let output: Vec<_> = tools
        .iter()
        .map(|tool| {
            let mut entry = serde_json::json!({
                "name": tool.name,
                "description": tool.description,
            });
            if full {
                entry["input_schema"] = tool.input_schema.clone().unwrap_or_default();
            }
            entry
        })
        .collect();
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn print_table(tools: &[ToolInfo], full: bool) -> Result<()> {
    if tools.is_empty() {
        println!("The server offers no tools.");
        return Ok(());
    }

    println!("{:<32} DESCRIPTION", "NAME");
    println!("{}", "-".repeat(80));
    for tool in tools {
        let description = tool.description.as_deref().unwrap_or("-");
        let first_line = description.lines().next().unwrap_or_default();
        println!("{:<32} {}", tool.name, first_line);

        if full {
            let required = tool.required_parameters();
            let params = tool.parameter_names();
            if params.is_empty() {
                println!("  Parameters: (none)");
            } else {
                println!("  Parameters:");
                for param in params {
                    let marker = if required.contains(&param) { "*" } else { "" };
                    println!("    - {}{}", param, marker);
                }
            }
            if let Some(schema) = &tool.input_schema {
                println!("  Schema:");
                for line in serde_json::to_string_pretty(schema)?.lines() {
                    println!("    {}", line);
                }
            }
            println!();
        }
    }
    println!();
    println!("{} tool(s)", tools.len());
    Ok(())
}
