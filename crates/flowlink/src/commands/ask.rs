//! Ask command - send one query through the bridge.

use anyhow::Result;
use clap::Args;

use super::Context;

/// Arguments for the ask command.
#[derive(Args, Debug)]
pub struct AskArgs {
    /// The question or request
    #[arg(required = true)]
    pub query: Vec<String>,
}

/// Run the ask command.
pub async fn run(args: AskArgs, ctx: &Context) -> Result<()> {
    let query = args.query.join(" ");
    let bridge = ctx.bridge()?;

    tracing::debug!(query = %query, "submitting query");
    let reply = bridge.submit_query(&query).await;

    if ctx.json_output {
        let output = serde_json::json!({
            "query": query,
            "reply": reply,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("{}", reply);
    }
    Ok(())
}
