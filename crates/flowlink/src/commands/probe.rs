//! Probe command - find which candidate host answers.

use anyhow::Result;
use clap::Args;
use console::Style;
use flowlink_mcp::{McpTransport, Prober};

use super::Context;

/// Arguments for the probe command.
#[derive(Args, Debug)]
pub struct ProbeArgs {
    /// Probe every candidate instead of stopping at the first answer
    #[arg(short, long)]
    pub all: bool,
}

/// Run the probe command.
pub async fn run(args: ProbeArgs, ctx: &Context) -> Result<()> {
    let transport = ctx.transport()?;
    let prober = ctx.prober();

    if !args.all {
        let base_url = prober.probe(&transport).await?;
        if ctx.json_output {
            let output = serde_json::json!({ "base_url": base_url });
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else {
            println!("{}", base_url);
        }
        return Ok(());
    }

    let results = probe_each(&prober, &transport).await;

    if ctx.json_output {
        let output: Vec<_> = results
            .iter()
            .map(|(url, outcome)| match outcome {
                Ok(status) => serde_json::json!({ "url": url, "status": status }),
                Err(e) => serde_json::json!({ "url": url, "error": e }),
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    let green = Style::new().green();
    let red = Style::new().red();

    println!("{:<36} RESULT", "CANDIDATE");
    println!("{}", "-".repeat(72));
    for (url, outcome) in &results {
        match outcome {
            Ok(status) => println!("{:<36} {}", url, green.apply_to(format!("HTTP {}", status))),
            Err(e) => println!("{:<36} {}", url, red.apply_to(e)),
        }
    }

    if results.iter().all(|(_, outcome)| outcome.is_err()) {
        anyhow::bail!("no candidate host answered");
    }
    Ok(())
}

async fn probe_each(
    prober: &Prober,
    transport: &dyn McpTransport,
) -> Vec<(String, std::result::Result<u16, String>)> {
    let mut results = Vec::with_capacity(prober.candidates().len());
    for candidate in prober.candidates() {
        let url = candidate.url();
        let outcome = transport.probe(&url).await.map_err(|e| e.to_string());
        results.push((url, outcome));
    }
    results
}
