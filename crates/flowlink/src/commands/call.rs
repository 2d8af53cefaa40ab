//! Call command - run one tool directly, without the model.

use anyhow::Result;
use clap::Args;
use serde_json::{Map, Value};

use super::Context;

/// Arguments for the call command.
#[derive(Args, Debug)]
pub struct CallArgs {
    /// Name of the tool to call
    pub tool: String,

    /// Arguments as a JSON object
    #[arg(short, long, default_value = "{}")]
    pub args: String,
}

/// Run the call command.
pub async fn run(args: CallArgs, ctx: &Context) -> Result<()> {
    let arguments = parse_arguments(&args.args)?;
    let bridge = ctx.bridge()?;

    let output = bridge.call_tool(&args.tool, arguments).await?;

    if ctx.json_output {
        let result = serde_json::json!({
            "tool": args.tool,
            "output": output,
        });
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!("{}", output);
    }
    Ok(())
}

fn parse_arguments(raw: &str) -> Result<Map<String, Value>> {
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(anyhow::anyhow!("--args must be a JSON object")),
        Err(e) => Err(anyhow::anyhow!("--args is not valid JSON: {}", e)),
    }
}
