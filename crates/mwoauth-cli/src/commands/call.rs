//! Call command - signed API requests.

use anyhow::{Result, bail};
use clap::Args;
use mwoauth::{ApiInvoker, ParamMap};

use super::{Context, print_json};

/// Arguments for the call command.
#[derive(Args, Debug)]
pub struct CallArgs {
    /// API parameter as name=value (repeatable), POSTed to the API URL
    #[arg(short, long = "param", value_name = "NAME=VALUE", value_parser = parse_param)]
    pub params: Vec<(String, String)>,

    /// Signed GET of this URL instead of a POST
    #[arg(long, value_name = "URL", conflicts_with = "params")]
    pub get: Option<String>,
}

fn parse_param(raw: &str) -> std::result::Result<(String, String), String> {
    match raw.split_once('=') {
        Some((name, value)) if !name.is_empty() => Ok((name.to_string(), value.to_string())),
        _ => Err(format!("expected NAME=VALUE, got '{}'", raw)),
    }
}

/// Run the call command.
pub async fn run(args: CallArgs, ctx: &Context) -> Result<()> {
    let store = ctx.token_store();
    let invoker = ApiInvoker::from_store(ctx.client()?, &store).await?;

    let reply = match args.get {
        Some(url) => invoker.get(&url).await?,
        None => {
            if args.params.is_empty() {
                bail!("nothing to send; pass --param NAME=VALUE or --get URL");
            }
            let mut params: ParamMap = args.params.into_iter().collect();
            params
                .entry("format".to_string())
                .or_insert_with(|| "json".to_string());
            invoker.call(&params).await?
        }
    };

    if ctx.json_output {
        println!("{}", serde_json::to_string(&reply)?);
        return Ok(());
    }
    print_json(&reply)
}
