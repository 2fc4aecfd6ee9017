//! Status command - shows configuration and token status.

use anyhow::Result;
use clap::Args;
use console::{Style, style};
use mwoauth::{TokenStage, TokenStore};
use serde::Serialize;

use super::{Context, print_json};

/// Arguments for the status command.
#[derive(Args, Debug)]
pub struct StatusArgs {}

/// Status for JSON output.
#[derive(Debug, Serialize)]
struct StatusOutput {
    endpoint: String,
    consumer_key: Option<String>,
    api_url: Option<String>,
    config_files: Vec<String>,
    token_path: String,
    authorized: bool,
    pending_authorization: bool,
}

/// Run the status command.
pub async fn run(_args: StatusArgs, ctx: &Context) -> Result<()> {
    let config = ctx.config();
    let store = ctx.token_store();

    // A corrupt token file reads as "not authorized" here.
    let authorized = match store.load_token(TokenStage::Access).await {
        Ok(token) => token.is_some(),
        Err(e) => {
            tracing::warn!(error = %e, "Could not read token file");
            false
        }
    };

    let output = StatusOutput {
        endpoint: config.endpoint().to_string(),
        consumer_key: config.consumer_key().ok().map(str::to_string),
        api_url: config.provider().api_url,
        config_files: ctx
            .loaded
            .loaded_from()
            .iter()
            .map(|p| p.display().to_string())
            .collect(),
        token_path: store.token_path(TokenStage::Access).display().to_string(),
        authorized,
        pending_authorization: store.has_token(TokenStage::Request),
    };

    if ctx.json_output {
        return print_json(&output);
    }

    let dim = Style::new().dim();
    println!();
    println!("{}", style("mwoauth Status").bold());
    println!("{}", dim.apply_to("─".repeat(40)));
    println!();
    println!("  {} {}", dim.apply_to("Endpoint:"), output.endpoint);
    println!(
        "  {} {}",
        dim.apply_to("Consumer:"),
        output.consumer_key.as_deref().unwrap_or("(not configured)")
    );
    if let Some(ref api_url) = output.api_url {
        println!("  {} {}", dim.apply_to("API:"), api_url);
    }
    if output.authorized {
        println!("  {} {}", dim.apply_to("Token:"), style("● stored").green());
    } else {
        println!("  {} {}", dim.apply_to("Token:"), style("● none").red());
    }
    if output.pending_authorization {
        println!(
            "  {} {}",
            dim.apply_to("Pending:"),
            style("request token awaiting verifier").yellow()
        );
    }

    if ctx.verbose {
        println!();
        println!("  {} {}", dim.apply_to("Token file:"), output.token_path);
        if output.config_files.is_empty() {
            println!("  {} (none found)", dim.apply_to("Config:"));
        }
        for path in &output.config_files {
            println!("  {} {}", dim.apply_to("Config:"), path);
        }
    }

    if !output.authorized {
        println!();
        println!("  {}", dim.apply_to("Authorize with: mwoauth login"));
    }
    println!();

    Ok(())
}
