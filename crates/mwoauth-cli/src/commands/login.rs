//! Login command - runs the three-legged authorization.

use std::io::Write;
use std::sync::Arc;

use anyhow::Result;
use clap::Args;
use console::style;
use mwoauth::{TokenExchange, TokenStage};
use serde::Serialize;

use super::{Context, print_json};

/// Arguments for the login command.
#[derive(Args, Debug)]
pub struct LoginArgs {
    /// Verification code; prompted for when omitted
    #[arg(long)]
    pub verifier: Option<String>,

    /// Skip the identify call after authorizing
    #[arg(long)]
    pub no_identify: bool,
}

#[derive(Debug, Serialize)]
struct LoginOutput {
    authorized: bool,
    token_path: String,
    username: Option<String>,
}

/// Run the login command.
pub async fn run(args: LoginArgs, ctx: &Context) -> Result<()> {
    let client = ctx.client()?;
    let store = Arc::new(ctx.token_store());
    let mut exchange = TokenExchange::new(client.clone(), store.clone());

    exchange.initiate().await?;
    let url = exchange.authorize_url()?;

    // Prompts go to stderr so --json output stays parseable.
    eprintln!();
    eprintln!("{}", style("MediaWiki OAuth Authorization").bold());
    eprintln!();
    eprintln!("Point your browser to:");
    eprintln!();
    eprintln!("  {}", url);
    eprintln!();

    let verifier = match args.verifier {
        Some(v) => v,
        None => {
            eprint!("verification code> ");
            std::io::stderr().flush()?;
            let mut input = String::new();
            std::io::stdin().read_line(&mut input)?;
            input.trim().to_string()
        }
    };
    if verifier.is_empty() {
        eprintln!("No verification code provided, aborting.");
        return Ok(());
    }

    let access_token = exchange.finalize(&verifier).await?;

    let username = if args.no_identify {
        None
    } else {
        match client.identify(&access_token).await {
            Ok(claims) => claims.username().map(str::to_string),
            Err(e) => {
                tracing::warn!(error = %e, "Authorized, but identify failed");
                None
            }
        }
    };

    if ctx.json_output {
        return print_json(&LoginOutput {
            authorized: true,
            token_path: store.token_path(TokenStage::Access).display().to_string(),
            username,
        });
    }

    println!();
    match username {
        Some(name) => println!("Authenticated user {}", style(name).green()),
        None => println!("{}", style("Authorization complete").green()),
    }
    if ctx.verbose {
        println!(
            "Token saved to {}",
            store.token_path(TokenStage::Access).display()
        );
    }

    Ok(())
}
