//! mwoauth - authorize and call MediaWiki wikis over OAuth 1.0a
//!
//! Main entry point for the mwoauth CLI.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;

use commands::{call, identify, login, logout, status};

// ─────────────────────────────────────────────────────────────────────────────
// CLI Structure
// ─────────────────────────────────────────────────────────────────────────────

/// mwoauth - authorize and call MediaWiki wikis over OAuth 1.0a
#[derive(Parser)]
#[command(name = "mwoauth")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Load only this config file instead of discovering config layers
    #[arg(long, global = true, env = "MWOAUTH_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output as JSON (for scripting)
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Authorize this tool on the wiki and store the access token
    Login(login::LoginArgs),

    /// Show who the stored access token belongs to
    Identify(identify::IdentifyArgs),

    /// Make a signed API request with the stored access token
    Call(call::CallArgs),

    /// Show configuration and token status
    Status(status::StatusArgs),

    /// Delete the stored access token
    Logout(logout::LogoutArgs),
}

// ─────────────────────────────────────────────────────────────────────────────
// Main
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Console (human-readable) + rotating JSON file
    let filter = if cli.verbose {
        "mwoauth=debug,mwoauth_config=debug,mwoauth_cli=debug,info"
    } else {
        "mwoauth=warn,mwoauth_config=warn,mwoauth_cli=info,warn"
    };

    let log_dir = mwoauth_config::config_dir()
        .map(|d| d.join("logs"))
        .unwrap_or_else(|| PathBuf::from("logs"));
    let file_appender = tracing_appender::rolling::daily(&log_dir, "mwoauth.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    use tracing_subscriber::prelude::*;
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_writer(std::io::stderr)
                .with_filter(tracing_subscriber::EnvFilter::new(filter)),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(non_blocking)
                .with_filter(tracing_subscriber::EnvFilter::new(
                    "mwoauth=trace,mwoauth_config=trace,mwoauth_cli=trace,info",
                )),
        )
        .init();

    let ctx = commands::Context::load(cli.config.as_deref(), cli.json, cli.verbose)?;

    let result = match cli.command {
        Commands::Login(args) => login::run(args, &ctx).await,
        Commands::Identify(args) => identify::run(args, &ctx).await,
        Commands::Call(args) => call::run(args, &ctx).await,
        Commands::Status(args) => status::run(args, &ctx).await,
        Commands::Logout(args) => logout::run(args, &ctx).await,
    };

    if let Err(ref e) = result
        && e.downcast_ref::<mwoauth::Error>()
            .is_some_and(mwoauth::Error::requires_reauthorization)
    {
        eprintln!("hint: run `mwoauth login` to authorize again");
    }

    result
}
