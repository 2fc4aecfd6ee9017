//! Identify command - verifies who the stored token belongs to.

use anyhow::Result;
use clap::Args;
use mwoauth::{IdentityPolicy, TokenStage, TokenStore};

use super::{Context, print_json};

/// Arguments for the identify command.
#[derive(Args, Debug)]
pub struct IdentifyArgs {
    /// Verify the signature only; skip issuer, audience, nonce and time checks
    #[arg(long)]
    pub no_policy: bool,
}

/// Run the identify command.
pub async fn run(args: IdentifyArgs, ctx: &Context) -> Result<()> {
    let client = if args.no_policy {
        ctx.client_with_policy(IdentityPolicy::none())?
    } else {
        ctx.client()?
    };

    let token = ctx
        .token_store()
        .load_token(TokenStage::Access)
        .await?
        .ok_or_else(|| mwoauth::Error::NotAuthorized("no access token stored".to_string()))?;

    let claims = client.identify(&token).await?;

    if ctx.json_output {
        return print_json(claims.as_map());
    }

    println!("{}", claims.username().unwrap_or("<unknown>"));
    if ctx.verbose {
        if let Some(count) = claims.editcount() {
            println!("  edits:  {}", count);
        }
        let groups = claims.groups();
        if !groups.is_empty() {
            println!("  groups: {}", groups.join(", "));
        }
        let grants = claims.grants();
        if !grants.is_empty() {
            println!("  grants: {}", grants.join(", "));
        }
        if claims.blocked() {
            println!("  blocked");
        }
    }

    Ok(())
}
