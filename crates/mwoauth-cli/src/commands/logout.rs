//! Logout command - forgets the stored tokens.

use anyhow::Result;
use clap::Args;
use mwoauth::TokenStage;

use super::Context;

/// Arguments for the logout command.
#[derive(Args, Debug)]
pub struct LogoutArgs {}

/// Run the logout command.
pub async fn run(_args: LogoutArgs, ctx: &Context) -> Result<()> {
    let store = ctx.token_store();

    let had_access = store.has_token(TokenStage::Access);
    // A pending request token goes too, even without an access token.
    store.clear().await?;

    if had_access {
        println!("Access token removed.");
    } else {
        println!("No access token found.");
    }

    Ok(())
}
