//! CLI command handlers.

pub mod call;
pub mod identify;
pub mod login;
pub mod logout;
pub mod status;

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context as _, Result};
use mwoauth::{ClientConfig, Consumer, FileTokenStore, IdentityPolicy, OAuthClient};
use mwoauth_config::{LoadedConfig, MwOAuthConfig};

/// Shared context for all commands.
#[derive(Debug)]
pub struct Context {
    /// Merged configuration and where it came from.
    pub loaded: LoadedConfig,
    /// Directory holding the access token.
    pub data_dir: PathBuf,
    /// Output as JSON for scripting.
    pub json_output: bool,
    /// Verbose output enabled.
    pub verbose: bool,
}

impl Context {
    pub fn load(config_path: Option<&Path>, json_output: bool, verbose: bool) -> Result<Self> {
        let loaded = match config_path {
            Some(path) => mwoauth_config::load_explicit(path)?,
            None => mwoauth_config::load_config(None)?,
        };
        for warning in &loaded.warnings {
            tracing::warn!("{}", warning);
        }

        let data_dir = mwoauth_config::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;

        Ok(Self {
            loaded,
            data_dir,
            json_output,
            verbose,
        })
    }

    pub fn config(&self) -> &MwOAuthConfig {
        &self.loaded.config
    }

    pub fn token_store(&self) -> FileTokenStore {
        FileTokenStore::new(&self.data_dir)
    }

    /// Build the OAuth client; resolves the consumer secret.
    pub fn client(&self) -> Result<OAuthClient> {
        Ok(OAuthClient::new(self.client_config()?)?)
    }

    /// Like [`Context::client`] but with the identity claim checks replaced.
    pub fn client_with_policy(&self, policy: IdentityPolicy) -> Result<OAuthClient> {
        Ok(OAuthClient::new(
            self.client_config()?.with_identity_policy(policy),
        )?)
    }

    fn client_config(&self) -> Result<ClientConfig> {
        let config = self.config();
        let key = config.consumer_key()?;
        let secret = mwoauth_config::resolve_consumer_secret(config)
            .context("consumer secret is not configured")?;
        tracing::debug!(source = %secret.source, "Resolved consumer secret");

        let mut client_config =
            ClientConfig::new(config.endpoint(), Consumer::new(key, secret.value));

        let provider = config.provider();
        if let Some(url) = provider.authorize_url {
            client_config = client_config.with_authorize_url(url);
        }
        if let Some(url) = provider.api_url {
            client_config = client_config.with_api_url(url);
        }
        if let Some(callback) = provider.callback {
            client_config = client_config.with_callback(callback);
        }

        let client = config.client();
        if let Some(agent) = client.agent {
            client_config = client_config.with_user_agent(agent);
        }
        if let Some(secs) = client.timeout_secs {
            client_config = client_config.with_timeout(Duration::from_secs(secs));
        }
        if let Some(leeway) = client.identity_leeway_secs {
            let policy = client_config.identity_policy.clone().with_leeway(leeway);
            client_config = client_config.with_identity_policy(policy);
        }

        Ok(client_config)
    }
}

/// Print a value as pretty JSON.
pub fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
