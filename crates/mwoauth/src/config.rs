//! Client configuration.
//!
//! A [`ClientConfig`] is built once and shared read-only by every
//! component; nothing in this crate reads ambient configuration.

use std::time::Duration;

use url::Url;

use crate::error::{Error, Result};
use crate::identity::IdentityPolicy;
use crate::token::Consumer;

/// Default timeout for provider requests.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Out-of-band callback: the provider shows the verifier to the user.
pub const OOB_CALLBACK: &str = "oob";

/// Default `User-Agent` header.
pub const DEFAULT_USER_AGENT: &str = concat!("mwoauth/", env!("CARGO_PKG_VERSION"));

/// Provider endpoints, consumer credentials and client settings.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// `Special:OAuth` base, e.g.
    /// `https://meta.wikimedia.org/w/index.php?title=Special:OAuth`.
    /// Stage names are appended verbatim (`.../Special:OAuth/initiate`).
    pub endpoint: String,

    /// User-facing authorization page. Defaults to `{endpoint}/authorize`.
    pub authorize_url: Option<String>,

    /// API endpoint for authenticated calls (`.../w/api.php`).
    pub api_url: Option<String>,

    /// `oauth_callback` sent on initiate.
    pub callback: String,

    pub consumer: Consumer,

    pub user_agent: String,

    pub timeout: Duration,

    /// Claim checks applied by `identify` after signature verification.
    pub identity_policy: IdentityPolicy,
}

impl ClientConfig {
    pub fn new(endpoint: impl Into<String>, consumer: Consumer) -> Self {
        Self {
            endpoint: endpoint.into(),
            authorize_url: None,
            api_url: None,
            callback: OOB_CALLBACK.to_string(),
            consumer,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: DEFAULT_TIMEOUT,
            identity_policy: IdentityPolicy::default(),
        }
    }

    pub fn with_authorize_url(mut self, url: impl Into<String>) -> Self {
        self.authorize_url = Some(url.into());
        self
    }

    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = Some(url.into());
        self
    }

    /// Use a registered callback URL instead of `oob`.
    pub fn with_callback(mut self, callback: impl Into<String>) -> Self {
        self.callback = callback.into();
        self
    }

    pub fn with_user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = agent.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_identity_policy(mut self, policy: IdentityPolicy) -> Self {
        self.identity_policy = policy;
        self
    }

    /// Check that the endpoints parse and the consumer is usable.
    pub fn validate(&self) -> Result<()> {
        if self.consumer.key.is_empty() {
            return Err(Error::Config("consumer key is empty".to_string()));
        }
        if self.consumer.secret.is_empty() {
            return Err(Error::Config("consumer secret is empty".to_string()));
        }
        Url::parse(&self.endpoint)?;
        if let Some(ref url) = self.authorize_url {
            Url::parse(url)?;
        }
        if let Some(ref url) = self.api_url {
            Url::parse(url)?;
        }
        Ok(())
    }

    /// `{endpoint}/{stage}`, e.g. `.../Special:OAuth/token`.
    pub fn stage_url(&self, stage: &str) -> String {
        format!("{}/{}", self.endpoint.trim_end_matches('/'), stage)
    }

    /// The authorization page the user is sent to.
    pub fn authorize_url(&self) -> String {
        self.authorize_url
            .clone()
            .unwrap_or_else(|| self.stage_url("authorize"))
    }

    /// `scheme://host[:port]` of the endpoint; the expected `iss` claim.
    pub fn provider_origin(&self) -> Result<String> {
        let url = Url::parse(&self.endpoint)?;
        Ok(url.origin().ascii_serialization())
    }
}
