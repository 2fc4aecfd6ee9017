//! Configuration types mapping to the TOML schema.
//!
//! ```toml
//! [consumer]     # key plus secret / secret_file
//! [provider]     # Special:OAuth endpoint, authorize and API URLs
//! [client]       # user agent, timeouts, identity leeway
//! ```

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::{ConfigError, Result};

/// Endpoint used when `[provider]` does not name one.
pub const DEFAULT_ENDPOINT: &str = "https://meta.wikimedia.org/w/index.php?title=Special:OAuth";

// ─────────────────────────────────────────────────────────────────────────────
// Top-level Config
// ─────────────────────────────────────────────────────────────────────────────

/// Root configuration structure.
///
/// All sections are optional so that partial configs (e.g. project-local
/// overrides) can be loaded and merged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MwOAuthConfig {
    pub consumer: Option<ConsumerConfig>,
    pub provider: Option<ProviderConfig>,
    pub client: Option<ClientSection>,
}

impl MwOAuthConfig {
    /// Create an empty config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Merge another config on top of this one (other takes priority).
    ///
    /// Merging is per field: a later layer that sets only
    /// `provider.api_url` keeps the endpoint from an earlier layer.
    pub fn merge(&mut self, other: MwOAuthConfig) {
        merge_section(&mut self.consumer, other.consumer, ConsumerConfig::merge);
        merge_section(&mut self.provider, other.provider, ProviderConfig::merge);
        merge_section(&mut self.client, other.client, ClientSection::merge);
    }

    /// The consumer key, required for every operation.
    pub fn consumer_key(&self) -> Result<&str> {
        self.consumer
            .as_ref()
            .and_then(|c| c.key.as_deref())
            .filter(|k| !k.is_empty())
            .ok_or_else(|| ConfigError::MissingField {
                field: "key".to_string(),
                context: "[consumer]".to_string(),
            })
    }

    /// The `Special:OAuth` endpoint, falling back to [`DEFAULT_ENDPOINT`].
    pub fn endpoint(&self) -> &str {
        self.provider
            .as_ref()
            .and_then(|p| p.endpoint.as_deref())
            .unwrap_or(DEFAULT_ENDPOINT)
    }

    pub fn provider(&self) -> ProviderConfig {
        self.provider.clone().unwrap_or_default()
    }

    pub fn client(&self) -> ClientSection {
        self.client.clone().unwrap_or_default()
    }

    /// Returns true if the consumer secret is stored directly in the config.
    pub fn has_plaintext_secret(&self) -> bool {
        self.consumer
            .as_ref()
            .is_some_and(|c| c.secret.is_some())
    }
}

fn merge_section<T>(base: &mut Option<T>, other: Option<T>, merge: fn(&mut T, T)) {
    match (base.as_mut(), other) {
        (Some(existing), Some(layer)) => merge(existing, layer),
        (None, Some(layer)) => *base = Some(layer),
        (_, None) => {}
    }
}

fn take<T>(slot: &mut Option<T>, value: Option<T>) {
    if value.is_some() {
        *slot = value;
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Sections
// ─────────────────────────────────────────────────────────────────────────────

/// `[consumer]`: credentials registered on `Special:OAuthConsumerRegistration`.
#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsumerConfig {
    pub key: Option<String>,
    /// Plaintext secret (prefer `secret_file` or the environment).
    pub secret: Option<String>,
    /// File whose trimmed contents are the secret; `~` is expanded.
    pub secret_file: Option<PathBuf>,
}

impl ConsumerConfig {
    fn merge(&mut self, other: ConsumerConfig) {
        take(&mut self.key, other.key);
        take(&mut self.secret, other.secret);
        take(&mut self.secret_file, other.secret_file);
    }
}

impl std::fmt::Debug for ConsumerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConsumerConfig")
            .field("key", &self.key)
            .field("secret", &self.secret.as_ref().map(|_| "<redacted>"))
            .field("secret_file", &self.secret_file)
            .finish()
    }
}

/// `[provider]`: where the wiki lives.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub endpoint: Option<String>,
    pub authorize_url: Option<String>,
    pub api_url: Option<String>,
    pub callback: Option<String>,
}

impl ProviderConfig {
    fn merge(&mut self, other: ProviderConfig) {
        take(&mut self.endpoint, other.endpoint);
        take(&mut self.authorize_url, other.authorize_url);
        take(&mut self.api_url, other.api_url);
        take(&mut self.callback, other.callback);
    }
}

/// `[client]`: HTTP and verification settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientSection {
    /// `User-Agent` header.
    pub agent: Option<String>,
    pub timeout_secs: Option<u64>,
    /// Clock skew allowed when checking identity `iat`/`exp`.
    pub identity_leeway_secs: Option<i64>,
}

impl ClientSection {
    fn merge(&mut self, other: ClientSection) {
        take(&mut self.agent, other.agent);
        take(&mut self.timeout_secs, other.timeout_secs);
        take(&mut self.identity_leeway_secs, other.identity_leeway_secs);
    }
}
