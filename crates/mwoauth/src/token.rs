//! Consumer credentials and OAuth tokens.

use serde::{Deserialize, Serialize};

/// The registered application's key/secret pair.
#[derive(Clone, PartialEq, Eq)]
pub struct Consumer {
    pub key: String,
    pub secret: String,
}

impl Consumer {
    pub fn new(key: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            secret: secret.into(),
        }
    }
}

impl std::fmt::Debug for Consumer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Consumer")
            .field("key", &self.key)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// A request or access token issued by the provider.
///
/// Both stages share this shape; which one a value holds is tracked by
/// [`ExchangeState`](crate::exchange::ExchangeState). Tokens are replaced
/// wholesale, never edited.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub key: String,
    pub secret: String,
}

impl Token {
    pub fn new(key: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            secret: secret.into(),
        }
    }
}

impl std::fmt::Debug for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Token")
            .field("key", &self.key)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// Which leg of the exchange a token belongs to.
///
/// Stores keep one slot per stage so a pending authorization never
/// overwrites, or stands in for, the access token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenStage {
    /// Issued by `initiate`; only good for the authorization redirect.
    Request,
    /// Issued by `finalize`; signs API calls.
    Access,
}

impl TokenStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenStage::Request => "request",
            TokenStage::Access => "access",
        }
    }
}

impl std::fmt::Display for TokenStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
