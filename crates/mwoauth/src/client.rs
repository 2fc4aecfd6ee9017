//! Signed HTTP plumbing shared by the exchange, the API invoker and
//! `identify`.

use std::sync::Arc;

use reqwest::header::AUTHORIZATION;
use url::Url;

use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::params::OAuthParams;
use crate::signer::{Method, ParamMap, Signer};

/// OAuth 1.0a client for one consumer and provider.
///
/// Cheap to clone; clones share the configuration and connection pool.
///
/// # Example
///
/// ```no_run
/// use mwoauth::{ClientConfig, Consumer, OAuthClient};
///
/// # fn example() -> mwoauth::Result<()> {
/// let config = ClientConfig::new(
///     "https://meta.wikimedia.org/w/index.php?title=Special:OAuth",
///     Consumer::new("consumer-key", "consumer-secret"),
/// )
/// .with_api_url("https://meta.wikimedia.org/w/api.php");
///
/// let client = OAuthClient::new(config)?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct OAuthClient {
    config: Arc<ClientConfig>,
    http: reqwest::Client,
    signer: Signer,
}

impl OAuthClient {
    /// Create a client with its own HTTP connection pool.
    pub fn new(config: ClientConfig) -> Result<Self> {
        config.validate()?;
        let http = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.timeout)
            .build()?;
        Ok(Self::with_http_client(config, http))
    }

    /// Create a client on top of an existing `reqwest::Client`.
    ///
    /// The caller's client settings (user agent, timeouts) are used as is.
    pub fn with_http_client(config: ClientConfig, http: reqwest::Client) -> Self {
        Self {
            signer: Signer::new(&config.consumer),
            config: Arc::new(config),
            http,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn signer(&self) -> &Signer {
        &self.signer
    }

    /// Fresh protocol parameters for this consumer.
    pub(crate) fn oauth_params(&self) -> OAuthParams {
        OAuthParams::new(&self.config.consumer.key)
    }

    /// `{endpoint}/{stage}` with `query` appended.
    pub(crate) fn stage_url(&self, stage: &str, query: &[(&str, &str)]) -> Result<Url> {
        let mut url = Url::parse(&self.config.stage_url(stage))?;
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (name, value) in query {
                pairs.append_pair(name, value);
            }
        }
        Ok(url)
    }

    /// Sign and send a request, returning the non-empty response body.
    ///
    /// `oauth` travels in the `Authorization` header. For POST, `form` is
    /// sent as the urlencoded body; either way it is covered by the
    /// signature, as is the query string of `url`.
    pub(crate) async fn send_signed(
        &self,
        method: Method,
        url: &str,
        oauth: &OAuthParams,
        token_secret: &str,
        form: Option<&ParamMap>,
    ) -> Result<String> {
        let mut signed = form.cloned().unwrap_or_default();
        for (name, value) in oauth.as_map() {
            signed.insert(name.clone(), value.clone());
        }

        let signature = self.signer.sign(method, url, &signed, token_secret)?;

        let mut request = self
            .http
            .request(method.into(), url)
            .header(AUTHORIZATION, oauth.authorization_header(&signature));
        if let Some(form) = form {
            request = request.form(form);
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::Transport(format!("{} request failed: {}", method, e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::Transport(format!("Failed to read response body: {}", e)))?;

        tracing::debug!(%method, %status, bytes = body.len(), "Provider responded");

        if body.trim().is_empty() {
            return Err(Error::Transport(format!(
                "Provider returned no data (HTTP {})",
                status
            )));
        }

        Ok(body)
    }
}

/// Extract the provider's error message from a JSON response, if any.
///
/// Handles the `Special:OAuth` shape (`{"error": "...", "message": "..."}`)
/// and the API shape (`{"error": {"code": "...", "info": "..."}}`).
pub(crate) fn provider_error(value: &serde_json::Value) -> Option<String> {
    let error = value.get("error")?;

    if let Some(code) = error.as_str() {
        return Some(match value.get("message").and_then(|m| m.as_str()) {
            Some(message) => format!("{}: {}", code, message),
            None => code.to_string(),
        });
    }

    let code = error
        .get("code")
        .and_then(|c| c.as_str())
        .unwrap_or("unknown");
    Some(match error.get("info").and_then(|i| i.as_str()) {
        Some(info) => format!("{}: {}", code, info),
        None => code.to_string(),
    })
}
