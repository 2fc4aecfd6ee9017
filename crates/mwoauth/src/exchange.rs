//! The three-legged token exchange.
//!
//! ```text
//! Unauthorized --initiate--> RequestTokenObtained --authorize_url--> UserAuthorizing
//!      ^                                                                  |
//!      +------------------- any failure ----------------- finalize -------+
//!                                                                         v
//!                                                              AccessTokenObtained
//! ```
//!
//! Every token the provider issues is handed to the [`TokenStore`] under its
//! stage: the request token after `initiate`, the access token after
//! `finalize`. Restarting or abandoning an exchange never touches the
//! access slot.
//!
//! [`TokenStore`]: crate::token_store::TokenStore

use url::Url;

use crate::client::{OAuthClient, provider_error};
use crate::error::{Error, Result};
use crate::params::OAuthParams;
use crate::signer::Method;
use crate::token::{Token, TokenStage};
use crate::token_store::SharedTokenStore;

/// Where an exchange currently stands.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ExchangeState {
    #[default]
    Unauthorized,
    /// The provider issued a request token; the user has not been sent to
    /// the authorization page yet.
    RequestTokenObtained(Token),
    /// The authorization URL was handed out; waiting for the verifier.
    UserAuthorizing(Token),
    /// Terminal success state.
    AccessTokenObtained(Token),
}

impl ExchangeState {
    pub fn name(&self) -> &'static str {
        match self {
            ExchangeState::Unauthorized => "unauthorized",
            ExchangeState::RequestTokenObtained(_) => "request-token-obtained",
            ExchangeState::UserAuthorizing(_) => "user-authorizing",
            ExchangeState::AccessTokenObtained(_) => "access-token-obtained",
        }
    }
}

/// Response of the `initiate` and `token` endpoints, decoded once.
#[derive(Debug, PartialEq, Eq)]
enum TokenResponse {
    Issued(Token),
    Refused(String),
}

#[derive(Debug, serde::Deserialize)]
struct IssuedToken {
    key: String,
    secret: String,
}

impl TokenResponse {
    fn parse(body: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(body)
            .map_err(|e| Error::MalformedResponse(format!("Token response is not JSON: {}", e)))?;

        if let Some(message) = provider_error(&value) {
            return Ok(TokenResponse::Refused(message));
        }

        let issued: IssuedToken = serde_json::from_value(value).map_err(|e| {
            Error::MalformedResponse(format!("Token response lacks key/secret: {}", e))
        })?;
        Ok(TokenResponse::Issued(Token::new(issued.key, issued.secret)))
    }
}

/// Drives one authorization from request token to access token.
///
/// # Example
///
/// ```no_run
/// use mwoauth::{ClientConfig, Consumer, OAuthClient, TokenExchange};
/// use mwoauth::token_store::create_memory_token_store;
///
/// # async fn example() -> mwoauth::Result<()> {
/// let client = OAuthClient::new(ClientConfig::new(
///     "https://meta.wikimedia.org/w/index.php?title=Special:OAuth",
///     Consumer::new("consumer-key", "consumer-secret"),
/// ))?;
/// let mut exchange = TokenExchange::new(client, create_memory_token_store());
///
/// exchange.initiate().await?;
/// let url = exchange.authorize_url()?;
/// println!("Visit {}", url);
///
/// let verifier = "code shown by the wiki";
/// let access_token = exchange.finalize(verifier).await?;
/// # let _ = access_token;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct TokenExchange {
    client: OAuthClient,
    store: SharedTokenStore,
    state: ExchangeState,
}

impl TokenExchange {
    pub fn new(client: OAuthClient, store: SharedTokenStore) -> Self {
        Self {
            client,
            store,
            state: ExchangeState::Unauthorized,
        }
    }

    /// Pick up an exchange whose user was already sent to the provider,
    /// e.g. when the callback lands in a different web request.
    pub fn resume(client: OAuthClient, store: SharedTokenStore, request_token: Token) -> Self {
        Self {
            client,
            store,
            state: ExchangeState::UserAuthorizing(request_token),
        }
    }

    /// Like [`resume`](Self::resume), with the request token the store
    /// kept from `initiate`.
    pub async fn resume_from_store(client: OAuthClient, store: SharedTokenStore) -> Result<Self> {
        match store.load_token(TokenStage::Request).await? {
            Some(request_token) => Ok(Self::resume(client, store, request_token)),
            None => Err(Error::NotAuthorized(
                "no pending request token; initiate the exchange first".to_string(),
            )),
        }
    }

    pub fn state(&self) -> &ExchangeState {
        &self.state
    }

    pub fn access_token(&self) -> Option<&Token> {
        match &self.state {
            ExchangeState::AccessTokenObtained(token) => Some(token),
            _ => None,
        }
    }

    pub fn into_access_token(self) -> Option<Token> {
        match self.state {
            ExchangeState::AccessTokenObtained(token) => Some(token),
            _ => None,
        }
    }

    /// Obtain a request token.
    ///
    /// Allowed from any state; an exchange in progress is abandoned.
    pub async fn initiate(&mut self) -> Result<Token> {
        if self.state != ExchangeState::Unauthorized {
            tracing::debug!(from = self.state.name(), "Restarting token exchange");
        }
        self.state = ExchangeState::Unauthorized;

        let config = self.client.config();
        let url = self.client.stage_url(
            "initiate",
            &[("format", "json"), ("oauth_callback", config.callback.as_str())],
        )?;
        let oauth = self.client.oauth_params();

        let token = self.request_token(url, &oauth, "").await?;
        self.store.save_token(TokenStage::Request, &token).await?;

        tracing::info!("Request token obtained");
        self.state = ExchangeState::RequestTokenObtained(token.clone());
        Ok(token)
    }

    /// The URL the user must visit to approve the request token.
    pub fn authorize_url(&mut self) -> Result<String> {
        let token = match std::mem::take(&mut self.state) {
            ExchangeState::RequestTokenObtained(token) | ExchangeState::UserAuthorizing(token) => {
                token
            }
            other => {
                let error = Error::InvalidState(format!(
                    "cannot build an authorization URL while {}",
                    other.name()
                ));
                self.state = other;
                return Err(error);
            }
        };

        let config = self.client.config();
        let mut url = match Url::parse(&config.authorize_url()) {
            Ok(url) => url,
            Err(e) => {
                self.state = ExchangeState::RequestTokenObtained(token);
                return Err(e.into());
            }
        };
        url.query_pairs_mut()
            .append_pair("oauth_token", &token.key)
            .append_pair("oauth_consumer_key", &config.consumer.key);

        tracing::debug!("Authorization URL issued");
        self.state = ExchangeState::UserAuthorizing(token);
        Ok(url.into())
    }

    /// Trade the verifier for an access token.
    ///
    /// Only valid while `UserAuthorizing`; any other state fails without
    /// contacting the provider. On any failure after that the exchange is
    /// back at `Unauthorized`.
    pub async fn finalize(&mut self, verifier: &str) -> Result<Token> {
        let request_token = match std::mem::take(&mut self.state) {
            ExchangeState::UserAuthorizing(token) => token,
            other => {
                let error = Error::InvalidState(format!(
                    "cannot finalize while {}; call initiate first",
                    other.name()
                ));
                self.state = other;
                return Err(error);
            }
        };

        let url = self.client.stage_url(
            "token",
            &[("format", "json"), ("oauth_verifier", verifier)],
        )?;
        let oauth = self.client.oauth_params().with_token(&request_token.key);

        let access_token = self
            .request_token(url, &oauth, &request_token.secret)
            .await?;
        self.store
            .save_token(TokenStage::Access, &access_token)
            .await?;

        tracing::info!("Access token obtained");
        self.state = ExchangeState::AccessTokenObtained(access_token.clone());
        Ok(access_token)
    }

    async fn request_token(
        &self,
        url: Url,
        oauth: &OAuthParams,
        token_secret: &str,
    ) -> Result<Token> {
        let body = self
            .client
            .send_signed(Method::Get, url.as_str(), oauth, token_secret, None)
            .await?;

        match TokenResponse::parse(&body)? {
            TokenResponse::Issued(token) => Ok(token),
            TokenResponse::Refused(message) => {
                tracing::warn!(error = %message, "Provider refused token request");
                Err(Error::NotAuthorized(message))
            }
        }
    }
}
