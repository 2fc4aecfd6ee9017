//! Signed calls to the MediaWiki action API with an access token.

use serde_json::Value;

use crate::client::OAuthClient;
use crate::error::{Error, Result};
use crate::signer::{Method, ParamMap};
use crate::token::{Token, TokenStage};
use crate::token_store::TokenStore;

/// Prefix of API error codes meaning the token is no longer honoured.
const INVALID_AUTHORIZATION: &str = "mwoauth-invalid-authorization";

/// Makes authenticated API requests on behalf of one user.
#[derive(Debug, Clone)]
pub struct ApiInvoker {
    client: OAuthClient,
    token: Token,
}

impl ApiInvoker {
    pub fn new(client: OAuthClient, access_token: Token) -> Self {
        Self {
            client,
            token: access_token,
        }
    }

    /// Use whatever access token the store currently holds. A pending
    /// request token does not count.
    pub async fn from_store(client: OAuthClient, store: &dyn TokenStore) -> Result<Self> {
        match store.load_token(TokenStage::Access).await? {
            Some(token) => Ok(Self::new(client, token)),
            None => Err(Error::NotAuthorized(
                "no access token stored; complete the authorization first".to_string(),
            )),
        }
    }

    pub fn token(&self) -> &Token {
        &self.token
    }

    /// POST `params` to the configured API URL.
    ///
    /// ```no_run
    /// # use mwoauth::{ApiInvoker, signer::ParamMap};
    /// # async fn example(invoker: ApiInvoker) -> mwoauth::Result<()> {
    /// let mut params = ParamMap::new();
    /// params.insert("action".into(), "query".into());
    /// params.insert("meta".into(), "userinfo".into());
    /// params.insert("format".into(), "json".into());
    /// let reply = invoker.call(&params).await?;
    /// println!("{}", reply["query"]["userinfo"]["name"]);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn call(&self, params: &ParamMap) -> Result<Value> {
        let api_url = self
            .client
            .config()
            .api_url
            .clone()
            .ok_or_else(|| Error::Config("no API URL configured".to_string()))?;

        let oauth = self.client.oauth_params().with_token(&self.token.key);
        let body = self
            .client
            .send_signed(Method::Post, &api_url, &oauth, &self.token.secret, Some(params))
            .await?;
        classify(&body)
    }

    /// Signed GET; the query string of `url` is part of the signature.
    pub async fn get(&self, url: &str) -> Result<Value> {
        let oauth = self.client.oauth_params().with_token(&self.token.key);
        let body = self
            .client
            .send_signed(Method::Get, url, &oauth, &self.token.secret, None)
            .await?;
        classify(&body)
    }
}

fn classify(body: &str) -> Result<Value> {
    let value: Value = serde_json::from_str(body)
        .map_err(|e| Error::MalformedResponse(format!("API response is not JSON: {}", e)))?;

    if let Some(code) = value
        .get("error")
        .and_then(|e| e.get("code"))
        .and_then(|c| c.as_str())
        && code.starts_with(INVALID_AUTHORIZATION)
    {
        let info = value["error"]["info"].as_str().unwrap_or(code);
        tracing::warn!(%code, "API rejected the access token");
        return Err(Error::NotAuthorized(info.to_string()));
    }

    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;
    use crate::token::Consumer;
    use crate::token_store::InMemoryTokenStore;

    fn client() -> OAuthClient {
        OAuthClient::new(ClientConfig::new(
            "http://127.0.0.1:9/w/index.php?title=Special:OAuth",
            Consumer::new("ck", "cs"),
        ))
        .unwrap()
    }

    #[test]
    fn test_classify_passes_ordinary_responses() {
        let value = classify(r#"{"query":{"userinfo":{"name":"Example"}}}"#).unwrap();
        assert_eq!(value["query"]["userinfo"]["name"], "Example");

        // Other API errors go back to the caller untouched.
        let value = classify(r#"{"error":{"code":"badtoken","info":"Invalid CSRF token."}}"#)
            .unwrap();
        assert_eq!(value["error"]["code"], "badtoken");
    }

    #[test]
    fn test_classify_invalid_authorization() {
        let body = r#"{"error":{"code":"mwoauth-invalid-authorization-invalid-user",
            "info":"The authorization headers in your request are for a user that does not exist here"}}"#;
        match classify(body) {
            Err(Error::NotAuthorized(info)) => assert!(info.contains("does not exist")),
            other => panic!("expected NotAuthorized, got {:?}", other),
        }

        let bare = r#"{"error":{"code":"mwoauth-invalid-authorization"}}"#;
        assert!(matches!(classify(bare), Err(Error::NotAuthorized(_))));
    }

    #[test]
    fn test_classify_not_json() {
        assert!(matches!(
            classify("<!DOCTYPE html>"),
            Err(Error::MalformedResponse(_))
        ));
    }

    #[tokio::test]
    async fn test_from_store_without_token() {
        let store = InMemoryTokenStore::new();
        let result = ApiInvoker::from_store(client(), &store).await;
        assert!(matches!(result, Err(Error::NotAuthorized(_))));
    }

    #[tokio::test]
    async fn test_from_store_uses_stored_token() {
        let store = InMemoryTokenStore::with_token(Token::new("ak", "as"));
        let invoker = ApiInvoker::from_store(client(), &store).await.unwrap();
        assert_eq!(invoker.token().key, "ak");
    }

    #[tokio::test]
    async fn test_from_store_ignores_request_token() {
        let store = InMemoryTokenStore::new();
        store
            .save_token(TokenStage::Request, &Token::new("rk", "rs"))
            .await
            .unwrap();
        let result = ApiInvoker::from_store(client(), &store).await;
        assert!(matches!(result, Err(Error::NotAuthorized(_))));
    }

    #[tokio::test]
    async fn test_call_without_api_url() {
        let invoker = ApiInvoker::new(client(), Token::new("ak", "as"));
        let result = invoker.call(&ParamMap::new()).await;
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
