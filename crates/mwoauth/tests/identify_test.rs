//! `Special:OAuth/identify` against a mock provider.

mod common;

use common::*;
use mwoauth::identity::sign;
use mwoauth::{Error, IdentityPolicy, OAuthClient, Token};
use serde_json::{Map, Value, json};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

/// Answers identify requests with a JWT echoing the request nonce.
struct IdentifyResponder {
    issuer: String,
    secret: String,
    overrides: Map<String, Value>,
}

impl IdentifyResponder {
    fn new(server: &MockServer) -> Self {
        Self {
            issuer: server.uri(),
            secret: CONSUMER_SECRET.to_string(),
            overrides: Map::new(),
        }
    }

    fn with_secret(mut self, secret: &str) -> Self {
        self.secret = secret.to_string();
        self
    }

    fn with_claim(mut self, name: &str, value: Value) -> Self {
        self.overrides.insert(name.to_string(), value);
        self
    }
}

impl Respond for IdentifyResponder {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let fields = oauth_fields(request);
        let now = chrono::Utc::now().timestamp();

        let mut claims = match json!({
            "iss": self.issuer,
            "sub": 12345,
            "aud": fields["oauth_consumer_key"],
            "exp": now + 100,
            "iat": now,
            "username": "Example",
            "editcount": 17,
            "confirmed_email": true,
            "blocked": false,
            "registered": "20200101000000",
            "groups": ["*", "user", "autoconfirmed"],
            "rights": ["read", "edit"],
            "grants": ["mwoauth-authonly"],
            "nonce": fields["oauth_nonce"],
        }) {
            Value::Object(map) => map,
            _ => unreachable!(),
        };
        claims.extend(self.overrides.clone());

        let token = sign(&claims, &self.secret).unwrap();
        ResponseTemplate::new(200).set_body_string(token)
    }
}

async fn mount_identify(server: &MockServer, responder: impl Respond + 'static) {
    Mock::given(method("GET"))
        .and(path(INDEX_PATH))
        .and(query_param("title", "Special:OAuth/identify"))
        .respond_with(responder)
        .mount(server)
        .await;
}

fn access_token() -> Token {
    Token::new(ACCESS_KEY, ACCESS_SECRET)
}

#[tokio::test]
async fn test_identify_returns_verified_claims() {
    let server = MockServer::start().await;
    mount_identify(&server, IdentifyResponder::new(&server)).await;

    let claims = client(&server).identify(&access_token()).await.unwrap();
    assert_eq!(claims.username(), Some("Example"));
    assert_eq!(claims.editcount(), Some(17));
    assert!(claims.confirmed_email());
    assert!(!claims.blocked());
    assert_eq!(claims.groups(), vec!["*", "user", "autoconfirmed"]);
    assert_eq!(claims.grants(), vec!["mwoauth-authonly"]);

    let requests = requests_for(&server, "Special:OAuth/identify").await;
    assert_eq!(oauth_fields(&requests[0])["oauth_token"], ACCESS_KEY);
    assert_signed_with(&requests[0], ACCESS_SECRET);
}

#[tokio::test]
async fn test_identify_wrong_secret_is_signature_mismatch() {
    let server = MockServer::start().await;
    mount_identify(
        &server,
        IdentifyResponder::new(&server).with_secret("someone-else"),
    )
    .await;

    let result = client(&server).identify(&access_token()).await;
    assert!(matches!(result, Err(Error::AssertionSignatureMismatch)));
}

#[tokio::test]
async fn test_identify_rejects_foreign_audience() {
    let server = MockServer::start().await;
    mount_identify(
        &server,
        IdentifyResponder::new(&server).with_claim("aud", json!("another-consumer")),
    )
    .await;

    match client(&server).identify(&access_token()).await {
        Err(Error::ClaimRejected { claim, .. }) => assert_eq!(claim, "aud"),
        other => panic!("expected aud rejection, got {:?}", other),
    }
}

#[tokio::test]
async fn test_identify_rejects_replayed_nonce() {
    let server = MockServer::start().await;
    mount_identify(
        &server,
        IdentifyResponder::new(&server).with_claim("nonce", json!("stale-nonce")),
    )
    .await;

    match client(&server).identify(&access_token()).await {
        Err(Error::ClaimRejected { claim, .. }) => assert_eq!(claim, "nonce"),
        other => panic!("expected nonce rejection, got {:?}", other),
    }
}

#[tokio::test]
async fn test_identify_rejects_expired_assertion() {
    let server = MockServer::start().await;
    let now = chrono::Utc::now().timestamp();
    mount_identify(
        &server,
        IdentifyResponder::new(&server)
            .with_claim("iat", json!(now - 3600))
            .with_claim("exp", json!(now - 600)),
    )
    .await;

    match client(&server).identify(&access_token()).await {
        Err(Error::ClaimRejected { claim, .. }) => assert_eq!(claim, "exp"),
        other => panic!("expected exp rejection, got {:?}", other),
    }
}

#[tokio::test]
async fn test_identify_without_policy_accepts_any_claims() {
    let server = MockServer::start().await;
    mount_identify(
        &server,
        IdentifyResponder::new(&server)
            .with_claim("iss", json!("https://elsewhere.example"))
            .with_claim("nonce", json!("whatever")),
    )
    .await;

    let config = client_config(&server).with_identity_policy(IdentityPolicy::none());
    let claims = OAuthClient::new(config)
        .unwrap()
        .identify(&access_token())
        .await
        .unwrap();
    assert_eq!(claims.iss(), Some("https://elsewhere.example"));
}

#[tokio::test]
async fn test_identify_refusal_is_not_authorized() {
    let server = MockServer::start().await;
    mount_identify(
        &server,
        ResponseTemplate::new(200).set_body_json(json!({
            "error": "mwoauth-oauth-exception",
            "message": "Invalid access token"
        })),
    )
    .await;

    let result = client(&server).identify(&access_token()).await;
    assert!(matches!(result, Err(Error::NotAuthorized(_))));
}

#[tokio::test]
async fn test_identify_garbage_is_structure_error() {
    let server = MockServer::start().await;
    mount_identify(
        &server,
        ResponseTemplate::new(200).set_body_string("not-a-jwt"),
    )
    .await;

    let result = client(&server).identify(&access_token()).await;
    assert!(matches!(result, Err(Error::AssertionStructure(_))));
}
