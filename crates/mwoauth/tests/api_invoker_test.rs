//! Authenticated API calls against a mock wiki.

mod common;

use common::*;
use mwoauth::{ApiInvoker, Error, InMemoryTokenStore, ParamMap, Token};
use serde_json::json;
use wiremock::matchers::{body_string_contains, header_exists, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn params(pairs: &[(&str, &str)]) -> ParamMap {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn invoker(server: &MockServer) -> ApiInvoker {
    ApiInvoker::new(client(server), Token::new(ACCESS_KEY, ACCESS_SECRET))
}

#[tokio::test]
async fn test_post_call_is_signed_over_form_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(API_PATH))
        .and(header_exists("authorization"))
        .and(body_string_contains("action=query"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "batchcomplete": "",
            "query": {"userinfo": {"id": 42, "name": "Example"}}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let reply = invoker(&server)
        .call(&params(&[
            ("action", "query"),
            ("meta", "userinfo"),
            ("format", "json"),
            ("summary", "fix typo & tidy"),
        ]))
        .await
        .unwrap();
    assert_eq!(reply["query"]["userinfo"]["name"], "Example");

    let requests = server.received_requests().await.unwrap();
    let request = &requests[0];

    // The header carries only protocol fields.
    let fields = oauth_fields(request);
    assert!(fields.keys().all(|k| k.starts_with("oauth_")));
    assert_eq!(fields["oauth_token"], ACCESS_KEY);

    assert_signed_with(request, ACCESS_SECRET);
}

#[tokio::test]
async fn test_get_signs_query_parameters() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(API_PATH))
        .and(query_param("action", "query"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"query": {}})))
        .mount(&server)
        .await;

    let url = format!(
        "{}?action=query&meta=userinfo&uiprop=rights%7Cgroups&format=json",
        api_url(&server)
    );
    invoker(&server).get(&url).await.unwrap();

    let requests = server.received_requests().await.unwrap();
    assert_signed_with(&requests[0], ACCESS_SECRET);
}

#[tokio::test]
async fn test_invalid_authorization_is_not_authorized() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(API_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "error": {
                "code": "mwoauth-invalid-authorization-invalid-user",
                "info": "The authorization headers in your request are not valid: Invalid user"
            }
        })))
        .mount(&server)
        .await;

    let result = invoker(&server)
        .call(&params(&[("action", "query"), ("format", "json")]))
        .await;
    let error = result.unwrap_err();
    assert!(error.is_not_authorized());
    assert!(error.requires_reauthorization());
}

#[tokio::test]
async fn test_other_api_errors_are_returned() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(API_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "error": {"code": "badtoken", "info": "Invalid CSRF token."}
        })))
        .mount(&server)
        .await;

    let reply = invoker(&server)
        .call(&params(&[("action", "edit"), ("format", "json")]))
        .await
        .unwrap();
    assert_eq!(reply["error"]["code"], "badtoken");
}

#[tokio::test]
async fn test_non_json_and_empty_responses() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(API_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string("MediaWiki internal error."))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(API_PATH))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let invoker = invoker(&server);
    let result = invoker.call(&params(&[("action", "query")])).await;
    assert!(matches!(result, Err(Error::MalformedResponse(_))));

    let result = invoker.get(&api_url(&server)).await;
    assert!(matches!(result, Err(Error::Transport(_))));
}

#[tokio::test]
async fn test_from_store_after_exchange() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(API_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .mount(&server)
        .await;

    let store = InMemoryTokenStore::with_token(Token::new(ACCESS_KEY, ACCESS_SECRET));
    let invoker = ApiInvoker::from_store(client(&server), &store).await.unwrap();
    invoker.call(&params(&[("action", "query")])).await.unwrap();

    let requests = server.received_requests().await.unwrap();
    assert_signed_with(&requests[0], ACCESS_SECRET);
}
