//! Mock `Special:OAuth` provider for integration tests.

#![allow(dead_code)]

use mwoauth::params::parse_authorization_header;
use mwoauth::{ClientConfig, Consumer, Method, OAuthClient, ParamMap, Signer};
use wiremock::{MockServer, Request};

pub const CONSUMER_KEY: &str = "test-consumer";
pub const CONSUMER_SECRET: &str = "test-consumer-secret";

pub const REQUEST_KEY: &str = "request-key";
pub const REQUEST_SECRET: &str = "request-secret";
pub const ACCESS_KEY: &str = "access-key";
pub const ACCESS_SECRET: &str = "access-secret";

/// Path every `Special:OAuth` stage is served from.
pub const INDEX_PATH: &str = "/w/index.php";
pub const API_PATH: &str = "/w/api.php";

pub fn consumer() -> Consumer {
    Consumer::new(CONSUMER_KEY, CONSUMER_SECRET)
}

pub fn endpoint(server: &MockServer) -> String {
    format!("{}{}?title=Special:OAuth", server.uri(), INDEX_PATH)
}

pub fn api_url(server: &MockServer) -> String {
    format!("{}{}", server.uri(), API_PATH)
}

pub fn client_config(server: &MockServer) -> ClientConfig {
    ClientConfig::new(endpoint(server), consumer()).with_api_url(api_url(server))
}

pub fn client(server: &MockServer) -> OAuthClient {
    OAuthClient::new(client_config(server)).expect("valid test config")
}

/// The `oauth_*` fields a request carried in its `Authorization` header.
pub fn oauth_fields(request: &Request) -> ParamMap {
    let header = request
        .headers
        .get("authorization")
        .expect("request has an Authorization header")
        .to_str()
        .expect("header is ASCII");
    parse_authorization_header(header).expect("OAuth scheme")
}

/// Recompute the signature of a received request and compare it to the
/// one it carried.
pub fn assert_signed_with(request: &Request, token_secret: &str) {
    let mut fields = oauth_fields(request);
    let provided = fields
        .remove("oauth_signature")
        .expect("oauth_signature present");

    let method = match request.method.as_str() {
        "GET" => Method::Get,
        "POST" => Method::Post,
        other => panic!("unexpected method {}", other),
    };

    let mut signed = ParamMap::new();
    if method == Method::Post {
        for (name, value) in url::form_urlencoded::parse(&request.body) {
            signed.insert(name.into_owned(), value.into_owned());
        }
    }
    signed.extend(fields);

    let expected = Signer::new(&consumer())
        .sign(method, request.url.as_str(), &signed, token_secret)
        .expect("signable URL");
    assert_eq!(provided, expected, "signature mismatch for {}", request.url);
}

/// Received requests whose `title` query parameter is `title`.
pub async fn requests_for(server: &MockServer, title: &str) -> Vec<Request> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .into_iter()
        .filter(|r| {
            r.url
                .query_pairs()
                .any(|(k, v)| k == "title" && v == title)
        })
        .collect()
}
