//! OAuth protocol parameters and the `Authorization` header.

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::RngCore;

use crate::signer::{ParamMap, SIGNATURE_METHOD, percent_encode};

/// Protocol version sent in `oauth_version`.
pub const OAUTH_VERSION: &str = "1.0";

/// Random bytes per nonce (128 bits).
const NONCE_BYTES: usize = 16;

/// Generate a fresh nonce.
pub fn generate_nonce() -> String {
    let mut bytes = [0u8; NONCE_BYTES];
    rand::rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Seconds since the Unix epoch.
pub fn current_timestamp() -> i64 {
    chrono::Utc::now().timestamp()
}

/// The `oauth_*` parameter set for one request.
#[derive(Debug, Clone)]
pub struct OAuthParams {
    params: ParamMap,
}

impl OAuthParams {
    /// Parameters for `consumer_key` with a fresh nonce and the current time.
    pub fn new(consumer_key: &str) -> Self {
        Self::with_nonce(consumer_key, &generate_nonce(), current_timestamp())
    }

    /// Parameters with a caller-chosen nonce and timestamp.
    pub fn with_nonce(consumer_key: &str, nonce: &str, timestamp: i64) -> Self {
        let mut params = ParamMap::new();
        params.insert("oauth_consumer_key".to_string(), consumer_key.to_string());
        params.insert("oauth_nonce".to_string(), nonce.to_string());
        params.insert("oauth_timestamp".to_string(), timestamp.to_string());
        params.insert(
            "oauth_signature_method".to_string(),
            SIGNATURE_METHOD.to_string(),
        );
        params.insert("oauth_version".to_string(), OAUTH_VERSION.to_string());
        Self { params }
    }

    /// Add `oauth_token`.
    pub fn with_token(self, token_key: &str) -> Self {
        self.with_param("oauth_token", token_key)
    }

    /// Add or replace a protocol parameter such as `oauth_verifier`.
    pub fn with_param(mut self, name: &str, value: &str) -> Self {
        self.params.insert(name.to_string(), value.to_string());
        self
    }

    pub fn nonce(&self) -> &str {
        self.params
            .get("oauth_nonce")
            .map(String::as_str)
            .unwrap_or_default()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    pub fn as_map(&self) -> &ParamMap {
        &self.params
    }

    /// Format the `Authorization` header value carrying these parameters
    /// and `signature`.
    pub fn authorization_header(&self, signature: &str) -> String {
        let mut fields = self.params.clone();
        fields.insert("oauth_signature".to_string(), signature.to_string());

        let pairs = fields
            .iter()
            .map(|(k, v)| format!("{}=\"{}\"", percent_encode(k), percent_encode(v)))
            .collect::<Vec<_>>()
            .join(", ");

        format!("OAuth {}", pairs)
    }
}

/// Parse an `Authorization: OAuth ...` header back into decoded pairs.
///
/// Returns `None` when the value does not use the OAuth scheme.
#[doc(hidden)]
pub fn parse_authorization_header(header: &str) -> Option<ParamMap> {
    let fields = header.trim().strip_prefix("OAuth ")?;

    let mut params = ParamMap::new();
    for field in fields.split(',') {
        let field = field.trim();
        if field.is_empty() {
            continue;
        }
        let (name, value) = field.split_once('=')?;
        let value = value.trim_matches('"');
        let name = urlencoding::decode(name.trim()).ok()?;
        let value = urlencoding::decode(value).ok()?;
        params.insert(name.into_owned(), value.into_owned());
    }
    Some(params)
}
