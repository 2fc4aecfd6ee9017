//! OAuth 1.0a request signing (HMAC-SHA1).
//!
//! The signature base string is
//! `METHOD & enc(scheme://host[:port]/path) & enc(sorted parameters)`,
//! keyed by `enc(consumer_secret) & enc(token_secret)`.
//!
//! Parameters from the URL query and the extra parameters are merged before
//! sorting. When a key appears in both, the extra parameter replaces every
//! URL entry with that key. RFC 5849 keeps duplicates instead.

use std::collections::BTreeMap;

use base64::{Engine, engine::general_purpose::STANDARD};
use hmac::{Hmac, Mac};
use sha1::Sha1;
use url::Url;

use crate::error::{Error, Result};
use crate::token::Consumer;

type HmacSha1 = Hmac<Sha1>;

/// Parameter name that is never part of its own base string.
const SIGNATURE_PARAM: &str = "oauth_signature";

/// Signature method advertised in `oauth_signature_method`.
pub const SIGNATURE_METHOD: &str = "HMAC-SHA1";

/// Named request parameters, unique by key.
pub type ParamMap = BTreeMap<String, String>;

/// HTTP methods the client signs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
        }
    }
}

/// Percent-encode with the RFC 3986 unreserved set (`A-Z a-z 0-9 - . _ ~`).
///
/// Space becomes `%20`, never `+`.
pub fn percent_encode(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}

/// `scheme://host[:port]/path` with the port dropped when it is the
/// scheme default.
pub fn normalize_url(url: &Url) -> Result<String> {
    let host = url
        .host_str()
        .ok_or(Error::InvalidUrl(url::ParseError::EmptyHost))?;

    // `Url::port` is `None` when the port equals the scheme default.
    let port = match url.port() {
        Some(port) => format!(":{}", port),
        None => String::new(),
    };

    Ok(format!("{}://{}{}{}", url.scheme(), host, port, url.path()))
}

/// Merge the URL query with `extra`, dropping `oauth_signature`.
pub fn collect_parameters(url: &Url, extra: &ParamMap) -> Vec<(String, String)> {
    let mut params: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| key != SIGNATURE_PARAM && !extra.contains_key(key.as_ref()))
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();

    params.extend(
        extra
            .iter()
            .filter(|(key, _)| key.as_str() != SIGNATURE_PARAM)
            .map(|(key, value)| (key.clone(), value.clone())),
    );

    params
}

/// Encode, sort and join parameters as `k=v&k=v`.
pub fn normalize_parameters(params: &[(String, String)]) -> String {
    let mut encoded: Vec<(String, String)> = params
        .iter()
        .map(|(key, value)| (percent_encode(key), percent_encode(value)))
        .collect();

    // Byte-wise order on the encoded key; equal keys fall back to the value,
    // which orders the same as comparing the whole "key=value" string.
    encoded.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1)));

    encoded
        .iter()
        .map(|(key, value)| format!("{}={}", key, value))
        .collect::<Vec<_>>()
        .join("&")
}

/// Build the signature base string for a request.
pub fn base_string(method: Method, url: &str, extra: &ParamMap) -> Result<String> {
    let parsed = Url::parse(url)?;
    let params = collect_parameters(&parsed, extra);

    Ok(format!(
        "{}&{}&{}",
        method.as_str(),
        percent_encode(&normalize_url(&parsed)?),
        percent_encode(&normalize_parameters(&params))
    ))
}

/// HMAC key for the given secrets. `token_secret` is empty before any
/// token has been issued.
pub fn signing_key(consumer_secret: &str, token_secret: &str) -> String {
    format!(
        "{}&{}",
        percent_encode(consumer_secret),
        percent_encode(token_secret)
    )
}

/// Signs requests on behalf of one consumer.
#[derive(Clone)]
pub struct Signer {
    consumer_secret: String,
}

impl Signer {
    pub fn new(consumer: &Consumer) -> Self {
        Self {
            consumer_secret: consumer.secret.clone(),
        }
    }

    /// Compute the base64 `oauth_signature` for a request.
    pub fn sign(
        &self,
        method: Method,
        url: &str,
        extra: &ParamMap,
        token_secret: &str,
    ) -> Result<String> {
        let base = base_string(method, url, extra)?;
        tracing::debug!(
            method = %method,
            base_len = base.len(),
            has_token = !token_secret.is_empty(),
            "Signing request"
        );

        let key = signing_key(&self.consumer_secret, token_secret);
        let mut mac = HmacSha1::new_from_slice(key.as_bytes())
            .map_err(|e| Error::Config(format!("Invalid signing key: {}", e)))?;
        mac.update(base.as_bytes());

        Ok(STANDARD.encode(mac.finalize().into_bytes()))
    }
}

impl std::fmt::Debug for Signer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signer")
            .field("consumer_secret", &"<redacted>")
            .finish()
    }
}
