//! Identity assertions returned by `Special:OAuth/identify`.
//!
//! The provider answers with a compact HS256 JWT signed with the consumer
//! secret. [`verify`] checks structure, algorithm and signature and hands
//! back the claims; [`IdentityPolicy`] layers the claim checks (issuer,
//! audience, nonce, issue and expiry times) on top.

use base64::Engine;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use hmac::{Hmac, Mac};
use serde_json::{Map, Value};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::client::{OAuthClient, provider_error};
use crate::error::{Error, Result};
use crate::signer::Method;
use crate::token::Token;

type HmacSha256 = Hmac<Sha256>;

/// base64url that accepts both padded and unpadded input.
const BASE64_URL: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

const EXPECTED_TYP: &str = "JWT";
const EXPECTED_ALG: &str = "HS256";

/// Default clock leeway for `iat`/`exp`.
pub const DEFAULT_LEEWAY_SECS: i64 = 60;

// ─────────────────────────────────────────────────────────────────────────────
// Claims
// ─────────────────────────────────────────────────────────────────────────────

/// Decoded payload of a verified identity assertion.
#[derive(Debug, Clone, PartialEq)]
pub struct Claims(Map<String, Value>);

impl Claims {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    fn str_claim(&self, name: &str) -> Option<&str> {
        self.0.get(name).and_then(Value::as_str)
    }

    fn int_claim(&self, name: &str) -> Option<i64> {
        self.0.get(name).and_then(Value::as_i64)
    }

    fn list_claim(&self, name: &str) -> Vec<String> {
        self.0
            .get(name)
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(|v| v.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn username(&self) -> Option<&str> {
        self.str_claim("username")
    }

    /// Central user id.
    pub fn sub(&self) -> Option<&str> {
        self.str_claim("sub")
    }

    pub fn iss(&self) -> Option<&str> {
        self.str_claim("iss")
    }

    pub fn aud(&self) -> Option<&str> {
        self.str_claim("aud")
    }

    pub fn nonce(&self) -> Option<&str> {
        self.str_claim("nonce")
    }

    pub fn iat(&self) -> Option<i64> {
        self.int_claim("iat")
    }

    pub fn exp(&self) -> Option<i64> {
        self.int_claim("exp")
    }

    pub fn editcount(&self) -> Option<i64> {
        self.int_claim("editcount")
    }

    pub fn confirmed_email(&self) -> bool {
        self.0
            .get("confirmed_email")
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    pub fn blocked(&self) -> bool {
        self.0
            .get("blocked")
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    /// Registration timestamp as sent by the wiki (`YYYYMMDDHHMMSS`).
    pub fn registered(&self) -> Option<&str> {
        self.str_claim("registered")
    }

    pub fn groups(&self) -> Vec<String> {
        self.list_claim("groups")
    }

    pub fn rights(&self) -> Vec<String> {
        self.list_claim("rights")
    }

    pub fn grants(&self) -> Vec<String> {
        self.list_claim("grants")
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Verification
// ─────────────────────────────────────────────────────────────────────────────

fn decode_object(segment: &str) -> std::result::Result<Map<String, Value>, String> {
    let bytes = BASE64_URL
        .decode(segment)
        .map_err(|e| format!("invalid base64url: {}", e))?;
    match serde_json::from_slice::<Value>(&bytes) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err("not a JSON object".to_string()),
        Err(e) => Err(format!("invalid JSON: {}", e)),
    }
}

fn hs256(secret: &str, data: &str) -> Result<Vec<u8>> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| Error::Config(format!("Invalid consumer secret: {}", e)))?;
    mac.update(data.as_bytes());
    Ok(mac.finalize().into_bytes().to_vec())
}

/// Verify a compact HS256 token and return its claims.
///
/// Only `typ=JWT` with `alg=HS256` is accepted; the header is checked
/// before the signature. No time or audience checks happen here.
pub fn verify(compact: &str, consumer_secret: &str) -> Result<Claims> {
    let segments: Vec<&str> = compact.trim().split('.').collect();
    let [header_b64, payload_b64, signature_b64] = segments.as_slice() else {
        return Err(Error::AssertionStructure(format!(
            "expected 3 segments, found {}",
            segments.len()
        )));
    };

    let header = decode_object(header_b64)
        .map_err(|e| Error::AssertionStructure(format!("header {}", e)))?;
    let typ = header.get("typ").and_then(Value::as_str).unwrap_or_default();
    let alg = header.get("alg").and_then(Value::as_str).unwrap_or_default();
    if typ != EXPECTED_TYP || alg != EXPECTED_ALG {
        return Err(Error::AssertionAlgorithmMismatch {
            typ: typ.to_string(),
            alg: alg.to_string(),
        });
    }

    let expected = hs256(consumer_secret, &format!("{}.{}", header_b64, payload_b64))?;
    let provided = BASE64_URL
        .decode(signature_b64)
        .map_err(|_| Error::AssertionSignatureMismatch)?;
    if !bool::from(expected.as_slice().ct_eq(provided.as_slice())) {
        return Err(Error::AssertionSignatureMismatch);
    }

    let payload = decode_object(payload_b64).map_err(Error::AssertionPayload)?;
    Ok(Claims(payload))
}

/// Produce a compact HS256 token over `claims`, for providers stubbed
/// in-process.
#[doc(hidden)]
pub fn sign(claims: &Map<String, Value>, secret: &str) -> Result<String> {
    let header = serde_json::json!({ "typ": EXPECTED_TYP, "alg": EXPECTED_ALG });
    let header_b64 = BASE64_URL.encode(header.to_string());
    let payload_b64 = BASE64_URL.encode(Value::Object(claims.clone()).to_string());
    let signing_input = format!("{}.{}", header_b64, payload_b64);
    let signature = BASE64_URL.encode(hs256(secret, &signing_input)?);
    Ok(format!("{}.{}", signing_input, signature))
}

// ─────────────────────────────────────────────────────────────────────────────
// Claim policy
// ─────────────────────────────────────────────────────────────────────────────

/// Claim checks applied after a successful [`verify`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityPolicy {
    /// `iss` must equal the provider origin.
    pub check_issuer: bool,
    /// `aud` must equal the consumer key.
    pub check_audience: bool,
    /// `nonce` must equal the nonce sent with the identify request.
    pub check_nonce: bool,
    /// `iat` must not be in the future and `exp` not in the past.
    pub check_times: bool,
    /// Clock skew tolerated by the time checks, in seconds.
    pub leeway_secs: i64,
}

impl Default for IdentityPolicy {
    fn default() -> Self {
        Self {
            check_issuer: true,
            check_audience: true,
            check_nonce: true,
            check_times: true,
            leeway_secs: DEFAULT_LEEWAY_SECS,
        }
    }
}

/// What the claims are checked against.
#[derive(Debug, Clone)]
pub struct ExpectedClaims<'a> {
    pub issuer: &'a str,
    pub audience: &'a str,
    pub nonce: &'a str,
    /// Current time, seconds since the epoch.
    pub now: i64,
}

impl IdentityPolicy {
    /// Disable every check.
    pub fn none() -> Self {
        Self {
            check_issuer: false,
            check_audience: false,
            check_nonce: false,
            check_times: false,
            leeway_secs: DEFAULT_LEEWAY_SECS,
        }
    }

    pub fn with_leeway(mut self, leeway_secs: i64) -> Self {
        self.leeway_secs = leeway_secs;
        self
    }

    pub fn check(&self, claims: &Claims, expected: &ExpectedClaims<'_>) -> Result<()> {
        if self.check_issuer {
            match_claim("iss", claims.iss(), expected.issuer)?;
        }
        if self.check_audience {
            match_claim("aud", claims.aud(), expected.audience)?;
        }
        if self.check_nonce {
            match_claim("nonce", claims.nonce(), expected.nonce)?;
        }
        if self.check_times {
            let iat = claims.iat().ok_or_else(|| rejected("iat", "missing"))?;
            if iat > expected.now + self.leeway_secs {
                return Err(rejected("iat", "issued in the future"));
            }
            let exp = claims.exp().ok_or_else(|| rejected("exp", "missing"))?;
            if exp < expected.now - self.leeway_secs {
                return Err(rejected("exp", "assertion has expired"));
            }
        }
        Ok(())
    }
}

fn rejected(claim: &str, reason: impl Into<String>) -> Error {
    Error::ClaimRejected {
        claim: claim.to_string(),
        reason: reason.into(),
    }
}

fn match_claim(claim: &str, actual: Option<&str>, expected: &str) -> Result<()> {
    match actual {
        Some(value) if value == expected => Ok(()),
        Some(value) => Err(rejected(
            claim,
            format!("expected {:?}, got {:?}", expected, value),
        )),
        None => Err(rejected(claim, "missing")),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Identify call
// ─────────────────────────────────────────────────────────────────────────────

impl OAuthClient {
    /// Ask the provider who the holder of `access_token` is.
    ///
    /// The assertion is verified with the consumer secret and then checked
    /// against the configured [`IdentityPolicy`].
    pub async fn identify(&self, access_token: &Token) -> Result<Claims> {
        let url = self.stage_url("identify", &[])?;
        let oauth = self.oauth_params().with_token(&access_token.key);

        let body = self
            .send_signed(Method::Get, url.as_str(), &oauth, &access_token.secret, None)
            .await?;

        // Refusals come back as JSON instead of a token.
        if let Ok(value) = serde_json::from_str::<Value>(&body)
            && let Some(message) = provider_error(&value)
        {
            tracing::warn!(error = %message, "Provider refused identify request");
            return Err(Error::NotAuthorized(message));
        }

        let config = self.config();
        let claims = verify(&body, &config.consumer.secret)?;

        let issuer = config.provider_origin()?;
        config.identity_policy.check(
            &claims,
            &ExpectedClaims {
                issuer: &issuer,
                audience: &config.consumer.key,
                nonce: oauth.nonce(),
                now: crate::params::current_timestamp(),
            },
        )?;

        tracing::info!(username = claims.username().unwrap_or("<unknown>"), "Identity verified");
        Ok(claims)
    }
}
