//! OAuth 1.0a client for MediaWiki's `Special:OAuth`.
//!
//! Lets a tool act on a wiki on behalf of a user: obtain a request token,
//! send the user to approve it, trade the verifier for an access token,
//! then make signed API calls and verify who the user is.
//!
//! # Components
//!
//! - [`signer`] — HMAC-SHA1 request signing over the canonical base string
//! - [`exchange`] — request token → user authorization → access token
//! - [`invoker`] — signed API calls with an access token
//! - [`identity`] — `/identify` JWT verification and claim checks
//! - [`token_store`] — token persistence between requests

pub mod client;
pub mod config;
pub mod error;
pub mod exchange;
pub mod identity;
pub mod invoker;
pub mod params;
pub mod signer;
pub mod token;
pub mod token_store;

pub use client::OAuthClient;
pub use config::ClientConfig;
pub use error::{Error, Result};
pub use exchange::{ExchangeState, TokenExchange};
pub use identity::{Claims, ExpectedClaims, IdentityPolicy, verify};
pub use invoker::ApiInvoker;
pub use params::OAuthParams;
pub use signer::{Method, ParamMap, Signer};
pub use token::{Consumer, Token, TokenStage};
pub use token_store::{FileTokenStore, InMemoryTokenStore, SharedTokenStore, TokenStore};
