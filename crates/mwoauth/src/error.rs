//! Error types for the OAuth client.

/// Result type alias for this crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while signing, exchanging tokens, calling the API
/// or verifying identity assertions.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Connection failure, timeout, or a response without any data.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The provider refused the request because the client is not (or no
    /// longer) authorized. Callers should restart the authorization flow.
    #[error("Not authorized: {0}")]
    NotAuthorized(String),

    /// The provider answered with something that is not the expected JSON.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// A URL could not be parsed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// An exchange step was attempted out of order.
    #[error("Invalid exchange state: {0}")]
    InvalidState(String),

    /// Client configuration is incomplete or invalid.
    #[error("Config error: {0}")]
    Config(String),

    /// The token store failed to load or save a token.
    #[error("Storage error: {0}")]
    Storage(String),

    /// The identity assertion is not a well-formed three-segment token.
    #[error("Identity assertion is malformed: {0}")]
    AssertionStructure(String),

    /// The identity assertion header names an unsupported type or algorithm.
    #[error("Identity assertion uses unsupported typ={typ:?} alg={alg:?}")]
    AssertionAlgorithmMismatch { typ: String, alg: String },

    /// The identity assertion signature does not match.
    #[error("Identity assertion signature mismatch")]
    AssertionSignatureMismatch,

    /// The identity assertion payload could not be decoded.
    #[error("Identity assertion payload is invalid: {0}")]
    AssertionPayload(String),

    /// A verified identity assertion failed a claim check.
    #[error("Identity claim '{claim}' rejected: {reason}")]
    ClaimRejected { claim: String, reason: String },
}

impl Error {
    /// Check if this is the "not yet authorized" signal.
    pub fn is_not_authorized(&self) -> bool {
        matches!(self, Error::NotAuthorized(_))
    }

    /// Check if this error came out of identity assertion verification.
    pub fn is_assertion_error(&self) -> bool {
        matches!(
            self,
            Error::AssertionStructure(_)
                | Error::AssertionAlgorithmMismatch { .. }
                | Error::AssertionSignatureMismatch
                | Error::AssertionPayload(_)
        )
    }

    /// Check if the caller should send the user through authorization again.
    pub fn requires_reauthorization(&self) -> bool {
        matches!(self, Error::NotAuthorized(_) | Error::InvalidState(_))
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Transport(e.to_string())
    }
}
