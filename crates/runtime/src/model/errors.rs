use thiserror::Error;

/// Errors from model provider calls.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new variants
/// in future versions without breaking downstream code.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ModelError {
    /// A network error occurred during the API call.
    #[error("network: {0}")]
    Network(String),

    /// No token could be obtained for the provider.
    #[error("authentication: {0}")]
    Auth(String),

    /// The provider returned an error response.
    #[error("provider api: {status}: {body}")]
    Api { status: u16, body: String },

    /// The provider response could not be parsed or reported a failure.
    #[error("invalid provider response: {0}")]
    InvalidResponse(String),

    /// The request did not complete in time.
    #[error("request timed out")]
    Timeout,
}
