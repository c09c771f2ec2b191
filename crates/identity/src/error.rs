use thiserror::Error;

/// Credential errors.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new variants
/// in future versions without breaking downstream code.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The credential source is not configured in this environment.
    #[error("credential unavailable: {0}")]
    Unavailable(String),

    /// The token endpoint could not be reached.
    #[error("network error: {0}")]
    Network(String),

    /// The token endpoint rejected the request.
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// The token response could not be understood.
    #[error("invalid token response: {0}")]
    InvalidResponse(String),

    /// Running the Azure CLI failed.
    #[error("azure cli: {0}")]
    Cli(String),

    /// Every source in a chain failed.
    #[error("no credential source succeeded:\n{}", .0.join("\n"))]
    Exhausted(Vec<String>),
}

pub type Result<T> = std::result::Result<T, Error>;
