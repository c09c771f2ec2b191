use std::time::Duration;
use thiserror::Error;

/// Warehouse errors.
///
/// The display text of a query failure is what the model sees after
/// `SQL Error: `, so backend messages are passed through unwrapped.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error("{0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("{0}")]
    Sql(#[from] tiberius::error::Error),

    #[error(transparent)]
    Credential(#[from] identity::Error),

    #[error("connection failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("query timed out after {}", display_timeout(.0))]
    Timeout(Duration),

    #[error("SQL endpoint not available")]
    EndpointUnavailable,

    #[error("invalid SQL endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("fabric api: {0}")]
    Api(String),

    #[error("query task failed: {0}")]
    Task(String),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Whole seconds as `60s`; anything finer as `Duration`'s debug form
/// (`200ms`, `1.5s`).
fn display_timeout(timeout: &Duration) -> String {
    if timeout.subsec_nanos() == 0 {
        format!("{}s", timeout.as_secs())
    } else {
        format!("{timeout:?}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_display() {
        let whole = Error::Timeout(Duration::from_secs(60));
        assert_eq!(whole.to_string(), "query timed out after 60s");

        let short = Error::Timeout(Duration::from_millis(200));
        assert_eq!(short.to_string(), "query timed out after 200ms");

        let mixed = Error::Timeout(Duration::from_millis(1500));
        assert_eq!(mixed.to_string(), "query timed out after 1.5s");
    }
}
