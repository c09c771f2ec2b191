//! Warehouse trait and runtime selection.

use crate::{Error, FabricWarehouse, QueryResult, Result, SqliteWarehouse};
use identity::TokenCredential;
use std::future::Future;

/// Trait for tabular backends.
///
/// One call runs one statement. Implementations own their connection
/// lifecycle: nothing stays open between calls.
pub trait Warehouse: Send + Sync {
    /// Run `sql` and collect every row.
    fn query(&self, sql: &str) -> impl Future<Output = Result<QueryResult>> + Send;
}

/// A warehouse chosen from configuration at startup.
pub enum AnyWarehouse<C> {
    Fabric(FabricWarehouse<C>),
    Sqlite(SqliteWarehouse),
    /// Endpoint discovery failed; every query reports it.
    Unavailable,
}

impl<C> std::fmt::Display for AnyWarehouse<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Fabric(w) => write!(f, "{w}"),
            Self::Sqlite(w) => write!(f, "{w}"),
            Self::Unavailable => write!(f, "unavailable"),
        }
    }
}

impl<C: TokenCredential> Warehouse for AnyWarehouse<C> {
    async fn query(&self, sql: &str) -> Result<QueryResult> {
        match self {
            Self::Fabric(w) => w.query(sql).await,
            Self::Sqlite(w) => w.query(sql).await,
            Self::Unavailable => Err(Error::EndpointUnavailable),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use identity::StaticTokenCredential;

    #[tokio::test]
    async fn unavailable_reports_missing_endpoint() {
        let warehouse: AnyWarehouse<StaticTokenCredential> = AnyWarehouse::Unavailable;
        let err = warehouse.query("SELECT 1").await.unwrap_err();
        assert!(matches!(err, Error::EndpointUnavailable));
        assert_eq!(warehouse.to_string(), "unavailable");
    }
}
