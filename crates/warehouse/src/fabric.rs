//! Lakehouse SQL analytics endpoint over TDS.

use crate::{Error, QueryResult, Result, Warehouse, render};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use identity::{CachedCredential, SQL_DATABASE_SCOPE, TokenCredential};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tiberius::{AuthMethod, Client, ColumnData, Config, EncryptionLevel, FromSql};
use tokio::net::TcpStream;
use tokio_util::compat::{Compat, TokioAsyncWriteCompatExt};

const DEFAULT_PORT: u16 = 1433;
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);
const APPLICATION_NAME: &str = "lakechat";

/// SQL Server error number for a rejected login.
const LOGIN_FAILED: u32 = 18456;

type TdsClient = Client<Compat<TcpStream>>;

/// Host and port of a SQL endpoint.
///
/// Parses the connection strings Fabric hands out: `host`, `host,port`,
/// `host:port`, optionally prefixed with `tcp:`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlEndpoint {
    pub host: String,
    pub port: u16,
}

impl FromStr for SqlEndpoint {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let s = s.strip_prefix("tcp:").unwrap_or(s);
        let (host, port) = match s.rsplit_once(|c: char| c == ',' || c == ':') {
            Some((host, port)) => {
                let port = port
                    .trim()
                    .parse()
                    .map_err(|_| Error::InvalidEndpoint(format!("bad port in '{s}'")))?;
                (host.trim(), port)
            }
            None => (s, DEFAULT_PORT),
        };
        if host.is_empty() {
            return Err(Error::InvalidEndpoint("empty host".into()));
        }
        Ok(Self {
            host: host.to_string(),
            port,
        })
    }
}

impl std::fmt::Display for SqlEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{},{}", self.host, self.port)
    }
}

/// Lakehouse reached through its SQL analytics endpoint.
pub struct FabricWarehouse<C> {
    endpoint: SqlEndpoint,
    database: String,
    credential: Arc<CachedCredential<C>>,
    timeout: Duration,
}

impl<C: TokenCredential> FabricWarehouse<C> {
    /// Query `database` (the lakehouse name) on `endpoint`.
    pub fn new(
        endpoint: SqlEndpoint,
        database: impl Into<String>,
        credential: Arc<CachedCredential<C>>,
    ) -> Self {
        Self {
            endpoint,
            database: database.into(),
            credential,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Bound each query, including connect and login, by `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    async fn query_with_reauth(&self, sql: &str) -> Result<QueryResult> {
        match self.query_once(sql).await {
            Err(Error::Sql(tiberius::error::Error::Server(e))) if e.code() == LOGIN_FAILED => {
                tracing::warn!(endpoint = %self.endpoint, "login rejected, refreshing token");
                self.credential.invalidate(SQL_DATABASE_SCOPE);
                self.query_once(sql).await
            }
            other => other,
        }
    }

    async fn query_once(&self, sql: &str) -> Result<QueryResult> {
        let token = self.credential.token(SQL_DATABASE_SCOPE).await?;
        let mut client = self.connect(&token.token).await?;

        let result = run(&mut client, sql).await;
        if let Err(e) = client.close().await {
            tracing::debug!(error = %e, "closing sql connection failed");
        }
        result
    }

    async fn connect(&self, token: &str) -> Result<TdsClient> {
        let config = self.config(&self.endpoint.host, self.endpoint.port, token);
        match open(config).await {
            Err(Error::Sql(tiberius::error::Error::Routing { host, port })) => {
                tracing::debug!(%host, port, "following sql endpoint redirect");
                open(self.config(&host, port, token)).await
            }
            other => other,
        }
    }

    fn config(&self, host: &str, port: u16, token: &str) -> Config {
        let mut config = Config::new();
        config.host(host);
        config.port(port);
        config.database(&self.database);
        config.application_name(APPLICATION_NAME);
        config.authentication(AuthMethod::aad_token(token));
        config.encryption(EncryptionLevel::Required);
        config
    }
}

impl<C> std::fmt::Display for FabricWarehouse<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "fabric({}/{})", self.endpoint, self.database)
    }
}

impl<C: TokenCredential> Warehouse for FabricWarehouse<C> {
    async fn query(&self, sql: &str) -> Result<QueryResult> {
        tracing::debug!(endpoint = %self.endpoint, database = %self.database, "running query");
        tokio::time::timeout(self.timeout, self.query_with_reauth(sql))
            .await
            .map_err(|_| Error::Timeout(self.timeout))?
    }
}

async fn open(config: Config) -> Result<TdsClient> {
    let tcp = TcpStream::connect(config.get_addr()).await?;
    tcp.set_nodelay(true)?;
    Ok(Client::connect(config, tcp.compat_write()).await?)
}

async fn run(client: &mut TdsClient, sql: &str) -> Result<QueryResult> {
    let mut stream = client.simple_query(sql).await?;
    let columns: Vec<String> = stream
        .columns()
        .await?
        .map(|cols| cols.iter().map(|c| c.name().to_string()).collect())
        .unwrap_or_default();

    let rows = stream
        .into_first_result()
        .await?
        .into_iter()
        .map(|row| row.into_iter().map(render_cell).collect::<Result<Vec<_>>>())
        .collect::<Result<Vec<_>>>()?;

    Ok(QueryResult::new(columns, rows))
}

fn render_cell(data: ColumnData<'static>) -> Result<Option<String>> {
    let rendered = match &data {
        ColumnData::U8(v) => v.map(|v| v.to_string()),
        ColumnData::I16(v) => v.map(|v| v.to_string()),
        ColumnData::I32(v) => v.map(|v| v.to_string()),
        ColumnData::I64(v) => v.map(|v| v.to_string()),
        ColumnData::F32(v) => v.map(|v| render::float(f64::from(v))),
        ColumnData::F64(v) => v.map(render::float),
        ColumnData::Bit(v) => v.map(render::boolean),
        ColumnData::String(v) => v.as_ref().map(|s| s.to_string()),
        ColumnData::Guid(v) => v.as_ref().map(|g| g.to_string()),
        ColumnData::Binary(v) => v.as_ref().map(|b| render::bytes(b)),
        ColumnData::Numeric(v) => v.as_ref().map(|n| n.to_string()),
        ColumnData::Xml(v) => v.as_ref().map(|x| x.clone().into_owned().into_string()),
        ColumnData::DateTime(_) | ColumnData::SmallDateTime(_) | ColumnData::DateTime2(_) => {
            NaiveDateTime::from_sql(&data)?.map(render::datetime)
        }
        ColumnData::Date(_) => NaiveDate::from_sql(&data)?.map(|v| v.to_string()),
        ColumnData::Time(_) => NaiveTime::from_sql(&data)?.map(render::time),
        ColumnData::DateTimeOffset(_) => {
            DateTime::<FixedOffset>::from_sql(&data)?.map(render::datetime_offset)
        }
    };
    Ok(rendered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::borrow::Cow;

    #[test]
    fn parses_fabric_connection_strings() {
        let plain: SqlEndpoint = "abc.datawarehouse.fabric.microsoft.com".parse().unwrap();
        assert_eq!(plain.host, "abc.datawarehouse.fabric.microsoft.com");
        assert_eq!(plain.port, 1433);

        let comma: SqlEndpoint = "tcp:abc.example.com,1444".parse().unwrap();
        assert_eq!(comma.host, "abc.example.com");
        assert_eq!(comma.port, 1444);

        let colon: SqlEndpoint = "abc.example.com:1500".parse().unwrap();
        assert_eq!(colon.port, 1500);
    }

    #[test]
    fn rejects_bad_endpoints() {
        assert!("abc.example.com,notaport".parse::<SqlEndpoint>().is_err());
        assert!("".parse::<SqlEndpoint>().is_err());
    }

    #[test]
    fn renders_scalar_cells() {
        assert_eq!(render_cell(ColumnData::I32(Some(7))).unwrap(), Some("7".into()));
        assert_eq!(render_cell(ColumnData::I64(None)).unwrap(), None);
        assert_eq!(render_cell(ColumnData::F64(Some(2.0))).unwrap(), Some("2.0".into()));
        assert_eq!(render_cell(ColumnData::Bit(Some(true))).unwrap(), Some("True".into()));
        assert_eq!(
            render_cell(ColumnData::String(Some(Cow::Borrowed("x")))).unwrap(),
            Some("x".into())
        );
        assert_eq!(render_cell(ColumnData::String(None)).unwrap(), None);
    }
}
