//! Local SQLite snapshot backend.

use crate::{Error, QueryResult, Result, Warehouse, render};
use rusqlite::types::ValueRef;
use rusqlite::{Connection, InterruptHandle, OpenFlags};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::oneshot;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);
/// How often an interrupted query is nudged again while it winds down.
const INTERRUPT_RETRY: Duration = Duration::from_millis(50);

/// SQLite file holding a snapshot of the lakehouse tables.
///
/// Each query opens the file read-only on a blocking thread and closes it
/// before returning, including after a timeout. The file is never created:
/// a missing snapshot is an error.
#[derive(Debug, Clone)]
pub struct SqliteWarehouse {
    path: PathBuf,
    timeout: Duration,
}

impl SqliteWarehouse {
    /// Use the snapshot at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if !path.is_file() {
            return Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("sqlite snapshot not found: {}", path.display()),
            )));
        }
        Ok(Self {
            path,
            timeout: DEFAULT_TIMEOUT,
        })
    }

    /// Bound each query by `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl std::fmt::Display for SqliteWarehouse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "sqlite({})", self.path.display())
    }
}

impl Warehouse for SqliteWarehouse {
    async fn query(&self, sql: &str) -> Result<QueryResult> {
        let path = self.path.clone();
        let sql = sql.to_string();
        let (handle_tx, handle_rx) = oneshot::channel();
        let mut task = tokio::task::spawn_blocking(move || run_query(&path, &sql, handle_tx));

        match tokio::time::timeout(self.timeout, &mut task).await {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => Err(Error::Task(e.to_string())),
            Err(_) => {
                tracing::warn!(timeout = ?self.timeout, "query timed out, interrupting");
                // Open failed before a handle existed: the task is already done.
                if let Ok(handle) = handle_rx.await {
                    loop {
                        handle.interrupt();
                        if tokio::time::timeout(INTERRUPT_RETRY, &mut task).await.is_ok() {
                            break;
                        }
                    }
                }
                Err(Error::Timeout(self.timeout))
            }
        }
    }
}

fn run_query(
    path: &Path,
    sql: &str,
    handle_tx: oneshot::Sender<InterruptHandle>,
) -> Result<QueryResult> {
    let flags = OpenFlags::SQLITE_OPEN_READ_ONLY
        | OpenFlags::SQLITE_OPEN_URI
        | OpenFlags::SQLITE_OPEN_NO_MUTEX;
    let conn = Connection::open_with_flags(path, flags)?;
    let _ = handle_tx.send(conn.get_interrupt_handle());

    let result = collect(&conn, sql);
    if let Err((_, e)) = conn.close() {
        tracing::debug!(error = %e, "closing sqlite snapshot failed");
    }
    result
}

fn collect(conn: &Connection, sql: &str) -> Result<QueryResult> {
    let mut stmt = conn.prepare(sql)?;
    let columns: Vec<String> = stmt
        .column_names()
        .into_iter()
        .map(String::from)
        .collect();
    let width = columns.len();

    let mut rows = Vec::new();
    let mut cursor = stmt.query([])?;
    while let Some(row) = cursor.next()? {
        let mut cells = Vec::with_capacity(width);
        for idx in 0..width {
            cells.push(render_value(row.get_ref(idx)?));
        }
        rows.push(cells);
    }

    Ok(QueryResult::new(columns, rows))
}

fn render_value(value: ValueRef<'_>) -> Option<String> {
    match value {
        ValueRef::Null => None,
        ValueRef::Integer(i) => Some(i.to_string()),
        ValueRef::Real(f) => Some(render::float(f)),
        ValueRef::Text(t) => Some(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Blob(b) => Some(render::bytes(b)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn snapshot(rows: usize) -> (TempDir, SqliteWarehouse) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snapshot.db");
        let conn = Connection::open(&path).unwrap();
        conn.execute_batch(
            "CREATE TABLE patients (name TEXT, visits INTEGER, balance REAL);",
        )
        .unwrap();
        for i in 0..rows {
            conn.execute(
                "INSERT INTO patients VALUES (?1, ?2, ?3)",
                rusqlite::params![format!("p{i}"), i as i64, 1.5],
            )
            .unwrap();
        }
        conn.execute(
            "INSERT INTO patients VALUES ('nobody', NULL, 2.0)",
            [],
        )
        .unwrap();
        drop(conn);

        let warehouse = SqliteWarehouse::open(&path).unwrap();
        (dir, warehouse)
    }

    #[tokio::test]
    async fn query_renders_values() {
        let (_dir, warehouse) = snapshot(1);
        let result = warehouse
            .query("SELECT name, visits, balance FROM patients ORDER BY name")
            .await
            .unwrap();

        assert_eq!(result.columns, vec!["name", "visits", "balance"]);
        assert_eq!(
            result.rows,
            vec![
                vec![Some("nobody".into()), None, Some("2.0".into())],
                vec![Some("p0".into()), Some("0".into()), Some("1.5".into())],
            ]
        );
    }

    #[tokio::test]
    async fn invalid_sql_is_an_error() {
        let (_dir, warehouse) = snapshot(0);
        let err = warehouse.query("SELECT * FROM missing").await.unwrap_err();
        assert!(matches!(err, Error::Sqlite(_)));
        assert!(err.to_string().contains("missing"));
    }

    #[tokio::test]
    async fn many_rows_are_all_collected() {
        let (_dir, warehouse) = snapshot(74);
        let result = warehouse.query("SELECT name FROM patients").await.unwrap();
        assert_eq!(result.row_count(), 75);
        assert!(result.to_markdown().contains("... and 25 more rows"));
    }

    #[tokio::test]
    async fn snapshot_is_read_only() {
        let (_dir, warehouse) = snapshot(2);
        let err = warehouse.query("DROP TABLE patients").await.unwrap_err();
        assert!(matches!(err, Error::Sqlite(_)));
        assert!(err.to_string().contains("readonly"), "{err}");

        let result = warehouse.query("SELECT name FROM patients").await.unwrap();
        assert_eq!(result.row_count(), 3);
    }

    #[tokio::test]
    async fn timeout_interrupts_the_running_query() {
        let (_dir, warehouse) = snapshot(0);
        let warehouse = warehouse.with_timeout(Duration::from_millis(200));
        let started = std::time::Instant::now();

        let err = warehouse
            .query(
                "WITH RECURSIVE c(x) AS (SELECT 1 UNION ALL SELECT x + 1 FROM c \
                 WHERE x < 1000000000) SELECT count(*) FROM c",
            )
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Timeout(d) if d == Duration::from_millis(200)));
        assert_eq!(err.to_string(), "query timed out after 200ms");
        // The connection was closed, not left running in the background.
        assert!(started.elapsed() < Duration::from_secs(5), "{:?}", started.elapsed());

        let result = warehouse.query("SELECT count(*) FROM patients").await.unwrap();
        assert_eq!(result.rows, vec![vec![Some("1".to_string())]]);
    }

    #[test]
    fn missing_snapshot_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let err = SqliteWarehouse::open(dir.path().join("nope.db")).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
