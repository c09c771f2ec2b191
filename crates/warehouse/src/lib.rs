//! Tabular backends for lakechat's `execute_sql` tool.
//!
//! The agent answers questions by writing SQL; this crate runs that SQL and
//! turns the rows into the markdown table the model reads back.
//!
//! # Overview
//!
//! ## Warehouse
//!
//! The [`Warehouse`] trait is the seam between the tool loop and the data.
//! One call, one statement, one [`QueryResult`] (or an [`Error`]).
//!
//! Implementations:
//!
//! - [`FabricWarehouse`]: the lakehouse SQL analytics endpoint over TDS,
//!   authenticated with an Entra ID token. Connections are opened per query
//!   and closed on every path.
//! - [`SqliteWarehouse`]: a local SQLite snapshot of the same tables. Handy
//!   for offline demos and for tests.
//! - [`AnyWarehouse`]: picks one of the above at runtime, or reports that
//!   no endpoint is available.
//!
//! ## QueryResult
//!
//! Column names plus rows of rendered cells. [`QueryResult::to_markdown`]
//! produces the exact table format the agent's prompt was written against:
//! at most [`MAX_DISPLAY_ROWS`] rows, `NULL` for nulls, and a trailing row
//! count.
//!
//! ## Endpoint discovery
//!
//! [`LakehouseClient`] asks the Fabric REST API for the SQL endpoint host of
//! a lakehouse.
//!
//! # Example
//!
//! ```no_run
//! use warehouse::{SqliteWarehouse, Warehouse};
//!
//! # async fn example() -> warehouse::Result<()> {
//! let warehouse = SqliteWarehouse::open("snapshot.db")?;
//! let result = warehouse.query("SELECT name, total FROM orders").await?;
//! println!("{}", result.to_markdown());
//! # Ok(())
//! # }
//! ```

mod backend;
mod endpoint;
mod error;
mod fabric;
mod render;
mod sqlite;
mod table;

pub use backend::{AnyWarehouse, Warehouse};
pub use endpoint::{DEFAULT_FABRIC_API_BASE, LakehouseClient};
pub use error::{Error, Result};
pub use fabric::{FabricWarehouse, SqlEndpoint};
pub use sqlite::SqliteWarehouse;
pub use table::{MAX_DISPLAY_ROWS, QueryResult};
