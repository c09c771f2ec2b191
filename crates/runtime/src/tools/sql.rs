//! `execute_sql`: run the model's SQL against the lakehouse.

use super::{ToolCall, ToolError, ToolHost};
use crate::model::ToolSpec;
use serde_json::json;
use warehouse::Warehouse;

/// Name of the SQL function agents declare.
pub const EXECUTE_SQL: &str = "execute_sql";

/// Tool host exposing a single [`Warehouse`] as `execute_sql`.
pub struct SqlToolHost<W> {
    warehouse: W,
    specs: Vec<ToolSpec>,
}

impl<W: Warehouse> SqlToolHost<W> {
    pub fn new(warehouse: W) -> Self {
        let spec = ToolSpec {
            name: EXECUTE_SQL.to_string(),
            description: "Execute a SQL query against the lakehouse and return the \
                          result as a markdown table."
                .to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "sql_query": {
                        "type": "string",
                        "description": "The SQL query to execute."
                    }
                },
                "required": ["sql_query"]
            }),
        };
        Self {
            warehouse,
            specs: vec![spec],
        }
    }

    /// Run one query. Failures are folded into the returned text.
    pub async fn execute_sql(&self, sql_query: &str) -> String {
        match self.warehouse.query(sql_query).await {
            Ok(result) => {
                tracing::debug!(rows = result.row_count(), "query succeeded");
                result.to_markdown()
            }
            Err(warehouse::Error::EndpointUnavailable) => {
                "Error: SQL endpoint not available".to_string()
            }
            Err(e) => {
                tracing::warn!(error = %e, "query failed");
                format!("SQL Error: {e}")
            }
        }
    }
}

impl<W: Warehouse> ToolHost for SqlToolHost<W> {
    fn specs(&self) -> &[ToolSpec] {
        &self.specs
    }

    async fn execute(&self, call: &ToolCall) -> Result<String, ToolError> {
        match call.name.as_str() {
            EXECUTE_SQL => Ok(self.execute_sql(call.str_arg("sql_query")).await),
            other => Err(ToolError::NotFound(other.to_string())),
        }
    }
}
