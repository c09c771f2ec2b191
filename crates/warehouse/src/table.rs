//! Query results and their markdown rendering.

/// Rows beyond this are summarised instead of listed.
pub const MAX_DISPLAY_ROWS: usize = 50;

/// Column names and rendered cells; `None` is SQL NULL.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryResult {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Option<String>>>,
}

impl QueryResult {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Option<String>>>) -> Self {
        Self { columns, rows }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Render as a pipe table followed by the row count.
    ///
    /// ```text
    /// | name | n |
    /// |---|---|
    /// | a | 1 |
    /// | b | NULL |
    ///
    /// (2 rows returned)
    /// ```
    pub fn to_markdown(&self) -> String {
        let total = self.rows.len();
        let mut lines = Vec::with_capacity(total.min(MAX_DISPLAY_ROWS) + 4);

        lines.push(format!("| {} |", self.columns.join(" | ")));
        lines.push(format!("|{}|", vec!["---"; self.columns.len()].join("|")));

        for row in self.rows.iter().take(MAX_DISPLAY_ROWS) {
            let cells: Vec<&str> = row
                .iter()
                .map(|cell| cell.as_deref().unwrap_or("NULL"))
                .collect();
            lines.push(format!("| {} |", cells.join(" | ")));
        }

        if total > MAX_DISPLAY_ROWS {
            lines.push(format!("\n... and {} more rows", total - MAX_DISPLAY_ROWS));
        }
        lines.push(format!("\n({total} rows returned)"));

        lines.join("\n")
    }
}
