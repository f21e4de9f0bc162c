//! Listing tables: the index pages that link down towards spot pages.

use std::fmt;

/// Synthetic column holding each row's outbound link.
pub const SUBLINK_COLUMN: &str = "sublink";

/// One body row of a listing table.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ListingRow {
    pub cells: Vec<String>,
    /// `href` of the anchor in the first cell, if any.
    pub link: Option<String>,
}

impl ListingRow {
    pub fn new(cells: Vec<String>, link: Option<String>) -> Self {
        Self { cells, link }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub header: String,
    /// One entry per row. `None` marks a cell the row never supplied.
    pub values: Vec<Option<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ListingTable {
    columns: Vec<Column>,
    row_count: usize,
}

impl ListingTable {
    /// Build a table from header texts and body rows.
    ///
    /// `headers` may already end with [`SUBLINK_COLUMN`]; links always land in that column
    /// regardless of how many cells their row had. Short rows are padded with `None` and
    /// cells beyond the last header are dropped.
    pub fn from_rows(headers: Vec<String>, rows: Vec<ListingRow>) -> Self {
        let row_count = rows.len();
        let link_column = headers.iter().position(|h| h == SUBLINK_COLUMN);
        let any_links = rows.iter().any(|r| r.link.is_some());

        let mut columns: Vec<Column> = headers
            .into_iter()
            .enumerate()
            .map(|(idx, header)| {
                let values = if Some(idx) == link_column && any_links {
                    rows.iter().map(|r| r.link.clone()).collect()
                } else {
                    rows.iter().map(|r| r.cells.get(idx).cloned()).collect()
                };
                Column { header, values }
            })
            .collect();

        if any_links && link_column.is_none() {
            columns.push(Column {
                header: SUBLINK_COLUMN.to_string(),
                values: rows.iter().map(|r| r.link.clone()).collect(),
            });
        }

        Self { columns, row_count }
    }

    pub fn headers(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.header.as_str()).collect()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, header: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.header == header)
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty() || self.row_count == 0
    }

    /// Row `idx` across all retained columns.
    pub fn row(&self, idx: usize) -> Option<Vec<Option<&str>>> {
        if idx >= self.row_count {
            return None;
        }
        Some(
            self.columns
                .iter()
                .map(|c| c.values[idx].as_deref())
                .collect(),
        )
    }

    pub fn has_sublinks(&self) -> bool {
        self.column(SUBLINK_COLUMN).is_some()
    }

    /// Present, non-empty sublinks in row order.
    pub fn sublinks(&self) -> Vec<&str> {
        self.column(SUBLINK_COLUMN)
            .map(|c| {
                c.values
                    .iter()
                    .filter_map(|v| v.as_deref())
                    .filter(|v| !v.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Drop columns without a header, columns where every value is absent or empty, and
    /// columns whose first value is empty.
    ///
    /// The first-value rule drops a column even when later rows have data. Existing output
    /// files were produced with it, so it stays.
    pub fn clean(mut self) -> Self {
        self.columns.retain(|c| {
            if c.header.is_empty() {
                return false;
            }
            let all_empty = c.values.iter().all(|v| v.as_deref().is_none_or(str::is_empty));
            let first_empty = matches!(c.values.first(), Some(Some(v)) if v.is_empty());
            !(all_empty || first_empty)
        });
        self
    }
}

impl fmt::Display for ListingTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.headers().join(" | "))?;
        for idx in 0..self.row_count {
            let row: Vec<&str> = self
                .columns
                .iter()
                .map(|c| c.values[idx].as_deref().unwrap_or("None"))
                .collect();
            writeln!(f, "{}", row.join(" | "))?;
        }
        Ok(())
    }
}
