//! Labeled table: string cells under uniquely named columns

use indexmap::IndexSet;
use tracing::warn;

use super::header::normalize_headers;

/// A row of string cells, one per table column, in column order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    cells: Vec<String>,
}

impl Row {
    /// Get a cell by column index
    pub fn get(&self, index: usize) -> Option<&str> {
        self.cells.get(index).map(String::as_str)
    }

    /// All cells in column order
    pub fn cells(&self) -> &[String] {
        &self.cells
    }
}

/// How a raw row was fitted to the header width
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowShape {
    Exact,
    Padded,
    Truncated,
}

/// An ordered collection of rows sharing a uniquely named column set.
///
/// Tables are built once and then only read; filtering produces a new table.
#[derive(Debug, Clone, Default)]
pub struct Table {
    columns: IndexSet<String>,
    rows: Vec<Row>,
}

impl PartialEq for Table {
    fn eq(&self, other: &Self) -> bool {
        // IndexSet equality ignores order, column order matters here
        self.columns.iter().eq(other.columns.iter()) && self.rows == other.rows
    }
}

impl Eq for Table {}

impl Table {
    /// A table with no columns and no rows
    pub fn empty() -> Self {
        Self::default()
    }

    /// Create a table with no rows from a raw header row.
    ///
    /// Header values go through [`normalize_headers`] so names are unique.
    pub fn with_headers<S: AsRef<str>>(headers: &[S]) -> Self {
        Self {
            columns: normalize_headers(headers).into_iter().collect(),
            rows: Vec::new(),
        }
    }

    /// Build a table from a raw grid whose first row is the header.
    ///
    /// An empty grid gives an empty table. Short rows are padded with empty
    /// cells and long rows are truncated to the header width.
    pub fn from_grid(grid: Vec<Vec<String>>) -> Self {
        let mut rows = grid.into_iter();
        let Some(header) = rows.next() else {
            return Self::empty();
        };

        let mut table = Self::with_headers(header.as_slice());
        let mut truncated = 0usize;
        for cells in rows {
            if table.push_row(cells) == RowShape::Truncated {
                truncated += 1;
            }
        }

        if truncated > 0 {
            warn!(
                rows = truncated,
                columns = table.column_count(),
                "Rows had cells beyond the header width, extra cells dropped"
            );
        }

        table
    }

    /// Append a row, fitting it to the header width
    pub fn push_row(&mut self, mut cells: Vec<String>) -> RowShape {
        let width = self.columns.len();
        let shape = match cells.len() {
            n if n == width => RowShape::Exact,
            n if n < width => RowShape::Padded,
            _ => RowShape::Truncated,
        };
        cells.resize(width, String::new());
        self.rows.push(Row { cells });
        shape
    }

    /// New table with the same columns holding only the rows that match
    pub fn retain_rows<F>(&self, mut keep: F) -> Table
    where
        F: FnMut(&Row) -> bool,
    {
        Table {
            columns: self.columns.clone(),
            rows: self.rows.iter().filter(|row| keep(row)).cloned().collect(),
        }
    }

    /// Column names in header order
    pub fn columns(&self) -> impl ExactSizeIterator<Item = &str> {
        self.columns.iter().map(String::as_str)
    }

    /// Get column index by name
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.get_index_of(name)
    }

    /// All rows in source order
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Number of rows
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Number of columns
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// True when the table has no data rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
