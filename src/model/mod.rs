//! Data model for tabular roster data

mod header;
mod table;

pub use header::normalize_headers;
pub use table::{Row, RowShape, Table};
