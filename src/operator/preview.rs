//! Table preview for the terminal

use tabled::builder::Builder;
use tabled::settings::Style;

use crate::model::Table;

/// Render the header and the first `limit` rows as a boxed text table
pub fn render_preview(table: &Table, limit: usize) -> String {
    if table.column_count() == 0 {
        return String::new();
    }

    let mut builder = Builder::default();
    builder.push_record(table.columns().map(str::to_string));
    for row in table.rows().iter().take(limit) {
        builder.push_record(row.cells().iter().cloned());
    }

    let mut rendered = builder.build();
    rendered.with(Style::rounded());
    rendered.to_string()
}
