//! Row filtering by class membership

use tracing::debug;

use crate::model::Table;

use super::selection::Selection;

/// Keep the rows whose `column` cell is in `selection`, in source order.
///
/// A missing column or an empty selection gives [`Table::empty`].
pub fn filter_rows(table: &Table, column: &str, selection: &Selection) -> Table {
    let Some(index) = table.column_index(column) else {
        return Table::empty();
    };
    if selection.is_empty() {
        return Table::empty();
    }

    let filtered = table.retain_rows(|row| row.get(index).is_some_and(|v| selection.contains(v)));
    debug!(
        column,
        selected = selection.len(),
        kept = filtered.row_count(),
        of = table.row_count(),
        "Filtered rows by class"
    );
    filtered
}
