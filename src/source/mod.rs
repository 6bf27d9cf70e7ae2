//! Source layer: reading the roster grid from a remote spreadsheet

mod reference;

use tracing::{debug, info};

use crate::error::{PipelineError, RemoteError};
use crate::model::Table;

pub use reference::SheetReference;

/// Raw cell grid of a sheet tab, row-major, every cell as formatted text
pub type Grid = Vec<Vec<String>>;

/// Trait for stores that can hand out the raw grid of a spreadsheet
pub trait SheetSource {
    /// Fetch every cell of the first tab of the spreadsheet.
    ///
    /// Trailing empty cells and rows may be omitted by the store.
    fn fetch_grid(&self, sheet: &SheetReference) -> Result<Grid, RemoteError>;
}

/// Load a sheet into a [`Table`].
///
/// Row 0 becomes the header and the remaining rows the data. An empty sheet
/// loads as [`Table::empty`].
pub fn load_table<S>(source: &S, sheet: &SheetReference) -> Result<Table, PipelineError>
where
    S: SheetSource + ?Sized,
{
    let grid = source
        .fetch_grid(sheet)
        .map_err(PipelineError::SourceUnavailable)?;
    debug!(sheet = %sheet, grid_rows = grid.len(), "Fetched sheet grid");

    let table = Table::from_grid(grid);
    info!(
        sheet = %sheet,
        rows = table.row_count(),
        columns = table.column_count(),
        "Loaded source table"
    );
    Ok(table)
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    struct FixedGrid {
        grid: Grid,
        calls: Cell<usize>,
    }

    impl SheetSource for FixedGrid {
        fn fetch_grid(&self, _sheet: &SheetReference) -> Result<Grid, RemoteError> {
            self.calls.set(self.calls.get() + 1);
            Ok(self.grid.clone())
        }
    }

    struct Forbidden;

    impl SheetSource for Forbidden {
        fn fetch_grid(&self, _sheet: &SheetReference) -> Result<Grid, RemoteError> {
            Err(RemoteError::Api {
                status: 403,
                message: "The caller does not have permission".to_string(),
            })
        }
    }

    fn reference() -> SheetReference {
        SheetReference::parse("https://docs.google.com/spreadsheets/d/abc/edit").unwrap()
    }

    #[test]
    fn test_load_header_and_rows() {
        let source = FixedGrid {
            grid: vec![
                vec!["Classe".into(), "Nom".into()],
                vec!["3A".into(), "Alice".into()],
                vec!["3B".into()],
            ],
            calls: Cell::new(0),
        };
        let table = load_table(&source, &reference()).unwrap();
        assert_eq!(source.calls.get(), 1);
        assert_eq!(table.columns().collect::<Vec<_>>(), vec!["Classe", "Nom"]);
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.rows()[1].get(1), Some(""));
    }

    #[test]
    fn test_load_empty_sheet_is_not_an_error() {
        let source = FixedGrid {
            grid: Vec::new(),
            calls: Cell::new(0),
        };
        let table = load_table(&source, &reference()).unwrap();
        assert_eq!(table, Table::empty());
    }

    #[test]
    fn test_load_header_only() {
        let source = FixedGrid {
            grid: vec![vec!["Classe".into(), "Nom".into(), "Nom".into()]],
            calls: Cell::new(0),
        };
        let table = load_table(&source, &reference()).unwrap();
        assert_eq!(
            table.columns().collect::<Vec<_>>(),
            vec!["Classe", "Nom", "Nom_1"]
        );
        assert_eq!(table.row_count(), 0);
    }

    #[test]
    fn test_remote_failure_is_source_unavailable() {
        let err = load_table(&Forbidden, &reference()).unwrap_err();
        match err {
            PipelineError::SourceUnavailable(cause) => assert!(cause.is_access_problem()),
            other => panic!("unexpected error: {other}"),
        }
    }
}
