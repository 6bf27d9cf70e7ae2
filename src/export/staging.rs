//! CSV staging file handed to the upload call

use std::fs::File;
use std::io::{self, BufReader};
use std::path::Path;

use csv::QuoteStyle;
use tempfile::NamedTempFile;
use tracing::warn;

use crate::model::Table;

/// A table serialized to a temporary CSV file.
///
/// The file is deleted when the value is released or dropped, so every exit
/// path of an export removes it, including unwinding out of an upload call.
pub struct StagedTable {
    file: NamedTempFile,
    rows: usize,
}

impl StagedTable {
    /// Serialize `table` with its header row first.
    ///
    /// Every field is quoted and written verbatim: values such as `007` or
    /// `3,5` come back exactly as they went in.
    pub fn write(table: &Table) -> Result<Self, csv::Error> {
        let mut file = tempfile::Builder::new()
            .prefix("classsheet-")
            .suffix(".csv")
            .tempfile()?;

        {
            let mut writer = csv::WriterBuilder::new()
                .quote_style(QuoteStyle::Always)
                .from_writer(file.as_file_mut());

            if table.column_count() > 0 {
                writer.write_record(table.columns())?;
                for row in table.rows() {
                    writer.write_record(row.cells())?;
                }
            }
            writer.flush()?;
        }

        Ok(Self {
            file,
            rows: table.row_count(),
        })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Number of data rows, header excluded
    pub fn row_count(&self) -> usize {
        self.rows
    }

    /// Raw staged bytes
    pub fn contents(&self) -> io::Result<Vec<u8>> {
        std::fs::read(self.file.path())
    }

    /// Parse the staged file back into a table
    pub fn read_table(&self) -> Result<Table, csv::Error> {
        let reader = BufReader::new(File::open(self.file.path())?);
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_reader(reader);

        let headers: Vec<String> = csv_reader.headers()?.iter().map(str::to_string).collect();
        let mut table = Table::with_headers(headers.as_slice());
        for record in csv_reader.records() {
            table.push_row(record?.iter().map(str::to_string).collect());
        }
        Ok(table)
    }

    /// Delete the staging file now, logging instead of failing if that breaks
    pub fn release(self) {
        let path = self.file.path().to_path_buf();
        if let Err(e) = self.file.close() {
            warn!(path = %path.display(), error = %e, "Failed to delete staging file");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roster() -> Table {
        let mut table = Table::with_headers(&["Classe", "Nom", "Matricule", "Moyenne", "Note"]);
        table.push_row(vec![
            "3A".into(),
            "Alice".into(),
            "007".into(),
            "3,5".into(),
            "dit \"bonjour\"\nligne 2".into(),
        ]);
        table.push_row(vec![
            "3B".into(),
            "Chloé".into(),
            "0042".into(),
            "1e3".into(),
            "".into(),
        ]);
        table
    }

    #[test]
    fn test_round_trip_is_string_exact() {
        let table = roster();
        let staged = StagedTable::write(&table).unwrap();
        assert_eq!(staged.row_count(), 2);
        assert_eq!(staged.read_table().unwrap(), table);
    }

    #[test]
    fn test_header_row_first_and_quoted() {
        let staged = StagedTable::write(&roster()).unwrap();
        let contents = String::from_utf8(staged.contents().unwrap()).unwrap();
        let first_line = contents.lines().next().unwrap();
        assert_eq!(
            first_line,
            "\"Classe\",\"Nom\",\"Matricule\",\"Moyenne\",\"Note\""
        );
        assert!(contents.contains("\"007\""));
    }

    #[test]
    fn test_single_empty_column_survives() {
        let mut table = Table::with_headers(&["Classe"]);
        table.push_row(vec!["".into()]);
        table.push_row(vec!["3A".into()]);
        let staged = StagedTable::write(&table).unwrap();
        assert_eq!(staged.read_table().unwrap(), table);
    }

    #[test]
    fn test_release_deletes_file() {
        let staged = StagedTable::write(&roster()).unwrap();
        let path = staged.path().to_path_buf();
        assert!(path.exists());
        staged.release();
        assert!(!path.exists());
    }

    #[test]
    fn test_drop_deletes_file() {
        let path = {
            let staged = StagedTable::write(&roster()).unwrap();
            staged.path().to_path_buf()
        };
        assert!(!path.exists());
    }
}
