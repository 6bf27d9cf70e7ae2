//! Operator front ends: where selections and names come from and where
//! status messages go

mod preview;
mod scripted;
mod terminal;

use std::fmt;
use std::io;

use termcolor::{Color, ColorSpec, WriteColor};

use crate::export::DocumentId;
use crate::model::Table;
use crate::select::{ClassSet, Selection, SelectionError};

pub use preview::render_preview;
pub use scripted::ScriptedOperator;
pub use terminal::TerminalOperator;

/// Non-fatal conditions the operator is told about
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    /// The source sheet has no header row
    EmptySource,
    /// The source sheet has a header row but no student rows
    NoRows,
    /// The class column is absent, no class can be offered
    MissingColumn { column: String },
    /// No class was selected
    EmptySelection,
    /// The selection did not resolve against the offered classes
    InvalidSelection(SelectionError),
    /// The selected classes matched no row; export is blocked
    EmptyResult { selection: Vec<String> },
    /// The output name was blank
    EmptyName,
    /// The source sheet refused the service account
    SourceNotShared { identity: String },
    /// The destination folder refused the service account
    FolderNotShared { identity: String },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::EmptySource => write!(f, "the source sheet is empty"),
            Warning::NoRows => write!(f, "the source sheet has headers but no students"),
            Warning::MissingColumn { column } => {
                write!(f, "column '{}' not found in the source sheet", column)
            }
            Warning::EmptySelection => write!(f, "select at least one class"),
            Warning::InvalidSelection(err) => write!(f, "invalid selection: {}", err),
            Warning::EmptyResult { selection } => write!(
                f,
                "no student found for {}, choose other classes",
                selection.join(", ")
            ),
            Warning::EmptyName => write!(f, "the file name cannot be empty"),
            Warning::SourceNotShared { identity } => write!(
                f,
                "check the address and share the source sheet with {}",
                identity
            ),
            Warning::FolderNotShared { identity } => write!(
                f,
                "give {} edit access to the destination folder",
                identity
            ),
        }
    }
}

/// Progress reported to the operator
#[derive(Debug, Clone, Copy)]
pub enum Status<'a> {
    Authenticated { identity: Option<&'a str> },
    Loaded { rows: usize, columns: usize },
    Warning(&'a Warning),
    Filtered { table: &'a Table },
    Exported { title: &'a str, document: &'a DocumentId },
    NothingToExport,
    Cancelled,
}

/// Capabilities a front end offers the pipeline.
///
/// `None` from a prompt means the operator's input is closed.
pub trait Operator {
    /// Pick classes among `classes`
    fn select_classes(&mut self, classes: &ClassSet) -> io::Result<Option<Selection>>;

    /// Name of the output document, without timestamp
    fn name_output(&mut self) -> io::Result<Option<String>>;

    /// Last chance to abort before the upload starts
    fn confirm_export(&mut self, _title: &str, _rows: usize) -> io::Result<bool> {
        Ok(true)
    }

    fn report_status(&mut self, status: Status<'_>) -> io::Result<()>;
}

/// Render a status line, colored when the writer supports it
pub fn write_status(
    writer: &mut dyn WriteColor,
    status: Status<'_>,
    preview_rows: usize,
) -> io::Result<()> {
    match status {
        Status::Authenticated { identity } => match identity {
            Some(identity) => writeln!(writer, "Authenticated as {}", identity),
            None => writeln!(writer, "Authenticated"),
        },
        Status::Loaded { rows, columns } => {
            writeln!(writer, "Loaded {} rows ({} columns)", rows, columns)
        }
        Status::Warning(warning) => {
            writer.set_color(ColorSpec::new().set_fg(Some(Color::Yellow)))?;
            write!(writer, "Warning:")?;
            writer.reset()?;
            writeln!(writer, " {}", warning)
        }
        Status::Filtered { table } => {
            writeln!(writer, "{} students selected", table.row_count())?;
            let preview = render_preview(table, preview_rows);
            if !preview.is_empty() {
                writeln!(writer, "{}", preview)?;
            }
            let hidden = table.row_count().saturating_sub(preview_rows);
            if hidden > 0 {
                writeln!(writer, "... and {} more rows", hidden)?;
            }
            Ok(())
        }
        Status::Exported { title, document } => {
            writer.set_color(ColorSpec::new().set_fg(Some(Color::Green)).set_bold(true))?;
            write!(writer, "Created")?;
            writer.reset()?;
            writeln!(writer, " '{}': {}", title, document.url())
        }
        Status::NothingToExport => writeln!(writer, "Nothing to export"),
        Status::Cancelled => writeln!(writer, "Cancelled, nothing was exported"),
    }
}

/// Write an error line in red
pub fn write_error(writer: &mut dyn WriteColor, message: &str) -> io::Result<()> {
    writer.set_color(ColorSpec::new().set_fg(Some(Color::Red)).set_bold(true))?;
    write!(writer, "Error:")?;
    writer.reset()?;
    writeln!(writer, " {}", message)?;
    writer.flush()
}

#[cfg(test)]
mod tests {
    use termcolor::NoColor;

    use super::*;

    fn render(status: Status<'_>, preview_rows: usize) -> String {
        let mut out = NoColor::new(Vec::new());
        write_status(&mut out, status, preview_rows).unwrap();
        String::from_utf8(out.into_inner()).unwrap()
    }

    #[test]
    fn test_warning_line() {
        let warning = Warning::MissingColumn {
            column: "Classe".to_string(),
        };
        assert_eq!(
            render(Status::Warning(&warning), 10),
            "Warning: column 'Classe' not found in the source sheet\n"
        );
    }

    #[test]
    fn test_filtered_preview_reports_hidden_rows() {
        let mut table = Table::with_headers(&["Classe", "Nom"]);
        for name in ["Alice", "Chloé", "Emma"] {
            table.push_row(vec!["3A".into(), name.into()]);
        }
        let text = render(Status::Filtered { table: &table }, 1);
        assert!(text.starts_with("3 students selected\n"));
        assert!(text.contains("Alice"));
        assert!(text.ends_with("... and 2 more rows\n"));
    }

    #[test]
    fn test_exported_line_has_address() {
        let document = DocumentId::new("1abc");
        assert_eq!(
            render(
                Status::Exported {
                    title: "3A - 2026-10-18_09h05",
                    document: &document
                },
                10
            ),
            "Created '3A - 2026-10-18_09h05': https://docs.google.com/spreadsheets/d/1abc\n"
        );
    }

    #[test]
    fn test_empty_result_warning_lists_selection() {
        let warning = Warning::EmptyResult {
            selection: vec!["3A".to_string(), "3B".to_string()],
        };
        assert_eq!(
            warning.to_string(),
            "no student found for 3A, 3B, choose other classes"
        );
    }
}
