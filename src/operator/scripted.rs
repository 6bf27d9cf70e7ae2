//! Non-interactive front end fed from command-line arguments

use std::io;

use termcolor::WriteColor;
use tracing::debug;

use crate::select::{parse_selection, ClassSet, Selection, SelectionError};

use super::{write_status, Operator, Status, Warning};

/// Operator whose answers are known up front.
///
/// Each answer is given once; a second prompt for the same thing means the
/// first answer was rejected, and the run is cancelled.
pub struct ScriptedOperator<W> {
    selection: Option<String>,
    name: Option<String>,
    output: W,
    preview_rows: usize,
}

impl<W: WriteColor> ScriptedOperator<W> {
    pub fn new(selection: impl Into<String>, name: impl Into<String>, output: W) -> Self {
        Self {
            selection: Some(selection.into()),
            name: Some(name.into()),
            output,
            preview_rows: 10,
        }
    }

    pub fn with_preview_rows(mut self, rows: usize) -> Self {
        self.preview_rows = rows;
        self
    }

    pub fn into_output(self) -> W {
        self.output
    }
}

impl<W: WriteColor> Operator for ScriptedOperator<W> {
    fn select_classes(&mut self, classes: &ClassSet) -> io::Result<Option<Selection>> {
        let Some(answer) = self.selection.take() else {
            debug!("Scripted selection already used");
            return Ok(None);
        };

        match parse_selection(&answer, classes) {
            Ok(selection) => Ok(Some(selection)),
            Err(SelectionError::Empty) => Ok(Some(Selection::default())),
            Err(e) => {
                self.report_status(Status::Warning(&Warning::InvalidSelection(e)))?;
                Ok(None)
            }
        }
    }

    fn name_output(&mut self) -> io::Result<Option<String>> {
        Ok(self.name.take().map(|name| name.trim().to_string()))
    }

    fn report_status(&mut self, status: Status<'_>) -> io::Result<()> {
        write_status(&mut self.output, status, self.preview_rows)?;
        self.output.flush()
    }
}
