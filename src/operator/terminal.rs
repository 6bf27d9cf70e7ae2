//! Interactive prompts on a terminal

use std::io::{self, BufRead};

use termcolor::WriteColor;

use crate::select::{parse_selection, ClassSet, Selection, SelectionError};

use super::{write_error, write_status, Operator, Status};

/// Operator answering prompts line by line
pub struct TerminalOperator<R, W> {
    input: R,
    output: W,
    preview_rows: usize,
}

impl<R: BufRead, W: WriteColor> TerminalOperator<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self {
            input,
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

    /// Print `prompt` and read one line; `None` on end of input
    fn ask(&mut self, prompt: &str) -> io::Result<Option<String>> {
        write!(self.output, "{}", prompt)?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            writeln!(self.output)?;
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    fn write_classes(&mut self, classes: &ClassSet) -> io::Result<()> {
        writeln!(self.output, "Available classes:")?;
        for (i, class) in classes.iter().enumerate() {
            let label = if class.is_empty() { "(blank)" } else { class };
            writeln!(self.output, "  {:>2}. {}", i + 1, label)?;
        }
        Ok(())
    }
}

impl<R: BufRead, W: WriteColor> Operator for TerminalOperator<R, W> {
    fn select_classes(&mut self, classes: &ClassSet) -> io::Result<Option<Selection>> {
        self.write_classes(classes)?;
        loop {
            let Some(answer) =
                self.ask("Classes to export (numbers or names, comma-separated, * for all): ")?
            else {
                return Ok(None);
            };

            match parse_selection(&answer, classes) {
                Ok(selection) => return Ok(Some(selection)),
                // Reported and re-prompted by the pipeline
                Err(SelectionError::Empty) => return Ok(Some(Selection::default())),
                Err(e) => write_error(&mut self.output, &e.to_string())?,
            }
        }
    }

    fn name_output(&mut self) -> io::Result<Option<String>> {
        self.ask("File name (without extension): ")
    }

    fn confirm_export(&mut self, title: &str, rows: usize) -> io::Result<bool> {
        loop {
            let prompt = format!("Create '{}' with {} rows? [Y/n] ", title, rows);
            let Some(answer) = self.ask(&prompt)? else {
                return Ok(false);
            };
            match answer.to_lowercase().as_str() {
                "" | "y" | "yes" | "o" | "oui" => return Ok(true),
                "n" | "no" | "non" => return Ok(false),
                _ => writeln!(self.output, "Please answer y or n.")?,
            }
        }
    }

    fn report_status(&mut self, status: Status<'_>) -> io::Result<()> {
        write_status(&mut self.output, status, self.preview_rows)?;
        self.output.flush()
    }
}
