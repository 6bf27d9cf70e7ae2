//! Orchestrator: authenticate, load, select, filter, name, export

use std::io;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::config::Config;
use crate::error::{PipelineError, RemoteError};
use crate::export::{export_table, DocumentId, DocumentSink, ExportRequest};
use crate::model::Table;
use crate::operator::{Operator, Status, Warning};
use crate::select::{extract_classes, filter_rows, ClassSet};
use crate::source::{load_table, SheetReference, SheetSource};
use crate::title::document_title;

/// A remote backend able to read the source and receive the export
pub trait RemoteStore: SheetSource + DocumentSink {
    /// Acquire credentials; later calls reuse them
    fn authenticate(&self) -> Result<(), RemoteError>;

    /// Who the backend acts as, for display
    fn identity(&self) -> Option<&str> {
        None
    }
}

/// Successful export
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportOutcome {
    pub title: String,
    pub document: DocumentId,
    pub rows: usize,
}

/// How a run ended when it did not fail
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Exported(ExportOutcome),
    /// The source had nothing to select from
    NothingToExport,
    /// The operator declined or closed their input
    Cancelled,
}

/// Progress of a run
#[derive(Debug)]
enum Stage {
    Unauthenticated,
    Authenticated,
    SourceLoaded(Table),
    ClassesPresented { table: Table, classes: ClassSet },
    Filtered { filtered: Table },
    NamePending { filtered: Table },
    Exported(ExportOutcome),
}

impl Stage {
    fn name(&self) -> &'static str {
        match self {
            Stage::Unauthenticated => "unauthenticated",
            Stage::Authenticated => "authenticated",
            Stage::SourceLoaded(_) => "source_loaded",
            Stage::ClassesPresented { .. } => "classes_presented",
            Stage::Filtered { .. } => "filtered",
            Stage::NamePending { .. } => "name_pending",
            Stage::Exported(_) => "exported",
        }
    }
}

/// One extraction run against a remote store
pub struct Pipeline<'a, S: ?Sized> {
    config: &'a Config,
    store: &'a S,
    clock: fn() -> DateTime<Utc>,
}

impl<'a, S> Pipeline<'a, S>
where
    S: RemoteStore + ?Sized,
{
    pub fn new(config: &'a Config, store: &'a S) -> Self {
        Self {
            config,
            store,
            clock: Utc::now,
        }
    }

    /// Replace the clock used for title timestamps
    pub fn with_clock(mut self, clock: fn() -> DateTime<Utc>) -> Self {
        self.clock = clock;
        self
    }

    /// Drive the run to a terminal state.
    ///
    /// The sheet address is checked before anything touches the network.
    pub fn run(&self, operator: &mut dyn Operator) -> Result<RunOutcome, PipelineError> {
        let sheet = SheetReference::parse(&self.config.sheet_address)?;
        let column = self.config.class_column.as_str();
        let mut stage = Stage::Unauthenticated;

        loop {
            debug!(stage = stage.name(), "Pipeline stage");
            stage = match stage {
                Stage::Unauthenticated => {
                    self.store
                        .authenticate()
                        .map_err(PipelineError::Authentication)?;
                    operator.report_status(Status::Authenticated {
                        identity: self.store.identity(),
                    })?;
                    Stage::Authenticated
                }

                Stage::Authenticated => {
                    let table = match load_table(self.store, &sheet) {
                        Ok(table) => table,
                        Err(err) => {
                            self.report_access_hint(operator, &err)?;
                            return Err(err);
                        }
                    };
                    operator.report_status(Status::Loaded {
                        rows: table.row_count(),
                        columns: table.column_count(),
                    })?;
                    Stage::SourceLoaded(table)
                }

                Stage::SourceLoaded(table) => {
                    if table.column_count() == 0 {
                        operator.report_status(Status::Warning(&Warning::EmptySource))?;
                        return self.finish(operator, RunOutcome::NothingToExport);
                    }

                    let extraction = extract_classes(&table, column);
                    if extraction.missing_column {
                        let warning = Warning::MissingColumn {
                            column: column.to_string(),
                        };
                        operator.report_status(Status::Warning(&warning))?;
                        return self.finish(operator, RunOutcome::NothingToExport);
                    }
                    if extraction.classes.is_empty() {
                        operator.report_status(Status::Warning(&Warning::NoRows))?;
                        return self.finish(operator, RunOutcome::NothingToExport);
                    }

                    info!(classes = extraction.classes.len(), "Classes found");
                    Stage::ClassesPresented {
                        table,
                        classes: extraction.classes,
                    }
                }

                Stage::ClassesPresented { table, classes } => {
                    let Some(selection) = operator.select_classes(&classes)? else {
                        return self.finish(operator, RunOutcome::Cancelled);
                    };
                    if selection.is_empty() {
                        operator.report_status(Status::Warning(&Warning::EmptySelection))?;
                        Stage::ClassesPresented { table, classes }
                    } else {
                        let filtered = filter_rows(&table, column, &selection);
                        if filtered.is_empty() {
                            // Empty exports are blocked, ask for other classes
                            let warning = Warning::EmptyResult {
                                selection: selection
                                    .sorted()
                                    .into_iter()
                                    .map(str::to_string)
                                    .collect(),
                            };
                            operator.report_status(Status::Warning(&warning))?;
                            Stage::ClassesPresented { table, classes }
                        } else {
                            Stage::Filtered { filtered }
                        }
                    }
                }

                Stage::Filtered { filtered } => {
                    operator.report_status(Status::Filtered { table: &filtered })?;
                    Stage::NamePending { filtered }
                }

                Stage::NamePending { filtered } => {
                    let Some(name) = operator.name_output()? else {
                        return self.finish(operator, RunOutcome::Cancelled);
                    };
                    if name.trim().is_empty() {
                        operator.report_status(Status::Warning(&Warning::EmptyName))?;
                        Stage::NamePending { filtered }
                    } else {
                        match self.export(operator, &name, &filtered)? {
                            Some(outcome) => Stage::Exported(outcome),
                            None => return self.finish(operator, RunOutcome::Cancelled),
                        }
                    }
                }

                Stage::Exported(outcome) => {
                    operator.report_status(Status::Exported {
                        title: &outcome.title,
                        document: &outcome.document,
                    })?;
                    return Ok(RunOutcome::Exported(outcome));
                }
            };
        }
    }

    /// Confirm, then upload. `None` when the operator declines.
    fn export(
        &self,
        operator: &mut dyn Operator,
        name: &str,
        filtered: &Table,
    ) -> Result<Option<ExportOutcome>, PipelineError> {
        let now = (self.clock)().with_timezone(&self.config.timezone);
        let title = document_title(name, &now, self.config.title_style);

        if !operator.confirm_export(&title, filtered.row_count())? {
            return Ok(None);
        }

        let request = ExportRequest {
            title: &title,
            folder_id: &self.config.folder_id,
            table: filtered,
        };
        let document = match export_table(self.store, &request) {
            Ok(document) => document,
            Err(err) => {
                self.report_access_hint(operator, &err)?;
                return Err(err);
            }
        };

        Ok(Some(ExportOutcome {
            title,
            document,
            rows: filtered.row_count(),
        }))
    }

    /// Tell the operator which account needs access when the store refused it
    fn report_access_hint(
        &self,
        operator: &mut dyn Operator,
        err: &PipelineError,
    ) -> io::Result<()> {
        let Some(identity) = self.store.identity() else {
            return Ok(());
        };
        let identity = identity.to_string();
        let warning = match err {
            PipelineError::SourceUnavailable(cause) if cause.is_access_problem() => {
                Warning::SourceNotShared { identity }
            }
            PipelineError::ExportFailure(cause) if cause.is_access_problem() => {
                Warning::FolderNotShared { identity }
            }
            _ => return Ok(()),
        };
        operator.report_status(Status::Warning(&warning))
    }

    fn finish(
        &self,
        operator: &mut dyn Operator,
        outcome: RunOutcome,
    ) -> Result<RunOutcome, PipelineError> {
        match outcome {
            RunOutcome::NothingToExport => operator.report_status(Status::NothingToExport)?,
            RunOutcome::Cancelled => operator.report_status(Status::Cancelled)?,
            RunOutcome::Exported(_) => {}
        }
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};
    use std::collections::VecDeque;
    use std::io::Cursor;

    use chrono::TimeZone;
    use termcolor::NoColor;

    use super::*;
    use crate::config::TitleStyle;
    use crate::export::StagedTable;
    use crate::operator::{ScriptedOperator, TerminalOperator};
    use crate::select::Selection;
    use crate::source::Grid;

    const SHEET: &str = "https://docs.google.com/spreadsheets/d/1grfqH0rYRTRoE32/edit?usp=sharing";

    struct Upload {
        title: String,
        folder_id: String,
        table: Table,
    }

    #[derive(Default)]
    struct FakeStore {
        grid: Grid,
        fail_auth: bool,
        fail_fetch: bool,
        fail_upload: bool,
        identity: Option<&'static str>,
        auth_calls: Cell<usize>,
        fetch_calls: Cell<usize>,
        uploads: RefCell<Vec<Upload>>,
    }

    impl FakeStore {
        fn with_rows(rows: &[&[&str]]) -> Self {
            Self {
                grid: rows
                    .iter()
                    .map(|row| row.iter().map(|c| c.to_string()).collect())
                    .collect(),
                ..Default::default()
            }
        }

        fn roster() -> Self {
            Self::with_rows(&[
                &["Classe", "Nom"],
                &["3A", "Alice"],
                &["3B", "Bob"],
                &["3A", "Chloé"],
            ])
        }

        fn calls(&self) -> usize {
            self.auth_calls.get() + self.fetch_calls.get() + self.uploads.borrow().len()
        }
    }

    fn denied() -> RemoteError {
        RemoteError::Api {
            status: 403,
            message: "The caller does not have permission".to_string(),
        }
    }

    impl SheetSource for FakeStore {
        fn fetch_grid(&self, _sheet: &SheetReference) -> Result<Grid, RemoteError> {
            self.fetch_calls.set(self.fetch_calls.get() + 1);
            if self.fail_fetch {
                return Err(denied());
            }
            Ok(self.grid.clone())
        }
    }

    impl DocumentSink for FakeStore {
        fn upload_spreadsheet(
            &self,
            title: &str,
            folder_id: &str,
            staged: &StagedTable,
        ) -> Result<DocumentId, RemoteError> {
            self.uploads.borrow_mut().push(Upload {
                title: title.to_string(),
                folder_id: folder_id.to_string(),
                table: staged.read_table().unwrap(),
            });
            if self.fail_upload {
                return Err(denied());
            }
            Ok(DocumentId::new("1exported"))
        }
    }

    impl RemoteStore for FakeStore {
        fn authenticate(&self) -> Result<(), RemoteError> {
            self.auth_calls.set(self.auth_calls.get() + 1);
            if self.fail_auth {
                return Err(RemoteError::Api {
                    status: 400,
                    message: "invalid_grant".to_string(),
                });
            }
            Ok(())
        }

        fn identity(&self) -> Option<&str> {
            self.identity
        }
    }

    /// Operator replaying fixed selections and names
    struct Replay {
        selections: VecDeque<Selection>,
        names: VecDeque<String>,
        warnings: Vec<Warning>,
    }

    impl Replay {
        fn new(selections: Vec<Vec<&str>>, names: Vec<&str>) -> Self {
            Self {
                selections: selections
                    .into_iter()
                    .map(|values| values.into_iter().collect())
                    .collect(),
                names: names.into_iter().map(str::to_string).collect(),
                warnings: Vec::new(),
            }
        }
    }

    impl Operator for Replay {
        fn select_classes(&mut self, _classes: &ClassSet) -> io::Result<Option<Selection>> {
            Ok(self.selections.pop_front())
        }

        fn name_output(&mut self) -> io::Result<Option<String>> {
            Ok(self.names.pop_front())
        }

        fn report_status(&mut self, status: Status<'_>) -> io::Result<()> {
            if let Status::Warning(warning) = status {
                self.warnings.push(warning.clone());
            }
            Ok(())
        }
    }

    fn fixed_clock() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 18, 7, 30, 0).unwrap()
    }

    fn config() -> Config {
        Config::new(SHEET).with_folder_id("folder123")
    }

    fn names(table: &Table) -> Vec<&str> {
        table.rows().iter().filter_map(|r| r.get(1)).collect()
    }

    #[test]
    fn test_scripted_run_exports_selected_class_into_folder() {
        let store = FakeStore::roster();
        let config = config().with_title_style(TitleStyle::Batch);
        let mut operator = ScriptedOperator::new("3A", "Liste", NoColor::new(Vec::new()));

        let outcome = Pipeline::new(&config, &store)
            .with_clock(fixed_clock)
            .run(&mut operator)
            .unwrap();

        let outcome = match outcome {
            RunOutcome::Exported(outcome) => outcome,
            other => panic!("expected an export, got {other:?}"),
        };
        assert!(!outcome.document.as_str().is_empty());
        assert_eq!(outcome.rows, 2);
        assert_eq!(outcome.title, "Liste_2026-10-18_09-30-00");

        let uploads = store.uploads.borrow();
        assert_eq!(uploads.len(), 1);
        assert_eq!(uploads[0].folder_id, "folder123");
        assert_eq!(uploads[0].title, outcome.title);
        assert_eq!(
            uploads[0].table.columns().collect::<Vec<_>>(),
            vec!["Classe", "Nom"]
        );
        assert_eq!(names(&uploads[0].table), vec!["Alice", "Chloé"]);

        let text = String::from_utf8(operator.into_output().into_inner()).unwrap();
        assert!(text.contains("Loaded 3 rows (2 columns)"));
        assert!(text.contains("2 students selected"));
        assert!(text.contains("https://docs.google.com/spreadsheets/d/1exported"));
    }

    #[test]
    fn test_interactive_run_with_reprompts() {
        let store = FakeStore::roster();
        let config = config();
        // blank selection, bad position, valid selection, blank name, name, default confirm
        let input = "\n9\n2\n\nBob seul\n\n";
        let mut operator =
            TerminalOperator::new(Cursor::new(input.as_bytes().to_vec()), NoColor::new(Vec::new()));

        let outcome = Pipeline::new(&config, &store)
            .with_clock(fixed_clock)
            .run(&mut operator)
            .unwrap();

        let outcome = match outcome {
            RunOutcome::Exported(outcome) => outcome,
            other => panic!("expected an export, got {other:?}"),
        };
        assert_eq!(outcome.title, "Bob seul - 2026-10-18_09h30");
        assert_eq!(names(&store.uploads.borrow()[0].table), vec!["Bob"]);

        let text = String::from_utf8(operator.into_output().into_inner()).unwrap();
        assert!(text.contains("Warning: select at least one class"));
        assert!(text.contains("Error: position 9 is out of range (1-2)"));
        assert!(text.contains("Warning: the file name cannot be empty"));
    }

    #[test]
    fn test_invalid_reference_fails_before_any_remote_call() {
        let store = FakeStore::roster();
        let config = Config::new("https://docs.google.com/spreadsheets/1grfqH0rYRTRoE32");
        let mut operator = Replay::new(vec![vec!["3A"]], vec!["Liste"]);

        let err = Pipeline::new(&config, &store).run(&mut operator).unwrap_err();
        assert!(matches!(err, PipelineError::InvalidReference { .. }));
        assert_eq!(store.calls(), 0);
    }

    #[test]
    fn test_authentication_failure_stops_before_loading() {
        let store = FakeStore {
            fail_auth: true,
            ..FakeStore::roster()
        };
        let config = config();
        let mut operator = Replay::new(vec![], vec![]);

        let err = Pipeline::new(&config, &store).run(&mut operator).unwrap_err();
        assert!(matches!(err, PipelineError::Authentication(_)));
        assert_eq!(store.fetch_calls.get(), 0);
    }

    #[test]
    fn test_source_failure_is_fatal() {
        let store = FakeStore {
            fail_fetch: true,
            ..FakeStore::roster()
        };
        let config = config();
        let mut operator = Replay::new(vec![vec!["3A"]], vec!["Liste"]);

        let err = Pipeline::new(&config, &store).run(&mut operator).unwrap_err();
        assert!(matches!(err, PipelineError::SourceUnavailable(_)));
        assert!(store.uploads.borrow().is_empty());
    }

    #[test]
    fn test_denied_source_names_the_account_to_share_with() {
        let store = FakeStore {
            fail_fetch: true,
            identity: Some("roster@envol-classe.iam.gserviceaccount.com"),
            ..FakeStore::roster()
        };
        let config = config();
        let mut operator = Replay::new(vec![], vec![]);

        let err = Pipeline::new(&config, &store).run(&mut operator).unwrap_err();
        assert!(matches!(err, PipelineError::SourceUnavailable(_)));
        assert_eq!(
            operator.warnings,
            vec![Warning::SourceNotShared {
                identity: "roster@envol-classe.iam.gserviceaccount.com".to_string()
            }]
        );
    }

    #[test]
    fn test_denied_upload_names_the_account_to_share_with() {
        let store = FakeStore {
            fail_upload: true,
            identity: Some("roster@envol-classe.iam.gserviceaccount.com"),
            ..FakeStore::roster()
        };
        let config = config();
        let mut operator = Replay::new(vec![vec!["3A"]], vec!["Liste"]);

        let err = Pipeline::new(&config, &store).run(&mut operator).unwrap_err();
        assert!(matches!(err, PipelineError::ExportFailure(_)));
        assert_eq!(
            operator.warnings,
            vec![Warning::FolderNotShared {
                identity: "roster@envol-classe.iam.gserviceaccount.com".to_string()
            }]
        );
    }

    #[test]
    fn test_header_only_sheet_reports_no_rows() {
        let store = FakeStore::with_rows(&[&["Classe", "Nom"]]);
        let config = config();
        let mut operator = Replay::new(vec![], vec![]);

        let outcome = Pipeline::new(&config, &store).run(&mut operator).unwrap();
        assert_eq!(outcome, RunOutcome::NothingToExport);
        assert_eq!(operator.warnings, vec![Warning::NoRows]);
        assert_eq!(
            Warning::NoRows.to_string(),
            "the source sheet has headers but no students"
        );
    }

    #[test]
    fn test_missing_column_ends_without_export() {
        let store = FakeStore::with_rows(&[&["Nom", "Groupe"], &["Alice", "3A"]]);
        let config = config();
        let mut operator = Replay::new(vec![vec!["3A"]], vec!["Liste"]);

        let outcome = Pipeline::new(&config, &store).run(&mut operator).unwrap();
        assert_eq!(outcome, RunOutcome::NothingToExport);
        assert_eq!(
            operator.warnings,
            vec![Warning::MissingColumn {
                column: "Classe".to_string()
            }]
        );
        assert!(store.uploads.borrow().is_empty());
    }

    #[test]
    fn test_empty_sheet_ends_without_export() {
        let store = FakeStore::with_rows(&[]);
        let config = config();
        let mut operator = Replay::new(vec![], vec![]);

        let outcome = Pipeline::new(&config, &store).run(&mut operator).unwrap();
        assert_eq!(outcome, RunOutcome::NothingToExport);
        assert_eq!(operator.warnings, vec![Warning::EmptySource]);
    }

    #[test]
    fn test_custom_class_column() {
        let store = FakeStore::with_rows(&[&["Groupe", "Nom"], &["G1", "Alice"], &["G2", "Bob"]]);
        let config = config().with_class_column("Groupe");
        let mut operator = Replay::new(vec![vec!["G2"]], vec!["Groupe 2"]);

        let outcome = Pipeline::new(&config, &store).run(&mut operator).unwrap();
        assert!(matches!(outcome, RunOutcome::Exported(_)));
        assert_eq!(names(&store.uploads.borrow()[0].table), vec!["Bob"]);
    }

    #[test]
    fn test_empty_result_blocks_export_and_reprompts() {
        let store = FakeStore::roster();
        let config = config();
        let mut operator = Replay::new(vec![vec!["6F"], vec!["3B"]], vec!["Liste"]);

        let outcome = Pipeline::new(&config, &store).run(&mut operator).unwrap();
        assert!(matches!(outcome, RunOutcome::Exported(_)));
        assert_eq!(
            operator.warnings,
            vec![Warning::EmptyResult {
                selection: vec!["6F".to_string()]
            }]
        );
        let uploads = store.uploads.borrow();
        assert_eq!(uploads.len(), 1);
        assert_eq!(names(&uploads[0].table), vec!["Bob"]);
    }

    #[test]
    fn test_closed_input_cancels() {
        let store = FakeStore::roster();
        let config = config();
        let mut operator = Replay::new(vec![vec!["3A"]], vec![]);

        let outcome = Pipeline::new(&config, &store).run(&mut operator).unwrap();
        assert_eq!(outcome, RunOutcome::Cancelled);
        assert!(store.uploads.borrow().is_empty());
    }

    #[test]
    fn test_declined_confirmation_cancels() {
        let store = FakeStore::roster();
        let config = config();
        let mut operator =
            TerminalOperator::new(Cursor::new(b"1\nListe\nn\n".to_vec()), NoColor::new(Vec::new()));

        let outcome = Pipeline::new(&config, &store).run(&mut operator).unwrap();
        assert_eq!(outcome, RunOutcome::Cancelled);
        assert!(store.uploads.borrow().is_empty());
    }

    #[test]
    fn test_upload_failure_is_fatal() {
        let store = FakeStore {
            fail_upload: true,
            ..FakeStore::roster()
        };
        let config = config();
        let mut operator = Replay::new(vec![vec!["3A"]], vec!["Liste"]);

        let err = Pipeline::new(&config, &store).run(&mut operator).unwrap_err();
        assert!(matches!(err, PipelineError::ExportFailure(_)));
    }
}
