//! Export layer: staging a table and uploading it as a new spreadsheet

mod staging;

use std::fmt;

use tracing::{debug, info};

use crate::error::{PipelineError, RemoteError};
use crate::model::Table;

pub use staging::StagedTable;

/// Identifier of a spreadsheet created in the remote store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentId(String);

impl DocumentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Address an operator can open in a browser
    pub fn url(&self) -> String {
        format!("https://docs.google.com/spreadsheets/d/{}", self.0)
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What to export and where
#[derive(Debug, Clone, Copy)]
pub struct ExportRequest<'a> {
    /// Display title of the new document, timestamp included
    pub title: &'a str,
    /// Drive folder that becomes the document's only parent
    pub folder_id: &'a str,
    pub table: &'a Table,
}

/// Trait for stores that turn a staged CSV into a new spreadsheet
pub trait DocumentSink {
    /// Create a spreadsheet named `title` from `staged` with `folder_id` as
    /// its sole parent, in one call.
    fn upload_spreadsheet(
        &self,
        title: &str,
        folder_id: &str,
        staged: &StagedTable,
    ) -> Result<DocumentId, RemoteError>;
}

/// Stage the request's table and upload it.
///
/// The staging file is gone when this returns, whatever the outcome.
pub fn export_table<D>(sink: &D, request: &ExportRequest<'_>) -> Result<DocumentId, PipelineError>
where
    D: DocumentSink + ?Sized,
{
    let staged = StagedTable::write(request.table).map_err(PipelineError::Serialization)?;
    debug!(
        path = %staged.path().display(),
        rows = staged.row_count(),
        "Staged table for upload"
    );

    let uploaded = sink.upload_spreadsheet(request.title, request.folder_id, &staged);
    staged.release();

    let id = uploaded.map_err(PipelineError::ExportFailure)?;
    info!(
        document = %id,
        folder = request.folder_id,
        title = request.title,
        "Created spreadsheet"
    );
    Ok(id)
}
