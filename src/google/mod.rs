//! Google Sheets and Drive backend

mod credentials;
mod drive;
mod http;
mod session;
mod sheets;

use crate::error::RemoteError;
use crate::export::{DocumentId, DocumentSink, StagedTable};
use crate::pipeline::RemoteStore;
use crate::source::{Grid, SheetReference, SheetSource};

pub use credentials::{CredentialSource, ServiceAccountKey, SECRETS_TABLE};
pub use drive::DriveApi;
pub use session::GoogleSession;
pub use sheets::SheetsApi;

/// Sheets reader and Drive uploader sharing one session
pub struct GoogleClient<'a> {
    session: &'a GoogleSession,
    sheets: SheetsApi<'a>,
    drive: DriveApi<'a>,
}

impl<'a> GoogleClient<'a> {
    pub fn new(session: &'a GoogleSession) -> Self {
        Self {
            session,
            sheets: SheetsApi::new(session),
            drive: DriveApi::new(session),
        }
    }
}

impl SheetSource for GoogleClient<'_> {
    fn fetch_grid(&self, sheet: &SheetReference) -> Result<Grid, RemoteError> {
        self.sheets.first_tab_grid(sheet)
    }
}

impl DocumentSink for GoogleClient<'_> {
    fn upload_spreadsheet(
        &self,
        title: &str,
        folder_id: &str,
        staged: &StagedTable,
    ) -> Result<DocumentId, RemoteError> {
        self.drive.create_spreadsheet(title, folder_id, staged)
    }
}

impl RemoteStore for GoogleClient<'_> {
    fn authenticate(&self) -> Result<(), RemoteError> {
        self.session.access_token().map(|_| ())
    }

    fn identity(&self) -> Option<&str> {
        Some(self.session.client_email())
    }
}
