//! Drive API v3 upload of a staged CSV as a native spreadsheet

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::http::check_status;
use super::session::GoogleSession;
use crate::error::RemoteError;
use crate::export::{DocumentId, StagedTable};

const UPLOAD_URL: &str = "https://www.googleapis.com/upload/drive/v3/files";
const SPREADSHEET_MIME: &str = "application/vnd.google-apps.spreadsheet";
const BOUNDARY_BASE: &str = "classsheet-part-boundary";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FileMetadata<'a> {
    name: &'a str,
    mime_type: &'static str,
    parents: [&'a str; 1],
}

#[derive(Debug, Deserialize)]
struct CreatedFile {
    id: String,
    #[serde(default)]
    parents: Vec<String>,
}

/// Drive client bound to a session
pub struct DriveApi<'a> {
    session: &'a GoogleSession,
}

impl<'a> DriveApi<'a> {
    pub fn new(session: &'a GoogleSession) -> Self {
        Self { session }
    }

    /// Create a spreadsheet from CSV content directly inside `folder_id`.
    ///
    /// Creation with the parent set is a single call, so the document never
    /// exists anywhere else.
    ///
    /// The staged CSV holds every value as exact text, but Drive converts
    /// types while importing it: `007` lands in the sheet as `7` and `3,5`
    /// may become a number depending on the file's locale.
    pub fn create_spreadsheet(
        &self,
        title: &str,
        folder_id: &str,
        staged: &StagedTable,
    ) -> Result<DocumentId, RemoteError> {
        let metadata = FileMetadata {
            name: title,
            mime_type: SPREADSHEET_MIME,
            parents: [folder_id],
        };
        let metadata =
            serde_json::to_vec(&metadata).map_err(|e| RemoteError::Parse(e.to_string()))?;
        let csv = staged
            .contents()
            .map_err(|e| RemoteError::Parse(format!("cannot read staged table: {}", e)))?;
        let (boundary, body) = multipart_related(&metadata, &csv);

        debug!(folder = folder_id, bytes = body.len(), "Uploading spreadsheet");
        let token = self.session.access_token()?;
        let response = self
            .session
            .http()
            .post(UPLOAD_URL)
            .query(&[
                ("uploadType", "multipart"),
                ("supportsAllDrives", "true"),
                ("fields", "id,parents"),
            ])
            .bearer_auth(token)
            .header(
                reqwest::header::CONTENT_TYPE,
                format!("multipart/related; boundary={}", boundary),
            )
            .body(body)
            .send()?;

        let created: CreatedFile = check_status(response)?.json()?;
        if !created.parents.is_empty() && created.parents != [folder_id] {
            warn!(
                document = %created.id,
                parents = ?created.parents,
                folder = folder_id,
                "Created spreadsheet has unexpected parents"
            );
        }
        Ok(DocumentId::new(created.id))
    }
}

/// `multipart/related` body: JSON metadata part, then the CSV media part.
///
/// The boundary is extended until it does not occur in the content.
fn multipart_related(metadata: &[u8], csv: &[u8]) -> (String, Vec<u8>) {
    let mut boundary = BOUNDARY_BASE.to_string();
    let mut n = 0u32;
    while contains(csv, boundary.as_bytes()) || contains(metadata, boundary.as_bytes()) {
        n += 1;
        boundary = format!("{}-{}", BOUNDARY_BASE, n);
    }

    let mut body = Vec::with_capacity(metadata.len() + csv.len() + 256);
    body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
    body.extend_from_slice(b"Content-Type: application/json; charset=UTF-8\r\n\r\n");
    body.extend_from_slice(metadata);
    body.extend_from_slice(format!("\r\n--{}\r\n", boundary).as_bytes());
    body.extend_from_slice(b"Content-Type: text/csv; charset=UTF-8\r\n\r\n");
    body.extend_from_slice(csv);
    body.extend_from_slice(format!("\r\n--{}--\r\n", boundary).as_bytes());

    (boundary, body)
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}
