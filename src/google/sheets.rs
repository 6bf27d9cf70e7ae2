//! Sheets API v4 reader for the first tab of a spreadsheet

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;
use url::Url;

use super::http::check_status;
use super::session::GoogleSession;
use crate::error::RemoteError;
use crate::source::{Grid, SheetReference};

const SHEETS_API: &str = "https://sheets.googleapis.com/v4/spreadsheets/";

#[derive(Debug, Deserialize)]
struct SpreadsheetMeta {
    #[serde(default)]
    sheets: Vec<SheetMeta>,
}

#[derive(Debug, Deserialize)]
struct SheetMeta {
    properties: SheetProperties,
}

#[derive(Debug, Deserialize)]
struct SheetProperties {
    title: String,
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    /// Absent when the range holds no data
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

/// Read-only Sheets client bound to a session
pub struct SheetsApi<'a> {
    session: &'a GoogleSession,
}

impl<'a> SheetsApi<'a> {
    pub fn new(session: &'a GoogleSession) -> Self {
        Self { session }
    }

    /// Every formatted cell of the first tab
    pub fn first_tab_grid(&self, sheet: &SheetReference) -> Result<Grid, RemoteError> {
        let title = self.first_tab_title(sheet)?;
        debug!(sheet = %sheet, tab = %title, "Reading first tab");

        let mut url = spreadsheet_url(sheet)?;
        url.path_segments_mut()
            .map_err(|_| RemoteError::Parse("cannot extend Sheets API URL".to_string()))?
            .push("values")
            .push(&a1_sheet_range(&title));
        url.query_pairs_mut()
            .append_pair("majorDimension", "ROWS")
            .append_pair("valueRenderOption", "FORMATTED_VALUE");

        let range: ValueRange = self.get_json(url)?;
        Ok(range
            .values
            .into_iter()
            .map(|row| row.into_iter().map(cell_text).collect())
            .collect())
    }

    fn first_tab_title(&self, sheet: &SheetReference) -> Result<String, RemoteError> {
        let mut url = spreadsheet_url(sheet)?;
        url.query_pairs_mut()
            .append_pair("fields", "sheets.properties.title");

        let meta: SpreadsheetMeta = self.get_json(url)?;
        meta.sheets
            .into_iter()
            .next()
            .map(|s| s.properties.title)
            .ok_or_else(|| RemoteError::Parse(format!("spreadsheet {} has no tabs", sheet)))
    }

    fn get_json<T>(&self, url: Url) -> Result<T, RemoteError>
    where
        T: for<'de> Deserialize<'de>,
    {
        let token = self.session.access_token()?;
        let response = self.session.http().get(url).bearer_auth(token).send()?;
        Ok(check_status(response)?.json()?)
    }
}

fn spreadsheet_url(sheet: &SheetReference) -> Result<Url, RemoteError> {
    Url::parse(SHEETS_API)
        .and_then(|base| base.join(sheet.id()))
        .map_err(|e| RemoteError::Parse(format!("invalid Sheets API URL: {}", e)))
}

/// A1 range covering a whole tab; quotes are doubled inside the tab name
fn a1_sheet_range(title: &str) -> String {
    format!("'{}'", title.replace('\'', "''"))
}

/// Formatted values are strings already; anything else is rendered as text
fn cell_text(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
