//! Configuration handling for classsheet

use chrono_tz::Tz;

use crate::google::CredentialSource;

/// Drive folder receiving the exported rosters unless overridden
pub const DEFAULT_FOLDER_ID: &str = "1uKc0nx4XxvNQG3IdY-icz8gti5iPIg6U";

/// Column holding the class of each student
pub const DEFAULT_CLASS_COLUMN: &str = "Classe";

/// Timezone used for the timestamp in generated titles
pub const DEFAULT_TIMEZONE: Tz = chrono_tz::Europe::Brussels;

/// Shape of the timestamp appended to the operator-supplied name
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TitleStyle {
    /// `<name> - <YYYY-MM-DD>_<HH>h<MM>`
    #[default]
    Interactive,
    /// `<name>_<YYYY-MM-DD>_<HH>-<MM>-<SS>`
    Batch,
}

impl std::str::FromStr for TitleStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "interactive" => Ok(TitleStyle::Interactive),
            "batch" => Ok(TitleStyle::Batch),
            _ => Err(format!("Unknown title style: {}", s)),
        }
    }
}

/// Parse an IANA timezone name such as `Europe/Brussels`
pub fn parse_timezone(name: &str) -> Result<Tz, String> {
    name.parse::<Tz>()
        .map_err(|_| format!("Unknown timezone: {}", name))
}

/// Configuration for one extraction run
#[derive(Debug, Clone)]
pub struct Config {
    /// Address of the source spreadsheet
    pub sheet_address: String,
    /// Drive folder the new spreadsheet is created in
    pub folder_id: String,
    /// Column used to group students
    pub class_column: String,
    /// Timezone of the timestamp in the generated title
    pub timezone: Tz,
    /// Timestamp format of the generated title
    pub title_style: TitleStyle,
    /// Rows shown in the filtered preview
    pub preview_rows: usize,
    /// Service account key location
    pub credentials: Option<CredentialSource>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sheet_address: String::new(),
            folder_id: DEFAULT_FOLDER_ID.to_string(),
            class_column: DEFAULT_CLASS_COLUMN.to_string(),
            timezone: DEFAULT_TIMEZONE,
            title_style: TitleStyle::default(),
            preview_rows: 10,
            credentials: None,
        }
    }
}

impl Config {
    /// Create a new Config for a sheet address
    pub fn new(sheet_address: impl Into<String>) -> Self {
        Self {
            sheet_address: sheet_address.into(),
            ..Default::default()
        }
    }

    /// Set the destination folder
    pub fn with_folder_id(mut self, folder_id: impl Into<String>) -> Self {
        self.folder_id = folder_id.into();
        self
    }

    /// Set the class column name
    pub fn with_class_column(mut self, column: impl Into<String>) -> Self {
        self.class_column = column.into();
        self
    }

    /// Set the title timezone
    pub fn with_timezone(mut self, timezone: Tz) -> Self {
        self.timezone = timezone;
        self
    }

    /// Set the title timestamp format
    pub fn with_title_style(mut self, style: TitleStyle) -> Self {
        self.title_style = style;
        self
    }

    /// Set the number of preview rows
    pub fn with_preview_rows(mut self, rows: usize) -> Self {
        self.preview_rows = rows;
        self
    }

    /// Set where the service account key is read from
    pub fn with_credentials(mut self, source: CredentialSource) -> Self {
        self.credentials = Some(source);
        self
    }
}
