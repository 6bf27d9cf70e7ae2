//! Sheet address parsing

use std::fmt;

use crate::error::PipelineError;

const ID_MARKER: &str = "/d/";

/// Identifier of a spreadsheet, extracted from a user-supplied address
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetReference {
    id: String,
}

impl SheetReference {
    /// Extract the spreadsheet id from an address such as
    /// `https://docs.google.com/spreadsheets/d/<id>/edit?usp=sharing`.
    ///
    /// The id is the segment after `/d/` up to the next `/`, `?` or `#`.
    pub fn parse(address: &str) -> Result<Self, PipelineError> {
        let invalid = || PipelineError::InvalidReference {
            address: address.to_string(),
        };

        let start = address.find(ID_MARKER).ok_or_else(invalid)? + ID_MARKER.len();
        let rest = &address[start..];
        let end = rest.find(['/', '?', '#']).unwrap_or(rest.len());
        let id = rest[..end].trim();

        let valid = !id.is_empty()
            && id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(invalid());
        }

        Ok(Self { id: id.to_string() })
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}

impl fmt::Display for SheetReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}
