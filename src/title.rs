//! Generated document titles

use chrono::{DateTime, TimeZone};

use crate::config::TitleStyle;

/// Append a local timestamp to the operator-supplied name.
///
/// Same-second runs with the same name produce the same title; the store
/// allows that, so nothing here tries to make titles unique.
pub fn document_title<Tz>(name: &str, at: &DateTime<Tz>, style: TitleStyle) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    let name = name.trim();
    match style {
        TitleStyle::Interactive => format!("{} - {}", name, at.format("%Y-%m-%d_%Hh%M")),
        TitleStyle::Batch => format!("{}_{}", name, at.format("%Y-%m-%d_%H-%M-%S")),
    }
}
