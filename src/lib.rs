//! classsheet - Extract class rosters from Google Sheets
//!
//! Reads a roster from the first tab of a spreadsheet, lets an operator pick
//! classes from its class column, and writes the matching rows to a new
//! spreadsheet created in a Drive folder.

pub mod config;
pub mod error;
pub mod export;
pub mod google;
pub mod model;
pub mod operator;
pub mod pipeline;
pub mod select;
pub mod source;
pub mod title;

pub use config::Config;
pub use error::{PipelineError, RemoteError};
pub use model::Table;
pub use pipeline::{Pipeline, RemoteStore, RunOutcome};
