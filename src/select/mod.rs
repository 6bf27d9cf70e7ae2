//! Class extraction, operator selection and row filtering

mod classes;
mod filter;
mod selection;

pub use classes::{extract_classes, ClassExtraction, ClassSet};
pub use filter::filter_rows;
pub use selection::{parse_selection, Selection, SelectionError};
