//! Operator class selection

use rustc_hash::FxHashSet;
use thiserror::Error;

use super::classes::ClassSet;

/// Set of selected class values
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    values: FxHashSet<String>,
}

impl Selection {
    pub fn contains(&self, value: &str) -> bool {
        self.values.contains(value)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Selected values in sorted order, for display
    pub fn sorted(&self) -> Vec<&str> {
        let mut values: Vec<&str> = self.values.iter().map(String::as_str).collect();
        values.sort_unstable();
        values
    }
}

impl<S: Into<String>> FromIterator<S> for Selection {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().map(Into::into).collect(),
        }
    }
}

/// Rejected selection input
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectionError {
    #[error("no class selected")]
    Empty,

    #[error("position {position} is out of range (1-{max})")]
    OutOfRange { position: usize, max: usize },

    #[error("unknown class '{0}'")]
    Unknown(String),
}

/// Parse operator input against the presented classes.
///
/// Input is a comma-separated list where each entry is a 1-based position,
/// an exact class value, or `*`/`all` for every class. Every entry must
/// resolve; there is no partial acceptance.
pub fn parse_selection(input: &str, classes: &ClassSet) -> Result<Selection, SelectionError> {
    let mut values = FxHashSet::default();

    for token in input.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        if token == "*" || token.eq_ignore_ascii_case("all") {
            values.extend(classes.iter().map(str::to_string));
            continue;
        }

        if classes.contains(token) {
            values.insert(token.to_string());
            continue;
        }

        match token.parse::<usize>() {
            Ok(position) => {
                let value = classes
                    .position(position)
                    .ok_or(SelectionError::OutOfRange {
                        position,
                        max: classes.len(),
                    })?;
                values.insert(value.to_string());
            }
            Err(_) => return Err(SelectionError::Unknown(token.to_string())),
        }
    }

    if values.is_empty() {
        return Err(SelectionError::Empty);
    }

    Ok(Selection { values })
}
