//! Distinct class values of a table

use std::collections::BTreeSet;

use crate::model::Table;

/// Sorted, deduplicated values of the class column.
///
/// Positions shown to the operator are 1-based; see [`ClassSet::position`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassSet {
    values: Vec<String>,
}

impl ClassSet {
    /// Class value at a 1-based presentation position
    pub fn position(&self, position: usize) -> Option<&str> {
        position
            .checked_sub(1)
            .and_then(|i| self.values.get(i))
            .map(String::as_str)
    }

    pub fn contains(&self, value: &str) -> bool {
        self.values.binary_search_by(|v| v.as_str().cmp(value)).is_ok()
    }

    pub fn iter(&self) -> impl ExactSizeIterator<Item = &str> {
        self.values.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for ClassSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let sorted: BTreeSet<String> = iter.into_iter().map(Into::into).collect();
        Self {
            values: sorted.into_iter().collect(),
        }
    }
}

/// Result of looking for class values in a table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassExtraction {
    pub classes: ClassSet,
    /// The class column is absent from the table
    pub missing_column: bool,
}

/// Collect the distinct values of `column`, sorted.
///
/// A missing column is not an error: the result is empty and flagged.
pub fn extract_classes(table: &Table, column: &str) -> ClassExtraction {
    let Some(index) = table.column_index(column) else {
        return ClassExtraction {
            classes: ClassSet::default(),
            missing_column: true,
        };
    };

    let classes = table
        .rows()
        .iter()
        .filter_map(|row| row.get(index))
        .collect();

    ClassExtraction {
        classes,
        missing_column: false,
    }
}
