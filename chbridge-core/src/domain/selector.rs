// chbridge-core/src/domain/selector.rs

use std::collections::HashSet;

use crate::domain::error::DomainError;
use crate::domain::schema::ColumnName;

/// Columns offered by the current table/file and the subset chosen by the user.
/// The selection is always kept in the order of `available`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnSelector {
    available: Vec<ColumnName>,
    selected: Vec<ColumnName>,
}

impl ColumnSelector {
    /// Repeated column names collapse onto their first occurrence.
    pub fn new(available: Vec<ColumnName>) -> Self {
        let mut seen = HashSet::new();
        let available = available
            .into_iter()
            .filter(|c| seen.insert(c.clone()))
            .collect();
        Self {
            available,
            selected: Vec::new(),
        }
    }

    pub fn available(&self) -> &[ColumnName] {
        &self.available
    }

    pub fn selected(&self) -> &[ColumnName] {
        &self.selected
    }

    pub fn contains(&self, column: &str) -> bool {
        self.selected.iter().any(|c| c == column)
    }

    /// Adds or removes `column`. Adding a present column or removing an absent one
    /// returns an identical selector.
    pub fn toggle(&self, column: &str, included: bool) -> Result<Self, DomainError> {
        if !self.available.iter().any(|c| c == column) {
            return Err(DomainError::Validation(format!(
                "Column '{}' is not part of the current schema",
                column
            )));
        }

        let selected = if included {
            self.available
                .iter()
                .filter(|c| *c == column || self.contains(c))
                .cloned()
                .collect()
        } else {
            self.selected
                .iter()
                .filter(|c| *c != column)
                .cloned()
                .collect()
        };

        Ok(Self {
            available: self.available.clone(),
            selected,
        })
    }

    pub fn select_all(&self) -> Self {
        Self {
            available: self.available.clone(),
            selected: self.available.clone(),
        }
    }
}
