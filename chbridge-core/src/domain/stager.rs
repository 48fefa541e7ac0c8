// chbridge-core/src/domain/stager.rs

use crate::domain::error::DomainError;
use crate::domain::schema::{ColumnName, EditableRow, RawRow};

/// Turns loaded rows into editable rows restricted to the selected columns.
/// Every operation returns a fresh row set; inputs are never modified.
pub struct RowStager;

impl RowStager {
    pub fn stage_selected(
        raw_rows: &[RawRow],
        selected: &[ColumnName],
    ) -> Result<Vec<EditableRow>, DomainError> {
        if selected.is_empty() {
            return Err(DomainError::NoColumnsSelected);
        }
        if raw_rows.is_empty() {
            return Err(DomainError::NoRowsAvailable);
        }

        Ok(raw_rows
            .iter()
            .map(|row| EditableRow::project(row, selected))
            .collect())
    }

    /// Edits are hard errors when out of bounds: an unknown row index or a column
    /// outside the row's key set fails with `InvalidEdit`.
    pub fn edit_field(
        rows: &[EditableRow],
        row_index: usize,
        column: &str,
        value: impl Into<String>,
    ) -> Result<Vec<EditableRow>, DomainError> {
        let Some(target) = rows.get(row_index) else {
            return Err(DomainError::InvalidEdit(format!(
                "row {} is out of range ({} rows staged)",
                row_index,
                rows.len()
            )));
        };

        let mut edited = target.clone();
        if !edited.set(column, value) {
            return Err(DomainError::InvalidEdit(format!(
                "column '{}' is not part of row {}",
                column, row_index
            )));
        }

        let mut next = rows.to_vec();
        next[row_index] = edited;
        Ok(next)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn raw() -> Vec<RawRow> {
        vec![
            RawRow::from_pairs([("id", "1"), ("name", "Bob")]),
            RawRow::from_pairs([("id", "2"), ("name", "Eve")]),
            RawRow::from_pairs([("id", "3"), ("name", "Zed")]),
        ]
    }

    #[test]
    fn test_key_set_equals_selection() {
        let cols = vec!["name".to_string()];
        let rows = RowStager::stage_selected(&raw(), &cols).unwrap();
        assert_eq!(rows.len(), 3);
        for row in &rows {
            assert_eq!(row.columns().collect::<Vec<_>>(), ["name"]);
        }
    }

    #[test]
    fn test_staging_is_deterministic() {
        let cols = vec!["id".to_string(), "name".to_string()];
        assert_eq!(
            RowStager::stage_selected(&raw(), &cols).unwrap(),
            RowStager::stage_selected(&raw(), &cols).unwrap()
        );
    }

    #[test]
    fn test_staging_preconditions() {
        assert_eq!(
            RowStager::stage_selected(&raw(), &[]).unwrap_err(),
            DomainError::NoColumnsSelected
        );
        assert_eq!(
            RowStager::stage_selected(&[], &["id".to_string()]).unwrap_err(),
            DomainError::NoRowsAvailable
        );
    }

    #[test]
    fn test_edit_field_returns_new_rows() {
        let staged = RowStager::stage_selected(&raw(), &["name".to_string()]).unwrap();
        let edited = RowStager::edit_field(&staged, 0, "name", "Alice").unwrap();
        assert_eq!(edited[0].get("name"), Some("Alice"));
        assert_eq!(staged[0].get("name"), Some("Bob"));
    }

    #[test]
    fn test_invalid_edits_fail() {
        let staged = RowStager::stage_selected(&raw(), &["name".to_string()]).unwrap();
        assert!(matches!(
            RowStager::edit_field(&staged, 3, "name", "x"),
            Err(DomainError::InvalidEdit(_))
        ));
        assert!(matches!(
            RowStager::edit_field(&staged, 0, "id", "x"),
            Err(DomainError::InvalidEdit(_))
        ));
    }
}
