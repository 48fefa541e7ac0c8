// chbridge-core/src/domain/schema.rs

use serde::ser::{Serialize, SerializeMap, Serializer};

pub type TableName = String;
pub type ColumnName = String;

/// One source record as loaded: column -> value, in header order.
/// Never mutated once loaded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRow {
    fields: Vec<(ColumnName, String)>,
}

impl RawRow {
    /// Builds a row from (column, value) pairs. A repeated column keeps its first
    /// position and takes the last value.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<ColumnName>,
        V: Into<String>,
    {
        let mut fields: Vec<(ColumnName, String)> = Vec::new();
        for (key, value) in pairs {
            let key = key.into();
            let value = value.into();
            match fields.iter_mut().find(|(k, _)| *k == key) {
                Some(slot) => slot.1 = value,
                None => fields.push((key, value)),
            }
        }
        Self { fields }
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == column)
            .map(|(_, v)| v.as_str())
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// A row projected onto the selected columns. Its key set is fixed at projection
/// time; only values can change.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditableRow {
    fields: Vec<(ColumnName, String)>,
}

impl EditableRow {
    /// Projects `raw` onto `columns`. Columns missing from the raw row project as "".
    pub fn project(raw: &RawRow, columns: &[ColumnName]) -> Self {
        let fields = columns
            .iter()
            .map(|c| (c.clone(), raw.get(c).unwrap_or_default().to_string()))
            .collect();
        Self { fields }
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == column)
            .map(|(_, v)| v.as_str())
    }

    /// Overwrites the value of an existing key. Returns false when the column is
    /// not part of this row.
    pub fn set(&mut self, column: &str, value: impl Into<String>) -> bool {
        match self.fields.iter_mut().find(|(k, _)| k == column) {
            Some(slot) => {
                slot.1 = value.into();
                true
            }
            None => false,
        }
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

// Rows travel as JSON objects, keys in column order.
impl Serialize for EditableRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (k, v) in &self.fields {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

impl Serialize for RawRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (k, v) in &self.fields {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_row_keeps_header_order() {
        let row = RawRow::from_pairs([("id", "1"), ("name", "Bob"), ("dob", "1990-01-01")]);
        assert_eq!(row.columns().collect::<Vec<_>>(), ["id", "name", "dob"]);
        assert_eq!(row.get("name"), Some("Bob"));
        assert_eq!(row.get("missing"), None);
    }

    #[test]
    fn test_projection_fills_missing_columns() {
        let row = RawRow::from_pairs([("id", "1")]);
        let projected = EditableRow::project(&row, &["name".to_string(), "id".to_string()]);
        assert_eq!(projected.columns().collect::<Vec<_>>(), ["name", "id"]);
        assert_eq!(projected.get("name"), Some(""));
    }

    #[test]
    fn test_set_rejects_unknown_column() {
        let mut row = EditableRow::project(&RawRow::from_pairs([("a", "1")]), &["a".to_string()]);
        assert!(row.set("a", "2"));
        assert!(!row.set("b", "3"));
        assert_eq!(row.len(), 1);
    }

    #[test]
    fn test_rows_serialize_as_ordered_objects() {
        let row = EditableRow::project(
            &RawRow::from_pairs([("name", "Alice"), ("id", "7")]),
            &["name".to_string(), "id".to_string()],
        );
        let json = serde_json::to_string(&row).unwrap();
        assert_eq!(json, r#"{"name":"Alice","id":"7"}"#);
    }
}
