// ABOUTME: In-memory tables bound to dataset charts
// ABOUTME: Holds named, typed columns supplied by the dataset-upload side of the application

use crate::errors::{DeckError, Result};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};

/// Table id used when a dataset chart does not name one.
pub const DEFAULT_TABLE: &str = "dataset";

#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    Numeric(Vec<f64>),
    Text(Vec<String>),
}

impl ColumnData {
    pub fn len(&self) -> usize {
        match self {
            ColumnData::Numeric(values) => values.len(),
            ColumnData::Text(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            ColumnData::Numeric(_) => "numeric",
            ColumnData::Text(_) => "text",
        }
    }

    /// Render the value at `row` as a category label.
    pub fn label(&self, row: usize) -> Option<String> {
        match self {
            ColumnData::Numeric(values) => values.get(row).map(|v| format_number(*v)),
            ColumnData::Text(values) => values.get(row).cloned(),
        }
    }
}

fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub data: ColumnData,
}

/// A rectangular table: every column has the same number of rows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<Column>,
}

impl Table {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_numeric(self, name: &str, values: Vec<f64>) -> Result<Self> {
        self.with_column(name, ColumnData::Numeric(values))
    }

    pub fn with_text<S: Into<String>>(self, name: &str, values: Vec<S>) -> Result<Self> {
        self.with_column(
            name,
            ColumnData::Text(values.into_iter().map(Into::into).collect()),
        )
    }

    pub fn with_column(mut self, name: &str, data: ColumnData) -> Result<Self> {
        if self.column(name).is_some() {
            return Err(DeckError::ValidationError(format!(
                "Duplicate column '{}'",
                name
            )));
        }
        if let Some(first) = self.columns.first() {
            if first.data.len() != data.len() {
                return Err(DeckError::ValidationError(format!(
                    "Column '{}' has {} rows, expected {}",
                    name,
                    data.len(),
                    first.data.len()
                )));
            }
        }
        self.columns.push(Column {
            name: name.to_string(),
            data,
        });
        Ok(self)
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn row_count(&self) -> usize {
        self.columns.first().map(|c| c.data.len()).unwrap_or(0)
    }
}

/// Table id to table, as handed to the exporter.
pub type TableBindings = HashMap<String, Table>;

/// Parse a tables file: `{ "<table>": { "<column>": [values...] } }`.
///
/// A column whose values are all numbers is numeric; anything else is text.
pub fn bindings_from_json(json: &str) -> Result<TableBindings> {
    let raw: BTreeMap<String, BTreeMap<String, Vec<Value>>> = serde_json::from_str(json)
        .map_err(|e| DeckError::ValidationError(format!("Invalid tables JSON: {}", e)))?;

    let mut bindings = TableBindings::new();
    for (table_name, columns) in raw {
        let mut table = Table::new();
        for (column_name, values) in columns {
            let data = if values.iter().all(Value::is_number) {
                ColumnData::Numeric(values.iter().filter_map(Value::as_f64).collect())
            } else {
                ColumnData::Text(
                    values
                        .iter()
                        .map(|v| match v {
                            Value::String(s) => s.clone(),
                            Value::Null => String::new(),
                            other => other.to_string(),
                        })
                        .collect(),
                )
            };
            table = table.with_column(&column_name, data).map_err(|e| {
                DeckError::ValidationError(format!("Table '{}': {}", table_name, e))
            })?;
        }
        bindings.insert(table_name, table);
    }
    Ok(bindings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ragged_columns_rejected() {
        let result = Table::new()
            .with_numeric("a", vec![1.0, 2.0])
            .and_then(|t| t.with_numeric("b", vec![1.0]));
        assert!(matches!(result, Err(DeckError::ValidationError(_))));
    }

    #[test]
    fn test_bindings_from_json_infers_column_types() {
        let bindings = bindings_from_json(
            r#"{"sales": {"region": ["UK", "US"], "revenue": [10, 12.5]}}"#,
        )
        .unwrap();
        let table = &bindings["sales"];
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.column("region").unwrap().data.type_name(), "text");
        assert_eq!(
            table.column("revenue").unwrap().data,
            ColumnData::Numeric(vec![10.0, 12.5])
        );
    }

    #[test]
    fn test_numeric_labels() {
        let data = ColumnData::Numeric(vec![2024.0, 1.5]);
        assert_eq!(data.label(0).as_deref(), Some("2024"));
        assert_eq!(data.label(1).as_deref(), Some("1.5"));
        assert_eq!(data.label(2), None);
    }
}
