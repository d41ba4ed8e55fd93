//! In-memory table model and storage-type inference.
//!
//! A [`Dataset`] is a named, ordered set of equally long [`Column`]s. Each
//! column carries the storage type inferred at load time; the names returned
//! by [`StorageType::dtype_name`] are the labels the profiler classifies.

use std::fmt;

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};

use crate::data::{Value, parse_boolean, parse_temporal, parse_typed_value};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum StorageType {
    Int64,
    Float64,
    Bool,
    DateTime64,
    Object,
}

impl StorageType {
    pub fn dtype_name(self) -> &'static str {
        match self {
            StorageType::Int64 => "int64",
            StorageType::Float64 => "float64",
            StorageType::Bool => "bool",
            StorageType::DateTime64 => "datetime64[ns]",
            StorageType::Object => "object",
        }
    }
}

impl fmt::Display for StorageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dtype_name())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub storage: StorageType,
    pub values: Vec<Option<Value>>,
}

impl Column {
    pub fn new(name: impl Into<String>, storage: StorageType, values: Vec<Option<Value>>) -> Self {
        Self {
            name: name.into(),
            storage,
            values,
        }
    }

    /// Builds a column from raw text, inferring the storage type.
    pub fn from_text<S: AsRef<str>>(
        name: impl Into<String>,
        raw: &[S],
        infer_temporal: bool,
    ) -> Self {
        let mut candidate = TypeCandidate::new(infer_temporal);
        for value in raw {
            candidate.observe(value.as_ref());
        }
        let storage = candidate.decide();
        let values = raw
            .iter()
            .map(|value| {
                // The candidate already proved every non-empty cell parses.
                parse_typed_value(value.as_ref(), storage)
                    .unwrap_or_else(|_| Some(Value::String(value.as_ref().to_string())))
            })
            .collect();
        Self::new(name, storage, values)
    }

    /// Narrows an `object` column whose remaining text all parses as a
    /// stricter type. Returns whether the storage type changed.
    pub fn reinfer(&mut self) -> bool {
        if self.storage != StorageType::Object {
            return false;
        }
        let mut candidate = TypeCandidate::new(false);
        for value in self.present() {
            match value {
                Value::String(text) => candidate.observe(text),
                _ => return false,
            }
        }
        let storage = candidate.decide();
        if storage == StorageType::Object {
            return false;
        }
        let Ok(values) = self
            .values
            .iter()
            .map(|cell| match cell {
                Some(Value::String(text)) => parse_typed_value(text, storage),
                other => Ok(other.clone()),
            })
            .collect::<Result<Vec<_>>>()
        else {
            return false;
        };
        self.values = values;
        self.storage = storage;
        true
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn null_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_none()).count()
    }

    pub fn present(&self) -> impl Iterator<Item = &Value> {
        self.values.iter().flatten()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    pub name: String,
    pub columns: Vec<Column>,
    row_count: usize,
}

impl Dataset {
    pub fn new(name: impl Into<String>, columns: Vec<Column>) -> Result<Self> {
        let name = name.into();
        let row_count = columns.first().map(Column::len).unwrap_or(0);
        if let Some(bad) = columns.iter().find(|c| c.len() != row_count) {
            bail!(
                "Column '{}' in '{}' has {} value(s), expected {}",
                bad.name,
                name,
                bad.len(),
                row_count
            );
        }
        Ok(Self {
            name,
            columns,
            row_count,
        })
    }

    /// Builds a dataset from header + row-major text, padding short rows
    /// with empty cells.
    pub fn from_records(
        name: impl Into<String>,
        headers: &[String],
        rows: &[Vec<String>],
        infer_temporal: bool,
    ) -> Result<Self> {
        let columns = headers
            .iter()
            .enumerate()
            .map(|(idx, header)| {
                let raw = rows
                    .iter()
                    .map(|row| row.get(idx).map(String::as_str).unwrap_or(""))
                    .collect::<Vec<_>>();
                Column::from_text(header.clone(), &raw, infer_temporal)
            })
            .collect();
        let mut dataset = Self::new(name, columns)?;
        dataset.row_count = rows.len();
        Ok(dataset)
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }
}

#[derive(Debug, Clone)]
struct TypeCandidate {
    possible_integer: bool,
    possible_float: bool,
    possible_boolean: bool,
    possible_datetime: bool,
    observed: usize,
}

impl TypeCandidate {
    fn new(infer_temporal: bool) -> Self {
        Self {
            possible_integer: true,
            possible_float: true,
            possible_boolean: true,
            possible_datetime: infer_temporal,
            observed: 0,
        }
    }

    fn observe(&mut self, value: &str) {
        if value.is_empty() {
            return;
        }
        self.observed += 1;
        let trimmed = value.trim();
        if self.possible_integer && trimmed.parse::<i64>().is_err() {
            self.possible_integer = false;
        }
        if self.possible_float && trimmed.parse::<f64>().is_err() {
            self.possible_float = false;
        }
        if self.possible_boolean && parse_boolean(trimmed).is_none() {
            self.possible_boolean = false;
        }
        if self.possible_datetime && parse_temporal(trimmed).is_err() {
            self.possible_datetime = false;
        }
    }

    fn decide(&self) -> StorageType {
        if self.observed == 0 {
            // An all-missing column has nothing to say; dataframes report float.
            StorageType::Float64
        } else if self.possible_integer {
            StorageType::Int64
        } else if self.possible_float {
            StorageType::Float64
        } else if self.possible_boolean {
            StorageType::Bool
        } else if self.possible_datetime {
            StorageType::DateTime64
        } else {
            StorageType::Object
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_text_infers_storage_types() {
        assert_eq!(
            Column::from_text("a", &["1", "", "3"], false).storage,
            StorageType::Int64
        );
        assert_eq!(
            Column::from_text("a", &["1", "2.5"], false).storage,
            StorageType::Float64
        );
        assert_eq!(
            Column::from_text("a", &["true", "False"], false).storage,
            StorageType::Bool
        );
        assert_eq!(
            Column::from_text("a", &["x", "1"], false).storage,
            StorageType::Object
        );
        assert_eq!(
            Column::from_text("a", &["", ""], false).storage,
            StorageType::Float64
        );
    }

    #[test]
    fn temporal_inference_is_opt_in() {
        let raw = ["2024-01-01", "2024-01-02 10:00:00"];
        assert_eq!(Column::from_text("d", &raw, false).storage, StorageType::Object);
        assert_eq!(
            Column::from_text("d", &raw, true).storage,
            StorageType::DateTime64
        );
    }

    #[test]
    fn from_records_pads_short_rows() {
        let headers = vec!["id".to_string(), "name".to_string()];
        let rows = vec![
            vec!["1".to_string(), "a".to_string()],
            vec!["2".to_string()],
        ];
        let dataset = Dataset::from_records("T", &headers, &rows, false).unwrap();
        assert_eq!(dataset.row_count(), 2);
        assert_eq!(dataset.column_count(), 2);
        assert_eq!(dataset.column("name").unwrap().null_count(), 1);
    }

    #[test]
    fn reinfer_narrows_cleaned_object_columns() {
        let mut column = Column::from_text("n", &["1", "?", "3"], false);
        assert_eq!(column.storage, StorageType::Object);
        column.values[1] = None;
        assert!(column.reinfer());
        assert_eq!(column.storage, StorageType::Int64);
        assert_eq!(column.values[2], Some(Value::Integer(3)));
        assert!(!column.reinfer());
    }

    #[test]
    fn new_rejects_ragged_columns() {
        let columns = vec![
            Column::new("a", StorageType::Int64, vec![Some(Value::Integer(1))]),
            Column::new("b", StorageType::Int64, vec![]),
        ];
        assert!(Dataset::new("T", columns).is_err());
    }
}
