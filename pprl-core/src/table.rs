// pprl-core/src/table.rs
//
// Minimal column-store interface the algorithmic code is generic over,
// replacing the dataframe-subclassing relationship in the original source
// (see the module notes in embedder.rs for why). A `Table` is "an ordered
// sequence of records with named columns; read a column, append a column" —
// nothing more. `RecordTable` is the in-memory reference implementation used
// by tests and `pprl-cli`; callers with their own columnar store (Arrow,
// a database cursor, …) just implement the trait.

use std::collections::HashMap;

/// A single cell's value, widened enough to cover the column kinds the
/// feature factory consumes (free text, dates-as-text, everything else).
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Str(String),
    Int(i64),
    Float(f64),
}

impl Value {
    /// Render the value the way the feature functions expect: missing data
    /// becomes an empty string, everything else its display form.
    pub fn as_feature_str(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Str(s) => s.clone(),
            Value::Int(i) => i.to_string(),
            Value::Float(f) => f.to_string(),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// `Some(&str)` only for an actual string value, `None` for null *and*
    /// for numeric values — this mirrors pandas's `.str` accessor, which
    /// silently treats non-string cells as missing rather than stringifying
    /// them. Used by the `sex` feature function.
    pub fn as_str_strict(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// `None` only for a genuinely missing cell; every other value
    /// (including numbers) renders to its display form. Used by the `misc`
    /// feature function, which stringifies any scalar type.
    pub fn as_display_string(&self) -> Option<String> {
        match self {
            Value::Null => None,
            other => Some(other.as_feature_str()),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<Option<&str>> for Value {
    fn from(s: Option<&str>) -> Self {
        match s {
            Some(s) => Value::Str(s.to_string()),
            None => Value::Null,
        }
    }
}

/// Read/append access to a table's columns. Row order is significant and
/// shared across all columns; `len()` rows, `ncols()` columns.
pub trait Table {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Borrow a column by name, or `None` if it doesn't exist.
    fn column(&self, name: &str) -> Option<&[Value]>;

    /// Append a new column. Overwrites an existing column of the same name.
    fn set_column(&mut self, name: &str, values: Vec<Value>);

    fn column_names(&self) -> Vec<&str>;
}

/// Reference `Table` implementation: an ordered map of column name to
/// values, all columns required to share `len()`.
#[derive(Debug, Clone, Default)]
pub struct RecordTable {
    len: usize,
    columns: HashMap<String, Vec<Value>>,
    order: Vec<String>,
}

impl RecordTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a set of named columns, all the same length.
    pub fn from_columns(columns: Vec<(&str, Vec<Value>)>) -> Self {
        let mut table = Self::new();
        for (name, values) in columns {
            table.set_column(name, values);
        }
        table
    }
}

impl Table for RecordTable {
    fn len(&self) -> usize {
        self.len
    }

    fn column(&self, name: &str) -> Option<&[Value]> {
        self.columns.get(name).map(|v| v.as_slice())
    }

    fn set_column(&mut self, name: &str, values: Vec<Value>) {
        if !self.columns.contains_key(name) {
            self.order.push(name.to_string());
        }
        self.len = self.len.max(values.len());
        self.columns.insert(name.to_string(), values);
    }

    fn column_names(&self) -> Vec<&str> {
        self.order.iter().map(|s| s.as_str()).collect()
    }
}
