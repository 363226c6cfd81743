//! Typed columnar data table.
//!
//! A [`Table`] is an ordered set of named, typed [`Column`]s sharing one row
//! count. Tables are immutable once [`TableBuilder::build`] returns; every
//! pipeline stage reads from them by row index.

use std::fmt;

use crate::error::{Error, Result};

/// A single cell value.
#[derive(Debug, Clone, PartialEq)]
pub enum DataValue {
    /// A numeric value.
    Number(f64),
    /// A text value.
    Text(String),
    /// A missing value.
    Null,
}

impl DataValue {
    /// Get as f64, or None if not a number.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            DataValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Get as string slice, or None if not text.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            DataValue::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// True for [`DataValue::Null`].
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, DataValue::Null)
    }
}

impl fmt::Display for DataValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataValue::Number(n) => write!(f, "{n}"),
            DataValue::Text(s) => f.write_str(s),
            DataValue::Null => f.write_str("NA"),
        }
    }
}

impl From<f64> for DataValue {
    fn from(v: f64) -> Self {
        DataValue::Number(v)
    }
}

impl From<Option<f64>> for DataValue {
    fn from(v: Option<f64>) -> Self {
        v.map_or(DataValue::Null, DataValue::Number)
    }
}

impl From<&str> for DataValue {
    fn from(s: &str) -> Self {
        DataValue::Text(s.to_string())
    }
}

impl From<String> for DataValue {
    fn from(s: String) -> Self {
        DataValue::Text(s)
    }
}

/// Semantic type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    /// Continuous numeric values.
    Continuous,
    /// Unordered categories.
    Discrete,
    /// Ordered categories with a declared level order.
    Ordinal,
}

impl ColumnType {
    /// Short name used in error messages.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            ColumnType::Continuous => "continuous",
            ColumnType::Discrete => "discrete",
            ColumnType::Ordinal => "ordinal",
        }
    }

    /// True for discrete and ordinal columns.
    #[must_use]
    pub fn is_categorical(self) -> bool {
        !matches!(self, ColumnType::Continuous)
    }
}

/// A named, typed column.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    name: String,
    kind: ColumnType,
    values: Vec<DataValue>,
    /// Declared level order (ordinal columns only).
    levels: Option<Vec<String>>,
}

impl Column {
    /// Create a column from raw values.
    #[must_use]
    pub fn new(name: impl Into<String>, kind: ColumnType, values: Vec<DataValue>) -> Self {
        Self { name: name.into(), kind, values, levels: None }
    }

    /// Create a continuous column.
    #[must_use]
    pub fn continuous(name: impl Into<String>, data: &[f64]) -> Self {
        Self::new(name, ColumnType::Continuous, data.iter().map(|&v| DataValue::Number(v)).collect())
    }

    /// Create a discrete column from text values.
    #[must_use]
    pub fn discrete(name: impl Into<String>, data: &[&str]) -> Self {
        Self::new(name, ColumnType::Discrete, data.iter().map(|&s| DataValue::from(s)).collect())
    }

    /// Create an ordinal column with an explicit level order.
    #[must_use]
    pub fn ordinal(name: impl Into<String>, data: &[&str], levels: &[&str]) -> Self {
        let mut col =
            Self::new(name, ColumnType::Ordinal, data.iter().map(|&s| DataValue::from(s)).collect());
        col.levels = Some(levels.iter().map(|s| (*s).to_string()).collect());
        col
    }

    /// Same column under another name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Same name, type and levels with new values.
    #[must_use]
    pub fn with_values(&self, values: Vec<DataValue>) -> Self {
        Self { name: self.name.clone(), kind: self.kind, values, levels: self.levels.clone() }
    }

    /// Rows picked by index, in the given order.
    #[must_use]
    pub fn take(&self, rows: &[usize]) -> Self {
        self.with_values(
            rows.iter().map(|&r| self.values.get(r).cloned().unwrap_or(DataValue::Null)).collect(),
        )
    }

    /// Column name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Semantic type.
    #[must_use]
    pub fn kind(&self) -> ColumnType {
        self.kind
    }

    /// All values in row order.
    #[must_use]
    pub fn values(&self) -> &[DataValue] {
        &self.values
    }

    /// Declared level order, if any.
    #[must_use]
    pub fn levels(&self) -> Option<&[String]> {
        self.levels.as_deref()
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True when the column has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value at a row.
    #[must_use]
    pub fn get(&self, row: usize) -> Option<&DataValue> {
        self.values.get(row)
    }

    fn validate(&self) -> Result<()> {
        match self.kind {
            ColumnType::Continuous => {
                if self.values.iter().any(|v| matches!(v, DataValue::Text(_))) {
                    return Err(Error::TypeMismatch {
                        target: self.name.clone(),
                        expected: "continuous",
                        found: "text",
                    });
                }
            }
            ColumnType::Ordinal => {
                let levels = self.levels.as_deref().unwrap_or_default();
                let undeclared = self.values.iter().any(|v| match v {
                    DataValue::Null => false,
                    other => !levels.iter().any(|l| *l == other.to_string()),
                });
                if undeclared {
                    return Err(Error::TypeMismatch {
                        target: self.name.clone(),
                        expected: "declared ordinal level",
                        found: "undeclared level",
                    });
                }
            }
            ColumnType::Discrete => {}
        }
        Ok(())
    }
}

/// An immutable table of equally long columns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<Column>,
    n_rows: usize,
}

impl Table {
    /// Start building a table.
    #[must_use]
    pub fn builder() -> TableBuilder {
        TableBuilder::default()
    }

    /// Convenience: two continuous columns named `x` and `y`.
    pub fn from_xy(x: &[f64], y: &[f64]) -> Result<Self> {
        Self::builder().numeric("x", x).numeric("y", y).build()
    }

    /// Look up a column by name.
    #[must_use]
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Look up a column, failing with [`Error::MissingColumn`].
    pub fn get(&self, name: &str) -> Result<&Column> {
        self.column(name).ok_or_else(|| Error::MissingColumn(name.to_string()))
    }

    /// Number of rows.
    #[must_use]
    pub fn nrow(&self) -> usize {
        self.n_rows
    }

    /// Number of columns.
    #[must_use]
    pub fn ncol(&self) -> usize {
        self.columns.len()
    }

    /// Check if a column exists.
    #[must_use]
    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    /// Column names in declaration order.
    #[must_use]
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// All columns in declaration order.
    #[must_use]
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }
}

/// Builder that validates columns before producing a [`Table`].
#[derive(Debug, Clone, Default)]
pub struct TableBuilder {
    columns: Vec<Column>,
}

impl TableBuilder {
    /// Add a continuous column.
    #[must_use]
    pub fn numeric(self, name: &str, data: &[f64]) -> Self {
        self.column(Column::continuous(name, data))
    }

    /// Add a discrete text column.
    #[must_use]
    pub fn text(self, name: &str, data: &[&str]) -> Self {
        self.column(Column::discrete(name, data))
    }

    /// Add an ordinal column with an explicit level order.
    #[must_use]
    pub fn ordinal(self, name: &str, data: &[&str], levels: &[&str]) -> Self {
        self.column(Column::ordinal(name, data, levels))
    }

    /// Add a prepared column.
    #[must_use]
    pub fn column(mut self, column: Column) -> Self {
        self.columns.push(column);
        self
    }

    /// Validate and freeze the table.
    pub fn build(self) -> Result<Table> {
        let n_rows = self.columns.first().map_or(0, Column::len);
        for (i, col) in self.columns.iter().enumerate() {
            if self.columns[..i].iter().any(|c| c.name == col.name) {
                return Err(Error::DuplicateColumn(col.name.clone()));
            }
            if col.len() != n_rows {
                return Err(Error::ColumnLengthMismatch {
                    column: col.name.clone(),
                    expected: n_rows,
                    actual: col.len(),
                });
            }
            col.validate()?;
        }
        Ok(Table { columns: self.columns, n_rows })
    }
}
