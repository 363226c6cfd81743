//! Error types for trueno-grammar operations.
//!
//! Every failure is terminal for the plot-build request that raised it: the
//! pipeline never emits a partial plot.

use std::io;
use thiserror::Error;

/// Result type alias using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building or rendering a plot.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error (config files).
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// YAML configuration could not be parsed.
    #[error("configuration error: {0}")]
    Config(#[from] serde_yaml_ng::Error),

    /// A mapping references an aesthetic channel that does not exist.
    #[error("unknown aesthetic channel '{0}'")]
    UnknownChannel(String),

    /// A channel was mapped twice within one aesthetic mapping.
    #[error("aesthetic channel '{0}' is mapped more than once")]
    DuplicateChannel(String),

    /// A variable references a column that is not in the table.
    #[error("column '{0}' not found in table")]
    MissingColumn(String),

    /// Two columns with the same name were added to a table.
    #[error("column '{0}' already exists in table")]
    DuplicateColumn(String),

    /// Columns of one table disagree on row count.
    #[error("column '{column}' has {actual} rows, table has {expected}")]
    ColumnLengthMismatch {
        /// Offending column.
        column: String,
        /// Row count of the table.
        expected: usize,
        /// Row count of the column.
        actual: usize,
    },

    /// A statistic, scale or expression was applied to an incompatible semantic type.
    #[error("type mismatch on '{target}': expected {expected}, found {found}")]
    TypeMismatch {
        /// Channel or column name.
        target: String,
        /// Semantic type required by the operation.
        expected: &'static str,
        /// Semantic type actually present.
        found: &'static str,
    },

    /// A scale transform is undefined at an observed value (e.g., log of 0).
    #[error("scale transform '{transform}' undefined for {value} on channel '{channel}'")]
    DomainError {
        /// Channel whose scale failed.
        channel: String,
        /// Transform that was applied.
        transform: &'static str,
        /// Offending raw value.
        value: f64,
    },

    /// A geometry or statistic did not receive enough rows for one of its groups.
    #[error("'{stage}' needs at least {required} rows per group, got {actual}")]
    EmptyPanel {
        /// Geometry or statistic name.
        stage: &'static str,
        /// Minimum row count.
        required: usize,
        /// Row count received.
        actual: usize,
    },

    /// A nest term has an outer category without any nested rows.
    #[error("nesting '{inner}' within '{outer}' failed: category '{category}' has no rows")]
    IncompatibleAlgebra {
        /// Outer variable name.
        outer: String,
        /// Nested variable name.
        inner: String,
        /// Outer category with no nested values.
        category: String,
    },

    /// A coordinate system received a position outside its domain.
    #[error("coordinate system '{coord}' cannot map {axis} = {value}")]
    CoordinateDomain {
        /// Coordinate system name.
        coord: &'static str,
        /// Axis of the offending component.
        axis: &'static str,
        /// Offending normalized value.
        value: f64,
    },

    /// A builder parameter is out of range (bin count, bar width, ...).
    #[error("invalid parameter '{name}': {message}")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// Why the value was rejected.
        message: String,
    },

    /// Invalid dimensions for a canvas.
    #[error("Invalid dimensions: {width}x{height}")]
    InvalidDimensions {
        /// Width value.
        width: usize,
        /// Height value.
        height: usize,
    },
}

impl Error {
    pub(crate) fn invalid(name: &'static str, message: impl Into<String>) -> Self {
        Error::InvalidParameter { name, message: message.into() }
    }
}
