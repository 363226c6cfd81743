//! Variable specifications.
//!
//! A [`VarSpec`] names either a table column or a derived expression over
//! columns. Variables are evaluated once, against the immutable table, before
//! any pipeline stage runs.

use crate::error::{Error, Result};
use crate::table::{Column, ColumnType, DataValue, Table};

/// Unary numeric operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    /// Negation.
    Neg,
    /// Absolute value.
    Abs,
    /// Natural logarithm (non-positive inputs become null).
    Ln,
    /// Base-10 logarithm (non-positive inputs become null).
    Log10,
    /// Square root (negative inputs become null).
    Sqrt,
    /// Exponential.
    Exp,
}

impl UnaryOp {
    fn eval(self, v: f64) -> Option<f64> {
        match self {
            UnaryOp::Neg => Some(-v),
            UnaryOp::Abs => Some(v.abs()),
            UnaryOp::Ln => (v > 0.0).then(|| v.ln()),
            UnaryOp::Log10 => (v > 0.0).then(|| v.log10()),
            UnaryOp::Sqrt => (v >= 0.0).then(|| v.sqrt()),
            UnaryOp::Exp => Some(v.exp()),
        }
    }
}

/// Binary numeric operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    /// Addition.
    Add,
    /// Subtraction.
    Sub,
    /// Multiplication.
    Mul,
    /// Division (zero divisor becomes null).
    Div,
}

impl BinaryOp {
    fn eval(self, a: f64, b: f64) -> Option<f64> {
        match self {
            BinaryOp::Add => Some(a + b),
            BinaryOp::Sub => Some(a - b),
            BinaryOp::Mul => Some(a * b),
            BinaryOp::Div => (b != 0.0).then(|| a / b),
        }
    }
}

/// Expression over table columns.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Reference to a named column.
    Column(String),
    /// A constant repeated for every row.
    Constant(DataValue),
    /// Unary operation.
    Unary(UnaryOp, Box<Expr>),
    /// Binary operation.
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
}

impl Expr {
    /// Column reference.
    #[must_use]
    pub fn col(name: &str) -> Self {
        Expr::Column(name.to_string())
    }

    /// Constant value.
    #[must_use]
    pub fn lit(value: impl Into<DataValue>) -> Self {
        Expr::Constant(value.into())
    }

    /// Apply a unary operation.
    #[must_use]
    pub fn apply(self, op: UnaryOp) -> Self {
        Expr::Unary(op, Box::new(self))
    }

    /// Combine with another expression.
    #[must_use]
    pub fn combine(self, op: BinaryOp, rhs: Expr) -> Self {
        Expr::Binary(op, Box::new(self), Box::new(rhs))
    }

    fn evaluate(&self, table: &Table) -> Result<Column> {
        match self {
            Expr::Column(name) => table.get(name).cloned(),
            Expr::Constant(value) => {
                let kind = match value {
                    DataValue::Text(_) => ColumnType::Discrete,
                    _ => ColumnType::Continuous,
                };
                Ok(Column::new("const", kind, vec![value.clone(); table.nrow()]))
            }
            Expr::Unary(op, inner) => {
                let col = numeric(inner.evaluate(table)?)?;
                let values = col
                    .values()
                    .iter()
                    .map(|v| v.as_f64().and_then(|x| op.eval(x)).into())
                    .collect();
                Ok(Column::new(col.name(), ColumnType::Continuous, values))
            }
            Expr::Binary(op, lhs, rhs) => {
                let a = numeric(lhs.evaluate(table)?)?;
                let b = numeric(rhs.evaluate(table)?)?;
                let values = a
                    .values()
                    .iter()
                    .zip(b.values())
                    .map(|(x, y)| match (x.as_f64(), y.as_f64()) {
                        (Some(x), Some(y)) => op.eval(x, y).into(),
                        _ => DataValue::Null,
                    })
                    .collect();
                Ok(Column::new(a.name(), ColumnType::Continuous, values))
            }
        }
    }
}

fn numeric(col: Column) -> Result<Column> {
    if col.kind() == ColumnType::Continuous {
        Ok(col)
    } else {
        Err(Error::TypeMismatch {
            target: col.name().to_string(),
            expected: "continuous",
            found: col.kind().name(),
        })
    }
}

/// A named variable: a column reference or a derived expression.
#[derive(Debug, Clone, PartialEq)]
pub struct VarSpec {
    name: String,
    expr: Expr,
}

impl VarSpec {
    /// Reference a column by name.
    #[must_use]
    pub fn column(name: &str) -> Self {
        Self { name: name.to_string(), expr: Expr::col(name) }
    }

    /// A derived variable.
    #[must_use]
    pub fn derived(name: &str, expr: Expr) -> Self {
        Self { name: name.to_string(), expr }
    }

    /// Variable name (used in labels and error messages).
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Underlying expression.
    #[must_use]
    pub fn expr(&self) -> &Expr {
        &self.expr
    }

    /// Evaluate against a table, producing a column named after this variable.
    pub fn evaluate(&self, table: &Table) -> Result<Column> {
        Ok(self.expr.evaluate(table)?.with_name(self.name.as_str()))
    }
}

impl From<&str> for VarSpec {
    fn from(name: &str) -> Self {
        VarSpec::column(name)
    }
}
