//! Variable algebra: cross, nest and blend.
//!
//! Terms combine variables into a grouping key per row. The resulting
//! [`Grouping`] drives facet panels.
//!
//! # References
//!
//! - Wilkinson, L. (2005). *The Grammar of Graphics*, ch. 5 "Algebra". Springer.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use tracing::debug;

use super::variable::VarSpec;
use crate::error::{Error, Result};
use crate::table::{DataValue, Table};

/// One component of a grouping key.
///
/// Numbers are keyed by exact value (their bit pattern, with `-0.0` folded
/// into `0.0`), so continuous variables are bucketed without binning.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum KeyPart {
    /// Numeric category.
    Number(u64),
    /// Text category.
    Text(String),
    /// Missing value.
    Null,
}

impl KeyPart {
    /// The raw value this key part stands for.
    #[must_use]
    pub fn to_value(&self) -> DataValue {
        match self {
            KeyPart::Number(bits) => DataValue::Number(f64::from_bits(*bits)),
            KeyPart::Text(s) => DataValue::Text(s.clone()),
            KeyPart::Null => DataValue::Null,
        }
    }
}

impl From<&DataValue> for KeyPart {
    fn from(value: &DataValue) -> Self {
        match value {
            DataValue::Number(n) if *n == 0.0 => KeyPart::Number(0f64.to_bits()),
            DataValue::Number(n) => KeyPart::Number(n.to_bits()),
            DataValue::Text(s) => KeyPart::Text(s.clone()),
            DataValue::Null => KeyPart::Null,
        }
    }
}

impl fmt::Display for KeyPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_value())
    }
}

/// A combined grouping key: one part per crossed variable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct GroupKey(Vec<KeyPart>);

impl GroupKey {
    /// Key from parts.
    #[must_use]
    pub fn new(parts: Vec<KeyPart>) -> Self {
        Self(parts)
    }

    /// Key parts in term order.
    #[must_use]
    pub fn parts(&self) -> &[KeyPart] {
        &self.0
    }

    /// True when every part is missing (or the key is empty).
    #[must_use]
    pub fn is_null(&self) -> bool {
        self.0.iter().all(|p| *p == KeyPart::Null)
    }

    fn concat(&self, other: &GroupKey) -> GroupKey {
        GroupKey(self.0.iter().chain(&other.0).cloned().collect())
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, part) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{part}")?;
        }
        Ok(())
    }
}

/// An algebra term over variables.
#[derive(Debug, Clone, PartialEq)]
pub enum Term {
    /// A single variable.
    Var(VarSpec),
    /// Outer product of both terms' categories.
    Cross(Box<Term>, Box<Term>),
    /// Right term enumerated only within each category of the left term.
    Nest(Box<Term>, Box<Term>),
    /// Union of both terms' categories on one shared key.
    Blend(Box<Term>, Box<Term>),
}

impl Term {
    /// A single-variable term.
    #[must_use]
    pub fn var(var: impl Into<VarSpec>) -> Self {
        Term::Var(var.into())
    }

    /// `self * other`.
    #[must_use]
    pub fn cross(self, other: Term) -> Self {
        Term::Cross(Box::new(self), Box::new(other))
    }

    /// `self / inner`: `inner` nested within `self`.
    #[must_use]
    pub fn nest(self, inner: Term) -> Self {
        Term::Nest(Box::new(self), Box::new(inner))
    }

    /// `self + other`.
    #[must_use]
    pub fn blend(self, other: Term) -> Self {
        Term::Blend(Box::new(self), Box::new(other))
    }

    /// Human-readable algebra expression.
    #[must_use]
    pub fn name(&self) -> String {
        match self {
            Term::Var(v) => v.name().to_string(),
            Term::Cross(a, b) => format!("({} * {})", a.name(), b.name()),
            Term::Nest(a, b) => format!("({} / {})", a.name(), b.name()),
            Term::Blend(a, b) => format!("({} + {})", a.name(), b.name()),
        }
    }

    fn evaluate(&self, table: &Table) -> Result<Grouping> {
        match self {
            Term::Var(var) => {
                let col = var.evaluate(table)?;
                let row_keys: Vec<GroupKey> =
                    col.values().iter().map(|v| GroupKey(vec![KeyPart::from(v)])).collect();
                let candidates = match col.levels() {
                    Some(levels) => {
                        let mut keys: Vec<GroupKey> = levels
                            .iter()
                            .map(|l| GroupKey(vec![KeyPart::Text(l.clone())]))
                            .collect();
                        if row_keys.iter().any(GroupKey::is_null) {
                            keys.push(GroupKey(vec![KeyPart::Null]));
                        }
                        keys
                    }
                    None => first_seen(row_keys.iter()),
                };
                Ok(Grouping { candidates, row_keys })
            }
            Term::Cross(a, b) => {
                let a = a.evaluate(table)?;
                let b = b.evaluate(table)?;
                let candidates = a
                    .candidates
                    .iter()
                    .flat_map(|ka| b.candidates.iter().map(move |kb| ka.concat(kb)))
                    .collect();
                Ok(Grouping { candidates, row_keys: zip_keys(&a.row_keys, &b.row_keys) })
            }
            Term::Nest(outer, inner) => {
                let a = outer.evaluate(table)?;
                let b = inner.evaluate(table)?;
                let mut candidates = Vec::new();
                for ka in &a.candidates {
                    let nested = first_seen(
                        a.row_keys.iter().zip(&b.row_keys).filter(|(k, _)| *k == ka).map(|(_, kb)| kb),
                    );
                    if nested.iter().all(GroupKey::is_null) {
                        return Err(Error::IncompatibleAlgebra {
                            outer: outer.name(),
                            inner: inner.name(),
                            category: ka.to_string(),
                        });
                    }
                    candidates.extend(nested.iter().map(|kb| ka.concat(kb)));
                }
                Ok(Grouping { candidates, row_keys: zip_keys(&a.row_keys, &b.row_keys) })
            }
            Term::Blend(a, b) => {
                let a = a.evaluate(table)?;
                let b = b.evaluate(table)?;
                let candidates = first_seen(a.candidates.iter().chain(&b.candidates));
                let row_keys = a
                    .row_keys
                    .iter()
                    .zip(&b.row_keys)
                    .map(|(ka, kb)| if ka.is_null() { kb.clone() } else { ka.clone() })
                    .collect();
                Ok(Grouping { candidates, row_keys })
            }
        }
    }
}

impl From<&str> for Term {
    fn from(name: &str) -> Self {
        Term::var(name)
    }
}

/// Parses `a + b` (blend), `a * b` (cross) and `a / b` (nest), in increasing
/// order of binding strength; each operator is left-associative.
impl FromStr for Term {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        fold(s, '+', cross_expr, Term::blend)
    }
}

fn cross_expr(s: &str) -> Result<Term> {
    fold(s, '*', nest_expr, Term::cross)
}

fn nest_expr(s: &str) -> Result<Term> {
    fold(s, '/', var_expr, Term::nest)
}

fn var_expr(s: &str) -> Result<Term> {
    let name = s.trim();
    if name.is_empty() {
        return Err(Error::invalid("term", "empty variable in algebra expression"));
    }
    Ok(Term::var(name))
}

fn fold(s: &str, op: char, operand: fn(&str) -> Result<Term>, join: fn(Term, Term) -> Term) -> Result<Term> {
    s.split(op)
        .map(operand)
        .try_fold(None, |acc: Option<Term>, term| -> Result<Option<Term>> {
            let term = term?;
            Ok(Some(match acc {
                Some(lhs) => join(lhs, term),
                None => term,
            }))
        })?
        .ok_or_else(|| Error::invalid("term", "empty algebra expression"))
}

fn first_seen<'a>(keys: impl Iterator<Item = &'a GroupKey>) -> Vec<GroupKey> {
    let mut seen: HashSet<&GroupKey> = HashSet::new();
    let mut out = Vec::new();
    for key in keys {
        if seen.insert(key) {
            out.push(key.clone());
        }
    }
    out
}

fn zip_keys(a: &[GroupKey], b: &[GroupKey]) -> Vec<GroupKey> {
    a.iter().zip(b).map(|(ka, kb)| ka.concat(kb)).collect()
}

/// Grouping produced by the algebra: candidate keys plus one key per row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Grouping {
    candidates: Vec<GroupKey>,
    row_keys: Vec<GroupKey>,
}

impl Grouping {
    /// All candidate keys, before empty-panel pruning.
    #[must_use]
    pub fn candidates(&self) -> &[GroupKey] {
        &self.candidates
    }

    /// Grouping key of each row.
    #[must_use]
    pub fn row_keys(&self) -> &[GroupKey] {
        &self.row_keys
    }

    /// Key of one row.
    #[must_use]
    pub fn key(&self, row: usize) -> Option<&GroupKey> {
        self.row_keys.get(row)
    }
}

/// Combine terms into a per-row grouping.
///
/// Terms are crossed left to right; an empty term list puts every row under
/// one empty key.
pub fn combine(terms: &[Term], table: &Table) -> Result<Grouping> {
    let Some((first, rest)) = terms.split_first() else {
        return Ok(Grouping {
            candidates: vec![GroupKey::default()],
            row_keys: vec![GroupKey::default(); table.nrow()],
        });
    };
    let term = rest.iter().cloned().fold(first.clone(), Term::cross);
    let grouping = term.evaluate(table)?;
    debug!(
        term = %term.name(),
        candidates = grouping.candidates.len(),
        rows = grouping.row_keys.len(),
        "algebra combined"
    );
    Ok(grouping)
}
