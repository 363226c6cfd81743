//! Faceting for Grammar of Graphics.
//!
//! Creates small multiples by splitting rows on the grouping key produced by
//! the algebra. Panels come out in candidate-key order; keys without rows
//! produce no panel.

use std::collections::HashMap;

use super::algebra::{combine, GroupKey, Grouping, KeyPart, Term};
use crate::error::{Error, Result};
use crate::table::Table;

/// How panels are placed on the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FacetLayout {
    /// All panels side by side in one row.
    #[default]
    Single,
    /// Row-major wrap after `ncol` panels.
    Wrap {
        /// Panels per row.
        ncol: usize,
    },
    /// First key component picks the row, second the column.
    Grid,
}

/// Faceting specification.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Facet {
    terms: Vec<Term>,
    layout: FacetLayout,
}

impl Facet {
    /// No faceting: one panel with every row.
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// Facet by crossed terms with a layout.
    #[must_use]
    pub fn new(terms: Vec<Term>, layout: FacetLayout) -> Self {
        Self { terms, layout }
    }

    /// Facet into wrapped panels.
    #[must_use]
    pub fn wrap(term: impl Into<Term>, ncol: usize) -> Self {
        Self::new(vec![term.into()], FacetLayout::Wrap { ncol })
    }

    /// Facet into a grid of panels.
    #[must_use]
    pub fn grid(row: impl Into<Term>, col: impl Into<Term>) -> Self {
        Self::new(vec![row.into(), col.into()], FacetLayout::Grid)
    }

    /// Terms crossed into the panel key.
    #[must_use]
    pub fn terms(&self) -> &[Term] {
        &self.terms
    }

    /// Panel layout.
    #[must_use]
    pub fn layout(&self) -> FacetLayout {
        self.layout
    }

    /// Split a table into panels.
    pub fn split(&self, table: &Table) -> Result<Vec<Panel>> {
        split(&combine(&self.terms, table)?, self.layout)
    }
}

/// Rows of one facet.
#[derive(Debug, Clone, PartialEq)]
pub struct Panel {
    /// Grouping key.
    pub key: GroupKey,
    /// Display label of the key; empty for an unfaceted plot.
    pub label: String,
    /// Table rows in table order.
    pub rows: Vec<usize>,
    /// Layout row.
    pub row: usize,
    /// Layout column.
    pub col: usize,
}

/// Partition rows by grouping key.
pub fn split(grouping: &Grouping, layout: FacetLayout) -> Result<Vec<Panel>> {
    if layout == (FacetLayout::Wrap { ncol: 0 }) {
        return Err(Error::invalid("ncol", "wrap layout needs at least one column"));
    }
    let mut rows_by_key: HashMap<&GroupKey, Vec<usize>> = HashMap::new();
    for (row, key) in grouping.row_keys().iter().enumerate() {
        rows_by_key.entry(key).or_default().push(row);
    }

    let mut order: Vec<&GroupKey> = grouping.candidates().iter().collect();
    for key in grouping.row_keys() {
        if !order.contains(&key) {
            order.push(key);
        }
    }

    let mut panels: Vec<Panel> = order
        .into_iter()
        .filter_map(|key| {
            let rows = rows_by_key.remove(key)?;
            Some(Panel { key: key.clone(), label: key.to_string(), rows, row: 0, col: 0 })
        })
        .collect();
    place(&mut panels, layout);
    tracing::debug!(panels = panels.len(), ?layout, "facets split");
    Ok(panels)
}

fn place(panels: &mut [Panel], layout: FacetLayout) {
    match layout {
        FacetLayout::Single => {
            for (i, panel) in panels.iter_mut().enumerate() {
                panel.col = i;
            }
        }
        FacetLayout::Wrap { ncol } => {
            for (i, panel) in panels.iter_mut().enumerate() {
                panel.row = i / ncol;
                panel.col = i % ncol;
            }
        }
        FacetLayout::Grid => {
            let mut rows: Vec<KeyPart> = Vec::new();
            let mut cols: Vec<KeyPart> = Vec::new();
            let slot = |seen: &mut Vec<KeyPart>, part: KeyPart| match seen.iter().position(|p| *p == part) {
                Some(i) => i,
                None => {
                    seen.push(part);
                    seen.len() - 1
                }
            };
            for panel in panels.iter_mut() {
                let parts = panel.key.parts();
                panel.row = slot(&mut rows, parts.first().cloned().unwrap_or(KeyPart::Null));
                panel.col = slot(&mut cols, parts.get(1).cloned().unwrap_or(KeyPart::Null));
            }
        }
    }
}
