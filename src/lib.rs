//! # Trueno-Grammar
//!
//! A layered Grammar of Graphics pipeline: typed tables go in, positioned
//! renderable primitives come out.
//!
//! Each stage is a closed enum with an explicit operation, and stages only
//! meet at typed boundaries:
//!
//! - **Algebra** groups rows by crossing, nesting and blending variables
//! - **Facets** split the grouped rows into independent panels
//! - **Statistics** summarize raw values before any scaling
//! - **Scales** are trained over every panel that shares them, frozen, and
//!   only then resolve values into `[0,1]`
//! - **Positions** resolve collisions on normalized positions
//! - **Geometries** build primitives in the unit panel
//! - **Coordinates** map the unit panel onto the final plane
//!
//! ## Quick Start
//!
//! ```rust
//! use trueno_grammar::prelude::*;
//!
//! let table = Table::builder()
//!     .text("class", &["A", "A", "B"])
//!     .numeric("value", &[1.0, 3.0, 5.0])
//!     .build()?;
//!
//! let rendered = Plot::new()
//!     .data(table)
//!     .aes(Aes::new().x("class").y("value"))
//!     .stat(Stat::sum())
//!     .geom(Geom::bar())
//!     .render()?;
//!
//! let mut canvas = Canvas::new(40, 10)?;
//! canvas.draw_all(&rendered.panels[0].primitives);
//! print!("{}", canvas.render());
//! # Ok::<(), trueno_grammar::Error>(())
//! ```
//!
//! ## Feature Flags
//!
//! - `parallel`: Render facet panels in parallel with rayon
//!
//! ## Academic References
//!
//! - Wilkinson, L. (2005). *The Grammar of Graphics*. Springer.
//! - Wickham, H. (2010). "A Layered Grammar of Graphics." JCGS 19(1).
//! - Silverman, B. W. (1986). *Density Estimation for Statistics and Data Analysis*.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs)]
// Allow unwrap() in tests only - banned in production code
#![cfg_attr(test, allow(clippy::unwrap_used))]
// Allow common patterns in graphics/visualization code
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::many_single_char_names)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::similar_names)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Core Modules
// ============================================================================

/// Typed data tables.
pub mod table;

/// Points and bounding boxes in the unit panel and the final plane.
pub mod geometry;

/// Two-phase scales: domain accumulators and frozen scales.
pub mod scale;

// ============================================================================
// Pipeline
// ============================================================================

/// Grammar of Graphics implementation.
pub mod grammar;

/// YAML plot configuration.
pub mod config;

// ============================================================================
// Output
// ============================================================================

/// Character-grid canvas for rendered primitives.
pub mod canvas;

// ============================================================================
// Error Types
// ============================================================================

/// Error types for trueno-grammar operations.
pub mod error;

pub use error::{Error, Result};

// ============================================================================
// Prelude
// ============================================================================

/// Commonly used types and traits for convenient imports.
///
/// ```rust
/// use trueno_grammar::prelude::*;
/// ```
pub mod prelude {
    pub use crate::canvas::Canvas;
    pub use crate::config::PlotConfig;
    pub use crate::error::{Error, Result};
    pub use crate::geometry::{Bounds, Point};
    pub use crate::grammar::{
        Aes, AggFn, Axis, Channel, Coord, Facet, FacetLayout, Geom, Plot, Position, Primitive,
        Rendered, RenderedPanel, Shape, Stat, Term, VarSpec,
    };
    pub use crate::scale::{ScaleConfig, ScaleSharing, Transform};
    pub use crate::table::{Column, ColumnType, DataValue, Table};
}
