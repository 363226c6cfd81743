//! Grammar of Graphics implementation.
//!
//! Provides a layered, declarative visualization pipeline based on Wilkinson's
//! Grammar of Graphics [Wilkinson 2005].
//!
//! # Components
//!
//! - **Variables**: Column references and derived expressions
//! - **Aesthetics**: Mappings from variables to channels (x, y, colour, size, shape)
//! - **Algebra**: Cross, nest and blend of variables into grouping keys
//! - **Facets**: Panels split on the algebra's keys
//! - **Statistics**: Summaries over raw values (identity, bin, count, aggregate, density, regression)
//! - **Positions**: Collision modifiers (stack, dodge, jitter)
//! - **Geometries**: Primitive builders (point, bar, interval, text, line, path, polygon, area)
//! - **Coordinates**: Final plane mappings (cartesian, polar, custom)
//!
//! # Example
//!
//! ```rust
//! use trueno_grammar::grammar::*;
//! use trueno_grammar::table::Table;
//!
//! let table = Table::from_xy(&[1.0, 2.0, 3.0], &[4.0, 5.0, 6.0]).unwrap();
//! let rendered = Plot::new()
//!     .data(table)
//!     .aes(Aes::new().x("x").y("y"))
//!     .geom(Geom::point())
//!     .render()
//!     .unwrap();
//! assert_eq!(rendered.primitive_count(), 3);
//! ```
//!
//! # References
//!
//! - Wilkinson, L. (2005). *The Grammar of Graphics*. Springer.
//! - Wickham, H. (2010). "A Layered Grammar of Graphics." Journal of Computational
//!   and Graphical Statistics.

pub mod aes;
pub mod algebra;
pub mod coord;
pub mod facet;
pub mod frame;
pub mod geom;
pub mod plot;
pub mod position;
pub mod stat;
pub mod variable;

pub use aes::{Aes, Axis, Channel};
pub use algebra::{combine, GroupKey, Grouping, KeyPart, Term};
pub use coord::{Bijection, Coord};
pub use facet::{Facet, FacetLayout, Panel};
pub use frame::{Frame, ScaledFrame};
pub use geom::{Geom, Primitive, Shape, Style, StyleValue};
pub use plot::{Plot, Rendered, RenderedPanel};
pub use position::Position;
pub use stat::{AggFn, Bins, Stat};
pub use variable::{BinaryOp, Expr, UnaryOp, VarSpec};
