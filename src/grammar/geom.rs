//! Geometry types for Grammar of Graphics.
//!
//! A geometry turns scaled rows into [`Primitive`]s in the unit panel. Per-row
//! geometries emit one primitive per complete row; per-group geometries emit
//! one primitive per group.

use super::aes::Channel;
use super::frame::ScaledFrame;
use crate::error::{Error, Result};
use crate::geometry::Point;

/// Shape of a primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Shape {
    /// Single position.
    Point,
    /// Four corners, counter-clockwise from the lower left.
    Rect,
    /// Two-point segment.
    Segment,
    /// Open polyline.
    Polyline,
    /// Closed ring; the last point connects back to the first.
    Polygon,
    /// Text anchored at one position.
    Text,
}

impl Shape {
    /// True when the last point connects to the first.
    #[must_use]
    pub fn is_closed(self) -> bool {
        matches!(self, Shape::Rect | Shape::Polygon)
    }

    /// True when the shape is drawn as connected edges.
    #[must_use]
    pub fn has_edges(self) -> bool {
        !matches!(self, Shape::Point | Shape::Text)
    }
}

/// A resolved style value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StyleValue {
    /// Normalized value.
    pub value: f64,
    /// Level index on a discrete scale.
    pub level: Option<usize>,
}

/// Resolved non-position aesthetics of a primitive.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Style {
    /// Stroke colour.
    pub colour: Option<StyleValue>,
    /// Fill colour.
    pub fill: Option<StyleValue>,
    /// Mark size.
    pub size: Option<StyleValue>,
    /// Opacity.
    pub alpha: Option<StyleValue>,
    /// Point shape.
    pub shape: Option<StyleValue>,
    /// Label text.
    pub label: Option<String>,
}

impl Style {
    /// Style of one scaled row.
    #[must_use]
    pub fn of_row(frame: &ScaledFrame, row: usize) -> Self {
        let value = |channel| {
            frame.get(channel, row).map(|value| StyleValue { value, level: frame.level(channel, row) })
        };
        Self {
            colour: value(Channel::Colour),
            fill: value(Channel::Fill),
            size: value(Channel::Size),
            alpha: value(Channel::Alpha),
            shape: value(Channel::Shape),
            label: frame.label(row).map(str::to_string),
        }
    }
}

/// A renderable primitive.
#[derive(Debug, Clone, PartialEq)]
pub struct Primitive {
    /// Shape tag.
    pub shape: Shape,
    /// Ordered positions.
    pub points: Vec<Point>,
    /// Resolved style.
    pub style: Style,
    /// Group index within the panel.
    pub group: usize,
}

/// Geometry type specification.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Geom {
    /// Points.
    #[default]
    Point,
    /// Bars from the baseline (or `ymin`) to `y` (or `ymax`).
    Bar {
        /// Bar width as a fraction of the x slot.
        width: f64,
    },
    /// Vertical `ymin..ymax` interval.
    Interval {
        /// Cap width as a fraction of the x slot; 0 draws no caps.
        width: f64,
    },
    /// Text labels.
    Text,
    /// Lines connecting points in x order.
    Line,
    /// Lines connecting points in row order.
    Path,
    /// Closed polygon per group.
    Polygon,
    /// Area between the baseline (or `ymin`) and the line.
    Area,
}

impl Geom {
    /// Create a point geometry.
    #[must_use]
    pub fn point() -> Self {
        Geom::Point
    }

    /// Create a bar geometry.
    #[must_use]
    pub fn bar() -> Self {
        Geom::Bar { width: 0.9 }
    }

    /// Create an interval geometry without caps.
    #[must_use]
    pub fn interval() -> Self {
        Geom::Interval { width: 0.0 }
    }

    /// Create a text geometry.
    #[must_use]
    pub fn text() -> Self {
        Geom::Text
    }

    /// Create a line geometry.
    #[must_use]
    pub fn line() -> Self {
        Geom::Line
    }

    /// Create a path geometry.
    #[must_use]
    pub fn path() -> Self {
        Geom::Path
    }

    /// Create a polygon geometry.
    #[must_use]
    pub fn polygon() -> Self {
        Geom::Polygon
    }

    /// Create an area geometry.
    #[must_use]
    pub fn area() -> Self {
        Geom::Area
    }

    /// Set bar or interval width.
    #[must_use]
    pub fn width(mut self, w: f64) -> Self {
        match self {
            Geom::Bar { ref mut width } | Geom::Interval { ref mut width } => *width = w,
            _ => {}
        }
        self
    }

    /// Geometry name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Geom::Point => "point",
            Geom::Bar { .. } => "bar",
            Geom::Interval { .. } => "interval",
            Geom::Text => "text",
            Geom::Line => "line",
            Geom::Path => "path",
            Geom::Polygon => "polygon",
            Geom::Area => "area",
        }
    }

    /// True for geometries that draw one primitive per group.
    #[must_use]
    pub fn is_per_group(&self) -> bool {
        matches!(self, Geom::Line | Geom::Path | Geom::Polygon | Geom::Area)
    }

    /// Minimum complete rows per group.
    #[must_use]
    pub fn min_rows(&self) -> usize {
        match self {
            Geom::Line | Geom::Path | Geom::Area => 2,
            Geom::Polygon => 3,
            _ => 0,
        }
    }

    /// Build the primitives of one panel.
    pub fn render(&self, frame: &ScaledFrame) -> Result<Vec<Primitive>> {
        if let Geom::Bar { width } | Geom::Interval { width } = *self {
            if !(width.is_finite() && width >= 0.0) {
                return Err(Error::invalid("width", format!("width must be non-negative, got {width}")));
            }
        }
        let primitives = if self.is_per_group() { self.render_groups(frame)? } else { self.render_rows(frame) };
        tracing::trace!(geom = self.name(), rows = frame.len(), primitives = primitives.len(), "geometry rendered");
        Ok(primitives)
    }

    fn render_rows(&self, frame: &ScaledFrame) -> Vec<Primitive> {
        let mut out = Vec::with_capacity(frame.len());
        let mut skipped = 0usize;
        for row in 0..frame.len() {
            let before = out.len();
            self.render_row(frame, row, &mut out);
            if out.len() == before {
                skipped += 1;
            }
        }
        if skipped > 0 {
            tracing::warn!(geom = self.name(), skipped, "rows with missing positions skipped");
        }
        out
    }

    fn render_row(&self, frame: &ScaledFrame, row: usize, out: &mut Vec<Primitive>) {
        let get = |c| frame.get(c, row);
        let group = frame.group(row);
        let mut emit = |shape, points| out.push(Primitive { shape, points, style: Style::of_row(frame, row), group });
        match *self {
            Geom::Point => {
                if let (Some(x), Some(y)) = (get(Channel::X), get(Channel::Y)) {
                    emit(Shape::Point, vec![Point::new(x, y)]);
                }
            }
            Geom::Text => {
                if let (Some(x), Some(y), Some(_)) = (get(Channel::X), get(Channel::Y), frame.label(row)) {
                    emit(Shape::Text, vec![Point::new(x, y)]);
                }
            }
            Geom::Bar { width } => {
                let half = width * frame.slot_width() / 2.0;
                let xs = match (get(Channel::Xmin), get(Channel::Xmax)) {
                    (Some(lo), Some(hi)) => Some((lo, hi)),
                    _ => get(Channel::X).map(|x| (x - half, x + half)),
                };
                let ys = match (get(Channel::Ymin), get(Channel::Ymax)) {
                    (Some(lo), Some(hi)) => Some((lo, hi)),
                    _ => get(Channel::Y).map(|y| (frame.baseline(), y)),
                };
                if let (Some((x0, x1)), Some((y0, y1))) = (xs, ys) {
                    emit(
                        Shape::Rect,
                        vec![Point::new(x0, y0), Point::new(x1, y0), Point::new(x1, y1), Point::new(x0, y1)],
                    );
                }
            }
            Geom::Interval { width } => {
                if let (Some(x), Some(lo), Some(hi)) = (get(Channel::X), get(Channel::Ymin), get(Channel::Ymax)) {
                    emit(Shape::Segment, vec![Point::new(x, lo), Point::new(x, hi)]);
                    if width > 0.0 {
                        let half = width * frame.slot_width() / 2.0;
                        for y in [lo, hi] {
                            emit(Shape::Segment, vec![Point::new(x - half, y), Point::new(x + half, y)]);
                        }
                    }
                }
            }
            Geom::Line | Geom::Path | Geom::Polygon | Geom::Area => {}
        }
    }

    fn render_groups(&self, frame: &ScaledFrame) -> Result<Vec<Primitive>> {
        let mut out = Vec::with_capacity(frame.n_groups());
        for (group, rows) in frame.group_rows().into_iter().enumerate() {
            let complete: Vec<usize> = rows
                .iter()
                .copied()
                .filter(|&row| frame.get(Channel::X, row).is_some() && self.top(frame, row).is_some())
                .collect();
            if complete.len() < self.min_rows() {
                return Err(Error::EmptyPanel { stage: self.name(), required: self.min_rows(), actual: complete.len() });
            }
            if complete.len() < rows.len() {
                tracing::warn!(geom = self.name(), group, skipped = rows.len() - complete.len(), "rows with missing positions skipped");
            }
            let mut ordered = complete;
            if matches!(self, Geom::Line | Geom::Area) {
                ordered.sort_by(|&a, &b| {
                    let xa = frame.get(Channel::X, a).unwrap_or_default();
                    let xb = frame.get(Channel::X, b).unwrap_or_default();
                    xa.total_cmp(&xb)
                });
            }
            let at = |row: usize, y: f64| Point::new(frame.get(Channel::X, row).unwrap_or_default(), y);
            let tops = ordered.iter().map(|&row| at(row, self.top(frame, row).unwrap_or_default()));
            let (shape, points) = match self {
                Geom::Line | Geom::Path => (Shape::Polyline, tops.collect()),
                Geom::Polygon => (Shape::Polygon, tops.collect()),
                _ => {
                    let mut ring: Vec<Point> = tops.collect();
                    ring.extend(ordered.iter().rev().map(|&row| {
                        at(row, frame.get(Channel::Ymin, row).unwrap_or(frame.baseline()))
                    }));
                    (Shape::Polygon, ring)
                }
            };
            out.push(Primitive { shape, points, style: Style::of_row(frame, ordered[0]), group });
        }
        Ok(out)
    }

    /// Upper edge of a row: `ymax` for areas when present, otherwise `y`.
    fn top(&self, frame: &ScaledFrame, row: usize) -> Option<f64> {
        match self {
            Geom::Area => frame.get(Channel::Ymax, row).or_else(|| frame.get(Channel::Y, row)),
            _ => frame.get(Channel::Y, row),
        }
    }
}
