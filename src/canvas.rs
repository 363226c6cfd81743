//! Character-grid canvas.
//!
//! Rasterizes final-plane primitives into ASCII text. A viewport maps a
//! rectangle of the plane onto the grid with y pointing up. Marks and fills
//! are chosen from the primitive's discrete style level, falling back to its
//! group index, so series stay distinguishable without colour.

use crate::error::{Error, Result};
use crate::geometry::{Bounds, Point};
use crate::grammar::{Primitive, Shape};

/// Largest accepted side length in cells.
const MAX_SIDE: usize = 4096;

/// Cell coordinates further out than this are not rasterized.
const MAX_REACH: f64 = 1.0e6;

/// Glyphs for points and strokes.
const MARKS: [char; 8] = ['o', '+', 'x', '*', '@', '%', '&', '$'];

/// Glyphs for filled areas.
const FILLS: [char; 5] = ['#', '=', ':', '%', '~'];

/// A grid of characters.
#[derive(Debug, Clone, PartialEq)]
pub struct Canvas {
    width: usize,
    height: usize,
    cells: Vec<char>,
    viewport: Bounds,
}

impl Canvas {
    /// Blank canvas viewing the unit square.
    pub fn new(width: usize, height: usize) -> Result<Self> {
        if width == 0 || height == 0 || width > MAX_SIDE || height > MAX_SIDE {
            return Err(Error::InvalidDimensions { width, height });
        }
        Ok(Self {
            width,
            height,
            cells: vec![' '; width * height],
            viewport: Bounds { min: Point::ORIGIN, max: Point::new(1.0, 1.0) },
        })
    }

    /// Set the plane rectangle shown by the grid.
    #[must_use]
    pub fn viewport(mut self, viewport: Bounds) -> Self {
        self.viewport = viewport;
        self
    }

    /// Viewport tightly covering every primitive; the unit square when empty.
    ///
    /// A zero-extent axis is widened by 0.5 on each side.
    #[must_use]
    pub fn fit(self, primitives: &[Primitive]) -> Self {
        let Some(bounds) = Bounds::from_points(primitives.iter().flat_map(|p| &p.points)) else {
            return self;
        };
        let pad = |lo: f64, hi: f64| if hi > lo { (lo, hi) } else { (lo - 0.5, hi + 0.5) };
        let (x0, x1) = pad(bounds.min.x, bounds.max.x);
        let (y0, y1) = pad(bounds.min.y, bounds.max.y);
        self.viewport(Bounds { min: Point::new(x0, y0), max: Point::new(x1, y1) })
    }

    /// Width in cells.
    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Height in cells.
    #[must_use]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Character at a cell; row 0 is the top line.
    #[must_use]
    pub fn get(&self, col: usize, row: usize) -> Option<char> {
        (col < self.width && row < self.height).then(|| self.cells[row * self.width + col])
    }

    /// Reset every cell to blank.
    pub fn clear(&mut self) {
        self.cells.fill(' ');
    }

    /// Rasterize one primitive.
    pub fn draw(&mut self, primitive: &Primitive) {
        let index = glyph_index(primitive);
        let mark = MARKS[index % MARKS.len()];
        let cells: Vec<(f64, f64)> = primitive.points.iter().map(|&p| self.to_cell(p)).collect();
        match primitive.shape {
            Shape::Point => {
                for &(c, r) in &cells {
                    self.plot(c, r, mark);
                }
            }
            Shape::Text => {
                if let (Some(&(c, r)), Some(text)) = (cells.first(), primitive.style.label.as_deref()) {
                    for (i, ch) in text.chars().enumerate() {
                        self.plot(c.round() + i as f64, r, ch);
                    }
                }
            }
            Shape::Segment | Shape::Polyline => self.stroke(&cells, false, mark),
            Shape::Rect | Shape::Polygon => {
                let fill = FILLS[index % FILLS.len()];
                self.fill(&cells, fill);
                self.stroke(&cells, true, fill);
            }
        }
    }

    /// Rasterize primitives in order; later ones overwrite earlier ones.
    pub fn draw_all<'a>(&mut self, primitives: impl IntoIterator<Item = &'a Primitive>) {
        for primitive in primitives {
            self.draw(primitive);
        }
    }

    /// The grid as text, one line per row.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::with_capacity((self.width + 1) * self.height);
        for row in self.cells.chunks(self.width) {
            out.extend(row.iter());
            out.push('\n');
        }
        out
    }

    /// Continuous cell coordinates of a plane point.
    fn to_cell(&self, p: Point) -> (f64, f64) {
        let span = |d: f64| if d > 0.0 { d } else { 1.0 };
        let v = &self.viewport;
        let c = (p.x - v.min.x) / span(v.width()) * (self.width - 1) as f64;
        let r = (self.height - 1) as f64 - (p.y - v.min.y) / span(v.height()) * (self.height - 1) as f64;
        (c, r)
    }

    fn plot(&mut self, c: f64, r: f64, ch: char) {
        let (c, r) = (c.round(), r.round());
        if c >= 0.0 && r >= 0.0 && (c as usize) < self.width && (r as usize) < self.height {
            self.cells[r as usize * self.width + c as usize] = ch;
        }
    }

    fn stroke(&mut self, cells: &[(f64, f64)], closed: bool, ch: char) {
        if let [only] = cells {
            self.plot(only.0, only.1, ch);
            return;
        }
        let edges = if closed { cells.len() } else { cells.len().saturating_sub(1) };
        for i in 0..edges {
            let (a, b) = (cells[i], cells[(i + 1) % cells.len()]);
            self.line(a, b, ch);
        }
    }

    /// Bresenham's line between two cell positions.
    fn line(&mut self, a: (f64, f64), b: (f64, f64), ch: char) {
        let reachable = |(c, r): (f64, f64)| c.abs() < MAX_REACH && r.abs() < MAX_REACH;
        if !(reachable(a) && reachable(b)) {
            return;
        }
        let (x0, y0) = (a.0.round() as i64, a.1.round() as i64);
        let (x1, y1) = (b.0.round() as i64, b.1.round() as i64);
        let dx = (x1 - x0).abs();
        let dy = -(y1 - y0).abs();
        let sx = if x0 < x1 { 1 } else { -1 };
        let sy = if y0 < y1 { 1 } else { -1 };
        let mut err = dx + dy;
        let (mut x, mut y) = (x0, y0);
        loop {
            self.plot(x as f64, y as f64, ch);
            if x == x1 && y == y1 {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x += sx;
            }
            if e2 <= dx {
                err += dx;
                y += sy;
            }
        }
    }

    /// Even-odd scanline fill at integer rows.
    fn fill(&mut self, cells: &[(f64, f64)], ch: char) {
        if cells.len() < 3 {
            return;
        }
        let (top, bottom) = cells
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &(_, r)| (lo.min(r), hi.max(r)));
        let first = top.ceil().max(0.0) as usize;
        let last = bottom.floor().min((self.height - 1) as f64);
        if last.is_nan() || last < 0.0 {
            return;
        }
        for row in first..=last as usize {
            let y = row as f64;
            let mut crossings: Vec<f64> = Vec::new();
            for i in 0..cells.len() {
                let (a, b) = (cells[i], cells[(i + 1) % cells.len()]);
                let (lo, hi) = if a.1 < b.1 { (a, b) } else { (b, a) };
                if lo.1 <= y && y < hi.1 {
                    crossings.push(lo.0 + (y - lo.1) / (hi.1 - lo.1) * (hi.0 - lo.0));
                }
            }
            crossings.sort_by(f64::total_cmp);
            for pair in crossings.chunks_exact(2) {
                let from = pair[0].ceil().max(0.0) as usize;
                let to = pair[1].floor().min((self.width - 1) as f64);
                if to < 0.0 {
                    continue;
                }
                for col in from..=to as usize {
                    self.cells[row * self.width + col] = ch;
                }
            }
        }
    }
}

fn glyph_index(primitive: &Primitive) -> usize {
    let style = &primitive.style;
    [style.shape, style.colour, style.fill]
        .into_iter()
        .flatten()
        .find_map(|v| v.level)
        .unwrap_or(primitive.group)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::{Style, StyleValue};

    fn primitive(shape: Shape, points: &[(f64, f64)]) -> Primitive {
        Primitive {
            shape,
            points: points.iter().map(|&(x, y)| Point::new(x, y)).collect(),
            style: Style::default(),
            group: 0,
        }
    }

    fn count(canvas: &Canvas, ch: char) -> usize {
        canvas.render().chars().filter(|&c| c == ch).count()
    }

    #[test]
    fn test_invalid_dimensions() {
        assert!(matches!(Canvas::new(0, 5), Err(Error::InvalidDimensions { width: 0, height: 5 })));
        assert!(Canvas::new(5, MAX_SIDE + 1).is_err());
    }

    #[test]
    fn test_points_land_in_corners() {
        let mut canvas = Canvas::new(5, 5).unwrap();
        canvas.draw(&primitive(Shape::Point, &[(0.0, 0.0)]));
        canvas.draw(&primitive(Shape::Point, &[(1.0, 1.0)]));
        assert_eq!(canvas.get(0, 4), Some('o'));
        assert_eq!(canvas.get(4, 0), Some('o'));
        assert_eq!(count(&canvas, 'o'), 2);
    }

    #[test]
    fn test_diagonal_line() {
        let mut canvas = Canvas::new(5, 5).unwrap();
        canvas.draw(&primitive(Shape::Polyline, &[(0.0, 0.0), (1.0, 1.0)]));
        for i in 0..5 {
            assert_eq!(canvas.get(i, 4 - i), Some('o'));
        }
        assert_eq!(count(&canvas, 'o'), 5);
    }

    #[test]
    fn test_rect_is_filled() {
        let mut canvas = Canvas::new(5, 5).unwrap();
        canvas.draw(&primitive(Shape::Rect, &[(0.0, 0.0), (1.0, 0.0), (1.0, 0.5), (0.0, 0.5)]));
        assert_eq!(count(&canvas, '#'), 15);
        assert_eq!(canvas.get(2, 1), Some(' '));
    }

    #[test]
    fn test_glyph_follows_level_then_group() {
        let mut canvas = Canvas::new(3, 1).unwrap();
        let mut p = primitive(Shape::Point, &[(0.0, 0.5)]);
        p.group = 1;
        canvas.draw(&p);
        p.points[0] = Point::new(1.0, 0.5);
        p.style.shape = Some(StyleValue { value: 1.0, level: Some(2) });
        canvas.draw(&p);
        assert_eq!(canvas.render(), "+ x\n");
    }

    #[test]
    fn test_text_is_clipped() {
        let mut canvas = Canvas::new(4, 1).unwrap();
        let mut p = primitive(Shape::Text, &[(0.5, 0.5)]);
        p.style.label = Some("hello".into());
        canvas.draw(&p);
        assert_eq!(canvas.render(), "  he\n");
    }

    #[test]
    fn test_fit_covers_polar_disc() {
        let ring = primitive(Shape::Polygon, &[(-1.0, 0.0), (0.0, -1.0), (1.0, 0.0), (0.0, 1.0)]);
        let mut canvas = Canvas::new(9, 9).unwrap().fit(std::slice::from_ref(&ring));
        canvas.draw(&ring);
        assert_eq!(canvas.get(4, 4), Some('#'));
        assert_eq!(canvas.get(0, 4), Some('#'));
        assert_eq!(canvas.get(0, 0), Some(' '));
    }

    #[test]
    fn test_render_shape_and_clear() {
        let mut canvas = Canvas::new(3, 2).unwrap();
        canvas.draw(&primitive(Shape::Point, &[(0.5, 0.5)]));
        assert_eq!(canvas.render().lines().count(), 2);
        canvas.clear();
        assert_eq!(canvas.render(), "   \n   \n");
    }
}
