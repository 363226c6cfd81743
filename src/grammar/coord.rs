//! Coordinate systems for Grammar of Graphics.
//!
//! A coordinate system maps unit-panel positions (already normalized by the
//! scales) to the final plane. It never sees raw data values.

use std::f64::consts::TAU;
use std::fmt;

use super::aes::Axis;
use super::geom::Primitive;
use crate::error::{Error, Result};
use crate::geometry::{Bounds, Point};

/// Tolerance on the radial domain of polar coordinates.
const RADIUS_TOLERANCE: f64 = 1e-9;

/// Longest unit-panel edge drawn as one straight piece under polar coordinates.
const MUNCH_STEP: f64 = 0.01;

/// A caller-supplied invertible mapping.
#[derive(Clone, Copy)]
pub struct Bijection {
    name: &'static str,
    forward: fn(Point) -> Point,
    inverse: fn(Point) -> Point,
}

impl Bijection {
    /// Create a bijection from its forward and inverse functions.
    #[must_use]
    pub fn new(name: &'static str, forward: fn(Point) -> Point, inverse: fn(Point) -> Point) -> Self {
        Self { name, forward, inverse }
    }

    /// Name used in errors.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl fmt::Debug for Bijection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bijection").field("name", &self.name).finish_non_exhaustive()
    }
}

impl PartialEq for Bijection {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

/// Coordinate system type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Coord {
    /// Cartesian coordinates (x, y).
    Cartesian {
        /// Whether to flip x and y.
        flip: bool,
    },
    /// Polar coordinates: one axis becomes the angle, the other the radius.
    Polar {
        /// Axis mapped to the angle.
        theta: Axis,
        /// Radius of normalized 0 and 1 on the radial axis.
        r_range: (f64, f64),
        /// Start angle in radians.
        start: f64,
        /// 1 for counter-clockwise, -1 for clockwise.
        direction: f64,
    },
    /// Caller-supplied bijection.
    Custom(Bijection),
}

impl Default for Coord {
    fn default() -> Self {
        Coord::cartesian()
    }
}

impl Coord {
    /// Create a Cartesian coordinate system.
    #[must_use]
    pub fn cartesian() -> Self {
        Coord::Cartesian { flip: false }
    }

    /// Create a polar coordinate system with x as the angle.
    #[must_use]
    pub fn polar() -> Self {
        Coord::Polar { theta: Axis::X, r_range: (0.0, 1.0), start: 0.0, direction: 1.0 }
    }

    /// Create a custom coordinate system.
    #[must_use]
    pub fn custom(bijection: Bijection) -> Self {
        Coord::Custom(bijection)
    }

    /// Flip x and y axes.
    #[must_use]
    pub fn flip(mut self) -> Self {
        if let Coord::Cartesian { flip: ref mut f } = self {
            *f = true;
        }
        self
    }

    /// Set the polar angle axis.
    #[must_use]
    pub fn theta(mut self, axis: Axis) -> Self {
        if let Coord::Polar { theta: ref mut t, .. } = self {
            *t = axis;
        }
        self
    }

    /// Set the polar radius range.
    #[must_use]
    pub fn r_range(mut self, r_min: f64, r_max: f64) -> Self {
        if let Coord::Polar { r_range: ref mut r, .. } = self {
            *r = (r_min, r_max);
        }
        self
    }

    /// Set polar start angle.
    #[must_use]
    pub fn start_angle(mut self, start: f64) -> Self {
        if let Coord::Polar { start: ref mut s, .. } = self {
            *s = start;
        }
        self
    }

    /// Set polar direction (1 = counter-clockwise, -1 = clockwise).
    #[must_use]
    pub fn direction(mut self, dir: i8) -> Self {
        if let Coord::Polar { direction: ref mut d, .. } = self {
            *d = if dir >= 0 { 1.0 } else { -1.0 };
        }
        self
    }

    /// Coordinate system name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Coord::Cartesian { .. } => "cartesian",
            Coord::Polar { .. } => "polar",
            Coord::Custom(b) => b.name,
        }
    }

    /// Final-plane rectangle holding every mapped unit-panel position.
    ///
    /// `None` for custom bijections, whose image is not known up front.
    #[must_use]
    pub fn plane(&self) -> Option<Bounds> {
        match *self {
            Coord::Cartesian { .. } => Some(Bounds { min: Point::ORIGIN, max: Point::new(1.0, 1.0) }),
            Coord::Polar { r_range: (_, r), .. } => Some(Bounds { min: Point::new(-r, -r), max: Point::new(r, r) }),
            Coord::Custom(_) => None,
        }
    }

    fn domain_error(&self, axis: Axis, value: f64) -> Error {
        Error::CoordinateDomain { coord: self.name(), axis: axis.name(), value }
    }

    fn check_finite(&self, p: Point) -> Result<()> {
        if !p.x.is_finite() {
            return Err(self.domain_error(Axis::X, p.x));
        }
        if !p.y.is_finite() {
            return Err(self.domain_error(Axis::Y, p.y));
        }
        Ok(())
    }

    fn check_r_range(r_range: (f64, f64)) -> Result<()> {
        let (r_min, r_max) = r_range;
        if r_min.is_finite() && r_max.is_finite() && r_min >= 0.0 && r_max > r_min {
            Ok(())
        } else {
            Err(Error::invalid("r_range", format!("need 0 <= r_min < r_max, got ({r_min}, {r_max})")))
        }
    }

    /// Map a unit-panel position to the final plane.
    ///
    /// Under polar coordinates the theta component may be any finite value
    /// (angles wrap); the radial component must lie in `[0,1]`.
    pub fn map(&self, p: Point) -> Result<Point> {
        self.check_finite(p)?;
        match *self {
            Coord::Cartesian { flip } => Ok(if flip { p.transpose() } else { p }),
            Coord::Polar { theta, r_range, start, direction } => {
                Self::check_r_range(r_range)?;
                let (t, rr) = match theta {
                    Axis::X => (p.x, p.y),
                    Axis::Y => (p.y, p.x),
                };
                if !(-RADIUS_TOLERANCE..=1.0 + RADIUS_TOLERANCE).contains(&rr) {
                    return Err(self.domain_error(theta.other(), rr));
                }
                let angle = start + direction * t * TAU;
                let r = r_range.0 + rr.clamp(0.0, 1.0) * (r_range.1 - r_range.0);
                Ok(Point::new(r * angle.cos(), r * angle.sin()))
            }
            Coord::Custom(b) => {
                let out = (b.forward)(p);
                self.check_finite(out)?;
                Ok(out)
            }
        }
    }

    /// Map a final-plane position back to the unit panel.
    ///
    /// Polar angles are reported in `[0,1)`.
    pub fn invert(&self, p: Point) -> Result<Point> {
        self.check_finite(p)?;
        match *self {
            Coord::Cartesian { flip } => Ok(if flip { p.transpose() } else { p }),
            Coord::Polar { theta, r_range, start, direction } => {
                Self::check_r_range(r_range)?;
                let r = p.x.hypot(p.y);
                let rr = (r - r_range.0) / (r_range.1 - r_range.0);
                let t = if r == 0.0 { 0.0 } else { ((p.y.atan2(p.x) - start) * direction / TAU).rem_euclid(1.0) };
                Ok(match theta {
                    Axis::X => Point::new(t, rr),
                    Axis::Y => Point::new(rr, t),
                })
            }
            Coord::Custom(b) => Ok((b.inverse)(p)),
        }
    }

    /// Map every position of a primitive.
    ///
    /// Under polar coordinates, edges are subdivided first so straight
    /// unit-panel edges become arcs.
    pub fn transform(&self, primitive: Primitive) -> Result<Primitive> {
        let points = if matches!(self, Coord::Polar { .. }) && primitive.shape.has_edges() {
            munch(&primitive.points, primitive.shape.is_closed())
        } else {
            primitive.points
        };
        let points = points.into_iter().map(|p| self.map(p)).collect::<Result<Vec<_>>>()?;
        Ok(Primitive { points, ..primitive })
    }
}

/// Subdivide each edge into pieces no longer than [`MUNCH_STEP`].
///
/// Closed rings keep their implicit closing edge.
fn munch(points: &[Point], closed: bool) -> Vec<Point> {
    let Some(&last) = points.last() else {
        return Vec::new();
    };
    let mut out = Vec::with_capacity(points.len());
    let edges = points.len() - usize::from(!closed);
    for i in 0..edges {
        let a = points[i];
        let b = points[(i + 1) % points.len()];
        let pieces = (a.distance(b) / MUNCH_STEP).ceil().max(1.0) as usize;
        out.extend((0..pieces).map(|k| a.lerp(b, k as f64 / pieces as f64)));
    }
    if !closed {
        out.push(last);
    }
    out
}
