//! Plot builder and pipeline orchestrator.
//!
//! Combines all Grammar of Graphics components into a rendered list of
//! panels. Rendering runs in two passes: every panel's statistic output is
//! observed by the scale builders, the builders are frozen, and only then
//! are rows resolved and drawn. With the `parallel` feature the second pass
//! runs panels on rayon's pool.

use std::collections::HashMap;

use super::aes::{Aes, Channel};
use super::algebra::{GroupKey, Term};
use super::coord::Coord;
use super::facet::{Facet, FacetLayout, Panel};
use super::frame::{Frame, ScaledFrame};
use super::geom::{Geom, Primitive};
use super::position::Position;
use super::stat::Stat;
use crate::error::Result;
use crate::geometry::Bounds;
use crate::scale::{ScaleConfig, ScaleSet, ScaleSetBuilder, ScaleSharing, Transform};
use crate::table::Table;

/// Grammar of Graphics plot builder.
#[derive(Debug, Clone, Default)]
pub struct Plot {
    /// Plot data.
    data: Table,
    /// Aesthetic mappings.
    aes: Aes,
    /// Faceting.
    facet: Facet,
    /// Statistic run per panel.
    stat: Stat,
    /// Geometry.
    geom: Geom,
    /// Collision modifier.
    position: Position,
    /// Coordinate system.
    coord: Coord,
    /// Per-channel scale overrides.
    scales: HashMap<Channel, ScaleConfig>,
    /// Scale sharing across panels.
    sharing: ScaleSharing,
    /// Title.
    title: Option<String>,
}

impl Plot {
    /// Create a new plot builder: identity statistic, points, Cartesian.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the data.
    #[must_use]
    pub fn data(mut self, data: Table) -> Self {
        self.data = data;
        self
    }

    /// Set the aesthetic mapping.
    #[must_use]
    pub fn aes(mut self, aes: Aes) -> Self {
        self.aes = aes;
        self
    }

    /// Facet by algebra terms, one panel per key in a single row.
    #[must_use]
    pub fn terms(mut self, terms: Vec<Term>) -> Self {
        self.facet = Facet::new(terms, FacetLayout::Single);
        self
    }

    /// Set faceting.
    #[must_use]
    pub fn facet(mut self, facet: Facet) -> Self {
        self.facet = facet;
        self
    }

    /// Set the statistic.
    #[must_use]
    pub fn stat(mut self, stat: Stat) -> Self {
        self.stat = stat;
        self
    }

    /// Set the geometry.
    #[must_use]
    pub fn geom(mut self, geom: Geom) -> Self {
        self.geom = geom;
        self
    }

    /// Set the collision modifier.
    #[must_use]
    pub fn position(mut self, position: Position) -> Self {
        self.position = position;
        self
    }

    /// Set coordinate system.
    #[must_use]
    pub fn coord(mut self, coord: Coord) -> Self {
        self.coord = coord;
        self
    }

    /// Override the scale of a channel.
    ///
    /// Extent channels (`xmin`, `ymax`, ...) configure their axis scale.
    #[must_use]
    pub fn scale(mut self, channel: Channel, config: ScaleConfig) -> Self {
        self.scales.insert(channel.scale_channel(), config);
        self
    }

    /// Share scales across panels or train them per panel.
    #[must_use]
    pub fn sharing(mut self, sharing: ScaleSharing) -> Self {
        self.sharing = sharing;
        self
    }

    /// Set the title.
    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// The plot data.
    #[must_use]
    pub fn table(&self) -> &Table {
        &self.data
    }

    /// Run the pipeline.
    ///
    /// Any stage error aborts the whole render; no partial plot is returned.
    pub fn render(&self) -> Result<Rendered> {
        let frame = Frame::from_table(&self.data, &self.aes)?;
        let panels = self.facet.split(&self.data)?;
        let summaries = panels
            .iter()
            .map(|panel| self.stat.apply(&frame.take(&panel.rows)))
            .collect::<Result<Vec<Frame>>>()?;
        tracing::debug!(
            rows = self.data.nrow(),
            panels = panels.len(),
            stat = self.stat.name(),
            geom = self.geom.name(),
            "pipeline prepared"
        );

        let scales = self.train(&summaries)?;
        let scales_for = |i: usize| match self.sharing {
            ScaleSharing::Shared => &scales[0],
            ScaleSharing::Free => &scales[i],
        };

        let work: Vec<(usize, &Panel, &Frame)> =
            panels.iter().zip(&summaries).enumerate().map(|(i, (p, f))| (i, p, f)).collect();

        #[cfg(feature = "parallel")]
        let rendered = {
            use rayon::prelude::*;
            work.par_iter()
                .map(|&(i, panel, summary)| self.render_panel(panel, summary, scales_for(i)))
                .collect::<Result<Vec<_>>>()?
        };
        #[cfg(not(feature = "parallel"))]
        let rendered = work
            .iter()
            .map(|&(i, panel, summary)| self.render_panel(panel, summary, scales_for(i)))
            .collect::<Result<Vec<_>>>()?;

        tracing::debug!(
            panels = rendered.len(),
            primitives = rendered.iter().map(|p| p.primitives.len()).sum::<usize>(),
            "plot rendered"
        );
        Ok(Rendered {
            title: self.title.clone(),
            panels: rendered,
            plane: self.coord.plane(),
            sharing: self.sharing,
            scales,
        })
    }

    /// Pass 1: observe every panel destined for a scale, then freeze.
    fn train(&self, summaries: &[Frame]) -> Result<Vec<ScaleSet>> {
        match self.sharing {
            ScaleSharing::Shared => {
                let mut builder = ScaleSetBuilder::new(&self.scales);
                for summary in summaries {
                    self.observe(&mut builder, summary)?;
                }
                Ok(vec![builder.freeze()?])
            }
            ScaleSharing::Free => summaries
                .iter()
                .map(|summary| {
                    let mut builder = ScaleSetBuilder::new(&self.scales);
                    self.observe(&mut builder, summary)?;
                    builder.freeze()
                })
                .collect(),
        }
    }

    fn observe(&self, builder: &mut ScaleSetBuilder, frame: &Frame) -> Result<()> {
        builder.observe_frame(frame)?;
        for total in self.position.stacked_extent(frame) {
            builder.observe_number(Channel::Y, total)?;
        }
        if self.anchors_at_zero(frame) {
            builder.observe_number(Channel::Y, 0.0)?;
        }
        Ok(())
    }

    /// Stacks, and bars or areas without explicit lower bounds, grow from
    /// y = 0 when the y transform is defined there. Otherwise they grow from
    /// the bottom of the trained domain.
    fn anchors_at_zero(&self, frame: &Frame) -> bool {
        let grows = self.position == Position::Stack
            || (matches!(self.geom, Geom::Bar { .. } | Geom::Area) && !frame.has(Channel::Ymin));
        let config = self.scales.get(&Channel::Y);
        grows
            && frame.kind(Channel::Y).is_some_and(|k| !k.is_categorical())
            && !config.is_some_and(|c| c.discrete)
            && config.map_or(Transform::Identity, |c| c.transform).apply(0.0).is_some()
    }

    /// Pass 2 for one panel: resolve, adjust, draw, transform.
    fn render_panel(&self, panel: &Panel, summary: &Frame, scales: &ScaleSet) -> Result<RenderedPanel> {
        let mut scaled = ScaledFrame::resolve(summary, scales)?;
        self.position.apply(&mut scaled)?;
        let primitives = self
            .geom
            .render(&scaled)?
            .into_iter()
            .map(|primitive| self.coord.transform(primitive))
            .collect::<Result<Vec<_>>>()?;
        tracing::trace!(panel = %panel.label, primitives = primitives.len(), "panel rendered");
        Ok(RenderedPanel {
            key: panel.key.clone(),
            label: panel.label.clone(),
            row: panel.row,
            col: panel.col,
            primitives,
        })
    }
}

/// One rendered facet.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedPanel {
    /// Facet key.
    pub key: GroupKey,
    /// Display label of the key.
    pub label: String,
    /// Layout row.
    pub row: usize,
    /// Layout column.
    pub col: usize,
    /// Primitives in final-plane coordinates, in drawing order.
    pub primitives: Vec<Primitive>,
}

/// Output of [`Plot::render`].
#[derive(Debug, Clone, PartialEq)]
pub struct Rendered {
    /// Plot title.
    pub title: Option<String>,
    /// Panels in facet order.
    pub panels: Vec<RenderedPanel>,
    /// Final-plane rectangle of the coordinate system, when known.
    pub plane: Option<Bounds>,
    sharing: ScaleSharing,
    scales: Vec<ScaleSet>,
}

impl Rendered {
    /// Frozen scales used by the panel at `index`.
    #[must_use]
    pub fn scales(&self, index: usize) -> Option<&ScaleSet> {
        match self.sharing {
            ScaleSharing::Shared => self.scales.first(),
            ScaleSharing::Free => self.scales.get(index),
        }
    }

    /// Total primitive count over all panels.
    #[must_use]
    pub fn primitive_count(&self) -> usize {
        self.panels.iter().map(|p| p.primitives.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::error::Error;
    use crate::geometry::Point;
    use crate::grammar::geom::Shape;
    use crate::scale::Scale;

    fn points(rendered: &Rendered) -> Vec<Point> {
        rendered.panels.iter().flat_map(|p| p.primitives.iter().map(|q| q.points[0])).collect()
    }

    #[test]
    fn test_identity_round_trip() {
        let table = Table::from_xy(&[0.0, 5.0, 10.0], &[2.0, 4.0, 6.0]).unwrap();
        let rendered = Plot::new().data(table).aes(Aes::new().x("x").y("y")).render().unwrap();
        assert_eq!(rendered.panels.len(), 1);
        assert_eq!(rendered.primitive_count(), 3);
        let pts = points(&rendered);
        assert_relative_eq!(pts[1].x, 0.5);
        assert_relative_eq!(pts[1].y, 0.5);
        assert_relative_eq!(pts[2].x, 1.0);
        assert!(rendered.panels[0].primitives.iter().all(|p| p.shape == Shape::Point));
    }

    #[test]
    fn test_shared_scales_span_panels() {
        let table = Table::builder()
            .text("g", &["a", "a", "b", "b"])
            .numeric("x", &[0.0, 1.0, 9.0, 10.0])
            .numeric("y", &[0.0, 1.0, 2.0, 3.0])
            .build()
            .unwrap();
        let rendered = Plot::new()
            .data(table)
            .aes(Aes::new().x("x").y("y"))
            .facet(Facet::wrap("g", 2))
            .render()
            .unwrap();
        assert_eq!(rendered.panels.len(), 2);
        let xs: Vec<f64> = points(&rendered).iter().map(|p| p.x).collect();
        assert_relative_eq!(xs[1], 0.1);
        assert_relative_eq!(xs[2], 0.9);
        assert!(std::ptr::eq(rendered.scales(0).unwrap(), rendered.scales(1).unwrap()));
    }

    #[test]
    fn test_free_scales_per_panel() {
        let table = Table::builder()
            .text("g", &["a", "a", "b", "b"])
            .numeric("x", &[0.0, 1.0, 9.0, 10.0])
            .numeric("y", &[0.0, 1.0, 2.0, 3.0])
            .build()
            .unwrap();
        let rendered = Plot::new()
            .data(table)
            .aes(Aes::new().x("x").y("y"))
            .terms(vec![Term::from("g")])
            .sharing(ScaleSharing::Free)
            .render()
            .unwrap();
        let xs: Vec<f64> = points(&rendered).iter().map(|p| p.x).collect();
        assert_eq!(xs, vec![0.0, 1.0, 0.0, 1.0]);
        assert_eq!((rendered.panels[1].row, rendered.panels[1].col), (0, 1));
    }

    #[test]
    fn test_bars_anchor_at_zero() {
        let table = Table::builder()
            .text("c", &["p", "q"])
            .numeric("v", &[2.0, 4.0])
            .build()
            .unwrap();
        let rendered =
            Plot::new().data(table).aes(Aes::new().x("c").y("v")).geom(Geom::bar()).render().unwrap();
        let Some(Scale::Continuous(y)) = rendered.scales(0).unwrap().get(Channel::Y) else {
            panic!("expected continuous y scale");
        };
        assert_eq!(y.domain(), (0.0, 4.0));
        let bar = &rendered.panels[0].primitives[0];
        assert_relative_eq!(bar.points[0].y, 0.0);
        assert_relative_eq!(bar.points[2].y, 0.5);
    }

    #[test]
    fn test_bars_on_log_scale_grow_from_domain_floor() {
        let table = Table::builder()
            .text("c", &["p", "q"])
            .numeric("v", &[10.0, 100.0])
            .build()
            .unwrap();
        let rendered = Plot::new()
            .data(table)
            .aes(Aes::new().x("c").y("v"))
            .geom(Geom::bar())
            .scale(Channel::Y, ScaleConfig::new().transform(Transform::log10()))
            .render()
            .unwrap();
        let Some(Scale::Continuous(y)) = rendered.scales(0).unwrap().get(Channel::Y) else {
            panic!("expected continuous y scale");
        };
        assert_relative_eq!(y.domain().0, 1.0);
        assert_relative_eq!(y.domain().1, 2.0);
        let bars = &rendered.panels[0].primitives;
        assert_eq!(bars.len(), 2);
        assert_relative_eq!(bars[0].points[0].y, 0.0);
        assert_relative_eq!(bars[1].points[2].y, 1.0);
    }

    #[test]
    fn test_stack_on_log_scale() {
        let table = Table::builder()
            .text("c", &["p", "q"])
            .numeric("v", &[10.0, 100.0])
            .build()
            .unwrap();
        let rendered = Plot::new()
            .data(table)
            .aes(Aes::new().x("c").y("v"))
            .position(Position::stack())
            .scale(Channel::Y, ScaleConfig::new().transform(Transform::log10()))
            .render()
            .unwrap();
        let ys: Vec<f64> = points(&rendered).iter().map(|p| p.y).collect();
        assert_eq!(ys.len(), 2);
        assert_relative_eq!(ys[0], 0.0);
        assert_relative_eq!(ys[1], 1.0);
    }

    #[test]
    fn test_numeric_values_on_explicit_levels() {
        let table = Table::from_xy(&[1.0, 2.0, 3.0], &[5.0, 6.0, 7.0]).unwrap();
        let rendered = Plot::new()
            .data(table)
            .aes(Aes::new().x("x").y("y"))
            .scale(Channel::X, ScaleConfig::new().discrete().levels(&["3", "2", "1"]))
            .render()
            .unwrap();
        assert_eq!(rendered.primitive_count(), 3);
        let xs: Vec<f64> = points(&rendered).iter().map(|p| p.x).collect();
        assert_relative_eq!(xs[0], 1.0);
        assert_relative_eq!(xs[1], 0.5);
        assert_relative_eq!(xs[2], 0.0);
    }

    #[test]
    fn test_jitter_stays_inside_polar_disc() {
        let xs: Vec<f64> = (0..20).map(f64::from).collect();
        let table = Table::from_xy(&xs, &xs).unwrap();
        let rendered = Plot::new()
            .data(table)
            .aes(Aes::new().x("x").y("y"))
            .position(Position::jitter(0.0, 0.05))
            .coord(Coord::polar())
            .render()
            .unwrap();
        assert_eq!(rendered.primitive_count(), 20);
        assert!(points(&rendered).iter().all(|p| p.distance(Point::ORIGIN) <= 1.0 + 1e-9));
    }

    #[test]
    fn test_log_zero_aborts_render() {
        let table = Table::from_xy(&[0.0, 1.0], &[1.0, 2.0]).unwrap();
        let err = Plot::new()
            .data(table)
            .aes(Aes::new().x("x").y("y"))
            .scale(Channel::X, ScaleConfig::new().transform(Transform::log10()))
            .render();
        assert!(matches!(err, Err(Error::DomainError { .. })));
    }

    #[test]
    fn test_line_needs_two_rows() {
        let table = Table::from_xy(&[1.0], &[1.0]).unwrap();
        let err = Plot::new().data(table).aes(Aes::new().x("x").y("y")).geom(Geom::line()).render();
        assert!(matches!(err, Err(Error::EmptyPanel { stage: "line", .. })));
    }

    #[test]
    fn test_aggregate_then_stack() {
        let table = Table::builder()
            .text("x", &["a", "a", "a", "b"])
            .text("s", &["u", "v", "v", "u"])
            .numeric("y", &[1.0, 1.0, 2.0, 4.0])
            .build()
            .unwrap();
        let rendered = Plot::new()
            .data(table)
            .aes(Aes::new().x("x").y("y").fill("s"))
            .stat(Stat::sum())
            .geom(Geom::bar())
            .position(Position::stack())
            .render()
            .unwrap();
        // (a,u)=1, (a,v)=3, (b,u)=4: the a stack reaches 4 as well.
        let bars = &rendered.panels[0].primitives;
        assert_eq!(bars.len(), 3);
        let tops: Vec<f64> = bars.iter().map(|b| b.points[2].y).collect();
        assert_relative_eq!(tops[0], 0.25);
        assert_relative_eq!(tops[1], 1.0);
        assert_relative_eq!(tops[2], 1.0);
    }

    #[test]
    fn test_polar_output_in_unit_disc() {
        let table = Table::builder()
            .text("c", &["p", "q", "r"])
            .numeric("v", &[1.0, 2.0, 3.0])
            .build()
            .unwrap();
        let rendered = Plot::new()
            .data(table)
            .aes(Aes::new().x("c").y("v"))
            .geom(Geom::bar())
            .coord(Coord::polar())
            .title("wind rose")
            .render()
            .unwrap();
        assert_eq!(rendered.title.as_deref(), Some("wind rose"));
        assert_eq!(rendered.plane.unwrap().min, Point::new(-1.0, -1.0));
        for primitive in &rendered.panels[0].primitives {
            assert!(primitive.points.len() > 4);
            assert!(primitive.points.iter().all(|p| p.distance(Point::ORIGIN) <= 1.0 + 1e-9));
        }
    }

    #[test]
    fn test_empty_table_renders_nothing() {
        let table = Table::from_xy(&[], &[]).unwrap();
        let rendered = Plot::new().data(table).aes(Aes::new().x("x").y("y")).render().unwrap();
        assert!(rendered.panels.is_empty());
        assert_eq!(rendered.primitive_count(), 0);
    }
}
