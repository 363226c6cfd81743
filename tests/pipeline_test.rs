//! End-to-end pipeline tests.
//!
//! Each test drives a full `Plot::render` (or a YAML configuration) and checks
//! a claim about the primitives that come out.
//!
//! Run: cargo test --test pipeline_test

#![allow(clippy::unwrap_used, clippy::float_cmp)]

use approx::assert_relative_eq;
use proptest::prelude::*;

use trueno_grammar::grammar::combine;
use trueno_grammar::prelude::*;

fn resolve(rendered: &Rendered, channel: Channel, value: &DataValue) -> f64 {
    rendered.scales(0).unwrap().resolve(channel, value).unwrap().unwrap().get()
}

// ============================================================================
// Scenarios
// ============================================================================

#[test]
fn aggregate_sum_by_class() {
    let table = Table::builder()
        .text("class", &["A", "A", "B"])
        .numeric("value", &[1.0, 3.0, 5.0])
        .build()
        .unwrap();
    let rendered = Plot::new()
        .data(table)
        .aes(Aes::new().x("class").y("value"))
        .stat(Stat::sum())
        .render()
        .unwrap();

    let points: Vec<Point> = rendered.panels[0].primitives.iter().map(|p| p.points[0]).collect();
    assert_eq!(points, vec![Point::new(0.0, 0.0), Point::new(1.0, 1.0)]);
    let Some(trueno_grammar::scale::Scale::Continuous(y)) = rendered.scales(0).unwrap().get(Channel::Y) else {
        panic!("y should be continuous");
    };
    assert_eq!(y.domain(), (4.0, 5.0));
}

#[test]
fn continuous_scale_zero_to_ten() {
    let table = Table::from_xy(&[0.0, 5.0, 10.0], &[0.0, 0.0, 1.0]).unwrap();
    let rendered = Plot::new().data(table).aes(Aes::new().x("x").y("y")).render().unwrap();
    assert_relative_eq!(resolve(&rendered, Channel::X, &DataValue::Number(5.0)), 0.5);
    assert_relative_eq!(resolve(&rendered, Channel::X, &DataValue::Number(0.0)), 0.0);
    assert_relative_eq!(resolve(&rendered, Channel::X, &DataValue::Number(10.0)), 1.0);
}

#[test]
fn polar_cardinal_points() {
    let table = Table::from_xy(&[0.0, 0.25], &[1.0, 1.0]).unwrap();
    let rendered = Plot::new()
        .data(table)
        .aes(Aes::new().x("x").y("y"))
        .scale(Channel::X, ScaleConfig::new().limits(0.0, 1.0))
        .scale(Channel::Y, ScaleConfig::new().limits(0.0, 1.0))
        .coord(Coord::polar())
        .render()
        .unwrap();
    let prims = &rendered.panels[0].primitives;
    assert_relative_eq!(prims[0].points[0].x, 1.0, epsilon = 1e-12);
    assert_relative_eq!(prims[0].points[0].y, 0.0, epsilon = 1e-12);
    assert_relative_eq!(prims[1].points[0].x, 0.0, epsilon = 1e-12);
    assert_relative_eq!(prims[1].points[0].y, 1.0, epsilon = 1e-12);
}

#[test]
fn log_of_zero_is_domain_error() {
    let table = Table::from_xy(&[1.0, 2.0], &[0.0, 10.0]).unwrap();
    let err = Plot::new()
        .data(table)
        .aes(Aes::new().x("x").y("y"))
        .scale(Channel::Y, ScaleConfig::new().transform(Transform::log10()))
        .render()
        .unwrap_err();
    assert!(matches!(err, Error::DomainError { ref channel, value, .. } if channel == "y" && value == 0.0));
}

#[test]
fn polar_wraps_closed_discrete_domain() {
    let table = Table::builder()
        .text("dir", &["n", "e", "s", "w"])
        .numeric("v", &[1.0, 1.0, 1.0, 1.0])
        .build()
        .unwrap();
    let rendered = Plot::new()
        .data(table)
        .aes(Aes::new().x("dir").y("v"))
        .coord(Coord::polar())
        .render()
        .unwrap();
    let prims = &rendered.panels[0].primitives;
    let (first, last) = (prims[0].points[0], prims[3].points[0]);
    assert!(first.distance(last) < 1e-12);
    assert_relative_eq!(first.distance(Point::ORIGIN), 0.5, epsilon = 1e-12);
}

#[test]
fn nest_without_inner_rows_is_incompatible() {
    let table = Table::builder()
        .text("a", &["p", "q"])
        .column(Column::new("b", ColumnType::Discrete, vec!["u".into(), DataValue::Null]))
        .numeric("y", &[1.0, 2.0])
        .build()
        .unwrap();
    let err = Plot::new()
        .data(table)
        .aes(Aes::new().x("y").y("y"))
        .terms(vec![Term::var("a").nest(Term::var("b"))])
        .render()
        .unwrap_err();
    assert!(matches!(err, Error::IncompatibleAlgebra { .. }));
}

#[test]
fn unknown_channel_is_rejected() {
    let err = Aes::from_pairs([("x", VarSpec::column("a")), ("hue", VarSpec::column("b"))]).unwrap_err();
    assert!(matches!(err, Error::UnknownChannel(ref c) if c == "hue"));
}

// ============================================================================
// Collision modifiers and geometries
// ============================================================================

#[test]
fn dodge_splits_slot_between_groups() {
    let table = Table::builder()
        .text("x", &["a", "a", "b"])
        .text("s", &["u", "v", "u"])
        .numeric("y", &[1.0, 2.0, 3.0])
        .build()
        .unwrap();
    let rendered = Plot::new()
        .data(table)
        .aes(Aes::new().x("x").y("y").fill("s"))
        .geom(Geom::bar())
        .position(Position::dodge())
        .render()
        .unwrap();
    let spans: Vec<(f64, f64)> =
        rendered.panels[0].primitives.iter().map(|p| (p.points[0].x, p.points[1].x)).collect();
    let expected = [(-0.45, 0.0), (0.0, 0.45), (0.55, 1.45)];
    for ((lo, hi), (want_lo, want_hi)) in spans.into_iter().zip(expected) {
        assert_relative_eq!(lo, want_lo, epsilon = 1e-12);
        assert_relative_eq!(hi, want_hi, epsilon = 1e-12);
    }
}

#[test]
fn regression_line_spans_panel() {
    let x = [0.0, 1.0, 2.0, 3.0, 4.0];
    let y: Vec<f64> = x.iter().map(|v| 2.0 * v + 1.0).collect();
    let rendered = Plot::new()
        .data(Table::from_xy(&x, &y).unwrap())
        .aes(Aes::new().x("x").y("y"))
        .stat(Stat::regression())
        .geom(Geom::line())
        .render()
        .unwrap();
    let line = &rendered.panels[0].primitives[0];
    assert_eq!(line.shape, Shape::Polyline);
    assert_eq!(line.points.len(), 80);
    let (first, last) = (line.points[0], line.points[79]);
    assert_relative_eq!(first.x, 0.0, epsilon = 1e-9);
    assert_relative_eq!(first.y, 0.0, epsilon = 1e-9);
    assert_relative_eq!(last.x, 1.0, epsilon = 1e-9);
    assert_relative_eq!(last.y, 1.0, epsilon = 1e-9);
}

#[test]
fn density_area_under_polar_stays_in_disc() {
    let x: Vec<f64> = (0..40).map(|i| f64::from(i).sin() * 3.0).collect();
    let rendered = Plot::new()
        .data(Table::builder().numeric("x", &x).build().unwrap())
        .aes(Aes::new().x("x"))
        .stat(Stat::density())
        .geom(Geom::area())
        .coord(Coord::polar())
        .render()
        .unwrap();
    let area = &rendered.panels[0].primitives[0];
    assert_eq!(area.shape, Shape::Polygon);
    assert!(area.points.iter().all(|p| p.distance(Point::ORIGIN) <= 1.0 + 1e-9));
}

#[test]
fn facet_panels_follow_first_seen_order() {
    let table = Table::builder()
        .text("g", &["c", "a", "c", "b"])
        .numeric("x", &[1.0, 2.0, 3.0, 4.0])
        .numeric("y", &[1.0, 2.0, 3.0, 4.0])
        .build()
        .unwrap();
    let rendered = Plot::new()
        .data(table)
        .aes(Aes::new().x("x").y("y"))
        .facet(Facet::wrap("g", 2))
        .render()
        .unwrap();
    let labels: Vec<&str> = rendered.panels.iter().map(|p| p.label.as_str()).collect();
    assert_eq!(labels, vec!["c", "a", "b"]);
    assert_eq!(rendered.panels[0].primitives.len(), 2);
    assert_eq!((rendered.panels[2].row, rendered.panels[2].col), (1, 0));
}

// ============================================================================
// Configuration and canvas
// ============================================================================

#[test]
fn yaml_plot_renders_to_ascii() {
    let yaml = r#"
title: Sales
data:
  columns:
    - name: region
      values: [north, south, north, east]
    - name: quarter
      values: [q1, q1, q2, q2]
    - name: sales
      values: [3, 5, 2, 4]
aes:
  x: region
  y: sales
facet:
  terms: [quarter]
  layout: wrap
  ncol: 1
geom:
  kind: bar
"#;
    let rendered = PlotConfig::from_yaml_str(yaml).unwrap().to_plot().unwrap().render().unwrap();
    assert_eq!(rendered.panels.len(), 2);
    assert_eq!((rendered.panels[1].row, rendered.panels[1].col), (1, 0));

    for panel in &rendered.panels {
        let mut canvas = Canvas::new(30, 10).unwrap();
        canvas.draw_all(&panel.primitives);
        let text = canvas.render();
        assert_eq!(text.lines().count(), 10);
        assert!(text.contains('#'));
    }
}

#[test]
fn polar_plane_shows_whole_disc() {
    let table = Table::builder()
        .text("dir", &["n", "e", "s", "w"])
        .numeric("speed", &[4.0, 4.0, 4.0, 4.0])
        .build()
        .unwrap();
    let rendered = Plot::new()
        .data(table)
        .aes(Aes::new().x("dir").y("speed"))
        .geom(Geom::bar())
        .coord(Coord::polar())
        .render()
        .unwrap();
    let plane = rendered.plane.unwrap();

    let mut canvas = Canvas::new(21, 21).unwrap().viewport(plane);
    canvas.draw_all(&rendered.panels[0].primitives);
    let left_half_inked = (0..21).any(|row| (0..10).any(|col| canvas.get(col, row) != Some(' ')));
    assert!(left_half_inked);
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn identity_round_trip(rows in prop::collection::vec((-1e3f64..1e3, -1e3f64..1e3), 1..50)) {
        let (x, y): (Vec<f64>, Vec<f64>) = rows.iter().copied().unzip();
        let rendered = Plot::new()
            .data(Table::from_xy(&x, &y).unwrap())
            .aes(Aes::new().x("x").y("y"))
            .render()
            .unwrap();
        let prims = &rendered.panels[0].primitives;
        prop_assert_eq!(prims.len(), rows.len());
        for (p, (vx, vy)) in prims.iter().zip(&rows) {
            prop_assert_eq!(p.points[0].x, resolve(&rendered, Channel::X, &DataValue::Number(*vx)));
            prop_assert_eq!(p.points[0].y, resolve(&rendered, Channel::Y, &DataValue::Number(*vy)));
        }
    }

    #[test]
    fn stack_conserves_slot_totals(rows in prop::collection::vec((0usize..3, 0usize..3, 0.1f64..10.0), 1..30)) {
        let cats = ["a", "b", "c"];
        let series = ["u", "v", "w"];
        let x: Vec<&str> = rows.iter().map(|r| cats[r.0]).collect();
        let s: Vec<&str> = rows.iter().map(|r| series[r.1]).collect();
        let y: Vec<f64> = rows.iter().map(|r| r.2).collect();
        let table = Table::builder().text("x", &x).text("s", &s).numeric("y", &y).build().unwrap();
        let rendered = Plot::new()
            .data(table)
            .aes(Aes::new().x("x").y("y").fill("s"))
            .geom(Geom::bar())
            .position(Position::stack())
            .render()
            .unwrap();

        for cat in cats {
            let total: f64 = rows.iter().filter(|r| cats[r.0] == cat).map(|r| r.2).sum();
            if total == 0.0 {
                continue;
            }
            let centre = resolve(&rendered, Channel::X, &DataValue::from(cat));
            let top = rendered.panels[0]
                .primitives
                .iter()
                .filter(|p| ((p.points[0].x + p.points[1].x) / 2.0 - centre).abs() < 1e-9)
                .map(|p| p.points[2].y)
                .fold(f64::NEG_INFINITY, f64::max);
            prop_assert!((top - resolve(&rendered, Channel::Y, &DataValue::Number(total))).abs() < 1e-9);
        }
    }

    #[test]
    fn cross_yields_product_of_categories(a in prop::collection::vec(0usize..4, 1..20), b in prop::collection::vec(0usize..4, 1..20)) {
        let n = a.len().min(b.len());
        let names = ["p", "q", "r", "s"];
        let av: Vec<&str> = a[..n].iter().map(|&i| names[i]).collect();
        let bv: Vec<&str> = b[..n].iter().map(|&i| names[i]).collect();
        let table = Table::builder().text("a", &av).text("b", &bv).build().unwrap();
        let distinct = |v: &[&str]| { let mut v = v.to_vec(); v.sort_unstable(); v.dedup(); v.len() };

        let cross = combine(&[Term::var("a").cross(Term::var("b"))], &table).unwrap();
        prop_assert_eq!(cross.candidates().len(), distinct(&av) * distinct(&bv));
        let nest = combine(&[Term::var("a").nest(Term::var("b"))], &table).unwrap();
        prop_assert!(nest.candidates().len() <= cross.candidates().len());
    }
}
