//! Collision modifiers for overlapping marks.
//!
//! Modifiers adjust normalized positions of a [`ScaledFrame`] before the
//! geometry builds primitives, so they never see raw values and always run
//! ahead of the coordinate transform.

use std::collections::HashMap;

use super::aes::Channel;
use super::algebra::KeyPart;
use super::frame::{Frame, ScaledFrame};
use crate::error::{Error, Result};

/// Collision modifier.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Position {
    /// Leave positions as they are.
    #[default]
    Identity,
    /// Stack y extents per x slot in group order.
    Stack,
    /// Place groups side by side within each x slot.
    Dodge {
        /// Total width of the dodged marks as a fraction of the slot.
        width: f64,
    },
    /// Add bounded deterministic noise.
    Jitter {
        /// Largest x offset in normalized units.
        width: f64,
        /// Largest y offset in normalized units.
        height: f64,
        /// Generator seed.
        seed: u64,
    },
}

impl Position {
    /// No adjustment.
    #[must_use]
    pub fn identity() -> Self {
        Position::Identity
    }

    /// Stack marks.
    #[must_use]
    pub fn stack() -> Self {
        Position::Stack
    }

    /// Dodge marks across 90% of the slot.
    #[must_use]
    pub fn dodge() -> Self {
        Position::Dodge { width: 0.9 }
    }

    /// Jitter with seed 42.
    #[must_use]
    pub fn jitter(width: f64, height: f64) -> Self {
        Position::Jitter { width, height, seed: 42 }
    }

    /// Modifier name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Position::Identity => "identity",
            Position::Stack => "stack",
            Position::Dodge { .. } => "dodge",
            Position::Jitter { .. } => "jitter",
        }
    }

    /// Raw values the y scale must cover once marks are stacked.
    ///
    /// Returns the cumulative totals for every row; empty for modifiers that
    /// do not move marks along y. The zero baseline is left to the caller
    /// since not every y transform is defined there.
    #[must_use]
    pub fn stacked_extent(&self, frame: &Frame) -> Vec<f64> {
        if *self != Position::Stack {
            return Vec::new();
        }
        let mut totals: HashMap<KeyPart, (f64, f64)> = HashMap::new();
        let mut out = Vec::new();
        for rows in frame.group_rows(&frame.series_channels()) {
            for row in rows {
                let (Some(x), Some(y)) = (frame.value(Channel::X, row), frame.number(Channel::Y, row)) else {
                    continue;
                };
                let (pos, neg) = totals.entry(KeyPart::from(x)).or_insert((0.0, 0.0));
                let top = if y >= 0.0 { pos } else { neg };
                *top += y;
                out.push(*top);
            }
        }
        out
    }

    /// Adjust positions in place.
    pub fn apply(&self, frame: &mut ScaledFrame) -> Result<()> {
        match *self {
            Position::Identity => Ok(()),
            Position::Stack => {
                stack(frame);
                Ok(())
            }
            Position::Dodge { width } => {
                if !(width.is_finite() && width > 0.0) {
                    return Err(Error::invalid("width", format!("dodge width must be positive, got {width}")));
                }
                dodge(frame, width);
                Ok(())
            }
            Position::Jitter { width, height, seed } => {
                if !(width >= 0.0 && height >= 0.0 && width.is_finite() && height.is_finite()) {
                    return Err(Error::invalid("jitter", format!("offsets must be non-negative, got ({width}, {height})")));
                }
                jitter(frame, width, height, seed);
                Ok(())
            }
        }
    }
}

/// Rows in group order, then row order.
fn rows_by_group(frame: &ScaledFrame) -> Vec<usize> {
    frame.group_rows().into_iter().flatten().collect()
}

fn stack(frame: &mut ScaledFrame) {
    let base = frame.baseline();
    let mut tops: HashMap<u64, (f64, f64)> = HashMap::new();
    for row in rows_by_group(frame) {
        let (Some(x), Some(y)) = (frame.get(Channel::X, row), frame.get(Channel::Y, row)) else {
            continue;
        };
        let height = y - base;
        let (pos, neg) = tops.entry(x.to_bits()).or_insert((base, base));
        let (lo, hi) = if height >= 0.0 {
            let lo = *pos;
            *pos += height;
            (lo, *pos)
        } else {
            let hi = *neg;
            *neg += height;
            (*neg, hi)
        };
        frame.set(Channel::Ymin, row, Some(lo));
        frame.set(Channel::Ymax, row, Some(hi));
        frame.set(Channel::Y, row, Some(if height >= 0.0 { hi } else { lo }));
    }
}

fn dodge(frame: &mut ScaledFrame, width: f64) {
    let total = width * frame.slot_width();
    let rows = rows_by_group(frame);
    let mut slots: HashMap<u64, Vec<usize>> = HashMap::new();
    for &row in &rows {
        if let Some(x) = frame.get(Channel::X, row) {
            let groups = slots.entry(x.to_bits()).or_default();
            let g = frame.group(row);
            if !groups.contains(&g) {
                groups.push(g);
            }
        }
    }
    for row in rows {
        let Some(x) = frame.get(Channel::X, row) else {
            continue;
        };
        let groups = &slots[&x.to_bits()];
        let k = groups.iter().position(|&g| g == frame.group(row)).unwrap_or(0);
        let sub = total / groups.len() as f64;
        let left = x - total / 2.0 + k as f64 * sub;
        frame.set(Channel::Xmin, row, Some(left));
        frame.set(Channel::Xmax, row, Some(left + sub));
        frame.set(Channel::X, row, Some(left + sub / 2.0));
    }
}

/// Offsets never push a value out of the unit interval it started in.
fn nudge(v: f64, offset: f64) -> f64 {
    if (0.0..=1.0).contains(&v) {
        (v + offset).clamp(0.0, 1.0)
    } else {
        v + offset
    }
}

fn jitter(frame: &mut ScaledFrame, width: f64, height: f64, seed: u64) {
    let mut rng = Xorshift64::new(seed);
    for row in 0..frame.len() {
        let dx = (rng.next_f64() * 2.0 - 1.0) * width;
        let dy = (rng.next_f64() * 2.0 - 1.0) * height;
        if let Some(x) = frame.get(Channel::X, row) {
            frame.set(Channel::X, row, Some(nudge(x, dx)));
        }
        if let Some(y) = frame.get(Channel::Y, row) {
            frame.set(Channel::Y, row, Some(nudge(y, dy)));
        }
    }
}

/// Deterministic xorshift64 generator.
struct Xorshift64 {
    state: u64,
}

impl Xorshift64 {
    fn new(seed: u64) -> Self {
        Self { state: if seed == 0 { 0x9E37_79B9_7F4A_7C15 } else { seed } }
    }

    fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.state = x;
        x
    }

    /// Uniform in `[0, 1]`.
    fn next_f64(&mut self) -> f64 {
        (self.next_u64() as f64) / (u64::MAX as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::aes::Aes;
    use crate::scale::ScaleSetBuilder;
    use crate::table::Table;
    use approx::assert_relative_eq;

    fn table() -> Table {
        Table::builder()
            .text("x", &["a", "a", "b", "b"])
            .numeric("y", &[1.0, 3.0, 2.0, 2.0])
            .text("k", &["p", "q", "p", "q"])
            .build()
            .unwrap()
    }

    fn scaled(table: &Table, aes: &Aes, position: Position) -> ScaledFrame {
        let frame = Frame::from_table(table, aes).unwrap();
        let mut scales = ScaleSetBuilder::new(&HashMap::new());
        scales.observe_frame(&frame).unwrap();
        for v in position.stacked_extent(&frame) {
            scales.observe_number(Channel::Y, v).unwrap();
        }
        if position == Position::Stack {
            scales.observe_number(Channel::Y, 0.0).unwrap();
        }
        let mut out = ScaledFrame::resolve(&frame, &scales.freeze().unwrap()).unwrap();
        position.apply(&mut out).unwrap();
        out
    }

    #[test]
    fn test_stacked_extent_covers_totals() {
        let frame = Frame::from_table(&table(), &Aes::new().x("x").y("y").fill("k")).unwrap();
        let extent = Position::stack().stacked_extent(&frame);
        assert_eq!(extent.iter().cloned().fold(f64::MIN, f64::max), 4.0);
        assert_eq!(extent.len(), 4);
        assert!(!extent.contains(&0.0));
        assert!(Position::identity().stacked_extent(&frame).is_empty());
    }

    #[test]
    fn test_stack_in_group_order() {
        let s = scaled(&table(), &Aes::new().x("x").y("y").fill("k"), Position::stack());
        // y scale spans [0, 4]: stacked totals per slot are 4.
        assert_relative_eq!(s.get(Channel::Ymin, 0).unwrap(), 0.0);
        assert_relative_eq!(s.get(Channel::Ymax, 0).unwrap(), 0.25);
        assert_relative_eq!(s.get(Channel::Ymin, 1).unwrap(), 0.25);
        assert_relative_eq!(s.get(Channel::Ymax, 1).unwrap(), 1.0);
        assert_relative_eq!(s.get(Channel::Y, 3).unwrap(), 1.0);
    }

    #[test]
    fn test_stack_negative_values_go_down() {
        let table = Table::builder()
            .numeric("x", &[1.0, 1.0])
            .numeric("y", &[2.0, -2.0])
            .text("k", &["p", "q"])
            .build()
            .unwrap();
        let s = scaled(&table, &Aes::new().x("x").y("y").fill("k"), Position::stack());
        let base = s.baseline();
        assert!(s.get(Channel::Ymin, 0).unwrap() >= base - 1e-12);
        assert_relative_eq!(s.get(Channel::Ymax, 1).unwrap(), base);
        assert!(s.get(Channel::Ymin, 1).unwrap() < base);
    }

    #[test]
    fn test_dodge_splits_slot() {
        let s = scaled(&table(), &Aes::new().x("x").y("y").fill("k"), Position::Dodge { width: 1.0 });
        // Two levels: slot width 1, two groups per slot.
        assert_relative_eq!(s.get(Channel::Xmin, 0).unwrap(), -0.5);
        assert_relative_eq!(s.get(Channel::Xmax, 0).unwrap(), 0.0);
        assert_relative_eq!(s.get(Channel::X, 1).unwrap(), 0.25);
        assert_relative_eq!(s.get(Channel::X, 3).unwrap(), 1.25);
    }

    #[test]
    fn test_jitter_bounded_and_deterministic() {
        let t = Table::from_xy(&[0.0, 1.0, 2.0, 3.0], &[0.0, 1.0, 2.0, 3.0]).unwrap();
        let aes = Aes::new().x("x").y("y");
        let plain = scaled(&t, &aes, Position::Identity);
        let a = scaled(&t, &aes, Position::jitter(0.05, 0.1));
        let b = scaled(&t, &aes, Position::jitter(0.05, 0.1));
        assert_eq!(a, b);
        for row in 0..4 {
            let dx = a.get(Channel::X, row).unwrap() - plain.get(Channel::X, row).unwrap();
            let dy = a.get(Channel::Y, row).unwrap() - plain.get(Channel::Y, row).unwrap();
            assert!(dx.abs() <= 0.05 + 1e-12);
            assert!(dy.abs() <= 0.1 + 1e-12);
        }
    }

    #[test]
    fn test_jitter_keeps_unit_interval() {
        let t = Table::from_xy(&[0.0, 1.0, 2.0, 3.0, 4.0], &[0.0, 1.0, 2.0, 3.0, 4.0]).unwrap();
        let s = scaled(&t, &Aes::new().x("x").y("y"), Position::jitter(0.5, 0.5));
        for row in 0..5 {
            let (x, y) = (s.get(Channel::X, row).unwrap(), s.get(Channel::Y, row).unwrap());
            assert!((0.0..=1.0).contains(&x), "x = {x}");
            assert!((0.0..=1.0).contains(&y), "y = {y}");
        }
        assert_relative_eq!(nudge(1.0, 0.2), 1.0);
        assert_relative_eq!(nudge(-0.5, 0.2), -0.3);
    }

    #[test]
    fn test_invalid_parameters() {
        let mut s = ScaledFrame::default();
        assert!(Position::Dodge { width: 0.0 }.apply(&mut s).is_err());
        assert!(Position::jitter(-1.0, 0.0).apply(&mut s).is_err());
    }

    #[test]
    fn test_xorshift_zero_seed_not_stuck() {
        let mut rng = Xorshift64::new(0);
        assert_ne!(rng.next_u64(), rng.next_u64());
    }
}
