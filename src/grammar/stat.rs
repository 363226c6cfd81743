//! Statistical transformations for Grammar of Graphics.
//!
//! Statistics run on raw (pre-scale) channel values. Each one takes the
//! [`Frame`] of a panel and returns a new frame of summary rows; the output
//! keeps the grouping channels of the input so later stages can still split
//! series by colour, fill, shape or group.

use std::str::FromStr;

use super::aes::{Axis, Channel};
use super::frame::Frame;
use crate::error::{Error, Result};
use crate::table::{Column, ColumnType, DataValue};

/// Most buckets a binning statistic will allocate per group.
pub const MAX_BINS: usize = 1_000_000;

/// How a binning statistic partitions its domain.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Bins {
    /// Fixed bucket width.
    Width(f64),
    /// Fixed number of equal-width buckets.
    Count(usize),
}

/// Reduction applied by [`Stat::Aggregate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AggFn {
    /// Sum of values.
    Sum,
    /// Arithmetic mean.
    Mean,
    /// Median (mean of the two middle values for even counts).
    Median,
    /// Smallest value.
    Min,
    /// Largest value.
    Max,
    /// Number of non-null values.
    Count,
}

impl AggFn {
    /// Function name.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            AggFn::Sum => "sum",
            AggFn::Mean => "mean",
            AggFn::Median => "median",
            AggFn::Min => "min",
            AggFn::Max => "max",
            AggFn::Count => "count",
        }
    }

    fn reduce(self, values: &[f64]) -> Option<f64> {
        match self {
            AggFn::Sum => Some(values.iter().sum()),
            AggFn::Count => Some(values.len() as f64),
            _ if values.is_empty() => None,
            AggFn::Mean => Some(values.iter().sum::<f64>() / values.len() as f64),
            AggFn::Median => Some(quantile(values, 0.5)),
            AggFn::Min => values.iter().copied().reduce(f64::min),
            AggFn::Max => values.iter().copied().reduce(f64::max),
        }
    }
}

impl FromStr for AggFn {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        [AggFn::Sum, AggFn::Mean, AggFn::Median, AggFn::Min, AggFn::Max, AggFn::Count]
            .into_iter()
            .find(|f| f.name() == s)
            .ok_or_else(|| Error::invalid("func", format!("unknown aggregate '{s}'")))
    }
}

/// Statistical transformation type.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Stat {
    /// No transformation (identity).
    #[default]
    Identity,
    /// Bin a continuous position channel and count rows per bucket.
    Bin {
        /// Binned channel (`x` or `y`).
        channel: Channel,
        /// Bucket layout.
        bins: Bins,
    },
    /// Count rows per distinct x value.
    Count,
    /// Reduce a target channel over groups of the remaining channels.
    Aggregate {
        /// Reduced channel.
        target: Channel,
        /// Reduction.
        func: AggFn,
    },
    /// Gaussian kernel density estimate of `x`.
    Density {
        /// Kernel bandwidth; Silverman's rule when `None`.
        bandwidth: Option<f64>,
        /// Number of evaluation points.
        points: usize,
    },
    /// Ordinary least squares fit of `y` on `x`.
    Regression {
        /// Number of points along the fitted line.
        points: usize,
    },
}

impl Stat {
    /// Create an identity stat (no transformation).
    #[must_use]
    pub fn identity() -> Self {
        Stat::Identity
    }

    /// Create a count stat.
    #[must_use]
    pub fn count() -> Self {
        Stat::Count
    }

    /// Bin `x` into `bins` equal-width buckets.
    #[must_use]
    pub fn bin(bins: usize) -> Self {
        Stat::Bin { channel: Channel::X, bins: Bins::Count(bins) }
    }

    /// Bin `x` into buckets of fixed width.
    #[must_use]
    pub fn bin_width(width: f64) -> Self {
        Stat::Bin { channel: Channel::X, bins: Bins::Width(width) }
    }

    /// Reduce `target` with `func`.
    #[must_use]
    pub fn aggregate(target: Channel, func: AggFn) -> Self {
        Stat::Aggregate { target, func }
    }

    /// Sum `y` per group.
    #[must_use]
    pub fn sum() -> Self {
        Self::aggregate(Channel::Y, AggFn::Sum)
    }

    /// Mean of `y` per group.
    #[must_use]
    pub fn mean() -> Self {
        Self::aggregate(Channel::Y, AggFn::Mean)
    }

    /// Density estimate with the default bandwidth over 512 points.
    #[must_use]
    pub fn density() -> Self {
        Stat::Density { bandwidth: None, points: 512 }
    }

    /// Linear fit evaluated at 80 points.
    #[must_use]
    pub fn regression() -> Self {
        Stat::Regression { points: 80 }
    }

    /// Statistic name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Stat::Identity => "identity",
            Stat::Bin { .. } => "bin",
            Stat::Count => "count",
            Stat::Aggregate { .. } => "aggregate",
            Stat::Density { .. } => "density",
            Stat::Regression { .. } => "regression",
        }
    }

    /// Summarize one panel's rows.
    pub fn apply(&self, frame: &Frame) -> Result<Frame> {
        let out = match *self {
            Stat::Identity => Ok(frame.clone()),
            Stat::Bin { channel, bins } => bin(frame, channel, bins),
            Stat::Count => count(frame),
            Stat::Aggregate { target, func } => aggregate(frame, target, func),
            Stat::Density { bandwidth, points } => density(frame, bandwidth, points),
            Stat::Regression { points } => regression(frame, points),
        }?;
        tracing::trace!(stat = self.name(), rows_in = frame.len(), rows_out = out.len(), "stat applied");
        Ok(out)
    }
}

/// Row-by-row builder for a statistic's output frame.
///
/// Carried channels copy the value of a template row; computed channels are
/// continuous and keep the source column's name when it is bound.
struct Summary<'a> {
    source: &'a Frame,
    carried: Vec<(Channel, Vec<DataValue>)>,
    computed: Vec<(Channel, String, Vec<DataValue>)>,
    len: usize,
}

impl<'a> Summary<'a> {
    fn new(source: &'a Frame, carried: &[Channel], computed: &[(Channel, &str)]) -> Self {
        Self {
            source,
            carried: carried.iter().map(|&c| (c, Vec::new())).collect(),
            computed: computed
                .iter()
                .map(|&(c, default)| {
                    let name = source.get(c).map_or(default, Column::name).to_string();
                    (c, name, Vec::new())
                })
                .collect(),
            len: 0,
        }
    }

    fn push(&mut self, template: usize, values: &[f64]) {
        for (channel, column) in &mut self.carried {
            column.push(self.source.value(*channel, template).cloned().unwrap_or(DataValue::Null));
        }
        for ((_, _, column), &v) in self.computed.iter_mut().zip(values) {
            column.push(DataValue::Number(v));
        }
        self.len += 1;
    }

    fn finish(self) -> Result<Frame> {
        let mut frame = Frame::new(self.len);
        for (channel, values) in self.carried {
            if let Some(col) = self.source.get(channel) {
                frame.insert(channel, col.with_values(values))?;
            }
        }
        for (channel, name, values) in self.computed {
            frame.insert(channel, Column::new(name, ColumnType::Continuous, values))?;
        }
        Ok(frame)
    }
}

/// Channels that split a statistic's input into independent series.
fn grouping_channels(frame: &Frame, exclude: &[Channel]) -> Vec<Channel> {
    frame
        .iter()
        .filter(|(c, col)| {
            !exclude.contains(c)
                && *c != Channel::Weight
                && (col.kind().is_categorical() || *c == Channel::Group)
        })
        .map(|(c, _)| c)
        .collect()
}

fn require_continuous(frame: &Frame, channel: Channel, stat: &str) -> Result<()> {
    match frame.kind(channel) {
        None => Err(Error::invalid("channel", format!("statistic '{stat}' needs '{channel}' mapped"))),
        Some(ColumnType::Continuous) => Ok(()),
        Some(kind) => Err(Error::TypeMismatch {
            target: channel.name().to_string(),
            expected: ColumnType::Continuous.name(),
            found: kind.name(),
        }),
    }
}

/// Row weight: 1 without a weight channel, 0 for a null weight.
fn weight(frame: &Frame, row: usize) -> f64 {
    if frame.has(Channel::Weight) {
        frame.number(Channel::Weight, row).unwrap_or(0.0)
    } else {
        1.0
    }
}

fn bin(frame: &Frame, channel: Channel, bins: Bins) -> Result<Frame> {
    let axis = channel
        .axis()
        .filter(|_| channel == channel.scale_channel())
        .ok_or_else(|| Error::invalid("channel", format!("cannot bin '{channel}', expected x or y")))?;
    require_continuous(frame, channel, "bin")?;
    match bins {
        Bins::Count(0) => return Err(Error::invalid("bins", "bin count must be positive")),
        Bins::Width(w) if !(w.is_finite() && w > 0.0) => {
            return Err(Error::invalid("bins", format!("bin width must be positive, got {w}")));
        }
        _ => {}
    }

    let (lo_edge, hi_edge, counted) = match axis {
        Axis::X => (Channel::Xmin, Channel::Xmax, Channel::Y),
        Axis::Y => (Channel::Ymin, Channel::Ymax, Channel::X),
    };
    let computed = [(channel, channel.name()), (lo_edge, lo_edge.name()), (hi_edge, hi_edge.name()), (counted, "count")];
    let carried = grouping_channels(frame, &[channel, lo_edge, hi_edge, counted]);
    let mut out = Summary::new(frame, &carried, &computed);

    let values: Vec<f64> =
        (0..frame.len()).filter_map(|row| frame.number(channel, row)).filter(|v| v.is_finite()).collect();
    if values.is_empty() {
        return out.finish();
    }
    let (mut lo, mut hi) = min_max(&values);
    if hi == lo {
        lo -= 0.5;
        hi += 0.5;
    }

    // Buckets are [lo + i*w, lo + (i+1)*w); the last one also takes `hi`.
    let (n, width) = match bins {
        Bins::Count(n) => (n as f64, (hi - lo) / n as f64),
        Bins::Width(w) => (((hi - lo) / w).ceil().max(1.0), w),
    };
    if n > MAX_BINS as f64 {
        return Err(Error::invalid("bins", format!("{n} buckets over [{lo}, {hi}] exceeds the limit of {MAX_BINS}")));
    }
    let n = n as usize;

    for group in frame.group_rows(&carried) {
        let mut counts = vec![0.0; n];
        let mut seen = vec![false; n];
        for &row in &group {
            let Some(v) = frame.number(channel, row).filter(|v| v.is_finite()) else {
                continue;
            };
            let slot = (((v - lo) / width).floor() as usize).min(n - 1);
            counts[slot] += weight(frame, row);
            seen[slot] = true;
        }
        for slot in (0..n).filter(|&i| seen[i]) {
            let left = lo + slot as f64 * width;
            let right = left + width;
            out.push(group[0], &[(left + right) / 2.0, left, right, counts[slot]]);
        }
    }
    out.finish()
}

fn count(frame: &Frame) -> Result<Frame> {
    let mut by: Vec<Channel> = Vec::new();
    if frame.has(Channel::X) {
        by.push(Channel::X);
    }
    by.extend(grouping_channels(frame, &[Channel::X, Channel::Y]));
    let mut out = Summary::new(frame, &by, &[(Channel::Y, "count")]);
    for group in frame.group_rows(&by) {
        let total: f64 = group.iter().map(|&row| weight(frame, row)).sum();
        out.push(group[0], &[total]);
    }
    out.finish()
}

fn aggregate(frame: &Frame, target: Channel, func: AggFn) -> Result<Frame> {
    if func != AggFn::Count {
        require_continuous(frame, target, "aggregate")?;
    } else if !frame.has(target) {
        return Err(Error::invalid("target", format!("statistic 'aggregate' needs '{target}' mapped")));
    }
    let by: Vec<Channel> =
        frame.iter().map(|(c, _)| c).filter(|&c| c != target && c != Channel::Weight).collect();
    let mut out = Summary::new(frame, &by, &[(target, target.name())]);
    for group in frame.group_rows(&by) {
        let values: Vec<f64> = match func {
            AggFn::Count => group
                .iter()
                .filter(|&&row| frame.value(target, row).is_some_and(|v| !v.is_null()))
                .map(|_| 1.0)
                .collect(),
            _ => group.iter().filter_map(|&row| frame.number(target, row)).collect(),
        };
        let reduced = func.reduce(&values).unwrap_or(f64::NAN);
        out.push(group[0], &[reduced]);
    }
    let mut frame = out.finish()?;
    // Groups whose target was entirely null reduce to null, not NaN.
    if let Some(col) = frame.get(target) {
        let cleaned = col
            .values()
            .iter()
            .map(|v| match v.as_f64() {
                Some(n) if n.is_nan() => DataValue::Null,
                _ => v.clone(),
            })
            .collect();
        let cleaned = col.with_values(cleaned);
        frame.insert(target, cleaned)?;
    }
    Ok(frame)
}

fn density(frame: &Frame, bandwidth: Option<f64>, points: usize) -> Result<Frame> {
    require_continuous(frame, Channel::X, "density")?;
    if points < 2 {
        return Err(Error::invalid("points", format!("need at least 2 evaluation points, got {points}")));
    }
    if let Some(bw) = bandwidth.filter(|bw| !(bw.is_finite() && *bw > 0.0)) {
        return Err(Error::invalid("bandwidth", format!("bandwidth must be positive, got {bw}")));
    }
    let carried = grouping_channels(frame, &[Channel::X, Channel::Y]);
    let mut out = Summary::new(frame, &carried, &[(Channel::X, "x"), (Channel::Y, "density")]);

    for group in frame.group_rows(&carried) {
        let samples: Vec<(f64, f64)> = group
            .iter()
            .filter_map(|&row| frame.number(Channel::X, row).filter(|v| v.is_finite()).map(|v| (v, weight(frame, row))))
            .collect();
        if samples.len() < 2 {
            return Err(Error::EmptyPanel { stage: "density", required: 2, actual: samples.len() });
        }
        let xs: Vec<f64> = samples.iter().map(|&(x, _)| x).collect();
        let h = bandwidth.unwrap_or_else(|| silverman(&xs));
        let total: f64 = samples.iter().map(|&(_, w)| w).sum();
        let (mut lo, mut hi) = min_max(&xs);
        if lo == hi {
            lo -= 3.0 * h;
            hi += 3.0 * h;
        }
        let step = (hi - lo) / (points - 1) as f64;
        for i in 0..points {
            let at = lo + i as f64 * step;
            let y = if total > 0.0 {
                samples.iter().map(|&(x, w)| w * gaussian((at - x) / h)).sum::<f64>() / (total * h)
            } else {
                0.0
            };
            out.push(group[0], &[at, y]);
        }
    }
    out.finish()
}

fn regression(frame: &Frame, points: usize) -> Result<Frame> {
    require_continuous(frame, Channel::X, "regression")?;
    require_continuous(frame, Channel::Y, "regression")?;
    if points < 2 {
        return Err(Error::invalid("points", format!("need at least 2 fitted points, got {points}")));
    }
    let carried = grouping_channels(frame, &[Channel::X, Channel::Y]);
    let mut out = Summary::new(frame, &carried, &[(Channel::X, "x"), (Channel::Y, "y")]);

    for group in frame.group_rows(&carried) {
        let pairs: Vec<(f64, f64)> = group
            .iter()
            .filter_map(|&row| Some((frame.number(Channel::X, row)?, frame.number(Channel::Y, row)?)))
            .filter(|(x, y)| x.is_finite() && y.is_finite())
            .collect();
        let xs: Vec<f64> = pairs.iter().map(|&(x, _)| x).collect();
        let distinct = {
            let mut sorted = xs.clone();
            sorted.sort_by(f64::total_cmp);
            sorted.dedup();
            sorted.len()
        };
        if distinct < 2 {
            return Err(Error::EmptyPanel { stage: "regression", required: 2, actual: distinct });
        }
        let n = pairs.len() as f64;
        let mean_x = xs.iter().sum::<f64>() / n;
        let mean_y = pairs.iter().map(|&(_, y)| y).sum::<f64>() / n;
        let sxy: f64 = pairs.iter().map(|&(x, y)| (x - mean_x) * (y - mean_y)).sum();
        let sxx: f64 = xs.iter().map(|x| (x - mean_x).powi(2)).sum();
        let slope = sxy / sxx;
        let intercept = mean_y - slope * mean_x;

        let (lo, hi) = min_max(&xs);
        let step = (hi - lo) / (points - 1) as f64;
        for i in 0..points {
            let x = lo + i as f64 * step;
            out.push(group[0], &[x, intercept + slope * x]);
        }
    }
    out.finish()
}

fn gaussian(u: f64) -> f64 {
    (-0.5 * u * u).exp() / (2.0 * std::f64::consts::PI).sqrt()
}

fn min_max(values: &[f64]) -> (f64, f64) {
    values.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)))
}

/// Linear-interpolated quantile of unsorted values.
fn quantile(values: &[f64], q: f64) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let pos = q * (sorted.len() - 1) as f64;
    let below = pos.floor() as usize;
    let above = pos.ceil() as usize;
    sorted[below] + (sorted[above] - sorted[below]) * (pos - below as f64)
}

/// Silverman's rule of thumb, falling back when the spread is zero.
fn silverman(xs: &[f64]) -> f64 {
    let n = xs.len() as f64;
    let mean = xs.iter().sum::<f64>() / n;
    let sd = (xs.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1.0)).sqrt();
    let iqr = quantile(xs, 0.75) - quantile(xs, 0.25);
    let mut spread = sd.min(iqr / 1.34);
    if spread <= 0.0 {
        spread = [sd, xs[0].abs(), 1.0].into_iter().find(|s| *s > 0.0).unwrap_or(1.0);
    }
    0.9 * spread * n.powf(-0.2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::aes::Aes;
    use crate::table::Table;
    use approx::assert_relative_eq;

    fn frame(table: &Table, aes: Aes) -> Frame {
        Frame::from_table(table, &aes).unwrap()
    }

    fn numbers(f: &Frame, channel: Channel) -> Vec<f64> {
        (0..f.len()).map(|r| f.number(channel, r).unwrap()).collect()
    }

    #[test]
    fn test_identity_passes_through() {
        let table = Table::from_xy(&[1.0, 2.0], &[3.0, 4.0]).unwrap();
        let f = frame(&table, Aes::new().x("x").y("y"));
        assert_eq!(Stat::identity().apply(&f).unwrap(), f);
    }

    #[test]
    fn test_aggregate_sum_by_category() {
        let table = Table::builder()
            .text("class", &["A", "A", "B"])
            .numeric("value", &[1.0, 3.0, 5.0])
            .build()
            .unwrap();
        let f = frame(&table, Aes::new().x("class").y("value"));
        let out = Stat::sum().apply(&f).unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out.value(Channel::X, 0), Some(&DataValue::from("A")));
        assert_eq!(out.value(Channel::X, 1), Some(&DataValue::from("B")));
        assert_eq!(numbers(&out, Channel::Y), vec![4.0, 5.0]);
        assert_eq!(out.get(Channel::Y).unwrap().name(), "value");
    }

    #[test]
    fn test_aggregate_functions() {
        let table = Table::builder()
            .text("g", &["a", "a", "a", "a"])
            .numeric("v", &[4.0, 1.0, 3.0, 2.0])
            .build()
            .unwrap();
        let f = frame(&table, Aes::new().x("g").y("v"));
        let run = |func| numbers(&Stat::aggregate(Channel::Y, func).apply(&f).unwrap(), Channel::Y)[0];
        assert_relative_eq!(run(AggFn::Mean), 2.5);
        assert_relative_eq!(run(AggFn::Median), 2.5);
        assert_relative_eq!(run(AggFn::Min), 1.0);
        assert_relative_eq!(run(AggFn::Max), 4.0);
        assert_relative_eq!(run(AggFn::Count), 4.0);
        assert_relative_eq!(run("median".parse().unwrap()), 2.5);
        assert!("mode".parse::<AggFn>().is_err());
    }

    #[test]
    fn test_aggregate_all_null_group_is_null() {
        let table = Table::builder()
            .text("g", &["a", "b"])
            .column(Column::new(
                "v",
                ColumnType::Continuous,
                vec![DataValue::Number(1.0), DataValue::Null],
            ))
            .build()
            .unwrap();
        let out = Stat::mean().apply(&frame(&table, Aes::new().x("g").y("v"))).unwrap();
        assert_eq!(out.number(Channel::Y, 0), Some(1.0));
        assert!(out.value(Channel::Y, 1).unwrap().is_null());
    }

    #[test]
    fn test_aggregate_discrete_target_is_type_mismatch() {
        let table = Table::builder().text("g", &["a"]).text("v", &["z"]).build().unwrap();
        let err = Stat::sum().apply(&frame(&table, Aes::new().x("g").y("v")));
        assert!(matches!(err, Err(Error::TypeMismatch { target, .. }) if target == "y"));
    }

    #[test]
    fn test_bin_half_open_with_closed_last_bucket() {
        let table = Table::builder().numeric("v", &[0.0, 1.0, 2.0, 3.0, 4.0]).build().unwrap();
        let out = Stat::bin(2).apply(&frame(&table, Aes::new().x("v"))).unwrap();
        assert_eq!(numbers(&out, Channel::X), vec![1.0, 3.0]);
        assert_eq!(numbers(&out, Channel::Xmin), vec![0.0, 2.0]);
        assert_eq!(numbers(&out, Channel::Xmax), vec![2.0, 4.0]);
        assert_eq!(numbers(&out, Channel::Y), vec![2.0, 3.0]);
    }

    #[test]
    fn test_bin_width_covers_upper_bound() {
        let table = Table::builder().numeric("v", &[0.0, 0.5, 1.0]).build().unwrap();
        let out = Stat::bin_width(0.5).apply(&frame(&table, Aes::new().x("v"))).unwrap();
        assert_eq!(numbers(&out, Channel::Y), vec![1.0, 2.0]);
    }

    #[test]
    fn test_bin_skips_empty_buckets() {
        let table = Table::builder().numeric("v", &[0.0, 10.0]).build().unwrap();
        let out = Stat::bin(5).apply(&frame(&table, Aes::new().x("v"))).unwrap();
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn test_bin_groups_by_fill_and_weight() {
        let table = Table::builder()
            .numeric("v", &[0.0, 1.0, 0.0, 1.0])
            .text("k", &["a", "a", "b", "b"])
            .numeric("w", &[2.0, 3.0, 1.0, 1.0])
            .build()
            .unwrap();
        let out = Stat::bin(1).apply(&frame(&table, Aes::new().x("v").fill("k").weight("w"))).unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(numbers(&out, Channel::Y), vec![5.0, 2.0]);
        assert_eq!(out.value(Channel::Fill, 1), Some(&DataValue::from("b")));
        assert!(!out.has(Channel::Weight));
    }

    #[test]
    fn test_bin_discrete_is_type_mismatch() {
        let table = Table::builder().text("v", &["a", "b"]).build().unwrap();
        let err = Stat::bin(3).apply(&frame(&table, Aes::new().x("v")));
        assert!(matches!(err, Err(Error::TypeMismatch { .. })));
    }

    #[test]
    fn test_bin_rejects_zero_bins() {
        let table = Table::builder().numeric("v", &[1.0]).build().unwrap();
        let err = Stat::bin(0).apply(&frame(&table, Aes::new().x("v")));
        assert!(matches!(err, Err(Error::InvalidParameter { name: "bins", .. })));
    }

    #[test]
    fn test_bin_rejects_too_many_buckets() {
        let table = Table::builder().numeric("v", &[0.0, 1e6]).build().unwrap();
        let f = frame(&table, Aes::new().x("v"));
        let err = Stat::bin_width(1e-12).apply(&f);
        assert!(matches!(err, Err(Error::InvalidParameter { name: "bins", .. })));
        let err = Stat::bin(MAX_BINS + 1).apply(&f);
        assert!(matches!(err, Err(Error::InvalidParameter { name: "bins", .. })));
        assert!(Stat::bin_width(1000.0).apply(&f).is_ok());
    }

    #[test]
    fn test_bin_single_value() {
        let table = Table::builder().numeric("v", &[2.0, 2.0]).build().unwrap();
        let out = Stat::bin(1).apply(&frame(&table, Aes::new().x("v"))).unwrap();
        assert_eq!(numbers(&out, Channel::X), vec![2.0]);
        assert_eq!(numbers(&out, Channel::Y), vec![2.0]);
    }

    #[test]
    fn test_count_per_x() {
        let table = Table::builder().text("c", &["a", "b", "a", "a"]).build().unwrap();
        let out = Stat::count().apply(&frame(&table, Aes::new().x("c"))).unwrap();
        assert_eq!(numbers(&out, Channel::Y), vec![3.0, 1.0]);
        assert_eq!(out.get(Channel::Y).unwrap().name(), "count");
    }

    #[test]
    fn test_density_shape() {
        let table = Table::builder().numeric("v", &[-1.0, 0.0, 0.0, 1.0]).build().unwrap();
        let stat = Stat::Density { bandwidth: Some(0.5), points: 21 };
        let out = stat.apply(&frame(&table, Aes::new().x("v"))).unwrap();
        assert_eq!(out.len(), 21);
        let ys = numbers(&out, Channel::Y);
        assert!(ys.iter().all(|y| *y >= 0.0));
        let peak = ys.iter().cloned().fold(f64::MIN, f64::max);
        assert_relative_eq!(ys[10], peak);
        assert_relative_eq!(out.number(Channel::X, 10).unwrap(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_density_needs_two_values() {
        let table = Table::builder().numeric("v", &[1.0]).build().unwrap();
        let err = Stat::density().apply(&frame(&table, Aes::new().x("v")));
        assert!(matches!(err, Err(Error::EmptyPanel { stage: "density", .. })));
    }

    #[test]
    fn test_regression_recovers_line() {
        let table = Table::from_xy(&[0.0, 1.0, 2.0, 3.0], &[1.0, 3.0, 5.0, 7.0]).unwrap();
        let out = Stat::Regression { points: 4 }.apply(&frame(&table, Aes::new().x("x").y("y"))).unwrap();
        for (x, y) in numbers(&out, Channel::X).into_iter().zip(numbers(&out, Channel::Y)) {
            assert_relative_eq!(y, 2.0 * x + 1.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_regression_single_x_fails() {
        let table = Table::from_xy(&[1.0, 1.0], &[2.0, 3.0]).unwrap();
        let err = Stat::regression().apply(&frame(&table, Aes::new().x("x").y("y")));
        assert!(matches!(err, Err(Error::EmptyPanel { stage: "regression", actual: 1, .. })));
    }

    #[test]
    fn test_quantile_interpolates() {
        assert_relative_eq!(quantile(&[1.0, 2.0, 3.0, 4.0], 0.25), 1.75);
        assert_relative_eq!(quantile(&[5.0], 0.5), 5.0);
    }
}
