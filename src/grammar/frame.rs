//! Channel frames: evaluated aesthetic columns for one panel.
//!
//! A [`Frame`] holds raw values and feeds the statistics; a [`ScaledFrame`]
//! holds the same rows resolved through frozen scales and feeds the
//! geometries and collision modifiers.

use std::collections::{BTreeMap, HashMap};

use super::aes::{Aes, Channel};
use super::algebra::{GroupKey, KeyPart};
use crate::error::{Error, Result};
use crate::scale::{Normalized, Scale, ScaleSet};
use crate::table::{Column, ColumnType, DataValue, Table};

/// Raw (pre-scale) values per aesthetic channel, all of equal length.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Frame {
    channels: Vec<(Channel, Column)>,
    len: usize,
}

impl Frame {
    /// An empty frame with `len` rows and no channels.
    #[must_use]
    pub fn new(len: usize) -> Self {
        Self { channels: Vec::new(), len }
    }

    /// Evaluate every mapped variable against the table.
    pub fn from_table(table: &Table, aes: &Aes) -> Result<Self> {
        let mut frame = Self::new(table.nrow());
        for (channel, var) in aes.iter() {
            frame.insert(channel, var.evaluate(table)?)?;
        }
        Ok(frame)
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// True when the frame has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Add or replace a channel.
    ///
    /// Fails with [`Error::ColumnLengthMismatch`] if the column length differs
    /// from the frame length.
    pub fn insert(&mut self, channel: Channel, column: Column) -> Result<()> {
        if column.len() != self.len {
            return Err(Error::ColumnLengthMismatch {
                column: format!("{channel} ({})", column.name()),
                expected: self.len,
                actual: column.len(),
            });
        }
        match self.channels.iter_mut().find(|(c, _)| *c == channel) {
            Some(slot) => slot.1 = column,
            None => self.channels.push((channel, column)),
        }
        Ok(())
    }

    /// Column bound to a channel.
    #[must_use]
    pub fn get(&self, channel: Channel) -> Option<&Column> {
        self.channels.iter().find(|(c, _)| *c == channel).map(|(_, col)| col)
    }

    /// True when the channel is bound.
    #[must_use]
    pub fn has(&self, channel: Channel) -> bool {
        self.get(channel).is_some()
    }

    /// Semantic type of a channel.
    #[must_use]
    pub fn kind(&self, channel: Channel) -> Option<ColumnType> {
        self.get(channel).map(Column::kind)
    }

    /// Bound channels with their columns, in binding order.
    pub fn iter(&self) -> impl Iterator<Item = (Channel, &Column)> {
        self.channels.iter().map(|(c, col)| (*c, col))
    }

    /// Raw value of a channel at a row.
    #[must_use]
    pub fn value(&self, channel: Channel, row: usize) -> Option<&DataValue> {
        self.get(channel).and_then(|col| col.get(row))
    }

    /// Numeric value of a channel at a row.
    #[must_use]
    pub fn number(&self, channel: Channel, row: usize) -> Option<f64> {
        self.value(channel, row).and_then(DataValue::as_f64)
    }

    /// Rows picked by index, preserving the given order.
    #[must_use]
    pub fn take(&self, rows: &[usize]) -> Self {
        Self {
            channels: self.channels.iter().map(|(c, col)| (*c, col.take(rows))).collect(),
            len: rows.len(),
        }
    }

    /// Split rows by the values of `by`, in first-seen order.
    ///
    /// Row order inside each group is preserved.
    #[must_use]
    pub fn group_rows(&self, by: &[Channel]) -> Vec<Vec<usize>> {
        let mut index: HashMap<GroupKey, usize> = HashMap::new();
        let mut groups: Vec<Vec<usize>> = Vec::new();
        for row in 0..self.len {
            let key = self.row_key(by, row);
            let slot = *index.entry(key).or_insert_with(|| {
                groups.push(Vec::new());
                groups.len() - 1
            });
            groups[slot].push(row);
        }
        groups
    }

    /// Channels that split rows into series: `group` when bound, otherwise
    /// the categorical colour, fill and shape channels.
    #[must_use]
    pub fn series_channels(&self) -> Vec<Channel> {
        if self.has(Channel::Group) {
            return vec![Channel::Group];
        }
        self.iter()
            .filter(|(c, col)| c.is_grouping() && col.kind().is_categorical())
            .map(|(c, _)| c)
            .collect()
    }

    /// Grouping key of a row over the given channels.
    #[must_use]
    pub fn row_key(&self, by: &[Channel], row: usize) -> GroupKey {
        GroupKey::new(
            by.iter()
                .map(|&c| self.value(c, row).map_or(KeyPart::Null, KeyPart::from))
                .collect(),
        )
    }
}

/// Rows of a frame resolved into normalized positions and styles.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScaledFrame {
    len: usize,
    values: BTreeMap<Channel, Vec<Option<f64>>>,
    levels: BTreeMap<Channel, Vec<Option<usize>>>,
    labels: Option<Vec<Option<String>>>,
    groups: Vec<usize>,
    n_groups: usize,
    baseline: f64,
    slot: f64,
}

impl ScaledFrame {
    /// Resolve every scaled channel of `frame` through `scales`.
    ///
    /// Rows are grouped by [`Frame::series_channels`].
    pub fn resolve(frame: &Frame, scales: &ScaleSet) -> Result<Self> {
        let mut values = BTreeMap::new();
        let mut levels = BTreeMap::new();
        let mut labels = None;
        for (channel, column) in frame.iter() {
            if channel == Channel::Label {
                labels = Some(
                    column.values().iter().map(|v| (!v.is_null()).then(|| v.to_string())).collect(),
                );
                continue;
            }
            if !channel.is_scaled() {
                continue;
            }
            let resolved = column
                .values()
                .iter()
                .map(|v| Ok(scales.resolve(channel, v)?.map(Normalized::get)))
                .collect::<Result<Vec<_>>>()?;
            values.insert(channel, resolved);
            if let Some(Scale::Discrete(scale)) = scales.get(channel) {
                levels.insert(channel, column.values().iter().map(|v| scale.index(v)).collect());
            }
        }

        let grouped = frame.group_rows(&frame.series_channels());
        let mut groups = vec![0; frame.len()];
        for (g, rows) in grouped.iter().enumerate() {
            for &row in rows {
                groups[row] = g;
            }
        }

        let baseline = match scales.get(Channel::Y) {
            Some(Scale::Continuous(scale)) => scale.baseline(),
            _ => 0.0,
        };
        let slot = match scales.get(Channel::X).and_then(Scale::slot_width) {
            Some(width) => width,
            None => min_gap(values.get(&Channel::X).map(Vec::as_slice).unwrap_or_default()),
        };

        Ok(Self { len: frame.len(), values, levels, labels, groups, n_groups: grouped.len(), baseline, slot })
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// True when the frame has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Normalized value of a channel at a row.
    #[must_use]
    pub fn get(&self, channel: Channel, row: usize) -> Option<f64> {
        self.values.get(&channel).and_then(|v| v.get(row).copied().flatten())
    }

    /// True when the channel has resolved values.
    #[must_use]
    pub fn has(&self, channel: Channel) -> bool {
        self.values.contains_key(&channel)
    }

    /// Overwrite a normalized value, binding the channel if needed.
    pub fn set(&mut self, channel: Channel, row: usize, value: Option<f64>) {
        let len = self.len;
        let column = self.values.entry(channel).or_insert_with(|| vec![None; len]);
        if let Some(slot) = column.get_mut(row) {
            *slot = value;
        }
    }

    /// Level index of a row on a discrete channel.
    #[must_use]
    pub fn level(&self, channel: Channel, row: usize) -> Option<usize> {
        self.levels.get(&channel).and_then(|v| v.get(row).copied().flatten())
    }

    /// Label text of a row.
    #[must_use]
    pub fn label(&self, row: usize) -> Option<&str> {
        self.labels.as_ref().and_then(|l| l.get(row)).and_then(Option::as_deref)
    }

    /// Group index of a row.
    #[must_use]
    pub fn group(&self, row: usize) -> usize {
        self.groups.get(row).copied().unwrap_or(0)
    }

    /// Number of groups.
    #[must_use]
    pub fn n_groups(&self) -> usize {
        self.n_groups
    }

    /// Rows of each group, in row order.
    #[must_use]
    pub fn group_rows(&self) -> Vec<Vec<usize>> {
        let mut out = vec![Vec::new(); self.n_groups];
        for (row, &g) in self.groups.iter().enumerate() {
            out[g].push(row);
        }
        out
    }

    /// Normalized position of raw `0` on the y scale, or the bottom of the panel.
    #[must_use]
    pub fn baseline(&self) -> f64 {
        self.baseline
    }

    /// Width of one x slot in normalized units.
    #[must_use]
    pub fn slot_width(&self) -> f64 {
        self.slot
    }
}

/// Smallest gap between distinct positions, 1 when there is none.
fn min_gap(positions: &[Option<f64>]) -> f64 {
    let mut sorted: Vec<f64> = positions.iter().flatten().copied().collect();
    sorted.sort_by(f64::total_cmp);
    sorted.dedup();
    sorted.windows(2).map(|w| w[1] - w[0]).reduce(f64::min).unwrap_or(1.0)
}
