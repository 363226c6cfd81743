//! Aesthetic mappings for Grammar of Graphics.
//!
//! Maps variables to visual channels (position, colour, size, ...).

use std::fmt;
use std::str::FromStr;

use super::variable::VarSpec;
use crate::error::{Error, Result};

/// A position axis of the unit panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Axis {
    /// Horizontal axis.
    #[default]
    X,
    /// Vertical axis.
    Y,
}

impl Axis {
    /// The other axis.
    #[must_use]
    pub fn other(self) -> Self {
        match self {
            Axis::X => Axis::Y,
            Axis::Y => Axis::X,
        }
    }

    /// Axis name.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Axis::X => "x",
            Axis::Y => "y",
        }
    }
}

/// An aesthetic channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Channel {
    /// Horizontal position.
    X,
    /// Vertical position.
    Y,
    /// Lower horizontal extent.
    Xmin,
    /// Upper horizontal extent.
    Xmax,
    /// Lower vertical extent.
    Ymin,
    /// Upper vertical extent.
    Ymax,
    /// Stroke colour.
    Colour,
    /// Fill colour.
    Fill,
    /// Mark size.
    Size,
    /// Opacity.
    Alpha,
    /// Point shape.
    Shape,
    /// Text label.
    Label,
    /// Row weight for counting statistics.
    Weight,
    /// Explicit grouping for per-group geometries.
    Group,
}

impl Channel {
    /// Every channel, in canonical order.
    pub const ALL: [Channel; 14] = [
        Channel::X,
        Channel::Y,
        Channel::Xmin,
        Channel::Xmax,
        Channel::Ymin,
        Channel::Ymax,
        Channel::Colour,
        Channel::Fill,
        Channel::Size,
        Channel::Alpha,
        Channel::Shape,
        Channel::Label,
        Channel::Weight,
        Channel::Group,
    ];

    /// Canonical channel name.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Channel::X => "x",
            Channel::Y => "y",
            Channel::Xmin => "xmin",
            Channel::Xmax => "xmax",
            Channel::Ymin => "ymin",
            Channel::Ymax => "ymax",
            Channel::Colour => "colour",
            Channel::Fill => "fill",
            Channel::Size => "size",
            Channel::Alpha => "alpha",
            Channel::Shape => "shape",
            Channel::Label => "label",
            Channel::Weight => "weight",
            Channel::Group => "group",
        }
    }

    /// Position axis this channel lives on, if it is a position channel.
    #[must_use]
    pub fn axis(self) -> Option<Axis> {
        match self {
            Channel::X | Channel::Xmin | Channel::Xmax => Some(Axis::X),
            Channel::Y | Channel::Ymin | Channel::Ymax => Some(Axis::Y),
            _ => None,
        }
    }

    /// The channel whose scale this channel resolves through.
    ///
    /// Extent channels share the scale of their axis.
    #[must_use]
    pub fn scale_channel(self) -> Channel {
        match self.axis() {
            Some(Axis::X) => Channel::X,
            Some(Axis::Y) => Channel::Y,
            None => self,
        }
    }

    /// True for channels that get a scale at all.
    ///
    /// `label` passes text through unchanged; `group` and `weight` only feed
    /// grouping and statistics.
    #[must_use]
    pub fn is_scaled(self) -> bool {
        !matches!(self, Channel::Label | Channel::Group | Channel::Weight)
    }

    /// True for channels whose discrete values split rows into groups.
    #[must_use]
    pub fn is_grouping(self) -> bool {
        matches!(self, Channel::Group | Channel::Colour | Channel::Fill | Channel::Shape)
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Channel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        if s == "color" {
            return Ok(Channel::Colour);
        }
        Channel::ALL
            .into_iter()
            .find(|c| c.name() == s)
            .ok_or_else(|| Error::UnknownChannel(s.to_string()))
    }
}

/// Aesthetic mapping specification.
///
/// Channels are unique within one mapping and kept in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Aes {
    mappings: Vec<(Channel, VarSpec)>,
}

impl Aes {
    /// Create a new aesthetic mapping.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a mapping from channel names, rejecting unknown and duplicate channels.
    pub fn from_pairs<'a, I>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (&'a str, VarSpec)>,
    {
        pairs.into_iter().try_fold(Self::new(), |aes, (name, var)| aes.try_map(name, var))
    }

    /// Map a channel given by name.
    ///
    /// Fails with [`Error::UnknownChannel`] or [`Error::DuplicateChannel`].
    pub fn try_map(mut self, channel: &str, var: VarSpec) -> Result<Self> {
        let channel: Channel = channel.parse()?;
        if self.get(channel).is_some() {
            return Err(Error::DuplicateChannel(channel.name().to_string()));
        }
        self.mappings.push((channel, var));
        Ok(self)
    }

    /// Map a channel, replacing any previous mapping for it.
    #[must_use]
    pub fn map(mut self, channel: Channel, var: impl Into<VarSpec>) -> Self {
        let var = var.into();
        match self.mappings.iter_mut().find(|(c, _)| *c == channel) {
            Some(slot) => slot.1 = var,
            None => self.mappings.push((channel, var)),
        }
        self
    }

    /// Map x position.
    #[must_use]
    pub fn x(self, var: impl Into<VarSpec>) -> Self {
        self.map(Channel::X, var)
    }

    /// Map y position.
    #[must_use]
    pub fn y(self, var: impl Into<VarSpec>) -> Self {
        self.map(Channel::Y, var)
    }

    /// Map lower and upper y extent.
    #[must_use]
    pub fn y_range(self, ymin: impl Into<VarSpec>, ymax: impl Into<VarSpec>) -> Self {
        self.map(Channel::Ymin, ymin).map(Channel::Ymax, ymax)
    }

    /// Map colour.
    #[must_use]
    pub fn colour(self, var: impl Into<VarSpec>) -> Self {
        self.map(Channel::Colour, var)
    }

    /// Map fill.
    #[must_use]
    pub fn fill(self, var: impl Into<VarSpec>) -> Self {
        self.map(Channel::Fill, var)
    }

    /// Map size.
    #[must_use]
    pub fn size(self, var: impl Into<VarSpec>) -> Self {
        self.map(Channel::Size, var)
    }

    /// Map alpha/opacity.
    #[must_use]
    pub fn alpha(self, var: impl Into<VarSpec>) -> Self {
        self.map(Channel::Alpha, var)
    }

    /// Map shape.
    #[must_use]
    pub fn shape(self, var: impl Into<VarSpec>) -> Self {
        self.map(Channel::Shape, var)
    }

    /// Map label.
    #[must_use]
    pub fn label(self, var: impl Into<VarSpec>) -> Self {
        self.map(Channel::Label, var)
    }

    /// Map weight.
    #[must_use]
    pub fn weight(self, var: impl Into<VarSpec>) -> Self {
        self.map(Channel::Weight, var)
    }

    /// Map group.
    #[must_use]
    pub fn group(self, var: impl Into<VarSpec>) -> Self {
        self.map(Channel::Group, var)
    }

    /// Variable mapped to a channel.
    #[must_use]
    pub fn get(&self, channel: Channel) -> Option<&VarSpec> {
        self.mappings.iter().find(|(c, _)| *c == channel).map(|(_, v)| v)
    }

    /// Mapped channels in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (Channel, &VarSpec)> {
        self.mappings.iter().map(|(c, v)| (*c, v))
    }

    /// Number of mapped channels.
    #[must_use]
    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    /// True when nothing is mapped.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }
}
