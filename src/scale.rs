//! Scale functions for data-to-visual mappings.
//!
//! Scales map raw channel values into a normalized range (`[0,1]` unless
//! configured otherwise). They are built in two phases: a [`ScaleBuilder`]
//! observes every value destined for the channel (pass 1), then
//! [`ScaleBuilder::freeze`] produces an immutable [`Scale`] that resolves values
//! (pass 2). Based on the Grammar of Graphics [Wilkinson 2005].

use std::collections::{btree_map, hash_map, BTreeMap, HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::grammar::aes::Channel;
use crate::grammar::algebra::KeyPart;
use crate::grammar::frame::Frame;
use crate::table::{Column, ColumnType, DataValue};

/// Monotonic transform applied to raw values before linear mapping.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Transform {
    /// No transform.
    #[default]
    Identity,
    /// Logarithm with the given base.
    Log {
        /// Logarithm base (positive, not 1).
        base: f64,
    },
    /// Square root.
    Sqrt,
    /// `asin(sqrt(x))`, for proportions.
    Arcsine,
    /// `ln(x / (1 - x))`, for proportions.
    Logit,
    /// Negation: larger values map lower.
    Reverse,
}

impl Transform {
    /// Base-10 logarithm.
    #[must_use]
    pub fn log10() -> Self {
        Transform::Log { base: 10.0 }
    }

    /// Transform name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Transform::Identity => "identity",
            Transform::Log { .. } => "log",
            Transform::Sqrt => "sqrt",
            Transform::Arcsine => "asin",
            Transform::Logit => "logit",
            Transform::Reverse => "reverse",
        }
    }

    /// Transform a raw value, or `None` where the transform is undefined.
    #[must_use]
    pub fn apply(&self, v: f64) -> Option<f64> {
        let out = match *self {
            Transform::Identity => v,
            Transform::Log { base } if v > 0.0 => v.ln() / base.ln(),
            Transform::Sqrt if v >= 0.0 => v.sqrt(),
            Transform::Arcsine if (0.0..=1.0).contains(&v) => v.sqrt().asin(),
            Transform::Logit if v > 0.0 && v < 1.0 => (v / (1.0 - v)).ln(),
            Transform::Reverse => -v,
            _ => return None,
        };
        out.is_finite().then_some(out)
    }

    /// Map a transformed value back to raw space.
    #[must_use]
    pub fn invert(&self, t: f64) -> f64 {
        match *self {
            Transform::Identity => t,
            Transform::Log { base } => base.powf(t),
            Transform::Sqrt => t * t,
            Transform::Arcsine => t.sin().powi(2),
            Transform::Logit => 1.0 / (1.0 + (-t).exp()),
            Transform::Reverse => -t,
        }
    }

    fn validate(&self) -> Result<()> {
        match *self {
            Transform::Log { base } if !(base.is_finite() && base > 0.0 && base != 1.0) => {
                Err(Error::invalid("base", format!("log base must be positive and not 1, got {base}")))
            }
            _ => Ok(()),
        }
    }
}

impl fmt::Display for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Transform::Log { base } => write!(f, "log{base}"),
            other => f.write_str(other.name()),
        }
    }
}

impl FromStr for Transform {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "identity" => Ok(Transform::Identity),
            "log" | "log10" => Ok(Transform::log10()),
            "ln" => Ok(Transform::Log { base: std::f64::consts::E }),
            "log2" => Ok(Transform::Log { base: 2.0 }),
            "sqrt" => Ok(Transform::Sqrt),
            "asin" | "arcsine" => Ok(Transform::Arcsine),
            "logit" => Ok(Transform::Logit),
            "reverse" => Ok(Transform::Reverse),
            other => Err(Error::invalid("transform", format!("unknown transform '{other}'"))),
        }
    }
}

/// A value already mapped into a scale's output range.
///
/// Resolving a `Normalized` through any scale returns it unchanged.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
pub struct Normalized(f64);

impl Normalized {
    /// Wrap a position that is already in normalized space.
    #[must_use]
    pub fn new(value: f64) -> Self {
        Self(value)
    }

    /// The normalized value.
    #[must_use]
    pub fn get(self) -> f64 {
        self.0
    }
}

/// Values a frozen [`Scale`] can resolve.
pub trait Resolvable {
    /// Resolve through `scale`; `None` for missing values.
    fn resolve_in(&self, scale: &Scale) -> Result<Option<Normalized>>;
}

impl Resolvable for Normalized {
    fn resolve_in(&self, _scale: &Scale) -> Result<Option<Normalized>> {
        Ok(Some(*self))
    }
}

impl Resolvable for DataValue {
    fn resolve_in(&self, scale: &Scale) -> Result<Option<Normalized>> {
        match (scale, self) {
            (_, DataValue::Null) => Ok(None),
            (Scale::Continuous(s), DataValue::Number(v)) => s.map(*v),
            (Scale::Continuous(s), DataValue::Text(_)) => Err(Error::TypeMismatch {
                target: s.channel.name().to_string(),
                expected: ColumnType::Continuous.name(),
                found: ColumnType::Discrete.name(),
            }),
            (Scale::Discrete(s), value) => Ok(s.index(value).map(|i| Normalized(s.position(i)))),
        }
    }
}

impl Resolvable for f64 {
    fn resolve_in(&self, scale: &Scale) -> Result<Option<Normalized>> {
        DataValue::Number(*self).resolve_in(scale)
    }
}

/// Per-channel scale overrides.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ScaleConfig {
    /// Transform applied before mapping.
    pub transform: Transform,
    /// Explicit raw domain for continuous scales.
    pub limits: Option<(f64, f64)>,
    /// Explicit level order for discrete scales.
    pub levels: Option<Vec<String>>,
    /// Output range, `[0,1]` when unset.
    pub range: Option<(f64, f64)>,
    /// Treat numeric values as categories.
    pub discrete: bool,
}

impl ScaleConfig {
    /// Default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the transform.
    #[must_use]
    pub fn transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    /// Fix the continuous domain.
    #[must_use]
    pub fn limits(mut self, lo: f64, hi: f64) -> Self {
        self.limits = Some((lo, hi));
        self
    }

    /// Fix the discrete level order.
    #[must_use]
    pub fn levels(mut self, levels: &[&str]) -> Self {
        self.levels = Some(levels.iter().map(|s| (*s).to_string()).collect());
        self
    }

    /// Set the output range.
    #[must_use]
    pub fn range(mut self, lo: f64, hi: f64) -> Self {
        self.range = Some((lo, hi));
        self
    }

    /// Force a discrete scale.
    #[must_use]
    pub fn discrete(mut self) -> Self {
        self.discrete = true;
        self
    }
}

/// Whether facet panels share scales.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScaleSharing {
    /// One scale per channel across all panels.
    #[default]
    Shared,
    /// Each panel trains its own scales.
    Free,
}

/// Frozen continuous scale.
#[derive(Debug, Clone, PartialEq)]
pub struct ContinuousScale {
    channel: Channel,
    transform: Transform,
    domain: (f64, f64),
    range: (f64, f64),
}

impl ContinuousScale {
    /// Domain in transformed space.
    #[must_use]
    pub fn domain(&self) -> (f64, f64) {
        self.domain
    }

    /// Output range.
    #[must_use]
    pub fn range(&self) -> (f64, f64) {
        self.range
    }

    /// Transform applied before mapping.
    #[must_use]
    pub fn transform(&self) -> Transform {
        self.transform
    }

    /// Normalized position bars and stacks grow from.
    ///
    /// Raw zero where the transform is defined there, otherwise the low end of
    /// the range.
    #[must_use]
    pub fn baseline(&self) -> f64 {
        match self.map(0.0) {
            Ok(Some(zero)) => zero.0,
            _ => self.range.0,
        }
    }

    fn map(&self, v: f64) -> Result<Option<Normalized>> {
        if !v.is_finite() {
            return Ok(None);
        }
        let t = self.transform.apply(v).ok_or_else(|| Error::DomainError {
            channel: self.channel.name().to_string(),
            transform: self.transform.name(),
            value: v,
        })?;
        let (lo, hi) = self.domain;
        let (r0, r1) = self.range;
        if hi == lo {
            return Ok(Some(Normalized((r0 + r1) / 2.0)));
        }
        Ok(Some(Normalized(r0 + (t - lo) / (hi - lo) * (r1 - r0))))
    }

    /// Map a normalized value back to raw space.
    #[must_use]
    pub fn invert(&self, value: Normalized) -> f64 {
        let (lo, hi) = self.domain;
        let (r0, r1) = self.range;
        let t = if r1 == r0 { lo } else { lo + (value.0 - r0) / (r1 - r0) * (hi - lo) };
        self.transform.invert(t)
    }
}

/// Frozen discrete scale.
#[derive(Debug, Clone, PartialEq)]
pub struct DiscreteScale {
    channel: Channel,
    levels: Vec<KeyPart>,
    index: HashMap<KeyPart, usize>,
    range: (f64, f64),
}

impl DiscreteScale {
    /// Levels in position order.
    #[must_use]
    pub fn levels(&self) -> &[KeyPart] {
        &self.levels
    }

    /// Number of levels.
    #[must_use]
    pub fn len(&self) -> usize {
        self.levels.len()
    }

    /// True when no level was observed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Index of a raw value among the levels.
    #[must_use]
    pub fn index(&self, value: &DataValue) -> Option<usize> {
        self.index.get(&KeyPart::from(value)).copied()
    }

    /// Position of level `i`: evenly spaced, both range ends included.
    #[must_use]
    pub fn position(&self, i: usize) -> f64 {
        let (r0, r1) = self.range;
        match self.levels.len() {
            0 | 1 => (r0 + r1) / 2.0,
            n => r0 + i as f64 / (n - 1) as f64 * (r1 - r0),
        }
    }

    /// Distance between neighbouring level positions.
    #[must_use]
    pub fn step(&self) -> f64 {
        let (r0, r1) = self.range;
        match self.levels.len() {
            0 | 1 => (r1 - r0).abs(),
            n => (r1 - r0).abs() / (n - 1) as f64,
        }
    }

    /// Level closest to a normalized position.
    #[must_use]
    pub fn invert(&self, value: Normalized) -> Option<&KeyPart> {
        (0..self.levels.len())
            .min_by(|&a, &b| {
                let da = (self.position(a) - value.0).abs();
                let db = (self.position(b) - value.0).abs();
                da.total_cmp(&db)
            })
            .map(|i| &self.levels[i])
    }
}

/// A frozen scale.
#[derive(Debug, Clone, PartialEq)]
pub enum Scale {
    /// Numeric domain mapped linearly after a transform.
    Continuous(ContinuousScale),
    /// Ordered set of levels at evenly spaced positions.
    Discrete(DiscreteScale),
}

impl Scale {
    /// Channel this scale belongs to.
    #[must_use]
    pub fn channel(&self) -> Channel {
        match self {
            Scale::Continuous(s) => s.channel,
            Scale::Discrete(s) => s.channel,
        }
    }

    /// True for discrete scales.
    #[must_use]
    pub fn is_discrete(&self) -> bool {
        matches!(self, Scale::Discrete(_))
    }

    /// Resolve a raw or already-normalized value.
    ///
    /// Returns `Ok(None)` for missing values and for levels outside an explicit
    /// level order. A value outside the transform's domain is a
    /// [`Error::DomainError`].
    pub fn resolve<R: Resolvable + ?Sized>(&self, value: &R) -> Result<Option<Normalized>> {
        value.resolve_in(self)
    }

    /// Width of one category slot in normalized units.
    ///
    /// Continuous scales report `None`; callers pick their own default.
    #[must_use]
    pub fn slot_width(&self) -> Option<f64> {
        match self {
            Scale::Continuous(_) => None,
            Scale::Discrete(s) => Some(s.step()),
        }
    }
}

/// Mutable domain accumulator for one channel.
#[derive(Debug, Clone)]
pub struct ScaleBuilder {
    channel: Channel,
    config: ScaleConfig,
    kind: Option<ColumnType>,
    declared: Option<Vec<String>>,
    extent: Option<(f64, f64)>,
    levels: Vec<KeyPart>,
    seen: HashSet<KeyPart>,
}

impl ScaleBuilder {
    /// Start an empty scale for `channel`.
    pub fn new(channel: Channel, config: ScaleConfig) -> Result<Self> {
        config.transform.validate()?;
        if let Some((lo, hi)) = config.range.filter(|(lo, hi)| !(lo.is_finite() && hi.is_finite())) {
            return Err(Error::invalid("range", format!("range must be finite, got ({lo}, {hi})")));
        }
        Ok(Self {
            channel,
            config,
            kind: None,
            declared: None,
            extent: None,
            levels: Vec::new(),
            seen: HashSet::new(),
        })
    }

    fn is_discrete(&self) -> bool {
        self.config.discrete || self.kind.is_some_and(ColumnType::is_categorical)
    }

    fn mismatch(&self, expected: ColumnType, found: ColumnType) -> Error {
        Error::TypeMismatch { target: self.channel.name().to_string(), expected: expected.name(), found: found.name() }
    }

    /// Observe every value of a column.
    pub fn observe_column(&mut self, column: &Column) -> Result<()> {
        let kind = column.kind();
        match self.kind {
            Some(prev) if prev.is_categorical() != kind.is_categorical() => {
                return Err(self.mismatch(prev, kind));
            }
            None => self.kind = Some(kind),
            Some(_) => {}
        }
        if self.is_discrete() && self.config.transform != Transform::Identity {
            return Err(self.mismatch(ColumnType::Continuous, ColumnType::Discrete));
        }
        if self.declared.is_none() {
            self.declared = column.levels().map(<[String]>::to_vec);
        }
        column.values().iter().try_for_each(|v| self.observe(v))
    }

    /// Observe one raw value; nulls are ignored.
    pub fn observe(&mut self, value: &DataValue) -> Result<()> {
        match value {
            DataValue::Null => Ok(()),
            _ if self.is_discrete() => {
                let key = KeyPart::from(value);
                if self.seen.insert(key.clone()) {
                    self.levels.push(key);
                }
                Ok(())
            }
            DataValue::Number(v) => self.observe_number(*v),
            DataValue::Text(_) => Err(self.mismatch(ColumnType::Continuous, ColumnType::Discrete)),
        }
    }

    /// Observe a numeric value, e.g. a stacked total.
    pub fn observe_number(&mut self, v: f64) -> Result<()> {
        if self.is_discrete() {
            return self.observe(&DataValue::Number(v));
        }
        if !v.is_finite() {
            return Ok(());
        }
        let t = self.transformed(v)?;
        self.extent = Some(match self.extent {
            Some((lo, hi)) => (lo.min(t), hi.max(t)),
            None => (t, t),
        });
        Ok(())
    }

    fn transformed(&self, v: f64) -> Result<f64> {
        self.config.transform.apply(v).ok_or_else(|| Error::DomainError {
            channel: self.channel.name().to_string(),
            transform: self.config.transform.name(),
            value: v,
        })
    }

    /// Key for a level given by name.
    ///
    /// Names match observed levels by their display form, so `"2"` finds the
    /// number 2. Unobserved names on a numeric column parse as numbers.
    fn level_key(&self, label: &str) -> KeyPart {
        if let Some(key) = self.levels.iter().find(|k| k.to_string() == label) {
            return key.clone();
        }
        match label.parse::<f64>() {
            Ok(n) if self.kind.is_some_and(|k| !k.is_categorical()) => KeyPart::from(&DataValue::Number(n)),
            _ => KeyPart::Text(label.to_string()),
        }
    }

    /// Freeze the observed domain into an immutable scale.
    pub fn freeze(self) -> Result<Scale> {
        let range = self.config.range.unwrap_or((0.0, 1.0));
        if self.is_discrete() {
            let levels: Vec<KeyPart> = match (&self.config.levels, &self.declared) {
                (Some(explicit), _) => explicit.iter().map(|l| self.level_key(l)).collect(),
                (None, Some(declared)) => {
                    let mut levels: Vec<KeyPart> = declared.iter().map(|l| self.level_key(l)).collect();
                    let undeclared: Vec<KeyPart> =
                        self.levels.into_iter().filter(|k| !levels.contains(k)).collect();
                    levels.extend(undeclared);
                    levels
                }
                (None, None) => self.levels,
            };
            let mut index = HashMap::with_capacity(levels.len());
            for (i, level) in levels.iter().enumerate() {
                if let hash_map::Entry::Vacant(slot) = index.entry(level.clone()) {
                    slot.insert(i);
                }
            }
            tracing::debug!(channel = %self.channel, levels = levels.len(), "froze discrete scale");
            return Ok(Scale::Discrete(DiscreteScale { channel: self.channel, levels, index, range }));
        }

        let domain = match self.config.limits {
            Some((a, b)) => {
                let (ta, tb) = (self.transformed(a)?, self.transformed(b)?);
                (ta.min(tb), ta.max(tb))
            }
            None => self.extent.unwrap_or((0.0, 0.0)),
        };
        tracing::debug!(channel = %self.channel, ?domain, transform = %self.config.transform, "froze continuous scale");
        Ok(Scale::Continuous(ContinuousScale { channel: self.channel, transform: self.config.transform, domain, range }))
    }
}

/// Pass-1 accumulator for every scaled channel of a panel set.
///
/// Builders are created lazily the first time a channel is observed.
#[derive(Debug, Clone, Default)]
pub struct ScaleSetBuilder {
    configs: HashMap<Channel, ScaleConfig>,
    builders: BTreeMap<Channel, ScaleBuilder>,
}

impl ScaleSetBuilder {
    /// Accumulator using the given per-channel overrides.
    #[must_use]
    pub fn new(configs: &HashMap<Channel, ScaleConfig>) -> Self {
        Self { configs: configs.clone(), builders: BTreeMap::new() }
    }

    fn builder(&mut self, channel: Channel) -> Result<&mut ScaleBuilder> {
        let channel = channel.scale_channel();
        Ok(match self.builders.entry(channel) {
            btree_map::Entry::Occupied(e) => e.into_mut(),
            btree_map::Entry::Vacant(e) => {
                let config = self.configs.get(&channel).cloned().unwrap_or_default();
                e.insert(ScaleBuilder::new(channel, config)?)
            }
        })
    }

    /// Observe every scaled channel of a frame.
    pub fn observe_frame(&mut self, frame: &Frame) -> Result<()> {
        for (channel, column) in frame.iter().filter(|(c, _)| c.is_scaled()) {
            self.builder(channel)?.observe_column(column)?;
        }
        Ok(())
    }

    /// Observe a derived numeric value on a channel's scale.
    pub fn observe_number(&mut self, channel: Channel, value: f64) -> Result<()> {
        self.builder(channel)?.observe_number(value)
    }

    /// Freeze every builder.
    pub fn freeze(self) -> Result<ScaleSet> {
        let scales = self
            .builders
            .into_iter()
            .map(|(channel, builder)| Ok((channel, builder.freeze()?)))
            .collect::<Result<BTreeMap<_, _>>>()?;
        Ok(ScaleSet { scales })
    }
}

/// Frozen scales keyed by channel.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScaleSet {
    scales: BTreeMap<Channel, Scale>,
}

impl ScaleSet {
    /// Scale used by a channel (extent channels share their axis scale).
    #[must_use]
    pub fn get(&self, channel: Channel) -> Option<&Scale> {
        self.scales.get(&channel.scale_channel())
    }

    /// Resolve a value on a channel's scale.
    pub fn resolve<R: Resolvable + ?Sized>(&self, channel: Channel, value: &R) -> Result<Option<Normalized>> {
        match self.get(channel) {
            Some(scale) => scale.resolve(value),
            None => Err(Error::invalid("channel", format!("no scale trained for '{channel}'"))),
        }
    }

    /// Channels with a scale.
    pub fn channels(&self) -> impl Iterator<Item = Channel> + '_ {
        self.scales.keys().copied()
    }

    /// Number of scales.
    #[must_use]
    pub fn len(&self) -> usize {
        self.scales.len()
    }

    /// True when no channel was trained.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.scales.is_empty()
    }
}
