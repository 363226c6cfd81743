//! YAML plot configuration.
//!
//! A [`PlotConfig`] carries an inline table plus every pipeline choice and
//! converts into a [`Plot`]. Unset fields fall back to the same defaults as
//! the builder API.
//!
//! ```yaml
//! title: Sales by region
//! data:
//!   columns:
//!     - name: region
//!       values: [north, south, north]
//!     - name: sales
//!       values: [3, 5, 2]
//! aes:
//!   x: region
//!   y: sales
//! stat:
//!   kind: aggregate
//!   func: sum
//! geom:
//!   kind: bar
//! scales:
//!   y:
//!     transform: sqrt
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::grammar::{
    Aes, AggFn, Axis, Bins, Channel, Coord, Facet, FacetLayout, Geom, Plot, Position, Stat, Term, VarSpec,
};
use crate::scale::{ScaleConfig, ScaleSharing, Transform};
use crate::table::{Column, ColumnType, DataValue, Table};

/// One table cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    /// Numeric value.
    Number(f64),
    /// Text value.
    Text(String),
    /// Missing value (`~` or `null`).
    Null,
}

impl From<&Cell> for DataValue {
    fn from(cell: &Cell) -> Self {
        match cell {
            Cell::Number(v) => DataValue::Number(*v),
            Cell::Text(s) => DataValue::Text(s.clone()),
            Cell::Null => DataValue::Null,
        }
    }
}

/// One inline column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnConfig {
    /// Column name.
    pub name: String,

    /// `continuous`, `discrete` or `ordinal`; inferred from the values when unset.
    #[serde(default)]
    pub kind: Option<String>,

    /// Declared level order for ordinal columns.
    #[serde(default)]
    pub levels: Vec<String>,

    /// Cell values.
    #[serde(default)]
    pub values: Vec<Cell>,
}

impl ColumnConfig {
    fn kind(&self) -> Result<ColumnType> {
        match self.kind.as_deref() {
            Some("continuous") => Ok(ColumnType::Continuous),
            Some("discrete") => Ok(ColumnType::Discrete),
            Some("ordinal") => Ok(ColumnType::Ordinal),
            Some(other) => Err(Error::invalid("kind", format!("unknown column kind '{other}'"))),
            None if self.values.iter().all(|c| !matches!(c, Cell::Text(_))) => Ok(ColumnType::Continuous),
            None => Ok(ColumnType::Discrete),
        }
    }

    fn to_column(&self) -> Result<Column> {
        let values: Vec<DataValue> = self.values.iter().map(DataValue::from).collect();
        Ok(match self.kind()? {
            ColumnType::Ordinal => {
                let levels: Vec<&str> = self.levels.iter().map(String::as_str).collect();
                Column::ordinal(self.name.as_str(), &[], &levels).with_values(values)
            }
            kind => Column::new(self.name.as_str(), kind, values),
        })
    }
}

/// Inline table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableConfig {
    /// Columns in table order.
    #[serde(default)]
    pub columns: Vec<ColumnConfig>,
}

impl TableConfig {
    /// Build the table, validating column lengths and types.
    pub fn to_table(&self) -> Result<Table> {
        self.columns
            .iter()
            .try_fold(Table::builder(), |builder, column| -> Result<_> {
                Ok(builder.column(column.to_column()?))
            })?
            .build()
    }
}

/// Faceting settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FacetConfig {
    /// Algebra expressions crossed into the panel key, e.g. `region * year`.
    #[serde(default)]
    pub terms: Vec<String>,

    /// `single`, `wrap` or `grid`.
    #[serde(default = "default_layout")]
    pub layout: String,

    /// Panels per row for the wrap layout.
    #[serde(default = "default_ncol")]
    pub ncol: usize,
}

fn default_layout() -> String {
    "single".to_string()
}
fn default_ncol() -> usize {
    3
}

impl Default for FacetConfig {
    fn default() -> Self {
        Self { terms: Vec::new(), layout: default_layout(), ncol: default_ncol() }
    }
}

impl FacetConfig {
    fn to_facet(&self) -> Result<Facet> {
        let terms = self.terms.iter().map(|t| t.parse()).collect::<Result<Vec<Term>>>()?;
        let layout = match self.layout.as_str() {
            "single" => FacetLayout::Single,
            "wrap" => FacetLayout::Wrap { ncol: self.ncol },
            "grid" => FacetLayout::Grid,
            other => return Err(Error::invalid("layout", format!("unknown facet layout '{other}'"))),
        };
        Ok(Facet::new(terms, layout))
    }
}

/// Statistic settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StatConfig {
    /// Pass-through.
    #[default]
    Identity,
    /// Histogram of x; set either `bins` or `width`.
    Bin {
        /// Bucket count.
        #[serde(default)]
        bins: Option<usize>,
        /// Bucket width.
        #[serde(default)]
        width: Option<f64>,
    },
    /// Rows per distinct x.
    Count,
    /// Reduce `target` per group.
    Aggregate {
        /// Reduced channel.
        #[serde(default = "default_target")]
        target: String,
        /// `sum`, `mean`, `median`, `min`, `max` or `count`.
        func: String,
    },
    /// Kernel density of x.
    Density {
        /// Gaussian bandwidth; Silverman's rule when unset.
        #[serde(default)]
        bandwidth: Option<f64>,
        /// Evaluation points.
        #[serde(default = "default_density_points")]
        points: usize,
    },
    /// Least-squares line of y on x.
    Regression {
        /// Evaluation points.
        #[serde(default = "default_regression_points")]
        points: usize,
    },
}

fn default_target() -> String {
    "y".to_string()
}
fn default_density_points() -> usize {
    512
}
fn default_regression_points() -> usize {
    80
}

impl StatConfig {
    fn to_stat(&self) -> Result<Stat> {
        Ok(match self {
            StatConfig::Identity => Stat::identity(),
            StatConfig::Bin { bins: Some(_), width: Some(_) } => {
                return Err(Error::invalid("bins", "set either bins or width, not both"));
            }
            StatConfig::Bin { width: Some(w), .. } => Stat::bin_width(*w),
            StatConfig::Bin { bins, .. } => Stat::Bin { channel: Channel::X, bins: Bins::Count(bins.unwrap_or(30)) },
            StatConfig::Count => Stat::count(),
            StatConfig::Aggregate { target, func } => Stat::aggregate(target.parse()?, func.parse::<AggFn>()?),
            StatConfig::Density { bandwidth, points } => Stat::Density { bandwidth: *bandwidth, points: *points },
            StatConfig::Regression { points } => Stat::Regression { points: *points },
        })
    }
}

/// Geometry settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeomConfig {
    /// `point`, `bar`, `interval`, `text`, `line`, `path`, `polygon` or `area`.
    #[serde(default = "default_geom")]
    pub kind: String,

    /// Bar or cap width as a fraction of the x slot.
    #[serde(default)]
    pub width: Option<f64>,
}

fn default_geom() -> String {
    "point".to_string()
}

impl Default for GeomConfig {
    fn default() -> Self {
        Self { kind: default_geom(), width: None }
    }
}

impl GeomConfig {
    fn to_geom(&self) -> Result<Geom> {
        let geom = match self.kind.as_str() {
            "point" => Geom::point(),
            "bar" => Geom::bar(),
            "interval" => Geom::interval(),
            "text" => Geom::text(),
            "line" => Geom::line(),
            "path" => Geom::path(),
            "polygon" => Geom::polygon(),
            "area" => Geom::area(),
            other => return Err(Error::invalid("geom", format!("unknown geometry '{other}'"))),
        };
        Ok(match self.width {
            Some(w) => geom.width(w),
            None => geom,
        })
    }
}

/// Collision modifier settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PositionConfig {
    /// No adjustment.
    #[default]
    Identity,
    /// Stack per x slot.
    Stack,
    /// Split each x slot between groups.
    Dodge {
        /// Fraction of the slot shared by the groups.
        #[serde(default = "default_dodge_width")]
        width: f64,
    },
    /// Deterministic random offsets.
    Jitter {
        /// Horizontal bound in normalized units.
        #[serde(default)]
        width: f64,
        /// Vertical bound in normalized units.
        #[serde(default)]
        height: f64,
        /// Generator seed.
        #[serde(default = "default_seed")]
        seed: u64,
    },
}

fn default_dodge_width() -> f64 {
    0.9
}
fn default_seed() -> u64 {
    42
}

impl PositionConfig {
    fn to_position(&self) -> Position {
        match *self {
            PositionConfig::Identity => Position::identity(),
            PositionConfig::Stack => Position::stack(),
            PositionConfig::Dodge { width } => Position::Dodge { width },
            PositionConfig::Jitter { width, height, seed } => Position::Jitter { width, height, seed },
        }
    }
}

/// Coordinate system settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CoordConfig {
    /// Identity, optionally flipped.
    Cartesian {
        /// Swap the axes.
        #[serde(default)]
        flip: bool,
    },
    /// Angle and radius.
    Polar {
        /// Axis mapped to the angle: `x` or `y`.
        #[serde(default = "default_theta")]
        theta: String,
        /// Inner radius.
        #[serde(default)]
        r_min: f64,
        /// Outer radius.
        #[serde(default = "default_r_max")]
        r_max: f64,
        /// Angle of theta = 0, in radians.
        #[serde(default)]
        start: f64,
        /// `1` counter-clockwise, `-1` clockwise.
        #[serde(default = "default_direction")]
        direction: i8,
    },
}

fn default_theta() -> String {
    "x".to_string()
}
fn default_r_max() -> f64 {
    1.0
}
fn default_direction() -> i8 {
    1
}

impl Default for CoordConfig {
    fn default() -> Self {
        CoordConfig::Cartesian { flip: false }
    }
}

impl CoordConfig {
    fn to_coord(&self) -> Result<Coord> {
        Ok(match self {
            CoordConfig::Cartesian { flip: false } => Coord::cartesian(),
            CoordConfig::Cartesian { flip: true } => Coord::cartesian().flip(),
            CoordConfig::Polar { theta, r_min, r_max, start, direction } => {
                let theta = match theta.as_str() {
                    "x" => Axis::X,
                    "y" => Axis::Y,
                    other => return Err(Error::invalid("theta", format!("theta must be x or y, got '{other}'"))),
                };
                Coord::polar().theta(theta).r_range(*r_min, *r_max).start_angle(*start).direction(*direction)
            }
        })
    }
}

/// Scale overrides for one channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScaleSpec {
    /// Transform name (`identity`, `log10`, `ln`, `log2`, `sqrt`, `asin`, `logit`, `reverse`).
    #[serde(default = "default_transform")]
    pub transform: String,

    /// Explicit continuous domain.
    #[serde(default)]
    pub limits: Option<[f64; 2]>,

    /// Explicit discrete level order.
    #[serde(default)]
    pub levels: Option<Vec<String>>,

    /// Output range.
    #[serde(default)]
    pub range: Option<[f64; 2]>,

    /// Treat numbers as categories.
    #[serde(default)]
    pub discrete: bool,
}

fn default_transform() -> String {
    "identity".to_string()
}

impl Default for ScaleSpec {
    fn default() -> Self {
        Self { transform: default_transform(), limits: None, levels: None, range: None, discrete: false }
    }
}

impl ScaleSpec {
    fn to_config(&self) -> Result<ScaleConfig> {
        Ok(ScaleConfig {
            transform: self.transform.parse::<Transform>()?,
            limits: self.limits.map(|[lo, hi]| (lo, hi)),
            levels: self.levels.clone(),
            range: self.range.map(|[lo, hi]| (lo, hi)),
            discrete: self.discrete,
        })
    }
}

/// Complete plot description.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlotConfig {
    /// Plot title.
    #[serde(default)]
    pub title: Option<String>,

    /// Inline data.
    #[serde(default)]
    pub data: TableConfig,

    /// Channel name to column name.
    #[serde(default)]
    pub aes: BTreeMap<String, String>,

    /// Faceting.
    #[serde(default)]
    pub facet: FacetConfig,

    /// Statistic.
    #[serde(default)]
    pub stat: StatConfig,

    /// Geometry.
    #[serde(default)]
    pub geom: GeomConfig,

    /// Collision modifier.
    #[serde(default)]
    pub position: PositionConfig,

    /// Coordinate system.
    #[serde(default)]
    pub coord: CoordConfig,

    /// `shared` or `free`.
    #[serde(default = "default_sharing")]
    pub sharing: String,

    /// Per-channel scale overrides.
    #[serde(default)]
    pub scales: BTreeMap<String, ScaleSpec>,
}

fn default_sharing() -> String {
    "shared".to_string()
}

impl PlotConfig {
    /// Parses configuration from a YAML string.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        Ok(serde_yaml_ng::from_str(yaml)?)
    }

    /// Loads configuration from a YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml_str(&content)
    }

    /// Serializes the configuration back to YAML.
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml_ng::to_string(self)?)
    }

    /// Build the plot this configuration describes.
    pub fn to_plot(&self) -> Result<Plot> {
        let aes = Aes::from_pairs(self.aes.iter().map(|(channel, column)| (channel.as_str(), VarSpec::column(column))))?;
        let sharing = match self.sharing.as_str() {
            "shared" => ScaleSharing::Shared,
            "free" => ScaleSharing::Free,
            other => return Err(Error::invalid("sharing", format!("unknown scale sharing '{other}'"))),
        };
        let mut plot = Plot::new()
            .data(self.data.to_table()?)
            .aes(aes)
            .facet(self.facet.to_facet()?)
            .stat(self.stat.to_stat()?)
            .geom(self.geom.to_geom()?)
            .position(self.position.to_position())
            .coord(self.coord.to_coord()?)
            .sharing(sharing);
        for (channel, spec) in &self.scales {
            plot = plot.scale(channel.parse()?, spec.to_config()?);
        }
        if let Some(title) = &self.title {
            plot = plot.title(title.clone());
        }
        tracing::debug!(columns = self.data.columns.len(), mappings = self.aes.len(), "plot configured");
        Ok(plot)
    }
}
