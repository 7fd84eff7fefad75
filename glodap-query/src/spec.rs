//! Typed query specifications: the resolved form of one request.
//!
//! A spec is a conjunction of predicates plus the requested projection and
//! output format. Specs are produced by [`crate::resolve`] and consumed by
//! [`crate::engine`]; constructing one by hand is the test fixture path.

use crate::pattern::{Pattern, PatternList};
use chrono::{NaiveDate, NaiveDateTime};
use glodap_api::PiField;
use serde::{Deserialize, Serialize};

/// Requested serialization of the result sequence. Rendering itself is the
/// caller's concern; the engine only carries the choice through.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputFormat {
    #[default]
    Json,
    Csv,
}

/// Inclusive date range; either end may be unbounded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateRange {
    pub fn is_unbounded(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }
}

/// Inclusive datetime range; either end may be unbounded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: Option<NaiveDateTime>,
    pub end: Option<NaiveDateTime>,
}

impl TimeRange {
    pub fn contains(&self, t: NaiveDateTime) -> bool {
        self.start.is_none_or(|s| t >= s) && self.end.is_none_or(|e| t <= e)
    }
}

/// Inclusive depth range in meters; either end may be unbounded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DepthRange {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl DepthRange {
    pub fn contains(&self, depth: f64) -> bool {
        self.min.is_none_or(|m| depth >= m) && self.max.is_none_or(|m| depth <= m)
    }
}

/// Rectangular lon/lat region, inclusive on all edges. Corners are
/// normalized at resolution time so `lon_min <= lon_max` and
/// `lat_min <= lat_max` always hold.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub lon_min: f64,
    pub lat_min: f64,
    pub lon_max: f64,
    pub lat_max: f64,
}

impl BoundingBox {
    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        lon >= self.lon_min && lon <= self.lon_max && lat >= self.lat_min && lat <= self.lat_max
    }
}

/// Spatial predicate of a sample query.
///
/// `Point` is the degenerate form used when only `lon0`/`lat0` are given:
/// exact coordinate equality, which is what the original service did with
/// a lone starting coordinate. A zero-area `Box` behaves identically
/// because the edges are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SpatialFilter {
    Box(BoundingBox),
    Point { lon: f64, lat: f64 },
}

impl SpatialFilter {
    pub fn matches(&self, lon: f64, lat: f64) -> bool {
        match self {
            SpatialFilter::Box(b) => b.contains(lon, lat),
            SpatialFilter::Point { lon: p_lon, lat: p_lat } => lon == *p_lon && lat == *p_lat,
        }
    }
}

/// How a sample query locates its records: an explicit expocode set or a
/// spatial filter. Every sample query carries exactly one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Locator {
    /// Lowercased, deduplicated, sorted expocodes.
    Cruises(Vec<String>),
    Position(SpatialFilter),
}

/// Which PI columns the cruise projection includes.
///
/// Tagged variant replacing the original `field=false` sentinel: `All` is
/// every recognized role, `Suppressed` drops the PI columns entirely,
/// `Explicit` keeps only the listed roles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldSelection {
    All,
    Suppressed,
    Explicit(Vec<PiField>),
}

impl FieldSelection {
    /// The PI roles this selection projects, in column order.
    pub fn roles(&self) -> Vec<PiField> {
        match self {
            FieldSelection::All => PiField::ALL.to_vec(),
            FieldSelection::Suppressed => Vec::new(),
            FieldSelection::Explicit(fields) => fields.clone(),
        }
    }
}

/// One attachment section of a cruise record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AppendSection {
    DataFiles,
    QcDetails,
    Map,
    MetadataReport,
    References,
}

impl AppendSection {
    pub const ALL: [AppendSection; 5] = [
        AppendSection::DataFiles,
        AppendSection::QcDetails,
        AppendSection::Map,
        AppendSection::MetadataReport,
        AppendSection::References,
    ];

    /// Parses an `append` token: the short abbreviation or the full
    /// column name. Case-insensitive.
    pub fn parse(token: &str) -> Option<AppendSection> {
        match token.to_ascii_lowercase().as_str() {
            "file" | "data_files" => Some(AppendSection::DataFiles),
            "qc" | "qc_details" => Some(AppendSection::QcDetails),
            "map" => Some(AppendSection::Map),
            "metadata" | "metadata_report" => Some(AppendSection::MetadataReport),
            "ref" | "cruise_references" => Some(AppendSection::References),
            _ => None,
        }
    }

    /// Output column name inside the nested `links` section.
    pub fn column(&self) -> &'static str {
        match self {
            AppendSection::DataFiles => "data_files",
            AppendSection::QcDetails => "qc_details",
            AppendSection::Map => "map",
            AppendSection::MetadataReport => "metadata_report",
            AppendSection::References => "cruise_references",
        }
    }
}

/// Which attachment sections the cruise projection includes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AppendSelection {
    All,
    None,
    Explicit(Vec<AppendSection>),
}

impl AppendSelection {
    pub fn sections(&self) -> Vec<AppendSection> {
        match self {
            AppendSelection::All => AppendSection::ALL.to_vec(),
            AppendSelection::None => Vec::new(),
            AppendSelection::Explicit(sections) => sections.clone(),
        }
    }
}

/// Resolved spec of one cruise-metadata query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CruiseQuery {
    /// Expocode/alias patterns; `None` means no cruise filter.
    pub cruise: Option<PatternList>,
    pub dates: DateRange,
    /// PI name patterns, OR-matched against the selected PI columns.
    pub pi: Option<PatternList>,
    pub fields: FieldSelection,
    pub region: Option<Pattern>,
    pub ship: Option<Pattern>,
    /// Free-text filter on the cruise measurement summary.
    pub measurement: Option<Pattern>,
    pub append: AppendSelection,
    pub format: OutputFormat,
}

/// Resolved spec of one bottle-sample query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleQuery {
    pub locator: Locator,
    pub depth: DepthRange,
    pub time: TimeRange,
    /// Requested variables, wildcard-expanded against the dataset
    /// vocabulary, sorted and deduplicated.
    pub variables: Vec<String>,
    pub with_woce_flags: bool,
    pub with_qc_flags: bool,
    pub with_doi: bool,
    pub format: OutputFormat,
}
