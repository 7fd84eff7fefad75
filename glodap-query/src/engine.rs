//! The query engine: applies a resolved spec against the immutable
//! dataset and assembles the ordered, projected result sequence.
//!
//! Both entry points are pure functions of `(dataset, spec)`: no locking,
//! no mutation, no I/O. The dataset handle is pre-sorted (cruises by
//! expocode, samples by expocode/time/depth), so filtering preserves the
//! required output ordering without a sort per request.

use crate::pattern::{Pattern, PatternList};
use crate::spec::{AppendSection, CruiseQuery, Locator, SampleQuery};
use glodap_api::{Cruise, Dataset, PiField, Sample};
use indexmap::IndexMap;
use serde::Serialize;
use serde::ser::SerializeMap;

/// One projected output value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Str(String),
    Int(i64),
    Float(f64),
    /// Nested sub-structure (the cruise `links` section).
    Nested(Record),
}

impl Serialize for Value {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Str(v) => serializer.serialize_str(v),
            Value::Int(v) => serializer.serialize_i64(*v),
            Value::Float(v) => serializer.serialize_f64(*v),
            Value::Nested(record) => record.serialize(serializer),
        }
    }
}

/// One projected output record: insertion-ordered fields.
///
/// Absent optional attributes are simply not present; the projection
/// never emits null placeholders, which is how missing-vs-zero survives
/// serialization.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: IndexMap<String, Value>,
}

impl Record {
    pub fn new() -> Record {
        Record::default()
    }

    pub fn push(&mut self, key: impl Into<String>, value: Value) {
        self.fields.insert(key.into(), value);
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl Serialize for Record {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (key, value) in &self.fields {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

/// Runs a cruise-metadata query. Ascending by expocode; an empty match is
/// a valid empty sequence.
pub fn query_cruises(dataset: &Dataset, query: &CruiseQuery) -> Vec<Record> {
    let project_roles = query.fields.roles();
    // A suppressed projection must not make the PI filter vacuous: the
    // filter then runs against every recognized role.
    let filter_roles: Vec<PiField> = if project_roles.is_empty() {
        PiField::ALL.to_vec()
    } else {
        project_roles.clone()
    };
    let sections = query.append.sections();

    dataset
        .cruises()
        .iter()
        .filter(|cruise| cruise_matches(cruise, query, &filter_roles))
        .map(|cruise| project_cruise(cruise, query, &project_roles, &sections))
        .collect()
}

fn cruise_matches(cruise: &Cruise, query: &CruiseQuery, filter_roles: &[PiField]) -> bool {
    if let Some(patterns) = &query.cruise
        && !cruise_id_matches(patterns, cruise)
    {
        return false;
    }

    // Date containment over leg dates: earliest leg start inside the
    // requested start bound, latest leg end inside the end bound.
    if let Some(start) = query.dates.start
        && !cruise.first_start().is_some_and(|d| d >= start)
    {
        return false;
    }
    if let Some(end) = query.dates.end
        && !cruise.last_end().is_some_and(|d| d <= end)
    {
        return false;
    }

    if let Some(region) = &query.region
        && !cruise
            .region
            .as_deref()
            .is_some_and(|r| region_matches(region, r))
    {
        return false;
    }

    if let Some(ship) = &query.ship
        && !cruise.ship.as_deref().is_some_and(|s| ship.matches(s))
    {
        return false;
    }

    if let Some(measurement) = &query.measurement
        && !cruise
            .measurements
            .as_deref()
            .is_some_and(|m| measurement.matches_within(m))
    {
        return false;
    }

    if let Some(pi) = &query.pi
        && !filter_roles
            .iter()
            .filter_map(|role| cruise.pi.get(role))
            .any(|name| pi.matches_any(name))
    {
        return false;
    }

    true
}

/// Expocode/alias matching: an exact (non-wildcard) pattern must equal the
/// expocode; a wildcard pattern may also match the alias.
fn cruise_id_matches(patterns: &PatternList, cruise: &Cruise) -> bool {
    patterns.patterns().iter().any(|pattern| {
        if pattern.matches(&cruise.expocode) {
            return true;
        }
        pattern.has_wildcard()
            && cruise
                .alias
                .as_deref()
                .is_some_and(|alias| pattern.matches(alias))
    })
}

/// Region matching with the upstream basin alias: the Sea of Okhotsk is
/// catalogued separately but belongs to any Pacific selection.
fn region_matches(pattern: &Pattern, region: &str) -> bool {
    if pattern.matches(region) {
        return true;
    }
    pattern.as_str().starts_with("pacific") && region.to_lowercase().starts_with("sea of okhotsk")
}

fn project_cruise(
    cruise: &Cruise,
    query: &CruiseQuery,
    roles: &[PiField],
    sections: &[AppendSection],
) -> Record {
    let mut record = Record::new();
    record.push("expocode", Value::Str(cruise.expocode.clone()));
    if !cruise.start_dates.is_empty() {
        record.push("start_date", Value::Str(join_dates(&cruise.start_dates)));
    }
    if !cruise.end_dates.is_empty() {
        record.push("end_date", Value::Str(join_dates(&cruise.end_dates)));
    }
    if let Some(region) = &cruise.region {
        record.push("region", Value::Str(region.clone()));
    }
    if let Some(alias) = &cruise.alias {
        record.push("alias", Value::Str(alias.clone()));
    }
    if let Some(ship) = &cruise.ship {
        record.push("ship", Value::Str(ship.clone()));
    }

    for role in roles {
        if let Some(name) = cruise.pi.get(role) {
            record.push(role.column(), Value::Str(name.clone()));
        }
    }

    // The measurement summary is reported only when it was queried.
    if query.measurement.is_some()
        && let Some(measurements) = &cruise.measurements
    {
        record.push("measurements", Value::Str(measurements.clone()));
    }

    let mut links = Record::new();
    for section in sections {
        let value = match section {
            AppendSection::DataFiles => &cruise.links.data_files,
            AppendSection::QcDetails => &cruise.links.qc_details,
            AppendSection::Map => &cruise.links.map,
            AppendSection::MetadataReport => &cruise.links.metadata_report,
            AppendSection::References => &cruise.links.cruise_references,
        };
        if let Some(url) = value {
            links.push(section.column(), Value::Str(url.clone()));
        }
    }
    if !links.is_empty() {
        record.push("links", Value::Nested(links));
    }

    record
}

fn join_dates(dates: &[chrono::NaiveDate]) -> String {
    dates
        .iter()
        .map(|d| d.format("%Y-%m-%d").to_string())
        .collect::<Vec<_>>()
        .join(",")
}

/// Runs a bottle-sample query. Ascending by (expocode, time, depth); an
/// empty match is a valid empty sequence.
pub fn query_samples(dataset: &Dataset, query: &SampleQuery) -> Vec<Record> {
    dataset
        .samples()
        .iter()
        .filter(|sample| sample_matches(sample, query))
        .map(|sample| project_sample(sample, query))
        .collect()
}

fn sample_matches(sample: &Sample, query: &SampleQuery) -> bool {
    match &query.locator {
        Locator::Cruises(codes) => {
            let code = sample.expocode.to_lowercase();
            if codes.binary_search(&code).is_err() {
                return false;
            }
        }
        Locator::Position(filter) => {
            if !filter.matches(sample.longitude, sample.latitude) {
                return false;
            }
        }
    }
    query.depth.contains(sample.depth) && query.time.contains(sample.time)
}

fn project_sample(sample: &Sample, query: &SampleQuery) -> Record {
    let mut record = Record::new();
    record.push("expocode", Value::Str(sample.expocode.clone()));
    if let Some(station) = &sample.station {
        record.push("station", Value::Str(station.clone()));
    }
    if let Some(region) = &sample.region {
        record.push("region", Value::Str(region.clone()));
    }
    if let Some(cast_number) = sample.cast_number {
        record.push("cast_number", Value::Int(cast_number as i64));
    }
    if let Some(year) = sample.year {
        record.push("year", Value::Int(year as i64));
    }
    if let Some(month) = sample.month {
        record.push("month", Value::Int(month as i64));
    }
    record.push("latitude", Value::Float(sample.latitude));
    record.push("longitude", Value::Float(sample.longitude));
    if let Some(bottom_depth) = sample.bottom_depth {
        record.push("bottomdepth", Value::Float(bottom_depth));
    }
    if let Some(max_samp_depth) = sample.max_samp_depth {
        record.push("maxsampdepth", Value::Float(max_samp_depth));
    }
    if let Some(bottle) = sample.bottle {
        record.push("bottle", Value::Int(bottle as i64));
    }
    if let Some(pressure) = sample.pressure {
        record.push("pressure", Value::Float(pressure));
    }
    record.push("depth", Value::Float(sample.depth));
    record.push(
        "datetime",
        Value::Str(sample.time.format("%Y-%m-%dT%H:%M:%S").to_string()),
    );
    if query.with_doi
        && let Some(doi) = &sample.doi
    {
        record.push("doi", Value::Str(doi.clone()));
    }

    // Exactly the resolved variables, each only when recorded on this
    // sample. A stored 0.0 is a value; an absent variable is no column.
    for name in &query.variables {
        if let Some(measurement) = sample.variables.get(name) {
            record.push(name.clone(), Value::Float(measurement.value));
            if query.with_woce_flags
                && let Some(flag) = measurement.woce_flag
            {
                record.push(format!("flag_{name}"), Value::Int(flag as i64));
            }
            if query.with_qc_flags
                && let Some(flag) = measurement.qc_flag
            {
                record.push(format!("qc_{name}"), Value::Int(flag as i64));
            }
        }
    }

    record
}
