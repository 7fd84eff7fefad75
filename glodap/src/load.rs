//! CSV dataset loader.
//!
//! Reads the two flat tables of the GLODAP v2.2023 distribution as
//! prepared for serving: `cruises.csv` (one row per cruise, comma-joined
//! leg dates) and `samples.csv` (one row per bottle, one column per
//! variable with optional `flag_<var>` / `qc_<var>` companions).
//!
//! Missing-value convention: an empty cell or the GLODAP `-9999` sentinel
//! means "not measured" and produces no entry at all; `err_<var>` adjunct
//! columns are never served and are skipped.

use crate::error::{Error, Result};
use chrono::{NaiveDate, NaiveDateTime};
use glodap_api::{AttachmentLinks, Cruise, Dataset, Measurement, PiField, Sample};
use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::path::Path;

const MISSING_SENTINEL: f64 = -9999.0;

/// Loads `cruises.csv` and `samples.csv` from a directory and assembles
/// the validated dataset handle.
pub fn load_dataset(dir: &Path) -> Result<Dataset> {
    let cruises = load_cruises(&dir.join("cruises.csv"))?;
    let samples = load_samples(&dir.join("samples.csv"))?;
    Ok(Dataset::new(cruises, samples)?)
}

/// Column-name → index lookup built from a CSV header, lowercased.
struct Header {
    index: HashMap<String, usize>,
}

impl Header {
    fn from_reader(reader: &mut csv::Reader<File>) -> Result<Header> {
        let index = reader
            .headers()?
            .iter()
            .enumerate()
            .map(|(i, name)| (name.trim().to_lowercase(), i))
            .collect();
        Ok(Header { index })
    }

    fn names(&self) -> impl Iterator<Item = &str> {
        self.index.keys().map(String::as_str)
    }

    /// A trimmed, non-empty, non-sentinel cell.
    fn cell<'r>(&self, row: &'r csv::StringRecord, name: &str) -> Option<&'r str> {
        let value = row.get(*self.index.get(name)?)?.trim();
        if value.is_empty() || value == "-9999" || value == "NA" || value == "NaN" {
            None
        } else {
            Some(value)
        }
    }
}

/// Loads the cruise metadata table.
pub fn load_cruises(path: &Path) -> Result<Vec<Cruise>> {
    let mut reader = csv::Reader::from_reader(File::open(path)?);
    let header = Header::from_reader(&mut reader)?;

    let mut cruises = Vec::new();
    for (line, row) in reader.records().enumerate() {
        let row = row?;
        let expocode = header
            .cell(&row, "expocode")
            .ok_or_else(|| Error::Load(format!("cruises.csv row {}: missing expocode", line + 2)))?
            .to_string();

        let mut pi = BTreeMap::new();
        for role in PiField::ALL {
            if let Some(name) = header.cell(&row, role.column()) {
                pi.insert(role, name.to_string());
            }
        }

        cruises.push(Cruise {
            start_dates: parse_leg_dates(header.cell(&row, "start_date"), &expocode, "start_date")?,
            end_dates: parse_leg_dates(header.cell(&row, "end_date"), &expocode, "end_date")?,
            alias: header.cell(&row, "alias").map(str::to_string),
            region: header.cell(&row, "region").map(str::to_string),
            ship: header.cell(&row, "ship").map(str::to_string),
            pi,
            measurements: header.cell(&row, "measurements").map(str::to_string),
            links: AttachmentLinks {
                data_files: header.cell(&row, "data_files").map(str::to_string),
                qc_details: header.cell(&row, "qc_details").map(str::to_string),
                map: header.cell(&row, "map").map(str::to_string),
                metadata_report: header.cell(&row, "metadata_report").map(str::to_string),
                cruise_references: header.cell(&row, "cruise_references").map(str::to_string),
            },
            expocode,
        });
    }
    Ok(cruises)
}

fn parse_leg_dates(cell: Option<&str>, expocode: &str, column: &str) -> Result<Vec<NaiveDate>> {
    let Some(cell) = cell else {
        return Ok(Vec::new());
    };
    cell.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            NaiveDate::parse_from_str(part, "%Y-%m-%d").map_err(|_| {
                Error::Load(format!("cruise {expocode}: bad {column} date '{part}'"))
            })
        })
        .collect()
}

/// Base sample columns; everything else in the header is a variable or a
/// flag/err companion.
const SAMPLE_BASE: [&str; 15] = [
    "expocode",
    "station",
    "region",
    "cast_number",
    "year",
    "month",
    "latitude",
    "longitude",
    "bottomdepth",
    "maxsampdepth",
    "bottle",
    "pressure",
    "depth",
    "datetime",
    "doi",
];

/// Loads the bottle measurement table.
pub fn load_samples(path: &Path) -> Result<Vec<Sample>> {
    let mut reader = csv::Reader::from_reader(File::open(path)?);
    let header = Header::from_reader(&mut reader)?;

    let variables: Vec<String> = header
        .names()
        .filter(|name| {
            !SAMPLE_BASE.contains(name)
                && !name.starts_with("flag_")
                && !name.starts_with("qc_")
                && !name.starts_with("err_")
        })
        .map(str::to_string)
        .collect();

    let mut samples = Vec::new();
    for (line, row) in reader.records().enumerate() {
        let row = row?;
        let line = line + 2; // 1-based, after the header
        let expocode = header
            .cell(&row, "expocode")
            .ok_or_else(|| Error::Load(format!("samples.csv row {line}: missing expocode")))?
            .to_string();

        let mut sample = Sample {
            latitude: required_f64(&header, &row, "latitude", line)?,
            longitude: required_f64(&header, &row, "longitude", line)?,
            depth: required_f64(&header, &row, "depth", line)?,
            time: required_datetime(&header, &row, line)?,
            station: header.cell(&row, "station").map(str::to_string),
            region: header.cell(&row, "region").map(str::to_string),
            cast_number: optional_int(&header, &row, "cast_number", line)?,
            year: optional_int(&header, &row, "year", line)?,
            month: optional_int(&header, &row, "month", line)?,
            bottom_depth: optional_f64(&header, &row, "bottomdepth", line)?,
            max_samp_depth: optional_f64(&header, &row, "maxsampdepth", line)?,
            bottle: optional_int(&header, &row, "bottle", line)?,
            pressure: optional_f64(&header, &row, "pressure", line)?,
            doi: header.cell(&row, "doi").map(str::to_string),
            variables: BTreeMap::new(),
            expocode,
        };

        for name in &variables {
            let Some(value) = optional_f64(&header, &row, name, line)? else {
                continue;
            };
            let mut measurement = Measurement::new(value);
            measurement.woce_flag = optional_flag(&header, &row, &format!("flag_{name}"), line)?;
            measurement.qc_flag = optional_flag(&header, &row, &format!("qc_{name}"), line)?;
            sample.variables.insert(name.clone(), measurement);
        }
        samples.push(sample);
    }
    Ok(samples)
}

fn optional_f64(
    header: &Header,
    row: &csv::StringRecord,
    name: &str,
    line: usize,
) -> Result<Option<f64>> {
    let Some(cell) = header.cell(row, name) else {
        return Ok(None);
    };
    let value: f64 = cell
        .parse()
        .map_err(|_| Error::Load(format!("samples.csv row {line}: bad number in '{name}'")))?;
    if value == MISSING_SENTINEL {
        return Ok(None);
    }
    Ok(Some(value))
}

fn required_f64(header: &Header, row: &csv::StringRecord, name: &str, line: usize) -> Result<f64> {
    optional_f64(header, row, name, line)?
        .ok_or_else(|| Error::Load(format!("samples.csv row {line}: missing '{name}'")))
}

fn optional_int<T: std::str::FromStr>(
    header: &Header,
    row: &csv::StringRecord,
    name: &str,
    line: usize,
) -> Result<Option<T>> {
    match header.cell(row, name) {
        None => Ok(None),
        Some(cell) => cell.parse::<T>().map(Some).map_err(|_| {
            Error::Load(format!("samples.csv row {line}: bad integer in '{name}'"))
        }),
    }
}

fn optional_flag(
    header: &Header,
    row: &csv::StringRecord,
    name: &str,
    line: usize,
) -> Result<Option<u8>> {
    match header.cell(row, name) {
        None => Ok(None),
        Some(cell) => cell
            .parse::<u8>()
            .map(Some)
            .map_err(|_| Error::Load(format!("samples.csv row {line}: bad flag in '{name}'"))),
    }
}

fn required_datetime(header: &Header, row: &csv::StringRecord, line: usize) -> Result<NaiveDateTime> {
    let cell = header
        .cell(row, "datetime")
        .ok_or_else(|| Error::Load(format!("samples.csv row {line}: missing 'datetime'")))?;
    NaiveDateTime::parse_from_str(cell, "%Y-%m-%dT%H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(cell, "%Y-%m-%d %H:%M:%S"))
        .map_err(|_| Error::Load(format!("samples.csv row {line}: bad datetime '{cell}'")))
}
