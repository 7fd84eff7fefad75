//! Data model for the GLODAP v2.2023 query service.
//!
//! Two read-only collections back every query: cruise metadata (one record
//! per expedition) and discrete bottle samples (one record per water
//! sample). Both are loaded once at startup and never mutated while
//! serving; [`Dataset`] is the validated, immutable handle that the query
//! engine borrows.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Recognized PI (principal investigator) roles of the GLODAP cruise table.
///
/// Each role maps to one output column of the cruise endpoint and parses
/// from the short token used in the `field` query parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PiField {
    Chief,
    Carbon,
    Hydrography,
    Oxygen,
    Nutrients,
    Cfc,
    Organics,
    Isotopes,
    Other,
}

impl PiField {
    /// All roles, in cruise-table column order.
    pub const ALL: [PiField; 9] = [
        PiField::Chief,
        PiField::Carbon,
        PiField::Hydrography,
        PiField::Oxygen,
        PiField::Nutrients,
        PiField::Cfc,
        PiField::Organics,
        PiField::Isotopes,
        PiField::Other,
    ];

    /// Parses the short query token (`chief`, `carbon`, ...). Case-insensitive.
    pub fn parse(token: &str) -> Option<PiField> {
        match token.to_ascii_lowercase().as_str() {
            "chief" => Some(PiField::Chief),
            "carbon" => Some(PiField::Carbon),
            "hydrography" => Some(PiField::Hydrography),
            "oxygen" => Some(PiField::Oxygen),
            "nutrients" => Some(PiField::Nutrients),
            "cfc" => Some(PiField::Cfc),
            "organics" => Some(PiField::Organics),
            "isotopes" => Some(PiField::Isotopes),
            "other" => Some(PiField::Other),
            _ => None,
        }
    }

    /// Output column name (`chief_scientist`, `carbon_pi`, ...).
    pub fn column(&self) -> &'static str {
        match self {
            PiField::Chief => "chief_scientist",
            PiField::Carbon => "carbon_pi",
            PiField::Hydrography => "hydrography_pi",
            PiField::Oxygen => "oxygen_pi",
            PiField::Nutrients => "nutrients_pi",
            PiField::Cfc => "cfc_pi",
            PiField::Organics => "organics_pi",
            PiField::Isotopes => "isotopes_pi",
            PiField::Other => "other_pi",
        }
    }
}

/// Optional link attachments of a cruise record: supporting documents
/// published alongside the cruise table. Any subset may be present.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttachmentLinks {
    pub data_files: Option<String>,
    pub qc_details: Option<String>,
    pub map: Option<String>,
    pub metadata_report: Option<String>,
    pub cruise_references: Option<String>,
}

/// One cruise metadata record.
///
/// `start_dates` / `end_dates` are parallel per-leg date lists: most
/// cruises have a single leg, multi-leg cruises one date pair per leg.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cruise {
    /// Unique expedition code; join key to sample records.
    pub expocode: String,
    pub alias: Option<String>,
    pub region: Option<String>,
    pub ship: Option<String>,
    pub start_dates: Vec<NaiveDate>,
    pub end_dates: Vec<NaiveDate>,
    /// Sparse PI assignments; roles without a named PI are absent.
    pub pi: BTreeMap<PiField, String>,
    /// Summary of measurement types taken on the cruise (e.g. "CTD, DIC").
    pub measurements: Option<String>,
    pub links: AttachmentLinks,
}

impl Cruise {
    /// Earliest leg start date, if any leg dates are recorded.
    pub fn first_start(&self) -> Option<NaiveDate> {
        self.start_dates.iter().min().copied()
    }

    /// Latest leg end date, if any leg dates are recorded.
    pub fn last_end(&self) -> Option<NaiveDate> {
        self.end_dates.iter().max().copied()
    }
}

/// One measured value of a named variable, with its optional quality flags.
///
/// A variable never recorded for a sample has no `Measurement` at all;
/// a recorded value of `0.0` is a real measurement. The distinction is
/// structural and must survive every projection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    pub value: f64,
    /// WOCE quality flag (World Ocean Circulation Experiment convention).
    pub woce_flag: Option<u8>,
    /// Secondary QC flag, distinct from the WOCE flag.
    pub qc_flag: Option<u8>,
}

impl Measurement {
    pub fn new(value: f64) -> Measurement {
        Measurement {
            value,
            woce_flag: None,
            qc_flag: None,
        }
    }
}

/// One discrete bottle sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Parent cruise; must reference an existing [`Cruise`].
    pub expocode: String,
    pub station: Option<String>,
    pub region: Option<String>,
    pub cast_number: Option<i32>,
    pub year: Option<i32>,
    pub month: Option<u32>,
    pub latitude: f64,
    pub longitude: f64,
    pub bottom_depth: Option<f64>,
    pub max_samp_depth: Option<f64>,
    pub bottle: Option<i32>,
    pub pressure: Option<f64>,
    /// Sampling depth in meters.
    pub depth: f64,
    /// Collection date and time.
    pub time: NaiveDateTime,
    /// DOI of the source data product, for citation.
    pub doi: Option<String>,
    /// Sparse measured variables, keyed by lowercase variable name.
    pub variables: BTreeMap<String, Measurement>,
}

/// Errors detected while assembling a [`Dataset`].
#[derive(Debug)]
pub enum DatasetError {
    /// Two cruise records share an expocode.
    DuplicateExpocode(String),
    /// A sample references an expocode with no cruise record.
    OrphanSample { expocode: String },
    /// A cruise record has mismatched leg start/end date lists.
    UnbalancedLegDates { expocode: String },
}

impl std::fmt::Display for DatasetError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DatasetError::DuplicateExpocode(code) => {
                write!(f, "duplicate cruise expocode: {code}")
            }
            DatasetError::OrphanSample { expocode } => {
                write!(f, "sample references unknown cruise: {expocode}")
            }
            DatasetError::UnbalancedLegDates { expocode } => {
                write!(f, "cruise {expocode} has unequal start/end leg date counts")
            }
        }
    }
}

impl std::error::Error for DatasetError {}

/// The immutable dataset handle: both collections, validated and sorted,
/// plus the derived variable vocabulary.
///
/// Construction is the single place the data-model invariants are checked;
/// afterwards the handle is shared by reference across any number of
/// concurrent queries. Sorting happens here so the query engine is a
/// stable filter over pre-ordered collections.
#[derive(Debug, Clone)]
pub struct Dataset {
    cruises: Vec<Cruise>,
    samples: Vec<Sample>,
    variables: Vec<String>,
}

impl Dataset {
    /// Validates and assembles a dataset.
    ///
    /// Checks expocode uniqueness, sample-to-cruise referential integrity,
    /// and leg-date balance; sorts cruises by expocode and samples by
    /// (expocode, time, depth); collects the sorted union of variable
    /// names as the vocabulary.
    pub fn new(mut cruises: Vec<Cruise>, mut samples: Vec<Sample>) -> Result<Dataset, DatasetError> {
        let mut codes = BTreeSet::new();
        for cruise in &cruises {
            if !codes.insert(cruise.expocode.to_ascii_lowercase()) {
                return Err(DatasetError::DuplicateExpocode(cruise.expocode.clone()));
            }
            if cruise.start_dates.len() != cruise.end_dates.len() {
                return Err(DatasetError::UnbalancedLegDates {
                    expocode: cruise.expocode.clone(),
                });
            }
        }

        let mut variables = BTreeSet::new();
        for sample in &samples {
            if !codes.contains(&sample.expocode.to_ascii_lowercase()) {
                return Err(DatasetError::OrphanSample {
                    expocode: sample.expocode.clone(),
                });
            }
            variables.extend(sample.variables.keys().cloned());
        }

        cruises.sort_by(|a, b| a.expocode.cmp(&b.expocode));
        samples.sort_by(|a, b| {
            a.expocode
                .cmp(&b.expocode)
                .then(a.time.cmp(&b.time))
                .then(a.depth.total_cmp(&b.depth))
        });

        Ok(Dataset {
            cruises,
            samples,
            variables: variables.into_iter().collect(),
        })
    }

    /// Cruise records, ascending by expocode.
    pub fn cruises(&self) -> &[Cruise] {
        &self.cruises
    }

    /// Sample records, ascending by (expocode, time, depth).
    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    /// Sorted vocabulary of every variable name seen in the samples.
    pub fn variables(&self) -> &[String] {
        &self.variables
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn cruise(expocode: &str) -> Cruise {
        Cruise {
            expocode: expocode.to_string(),
            alias: None,
            region: None,
            ship: None,
            start_dates: vec![NaiveDate::from_ymd_opt(1991, 6, 26).unwrap()],
            end_dates: vec![NaiveDate::from_ymd_opt(1991, 7, 10).unwrap()],
            pi: BTreeMap::new(),
            measurements: None,
            links: AttachmentLinks::default(),
        }
    }

    fn sample(expocode: &str, depth: f64) -> Sample {
        Sample {
            expocode: expocode.to_string(),
            station: None,
            region: None,
            cast_number: None,
            year: Some(1991),
            month: Some(6),
            latitude: 10.0,
            longitude: 120.0,
            bottom_depth: None,
            max_samp_depth: None,
            bottle: None,
            pressure: None,
            depth,
            time: NaiveDate::from_ymd_opt(1991, 6, 27)
                .unwrap()
                .and_hms_opt(6, 0, 0)
                .unwrap(),
            doi: None,
            variables: BTreeMap::new(),
        }
    }

    #[test]
    fn duplicate_expocode_rejected() {
        let err = Dataset::new(vec![cruise("A"), cruise("a")], vec![]).unwrap_err();
        assert!(matches!(err, DatasetError::DuplicateExpocode(_)));
    }

    #[test]
    fn orphan_sample_rejected() {
        let err = Dataset::new(vec![cruise("A")], vec![sample("B", 5.0)]).unwrap_err();
        assert!(matches!(err, DatasetError::OrphanSample { .. }));
    }

    #[test]
    fn samples_sorted_by_expocode_time_depth() {
        let ds = Dataset::new(
            vec![cruise("A"), cruise("B")],
            vec![sample("B", 5.0), sample("A", 100.0), sample("A", 2.0)],
        )
        .unwrap();
        let order: Vec<(String, f64)> = ds
            .samples()
            .iter()
            .map(|s| (s.expocode.clone(), s.depth))
            .collect();
        assert_eq!(
            order,
            vec![
                ("A".to_string(), 2.0),
                ("A".to_string(), 100.0),
                ("B".to_string(), 5.0)
            ]
        );
    }

    #[test]
    fn vocabulary_is_sorted_union() {
        let mut s1 = sample("A", 5.0);
        s1.variables.insert("salinity".into(), Measurement::new(35.0));
        let mut s2 = sample("A", 10.0);
        s2.variables.insert("cfc11".into(), Measurement::new(1.2));
        let ds = Dataset::new(vec![cruise("A")], vec![s1, s2]).unwrap();
        assert_eq!(ds.variables(), ["cfc11", "salinity"]);
    }
}
