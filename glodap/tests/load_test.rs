use glodap::{Error, load_dataset};
use std::fs;
use std::path::Path;
use tempfile::tempdir;

const CRUISES_HEADER: &str = "expocode,alias,region,ship,start_date,end_date,chief_scientist,carbon_pi,hydrography_pi,oxygen_pi,nutrients_pi,cfc_pi,organics_pi,isotopes_pi,other_pi,measurements,data_files,qc_details,map,metadata_report,cruise_references";

const SAMPLES_HEADER: &str = "expocode,station,region,cast_number,year,month,latitude,longitude,bottomdepth,maxsampdepth,bottle,pressure,depth,datetime,doi,temperature,flag_temperature,qc_temperature,salinity,flag_salinity,oxygen,err_oxygen,cfc11";

fn write_fixture(dir: &Path, cruise_rows: &[&str], sample_rows: &[&str]) {
    let mut cruises = String::from(CRUISES_HEADER);
    for row in cruise_rows {
        cruises.push('\n');
        cruises.push_str(row);
    }
    let mut samples = String::from(SAMPLES_HEADER);
    for row in sample_rows {
        samples.push('\n');
        samples.push_str(row);
    }
    fs::write(dir.join("cruises.csv"), cruises).unwrap();
    fs::write(dir.join("samples.csv"), samples).unwrap();
}

fn default_cruise_row() -> &'static str {
    "21OR19910626,,Pacific Ocean,Ocean Researcher I,1991-06-26,1991-07-10,Kelly,Schlosser,,,,,,,,\"CTD, DIC\",https://example.org/data,,https://example.org/map,,"
}

#[test]
fn loads_cruises_and_samples() {
    let dir = tempdir().unwrap();
    write_fixture(
        dir.path(),
        &[default_cruise_row()],
        &["21OR19910626,5,,1,1991,6,22.0,120.0,,,3,10.1,10,1991-06-27T06:00:00,10.25921/x,24.1,2,1,0.0,2,,-9999,1.7"],
    );
    let dataset = load_dataset(dir.path()).unwrap();

    assert_eq!(dataset.cruises().len(), 1);
    let cruise = &dataset.cruises()[0];
    assert_eq!(cruise.expocode, "21OR19910626");
    assert_eq!(cruise.ship.as_deref(), Some("Ocean Researcher I"));
    assert_eq!(cruise.links.map.as_deref(), Some("https://example.org/map"));
    assert_eq!(cruise.links.qc_details, None);

    assert_eq!(dataset.samples().len(), 1);
    let sample = &dataset.samples()[0];
    assert_eq!(sample.depth, 10.0);
    assert_eq!(sample.doi.as_deref(), Some("10.25921/x"));
}

#[test]
fn vocabulary_excludes_flag_qc_and_err_columns() {
    let dir = tempdir().unwrap();
    write_fixture(
        dir.path(),
        &[default_cruise_row()],
        &["21OR19910626,5,,1,1991,6,22.0,120.0,,,3,10.1,10,1991-06-27T06:00:00,,24.1,2,1,0.0,2,,-9999,1.7"],
    );
    let dataset = load_dataset(dir.path()).unwrap();
    assert_eq!(
        dataset.variables(),
        ["cfc11", "salinity", "temperature"]
    );
}

#[test]
fn empty_and_sentinel_cells_are_missing_values() {
    let dir = tempdir().unwrap();
    write_fixture(
        dir.path(),
        &[default_cruise_row()],
        // oxygen empty, salinity -9999, cfc11 empty: all missing.
        &["21OR19910626,5,,1,1991,6,22.0,120.0,,,4,505,500,1991-06-27T06:00:00,,8.3,2,,-9999,,,3.0,"],
    );
    let dataset = load_dataset(dir.path()).unwrap();
    let sample = &dataset.samples()[0];
    assert!(!sample.variables.contains_key("salinity"));
    assert!(!sample.variables.contains_key("oxygen"));
    assert!(!sample.variables.contains_key("cfc11"));

    let temperature = sample.variables.get("temperature").unwrap();
    assert_eq!(temperature.value, 8.3);
    assert_eq!(temperature.woce_flag, Some(2));
    assert_eq!(temperature.qc_flag, None);
}

#[test]
fn stored_zero_survives_as_value() {
    let dir = tempdir().unwrap();
    write_fixture(
        dir.path(),
        &[default_cruise_row()],
        &["21OR19910626,5,,1,1991,6,22.0,120.0,,,3,10.1,10,1991-06-27T06:00:00,,24.1,2,1,0.0,2,,,"],
    );
    let dataset = load_dataset(dir.path()).unwrap();
    let salinity = dataset.samples()[0].variables.get("salinity").unwrap();
    assert_eq!(salinity.value, 0.0);
    assert_eq!(salinity.woce_flag, Some(2));
}

#[test]
fn multi_leg_dates_parse_from_comma_joined_cells() {
    let dir = tempdir().unwrap();
    write_fixture(
        dir.path(),
        &["49HH19910813,,North Pacific,Hakuho Maru,\"1991-08-13,1991-09-17\",\"1991-09-01,1991-10-02\",,,,,,,,,,,,,,,"],
        &[],
    );
    let dataset = load_dataset(dir.path()).unwrap();
    let cruise = &dataset.cruises()[0];
    assert_eq!(cruise.start_dates.len(), 2);
    assert_eq!(cruise.end_dates.len(), 2);
    assert_eq!(cruise.first_start().unwrap().to_string(), "1991-08-13");
    assert_eq!(cruise.last_end().unwrap().to_string(), "1991-10-02");
}

#[test]
fn orphan_sample_fails_the_load() {
    let dir = tempdir().unwrap();
    write_fixture(
        dir.path(),
        &[default_cruise_row()],
        &["316N19871123,5,,1,1987,12,-10.0,-150.0,,,3,,1000,1987-12-20T12:00:00,,3.9,,,,,,,"],
    );
    let err = load_dataset(dir.path()).unwrap_err();
    assert!(matches!(err, Error::Load(_)), "unexpected error: {err:?}");
}

#[test]
fn malformed_leg_date_fails_the_load() {
    let dir = tempdir().unwrap();
    write_fixture(
        dir.path(),
        &["21OR19910626,,Pacific Ocean,Ocean Researcher I,June 26 1991,1991-07-10,,,,,,,,,,,,,,,"],
        &[],
    );
    let err = load_dataset(dir.path()).unwrap_err();
    assert!(matches!(err, Error::Load(_)), "unexpected error: {err:?}");
}

#[test]
fn malformed_sample_datetime_fails_the_load() {
    let dir = tempdir().unwrap();
    write_fixture(
        dir.path(),
        &[default_cruise_row()],
        &["21OR19910626,5,,1,1991,6,22.0,120.0,,,3,10.1,10,yesterday,,24.1,,,,,,,"],
    );
    let err = load_dataset(dir.path()).unwrap_err();
    assert!(matches!(err, Error::Load(_)), "unexpected error: {err:?}");
}
