use chrono::{NaiveDate, NaiveDateTime};
use glodap_api::{AttachmentLinks, Cruise, Dataset, Measurement, Sample};
use glodap_query::engine::{Value, query_samples};
use glodap_query::params::RawParams;
use glodap_query::resolve::resolve_sample_query;
use std::collections::BTreeMap;

fn when(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S").unwrap()
}

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

struct SampleSpec {
    expocode: &'static str,
    lon: f64,
    lat: f64,
    depth: f64,
    time: &'static str,
    vars: Vec<(&'static str, Measurement)>,
}

fn sample(spec: SampleSpec) -> Sample {
    Sample {
        expocode: spec.expocode.to_string(),
        station: Some("5".to_string()),
        region: None,
        cast_number: Some(1),
        year: Some(1991),
        month: Some(6),
        latitude: spec.lat,
        longitude: spec.lon,
        bottom_depth: None,
        max_samp_depth: None,
        bottle: Some(3),
        pressure: Some(spec.depth * 1.01),
        depth: spec.depth,
        time: when(spec.time),
        doi: Some("10.25921/ttgq-n825".to_string()),
        variables: spec
            .vars
            .into_iter()
            .map(|(name, m)| (name.to_string(), m))
            .collect(),
    }
}

fn flagged(value: f64, woce: u8, qc: u8) -> Measurement {
    Measurement {
        value,
        woce_flag: Some(woce),
        qc_flag: Some(qc),
    }
}

fn fixture() -> Dataset {
    let samples = vec![
        // 21OR: three depths across two casts, one variable stored as 0.
        sample(SampleSpec {
            expocode: "21OR19910626",
            lon: 120.0,
            lat: 22.0,
            depth: 10.0,
            time: "1991-06-27T06:00:00",
            vars: vec![
                ("temperature", flagged(24.1, 2, 1)),
                ("salinity", Measurement::new(0.0)),
                ("cfc11", flagged(1.7, 2, 1)),
            ],
        }),
        sample(SampleSpec {
            expocode: "21OR19910626",
            lon: 120.0,
            lat: 22.0,
            depth: 500.0,
            time: "1991-06-27T06:00:00",
            vars: vec![
                ("temperature", Measurement::new(8.3)),
                ("oxygen", flagged(145.0, 3, 0)),
            ],
        }),
        sample(SampleSpec {
            expocode: "21OR19910626",
            lon: 121.0,
            lat: 23.5,
            depth: 25.0,
            time: "1991-06-28T09:30:00",
            vars: vec![("temperature", Measurement::new(23.0))],
        }),
        // Other cruise, outside the 21OR box.
        sample(SampleSpec {
            expocode: "316N19871123",
            lon: -150.0,
            lat: -10.0,
            depth: 1000.0,
            time: "1987-12-20T12:00:00",
            vars: vec![
                ("temperature", Measurement::new(3.9)),
                ("cfc12", Measurement::new(0.4)),
            ],
        }),
    ];
    Dataset::new(vec![cruise("21OR19910626"), cruise("316N19871123")], samples).unwrap()
}

fn run(dataset: &Dataset, pairs: &[(&str, &str)]) -> Vec<glodap_query::Record> {
    let params: RawParams = pairs.iter().copied().collect();
    let query = resolve_sample_query(&params, dataset.variables()).unwrap();
    query_samples(dataset, &query)
}

#[test]
fn cruise_locator_restricts_to_that_cruise() {
    let dataset = fixture();
    let records = run(&dataset, &[("cruise", "21OR19910626")]);
    assert_eq!(records.len(), 3);
    for record in &records {
        assert_eq!(
            record.get("expocode"),
            Some(&Value::Str("21OR19910626".to_string()))
        );
    }
}

#[test]
fn results_are_ordered_by_expocode_time_depth() {
    let dataset = fixture();
    let records = run(&dataset, &[("cruise", "21or19910626,316n19871123")]);
    let keys: Vec<(String, String, f64)> = records
        .iter()
        .map(|r| {
            let Some(Value::Str(code)) = r.get("expocode") else { panic!() };
            let Some(Value::Str(time)) = r.get("datetime") else { panic!() };
            let Some(Value::Float(depth)) = r.get("depth") else { panic!() };
            (code.clone(), time.clone(), *depth)
        })
        .collect();
    assert_eq!(
        keys,
        vec![
            ("21OR19910626".into(), "1991-06-27T06:00:00".into(), 10.0),
            ("21OR19910626".into(), "1991-06-27T06:00:00".into(), 500.0),
            ("21OR19910626".into(), "1991-06-28T09:30:00".into(), 25.0),
            ("316N19871123".into(), "1987-12-20T12:00:00".into(), 1000.0),
        ]
    );
}

#[test]
fn bounding_box_is_inclusive_on_edges() {
    let dataset = fixture();
    // Box whose corner sits exactly on a sample position.
    let records = run(
        &dataset,
        &[("lon0", "120"), ("lat0", "22"), ("lon1", "120.5"), ("lat1", "23")],
    );
    assert_eq!(records.len(), 2);
}

#[test]
fn point_locator_requires_exact_position() {
    let dataset = fixture();
    let records = run(&dataset, &[("lon0", "121"), ("lat0", "23.5")]);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].get("depth"), Some(&Value::Float(25.0)));

    let records = run(&dataset, &[("lon0", "121.01"), ("lat0", "23.5")]);
    assert!(records.is_empty());
}

#[test]
fn depth_range_is_boundary_inclusive() {
    let dataset = fixture();
    let records = run(
        &dataset,
        &[("cruise", "21OR19910626"), ("dep0", "10"), ("dep1", "500")],
    );
    assert_eq!(records.len(), 3);

    let records = run(
        &dataset,
        &[("cruise", "21OR19910626"), ("dep0", "10.1"), ("dep1", "499.9")],
    );
    assert_eq!(records.len(), 1);
}

#[test]
fn time_range_filters_samples() {
    let dataset = fixture();
    let records = run(
        &dataset,
        &[
            ("cruise", "21OR19910626"),
            ("start", "1991-06-28"),
            ("end", "1991-06-29"),
        ],
    );
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].get("depth"), Some(&Value::Float(25.0)));
}

#[test]
fn requested_variables_project_only_when_recorded() {
    let dataset = fixture();
    let records = run(
        &dataset,
        &[("cruise", "21OR19910626"), ("append", "temperature,salinity")],
    );
    assert_eq!(records.len(), 3);

    // Stored zero is a value, not a gap.
    assert_eq!(records[0].get("salinity"), Some(&Value::Float(0.0)));
    // Never-recorded variable is absent entirely, not null.
    assert!(!records[1].contains_key("salinity"));
    assert!(records[1].contains_key("temperature"));
    // Unrequested variables never appear.
    assert!(!records[0].contains_key("cfc11"));
}

#[test]
fn flags_appear_only_when_requested_and_present() {
    let dataset = fixture();
    let records = run(
        &dataset,
        &[
            ("cruise", "21OR19910626"),
            ("append", "temperature,oxygen"),
            ("flag", "true"),
            ("qc", "true"),
        ],
    );
    // First sample's temperature carries both flags.
    assert_eq!(records[0].get("flag_temperature"), Some(&Value::Int(2)));
    assert_eq!(records[0].get("qc_temperature"), Some(&Value::Int(1)));
    // Second sample's temperature has no flags stored: no flag columns.
    assert!(!records[1].contains_key("flag_temperature"));
    assert_eq!(records[1].get("flag_oxygen"), Some(&Value::Int(3)));

    // Without the booleans no flag columns exist at all.
    let records = run(
        &dataset,
        &[("cruise", "21OR19910626"), ("append", "temperature,oxygen")],
    );
    assert!(!records[0].contains_key("flag_temperature"));
    assert!(!records[0].contains_key("qc_temperature"));
}

#[test]
fn wildcard_append_expands_against_vocabulary() {
    let dataset = fixture();
    let records = run(&dataset, &[("cruise", "21OR19910626"), ("append", "cfc*")]);
    assert_eq!(records[0].get("cfc11"), Some(&Value::Float(1.7)));
    assert!(!records[0].contains_key("cfc12"));
    assert!(!records[0].contains_key("temperature"));
}

#[test]
fn doi_is_included_by_default_and_removable() {
    let dataset = fixture();
    let records = run(&dataset, &[("cruise", "21OR19910626")]);
    assert_eq!(
        records[0].get("doi"),
        Some(&Value::Str("10.25921/ttgq-n825".to_string()))
    );

    let records = run(&dataset, &[("cruise", "21OR19910626"), ("doi", "false")]);
    assert!(!records[0].contains_key("doi"));
}

#[test]
fn depth_and_time_ranges_apply_with_cruise_locator() {
    let dataset = fixture();
    let records = run(&dataset, &[("cruise", "21OR19910626"), ("dep1", "100")]);
    assert_eq!(records.len(), 2);
}

#[test]
fn unmatched_query_is_empty_not_error() {
    let dataset = fixture();
    let records = run(&dataset, &[("lon0", "0"), ("lat0", "0")]);
    assert!(records.is_empty());
}

#[test]
fn concurrent_identical_queries_agree() {
    let dataset = fixture();
    let baseline = run(&dataset, &[("cruise", "21OR19910626"), ("append", "*"), ("flag", "1")]);
    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|_| {
                scope.spawn(|| run(&dataset, &[("cruise", "21OR19910626"), ("append", "*"), ("flag", "1")]))
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), baseline);
        }
    });
}

#[test]
fn json_serialization_omits_absent_variables() {
    let dataset = fixture();
    let records = run(
        &dataset,
        &[("cruise", "21OR19910626"), ("append", "temperature,salinity")],
    );
    let json = serde_json::to_value(&records[1]).unwrap();
    let object = json.as_object().unwrap();
    assert!(object.contains_key("temperature"));
    assert!(!object.contains_key("salinity"));
    assert!(!object.values().any(|v| v.is_null()));
}
