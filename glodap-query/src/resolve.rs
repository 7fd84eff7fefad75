//! The filter resolver: raw string parameters in, typed query spec out.
//!
//! All validation happens here, fail-fast, so the engine never sees
//! malformed input. Every failure names the offending parameter; nothing
//! is silently coerced to a default that would change result semantics.

use crate::error::{Error, Result};
use crate::params::RawParams;
use crate::pattern::{Pattern, PatternList};
use crate::spec::{
    AppendSection, AppendSelection, BoundingBox, CruiseQuery, DateRange, DepthRange,
    FieldSelection, Locator, OutputFormat, SampleQuery, SpatialFilter, TimeRange,
};
use chrono::{NaiveDate, NaiveDateTime};
use glodap_api::PiField;
use std::collections::BTreeSet;

/// Resolves the parameters of a cruise-metadata query.
pub fn resolve_cruise_query(params: &RawParams) -> Result<CruiseQuery> {
    let start = parse_opt_date(params, "start")?;
    let end = parse_opt_date(params, "end")?;
    if let (Some(s), Some(e)) = (start, end)
        && s > e
    {
        return Err(Error::InvalidRange {
            param: "start".to_string(),
            reason: format!("start date {s} is after end date {e}"),
        });
    }

    let field_given = params.get("field").is_some();
    let mut fields = resolve_field_selection(params.get("field"))?;

    // `pi=false` both drops the PI filter and, unless `field` says
    // otherwise, suppresses the PI columns (original service behavior).
    let pi = match params.get("pi").map(str::trim) {
        None | Some("") => None,
        Some(raw) if raw.eq_ignore_ascii_case("false") => {
            if !field_given {
                fields = FieldSelection::Suppressed;
            }
            None
        }
        Some(raw) => Some(PatternList::parse(raw)).filter(|l| !l.is_empty()),
    };

    Ok(CruiseQuery {
        cruise: parse_opt_pattern_list(params.get("cruise")),
        dates: DateRange { start, end },
        pi,
        fields,
        region: parse_opt_pattern(params.get("region")),
        ship: parse_opt_pattern(params.get("ship")),
        measurement: parse_opt_pattern(params.get("measurement"))
            .filter(|p| p.as_str() != "false"),
        append: resolve_append_selection(params.get("append"))?,
        format: resolve_format(params.get("format"))?,
    })
}

/// Resolves the parameters of a bottle-sample query.
///
/// `vocabulary` is the dataset's known variable list (lowercase, sorted),
/// used to expand and validate the `append` parameter.
pub fn resolve_sample_query(params: &RawParams, vocabulary: &[String]) -> Result<SampleQuery> {
    let locator = resolve_locator(params)?;

    let dep0 = parse_opt_f64(params, "dep0")?;
    let dep1 = parse_opt_f64(params, "dep1")?;
    if let (Some(d0), Some(d1)) = (dep0, dep1)
        && d0 > d1
    {
        return Err(Error::InvalidRange {
            param: "dep0".to_string(),
            reason: format!("dep0 ({d0}) is greater than dep1 ({d1})"),
        });
    }

    let start = parse_opt_datetime(params, "start")?;
    let end = parse_opt_datetime(params, "end")?;
    if let (Some(s), Some(e)) = (start, end)
        && s > e
    {
        return Err(Error::InvalidRange {
            param: "start".to_string(),
            reason: format!("start {s} is after end {e}"),
        });
    }

    Ok(SampleQuery {
        locator,
        depth: DepthRange {
            min: dep0,
            max: dep1,
        },
        time: TimeRange { start, end },
        variables: resolve_variables(params.get("append"), vocabulary)?,
        with_woce_flags: parse_opt_bool(params, "flag")?.unwrap_or(false),
        with_qc_flags: parse_opt_bool(params, "qc")?.unwrap_or(false),
        with_doi: parse_opt_bool(params, "doi")?.unwrap_or(true),
        format: resolve_format(params.get("format"))?,
    })
}

/// Locator rule: a non-empty cruise set wins; otherwise lon0/lat0 must
/// both be present. Neither is `MissingRequiredLocator`.
fn resolve_locator(params: &RawParams) -> Result<Locator> {
    let cruises: BTreeSet<String> = params
        .get("cruise")
        .unwrap_or("")
        .split(',')
        .map(|c| c.trim().to_lowercase())
        .filter(|c| !c.is_empty())
        .collect();
    if !cruises.is_empty() {
        return Ok(Locator::Cruises(cruises.into_iter().collect()));
    }

    let lon0 = parse_opt_f64(params, "lon0")?;
    let lat0 = parse_opt_f64(params, "lat0")?;
    let (Some(lon0), Some(lat0)) = (lon0, lat0) else {
        return Err(Error::MissingRequiredLocator);
    };
    check_latitude("lat0", lat0)?;

    let lon1 = parse_opt_f64(params, "lon1")?;
    let lat1 = parse_opt_f64(params, "lat1")?;
    let filter = match (lon1, lat1) {
        (Some(lon1), Some(lat1)) => {
            check_latitude("lat1", lat1)?;
            // Corner order is geometry, not semantics: normalize.
            SpatialFilter::Box(BoundingBox {
                lon_min: lon0.min(lon1),
                lat_min: lat0.min(lat1),
                lon_max: lon0.max(lon1),
                lat_max: lat0.max(lat1),
            })
        }
        (None, None) => SpatialFilter::Point {
            lon: lon0,
            lat: lat0,
        },
        (Some(_), None) => {
            return Err(Error::InvalidRange {
                param: "lat1".to_string(),
                reason: "lon1 given without lat1".to_string(),
            });
        }
        (None, Some(_)) => {
            return Err(Error::InvalidRange {
                param: "lon1".to_string(),
                reason: "lat1 given without lon1".to_string(),
            });
        }
    };
    Ok(Locator::Position(filter))
}

/// Expands the sample `append` list against the variable vocabulary.
///
/// `*` / `all` select everything; wildcard tokens expand (possibly to
/// nothing); a literal token outside the vocabulary is an error.
fn resolve_variables(raw: Option<&str>, vocabulary: &[String]) -> Result<Vec<String>> {
    let Some(raw) = raw else {
        return Ok(Vec::new());
    };

    let mut selected = BTreeSet::new();
    for token in raw.split(',') {
        let token = token.trim().to_lowercase();
        if token.is_empty() {
            continue;
        }
        if token == "*" || token == "all" {
            selected.extend(vocabulary.iter().cloned());
            continue;
        }
        if token.contains('*') {
            let pattern = Pattern::compile(&token);
            selected.extend(vocabulary.iter().filter(|v| pattern.matches(v)).cloned());
        } else if let Some(known) = vocabulary.iter().find(|v| v.as_str() == token) {
            selected.insert(known.clone());
        } else {
            return Err(Error::UnknownVariable { name: token });
        }
    }
    Ok(selected.into_iter().collect())
}

fn resolve_field_selection(raw: Option<&str>) -> Result<FieldSelection> {
    let Some(raw) = raw else {
        return Ok(FieldSelection::All);
    };
    let tokens: Vec<String> = raw
        .split(',')
        .map(|t| t.trim().to_lowercase())
        .filter(|t| !t.is_empty())
        .collect();
    if tokens.is_empty() || tokens.iter().any(|t| t == "all") {
        return Ok(FieldSelection::All);
    }
    if tokens.iter().any(|t| t == "false") {
        return Ok(FieldSelection::Suppressed);
    }

    let mut fields = Vec::new();
    for token in tokens {
        let field = PiField::parse(&token).ok_or_else(|| Error::UnknownPiField {
            token: token.clone(),
        })?;
        if !fields.contains(&field) {
            fields.push(field);
        }
    }
    Ok(FieldSelection::Explicit(fields))
}

fn resolve_append_selection(raw: Option<&str>) -> Result<AppendSelection> {
    // The cruise endpoint appends every section by default.
    let Some(raw) = raw else {
        return Ok(AppendSelection::All);
    };
    let tokens: Vec<String> = raw
        .split(',')
        .map(|t| t.trim().to_lowercase())
        .filter(|t| !t.is_empty())
        .collect();
    if tokens.is_empty() || tokens.iter().any(|t| t == "*" || t == "all") {
        return Ok(AppendSelection::All);
    }
    if tokens.iter().any(|t| t == "false") {
        return Ok(AppendSelection::None);
    }

    let mut sections = Vec::new();
    for token in tokens {
        let section = AppendSection::parse(&token).ok_or_else(|| Error::UnknownAppendToken {
            token: token.clone(),
        })?;
        if !sections.contains(&section) {
            sections.push(section);
        }
    }
    Ok(AppendSelection::Explicit(sections))
}

fn resolve_format(raw: Option<&str>) -> Result<OutputFormat> {
    match raw.map(str::trim) {
        None | Some("") => Ok(OutputFormat::Json),
        Some(value) if value.eq_ignore_ascii_case("json") => Ok(OutputFormat::Json),
        Some(value) if value.eq_ignore_ascii_case("csv") => Ok(OutputFormat::Csv),
        Some(value) => Err(Error::UnknownFormat {
            value: value.to_string(),
        }),
    }
}

fn check_latitude(param: &str, lat: f64) -> Result<()> {
    if !(-90.0..=90.0).contains(&lat) {
        return Err(Error::InvalidRange {
            param: param.to_string(),
            reason: format!("latitude {lat} outside [-90, 90]"),
        });
    }
    Ok(())
}

fn parse_opt_pattern(raw: Option<&str>) -> Option<Pattern> {
    raw.map(Pattern::compile).filter(|p| !p.as_str().is_empty())
}

fn parse_opt_pattern_list(raw: Option<&str>) -> Option<PatternList> {
    raw.map(PatternList::parse).filter(|l| !l.is_empty())
}

fn parse_opt_f64(params: &RawParams, key: &str) -> Result<Option<f64>> {
    match params.get(key).map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => value.parse::<f64>().map(Some).map_err(|_| Error::InvalidNumber {
            param: key.to_string(),
            value: value.to_string(),
        }),
    }
}

fn parse_opt_bool(params: &RawParams, key: &str) -> Result<Option<bool>> {
    let Some(value) = params.get(key).map(str::trim).filter(|v| !v.is_empty()) else {
        return Ok(None);
    };
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(Some(true)),
        "false" | "0" | "no" => Ok(Some(false)),
        _ => Err(Error::InvalidBool {
            param: key.to_string(),
            value: value.to_string(),
        }),
    }
}

fn parse_opt_date(params: &RawParams, key: &str) -> Result<Option<NaiveDate>> {
    match params.get(key).map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => NaiveDate::parse_from_str(value, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| Error::InvalidDateFormat {
                param: key.to_string(),
                value: value.to_string(),
            }),
    }
}

fn parse_opt_datetime(params: &RawParams, key: &str) -> Result<Option<NaiveDateTime>> {
    let Some(value) = params.get(key).map(str::trim).filter(|v| !v.is_empty()) else {
        return Ok(None);
    };
    if let Ok(dt) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S") {
        return Ok(Some(dt));
    }
    // A bare date means midnight at the start of that day.
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map(|d| d.and_hms_opt(0, 0, 0))
        .map_err(|_| Error::InvalidDateFormat {
            param: key.to_string(),
            value: value.to_string(),
        })
}
