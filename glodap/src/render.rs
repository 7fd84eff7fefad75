//! Result rendering: pure, lossless serialization of the engine's
//! ordered record sequence.
//!
//! JSON keeps nested sections nested. CSV flattens them into dotted
//! column names (`links.map`); the header is the first-seen key order
//! across the record sequence, which is deterministic because the record
//! order is.

use crate::error::Result;
use glodap_query::engine::{Record, Value};
use glodap_query::spec::OutputFormat;

/// Renders records in the requested format.
pub fn render(records: &[Record], format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => to_json(records),
        OutputFormat::Csv => to_csv(records),
    }
}

/// JSON array of objects, one per record.
pub fn to_json(records: &[Record]) -> Result<String> {
    Ok(serde_json::to_string(records)?)
}

/// Delimited text with a flattened, deterministic header.
pub fn to_csv(records: &[Record]) -> Result<String> {
    let columns = collect_columns(records);

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(&columns)?;
    for record in records {
        let row: Vec<String> = columns
            .iter()
            .map(|column| cell_text(record, column))
            .collect();
        writer.write_record(&row)?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| crate::error::Error::Load(format!("CSV buffer error: {e}")))?;
    String::from_utf8(bytes)
        .map_err(|e| crate::error::Error::Load(format!("CSV output not UTF-8: {e}")))
}

/// Union of all keys in first-seen order; nested sections contribute
/// dotted names.
fn collect_columns(records: &[Record]) -> Vec<String> {
    let mut columns: Vec<String> = Vec::new();
    let mut push = |name: String, columns: &mut Vec<String>| {
        if !columns.contains(&name) {
            columns.push(name);
        }
    };
    for record in records {
        for (key, value) in record.iter() {
            match value {
                Value::Nested(nested) => {
                    for (inner, _) in nested.iter() {
                        push(format!("{key}.{inner}"), &mut columns);
                    }
                }
                _ => push(key.to_string(), &mut columns),
            }
        }
    }
    columns
}

fn cell_text(record: &Record, column: &str) -> String {
    let value = match column.split_once('.') {
        Some((outer, inner)) => match record.get(outer) {
            Some(Value::Nested(nested)) => nested.get(inner),
            _ => None,
        },
        None => record.get(column),
    };
    match value {
        Some(Value::Str(s)) => s.clone(),
        Some(Value::Int(i)) => i.to_string(),
        Some(Value::Float(x)) => x.to_string(),
        Some(Value::Nested(_)) | None => String::new(),
    }
}
