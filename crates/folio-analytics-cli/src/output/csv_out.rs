use serde_json::{Map, Value};
use std::io;

use super::table::flatten;

/// Series keys written as row-per-record CSV, in priority order.
const SERIES_KEYS: [&str; 6] = ["data", "chart", "monthly_returns", "matrix", "portfolios", "holdings"];

/// Write output as CSV to stdout.
///
/// Results carrying a series (chart points, monthly returns, comparison rows)
/// are written one record per row; everything else as `field,value` pairs.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());

    let result = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    match result {
        Value::Object(map) => match series_of(map) {
            Some(series) => write_array_csv(&mut wtr, series),
            None => write_fields(&mut wtr, map),
        },
        Value::Array(arr) => write_array_csv(&mut wtr, arr),
        other => {
            let _ = wtr.write_record([&format_csv_value(other)]);
        }
    }

    let _ = wtr.flush();
}

fn series_of(map: &Map<String, Value>) -> Option<&Vec<Value>> {
    SERIES_KEYS.iter().find_map(|key| match map.get(*key) {
        Some(Value::Array(arr)) if !arr.is_empty() => Some(arr),
        _ => None,
    })
}

fn write_fields<W: io::Write>(wtr: &mut csv::Writer<W>, map: &Map<String, Value>) {
    let _ = wtr.write_record(["field", "value"]);
    let mut cells = Vec::new();
    for (key, val) in map {
        flatten(key, val, &mut cells);
    }
    for (key, val) in cells {
        let _ = wtr.write_record([key.as_str(), &format_csv_value(val)]);
    }
}

fn write_array_csv<W: io::Write>(wtr: &mut csv::Writer<W>, arr: &[Value]) {
    if arr.is_empty() {
        return;
    }

    if !arr.iter().all(Value::is_object) {
        for item in arr {
            let _ = wtr.write_record([&format_csv_value(item)]);
        }
        return;
    }

    let rows: Vec<Vec<(String, &Value)>> = arr
        .iter()
        .map(|item| {
            let mut cells = Vec::new();
            if let Value::Object(map) = item {
                for (key, val) in map {
                    flatten(key, val, &mut cells);
                }
            }
            cells
        })
        .collect();

    // Comparison rows can differ in their value columns; take the union
    let mut headers: Vec<String> = Vec::new();
    for row in &rows {
        for (key, _) in row {
            if !headers.contains(key) {
                headers.push(key.clone());
            }
        }
    }
    let _ = wtr.write_record(&headers);

    for row in &rows {
        let record: Vec<String> = headers
            .iter()
            .map(|h| {
                row.iter()
                    .find(|(k, _)| k == h)
                    .map(|(_, v)| format_csv_value(v))
                    .unwrap_or_default()
            })
            .collect();
        let _ = wtr.write_record(&record);
    }
}

fn format_csv_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
