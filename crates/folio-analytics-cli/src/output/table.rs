use serde_json::{Map, Value};
use tabled::{builder::Builder, Table};

/// Placeholder for values that are not computable (`null`), never "0".
pub const MISSING: &str = "—";

/// Format output as tables using the tabled crate.
pub fn print_table(value: &Value) {
    match value {
        Value::Object(map) => {
            if let Some(result) = map.get("result") {
                print_result(result);
                print_envelope_notes(map);
            } else {
                print_object(map);
            }
        }
        Value::Array(arr) => print_array_table(arr),
        _ => println!("{}", format_value(value)),
    }
}

/// Scalars (and flattened nested objects) as a Field/Value table, then each
/// list of records as its own titled table.
fn print_result(result: &Value) {
    match result {
        Value::Object(map) => print_object(map),
        Value::Array(arr) => print_array_table(arr),
        other => println!("{}", format_value(other)),
    }
}

fn print_object(map: &Map<String, Value>) {
    let mut scalars: Vec<(String, &Value)> = Vec::new();
    let mut lists: Vec<(&str, &Vec<Value>)> = Vec::new();
    for (key, val) in map {
        match val {
            Value::Array(arr) if arr.iter().any(Value::is_object) => lists.push((key.as_str(), arr)),
            _ => flatten(key, val, &mut scalars),
        }
    }

    if !scalars.is_empty() {
        let mut builder = Builder::default();
        builder.push_record(["Field", "Value"]);
        for (key, val) in &scalars {
            builder.push_record([key.clone(), format_value(val)]);
        }
        println!("{}", Table::from(builder));
    }

    for (key, arr) in lists {
        println!("\n{key}:");
        print_array_table(arr);
    }
}

fn print_envelope_notes(envelope: &Map<String, Value>) {
    if let Some(Value::Array(warnings)) = envelope.get("warnings") {
        if !warnings.is_empty() {
            println!("\nWarnings:");
            for w in warnings {
                if let Value::String(s) = w {
                    println!("  - {}", s);
                }
            }
        }
    }

    if let Some(Value::String(meth)) = envelope.get("methodology") {
        println!("\nMethodology: {}", meth);
    }
}

fn print_array_table(arr: &[Value]) {
    if arr.is_empty() {
        println!("(empty)");
        return;
    }

    if arr.iter().all(Value::is_object) {
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

        // Union of columns in first-seen order
        let mut headers: Vec<String> = Vec::new();
        for row in &rows {
            for (key, _) in row {
                if !headers.contains(key) {
                    headers.push(key.clone());
                }
            }
        }

        let mut builder = Builder::default();
        builder.push_record(headers.clone());
        for row in &rows {
            let record: Vec<String> = headers
                .iter()
                .map(|h| {
                    row.iter()
                        .find(|(k, _)| k == h)
                        .map(|(_, v)| format_value(v))
                        .unwrap_or_else(|| MISSING.to_string())
                })
                .collect();
            builder.push_record(record);
        }
        println!("{}", Table::from(builder));
    } else {
        for item in arr {
            println!("{}", format_value(item));
        }
    }
}

/// Flatten nested objects into dotted keys ("metrics.sharpeRatio").
pub fn flatten<'a>(prefix: &str, value: &'a Value, out: &mut Vec<(String, &'a Value)>) {
    match value {
        Value::Object(map) if !map.is_empty() => {
            for (key, val) in map {
                flatten(&format!("{prefix}.{key}"), val, out);
            }
        }
        _ => out.push((prefix.to_string(), value)),
    }
}

pub fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => MISSING.to_string(),
        Value::Array(arr) => {
            let items: Vec<String> = arr.iter().map(format_value).collect();
            items.join(", ")
        }
        Value::Object(_) => serde_json::to_string(value).unwrap_or_default(),
    }
}
