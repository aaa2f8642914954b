pub mod file;
pub mod stdin;

use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Request body from `--input <file>`, else piped stdin, else None.
pub fn read_request(path: Option<&str>) -> Result<Option<Value>, Box<dyn std::error::Error>> {
    match path {
        Some(p) => file::read_value(p).map(Some),
        None => stdin::read_stdin(),
    }
}

/// Like [`read_request`] but the body is mandatory.
pub fn require_request(path: Option<&str>, command: &str) -> Result<Value, Box<dyn std::error::Error>> {
    read_request(path)?.ok_or_else(|| format!("--input <file> or stdin required for {command}").into())
}

/// Set the reference date in a request: an explicit flag wins, then the
/// request's own value, then today.
pub fn set_date(request: &mut Value, key: &str, flag: Option<NaiveDate>) {
    if let Value::Object(map) = request {
        match flag {
            Some(date) => {
                map.insert(key.to_string(), Value::String(date.to_string()));
            }
            None => {
                map.entry(key.to_string())
                    .or_insert_with(|| Value::String(today().to_string()));
            }
        }
    }
}

/// Set a string field from a flag if given.
pub fn set_flag(request: &mut Value, key: &str, flag: Option<String>) {
    if let (Value::Object(map), Some(v)) = (request, flag) {
        map.insert(key.to_string(), Value::String(v));
    }
}

pub fn parse<T: DeserializeOwned>(request: Value) -> Result<T, Box<dyn std::error::Error>> {
    Ok(serde_json::from_value(request)?)
}

pub fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}
