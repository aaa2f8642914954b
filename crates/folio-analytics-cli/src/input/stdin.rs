use serde_json::Value;
use std::io::{self, Read};

/// Read a piped request from stdin: JSON first, then YAML.
/// Returns None if stdin is a TTY (interactive) or empty.
pub fn read_stdin() -> Result<Option<Value>, Box<dyn std::error::Error>> {
    if atty::is(atty::Stream::Stdin) {
        return Ok(None);
    }

    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer)?;

    let trimmed = buffer.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    match serde_json::from_str::<Value>(trimmed) {
        Ok(value) => Ok(Some(value)),
        Err(json_err) => {
            tracing::debug!("stdin is not JSON ({json_err}), trying YAML");
            serde_yaml::from_str::<Value>(trimmed)
                .map(Some)
                .map_err(|_| format!("stdin is neither valid JSON nor YAML: {json_err}").into())
        }
    }
}
