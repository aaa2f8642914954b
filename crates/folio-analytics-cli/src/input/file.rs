use folio_analytics_core::AnalyticsConfig;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

/// Read a request file as a generic JSON value. Files ending in `.yaml` or
/// `.yml` are parsed as YAML, everything else as JSON.
pub fn read_value(path: &str) -> Result<Value, Box<dyn std::error::Error>> {
    let canonical = resolve_path(path)?;
    tracing::debug!(path = %canonical.display(), yaml = is_yaml(&canonical), "reading request file");
    let contents = fs::read_to_string(&canonical)
        .map_err(|e| format!("Failed to read '{}': {}", canonical.display(), e))?;
    let value: Value = if is_yaml(&canonical) {
        serde_yaml::from_str(&contents)
            .map_err(|e| format!("Failed to parse '{}': {}", canonical.display(), e))?
    } else {
        serde_json::from_str(&contents)
            .map_err(|e| format!("Failed to parse '{}': {}", canonical.display(), e))?
    };
    Ok(value)
}

/// Load an `AnalyticsConfig` from `--config`, or the defaults when absent.
pub fn load_config(path: Option<&str>) -> Result<AnalyticsConfig, Box<dyn std::error::Error>> {
    let config = match path {
        Some(p) => {
            let value = read_value(p)?;
            serde_json::from_value::<AnalyticsConfig>(value)
                .map_err(|e| format!("Invalid config '{}': {}", p, e))?
        }
        None => AnalyticsConfig::default(),
    };
    config.validate()?;
    Ok(config)
}

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()).map(|e| e.to_ascii_lowercase()).as_deref(),
        Some("yaml") | Some("yml")
    )
}

/// Resolve the path against the working directory and check it is a file.
fn resolve_path(path: &str) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let p = Path::new(path);
    let canonical = if p.is_absolute() {
        p.to_path_buf()
    } else {
        std::env::current_dir()?.join(p)
    };

    if !canonical.exists() {
        return Err(format!("File not found: {}", canonical.display()).into());
    }

    if !canonical.is_file() {
        return Err(format!("Not a file: {}", canonical.display()).into());
    }

    Ok(canonical)
}
