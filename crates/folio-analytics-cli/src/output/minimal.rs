use serde_json::{Map, Value};

use super::table::MISSING;

/// Headline fields in order of priority.
const PRIORITY_KEYS: [&str; 9] = [
    "xirr",
    "total_net_worth",
    "sharpeRatio",
    "total_return",
    "total_equity",
    "profit",
    "current_nav",
    "total_market_value",
    "has_data",
];

/// Print just the key answer value from the output.
///
/// Looks for a headline field in the result, then one level down in nested
/// objects (`metrics`, `totals`), then falls back to the first field. A
/// non-computable headline prints as a dash.
pub fn print_minimal(value: &Value) {
    let result_obj = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    if let Value::Object(map) = result_obj {
        if let Some(val) = headline(map) {
            println!("{}", format_minimal(val));
            return;
        }

        if let Some((key, val)) = map.iter().next() {
            println!("{}: {}", key, format_minimal(val));
            return;
        }
    }

    println!("{}", format_minimal(result_obj));
}

fn headline(map: &Map<String, Value>) -> Option<&Value> {
    for key in PRIORITY_KEYS {
        if let Some(val) = map.get(key) {
            return Some(val);
        }
    }
    for nested in map.values() {
        if let Value::Object(inner) = nested {
            for key in PRIORITY_KEYS {
                if let Some(val) = inner.get(key) {
                    return Some(val);
                }
            }
        }
    }
    None
}

fn format_minimal(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => MISSING.to_string(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_headline_prefers_xirr_even_when_null() {
        let v = json!({"profit": "100", "xirr": null});
        let val = headline(v.as_object().unwrap()).unwrap();
        assert_eq!(format_minimal(val), "—");
    }

    #[test]
    fn test_headline_searches_nested() {
        let v = json!({"metrics": {"sharpeRatio": "1.5"}, "monthly_returns": []});
        let val = headline(v.as_object().unwrap()).unwrap();
        assert_eq!(format_minimal(val), "1.5");

        let d = json!({"totals": {"total_net_worth": "1000"}});
        assert_eq!(format_minimal(headline(d.as_object().unwrap()).unwrap()), "1000");
    }

    #[test]
    fn test_holdings_headline_is_market_value() {
        let v = json!({"holdings": [], "total_market_value": "20400000", "total_profit": "1385000"});
        assert_eq!(format_minimal(headline(v.as_object().unwrap()).unwrap()), "20400000");
    }
}
