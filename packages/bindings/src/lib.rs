use chrono::NaiveDate;
use napi::Result as NapiResult;
use napi_derive::napi;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use folio_analytics_core::AnalyticsConfig;

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

/// Split a request into its body and the optional `config` member.
fn parse_request(input_json: &str) -> NapiResult<(Value, AnalyticsConfig)> {
    let mut request: Value = serde_json::from_str(input_json).map_err(to_napi_error)?;
    let config = match request.as_object_mut().and_then(|m| m.remove("config")) {
        Some(raw) => serde_json::from_value::<AnalyticsConfig>(raw).map_err(to_napi_error)?,
        None => AnalyticsConfig::default(),
    };
    config.validate().map_err(to_napi_error)?;
    Ok((request, config))
}

/// Fill a missing reference date with today's local date.
fn default_date(request: &mut Value, key: &str) {
    if let Value::Object(map) = request {
        let today: NaiveDate = chrono::Local::now().date_naive();
        map.entry(key.to_string())
            .or_insert_with(|| Value::String(today.to_string()));
    }
}

fn decode<T: DeserializeOwned>(request: Value) -> NapiResult<T> {
    serde_json::from_value(request).map_err(to_napi_error)
}

fn encode<T: Serialize>(output: &T) -> NapiResult<String> {
    serde_json::to_string(output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Money-weighted return
// ---------------------------------------------------------------------------

#[napi]
pub fn calculate_xirr(input_json: String) -> NapiResult<String> {
    let (request, config) = parse_request(&input_json)?;
    let input: folio_analytics_core::time_value::XirrInput = decode(request)?;
    let output =
        folio_analytics_core::time_value::calculate_xirr(&input, &config).map_err(to_napi_error)?;
    encode(&output)
}

// ---------------------------------------------------------------------------
// Performance
// ---------------------------------------------------------------------------

#[napi]
pub fn performance_summary(input_json: String) -> NapiResult<String> {
    let (mut request, config) = parse_request(&input_json)?;
    default_date(&mut request, "valuation_date");
    let input: folio_analytics_core::performance::summary::PerformanceInput = decode(request)?;
    let output = folio_analytics_core::performance::summary::summarize_performance(&input, &config)
        .map_err(to_napi_error)?;
    encode(&output)
}

#[napi]
pub fn performance_chart(input_json: String) -> NapiResult<String> {
    let (mut request, _) = parse_request(&input_json)?;
    default_date(&mut request, "as_of");
    let input: folio_analytics_core::performance::chart::ChartInput = decode(request)?;
    let output =
        folio_analytics_core::performance::chart::performance_chart(&input).map_err(to_napi_error)?;
    encode(&output)
}

#[napi]
pub fn stock_holdings(input_json: String) -> NapiResult<String> {
    let (request, _) = parse_request(&input_json)?;
    let input: folio_analytics_core::performance::holdings::HoldingsInput = decode(request)?;
    let output = folio_analytics_core::performance::holdings::calculate_holdings(&input)
        .map_err(to_napi_error)?;
    encode(&output)
}

// ---------------------------------------------------------------------------
// Risk
// ---------------------------------------------------------------------------

#[napi]
pub fn monthly_returns(input_json: String) -> NapiResult<String> {
    let (request, _) = parse_request(&input_json)?;
    let input: folio_analytics_core::risk::metrics::RiskInput = decode(request)?;
    let returns = folio_analytics_core::risk::monthly::compile_monthly_returns(&input.snapshots);
    encode(&returns)
}

#[napi]
pub fn risk_metrics(input_json: String) -> NapiResult<String> {
    let (request, config) = parse_request(&input_json)?;
    let input: folio_analytics_core::risk::metrics::RiskInput = decode(request)?;
    let output = folio_analytics_core::risk::metrics::calculate_risk_metrics(&input, &config)
        .map_err(to_napi_error)?;
    encode(&output)
}

// ---------------------------------------------------------------------------
// Comparison & dashboard
// ---------------------------------------------------------------------------

#[napi]
pub fn compare_portfolios(input_json: String) -> NapiResult<String> {
    let (mut request, config) = parse_request(&input_json)?;
    default_date(&mut request, "as_of");
    let input: folio_analytics_core::comparison::matrix::ComparisonRequest = decode(request)?;
    let output = folio_analytics_core::comparison::matrix::compare_portfolios(
        &input.portfolios,
        input.range,
        input.as_of,
        &config,
    )
    .map_err(to_napi_error)?;
    encode(&output)
}

#[napi]
pub fn dashboard(input_json: String) -> NapiResult<String> {
    let (request, _) = parse_request(&input_json)?;
    let input: folio_analytics_core::dashboard::aggregate::DashboardInput = decode(request)?;
    let output = folio_analytics_core::dashboard::aggregate::aggregate_dashboard(&input)
        .map_err(to_napi_error)?;
    encode(&output)
}

#[napi]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
