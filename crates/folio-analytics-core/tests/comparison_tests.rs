use chrono::{Duration, NaiveDate};
use folio_analytics_core::comparison::matrix::{compare_portfolios, ComparisonInput, ComparisonSeries};
use folio_analytics_core::config::AnalyticsConfig;
use folio_analytics_core::nav::{NavPoint, NavSeries};
use folio_analytics_core::time_range::TimeRange;
use folio_analytics_core::AnalyticsError;
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn portfolio(id: &str, name: &str, points: &[(NaiveDate, Decimal)]) -> ComparisonInput {
    ComparisonInput {
        id: id.into(),
        name: name.into(),
        snapshots: NavSeries::new(points.iter().map(|(date, nav)| NavPoint::new(*date, *nav))).unwrap(),
    }
}

#[test]
fn test_different_scales_both_start_at_zero() {
    let small = portfolio("vn30", "VN30 fund", &[(d(2024, 1, 5), dec!(100)), (d(2024, 2, 5), dec!(103))]);
    let large = portfolio(
        "gold",
        "Gold bars",
        &[(d(2024, 1, 5), dec!(5000000)), (d(2024, 2, 5), dec!(5250000))],
    );
    let out = compare_portfolios(&[small, large], TimeRange::All, d(2024, 3, 1), &AnalyticsConfig::default())
        .unwrap()
        .result;

    let first = &out.chart[0];
    assert_eq!(first.date, d(2024, 1, 5));
    assert_eq!(first.values["vn30"], Some(Decimal::ZERO));
    assert_eq!(first.values["gold"], Some(Decimal::ZERO));
    assert_eq!(out.chart[1].values["vn30"], Some(dec!(3)));
    assert_eq!(out.chart[1].values["gold"], Some(dec!(5)));

    assert_eq!(
        out.series,
        vec![
            ComparisonSeries {
                id: "vn30".into(),
                name: "VN30 fund".into(),
                color: "#3b82f6".into(),
            },
            ComparisonSeries {
                id: "gold".into(),
                name: "Gold bars".into(),
                color: "#10b981".into(),
            },
        ]
    );
}

#[test]
fn test_total_return_ignores_union_axis() {
    // b has more dates; a's total return still uses only its own endpoints
    let a = portfolio("a", "A", &[(d(2024, 1, 1), dec!(200)), (d(2024, 4, 1), dec!(150))]);
    let b = portfolio(
        "b",
        "B",
        &[
            (d(2024, 1, 1), dec!(10)),
            (d(2024, 2, 1), dec!(30)),
            (d(2024, 3, 1), dec!(5)),
            (d(2024, 4, 1), dec!(12)),
        ],
    );
    let out = compare_portfolios(&[a, b], TimeRange::All, d(2024, 4, 30), &AnalyticsConfig::default())
        .unwrap()
        .result;
    assert_eq!(out.chart.len(), 4);
    assert_eq!(out.matrix[0].total_return, dec!(-25));
    assert_eq!(out.matrix[1].total_return, dec!(20));
    let dd = out.matrix[1].metrics.max_drawdown;
    assert!((dd - dec!(83.3333)).abs() < dec!(0.0001), "Expected ~83.33% drawdown, got {}", dd);
}

#[test]
fn test_three_month_window() {
    let a = portfolio(
        "a",
        "A",
        &[
            (d(2023, 12, 1), dec!(80)),
            (d(2024, 1, 1), dec!(100)),
            (d(2024, 3, 1), dec!(120)),
        ],
    );
    let b = portfolio("b", "B", &[(d(2024, 2, 15), dec!(50)), (d(2024, 3, 15), dec!(45))]);
    let out = compare_portfolios(&[a, b], TimeRange::ThreeMonths, d(2024, 3, 31), &AnalyticsConfig::default())
        .unwrap()
        .result;
    assert_eq!(out.start_date, d(2023, 12, 31));
    let dates: Vec<NaiveDate> = out.chart.iter().map(|r| r.date).collect();
    assert_eq!(dates, vec![d(2024, 1, 1), d(2024, 2, 15), d(2024, 3, 1), d(2024, 3, 15)]);
    assert_eq!(out.matrix[0].total_return, dec!(20));
    assert_eq!(out.matrix[1].total_return, dec!(-10));
}

#[test]
fn test_snapshots_after_as_of_are_excluded() {
    let a = portfolio(
        "a",
        "A",
        &[
            (d(2024, 1, 1), dec!(100)),
            (d(2024, 2, 1), dec!(110)),
            (d(2024, 6, 1), dec!(200)),
        ],
    );
    let b = portfolio("b", "B", &[(d(2024, 5, 1), dec!(50))]);
    let out = compare_portfolios(&[a, b], TimeRange::All, d(2024, 3, 1), &AnalyticsConfig::default()).unwrap();

    let dates: Vec<NaiveDate> = out.result.chart.iter().map(|r| r.date).collect();
    assert_eq!(dates, vec![d(2024, 1, 1), d(2024, 2, 1)]);
    assert_eq!(out.result.matrix.len(), 1);
    assert_eq!(out.result.matrix[0].total_return, dec!(10));
    assert_eq!(out.result.chart[1].values["b"], None);
    assert!(out.warnings.iter().any(|w| w.contains("'B'")));
}

#[test]
fn test_chart_json_has_null_holes() {
    let a = portfolio("a", "A", &[(d(2024, 1, 1), dec!(1))]);
    let b = portfolio("b", "B", &[(d(2024, 1, 2), dec!(1))]);
    let out = compare_portfolios(&[a, b], TimeRange::All, d(2024, 2, 1), &AnalyticsConfig::default()).unwrap();
    let json = serde_json::to_value(&out.result.chart).unwrap();
    assert!(json[0]["values"]["b"].is_null());
    assert!(json[1]["values"]["a"].is_null());
}

#[test]
fn test_configured_cap() {
    let mut config = AnalyticsConfig::default();
    config.comparison.max_series = 2;
    let inputs: Vec<ComparisonInput> = ["a", "b", "c"]
        .iter()
        .map(|id| portfolio(id, id, &[(d(2024, 1, 1), dec!(1))]))
        .collect();
    let err = compare_portfolios(&inputs, TimeRange::All, d(2024, 2, 1), &config).unwrap_err();
    assert!(matches!(err, AnalyticsError::TooManySeries { selected: 3, max: 2 }));
}

#[test]
fn test_single_selection_warns() {
    let a = portfolio("a", "A", &[(d(2024, 1, 1), dec!(1)), (d(2024, 1, 2), dec!(2))]);
    let out = compare_portfolios(&[a], TimeRange::All, d(2024, 2, 1), &AnalyticsConfig::default()).unwrap();
    assert_eq!(out.result.matrix.len(), 1);
    assert!(!out.warnings.is_empty());
}

fn arb_portfolio(id: &'static str) -> impl Strategy<Value = ComparisonInput> {
    prop::collection::vec((0i64..700, 1i64..1_000_000_000), 1..25).prop_map(move |raw| {
        let base = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
        ComparisonInput {
            id: id.into(),
            name: id.into(),
            snapshots: NavSeries::new(
                raw.into_iter()
                    .map(|(offset, nav)| NavPoint::new(base + Duration::days(offset), Decimal::from(nav))),
            )
            .unwrap(),
        }
    })
}

proptest! {
    #[test]
    fn prop_every_series_starts_at_zero(
        a in arb_portfolio("a"),
        b in arb_portfolio("b"),
        range_idx in 0usize..6,
    ) {
        let ranges = [
            TimeRange::OneMonth,
            TimeRange::ThreeMonths,
            TimeRange::SixMonths,
            TimeRange::YearToDate,
            TimeRange::OneYear,
            TimeRange::All,
        ];
        let range = ranges[range_idx];
        let as_of = NaiveDate::from_ymd_opt(2024, 12, 31).unwrap();
        let out = compare_portfolios(&[a, b], range, as_of, &AnalyticsConfig::default()).unwrap().result;
        for id in ["a", "b"] {
            let first = out.chart.iter().find_map(|row| row.values[id]);
            if let Some(first) = first {
                prop_assert_eq!(first, Decimal::ZERO);
            }
        }
    }
}
