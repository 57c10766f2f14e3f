//! Tests for descriptive statistics

use polars::prelude::*;
use upk::pipeline::describe::*;
use upk::pipeline::describe::quantile;

#[test]
fn test_value_counts_orders() {
    let df = df!("nsibs" => [Some(2), Some(10), Some(2), Some(1), None, Some(10), Some(10)]).unwrap();

    let by_count = value_counts(&df, "nsibs", CountOrder::ByCount).unwrap();
    assert_eq!(
        by_count,
        vec![("10".to_string(), 3), ("2".to_string(), 2), ("1".to_string(), 1)]
    );

    // Numeric labels sort numerically, not lexically
    let by_value = value_counts(&df, "nsibs", CountOrder::ByValue).unwrap();
    let labels: Vec<&str> = by_value.iter().map(|(l, _)| l.as_str()).collect();
    assert_eq!(labels, vec!["1", "2", "10"]);
}

#[test]
fn test_crosstab_totals() {
    let df = df! {
        "year" => [2013, 2013, 2014, 2015, 2015, 2015],
        "treatment" => [Some(1), Some(0), Some(1), Some(0), Some(0), None],
    }
    .unwrap();
    let tab = crosstab(&df, "year", "treatment").unwrap();

    assert_eq!(tab.row_labels, vec!["2013", "2014", "2015"]);
    assert_eq!(tab.col_labels, vec!["0", "1"]);
    assert_eq!(tab.counts, vec![vec![1, 1], vec![0, 1], vec![2, 0]]);
    assert_eq!(tab.row_totals(), vec![2, 1, 2]);
    assert_eq!(tab.col_totals(), vec![3, 2]);
    assert_eq!(tab.grand_total(), 5);
}

#[test]
fn test_crosstab_missing_column() {
    let df = df!("year" => [2013]).unwrap();
    assert!(crosstab(&df, "year", "hs").is_err());
}

#[test]
fn test_describe_matches_hand_values() {
    let df = df!("x" => [Some(1.0), Some(2.0), Some(3.0), Some(4.0), None]).unwrap();
    let summary = describe(&df, &["x"]).unwrap();
    let s = &summary[0];

    assert_eq!(s.count, 4);
    assert!((s.mean - 2.5).abs() < 1e-12);
    assert!((s.std - (5.0f64 / 3.0).sqrt()).abs() < 1e-12);
    assert_eq!((s.min, s.max), (1.0, 4.0));
    assert!((s.q25 - 1.75).abs() < 1e-12);
    assert!((s.median - 2.5).abs() < 1e-12);
    assert!((s.q75 - 3.25).abs() < 1e-12);
}

#[test]
fn test_describe_single_value_has_nan_std() {
    let df = df!("x" => [7.0]).unwrap();
    let s = &describe(&df, &["x"]).unwrap()[0];
    assert_eq!(s.count, 1);
    assert!(s.std.is_nan());
    assert_eq!(s.median, 7.0);
}

#[test]
fn test_indicator_shares_use_all_rows() {
    let df = df! {
        "black" => [Some(1), Some(0), None, Some(1)],
        "hisp" => [Some(0), Some(0), Some(0), Some(0)],
    }
    .unwrap();
    let shares = indicator_shares(&df, &["black", "hisp"]).unwrap();
    assert_eq!(shares[0].0, "black");
    assert!((shares[0].1 - 50.0).abs() < 1e-12);
    assert_eq!(shares[1].1, 0.0);
}

#[test]
fn test_correlation_pairwise_complete() {
    let df = df! {
        "a" => [Some(1.0), Some(2.0), Some(3.0), Some(4.0), Some(100.0)],
        "b" => [Some(2.0), Some(4.0), Some(6.0), Some(8.0), None],
        "c" => [Some(4.0), Some(3.0), Some(2.0), Some(1.0), Some(0.0)],
    }
    .unwrap();
    let corr = correlation_matrix(&df, &["a", "b", "c"]).unwrap();

    assert_eq!(corr.nobs, 4);
    assert_eq!(corr.pair_count("a", "b"), Some(4));
    assert_eq!(corr.pair_count("a", "c"), Some(5));
    assert!((corr.get("a", "b").unwrap() - 1.0).abs() < 1e-12);
    assert!((corr.get("b", "c").unwrap() + 1.0).abs() < 1e-12);

    // The outlier row is kept for (a, c) because neither value is null
    let r = corr.get("a", "c").unwrap();
    assert!(r < 0.0 && r > -0.9, "r = {}", r);
    assert!((corr.get("c", "c").unwrap() - 1.0).abs() < 1e-12);
    assert!(corr.get("a", "zzz").is_none());
}

#[test]
fn test_correlation_without_nulls_uses_every_row() {
    let df = df! {
        "a" => [1.0, 2.0, 3.0, 4.0],
        "b" => [1.0, 3.0, 2.0, 4.0],
    }
    .unwrap();
    let corr = correlation_matrix(&df, &["a", "b"]).unwrap();
    assert_eq!(corr.nobs, 4);
    assert_eq!(corr.pair_count("a", "b"), Some(4));
    assert!((corr.get("a", "b").unwrap() - 0.8).abs() < 1e-12);
}

#[test]
fn test_correlation_constant_column_is_nan() {
    let df = df! {
        "a" => [1.0, 2.0, 3.0],
        "k" => [5.0, 5.0, 5.0],
    }
    .unwrap();
    let corr = correlation_matrix(&df, &["a", "k"]).unwrap();
    assert!(corr.get("a", "k").unwrap().is_nan());
    assert!((corr.get("a", "a").unwrap() - 1.0).abs() < 1e-12);
}

#[test]
fn test_correlation_needs_two_rows() {
    let df = df!("a" => [1.0], "b" => [2.0]).unwrap();
    assert!(correlation_matrix(&df, &["a", "b"]).is_err());

    // A pair with a single shared row is undefined
    let df = df!("a" => [Some(1.0), None], "b" => [Some(1.0), Some(2.0)]).unwrap();
    let corr = correlation_matrix(&df, &["a", "b"]).unwrap();
    assert_eq!(corr.pair_count("a", "b"), Some(1));
    assert!(corr.get("a", "b").unwrap().is_nan());
}

#[test]
fn test_quantile_interpolates() {
    let sorted = [0.0, 10.0];
    assert_eq!(quantile(&sorted, 0.5), 5.0);
    assert!(quantile(&[], 0.5).is_nan());
}
