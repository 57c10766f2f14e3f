//! Tests for the sample restriction stages

#[path = "common/mod.rs"]
mod common;

use common::*;
use polars::prelude::*;
use upk::pipeline::filter::*;

#[test]
fn test_cohort_sample_drops_bookkeeping_and_same_sex() {
    let df = create_cohort_extract();
    let out = cohort_sample(&df).unwrap();

    // Row 3 has a second mother, row 4 has a text age
    assert_eq!(out.height(), 5);
    assert_missing_columns(&out, &COHORT_CLEANUP_COLUMNS);
    assert_missing_columns(&out, &COHORT_SAME_SEX_COLUMNS);
    assert_has_columns(&out, &["year", "age", "educd", "educd_mom", "poverty"]);
    assert_eq!(out.column("age").unwrap().dtype(), &DataType::Float64);
}

#[test]
fn test_cohort_sample_requires_every_listed_column() {
    let df = create_cohort_extract().drop("perwt").unwrap();
    let err = cohort_sample(&df).unwrap_err();
    assert!(matches!(err, FilterError::MissingColumn { ref column } if column == "perwt"));
}

#[test]
fn test_regression_sample_keeps_only_eighteen_year_olds() {
    let df = create_regression_extract(400, 7);
    let out = regression_sample(&df).unwrap();

    assert!(out.height() < df.height());
    assert!(out.height() > 300);
    assert_missing_columns(&out, &REGRESSION_CLEANUP_COLUMNS);
    assert_missing_columns(&out, &REGRESSION_SAME_SEX_COLUMNS);

    let ages = float_values(&out, "age");
    assert!(ages.iter().all(|a| *a == Some(18.0)));

    let educd = out.column("educd").unwrap().str().unwrap().clone();
    assert!(educd.into_iter().all(|v| v != Some(ASSOCIATE_DEGREE)));
    let educ = out.column("educ").unwrap().str().unwrap().clone();
    assert!(educ.into_iter().all(|v| v != Some(NO_EDUCATION_DATA)));
}

#[test]
fn test_any_present_with_mixed_types() {
    let df = df! {
        "id" => [1, 2, 3],
        "income2" => [None, Some(10_000i64), None],
        "race2" => [None, None, Some("white")],
    }
    .unwrap();
    let out = drop_rows_with_any_present(&df, &["income2", "race2"]).unwrap();
    assert_eq!(int_values(&out, "id"), vec![Some(1)]);
}

#[test]
fn test_keep_rows_equal_drops_nulls() {
    let df = df!("sex" => [Some("male"), None, Some("female")]).unwrap();
    let out = keep_rows_equal(&df, "sex", "female").unwrap();
    assert_eq!(out.height(), 1);
}

#[test]
fn test_keep_age_accepts_numeric_text() {
    let df = df!("age" => ["18", "18.0", "19", "90 (90+ in 1980 and 1990)"]).unwrap();
    let out = keep_age(&df, 18).unwrap();
    assert_eq!(out.height(), 2);
}
