//! Tests for eligibility cohorts and treatment indicators

#[path = "common/mod.rs"]
mod common;

use common::*;
use polars::prelude::*;
use upk::pipeline::cohorts::*;
use upk::pipeline::filter::cohort_sample;

fn cohorts_frame() -> DataFrame {
    let df = cohort_sample(&create_cohort_extract()).unwrap();
    build_cohorts(&df).unwrap()
}

#[test]
fn test_adds_every_cohort_column() {
    let out = cohorts_frame();
    for cohort in &COHORTS {
        assert_has_columns(&out, &[&cohort.column()]);
        for &(_, age) in cohort.gates {
            assert_has_columns(&out, &[&cohort.age_column(age)]);
        }
    }
    assert_has_columns(&out, &["upk_year", "treatment_18", "treatment_23", "treatment_25"]);
}

#[test]
fn test_gates_identify_the_1995_cohort() {
    let out = cohorts_frame();
    // Remaining rows: (2013,18) (2018,23) (2020,25) (2010,18) (2015,23)
    assert_eq!(
        int_values(&out, "upk95"),
        vec![Some(1), Some(1), Some(1), Some(0), Some(0)]
    );
    assert_eq!(int_values(&out, "upk95_18")[0], Some(1));
    assert_eq!(int_values(&out, "upk95_23")[1], Some(1));
    assert_eq!(int_values(&out, "upk95_25")[2], Some(1));
    assert_eq!(int_values(&out, "upk95_18")[1], Some(0));
    assert!(int_values(&out, "upk97").iter().all(|v| *v == Some(0)));
}

#[test]
fn test_eligibility_year_matches_cohort() {
    let out = cohorts_frame();
    assert_eq!(
        float_values(&out, "upk_year"),
        vec![Some(95.0), Some(95.0), Some(95.0), None, None]
    );
}

#[test]
fn test_treatment_bands() {
    let out = cohorts_frame();
    assert_eq!(
        int_values(&out, "treatment_18"),
        vec![Some(0), Some(0), Some(0), Some(1), Some(0)]
    );
    assert_eq!(
        int_values(&out, "treatment_23"),
        vec![Some(0), Some(0), Some(0), Some(0), Some(1)]
    );
    assert!(int_values(&out, "treatment_25").iter().all(|v| *v == Some(0)));
}

#[test]
fn test_at_most_one_band_per_row() {
    let years: Vec<i32> = (2006..=2022).flat_map(|y| [y, y, y]).collect();
    let ages: Vec<f64> = (2006..=2022).flat_map(|_| [18.0, 23.0, 25.0]).collect();
    let df = df!("year" => years, "age" => ages).unwrap();

    let out = treatment_bands(&df).unwrap();
    check_treatment_disjoint(&out).unwrap();

    let total: i32 = ["treatment_18", "treatment_23", "treatment_25"]
        .iter()
        .map(|c| int_values(&out, c).into_iter().flatten().sum::<i32>())
        .sum();
    // 5 + 5 + 2 treated survey years
    assert_eq!(total, 12);
}

#[test]
fn test_each_gate_sets_exactly_one_cohort() {
    let gates: Vec<(i32, i32)> = COHORTS.iter().flat_map(|c| c.gates.iter().copied()).collect();
    let df = df!(
        "year" => gates.iter().map(|g| g.0).collect::<Vec<_>>(),
        "age" => gates.iter().map(|g| g.1 as f64).collect::<Vec<_>>()
    )
    .unwrap();
    let out = eligibility_year(&cohort_dummies(&df).unwrap()).unwrap();

    for row in 0..out.height() {
        let set: i32 = COHORTS
            .iter()
            .map(|c| int_values(&out, &c.column())[row].unwrap_or(0))
            .sum();
        assert_eq!(set, 1, "gate {:?}", gates[row]);
    }

    let expected: Vec<Option<f64>> = COHORTS
        .iter()
        .flat_map(|c| c.gates.iter().map(move |_| Some(c.index())))
        .collect();
    assert_eq!(float_values(&out, "upk_year"), expected);
}

#[test]
fn test_birth_year_treatment() {
    let df = df!("birthyr" => [Some(1990.0), Some(1991.0), Some(1999.0), Some(2000.0), None]).unwrap();
    let out = birth_year_treatment(&df).unwrap();
    assert_eq!(
        int_values(&out, "treatment"),
        vec![Some(0), Some(1), Some(1), Some(0), Some(0)]
    );
}

#[test]
fn test_missing_year_column() {
    let df = df!("age" => [18.0]).unwrap();
    assert!(matches!(
        cohort_dummies(&df),
        Err(CohortError::MissingColumn { ref column }) if column == "year"
    ));
}
