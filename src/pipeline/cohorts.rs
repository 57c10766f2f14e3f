//! Pre-kindergarten eligibility cohorts and treatment bands.
//!
//! A respondent belongs to cohort `upkNN` when observed at one of the cohort's
//! exact `(survey year, age)` gates. Georgia's universal pre-K started with the
//! 1995 birth cohort, so the gates re-identify birth years 1995-2003 from the
//! ACS survey year at ages 18, 23 and 25.

use polars::prelude::*;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CohortError {
    #[error("column '{column}' not found in dataset")]
    MissingColumn { column: String },

    #[error("row {row} falls in more than one treatment band: {bands:?}")]
    OverlappingTreatment { row: usize, bands: Vec<&'static str> },

    #[error(transparent)]
    Frame(#[from] PolarsError),
}

/// A birth cohort and the observation points that identify it.
#[derive(Debug, Clone, Copy)]
pub struct Cohort {
    /// Two-digit suffix, e.g. `"95"` for `upk95`.
    pub suffix: &'static str,
    pub birth_year: i32,
    /// `(survey year, age)` pairs.
    pub gates: &'static [(i32, i32)],
}

impl Cohort {
    pub fn column(&self) -> String {
        format!("upk{}", self.suffix)
    }

    pub fn age_column(&self, age: i32) -> String {
        format!("upk{}_{}", self.suffix, age)
    }

    /// Numeric value of the suffix: 95.0 for `upk95`, 0.0 for `upk00`.
    pub fn index(&self) -> f64 {
        f64::from(self.birth_year % 100)
    }
}

pub const COHORTS: [Cohort; 9] = [
    Cohort {
        suffix: "95",
        birth_year: 1995,
        gates: &[(2013, 18), (2018, 23), (2020, 25)],
    },
    Cohort {
        suffix: "96",
        birth_year: 1996,
        gates: &[(2014, 18), (2019, 23), (2021, 25)],
    },
    Cohort {
        suffix: "97",
        birth_year: 1997,
        gates: &[(2015, 18), (2020, 23)],
    },
    Cohort {
        suffix: "98",
        birth_year: 1998,
        gates: &[(2016, 18), (2021, 23)],
    },
    Cohort {
        suffix: "99",
        birth_year: 1999,
        gates: &[(2017, 18)],
    },
    Cohort {
        suffix: "00",
        birth_year: 2000,
        gates: &[(2018, 18)],
    },
    Cohort {
        suffix: "01",
        birth_year: 2001,
        gates: &[(2019, 18)],
    },
    Cohort {
        suffix: "02",
        birth_year: 2002,
        gates: &[(2020, 18)],
    },
    Cohort {
        suffix: "03",
        birth_year: 2003,
        gates: &[(2021, 18)],
    },
];

/// Survey years (inclusive) in which respondents of `age` are treated.
#[derive(Debug, Clone, Copy)]
pub struct TreatmentBand {
    pub name: &'static str,
    pub first_year: i32,
    pub last_year: i32,
    pub age: i32,
}

impl TreatmentBand {
    pub fn contains(&self, year: f64, age: f64) -> bool {
        year >= self.first_year as f64 && year <= self.last_year as f64 && age == self.age as f64
    }
}

pub const TREATMENT_BANDS: [TreatmentBand; 3] = [
    TreatmentBand {
        name: "treatment_18",
        first_year: 2008,
        last_year: 2012,
        age: 18,
    },
    TreatmentBand {
        name: "treatment_23",
        first_year: 2013,
        last_year: 2017,
        age: 23,
    },
    TreatmentBand {
        name: "treatment_25",
        first_year: 2018,
        last_year: 2019,
        age: 25,
    },
];

/// Birth years that define the regression `treatment` indicator.
pub const TREATED_BIRTH_YEARS: std::ops::RangeInclusive<i32> = 1991..=1999;

fn numeric(df: &DataFrame, column: &str) -> Result<Vec<Option<f64>>, CohortError> {
    let values = df
        .column(column)
        .map_err(|_| CohortError::MissingColumn {
            column: column.to_string(),
        })?
        .cast(&DataType::Float64)?;
    Ok(values.f64()?.into_iter().collect())
}

fn year_age(df: &DataFrame) -> Result<Vec<Option<(f64, f64)>>, CohortError> {
    let years = numeric(df, "year")?;
    let ages = numeric(df, "age")?;
    Ok(years
        .into_iter()
        .zip(ages)
        .map(|(y, a)| y.zip(a))
        .collect())
}

fn gate_flags(
    observed: &[Option<(f64, f64)>],
    year: i32,
    age: i32,
) -> impl Iterator<Item = bool> + '_ {
    observed
        .iter()
        .map(move |obs| obs.is_some_and(|(y, a)| y == year as f64 && a == age as f64))
}

fn flag_column(name: &str, flags: impl Iterator<Item = bool>) -> Column {
    let data: Vec<i32> = flags.map(i32::from).collect();
    Column::new(name.into(), data)
}

/// Adds `upkNN` and the per-age `upkNN_AGE` dummies.
pub fn cohort_dummies(df: &DataFrame) -> Result<DataFrame, CohortError> {
    let observed = year_age(df)?;

    let mut out = df.clone();
    for cohort in &COHORTS {
        let any_gate = observed.iter().map(|obs| {
            obs.is_some_and(|(y, a)| {
                cohort
                    .gates
                    .iter()
                    .any(|&(gy, ga)| y == gy as f64 && a == ga as f64)
            })
        });
        out.with_column(flag_column(&cohort.column(), any_gate))?;
    }
    for cohort in &COHORTS {
        for &(year, age) in cohort.gates {
            let flags = gate_flags(&observed, year, age);
            out.with_column(flag_column(&cohort.age_column(age), flags))?;
        }
    }

    log::debug!("Added {} cohort dummies", out.width() - df.width());
    Ok(out)
}

/// Adds `upk_year`: the cohort index (`upk95` gives 95, `upk03` gives 3) of
/// the first cohort dummy set on the row, or null when none is set.
pub fn eligibility_year(df: &DataFrame) -> Result<DataFrame, CohortError> {
    let mut flags: Vec<(f64, Vec<Option<i32>>)> = Vec::with_capacity(COHORTS.len());
    for cohort in &COHORTS {
        let name = cohort.column();
        let values = df
            .column(&name)
            .map_err(|_| CohortError::MissingColumn { column: name })?
            .cast(&DataType::Int32)?;
        flags.push((cohort.index(), values.i32()?.into_iter().collect()));
    }

    let year: Vec<Option<f64>> = (0..df.height())
        .map(|row| {
            flags
                .iter()
                .find(|(_, values)| values[row] == Some(1))
                .map(|(index, _)| *index)
        })
        .collect();

    let mut out = df.clone();
    out.with_column(Column::new("upk_year".into(), year))?;
    Ok(out)
}

/// Adds `treatment_18`, `treatment_23` and `treatment_25`.
pub fn treatment_bands(df: &DataFrame) -> Result<DataFrame, CohortError> {
    let observed = year_age(df)?;
    let mut out = df.clone();
    for band in &TREATMENT_BANDS {
        let flags = observed
            .iter()
            .map(|obs| obs.is_some_and(|(y, a)| band.contains(y, a)));
        out.with_column(flag_column(band.name, flags))?;
    }
    Ok(out)
}

/// Fails if any row has more than one treatment band set.
pub fn check_treatment_disjoint(df: &DataFrame) -> Result<(), CohortError> {
    let mut columns = Vec::with_capacity(TREATMENT_BANDS.len());
    for band in &TREATMENT_BANDS {
        let values = df
            .column(band.name)
            .map_err(|_| CohortError::MissingColumn {
                column: band.name.to_string(),
            })?
            .cast(&DataType::Int32)?;
        let flags: Vec<bool> = values.i32()?.into_iter().map(|v| v == Some(1)).collect();
        columns.push((band.name, flags));
    }

    for row in 0..df.height() {
        let set: Vec<&'static str> = columns
            .iter()
            .filter(|(_, flags)| flags[row])
            .map(|(name, _)| *name)
            .collect();
        if set.len() > 1 {
            return Err(CohortError::OverlappingTreatment { row, bands: set });
        }
    }
    Ok(())
}

/// Adds the regression `treatment` indicator from `birthyr`.
pub fn birth_year_treatment(df: &DataFrame) -> Result<DataFrame, CohortError> {
    let birth_years = numeric(df, "birthyr")?;
    let flags = birth_years.iter().map(|v| {
        v.is_some_and(|y| y.fract() == 0.0 && TREATED_BIRTH_YEARS.contains(&(y as i32)))
    });

    let mut out = df.clone();
    out.with_column(flag_column("treatment", flags))?;
    Ok(out)
}

/// All cohort-builder derivations in order, with the disjointness check.
pub fn build_cohorts(df: &DataFrame) -> Result<DataFrame, CohortError> {
    let df = cohort_dummies(df)?;
    let df = eligibility_year(&df)?;
    let df = treatment_bands(&df)?;
    check_treatment_disjoint(&df)?;
    Ok(df)
}
