//! Indicator-variable stages.
//!
//! Each stage decodes its source columns through the typed category tables,
//! then returns a copy of the frame with the derived 0/1 columns added (or
//! replaced, if a previous run already produced them). Missing source cells
//! give 0 except where the indicator is documented as nullable.

use polars::prelude::*;

use super::categories::{
    decode, Category, CategoryError, Education, EducationBand, EmploymentStatus, FoodStamp, Hispanic,
    MetroStatus, Race, Sex, Siblings,
};

fn with_columns(df: &DataFrame, columns: Vec<Column>) -> Result<DataFrame, CategoryError> {
    let mut out = df.clone();
    for column in columns {
        out.with_column(column)?;
    }
    Ok(out)
}

fn indicator(name: &str, values: impl Iterator<Item = bool>) -> Column {
    let data: Vec<i32> = values.map(i32::from).collect();
    Column::new(name.into(), data)
}

/// One dummy per detailed attainment code, named by `Education::short_name`.
/// The source column is removed.
pub fn education_detail_dummies(df: &DataFrame, column: &str) -> Result<DataFrame, CategoryError> {
    let decoded = decode::<Education>(df, column)?;
    let columns: Vec<Column> = Education::ALL
        .iter()
        .map(|edu| indicator(edu.short_name(), decoded.iter().map(|v| *v == Some(*edu))))
        .collect();

    let out = with_columns(df, columns)?;
    Ok(out.drop(column)?)
}

/// `{prefix}_nohs`, `{prefix}_hs`, `{prefix}_some_college`, `{prefix}_bach`,
/// `{prefix}_highered` from a parent's attainment column.
pub fn parent_education_dummies(
    df: &DataFrame,
    column: &str,
    prefix: &str,
) -> Result<DataFrame, CategoryError> {
    let bands: Vec<Option<EducationBand>> = decode::<Education>(df, column)?
        .into_iter()
        .map(|v| v.and_then(Education::band))
        .collect();

    let columns: Vec<Column> = EducationBand::ALL
        .iter()
        .map(|band| {
            indicator(
                &format!("{}_{}", prefix, band.suffix()),
                bands.iter().map(|b| *b == Some(*band)),
            )
        })
        .collect();

    with_columns(df, columns)
}

/// `female`, `white`, `black` and `hisp`.
pub fn demographic_dummies(df: &DataFrame) -> Result<DataFrame, CategoryError> {
    let sex = decode::<Sex>(df, "sex")?;
    let race = decode::<Race>(df, "race")?;
    let hispan = decode::<Hispanic>(df, "hispan")?;

    let columns = vec![
        indicator("female", sex.iter().map(|v| *v == Some(Sex::Female))),
        indicator("white", race.iter().map(|v| *v == Some(Race::White))),
        indicator("black", race.iter().map(|v| *v == Some(Race::Black))),
        indicator(
            "hisp",
            hispan
                .iter()
                .map(|v| v.is_some_and(|h| h != Hispanic::NotHispanic)),
        ),
    ];

    with_columns(df, columns)
}

/// `unemployed` (nullable), `poor` (nullable) and `metro_dummy`.
///
/// `poor` is 1 when `poverty` is at most 100 percent of the poverty line.
pub fn socioeconomic_dummies(df: &DataFrame) -> Result<DataFrame, CategoryError> {
    let empstat = decode::<EmploymentStatus>(df, "empstat")?;
    let metro = decode::<MetroStatus>(df, "metro")?;

    let poverty = df
        .column("poverty")
        .map_err(|_| CategoryError::MissingColumn {
            column: "poverty".to_string(),
        })?
        .cast(&DataType::Float64)?;
    let poor: Vec<Option<i32>> = poverty
        .f64()?
        .into_iter()
        .map(|v| v.map(|p| i32::from(p <= 100.0)))
        .collect();

    let unemployed: Vec<Option<i32>> = empstat
        .iter()
        .map(|v| v.and_then(EmploymentStatus::unemployed))
        .collect();

    let columns = vec![
        Column::new("unemployed".into(), unemployed),
        Column::new("poor".into(), poor),
        indicator(
            "metro_dummy",
            metro.iter().map(|v| *v == Some(MetroStatus::CentralCity)),
        ),
    ];

    with_columns(df, columns)
}

/// Outcome `hs` from the respondent's own attainment.
pub fn high_school_outcome(df: &DataFrame) -> Result<DataFrame, CategoryError> {
    let educd = decode::<Education>(df, "educd")?;
    let hs = indicator(
        "hs",
        educd
            .iter()
            .map(|v| v.is_some_and(Education::completed_high_school)),
    );
    with_columns(df, vec![hs])
}

/// `higher_hs_mom` and `higher_hs_pop`.
pub fn parent_high_school_dummies(df: &DataFrame) -> Result<DataFrame, CategoryError> {
    let mut columns = Vec::with_capacity(2);
    for (source, name) in [("educd_mom", "higher_hs_mom"), ("educd_pop", "higher_hs_pop")] {
        let decoded = decode::<Education>(df, source)?;
        columns.push(indicator(
            name,
            decoded
                .iter()
                .map(|v| v.is_some_and(Education::high_school_or_higher)),
        ));
    }
    with_columns(df, columns)
}

/// Replace `foodstmp` labels with 1/0; "n/a" becomes null.
pub fn recode_food_stamp(df: &DataFrame) -> Result<DataFrame, CategoryError> {
    let values: Vec<Option<i32>> = decode::<FoodStamp>(df, "foodstmp")?
        .into_iter()
        .map(|v| v.and_then(FoodStamp::indicator))
        .collect();
    with_columns(df, vec![Column::new("foodstmp".into(), values)])
}

/// Replace `nsibs` labels with sibling counts.
pub fn recode_siblings(df: &DataFrame) -> Result<DataFrame, CategoryError> {
    let values: Vec<Option<i32>> = decode::<Siblings>(df, "nsibs")?
        .into_iter()
        .map(|v| v.map(Siblings::count))
        .collect();
    with_columns(df, vec![Column::new("nsibs".into(), values)])
}
