//! Typed category tables for the labelled census columns.
//!
//! Every categorical column is decoded through one of these enums before any
//! indicator is derived from it. A label that does not appear in the table
//! aborts the run with `CategoryError::Unmapped`, so a spelling drift in the
//! extract shows up as an error instead of an all-zero dummy.

use std::collections::BTreeSet;

use polars::prelude::*;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CategoryError {
    #[error("column '{column}' not found in dataset")]
    MissingColumn { column: String },

    #[error("column '{column}' has labels missing from the {kind} table: {labels:?}")]
    Unmapped {
        column: String,
        kind: &'static str,
        labels: Vec<String>,
    },

    #[error(transparent)]
    Frame(#[from] PolarsError),
}

/// A closed set of labels with a one-to-one mapping to variants.
pub trait Category: Sized + Copy + 'static {
    /// Human-readable table name used in error messages.
    const KIND: &'static str;

    /// Every variant, in code order.
    const ALL: &'static [Self];

    fn label(self) -> &'static str;

    fn from_label(label: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|c| c.label() == label)
    }
}

/// Distinct non-null values of `column`, rendered as text.
pub fn distinct_labels(df: &DataFrame, column: &str) -> Result<BTreeSet<String>, CategoryError> {
    let text = string_column(df, column)?;
    Ok(text
        .str()?
        .into_iter()
        .flatten()
        .map(|s| s.to_string())
        .collect())
}

/// Check that every distinct value of `column` maps to a variant of `C`.
pub fn validate<C: Category>(df: &DataFrame, column: &str) -> Result<(), CategoryError> {
    let unmapped: Vec<String> = distinct_labels(df, column)?
        .into_iter()
        .filter(|label| C::from_label(label).is_none())
        .collect();

    if unmapped.is_empty() {
        Ok(())
    } else {
        Err(CategoryError::Unmapped {
            column: column.to_string(),
            kind: C::KIND,
            labels: unmapped,
        })
    }
}

/// Decode `column` row by row. Nulls stay `None`.
pub fn decode<C: Category>(df: &DataFrame, column: &str) -> Result<Vec<Option<C>>, CategoryError> {
    validate::<C>(df, column)?;
    let text = string_column(df, column)?;
    let decoded = text
        .str()?
        .into_iter()
        .map(|v| v.and_then(C::from_label))
        .collect();
    Ok(decoded)
}

fn string_column(df: &DataFrame, column: &str) -> Result<Column, CategoryError> {
    let source = df
        .column(column)
        .map_err(|_| CategoryError::MissingColumn {
            column: column.to_string(),
        })?;
    Ok(source.cast(&DataType::String)?)
}

macro_rules! category_table {
    (
        $(#[$meta:meta])*
        $name:ident, $kind:literal {
            $($variant:ident => $label:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant),+
        }

        impl Category for $name {
            const KIND: &'static str = $kind;
            const ALL: &'static [Self] = &[$($name::$variant),+];

            fn label(self) -> &'static str {
                match self {
                    $($name::$variant => $label),+
                }
            }
        }
    };
}

category_table! {
    /// Detailed educational attainment (`educd`, `educd_mom`, `educd_pop`).
    Education, "education" {
        NotApplicable => "n/a",
        NoSchooling => "no schooling completed",
        NurseryToGrade4 => "nursery school to grade 4",
        Preschool => "nursery school, preschool",
        Kindergarten => "kindergarten",
        Grade1 => "grade 1",
        Grade2 => "grade 2",
        Grade3 => "grade 3",
        Grade4 => "grade 4",
        Grade5Or6 => "grade 5 or 6",
        Grade5 => "grade 5",
        Grade6 => "grade 6",
        Grade7Or8 => "grade 7 or 8",
        Grade7 => "grade 7",
        Grade8 => "grade 8",
        Grade9 => "grade 9",
        Grade10 => "grade 10",
        Grade11 => "grade 11",
        Grade12NoDiploma => "12th grade, no diploma",
        HighSchoolOrGed => "high school graduate or ged",
        RegularDiploma => "regular high school diploma",
        Ged => "ged or alternative credential",
        SomeCollege => "some college, but less than 1 year",
        CollegeNoDegree => "1 or more years of college credit, no degree",
        Associate => "associate's degree, type not specified",
        Bachelor => "bachelor's degree",
        Master => "master's degree",
        Professional => "professional degree beyond a bachelor's degree",
        Doctorate => "doctoral degree",
    }
}

category_table! {
    Sex, "sex" {
        Male => "male",
        Female => "female",
    }
}

category_table! {
    Race, "race" {
        White => "white",
        Black => "black/african american",
        AmericanIndian => "american indian or alaska native",
        Chinese => "chinese",
        Japanese => "japanese",
        OtherAsian => "other asian or pacific islander",
        Other => "other race, nec",
        TwoRaces => "two major races",
        ThreeOrMoreRaces => "three or more major races",
    }
}

category_table! {
    /// General Hispanic origin (`hispan`).
    Hispanic, "hispanic origin" {
        NotHispanic => "not hispanic",
        Mexican => "mexican",
        PuertoRican => "puerto rican",
        Cuban => "cuban",
        Other => "other",
        NotReported => "not reported",
    }
}

category_table! {
    EmploymentStatus, "employment status" {
        NotApplicable => "n/a",
        Employed => "employed",
        Unemployed => "unemployed",
        NotInLaborForce => "not in labor force",
    }
}

category_table! {
    MetroStatus, "metropolitan status" {
        Indeterminable => "metropolitan status indeterminable (mixed)",
        NonMetro => "not in metropolitan area",
        CentralCity => "in metropolitan area: in central/principal city",
        OutsideCentralCity => "in metropolitan area: not in central/principal city",
        CentralCityIndeterminable => "in metropolitan area: central/principal city status indeterminable (mixed)",
    }
}

category_table! {
    FoodStamp, "food stamp" {
        NotApplicable => "n/a",
        No => "no",
        Yes => "yes",
    }
}

category_table! {
    Siblings, "sibling count" {
        Zero => "0 siblings",
        One => "1 sibling",
        Two => "2 siblings",
        Three => "3 siblings",
        Four => "4 siblings",
        Five => "5 siblings",
        Six => "6 siblings",
        Seven => "7 siblings",
        Eight => "8 siblings",
        NineOrMore => "9 or more siblings",
    }
}

/// Collapsed attainment bands used for the parental education dummies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EducationBand {
    NoHighSchool,
    HighSchool,
    SomeCollege,
    Bachelor,
    Advanced,
}

impl EducationBand {
    pub const ALL: [EducationBand; 5] = [
        EducationBand::NoHighSchool,
        EducationBand::HighSchool,
        EducationBand::SomeCollege,
        EducationBand::Bachelor,
        EducationBand::Advanced,
    ];

    /// Column suffix, e.g. `mom_nohs`.
    pub fn suffix(self) -> &'static str {
        match self {
            EducationBand::NoHighSchool => "nohs",
            EducationBand::HighSchool => "hs",
            EducationBand::SomeCollege => "some_college",
            EducationBand::Bachelor => "bach",
            EducationBand::Advanced => "highered",
        }
    }
}

impl Education {
    /// Short column name of the per-code dummy.
    pub fn short_name(self) -> &'static str {
        use Education::*;
        match self {
            NotApplicable => "na",
            NoSchooling => "no_schooling",
            NurseryToGrade4 => "nurs_4",
            Preschool => "nurs_pre",
            Kindergarten => "kin",
            Grade1 => "grade1",
            Grade2 => "grade2",
            Grade3 => "grade3",
            Grade4 => "grade4",
            Grade5Or6 => "grade5_6",
            Grade5 => "grade5",
            Grade6 => "grade6",
            Grade7Or8 => "grade7_8",
            Grade7 => "grade7",
            Grade8 => "grade8",
            Grade9 => "grade9",
            Grade10 => "grade10",
            Grade11 => "grade11",
            Grade12NoDiploma => "grade12_nodip",
            HighSchoolOrGed => "dip_ged",
            RegularDiploma => "reg_high",
            Ged => "ged",
            SomeCollege => "some_college",
            CollegeNoDegree => "college_nodeg",
            Associate => "associate",
            Bachelor => "bach",
            Master => "master",
            Professional => "prof",
            Doctorate => "doct",
        }
    }

    /// Attainment band; `None` for "n/a".
    pub fn band(self) -> Option<EducationBand> {
        use Education::*;
        match self {
            NotApplicable => None,
            NoSchooling | NurseryToGrade4 | Preschool | Kindergarten | Grade1 | Grade2 | Grade3
            | Grade4 | Grade5Or6 | Grade5 | Grade6 | Grade7Or8 | Grade7 | Grade8 | Grade9
            | Grade10 | Grade11 | Grade12NoDiploma => Some(EducationBand::NoHighSchool),
            HighSchoolOrGed | RegularDiploma | Ged => Some(EducationBand::HighSchool),
            SomeCollege | CollegeNoDegree | Associate => Some(EducationBand::SomeCollege),
            Bachelor => Some(EducationBand::Bachelor),
            Master | Professional | Doctorate => Some(EducationBand::Advanced),
        }
    }

    /// Outcome `hs`: finished twelfth grade without going past some college.
    ///
    /// Includes "12th grade, no diploma"; excludes any completed degree.
    pub fn completed_high_school(self) -> bool {
        use Education::*;
        matches!(
            self,
            HighSchoolOrGed
                | RegularDiploma
                | SomeCollege
                | CollegeNoDegree
                | Grade12NoDiploma
                | Ged
        )
    }

    /// Parental `higher_hs`: high school credential or more, associate's excluded.
    pub fn high_school_or_higher(self) -> bool {
        use Education::*;
        matches!(
            self,
            HighSchoolOrGed
                | RegularDiploma
                | SomeCollege
                | CollegeNoDegree
                | Bachelor
                | Ged
                | Master
                | Professional
                | Doctorate
        )
    }
}

impl Siblings {
    /// Numeric sibling count.
    ///
    /// "8 siblings" is recoded to 9, matching the published analysis.
    pub fn count(self) -> i32 {
        use Siblings::*;
        match self {
            Zero => 0,
            One => 1,
            Two => 2,
            Three => 3,
            Four => 4,
            Five => 5,
            Six => 6,
            Seven => 7,
            Eight | NineOrMore => 9,
        }
    }
}

impl FoodStamp {
    pub fn indicator(self) -> Option<i32> {
        match self {
            FoodStamp::NotApplicable => None,
            FoodStamp::No => Some(0),
            FoodStamp::Yes => Some(1),
        }
    }
}

impl EmploymentStatus {
    /// 1 unemployed, 0 employed, `None` outside the labor force.
    pub fn unemployed(self) -> Option<i32> {
        match self {
            EmploymentStatus::Employed => Some(0),
            EmploymentStatus::Unemployed => Some(1),
            EmploymentStatus::NotApplicable | EmploymentStatus::NotInLaborForce => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_education_table_is_complete() {
        assert_eq!(Education::ALL.len(), 29);
        for edu in Education::ALL {
            assert_eq!(Education::from_label(edu.label()), Some(*edu));
        }
    }

    #[test]
    fn test_short_names_unique() {
        let names: BTreeSet<&str> = Education::ALL.iter().map(|e| e.short_name()).collect();
        assert_eq!(names.len(), Education::ALL.len());
    }

    #[test]
    fn test_bachelor_is_not_high_school_outcome() {
        assert!(!Education::Bachelor.completed_high_school());
        assert!(Education::Bachelor.high_school_or_higher());
        assert_eq!(Education::Bachelor.band(), Some(EducationBand::Bachelor));
    }

    #[test]
    fn test_associate_excluded_from_higher_hs() {
        assert!(!Education::Associate.high_school_or_higher());
        assert_eq!(Education::Associate.band(), Some(EducationBand::SomeCollege));
    }

    #[test]
    fn test_sibling_counts() {
        assert_eq!(Siblings::from_label("1 sibling").map(Siblings::count), Some(1));
        assert_eq!(Siblings::Eight.count(), 9);
        assert_eq!(Siblings::from_label("1 siblings"), None);
    }

    #[test]
    fn test_validate_reports_unmapped() {
        let df = df!("sex" => [Some("male"), Some("Female"), None, Some("unknown")]).unwrap();
        match validate::<Sex>(&df, "sex") {
            Err(CategoryError::Unmapped { labels, kind, .. }) => {
                assert_eq!(kind, "sex");
                assert_eq!(labels, vec!["Female".to_string(), "unknown".to_string()]);
            }
            other => panic!("expected unmapped labels, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_keeps_nulls() {
        let df = df!("foodstmp" => [Some("yes"), None, Some("no")]).unwrap();
        let decoded = decode::<FoodStamp>(&df, "foodstmp").unwrap();
        assert_eq!(decoded, vec![Some(FoodStamp::Yes), None, Some(FoodStamp::No)]);
    }

    #[test]
    fn test_missing_column() {
        let df = df!("a" => [1]).unwrap();
        assert!(matches!(
            validate::<Race>(&df, "race"),
            Err(CategoryError::MissingColumn { .. })
        ));
    }
}
