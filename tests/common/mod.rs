//! Shared test utilities and fixture generators
#![allow(dead_code)]

use polars::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::path::PathBuf;
use tempfile::TempDir;

use upk::pipeline::filter::{
    COHORT_CLEANUP_COLUMNS, COHORT_SAME_SEX_COLUMNS, REGRESSION_CLEANUP_COLUMNS,
};

// ============================================================================
// Frame fixtures
// ============================================================================

/// Adds integer bookkeeping columns (all zero) for every name not already
/// present.
fn with_filler(mut df: DataFrame, names: &[&str]) -> DataFrame {
    let height = df.height();
    for name in names {
        if df.column(name).is_err() {
            df.with_column(Column::new((*name).into(), vec![0i64; height]))
                .unwrap();
        }
    }
    df
}

/// Adds all-null string columns for every name not already present.
fn with_null_strings(mut df: DataFrame, names: &[&str]) -> DataFrame {
    let height = df.height();
    for name in names {
        if df.column(name).is_err() {
            df.with_column(Column::new((*name).into(), vec![None::<&str>; height]))
                .unwrap();
        }
    }
    df
}

/// A small raw extract in the cohort builder's layout.
///
/// Row 3 has a second mother (same-sex household) and row 4 has a
/// non-numeric age; both are removed by the sample restrictions.
pub fn create_cohort_extract() -> DataFrame {
    let df = df! {
        "year" => [2013i64, 2018, 2020, 2014, 2014, 2010, 2015],
        "age" => ["18", "23", "25", "18", "less than 1 year old", "18", "23"],
        "birthyr" => [1995i64, 1995, 1995, 1996, 2014, 1992, 1992],
        "sex" => ["female", "male", "female", "male", "female", "male", "female"],
        "race" => [
            "black/african american", "white", "white", "chinese",
            "white", "black/african american", "two major races",
        ],
        "hispan" => ["not hispanic", "mexican", "not hispanic", "cuban", "not hispanic", "not hispanic", "other"],
        "hispand" => ["not hispanic", "mexican", "not hispanic", "cuban", "not hispanic", "not hispanic", "dominican"],
        "educd" => [
            "regular high school diploma", "bachelor's degree", "master's degree", "grade 11",
            "n/a", "ged or alternative credential", "some college, but less than 1 year",
        ],
        "educd_mom" => [
            Some("bachelor's degree"), Some("grade 9"), None, Some("doctoral degree"),
            Some("n/a"), Some("regular high school diploma"), Some("associate's degree, type not specified"),
        ],
        "educd_pop" => [
            Some("high school graduate or ged"), None, Some("master's degree"), Some("grade 10"),
            None, Some("12th grade, no diploma"), Some("bachelor's degree"),
        ],
        "empstat" => ["employed", "unemployed", "not in labor force", "n/a", "n/a", "employed", "employed"],
        "poverty" => [Some(85i64), Some(250), None, Some(100), Some(40), Some(501), Some(120)],
        "metro" => [
            "in metropolitan area: in central/principal city",
            "not in metropolitan area",
            "in metropolitan area: not in central/principal city",
            "in metropolitan area: in central/principal city",
            "metropolitan status indeterminable (mixed)",
            "not in metropolitan area",
            "in metropolitan area: in central/principal city",
        ],
        "foodstmp" => ["no", "yes", "no", "no", "n/a", "yes", "no"],
        "nsibs" => ["1 sibling", "0 siblings", "2 siblings", "8 siblings", "0 siblings", "3 siblings", "1 sibling"],
        "educd_mom2" => [None, None, None, Some("bachelor's degree"), None, None, None],
    }
    .unwrap();

    let df = with_null_strings(df, &COHORT_SAME_SEX_COLUMNS);
    with_filler(df, &COHORT_CLEANUP_COLUMNS)
}

/// Labels on the outcome scale used by the synthetic extract.
const COMPLETED: [&str; 4] = [
    "regular high school diploma",
    "ged or alternative credential",
    "some college, but less than 1 year",
    "high school graduate or ged",
];
const NOT_COMPLETED: [&str; 3] = ["grade 11", "grade 10", "grade 9"];
const PARENT_HIGHER: [&str; 4] = [
    "regular high school diploma",
    "bachelor's degree",
    "master's degree",
    "1 or more years of college credit, no degree",
];
const PARENT_LOWER: [&str; 3] = ["grade 8", "grade 11", "associate's degree, type not specified"];
const SIBLING_LABELS: [&str; 5] = ["0 siblings", "1 sibling", "2 siblings", "3 siblings", "4 siblings"];

/// Standard normal draw (Box-Muller).
pub fn normal(rng: &mut StdRng) -> f64 {
    let u1: f64 = rng.gen_range(f64::EPSILON..1.0);
    let u2: f64 = rng.gen();
    (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
}

/// Synthetic regression-runner extract with `rows` records.
///
/// Outcomes follow a latent probit in the analysis covariates, so every
/// model in the suite converges. About one row in ten is removed by the
/// sample restrictions (wrong age, missing education data, associate's
/// degree, or a same-sex household).
pub fn create_regression_extract(rows: usize, seed: u64) -> DataFrame {
    let mut rng = StdRng::seed_from_u64(seed);

    let mut year = Vec::with_capacity(rows);
    let mut age = Vec::with_capacity(rows);
    let mut birthyr = Vec::with_capacity(rows);
    let mut educ = Vec::with_capacity(rows);
    let mut educd = Vec::with_capacity(rows);
    let mut educd_mom = Vec::with_capacity(rows);
    let mut educd_pop = Vec::with_capacity(rows);
    let mut educd_mom2: Vec<Option<&str>> = Vec::with_capacity(rows);
    let mut foodstmp = Vec::with_capacity(rows);
    let mut sex = Vec::with_capacity(rows);
    let mut race = Vec::with_capacity(rows);
    let mut hispan = Vec::with_capacity(rows);
    let mut nsibs = Vec::with_capacity(rows);

    for _ in 0..rows {
        let y: i64 = rng.gen_range(2009..=2021);
        let a: i64 = if rng.gen_bool(0.04) { 19 } else { 18 };
        let treatment = (1991..=1999).contains(&(y - a));
        let siblings = rng.gen_range(0..SIBLING_LABELS.len());
        let food = rng.gen_bool(0.25);
        let mom_higher = rng.gen_bool(0.7);
        let pop_higher = rng.gen_bool(0.6);
        let female = rng.gen_bool(0.5);
        let black = rng.gen_bool(0.3);
        let hisp = !black && rng.gen_bool(0.1);

        let index = 0.2 + 0.4 * treatment as i32 as f64 - 0.1 * siblings as f64
            - 0.3 * food as i32 as f64
            + 0.5 * mom_higher as i32 as f64
            + 0.3 * pop_higher as i32 as f64
            + 0.2 * female as i32 as f64
            - 0.1 * black as i32 as f64
            + 0.1 * hisp as i32 as f64;
        let completed = index + normal(&mut rng) > 0.0;

        year.push(y);
        age.push(a.to_string());
        birthyr.push(y - a);
        educ.push(if rng.gen_bool(0.02) {
            "n/a or no schooling"
        } else {
            "grade 12"
        });
        educd.push(if rng.gen_bool(0.02) {
            "associate's degree, type not specified"
        } else if completed {
            COMPLETED[rng.gen_range(0..COMPLETED.len())]
        } else {
            NOT_COMPLETED[rng.gen_range(0..NOT_COMPLETED.len())]
        });
        educd_mom.push(if mom_higher {
            PARENT_HIGHER[rng.gen_range(0..PARENT_HIGHER.len())]
        } else {
            PARENT_LOWER[rng.gen_range(0..PARENT_LOWER.len())]
        });
        educd_pop.push(if pop_higher {
            PARENT_HIGHER[rng.gen_range(0..PARENT_HIGHER.len())]
        } else {
            PARENT_LOWER[rng.gen_range(0..PARENT_LOWER.len())]
        });
        educd_mom2.push(rng.gen_bool(0.01).then_some("bachelor's degree"));
        foodstmp.push(if food { "yes" } else { "no" });
        sex.push(if female { "female" } else { "male" });
        race.push(if black { "black/african american" } else { "white" });
        hispan.push(if hisp { "mexican" } else { "not hispanic" });
        nsibs.push(SIBLING_LABELS[siblings]);
    }

    let df = df! {
        "year" => year,
        "age" => age,
        "birthyr" => birthyr,
        "educ" => educ,
        "educd" => educd,
        "educd_mom" => educd_mom,
        "educd_pop" => educd_pop,
        "educd_mom2" => educd_mom2,
        "educd_pop2" => vec![None::<&str>; rows],
        "foodstmp" => foodstmp,
        "sex" => sex,
        "race" => race,
        "hispan" => hispan,
        "nsibs" => nsibs,
    }
    .unwrap();

    with_filler(df, &REGRESSION_CLEANUP_COLUMNS)
}

// ============================================================================
// Files
// ============================================================================

/// Create a temporary directory with a test CSV file
pub fn create_temp_csv(df: &mut DataFrame) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let csv_path = temp_dir.path().join("test_data.csv");

    let mut file = std::fs::File::create(&csv_path).unwrap();
    CsvWriter::new(&mut file).finish(df).unwrap();

    (temp_dir, csv_path)
}

/// Create a temporary directory with a test Parquet file
pub fn create_temp_parquet(df: &mut DataFrame) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let parquet_path = temp_dir.path().join("test_data.parquet");

    let file = std::fs::File::create(&parquet_path).unwrap();
    ParquetWriter::new(file).finish(df).unwrap();

    (temp_dir, parquet_path)
}

/// Write raw bytes to a temporary `.dta` file
pub fn create_temp_dta(bytes: &[u8]) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("extract.dta");
    std::fs::write(&path, bytes).unwrap();
    (temp_dir, path)
}

// ============================================================================
// Assertions
// ============================================================================

/// Assert that a DataFrame has expected shape
pub fn assert_shape(df: &DataFrame, expected_rows: usize, expected_cols: usize) {
    let (rows, cols) = df.shape();
    assert_eq!(rows, expected_rows, "Row count mismatch: expected {}, got {}", expected_rows, rows);
    assert_eq!(cols, expected_cols, "Column count mismatch: expected {}, got {}", expected_cols, cols);
}

/// Assert that a DataFrame contains specific columns
pub fn assert_has_columns(df: &DataFrame, expected_cols: &[&str]) {
    let actual_cols: Vec<String> = df.get_column_names().iter().map(|s| s.to_string()).collect();
    for col in expected_cols {
        assert!(
            actual_cols.contains(&col.to_string()),
            "Missing expected column: '{}'. Actual columns: {:?}",
            col,
            actual_cols
        );
    }
}

/// Assert that a DataFrame does NOT contain specific columns
pub fn assert_missing_columns(df: &DataFrame, unexpected_cols: &[&str]) {
    let actual_cols: Vec<String> = df.get_column_names().iter().map(|s| s.to_string()).collect();
    for col in unexpected_cols {
        assert!(
            !actual_cols.contains(&col.to_string()),
            "Unexpected column still present: '{}'",
            col
        );
    }
}

/// Integer column as a vector of options
pub fn int_values(df: &DataFrame, name: &str) -> Vec<Option<i32>> {
    df.column(name)
        .unwrap()
        .cast(&DataType::Int32)
        .unwrap()
        .i32()
        .unwrap()
        .into_iter()
        .collect()
}

/// Float column as a vector of options
pub fn float_values(df: &DataFrame, name: &str) -> Vec<Option<f64>> {
    df.column(name)
        .unwrap()
        .cast(&DataType::Float64)
        .unwrap()
        .f64()
        .unwrap()
        .into_iter()
        .collect()
}

// ============================================================================
// Stata .dta builder (release 118, little-endian)
// ============================================================================

const VARNAME_WIDTH: usize = 129;
const FORMAT_WIDTH: usize = 57;
const LABEL_NAME_WIDTH: usize = 129;
const VARIABLE_LABEL_WIDTH: usize = 321;

const BYTE_MISSING: i8 = 101;
const LONG_MISSING: i32 = 2_147_483_621;
const DOUBLE_MISSING_BITS: u64 = 0x7fe0_0000_0000_0000;

struct DtaVar {
    name: String,
    type_code: u16,
    format: String,
    value_label: Option<String>,
    cells: Vec<Vec<u8>>,
}

/// Builds `.dta` byte buffers column by column.
#[derive(Default)]
pub struct DtaBuilder {
    vars: Vec<DtaVar>,
    label_sets: Vec<(String, Vec<(i32, String)>)>,
    strls: Vec<(u32, u64, String)>,
    dataset_label: String,
}

fn fixed(text: &str, width: usize) -> Vec<u8> {
    let mut out = text.as_bytes().to_vec();
    out.resize(width, 0);
    out
}

impl DtaBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn label(mut self, text: &str) -> Self {
        self.dataset_label = text.to_string();
        self
    }

    /// `byte` column; `None` is written as system missing `.`.
    pub fn byte(mut self, name: &str, values: &[Option<i8>], value_label: Option<&str>) -> Self {
        let cells = values
            .iter()
            .map(|v| vec![v.unwrap_or(BYTE_MISSING) as u8])
            .collect();
        self.vars.push(DtaVar {
            name: name.to_string(),
            type_code: 65530,
            format: "%8.0g".to_string(),
            value_label: value_label.map(str::to_string),
            cells,
        });
        self
    }

    /// `long` column; `None` is written as system missing `.`.
    pub fn long(mut self, name: &str, values: &[Option<i32>], value_label: Option<&str>) -> Self {
        let cells = values
            .iter()
            .map(|v| v.unwrap_or(LONG_MISSING).to_le_bytes().to_vec())
            .collect();
        self.vars.push(DtaVar {
            name: name.to_string(),
            type_code: 65528,
            format: "%12.0g".to_string(),
            value_label: value_label.map(str::to_string),
            cells,
        });
        self
    }

    /// `double` column; `None` is written as system missing `.`.
    pub fn double(mut self, name: &str, values: &[Option<f64>]) -> Self {
        let cells = values
            .iter()
            .map(|v| {
                v.map(f64::to_bits)
                    .unwrap_or(DOUBLE_MISSING_BITS)
                    .to_le_bytes()
                    .to_vec()
            })
            .collect();
        self.vars.push(DtaVar {
            name: name.to_string(),
            type_code: 65526,
            format: "%10.0g".to_string(),
            value_label: None,
            cells,
        });
        self
    }

    /// Fixed-width `strN` column.
    pub fn string(mut self, name: &str, width: u16, values: &[&str]) -> Self {
        let cells = values.iter().map(|v| fixed(v, width as usize)).collect();
        self.vars.push(DtaVar {
            name: name.to_string(),
            type_code: width,
            format: format!("%{}s", width),
            value_label: None,
            cells,
        });
        self
    }

    /// `strL` column; each present value gets its own GSO entry.
    pub fn strl(mut self, name: &str, values: &[Option<&str>]) -> Self {
        let v = self.vars.len() as u32 + 1;
        let mut cells = Vec::with_capacity(values.len());
        for (row, value) in values.iter().enumerate() {
            match value {
                Some(text) => {
                    let o = row as u64 + 1;
                    self.strls.push((v, o, text.to_string()));
                    // v in 2 bytes, o in 6 bytes for release 118
                    let mut cell = (v as u16).to_le_bytes().to_vec();
                    cell.extend_from_slice(&o.to_le_bytes()[..6]);
                    cells.push(cell);
                }
                None => cells.push(vec![0; 8]),
            }
        }
        self.vars.push(DtaVar {
            name: name.to_string(),
            type_code: 32768,
            format: "%9s".to_string(),
            value_label: None,
            cells,
        });
        self
    }

    pub fn value_labels(mut self, name: &str, entries: &[(i32, &str)]) -> Self {
        self.label_sets.push((
            name.to_string(),
            entries.iter().map(|(c, l)| (*c, l.to_string())).collect(),
        ));
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let k = self.vars.len();
        let n = self.vars.first().map_or(0, |v| v.cells.len());
        let mut b = Vec::new();

        b.extend_from_slice(b"<stata_dta><header><release>118</release>");
        b.extend_from_slice(b"<byteorder>LSF</byteorder>");
        b.extend_from_slice(b"<K>");
        b.extend_from_slice(&(k as u16).to_le_bytes());
        b.extend_from_slice(b"</K><N>");
        b.extend_from_slice(&(n as u64).to_le_bytes());
        b.extend_from_slice(b"</N><label>");
        b.extend_from_slice(&(self.dataset_label.len() as u16).to_le_bytes());
        b.extend_from_slice(self.dataset_label.as_bytes());
        b.extend_from_slice(b"</label><timestamp>");
        let stamp = b" 1 Jan 2024 12:00";
        b.push(stamp.len() as u8);
        b.extend_from_slice(stamp);
        b.extend_from_slice(b"</timestamp></header>");

        b.extend_from_slice(b"<map>");
        b.extend_from_slice(&[0u8; 14 * 8]);
        b.extend_from_slice(b"</map>");

        b.extend_from_slice(b"<variable_types>");
        for var in &self.vars {
            b.extend_from_slice(&var.type_code.to_le_bytes());
        }
        b.extend_from_slice(b"</variable_types><varnames>");
        for var in &self.vars {
            b.extend_from_slice(&fixed(&var.name, VARNAME_WIDTH));
        }
        b.extend_from_slice(b"</varnames><sortlist>");
        b.extend_from_slice(&vec![0u8; (k + 1) * 2]);
        b.extend_from_slice(b"</sortlist><formats>");
        for var in &self.vars {
            b.extend_from_slice(&fixed(&var.format, FORMAT_WIDTH));
        }
        b.extend_from_slice(b"</formats><value_label_names>");
        for var in &self.vars {
            let name = var.value_label.as_deref().unwrap_or("");
            b.extend_from_slice(&fixed(name, LABEL_NAME_WIDTH));
        }
        b.extend_from_slice(b"</value_label_names><variable_labels>");
        for var in &self.vars {
            b.extend_from_slice(&fixed(&var.name, VARIABLE_LABEL_WIDTH));
        }
        b.extend_from_slice(b"</variable_labels><characteristics></characteristics>");

        b.extend_from_slice(b"<data>");
        for row in 0..n {
            for var in &self.vars {
                b.extend_from_slice(&var.cells[row]);
            }
        }
        b.extend_from_slice(b"</data>");

        b.extend_from_slice(b"<strls>");
        for (v, o, text) in &self.strls {
            b.extend_from_slice(b"GSO");
            b.extend_from_slice(&v.to_le_bytes());
            b.extend_from_slice(&o.to_le_bytes());
            b.push(130);
            b.extend_from_slice(&(text.len() as u32 + 1).to_le_bytes());
            b.extend_from_slice(text.as_bytes());
            b.push(0);
        }
        b.extend_from_slice(b"</strls>");

        b.extend_from_slice(b"<value_labels>");
        for (name, entries) in &self.label_sets {
            let table = label_table(entries);
            b.extend_from_slice(b"<lbl>");
            b.extend_from_slice(&(table.len() as u32).to_le_bytes());
            b.extend_from_slice(&fixed(name, LABEL_NAME_WIDTH));
            b.extend_from_slice(&[0u8; 3]);
            b.extend_from_slice(&table);
            b.extend_from_slice(b"</lbl>");
        }
        b.extend_from_slice(b"</value_labels></stata_dta>");
        b
    }
}

fn label_table(entries: &[(i32, String)]) -> Vec<u8> {
    let mut text = Vec::new();
    let mut offsets = Vec::new();
    for (_, label) in entries {
        offsets.push(text.len() as i32);
        text.extend_from_slice(label.as_bytes());
        text.push(0);
    }
    let mut b = Vec::new();
    b.extend_from_slice(&(entries.len() as i32).to_le_bytes());
    b.extend_from_slice(&(text.len() as i32).to_le_bytes());
    for off in offsets {
        b.extend_from_slice(&off.to_le_bytes());
    }
    for (code, _) in entries {
        b.extend_from_slice(&code.to_le_bytes());
    }
    b.extend_from_slice(&text);
    b
}
