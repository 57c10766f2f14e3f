//! Data extraction from the `<data>` and `<strls>` sections and conversion
//! to Polars columns.
//!
//! This module handles:
//! - Decoding fixed-width rows into per-variable buffers
//! - Detecting Stata missing values (`.`, `.a` ... `.z`)
//! - Resolving strL references through the GSO table
//! - Applying value labels so labelled codes surface as their text

use std::collections::HashMap;

use polars::prelude::*;

use super::constants::*;
use super::cursor::{null_terminated, read_u32_at, read_u64_at, read_uint_at, ByteCursor};
use super::labels::ValueLabelSet;
use super::{StataError, StataHeader, StataRelease, StataVariable, StorageType};

/// Per-variable accumulator for decoded cells.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnBuffer {
    /// byte/int/long storage.
    Integer(Vec<Option<i32>>),
    /// float/double storage.
    Float(Vec<Option<f64>>),
    /// Fixed-width strings.
    Text(Vec<Option<String>>),
    /// Unresolved strL `(v, o)` references.
    Strl(Vec<(u32, u64)>),
}

impl ColumnBuffer {
    fn with_capacity(storage: StorageType, rows: usize) -> Self {
        match storage {
            StorageType::Byte | StorageType::Int | StorageType::Long => {
                ColumnBuffer::Integer(Vec::with_capacity(rows))
            }
            StorageType::Float | StorageType::Double => ColumnBuffer::Float(Vec::with_capacity(rows)),
            StorageType::Str(_) => ColumnBuffer::Text(Vec::with_capacity(rows)),
            StorageType::StrL => ColumnBuffer::Strl(Vec::with_capacity(rows)),
        }
    }
}

/// Reads the `<data>` section into one buffer per variable.
pub fn read_data_section(
    cursor: &mut ByteCursor<'_>,
    header: &StataHeader,
    variables: &[StataVariable],
) -> Result<Vec<ColumnBuffer>, StataError> {
    let rows = header.nobs as usize;
    let le = header.little_endian;
    let row_width: usize = variables.iter().map(|v| v.storage.width()).sum();

    cursor.expect_tag(TAG_DATA_OPEN)?;
    // Check the declared size before reserving anything for it
    cursor.ensure(rows.checked_mul(row_width).unwrap_or(usize::MAX))?;

    let mut buffers: Vec<ColumnBuffer> = variables
        .iter()
        .map(|v| ColumnBuffer::with_capacity(v.storage, rows))
        .collect();
    for _ in 0..rows {
        let row = cursor.take(row_width)?;
        let mut offset = 0;
        for (var, buffer) in variables.iter().zip(buffers.iter_mut()) {
            let width = var.storage.width();
            let cell = &row[offset..offset + width];
            offset += width;
            push_cell(buffer, var.storage, cell, le, header.release);
        }
    }
    cursor.expect_tag(TAG_DATA_CLOSE)?;

    Ok(buffers)
}

fn push_cell(
    buffer: &mut ColumnBuffer,
    storage: StorageType,
    cell: &[u8],
    le: bool,
    release: StataRelease,
) {
    match buffer {
        ColumnBuffer::Integer(values) => values.push(decode_integer(storage, cell, le)),
        ColumnBuffer::Float(values) => values.push(decode_float(storage, cell, le)),
        ColumnBuffer::Text(values) => {
            let text = release.decode(null_terminated(cell));
            values.push(Some(text).filter(|s| !s.is_empty()));
        }
        ColumnBuffer::Strl(values) => values.push(decode_strl_ref(cell, le, release)),
    }
}

/// Decodes byte/int/long cells, mapping the missing-value range to `None`.
pub fn decode_integer(storage: StorageType, cell: &[u8], le: bool) -> Option<i32> {
    match storage {
        StorageType::Byte => {
            let v = cell[0] as i8;
            (v <= BYTE_MAX_VALID).then_some(v as i32)
        }
        StorageType::Int => {
            let raw = [cell[0], cell[1]];
            let v = if le {
                i16::from_le_bytes(raw)
            } else {
                i16::from_be_bytes(raw)
            };
            (v <= INT_MAX_VALID).then_some(v as i32)
        }
        StorageType::Long => {
            let v = read_u32_at(cell, le) as i32;
            (v <= LONG_MAX_VALID).then_some(v)
        }
        _ => None,
    }
}

/// Decodes float/double cells, mapping the missing-value range to `None`.
pub fn decode_float(storage: StorageType, cell: &[u8], le: bool) -> Option<f64> {
    match storage {
        StorageType::Float => {
            let v = f32::from_bits(read_u32_at(cell, le));
            let missing = f32::from_bits(FLOAT_MISSING_BITS);
            (!v.is_nan() && v < missing).then_some(v as f64)
        }
        StorageType::Double => {
            let v = f64::from_bits(read_u64_at(cell, le));
            let missing = f64::from_bits(DOUBLE_MISSING_BITS);
            (!v.is_nan() && v < missing).then_some(v)
        }
        _ => None,
    }
}

/// Splits an 8-byte strL cell into its `(v, o)` pair.
pub fn decode_strl_ref(cell: &[u8], le: bool, release: StataRelease) -> (u32, u64) {
    let v_len = release.strl_v_width();
    let v = read_uint_at(&cell[..v_len], le) as u32;
    let o = read_uint_at(&cell[v_len..STRL_REF_WIDTH], le);
    (v, o)
}

/// Reads the `<strls>` section into a `(v, o) -> text` table.
pub fn read_strls(
    cursor: &mut ByteCursor<'_>,
    release: StataRelease,
) -> Result<HashMap<(u32, u64), String>, StataError> {
    let mut table = HashMap::new();

    cursor.expect_tag(TAG_STRLS_OPEN)?;
    while cursor.at_tag(TAG_GSO) {
        cursor.expect_tag(TAG_GSO)?;
        let v = cursor.read_u32()?;
        let o = if release == StataRelease::R117 {
            cursor.read_u32()? as u64
        } else {
            cursor.read_u64()?
        };
        let kind = cursor.read_u8()?;
        let len = cursor.read_u32()? as usize;
        let payload = cursor.take(len)?;
        let text = if kind == GSO_TYPE_ASCII {
            release.decode(null_terminated(payload))
        } else {
            String::from_utf8_lossy(payload).into_owned()
        };
        table.insert((v, o), text);
    }
    cursor.expect_tag(TAG_STRLS_CLOSE)?;

    Ok(table)
}

/// Converts a decoded buffer into a Polars column.
///
/// Numeric variables with an attached value-label set become String columns;
/// codes missing from the set keep their numeric text.
pub fn build_column(
    var: &StataVariable,
    buffer: ColumnBuffer,
    strls: &HashMap<(u32, u64), String>,
    label_sets: &HashMap<String, ValueLabelSet>,
) -> Result<Column, StataError> {
    let name: PlSmallStr = var.name.as_str().into();
    let label_set = var
        .value_label
        .as_ref()
        .and_then(|lbl| label_sets.get(lbl));

    let column = match (buffer, label_set) {
        (ColumnBuffer::Integer(values), Some(set)) => {
            let labelled: Vec<Option<String>> = values
                .into_iter()
                .map(|v| v.map(|code| apply_label(set, code as f64)))
                .collect();
            Column::new(name, labelled)
        }
        (ColumnBuffer::Float(values), Some(set)) => {
            let labelled: Vec<Option<String>> = values
                .into_iter()
                .map(|v| v.map(|code| apply_label(set, code)))
                .collect();
            Column::new(name, labelled)
        }
        (ColumnBuffer::Integer(values), None) => Column::new(name, values),
        (ColumnBuffer::Float(values), None) => Column::new(name, values),
        (ColumnBuffer::Text(values), _) => Column::new(name, values),
        (ColumnBuffer::Strl(refs), _) => {
            let mut values: Vec<Option<String>> = Vec::with_capacity(refs.len());
            for (row, (v, o)) in refs.into_iter().enumerate() {
                if v == 0 && o == 0 {
                    values.push(None);
                    continue;
                }
                let text = strls.get(&(v, o)).ok_or_else(|| StataError::InvalidStrlReference {
                    column: var.name.clone(),
                    row: row as u64,
                    v,
                    o,
                })?;
                values.push(Some(text.clone()).filter(|s| !s.is_empty()));
            }
            Column::new(name, values)
        }
    };

    Ok(column)
}

fn apply_label(set: &ValueLabelSet, code: f64) -> String {
    if code.fract() == 0.0 && code.abs() <= i32::MAX as f64 {
        if let Some(label) = set.get(code as i32) {
            return label.to_string();
        }
        return format!("{}", code as i64);
    }
    format!("{}", code)
}
