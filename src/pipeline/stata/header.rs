//! Stata `.dta` header and variable descriptor parsing.
//!
//! Covers everything from `<stata_dta>` up to (not including) `<data>`:
//! the file header, the section map, and the per-variable descriptor
//! sections. Characteristics are skipped.

use super::constants::*;
use super::cursor::{null_terminated, ByteCursor};
use super::{StataError, StataHeader, StataRelease, StataVariable, StorageType};

/// Parses the `<header>` section.
///
/// # Errors
/// * `StataError::InvalidMagic` - File does not start with `<stata_dta>`
/// * `StataError::UnsupportedRelease` - Release is not 117, 118 or 119
/// * `StataError::InvalidByteOrder` - Byte order is neither `MSF` nor `LSF`
pub fn parse_header(cursor: &mut ByteCursor<'_>) -> Result<StataHeader, StataError> {
    if !cursor.at_tag(TAG_FILE_OPEN) {
        return Err(StataError::InvalidMagic);
    }
    cursor.expect_tag(TAG_FILE_OPEN)?;
    cursor.expect_tag(TAG_HEADER_OPEN)?;

    cursor.expect_tag(TAG_RELEASE_OPEN)?;
    let release_text = cursor.take(3)?;
    let release_num: u16 = std::str::from_utf8(release_text)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(0);
    let release = StataRelease::from_number(release_num)?;
    cursor.expect_tag(TAG_RELEASE_CLOSE)?;

    cursor.expect_tag(TAG_BYTEORDER_OPEN)?;
    let marker = cursor.take(3)?;
    let little_endian = match marker {
        b"LSF" => true,
        b"MSF" => false,
        other => {
            return Err(StataError::InvalidByteOrder {
                marker: String::from_utf8_lossy(other).into_owned(),
            })
        }
    };
    cursor.set_little_endian(little_endian);
    cursor.expect_tag(TAG_BYTEORDER_CLOSE)?;

    cursor.expect_tag(TAG_K_OPEN)?;
    let nvar = if release.wide_counts() {
        cursor.read_u32()? as usize
    } else {
        cursor.read_u16()? as usize
    };
    cursor.expect_tag(TAG_K_CLOSE)?;

    cursor.expect_tag(TAG_N_OPEN)?;
    let nobs = if release == StataRelease::R117 {
        cursor.read_u32()? as u64
    } else {
        cursor.read_u64()?
    };
    cursor.expect_tag(TAG_N_CLOSE)?;

    cursor.expect_tag(TAG_LABEL_OPEN)?;
    let label_len = if release == StataRelease::R117 {
        cursor.read_u8()? as usize
    } else {
        cursor.read_u16()? as usize
    };
    let label = release.decode(cursor.take(label_len)?);
    cursor.expect_tag(TAG_LABEL_CLOSE)?;

    cursor.expect_tag(TAG_TIMESTAMP_OPEN)?;
    let ts_len = cursor.read_u8()? as usize;
    let timestamp = release.decode(cursor.take(ts_len)?);
    cursor.expect_tag(TAG_TIMESTAMP_CLOSE)?;

    cursor.expect_tag(TAG_HEADER_CLOSE)?;

    Ok(StataHeader {
        release,
        little_endian,
        nvar,
        nobs,
        label,
        timestamp,
    })
}

/// Parses `<map>` through `</characteristics>` and returns one descriptor
/// per variable, in file order.
pub fn parse_descriptors(
    cursor: &mut ByteCursor<'_>,
    header: &StataHeader,
) -> Result<Vec<StataVariable>, StataError> {
    let widths = header.release.widths();
    let k = header.nvar;

    // The map is redundant for a sequential reader; validate and move on.
    cursor.expect_tag(TAG_MAP_OPEN)?;
    cursor.skip(MAP_ENTRIES * 8)?;
    cursor.expect_tag(TAG_MAP_CLOSE)?;

    cursor.expect_tag(TAG_VARIABLE_TYPES_OPEN)?;
    cursor.ensure(k.saturating_mul(2))?;
    let mut type_codes = Vec::with_capacity(k);
    for _ in 0..k {
        type_codes.push(cursor.read_u16()?);
    }
    cursor.expect_tag(TAG_VARIABLE_TYPES_CLOSE)?;

    cursor.expect_tag(TAG_VARNAMES_OPEN)?;
    let names = read_fixed_strings(cursor, header.release, k, widths.varname)?;
    cursor.expect_tag(TAG_VARNAMES_CLOSE)?;

    cursor.expect_tag(TAG_SORTLIST_OPEN)?;
    let sort_width = if header.release.wide_counts() { 4 } else { 2 };
    cursor.skip((k + 1) * sort_width)?;
    cursor.expect_tag(TAG_SORTLIST_CLOSE)?;

    cursor.expect_tag(TAG_FORMATS_OPEN)?;
    let formats = read_fixed_strings(cursor, header.release, k, widths.format)?;
    cursor.expect_tag(TAG_FORMATS_CLOSE)?;

    cursor.expect_tag(TAG_VALUE_LABEL_NAMES_OPEN)?;
    let label_names = read_fixed_strings(cursor, header.release, k, widths.value_label_name)?;
    cursor.expect_tag(TAG_VALUE_LABEL_NAMES_CLOSE)?;

    cursor.expect_tag(TAG_VARIABLE_LABELS_OPEN)?;
    let var_labels = read_fixed_strings(cursor, header.release, k, widths.variable_label)?;
    cursor.expect_tag(TAG_VARIABLE_LABELS_CLOSE)?;

    skip_characteristics(cursor)?;

    let mut variables = Vec::with_capacity(k);
    for (i, name) in names.into_iter().enumerate() {
        let storage = StorageType::from_code(type_codes[i], &name)?;
        let value_label = Some(label_names[i].clone()).filter(|s| !s.is_empty());
        variables.push(StataVariable {
            name,
            storage,
            format: formats[i].clone(),
            value_label,
            label: var_labels[i].clone(),
        });
    }

    Ok(variables)
}

fn read_fixed_strings(
    cursor: &mut ByteCursor<'_>,
    release: StataRelease,
    count: usize,
    width: usize,
) -> Result<Vec<String>, StataError> {
    let mut out = Vec::with_capacity(count);
    for _ in 0..count {
        let raw = cursor.take(width)?;
        out.push(release.decode(null_terminated(raw)));
    }
    Ok(out)
}

fn skip_characteristics(cursor: &mut ByteCursor<'_>) -> Result<(), StataError> {
    cursor.expect_tag(TAG_CHARACTERISTICS_OPEN)?;
    while cursor.at_tag(TAG_CH_OPEN) {
        cursor.expect_tag(TAG_CH_OPEN)?;
        let len = cursor.read_u32()? as usize;
        cursor.skip(len)?;
        cursor.expect_tag(TAG_CH_CLOSE)?;
    }
    cursor.expect_tag(TAG_CHARACTERISTICS_CLOSE)
}
