//! Value-label tables (`<value_labels>` section).
//!
//! A value label set maps integer codes to text. IPUMS extracts attach one
//! to nearly every categorical variable (`sex`, `race`, `educd`, ...), and
//! the analysis works on the label text rather than the codes.

use std::collections::HashMap;

use super::constants::*;
use super::cursor::{null_terminated, read_u32_at, ByteCursor};
use super::{StataError, StataRelease};

/// A named mapping from integer codes to label text.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValueLabelSet {
    pub name: String,
    pub labels: HashMap<i32, String>,
}

impl ValueLabelSet {
    pub fn get(&self, code: i32) -> Option<&str> {
        self.labels.get(&code).map(|s| s.as_str())
    }
}

/// Reads every `<lbl>` entry of the `<value_labels>` section, keyed by set name.
pub fn read_value_labels(
    cursor: &mut ByteCursor<'_>,
    release: StataRelease,
) -> Result<HashMap<String, ValueLabelSet>, StataError> {
    let mut sets = HashMap::new();
    let name_width = release.widths().value_label_name;

    cursor.expect_tag(TAG_VALUE_LABELS_OPEN)?;
    while cursor.at_tag(TAG_LBL_OPEN) {
        cursor.expect_tag(TAG_LBL_OPEN)?;
        let len = cursor.read_u32()? as usize;
        let name = release.decode(null_terminated(cursor.take(name_width)?));
        cursor.skip(LBL_PADDING)?;
        let table = cursor.take(len)?;
        let labels = parse_label_table(table, cursor.is_little_endian(), release, &name)?;
        cursor.expect_tag(TAG_LBL_CLOSE)?;
        sets.insert(name.clone(), ValueLabelSet { name, labels });
    }
    cursor.expect_tag(TAG_VALUE_LABELS_CLOSE)?;

    Ok(sets)
}

/// Decodes one value-label table.
///
/// Layout: `n` (i32), `txtlen` (i32), `off[n]` (i32), `val[n]` (i32), then
/// `txtlen` bytes of NUL-terminated label text addressed by `off`.
pub fn parse_label_table(
    table: &[u8],
    little_endian: bool,
    release: StataRelease,
    name: &str,
) -> Result<HashMap<i32, String>, StataError> {
    let malformed = |message: String| StataError::MalformedValueLabels {
        name: name.to_string(),
        message,
    };

    if table.len() < 8 {
        return Err(malformed(format!("table is {} bytes", table.len())));
    }
    let n = read_u32_at(&table[0..4], little_endian) as usize;
    let txt_len = read_u32_at(&table[4..8], little_endian) as usize;

    let off_start = 8;
    let val_start = off_start + 4 * n;
    let txt_start = val_start + 4 * n;
    if txt_start + txt_len > table.len() {
        return Err(malformed(format!(
            "{} entries with {} text bytes exceed table size {}",
            n,
            txt_len,
            table.len()
        )));
    }
    let text = &table[txt_start..txt_start + txt_len];

    let mut labels = HashMap::with_capacity(n);
    for i in 0..n {
        let off = read_u32_at(&table[off_start + 4 * i..], little_endian) as usize;
        let code = read_u32_at(&table[val_start + 4 * i..], little_endian) as i32;
        if off >= txt_len {
            return Err(malformed(format!(
                "label offset {} outside text of {} bytes",
                off, txt_len
            )));
        }
        labels.insert(code, release.decode(null_terminated(&text[off..])));
    }

    Ok(labels)
}
