//! Binary format constants for the Stata `.dta` file format (releases 117-119).
//!
//! Releases 117 and later wrap every section of the file in an ASCII tag
//! (`<header>`, `<map>`, `<data>`, ...). Within sections, integers use the
//! byte order declared in `<byteorder>`.

// ============================================================================
// Section tags
// ============================================================================

pub const TAG_FILE_OPEN: &[u8] = b"<stata_dta>";
pub const TAG_FILE_CLOSE: &[u8] = b"</stata_dta>";
pub const TAG_HEADER_OPEN: &[u8] = b"<header>";
pub const TAG_HEADER_CLOSE: &[u8] = b"</header>";
pub const TAG_RELEASE_OPEN: &[u8] = b"<release>";
pub const TAG_RELEASE_CLOSE: &[u8] = b"</release>";
pub const TAG_BYTEORDER_OPEN: &[u8] = b"<byteorder>";
pub const TAG_BYTEORDER_CLOSE: &[u8] = b"</byteorder>";
pub const TAG_K_OPEN: &[u8] = b"<K>";
pub const TAG_K_CLOSE: &[u8] = b"</K>";
pub const TAG_N_OPEN: &[u8] = b"<N>";
pub const TAG_N_CLOSE: &[u8] = b"</N>";
pub const TAG_LABEL_OPEN: &[u8] = b"<label>";
pub const TAG_LABEL_CLOSE: &[u8] = b"</label>";
pub const TAG_TIMESTAMP_OPEN: &[u8] = b"<timestamp>";
pub const TAG_TIMESTAMP_CLOSE: &[u8] = b"</timestamp>";
pub const TAG_MAP_OPEN: &[u8] = b"<map>";
pub const TAG_MAP_CLOSE: &[u8] = b"</map>";
pub const TAG_VARIABLE_TYPES_OPEN: &[u8] = b"<variable_types>";
pub const TAG_VARIABLE_TYPES_CLOSE: &[u8] = b"</variable_types>";
pub const TAG_VARNAMES_OPEN: &[u8] = b"<varnames>";
pub const TAG_VARNAMES_CLOSE: &[u8] = b"</varnames>";
pub const TAG_SORTLIST_OPEN: &[u8] = b"<sortlist>";
pub const TAG_SORTLIST_CLOSE: &[u8] = b"</sortlist>";
pub const TAG_FORMATS_OPEN: &[u8] = b"<formats>";
pub const TAG_FORMATS_CLOSE: &[u8] = b"</formats>";
pub const TAG_VALUE_LABEL_NAMES_OPEN: &[u8] = b"<value_label_names>";
pub const TAG_VALUE_LABEL_NAMES_CLOSE: &[u8] = b"</value_label_names>";
pub const TAG_VARIABLE_LABELS_OPEN: &[u8] = b"<variable_labels>";
pub const TAG_VARIABLE_LABELS_CLOSE: &[u8] = b"</variable_labels>";
pub const TAG_CHARACTERISTICS_OPEN: &[u8] = b"<characteristics>";
pub const TAG_CHARACTERISTICS_CLOSE: &[u8] = b"</characteristics>";
pub const TAG_CH_OPEN: &[u8] = b"<ch>";
pub const TAG_CH_CLOSE: &[u8] = b"</ch>";
pub const TAG_DATA_OPEN: &[u8] = b"<data>";
pub const TAG_DATA_CLOSE: &[u8] = b"</data>";
pub const TAG_STRLS_OPEN: &[u8] = b"<strls>";
pub const TAG_STRLS_CLOSE: &[u8] = b"</strls>";
pub const TAG_GSO: &[u8] = b"GSO";
pub const TAG_VALUE_LABELS_OPEN: &[u8] = b"<value_labels>";
pub const TAG_VALUE_LABELS_CLOSE: &[u8] = b"</value_labels>";
pub const TAG_LBL_OPEN: &[u8] = b"<lbl>";
pub const TAG_LBL_CLOSE: &[u8] = b"</lbl>";

/// Number of u64 offsets stored in the `<map>` section.
pub const MAP_ENTRIES: usize = 14;

// ============================================================================
// Storage types
// ============================================================================

/// Largest fixed-width string type code (`str2045`).
pub const TYPE_STR_MAX: u16 = 2045;
pub const TYPE_STRL: u16 = 32768;
pub const TYPE_DOUBLE: u16 = 65526;
pub const TYPE_FLOAT: u16 = 65527;
pub const TYPE_LONG: u16 = 65528;
pub const TYPE_INT: u16 = 65529;
pub const TYPE_BYTE: u16 = 65530;

/// Width in bytes of a strL `(v, o)` reference in the data section.
pub const STRL_REF_WIDTH: usize = 8;

/// strL payload type: binary, length is exact.
pub const GSO_TYPE_BINARY: u8 = 129;
/// strL payload type: ASCII, stored with a trailing NUL.
pub const GSO_TYPE_ASCII: u8 = 130;

// ============================================================================
// Missing value thresholds
// ============================================================================
//
// Values strictly above these maxima encode `.`, `.a` ... `.z`.

pub const BYTE_MAX_VALID: i8 = 100;
pub const INT_MAX_VALID: i16 = 32740;
pub const LONG_MAX_VALID: i32 = 2_147_483_620;
/// Bit pattern of the smallest float missing value (`.` = 2^127).
pub const FLOAT_MISSING_BITS: u32 = 0x7f00_0000;
/// Bit pattern of the smallest double missing value (`.` = 2^1023).
pub const DOUBLE_MISSING_BITS: u64 = 0x7fe0_0000_0000_0000;

// ============================================================================
// Release-dependent field widths
// ============================================================================

/// Field widths that change between format releases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldWidths {
    pub varname: usize,
    pub format: usize,
    pub value_label_name: usize,
    pub variable_label: usize,
}

pub const WIDTHS_117: FieldWidths = FieldWidths {
    varname: 33,
    format: 49,
    value_label_name: 33,
    variable_label: 81,
};

pub const WIDTHS_118: FieldWidths = FieldWidths {
    varname: 129,
    format: 57,
    value_label_name: 129,
    variable_label: 321,
};

/// Padding bytes between the label-set name and its table inside `<lbl>`.
pub const LBL_PADDING: usize = 3;
