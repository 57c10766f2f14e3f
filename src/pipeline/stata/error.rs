//! Error types for Stata `.dta` parsing.

use thiserror::Error;

/// Errors that can occur when reading a Stata `.dta` file.
#[derive(Debug, Error)]
pub enum StataError {
    /// File does not open with `<stata_dta>`; older binary releases land here too.
    #[error("Not a Stata 117+ file: missing <stata_dta> opening tag")]
    InvalidMagic,

    /// Release number is outside the supported 117-119 range.
    #[error("Unsupported Stata release {release} (supported: 117, 118, 119)")]
    UnsupportedRelease { release: u16 },

    /// `<byteorder>` holds something other than `MSF` or `LSF`.
    #[error("Invalid byte order marker '{marker}'")]
    InvalidByteOrder { marker: String },

    /// An expected section tag was not found at the current position.
    #[error("Expected tag '{expected}' at byte offset {offset}")]
    MissingTag { expected: String, offset: usize },

    /// File ended before a section was complete.
    #[error("Truncated Stata file: needed {needed} bytes at offset {offset}, file has {len}")]
    TruncatedFile {
        offset: usize,
        needed: usize,
        len: usize,
    },

    /// Storage type code not defined by the format.
    #[error("Unknown storage type {code} for variable '{column}'")]
    UnknownStorageType { column: String, code: u16 },

    /// A strL cell references a `(v, o)` pair absent from `<strls>`.
    #[error("Column '{column}' row {row} references missing strL ({v}, {o})")]
    InvalidStrlReference {
        column: String,
        row: u64,
        v: u32,
        o: u64,
    },

    /// A value-label table is internally inconsistent.
    #[error("Malformed value label table '{name}': {message}")]
    MalformedValueLabels { name: String, message: String },

    /// The decoded columns could not be assembled into a DataFrame.
    #[error("Failed to build DataFrame: {0}")]
    Frame(#[from] polars::error::PolarsError),

    /// I/O error occurred while reading the file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
