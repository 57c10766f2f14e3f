//! Byte cursor over an in-memory `.dta` buffer.
//!
//! Every read is bounds-checked and reports a `TruncatedFile` error with the
//! offending offset instead of panicking.

use super::error::StataError;

/// Forward-only reader with a fixed byte order.
#[derive(Debug, Clone)]
pub struct ByteCursor<'a> {
    buf: &'a [u8],
    pos: usize,
    little_endian: bool,
}

impl<'a> ByteCursor<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self {
            buf,
            pos: 0,
            little_endian: true,
        }
    }

    pub fn set_little_endian(&mut self, little_endian: bool) {
        self.little_endian = little_endian;
    }

    pub fn is_little_endian(&self) -> bool {
        self.little_endian
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    /// Fails with `TruncatedFile` unless `n` more bytes are available.
    pub fn ensure(&self, n: usize) -> Result<(), StataError> {
        if self.buf.len().saturating_sub(self.pos) < n {
            return Err(StataError::TruncatedFile {
                offset: self.pos,
                needed: n,
                len: self.buf.len(),
            });
        }
        Ok(())
    }

    pub fn take(&mut self, n: usize) -> Result<&'a [u8], StataError> {
        let end = self
            .pos
            .checked_add(n)
            .filter(|&end| end <= self.buf.len())
            .ok_or(StataError::TruncatedFile {
                offset: self.pos,
                needed: n,
                len: self.buf.len(),
            })?;
        let slice = &self.buf[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    pub fn skip(&mut self, n: usize) -> Result<(), StataError> {
        self.take(n).map(|_| ())
    }

    /// True when the bytes at the cursor equal `tag` (does not advance).
    pub fn at_tag(&self, tag: &[u8]) -> bool {
        self.buf
            .get(self.pos..self.pos + tag.len())
            .is_some_and(|s| s == tag)
    }

    /// Consume `tag` or fail with `MissingTag`.
    pub fn expect_tag(&mut self, tag: &[u8]) -> Result<(), StataError> {
        if !self.at_tag(tag) {
            return Err(StataError::MissingTag {
                expected: String::from_utf8_lossy(tag).into_owned(),
                offset: self.pos,
            });
        }
        self.pos += tag.len();
        Ok(())
    }

    pub fn read_u8(&mut self) -> Result<u8, StataError> {
        Ok(self.take(1)?[0])
    }

    pub fn read_u16(&mut self) -> Result<u16, StataError> {
        let le = self.little_endian;
        self.take(2).map(|b| read_u16_at(b, le))
    }

    pub fn read_u32(&mut self) -> Result<u32, StataError> {
        let le = self.little_endian;
        self.take(4).map(|b| read_u32_at(b, le))
    }

    pub fn read_u64(&mut self) -> Result<u64, StataError> {
        let le = self.little_endian;
        self.take(8).map(|b| read_u64_at(b, le))
    }

    pub fn read_i32(&mut self) -> Result<i32, StataError> {
        self.read_u32().map(|v| v as i32)
    }
}

pub fn read_u16_at(b: &[u8], little_endian: bool) -> u16 {
    let arr = [b[0], b[1]];
    if little_endian {
        u16::from_le_bytes(arr)
    } else {
        u16::from_be_bytes(arr)
    }
}

pub fn read_u32_at(b: &[u8], little_endian: bool) -> u32 {
    let arr = [b[0], b[1], b[2], b[3]];
    if little_endian {
        u32::from_le_bytes(arr)
    } else {
        u32::from_be_bytes(arr)
    }
}

pub fn read_u64_at(b: &[u8], little_endian: bool) -> u64 {
    let arr = [b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]];
    if little_endian {
        u64::from_le_bytes(arr)
    } else {
        u64::from_be_bytes(arr)
    }
}

/// Reads an unsigned integer of 1..=8 bytes (strL references use 16/48-bit
/// and 24/40-bit splits).
pub fn read_uint_at(b: &[u8], little_endian: bool) -> u64 {
    let mut value = 0u64;
    if little_endian {
        for &byte in b.iter().rev() {
            value = (value << 8) | byte as u64;
        }
    } else {
        for &byte in b {
            value = (value << 8) | byte as u64;
        }
    }
    value
}

/// Decodes a NUL-padded fixed-width field.
pub fn null_terminated(bytes: &[u8]) -> &[u8] {
    match bytes.iter().position(|&b| b == 0) {
        Some(end) => &bytes[..end],
        None => bytes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_respect_byte_order() {
        let bytes = [0x01, 0x02, 0x03, 0x04];
        let mut le = ByteCursor::new(&bytes);
        assert_eq!(le.read_u16().unwrap(), 0x0201);

        let mut be = ByteCursor::new(&bytes);
        be.set_little_endian(false);
        assert_eq!(be.read_u32().unwrap(), 0x0102_0304);
    }

    #[test]
    fn test_take_past_end_is_truncation() {
        let bytes = [0u8; 3];
        let mut cursor = ByteCursor::new(&bytes);
        cursor.skip(2).unwrap();
        match cursor.read_u16() {
            Err(StataError::TruncatedFile { offset, needed, len }) => {
                assert_eq!((offset, needed, len), (2, 2, 3));
            }
            other => panic!("expected truncation, got {:?}", other),
        }
    }

    #[test]
    fn test_ensure_does_not_advance() {
        let bytes = [0u8; 4];
        let mut cursor = ByteCursor::new(&bytes);
        cursor.skip(1).unwrap();
        assert!(cursor.ensure(3).is_ok());
        assert!(matches!(
            cursor.ensure(usize::MAX),
            Err(StataError::TruncatedFile { offset: 1, .. })
        ));
        assert_eq!(cursor.position(), 1);
    }

    #[test]
    fn test_expect_tag() {
        let bytes = b"<data>rest";
        let mut cursor = ByteCursor::new(bytes);
        assert!(cursor.at_tag(b"<data>"));
        cursor.expect_tag(b"<data>").unwrap();
        assert_eq!(cursor.position(), 6);
        assert!(matches!(
            cursor.expect_tag(b"</data>"),
            Err(StataError::MissingTag { offset: 6, .. })
        ));
    }

    #[test]
    fn test_read_uint_widths() {
        assert_eq!(read_uint_at(&[0x01, 0x00, 0x00], true), 1);
        assert_eq!(read_uint_at(&[0x00, 0x00, 0x01], false), 1);
        assert_eq!(read_uint_at(&[0x34, 0x12], true), 0x1234);
    }

    #[test]
    fn test_null_terminated() {
        assert_eq!(null_terminated(b"age\0\0\0"), b"age");
        assert_eq!(null_terminated(b"full"), b"full");
        assert_eq!(null_terminated(b"\0\0"), b"");
    }
}
