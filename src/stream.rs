//! Bounded random-access cursor over a byte buffer.
//!
//! All multi-byte reads are little-endian. Every operation is bounds
//! checked and returns a typed error instead of panicking; the reader
//! never owns the buffer.

use half::f16;

use crate::util::{Error, Result};

/// Saved cursor position for speculative lookahead.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StreamPos(u64);

/// A read-only cursor over a pre-loaded buffer.
#[derive(Clone)]
pub struct StreamReader<'a> {
    buf: &'a [u8],
    pos: u64,
}

impl<'a> StreamReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Total buffer length.
    #[inline]
    pub fn len(&self) -> u64 {
        self.buf.len() as u64
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Current absolute position.
    #[inline]
    pub fn tell(&self) -> u64 {
        self.pos
    }

    #[inline]
    pub fn eof(&self) -> bool {
        self.pos >= self.len()
    }

    /// Seek to an absolute position. Seeking to the end is legal; past it
    /// is not.
    pub fn seek(&mut self, pos: u64) -> Result<()> {
        if pos > self.len() {
            return Err(Error::UnexpectedEof(pos));
        }
        self.pos = pos;
        Ok(())
    }

    /// Move the cursor back by `delta` bytes.
    pub fn rewind(&mut self, delta: u64) -> Result<()> {
        let new_pos = self
            .pos
            .checked_sub(delta)
            .ok_or_else(|| Error::invalid("rewind past start of stream"))?;
        self.pos = new_pos;
        Ok(())
    }

    /// Snapshot the cursor for later [`restore`](Self::restore).
    #[inline]
    pub fn snapshot(&self) -> StreamPos {
        StreamPos(self.pos)
    }

    /// Restore a previously snapshotted position.
    #[inline]
    pub fn restore(&mut self, pos: StreamPos) {
        debug_assert!(pos.0 <= self.len());
        self.pos = pos.0;
    }

    /// Borrow `n` bytes at the cursor and advance past them.
    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8]> {
        let start = self.pos as usize;
        let end = start
            .checked_add(n)
            .ok_or(Error::UnexpectedEof(u64::MAX))?;
        if end > self.buf.len() {
            return Err(Error::UnexpectedEof(end as u64));
        }
        self.pos = end as u64;
        Ok(&self.buf[start..end])
    }

    /// Peek at the byte under the cursor without advancing.
    pub fn peek_u8(&self) -> Result<u8> {
        self.buf
            .get(self.pos as usize)
            .copied()
            .ok_or(Error::UnexpectedEof(self.pos))
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        let b = self.read_bytes(1)?;
        Ok(b[0])
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        let b = self.read_bytes(2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        let b = self.read_bytes(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub fn read_u64(&mut self) -> Result<u64> {
        let b = self.read_bytes(8)?;
        Ok(u64::from_le_bytes([
            b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7],
        ]))
    }

    pub fn read_i8(&mut self) -> Result<i8> {
        Ok(self.read_u8()? as i8)
    }

    pub fn read_i16(&mut self) -> Result<i16> {
        Ok(self.read_u16()? as i16)
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        Ok(self.read_u32()? as i32)
    }

    pub fn read_i64(&mut self) -> Result<i64> {
        Ok(self.read_u64()? as i64)
    }

    pub fn read_f16(&mut self) -> Result<f16> {
        Ok(f16::from_bits(self.read_u16()?))
    }

    pub fn read_f32(&mut self) -> Result<f32> {
        Ok(f32::from_bits(self.read_u32()?))
    }

    pub fn read_f64(&mut self) -> Result<f64> {
        Ok(f64::from_bits(self.read_u64()?))
    }

    /// Read a length-prefixed UTF-8 string. `len_width` selects the prefix
    /// width in bytes (4 or 8); `max_len` bounds the declared length.
    pub fn read_string_prefixed(&mut self, len_width: usize, max_len: usize) -> Result<String> {
        let len = match len_width {
            4 => self.read_u32()? as u64,
            8 => self.read_u64()?,
            _ => return Err(Error::internal("unsupported string length width")),
        };
        if len > max_len as u64 {
            return Err(Error::LimitExceeded {
                what: "string length",
                value: len,
                max: max_len as u64,
            });
        }
        let bytes = self.read_bytes(len as usize)?;
        Ok(String::from_utf8(bytes.to_vec())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_primitives() {
        let data: Vec<u8> = vec![
            0x01, // u8
            0x02, 0x03, // u16 = 0x0302
            0xff, 0xff, 0xff, 0xff, // i32 = -1
            0x00, 0x00, 0x80, 0x3f, // f32 = 1.0
        ];
        let mut sr = StreamReader::new(&data);
        assert_eq!(sr.read_u8().unwrap(), 1);
        assert_eq!(sr.read_u16().unwrap(), 0x0302);
        assert_eq!(sr.read_i32().unwrap(), -1);
        assert_eq!(sr.read_f32().unwrap(), 1.0);
        assert!(sr.eof());
    }

    #[test]
    fn test_bounds_checked() {
        let data = [0u8; 4];
        let mut sr = StreamReader::new(&data);
        assert!(sr.read_u64().is_err());
        // Failed read does not advance.
        assert_eq!(sr.tell(), 0);
        assert!(sr.seek(4).is_ok());
        assert!(sr.seek(5).is_err());
        assert!(sr.read_u8().is_err());
    }

    #[test]
    fn test_snapshot_restore() {
        let data = [1u8, 2, 3, 4];
        let mut sr = StreamReader::new(&data);
        sr.read_u8().unwrap();
        let snap = sr.snapshot();
        sr.read_u16().unwrap();
        sr.restore(snap);
        assert_eq!(sr.tell(), 1);
        assert_eq!(sr.read_u8().unwrap(), 2);
    }

    #[test]
    fn test_rewind() {
        let data = [1u8, 2, 3];
        let mut sr = StreamReader::new(&data);
        sr.read_u16().unwrap();
        sr.rewind(1).unwrap();
        assert_eq!(sr.read_u8().unwrap(), 2);
        assert!(sr.rewind(10).is_err());
    }

    #[test]
    fn test_string_prefixed() {
        let mut data = vec![5u8, 0, 0, 0];
        data.extend_from_slice(b"hello");
        let mut sr = StreamReader::new(&data);
        assert_eq!(sr.read_string_prefixed(4, 64).unwrap(), "hello");

        let mut sr = StreamReader::new(&data);
        assert!(sr.read_string_prefixed(4, 3).is_err());
    }
}
