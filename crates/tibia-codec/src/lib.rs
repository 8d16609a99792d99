//! Sticky-error byte reader/writer primitives for the Tibia 7.72 wire format.
//!
//! Every primitive checks the reader/writer's latched error first and becomes
//! a no-op returning a zero value once that error is set. Callers read or
//! write an entire packet without threading a `Result` through every call,
//! then check [`ByteReader::err`] / [`ByteWriter::err`] once at the end.

use thiserror::Error;

#[cfg(feature = "derive")]
pub use tibia_codec_derive::{Decode, Encode};

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodecError {
    #[error("unexpected end of buffer")]
    UnexpectedEnd,
    #[error("declared length {declared} exceeds {remaining} remaining bytes")]
    MalformedLength { declared: usize, remaining: usize },
}

pub type Result<T> = std::result::Result<T, CodecError>;

/// A cursor over a borrowed byte slice with sticky-error semantics.
pub struct ByteReader<'a> {
    buf: &'a [u8],
    pos: usize,
    err: Option<CodecError>,
}

impl<'a> ByteReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self {
            buf,
            pos: 0,
            err: None,
        }
    }

    pub fn err(&self) -> Option<CodecError> {
        self.err
    }

    pub fn is_ok(&self) -> bool {
        self.err.is_none()
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.buf.len().saturating_sub(self.pos)
    }

    fn fail(&mut self, e: CodecError) {
        if self.err.is_none() {
            self.err = Some(e);
        }
    }

    /// Returns a slice of `n` bytes starting at the cursor without advancing it.
    fn peek_slice(&mut self, n: usize) -> Option<&'a [u8]> {
        if self.err.is_some() {
            return None;
        }
        if self.pos + n > self.buf.len() {
            self.fail(CodecError::UnexpectedEnd);
            return None;
        }
        Some(&self.buf[self.pos..self.pos + n])
    }

    pub fn read_u8(&mut self) -> u8 {
        match self.peek_slice(1) {
            Some(s) => {
                self.pos += 1;
                s[0]
            }
            None => 0,
        }
    }

    pub fn read_u16(&mut self) -> u16 {
        match self.peek_slice(2) {
            Some(s) => {
                let v = u16::from_le_bytes([s[0], s[1]]);
                self.pos += 2;
                v
            }
            None => 0,
        }
    }

    pub fn read_u32(&mut self) -> u32 {
        match self.peek_slice(4) {
            Some(s) => {
                let v = u32::from_le_bytes([s[0], s[1], s[2], s[3]]);
                self.pos += 4;
                v
            }
            None => 0,
        }
    }

    pub fn read_bool(&mut self) -> bool {
        self.read_u8() != 0
    }

    /// Reads a `u16`-length-prefixed UTF-8 string. Invalid UTF-8 is replaced
    /// lossily rather than latching an error, matching the wire's lack of a
    /// dedicated encoding-error signal.
    pub fn read_string(&mut self) -> String {
        let len = self.read_u16() as usize;
        if self.err.is_some() {
            return String::new();
        }
        if len > self.remaining() {
            self.fail(CodecError::MalformedLength {
                declared: len,
                remaining: self.remaining(),
            });
            return String::new();
        }
        let bytes = self.read_bytes(len);
        String::from_utf8_lossy(&bytes).into_owned()
    }

    pub fn read_bytes(&mut self, n: usize) -> Vec<u8> {
        match self.peek_slice(n) {
            Some(s) => {
                let v = s.to_vec();
                self.pos += n;
                v
            }
            None => Vec::new(),
        }
    }

    /// Peeks a little-endian `u16` without advancing the cursor.
    pub fn peek_u16(&mut self) -> u16 {
        match self.peek_slice(2) {
            Some(s) => u16::from_le_bytes([s[0], s[1]]),
            None => 0,
        }
    }

    /// Peeks `n` bytes without advancing the cursor.
    pub fn peek_bytes(&mut self, n: usize) -> Vec<u8> {
        self.peek_slice(n).map(<[u8]>::to_vec).unwrap_or_default()
    }

    pub fn skip(&mut self, n: usize) {
        if self.peek_slice(n).is_some() {
            self.pos += n;
        }
    }

    /// Consumes and returns every remaining byte.
    pub fn take_remaining(&mut self) -> Vec<u8> {
        if self.err.is_some() {
            return Vec::new();
        }
        let rest = self.buf[self.pos..].to_vec();
        self.pos = self.buf.len();
        rest
    }
}

/// A growable buffer with sticky-error semantics, mirroring [`ByteReader`].
#[derive(Default)]
pub struct ByteWriter {
    buf: Vec<u8>,
    err: Option<CodecError>,
}

impl ByteWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn err(&self) -> Option<CodecError> {
        self.err
    }

    pub fn set_error(&mut self, e: CodecError) {
        if self.err.is_none() {
            self.err = Some(e);
        }
    }

    pub fn write_u8(&mut self, v: u8) {
        if self.err.is_some() {
            return;
        }
        self.buf.push(v);
    }

    pub fn write_u16(&mut self, v: u16) {
        if self.err.is_some() {
            return;
        }
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub fn write_u32(&mut self, v: u32) {
        if self.err.is_some() {
            return;
        }
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub fn write_bool(&mut self, v: bool) {
        self.write_u8(u8::from(v));
    }

    pub fn write_string(&mut self, s: &str) {
        if self.err.is_some() {
            return;
        }
        self.write_u16(s.len() as u16);
        self.buf.extend_from_slice(s.as_bytes());
    }

    pub fn write_bytes(&mut self, data: &[u8]) {
        if self.err.is_some() {
            return;
        }
        self.buf.extend_from_slice(data);
    }

    /// Consumes the writer, returning the accumulated bytes, or the first
    /// error latched during writing.
    pub fn finish(self) -> Result<Vec<u8>> {
        match self.err {
            Some(e) => Err(e),
            None => Ok(self.buf),
        }
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }
}

/// A type that can serialize itself onto a [`ByteWriter`].
pub trait Encode {
    fn encode(&self, w: &mut ByteWriter);
}

/// A type that can deserialize itself from a [`ByteReader`].
///
/// Decode never returns a `Result`: on failure the reader's sticky error is
/// set and subsequent reads on the same reader become no-ops returning zero
/// values, so the caller checks `reader.err()` once after a whole packet (or
/// a whole struct's worth of fields) has been decoded.
pub trait Decode: Sized {
    fn decode(r: &mut ByteReader<'_>) -> Self;
}

impl Encode for u8 {
    fn encode(&self, w: &mut ByteWriter) {
        w.write_u8(*self);
    }
}

impl Decode for u8 {
    fn decode(r: &mut ByteReader<'_>) -> Self {
        r.read_u8()
    }
}

impl Encode for u16 {
    fn encode(&self, w: &mut ByteWriter) {
        w.write_u16(*self);
    }
}

impl Decode for u16 {
    fn decode(r: &mut ByteReader<'_>) -> Self {
        r.read_u16()
    }
}

impl Encode for u32 {
    fn encode(&self, w: &mut ByteWriter) {
        w.write_u32(*self);
    }
}

impl Decode for u32 {
    fn decode(r: &mut ByteReader<'_>) -> Self {
        r.read_u32()
    }
}

impl Encode for bool {
    fn encode(&self, w: &mut ByteWriter) {
        w.write_bool(*self);
    }
}

impl Decode for bool {
    fn decode(r: &mut ByteReader<'_>) -> Self {
        r.read_bool()
    }
}

impl Encode for String {
    fn encode(&self, w: &mut ByteWriter) {
        w.write_string(self);
    }
}

impl Decode for String {
    fn decode(r: &mut ByteReader<'_>) -> Self {
        r.read_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primitive_roundtrip() {
        let mut w = ByteWriter::new();
        w.write_u8(0xAB);
        w.write_u16(0x1234);
        w.write_u32(0xDEAD_BEEF);
        w.write_bool(true);
        w.write_string("hi");
        let bytes = w.finish().unwrap();

        let mut r = ByteReader::new(&bytes);
        assert_eq!(r.read_u8(), 0xAB);
        assert_eq!(r.read_u16(), 0x1234);
        assert_eq!(r.read_u32(), 0xDEAD_BEEF);
        assert!(r.read_bool());
        assert_eq!(r.read_string(), "hi");
        assert!(r.is_ok());
        assert_eq!(r.remaining(), 0);
    }

    #[test]
    fn sticky_error_latches_and_zeros() {
        let bytes = [0u8; 1];
        let mut r = ByteReader::new(&bytes);
        assert_eq!(r.read_u8(), 0);
        // Not enough bytes left for a u16.
        assert_eq!(r.read_u16(), 0);
        assert_eq!(r.err(), Some(CodecError::UnexpectedEnd));
        // Once latched, further reads are no-ops returning zero values.
        assert_eq!(r.read_u32(), 0);
        assert!(!r.read_bool());
    }

    #[test]
    fn peek_does_not_advance() {
        let bytes = [0xFF, 0xFF, 0x01];
        let mut r = ByteReader::new(&bytes);
        assert_eq!(r.peek_u16(), 0xFFFF);
        assert_eq!(r.position(), 0);
        assert_eq!(r.read_u16(), 0xFFFF);
        assert_eq!(r.position(), 2);
        assert_eq!(r.read_u8(), 0x01);
    }

    #[test]
    fn malformed_string_length() {
        let mut w = ByteWriter::new();
        w.write_u16(100);
        let bytes = w.finish().unwrap();
        let mut r = ByteReader::new(&bytes);
        assert_eq!(r.read_string(), "");
        assert!(matches!(r.err(), Some(CodecError::MalformedLength { .. })));
    }

    #[test]
    fn take_remaining_and_skip() {
        let bytes = [1, 2, 3, 4, 5];
        let mut r = ByteReader::new(&bytes);
        r.skip(2);
        assert_eq!(r.take_remaining(), vec![3, 4, 5]);
        assert_eq!(r.remaining(), 0);
    }
}
