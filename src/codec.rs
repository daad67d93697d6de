//! Binary primitives for performance-data blobs
//!
//! Every multi-byte field inside a blob is big-endian. Reads are exact: a
//! primitive either consumes precisely the bytes it needs or fails with
//! `CorruptBlob`; there are no partial reads.
//!
//! Compressed blobs are framed as a 4-byte big-endian uncompressed length
//! followed by a zlib stream. Sub-records inside some payloads use extents:
//! a 4-byte big-endian length followed by that many payload bytes.

use std::io::{Read, Write};

use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;

use crate::error::{Error, Result};

/// Fixed compression level so that encoding the same value twice yields the
/// same bytes within one build of the crate.
const COMPRESSION_LEVEL: u32 = 6;

/// Cursor over a borrowed byte slice.
pub struct ByteReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8]> {
        if self.remaining() < n {
            return Err(Error::CorruptBlob(format!(
                "unexpected end of blob: need {} bytes, have {}",
                n,
                self.remaining()
            )));
        }
        let out = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(out)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.read_bytes(1)?[0])
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        let bytes = self.read_bytes(4)?;
        Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        Ok(self.read_u32()? as i32)
    }

    pub fn read_u64(&mut self) -> Result<u64> {
        let bytes = self.read_bytes(8)?;
        let mut raw = [0u8; 8];
        raw.copy_from_slice(bytes);
        Ok(u64::from_be_bytes(raw))
    }

    pub fn read_i64(&mut self) -> Result<i64> {
        Ok(self.read_u64()? as i64)
    }

    pub fn read_f64(&mut self) -> Result<f64> {
        Ok(f64::from_bits(self.read_u64()?))
    }

    /// Consume all remaining bytes.
    pub fn take_rest(&mut self) -> &'a [u8] {
        let out = &self.buf[self.pos..];
        self.pos = self.buf.len();
        out
    }

    /// Fail if any bytes remain unread.
    pub fn expect_end(&self) -> Result<()> {
        if self.remaining() != 0 {
            return Err(Error::CorruptBlob(format!(
                "{} trailing bytes after end of blob",
                self.remaining()
            )));
        }
        Ok(())
    }

    /// Read one length-prefixed extent: 4-byte big-endian length + payload.
    pub fn read_extent(&mut self) -> Result<&'a [u8]> {
        let len = self.read_u32()? as usize;
        self.read_bytes(len)
    }
}

/// Growable big-endian byte sink, the mirror image of [`ByteReader`].
#[derive(Default)]
pub struct ByteWriter {
    buf: Vec<u8>,
}

impl ByteWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self { buf: Vec::with_capacity(capacity) }
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    pub fn write_u8(&mut self, value: u8) {
        self.buf.push(value);
    }

    pub fn write_u32(&mut self, value: u32) {
        self.buf.extend_from_slice(&value.to_be_bytes());
    }

    pub fn write_i32(&mut self, value: i32) {
        self.write_u32(value as u32);
    }

    pub fn write_u64(&mut self, value: u64) {
        self.buf.extend_from_slice(&value.to_be_bytes());
    }

    pub fn write_f64(&mut self, value: f64) {
        self.write_u64(value.to_bits());
    }

    /// Write one length-prefixed extent.
    pub fn write_extent(&mut self, payload: &[u8]) {
        self.write_u32(payload.len() as u32);
        self.write_bytes(payload);
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.buf
    }
}

/// Compress a payload into the stored blob form: 4-byte big-endian
/// uncompressed length followed by a zlib stream.
pub fn deflate(raw: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(raw.len() / 2 + 16);
    out.extend_from_slice(&(raw.len() as u32).to_be_bytes());
    let mut encoder = ZlibEncoder::new(out, Compression::new(COMPRESSION_LEVEL));
    encoder.write_all(raw)?;
    Ok(encoder.finish()?)
}

/// Reverse of [`deflate`]. Fails with `CorruptBlob` when the stream is not
/// valid zlib or the inflated size disagrees with the stated length.
pub fn inflate(blob: &[u8]) -> Result<Vec<u8>> {
    if blob.len() < 4 {
        return Err(Error::CorruptBlob(format!(
            "compressed blob of {} bytes is too short for its length prefix",
            blob.len()
        )));
    }
    let stated = u32::from_be_bytes([blob[0], blob[1], blob[2], blob[3]]) as usize;
    let mut raw = Vec::with_capacity(stated);
    let mut decoder = ZlibDecoder::new(&blob[4..]);
    decoder
        .read_to_end(&mut raw)
        .map_err(|e| Error::CorruptBlob(format!("zlib inflate failed: {e}")))?;
    if raw.len() != stated {
        return Err(Error::CorruptBlob(format!(
            "inflated to {} bytes but header stated {}",
            raw.len(),
            stated
        )));
    }
    Ok(raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reader_writer_roundtrip() {
        let mut w = ByteWriter::new();
        w.write_u8(0x7F);
        w.write_u32(0xDEADBEEF);
        w.write_i32(-44100);
        w.write_u64(1 << 40);
        w.write_f64(127.96);
        let bytes = w.into_inner();

        let mut r = ByteReader::new(&bytes);
        assert_eq!(r.read_u8().unwrap(), 0x7F);
        assert_eq!(r.read_u32().unwrap(), 0xDEADBEEF);
        assert_eq!(r.read_i32().unwrap(), -44100);
        assert_eq!(r.read_u64().unwrap(), 1 << 40);
        assert_eq!(r.read_f64().unwrap(), 127.96);
        assert!(r.expect_end().is_ok());
    }

    #[test]
    fn test_reads_are_big_endian() {
        let mut w = ByteWriter::new();
        w.write_u32(1);
        assert_eq!(w.as_slice(), &[0, 0, 0, 1]);
    }

    #[test]
    fn test_underrun_is_corrupt_blob() {
        let mut r = ByteReader::new(&[1, 2]);
        let err = r.read_u32().unwrap_err();
        assert!(matches!(err, Error::CorruptBlob(_)));
        // A failed read must not consume anything.
        assert_eq!(r.remaining(), 2);
    }

    #[test]
    fn test_trailing_bytes_rejected() {
        let mut r = ByteReader::new(&[1, 2, 3]);
        r.read_u8().unwrap();
        assert!(matches!(r.expect_end(), Err(Error::CorruptBlob(_))));
        assert_eq!(r.take_rest(), &[2, 3]);
        assert!(r.expect_end().is_ok());
    }

    #[test]
    fn test_extent_roundtrip() {
        let mut w = ByteWriter::new();
        w.write_extent(b"abc");
        w.write_extent(b"");
        let bytes = w.into_inner();

        let mut r = ByteReader::new(&bytes);
        assert_eq!(r.read_extent().unwrap(), b"abc");
        assert_eq!(r.read_extent().unwrap(), b"");
        assert!(r.expect_end().is_ok());
    }

    #[test]
    fn test_extent_length_beyond_buffer() {
        let mut w = ByteWriter::new();
        w.write_u32(100);
        w.write_bytes(b"short");
        let bytes = w.into_inner();
        let mut r = ByteReader::new(&bytes);
        assert!(matches!(r.read_extent(), Err(Error::CorruptBlob(_))));
    }

    #[test]
    fn test_zlib_roundtrip() {
        let raw: Vec<u8> = (0..2048u32).map(|i| (i % 251) as u8).collect();
        let blob = deflate(&raw).unwrap();
        assert!(blob.len() < raw.len());
        assert_eq!(inflate(&blob).unwrap(), raw);
    }

    #[test]
    fn test_zlib_deterministic() {
        let raw = b"the same bytes in, the same bytes out";
        assert_eq!(deflate(raw).unwrap(), deflate(raw).unwrap());
    }

    #[test]
    fn test_inflate_length_mismatch() {
        let mut blob = deflate(b"0123456789").unwrap();
        // Tamper with the stated uncompressed length.
        blob[3] = blob[3].wrapping_add(1);
        assert!(matches!(inflate(&blob), Err(Error::CorruptBlob(_))));
    }

    #[test]
    fn test_inflate_garbage_stream() {
        let blob = [0, 0, 0, 4, 0xFF, 0xFF, 0xFF, 0xFF];
        assert!(matches!(inflate(&blob), Err(Error::CorruptBlob(_))));
        assert!(matches!(inflate(&[0, 0]), Err(Error::CorruptBlob(_))));
    }
}
