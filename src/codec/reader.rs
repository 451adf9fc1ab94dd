//! # Primitive Decoder
//!
//! [`ByteReader`] decodes the STDF primitive types from a record body in the
//! byte order established by the FAR. One reader is created per record body;
//! it never reads across record boundaries.
//!
//! ## Primitive Types
//!
//! | STDF | Rust            | Encoding                                       |
//! |------|-----------------|------------------------------------------------|
//! | U*1  | `u8`            | one byte                                       |
//! | U*2  | `u16`           | two bytes, stream byte order                   |
//! | U*4  | `u32`           | four bytes, stream byte order                  |
//! | I*1  | `i8`            | one byte, two's complement                     |
//! | I*2  | `i16`           | two bytes, stream byte order                   |
//! | I*4  | `i32`           | four bytes, stream byte order                  |
//! | R*4  | `f32`           | IEEE 754, stream byte order                    |
//! | R*8  | `f64`           | IEEE 754, stream byte order                    |
//! | C*1  | `char`          | one byte, Latin-1                              |
//! | C*n  | `String`        | u8 length prefix + Latin-1 bytes               |
//! | C*f  | `String`        | fixed byte count, no prefix                    |
//! | B*n  | `Vec<u8>`       | u8 length prefix + raw bytes                   |
//! | D*n  | [`BitArray`]    | u16 bit count prefix + packed bits             |
//! | N*1  | `Vec<u8>`       | packed nibbles, count from an earlier field    |
//!
//! Timestamps (`U*4` seconds since the Unix epoch) decode via
//! [`ByteReader::read_datetime`], which is an alias for the u32 read.
//!
//! ## Text Handling
//!
//! String bytes decode as Latin-1: every byte maps to the code point of the
//! same value. The mapping is total, so a dirty file never fails to decode
//! and re-encoding reproduces the original bytes. The writer is the strict
//! side: it rejects characters above U+00FF.
//!
//! ## Short Reads
//!
//! Scalar reads past the end of the body are errors. The counted-array reads
//! take a `tolerate` flag: when set, a truncated body yields the whole
//! elements that are present instead of an error. Record-level truncation
//! policy (which fields may be partially present) lives in the conversion
//! layer, not here.

use eyre::{ensure, Result};

use super::bits::{unpack_nibbles, BitArray};
use super::endian::Endianness;

/// Decodes primitives from a record body. `Clone` gives callers a probe
/// cursor: attempt a read on the clone, commit by assigning it back.
#[derive(Debug, Clone)]
pub struct ByteReader<'a> {
    buf: &'a [u8],
    pos: usize,
    endian: Endianness,
}

macro_rules! scalar_reads {
    ($(($name:ident, $ty:ty, $size:literal)),+ $(,)?) => {
        $(
            pub fn $name(&mut self) -> Result<$ty> {
                let bytes = self.take::<$size>()?;
                Ok(match self.endian {
                    Endianness::Big => <$ty>::from_be_bytes(bytes),
                    Endianness::Little => <$ty>::from_le_bytes(bytes),
                })
            }
        )+
    };
}

macro_rules! array_reads {
    ($(($name:ident, $elem:ident, $ty:ty, $size:literal)),+ $(,)?) => {
        $(
            pub fn $name(&mut self, count: usize, tolerate: bool) -> Result<Vec<$ty>> {
                let n = self.array_len(count, $size, tolerate)?;
                let mut out = Vec::with_capacity(n);
                for _ in 0..n {
                    out.push(self.$elem()?);
                }
                Ok(out)
            }
        )+
    };
}

impl<'a> ByteReader<'a> {
    pub fn new(buf: &'a [u8], endian: Endianness) -> Self {
        Self {
            buf,
            pos: 0,
            endian,
        }
    }

    pub fn endian(&self) -> Endianness {
        self.endian
    }

    /// Bytes consumed so far.
    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    pub fn is_exhausted(&self) -> bool {
        self.pos >= self.buf.len()
    }

    fn take<const N: usize>(&mut self) -> Result<[u8; N]> {
        ensure!(
            self.remaining() >= N,
            "unexpected end of record body: need {N} bytes, have {}",
            self.remaining()
        );
        let mut bytes = [0u8; N];
        bytes.copy_from_slice(&self.buf[self.pos..self.pos + N]);
        self.pos += N;
        Ok(bytes)
    }

    fn take_slice(&mut self, len: usize) -> Result<&'a [u8]> {
        ensure!(
            self.remaining() >= len,
            "unexpected end of record body: need {len} bytes, have {}",
            self.remaining()
        );
        let slice = &self.buf[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.take::<1>()?[0])
    }

    pub fn read_i8(&mut self) -> Result<i8> {
        Ok(self.take::<1>()?[0] as i8)
    }

    scalar_reads!(
        (read_u16, u16, 2),
        (read_u32, u32, 4),
        (read_u64, u64, 8),
        (read_i16, i16, 2),
        (read_i32, i32, 4),
        (read_i64, i64, 8),
        (read_f32, f32, 4),
        (read_f64, f64, 8),
    );

    /// Reads a U*4 timestamp: seconds since the Unix epoch.
    pub fn read_datetime(&mut self) -> Result<u32> {
        self.read_u32()
    }

    /// Reads a C*1 character. Latin-1, so any byte is a valid value.
    pub fn read_c1(&mut self) -> Result<char> {
        Ok(self.read_u8()? as char)
    }

    /// Reads a C*n string: u8 length prefix, then that many Latin-1 bytes.
    pub fn read_cn(&mut self) -> Result<String> {
        let len = self.read_u8()? as usize;
        let bytes = self.take_slice(len)?;
        Ok(latin1_to_string(bytes))
    }

    /// Reads a C*f fixed-width string of exactly `len` bytes, no prefix.
    pub fn read_cf(&mut self, len: usize) -> Result<String> {
        let bytes = self.take_slice(len)?;
        Ok(latin1_to_string(bytes))
    }

    /// Reads a B*n byte array: u8 length prefix, then raw bytes.
    pub fn read_bn(&mut self) -> Result<Vec<u8>> {
        let len = self.read_u8()? as usize;
        Ok(self.take_slice(len)?.to_vec())
    }

    /// Reads a D*n bit array: u16 bit count prefix, then the packed bits.
    pub fn read_dn(&mut self) -> Result<BitArray> {
        let bit_count = self.read_u16()? as usize;
        let bytes = self.take_slice(bit_count.div_ceil(8))?;
        BitArray::from_raw(bit_count, bytes)
    }

    /// Reads `count` packed nibble values. With `tolerate` set, a truncated
    /// body yields the values whose bytes are present.
    pub fn read_nibble_array(&mut self, count: usize, tolerate: bool) -> Result<Vec<u8>> {
        let needed = count.div_ceil(2);
        let (bytes, n) = if self.remaining() >= needed {
            (self.take_slice(needed)?, count)
        } else {
            ensure!(
                tolerate,
                "unexpected end of record body: {count} nibbles need {needed} bytes, have {}",
                self.remaining()
            );
            let available = self.remaining();
            (self.take_slice(available)?, count.min(available * 2))
        };
        unpack_nibbles(bytes, n)
    }

    fn array_len(&self, count: usize, elem_size: usize, tolerate: bool) -> Result<usize> {
        let available = self.remaining() / elem_size;
        if available >= count {
            return Ok(count);
        }
        ensure!(
            tolerate,
            "unexpected end of record body: array of {count} elements needs {} bytes, have {}",
            count * elem_size,
            self.remaining()
        );
        Ok(available)
    }

    array_reads!(
        (read_u8_array, read_u8, u8, 1),
        (read_i8_array, read_i8, i8, 1),
        (read_u16_array, read_u16, u16, 2),
        (read_i16_array, read_i16, i16, 2),
        (read_u32_array, read_u32, u32, 4),
        (read_i32_array, read_i32, i32, 4),
        (read_f32_array, read_f32, f32, 4),
        (read_f64_array, read_f64, f64, 8),
    );

    /// Skips up to `n` bytes, clamping at the end of the body. Returns the
    /// number of bytes actually skipped.
    pub fn skip(&mut self, n: usize) -> usize {
        let skipped = n.min(self.remaining());
        self.pos += skipped;
        skipped
    }

    /// Skips a C*n or B*n field without decoding it. Clamps at the end of
    /// the body, so a truncated field skips whatever is present.
    pub fn skip_counted(&mut self) {
        if self.is_exhausted() {
            return;
        }
        let len = self.buf[self.pos] as usize;
        self.pos += 1;
        self.skip(len);
    }

    /// Skips a D*n field without decoding it, clamping at the end.
    pub fn skip_bits(&mut self) {
        if self.remaining() < 2 {
            self.pos = self.buf.len();
            return;
        }
        let bytes = [self.buf[self.pos], self.buf[self.pos + 1]];
        let bit_count = match self.endian {
            Endianness::Big => u16::from_be_bytes(bytes),
            Endianness::Little => u16::from_le_bytes(bytes),
        } as usize;
        self.pos += 2;
        self.skip(bit_count.div_ceil(8));
    }
}

fn latin1_to_string(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalars_decode_in_both_byte_orders() {
        let data = [0x01, 0x02, 0x03, 0x04];
        let mut big = ByteReader::new(&data, Endianness::Big);
        assert_eq!(big.read_u16().unwrap(), 0x0102);
        assert_eq!(big.read_u16().unwrap(), 0x0304);

        let mut little = ByteReader::new(&data, Endianness::Little);
        assert_eq!(little.read_u16().unwrap(), 0x0201);
        assert_eq!(little.read_u32().unwrap_err().to_string(), "unexpected end of record body: need 4 bytes, have 2");
    }

    #[test]
    fn signed_and_float_scalars_decode() {
        let mut data = Vec::new();
        data.extend_from_slice(&(-5i16).to_le_bytes());
        data.extend_from_slice(&(-70000i32).to_le_bytes());
        data.extend_from_slice(&1.5f32.to_le_bytes());
        data.extend_from_slice(&(-2.25f64).to_le_bytes());
        let mut r = ByteReader::new(&data, Endianness::Little);
        assert_eq!(r.read_i16().unwrap(), -5);
        assert_eq!(r.read_i32().unwrap(), -70000);
        assert_eq!(r.read_f32().unwrap(), 1.5);
        assert_eq!(r.read_f64().unwrap(), -2.25);
        assert!(r.is_exhausted());
    }

    #[test]
    fn u64_decodes_in_stream_order() {
        let data = 0x0102_0304_0506_0708u64.to_be_bytes();
        let mut r = ByteReader::new(&data, Endianness::Big);
        assert_eq!(r.read_u64().unwrap(), 0x0102_0304_0506_0708);
    }

    #[test]
    fn cn_string_decodes_length_prefixed() {
        let data = [3, b'l', b'o', b't'];
        let mut r = ByteReader::new(&data, Endianness::Little);
        assert_eq!(r.read_cn().unwrap(), "lot");
        assert!(r.is_exhausted());
    }

    #[test]
    fn empty_cn_string_is_one_byte() {
        let data = [0, 0xAA];
        let mut r = ByteReader::new(&data, Endianness::Little);
        assert_eq!(r.read_cn().unwrap(), "");
        assert_eq!(r.position(), 1);
    }

    #[test]
    fn cn_string_decodes_high_bytes_as_latin1() {
        let data = [2, 0xB5, 0x41];
        let mut r = ByteReader::new(&data, Endianness::Little);
        assert_eq!(r.read_cn().unwrap(), "\u{B5}A");
    }

    #[test]
    fn truncated_cn_string_is_an_error() {
        let data = [5, b'a', b'b'];
        let mut r = ByteReader::new(&data, Endianness::Little);
        let err = r.read_cn().unwrap_err();
        assert!(err.to_string().contains("unexpected end"));
    }

    #[test]
    fn fixed_string_reads_exact_width() {
        let data = [b'A', b'B', b' ', b'X'];
        let mut r = ByteReader::new(&data, Endianness::Little);
        assert_eq!(r.read_cf(3).unwrap(), "AB ");
        assert_eq!(r.remaining(), 1);
    }

    #[test]
    fn bn_bytes_decode_length_prefixed() {
        let data = [2, 0xDE, 0xAD];
        let mut r = ByteReader::new(&data, Endianness::Big);
        assert_eq!(r.read_bn().unwrap(), vec![0xDE, 0xAD]);
    }

    #[test]
    fn dn_bit_array_uses_stream_order_for_count() {
        // 12 bits big-endian: count bytes 0x00 0x0C, then 2 packed bytes
        let data = [0x00, 0x0C, 0b0101_0101, 0b0000_1010];
        let mut r = ByteReader::new(&data, Endianness::Big);
        let bits = r.read_dn().unwrap();
        assert_eq!(bits.len(), 12);
        assert_eq!(bits.get(0), Some(true));
        assert_eq!(bits.get(11), Some(true));
    }

    #[test]
    fn zero_length_dn_is_just_the_count() {
        let data = [0x00, 0x00];
        let mut r = ByteReader::new(&data, Endianness::Little);
        let bits = r.read_dn().unwrap();
        assert!(bits.is_empty());
        assert!(r.is_exhausted());
    }

    #[test]
    fn counted_array_reads_count_elements() {
        let data = [0x01, 0x00, 0x02, 0x00, 0x03, 0x00];
        let mut r = ByteReader::new(&data, Endianness::Little);
        assert_eq!(r.read_u16_array(3, false).unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn truncated_array_errors_without_tolerance() {
        let data = [0x01, 0x00, 0x02];
        let mut r = ByteReader::new(&data, Endianness::Little);
        let err = r.read_u16_array(3, false).unwrap_err();
        assert!(err.to_string().contains("needs 6 bytes, have 3"));
    }

    #[test]
    fn truncated_array_yields_whole_elements_with_tolerance() {
        let data = [0x01, 0x00, 0x02];
        let mut r = ByteReader::new(&data, Endianness::Little);
        assert_eq!(r.read_u16_array(3, true).unwrap(), vec![1]);
        // the dangling half-element stays unconsumed
        assert_eq!(r.remaining(), 1);
    }

    #[test]
    fn nibble_array_reads_packed_pairs() {
        let data = [0x21, 0x43, 0x05];
        let mut r = ByteReader::new(&data, Endianness::Little);
        assert_eq!(
            r.read_nibble_array(5, false).unwrap(),
            vec![0x1, 0x2, 0x3, 0x4, 0x5]
        );
    }

    #[test]
    fn truncated_nibble_array_tolerates_short_body() {
        let data = [0x21];
        let mut r = ByteReader::new(&data, Endianness::Little);
        assert_eq!(r.read_nibble_array(5, true).unwrap(), vec![0x1, 0x2]);
        assert!(r.read_nibble_array(1, false).is_err());
    }

    #[test]
    fn skip_clamps_at_end() {
        let data = [1, 2, 3];
        let mut r = ByteReader::new(&data, Endianness::Little);
        assert_eq!(r.skip(2), 2);
        assert_eq!(r.skip(5), 1);
        assert!(r.is_exhausted());
    }

    #[test]
    fn skip_counted_consumes_prefix_and_payload() {
        let data = [2, 0xAA, 0xBB, 7];
        let mut r = ByteReader::new(&data, Endianness::Little);
        r.skip_counted();
        assert_eq!(r.read_u8().unwrap(), 7);
    }

    #[test]
    fn skip_bits_consumes_count_and_packed_bytes() {
        let data = [0x09, 0x00, 0xFF, 0xFF, 0x42];
        let mut r = ByteReader::new(&data, Endianness::Little);
        r.skip_bits();
        assert_eq!(r.read_u8().unwrap(), 0x42);
    }

    #[test]
    fn datetime_is_a_u32_read() {
        let data = 1_700_000_000u32.to_le_bytes();
        let mut r = ByteReader::new(&data, Endianness::Little);
        assert_eq!(r.read_datetime().unwrap(), 1_700_000_000);
    }
}
